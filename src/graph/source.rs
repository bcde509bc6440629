//! Looping Buffer Source
//!
//! Single-use playback handle over an immutable buffer. A source starts
//! playing when created and is consumed by `stop`; restarting a channel
//! means creating a new source.

use std::sync::Arc;

use crate::engine::buffer::AudioBuffer;
use crate::generator::GeneratorId;

#[derive(Debug)]
pub struct BufferSource {
    id: GeneratorId,
    buffer: Arc<AudioBuffer>,
    position: usize,
}

impl BufferSource {
    pub fn start(buffer: Arc<AudioBuffer>) -> Self {
        let source = Self {
            id: GeneratorId::new(),
            buffer,
            position: 0,
        };
        tracing::trace!(id = %source.id, frames = source.buffer.len(), "buffer source started");
        source
    }

    pub fn id(&self) -> GeneratorId {
        self.id
    }

    pub fn buffer(&self) -> &Arc<AudioBuffer> {
        &self.buffer
    }

    /// Next stereo frame, wrapping at the end of the buffer
    #[inline]
    pub fn next_frame(&mut self) -> (f32, f32) {
        let len = self.buffer.len();
        if len == 0 {
            return (0.0, 0.0);
        }
        let frame = self.buffer.frame(self.position);
        self.position += 1;
        if self.position >= len {
            self.position = 0;
        }
        frame
    }

    pub fn stop(self) {
        tracing::trace!(id = %self.id, "buffer source stopped");
    }
}
