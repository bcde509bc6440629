//! Live output through the default cpal device
//!
//! `cpal::Stream` is not `Send`, so the stream is created on and owned by a
//! dedicated thread. The engine-side handle talks to it over a channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{AudioOutput, OutputBackend};
use crate::error::{AudioError, Result};
use crate::graph::SharedGraph;

enum Command {
    Resume(Sender<Result<()>>),
    Suspend(Sender<Result<()>>),
    Close,
}

/// Backend opening the host's default output device
#[derive(Debug, Clone, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl OutputBackend for CpalBackend {
    fn open(&self, _preferred_sample_rate: u32, graph: SharedGraph) -> Result<Box<dyn AudioOutput>> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("focus-audio-output".to_string())
            .spawn(move || run_stream(graph, command_rx, ready_tx))?;

        let sample_rate = match ready_rx.recv() {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(AudioError::DeviceUnavailable {
                    reason: "output thread exited during setup".to_string(),
                });
            }
        };

        Ok(Box::new(CpalOutput {
            commands: command_tx,
            thread: Some(thread),
            sample_rate,
            suspended: true,
            closed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

fn device_error(e: impl std::fmt::Display) -> AudioError {
    AudioError::DeviceUnavailable {
        reason: e.to_string(),
    }
}

fn build_stream(graph: SharedGraph) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| device_error("no output device available"))?;
    let supported = device.default_output_config().map_err(device_error)?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(AudioError::UnsupportedFormat {
            format: format!("device sample format {:?}", supported.sample_format()),
        });
    }

    let channels = supported.channels() as usize;
    let config: cpal::StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;
    tracing::info!(
        device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
        sample_rate,
        channels,
        "opening output stream"
    );

    let mut scratch: Vec<f32> = Vec::new();
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels.max(1);
                scratch.resize(frames * 2, 0.0);
                graph.lock().render(&mut scratch);
                for (frame, stereo) in data.chunks_mut(channels.max(1)).zip(scratch.chunks_exact(2)) {
                    match frame {
                        [mono] => *mono = 0.5 * (stereo[0] + stereo[1]),
                        [left, right, rest @ ..] => {
                            *left = stereo[0];
                            *right = stereo[1];
                            rest.iter_mut().for_each(|s| *s = 0.0);
                        }
                        [] => {}
                    }
                }
            },
            |err| tracing::error!("output stream error: {}", err),
            None,
        )
        .map_err(device_error)?;
    stream.pause().map_err(device_error)?;

    Ok((stream, sample_rate))
}

fn run_stream(graph: SharedGraph, commands: Receiver<Command>, ready: Sender<Result<u32>>) {
    let stream = match build_stream(graph) {
        Ok((stream, rate)) => {
            let _ = ready.send(Ok(rate));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    for command in commands {
        match command {
            Command::Resume(reply) => {
                let _ = reply.send(stream.play().map_err(device_error));
            }
            Command::Suspend(reply) => {
                let _ = reply.send(stream.pause().map_err(device_error));
            }
            Command::Close => break,
        }
    }
    tracing::debug!("output stream released");
}

pub struct CpalOutput {
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
    sample_rate: u32,
    suspended: bool,
    closed: bool,
}

impl CpalOutput {
    fn request(&self, make: impl FnOnce(Sender<Result<()>>) -> Command) -> Result<()> {
        if self.closed {
            return Err(device_error("output has been closed"));
        }
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(make(reply_tx))
            .map_err(|_| device_error("output thread is gone"))?;
        reply_rx
            .recv()
            .map_err(|_| device_error("output thread is gone"))?
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn resume(&mut self) -> Result<()> {
        self.request(Command::Resume)?;
        self.suspended = false;
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        self.request(Command::Suspend)?;
        self.suspended = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.suspended = true;
        let _ = self.commands.send(Command::Close);
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| device_error("output thread panicked"))?;
        }
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn is_realtime(&self) -> bool {
        true
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
