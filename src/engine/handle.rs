//! Shared engine handle
//!
//! One engine per session, passed around explicitly. Every call locks the
//! engine, so play, stop and settings updates from different threads are
//! serialized. Nature sound fetches run without the lock held.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Mutex, MutexGuard};

use crate::engine::facade::AudioEngine;
use crate::engine::state::EngineState;
use crate::error::Result;
use crate::graph::GraphSnapshot;
use crate::nature::{fetch_and_decode, InsertOutcome};
use crate::settings::{AudioSettings, AudioSettingsUpdate, NatureSoundType, SettingsDelta, VolumeChannel};

#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<AudioEngine>>,
}

impl EngineHandle {
    pub fn new(engine: AudioEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Direct access for multi-step operations that must not interleave
    pub fn lock(&self) -> MutexGuard<'_, AudioEngine> {
        self.inner.lock()
    }

    pub fn initialize(&self) -> Result<()> {
        self.inner.lock().initialize()
    }

    pub fn play(&self) -> Result<()> {
        self.inner.lock().play()
    }

    pub fn stop(&self) {
        self.inner.lock().stop()
    }

    pub fn dispose(&self) {
        self.inner.lock().dispose()
    }

    pub fn update_settings(&self, update: AudioSettingsUpdate) -> Result<SettingsDelta> {
        self.inner.lock().update_settings(update)
    }

    pub fn update_volume(&self, channel: VolumeChannel, value: f32) -> Result<()> {
        self.inner.lock().update_volume(channel, value)
    }

    pub fn settings(&self) -> AudioSettings {
        self.inner.lock().settings().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().is_playing()
    }

    pub fn state(&self) -> EngineState {
        self.inner.lock().state()
    }

    pub fn snapshot(&self) -> Option<GraphSnapshot> {
        self.inner.lock().snapshot()
    }

    /// Load a nature sound, holding the lock only at the start and the end
    pub fn load_nature_sound(&self, kind: NatureSoundType, url: &str) -> Result<InsertOutcome> {
        let ticket = self.inner.lock().begin_nature_load()?;
        let result = fetch_and_decode(url, ticket.sample_rate, ticket.timeout);
        self.inner.lock().finish_nature_load(ticket, kind, url, result)
    }

    /// Load a nature sound on a worker thread
    ///
    /// If the engine is disposed before the load finishes, the result is
    /// discarded and the join handle yields `InsertOutcome::Stale`.
    pub fn spawn_nature_sound_load(
        &self,
        kind: NatureSoundType,
        url: impl Into<String>,
    ) -> JoinHandle<Result<InsertOutcome>> {
        let handle = self.clone();
        let url = url.into();
        std::thread::spawn(move || handle.load_nature_sound(kind, &url))
    }
}
