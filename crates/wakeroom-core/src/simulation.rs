//! Deterministic stand-ins for the host collaborators.
//!
//! These let the whole alarm flow run without an OS notification center or
//! an audio device: in tests, and in the CLI's muted dry-run mode. Clones of
//! each fake share state, so a test can keep one clone for inspection while
//! the boxed clone is owned by the core.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::alarm::{NotificationHost, TriggerRequest};
use crate::audio::{AudioBackend, AudioRef, PlaybackHandle};
use crate::error::{AudioError, HostError};

// ── Notification host ─────────────────────────────────────────────

#[derive(Debug)]
struct HostLog {
    permission: bool,
    triggers: BTreeMap<String, TriggerRequest>,
    register_calls: usize,
    cancel_calls: Vec<String>,
    fail_next: Option<String>,
}

impl Default for HostLog {
    fn default() -> Self {
        Self {
            permission: true,
            triggers: BTreeMap::new(),
            register_calls: 0,
            cancel_calls: Vec::new(),
            fail_next: None,
        }
    }
}

/// In-memory host that records every trigger operation.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Rc<RefCell<HostLog>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_permission(&self, granted: bool) {
        self.log.borrow_mut().permission = granted;
    }

    /// Make the next `register_trigger` call fail with `message`.
    pub fn fail_next_registration(&self, message: &str) {
        self.log.borrow_mut().fail_next = Some(message.to_string());
    }

    /// Identifiers of currently registered triggers.
    pub fn active_triggers(&self) -> Vec<String> {
        self.log.borrow().triggers.keys().cloned().collect()
    }

    pub fn trigger(&self, identifier: &str) -> Option<TriggerRequest> {
        self.log.borrow().triggers.get(identifier).cloned()
    }

    pub fn register_calls(&self) -> usize {
        self.log.borrow().register_calls
    }

    pub fn cancel_calls(&self) -> Vec<String> {
        self.log.borrow().cancel_calls.clone()
    }
}

impl NotificationHost for RecordingHost {
    fn request_permission(&mut self) -> Result<bool, HostError> {
        Ok(self.log.borrow().permission)
    }

    fn register_trigger(&mut self, request: TriggerRequest) -> Result<(), HostError> {
        let mut log = self.log.borrow_mut();
        log.register_calls += 1;
        if let Some(message) = log.fail_next.take() {
            return Err(HostError::RegistrationFailed {
                identifier: request.identifier,
                message,
            });
        }
        log.triggers.insert(request.identifier.clone(), request);
        Ok(())
    }

    fn cancel_trigger(&mut self, identifier: &str) {
        let mut log = self.log.borrow_mut();
        log.triggers.remove(identifier);
        log.cancel_calls.push(identifier.to_string());
    }
}

// ── Audio ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct AudioLog {
    loads: Vec<(AudioRef, bool)>,
    failing: HashSet<AudioRef>,
    volume: f32,
    playing: bool,
    finished: bool,
    stops: usize,
}

/// Backend that plays nothing but records what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    log: Rc<RefCell<AudioLog>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later load of `source` fail.
    pub fn fail_on(&self, source: &AudioRef) {
        self.log.borrow_mut().failing.insert(source.clone());
    }

    /// Pretend the current source reached its end.
    pub fn finish(&self) {
        let mut log = self.log.borrow_mut();
        log.finished = true;
        log.playing = false;
    }

    pub fn loads(&self) -> Vec<(AudioRef, bool)> {
        self.log.borrow().loads.clone()
    }

    /// Volume of the most recently loaded handle.
    pub fn volume(&self) -> f32 {
        self.log.borrow().volume
    }

    pub fn is_playing(&self) -> bool {
        self.log.borrow().playing
    }

    pub fn stops(&self) -> usize {
        self.log.borrow().stops
    }
}

impl AudioBackend for FakeBackend {
    fn load(
        &mut self,
        source: &AudioRef,
        looping: bool,
    ) -> Result<Box<dyn PlaybackHandle>, AudioError> {
        let mut log = self.log.borrow_mut();
        log.loads.push((source.clone(), looping));
        if log.failing.contains(source) {
            return Err(AudioError::LoadFailed {
                path: source.path().to_path_buf(),
                message: "simulated load failure".into(),
            });
        }
        log.finished = false;
        Ok(Box::new(FakeHandle {
            log: Rc::clone(&self.log),
        }))
    }
}

struct FakeHandle {
    log: Rc<RefCell<AudioLog>>,
}

impl PlaybackHandle for FakeHandle {
    fn play(&mut self) -> Result<(), AudioError> {
        self.log.borrow_mut().playing = true;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.borrow_mut().volume = volume;
    }

    fn volume(&self) -> f32 {
        self.log.borrow().volume
    }

    fn is_finished(&self) -> bool {
        self.log.borrow().finished
    }

    fn stop(&mut self) {
        let mut log = self.log.borrow_mut();
        log.playing = false;
        log.stops += 1;
    }
}

/// Backend for muted runs: every source loads and plays silently forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn load(
        &mut self,
        _source: &AudioRef,
        _looping: bool,
    ) -> Result<Box<dyn PlaybackHandle>, AudioError> {
        Ok(Box::new(SilentHandle { volume: 0.0 }))
    }
}

struct SilentHandle {
    volume: f32,
}

impl PlaybackHandle for SilentHandle {
    fn play(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn stop(&mut self) {}
}
