//! Audio fader.
//!
//! Owns at most one playback handle. Like the rest of the core it has no
//! internal thread: the caller invokes [`AudioFader::tick`] periodically
//! and the fade ramp advances by the wall-clock time elapsed since the
//! previous tick.
//!
//! ## Usage
//!
//! ```ignore
//! let mut fader = AudioFader::new(backend, clock, events);
//! fader.play_with_fade_in(&source, 0.8, Duration::from_secs(30))?;
//! // In a loop:
//! fader.tick();
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::backend::{AudioBackend, PlaybackHandle};
use super::ramp::FadeRamp;
use super::AudioRef;
use crate::clock::Clock;
use crate::error::AudioError;
use crate::events::{Event, EventQueue};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_volume: f32,
}

pub struct AudioFader {
    backend: Box<dyn AudioBackend>,
    clock: Arc<dyn Clock>,
    events: EventQueue,
    handle: Option<Box<dyn PlaybackHandle>>,
    ramp: Option<FadeRamp>,
    last_tick: Option<DateTime<Local>>,
    state: PlaybackState,
}

impl AudioFader {
    pub fn new(backend: Box<dyn AudioBackend>, clock: Arc<dyn Clock>, events: EventQueue) -> Self {
        Self {
            backend,
            clock,
            events,
            handle: None,
            ramp: None,
            last_tick: None,
            state: PlaybackState::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn volume(&self) -> f32 {
        self.state.current_volume
    }

    pub fn is_fading(&self) -> bool {
        self.ramp.is_some()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Play `source` at full volume, replacing any current playback.
    pub fn play(&mut self, source: &AudioRef, looping: bool) -> Result<(), AudioError> {
        self.stop();
        self.start(source, looping, 1.0)?;
        info!(file = %source.file_name(), looping, "Playing audio");
        Ok(())
    }

    /// Play `source` on a loop, ramping from silence to `target_volume`
    /// over `duration` in [`super::FADE_STEPS`] linear steps.
    pub fn play_with_fade_in(
        &mut self,
        source: &AudioRef,
        target_volume: f32,
        duration: Duration,
    ) -> Result<(), AudioError> {
        self.stop();
        let target_volume = target_volume.clamp(0.0, 1.0);
        self.start(source, true, 0.0)?;
        self.ramp = Some(FadeRamp::new(target_volume, duration));
        info!(
            file = %source.file_name(),
            target_volume_pct = (target_volume * 100.0).round() as u32,
            duration_secs = duration.as_secs_f64(),
            "Playing audio with fade-in"
        );
        Ok(())
    }

    /// Cancel any fade, halt and release playback. No-op when idle.
    pub fn stop(&mut self) {
        self.ramp = None;
        self.last_tick = None;
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        handle.stop();
        self.state = PlaybackState::default();
        info!("Audio stopped");
        self.events.push(Event::PlaybackStopped {
            at: self.clock.now(),
        });
    }

    /// Override the volume directly. A running fade overwrites it on its
    /// next step.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(volume);
            self.state.current_volume = volume;
        }
    }

    /// Advance the fade by the time elapsed since the previous tick and
    /// notice playback that ended on its own.
    pub fn tick(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        let now = self.clock.now();

        if handle.is_finished() {
            if self.ramp.is_some() {
                warn!("Looping alarm audio ended unexpectedly");
            } else {
                debug!("Audio finished playing");
            }
            self.handle = None;
            self.ramp = None;
            self.last_tick = None;
            self.state = PlaybackState::default();
            self.events.push(Event::PlaybackFinished { at: now });
            return;
        }

        let elapsed = self
            .last_tick
            .and_then(|last| (now - last).to_std().ok())
            .unwrap_or_default();
        self.last_tick = Some(now);

        let Some(ramp) = self.ramp.as_mut() else {
            return;
        };
        if let Some(volume) = ramp.advance(elapsed) {
            handle.set_volume(volume);
            self.state.current_volume = volume;
        }
        if ramp.is_complete() {
            let volume = ramp.target();
            self.ramp = None;
            info!(volume_pct = (volume * 100.0).round() as u32, "Fade-in complete");
            self.events.push(Event::FadeCompleted { volume, at: now });
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start(&mut self, source: &AudioRef, looping: bool, volume: f32) -> Result<(), AudioError> {
        let now = self.clock.now();
        let result = self.backend.load(source, looping).and_then(|mut handle| {
            handle.set_volume(volume);
            handle.play()?;
            Ok(handle)
        });

        match result {
            Ok(handle) => {
                // Backends may clamp or quantise; report what they applied.
                let volume = handle.volume();
                self.handle = Some(handle);
                self.last_tick = Some(now);
                self.state = PlaybackState {
                    is_playing: true,
                    current_volume: volume,
                };
                self.events.push(Event::PlaybackStarted {
                    source: source.clone(),
                    looping,
                    volume,
                    at: now,
                });
                Ok(())
            }
            Err(e) => {
                error!(file = %source.file_name(), error = %e, "Failed to play audio");
                self.state = PlaybackState::default();
                self.events.push(Event::PlaybackFailed {
                    source: source.clone(),
                    message: e.to_string(),
                    at: now,
                });
                Err(e)
            }
        }
    }
}
