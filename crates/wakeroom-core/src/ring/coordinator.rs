//! Ring state machine.
//!
//! The coordinator receives fired signals from the host, drives the fader
//! and the puzzle gate, and reschedules on snooze.
//!
//! ## State Transitions
//!
//! ```text
//! Idle ──fired──> Ringing ──snooze──> Snoozed ──close──> Idle
//!                    │                   │
//!                    └──stop──> SolvingPuzzle <──stop──┘
//!                                   │
//!                                 solved ──> Idle
//! ```
//!
//! Dismissing the popup any other way while Ringing or SolvingPuzzle forces
//! the audio off and returns to Idle.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::puzzle::{PuzzleChallenge, PuzzleGate};
use crate::alarm::{
    AlarmScheduler, AlarmSpec, NotificationHost, NotificationSink, Recurrence, ALARM_IDENTIFIER,
};
use crate::audio::{AudioBackend, AudioFader, AudioRef, PlaybackState};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::{Event, EventQueue};

pub const DEFAULT_SNOOZE_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingState {
    Idle,
    Ringing,
    Snoozed,
    SolvingPuzzle,
}

/// Result of submitting a puzzle answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleOutcome {
    Solved,
    /// Wrong answer; the same challenge stays live.
    Incorrect,
    /// No puzzle is being shown.
    NotActive,
}

/// Read model of the whole alarm, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSnapshot {
    pub ring_state: RingState,
    pub armed: bool,
    pub spec: Option<AlarmSpec>,
    pub next_fire: Option<DateTime<Local>>,
    pub playback: PlaybackState,
    pub popup_visible: bool,
    pub snoozed: bool,
    pub snooze_minutes: u32,
    pub puzzle_prompt: Option<String>,
    pub at: DateTime<Local>,
}

pub struct TriggerCoordinator {
    scheduler: AlarmScheduler,
    fader: AudioFader,
    puzzle: PuzzleGate,
    clock: Arc<dyn Clock>,
    events: EventQueue,
    state: RingState,
    snooze_minutes: u32,
    /// Alarm that is currently ringing; its parameters are reused on snooze.
    ringing: Option<AlarmSpec>,
    challenge: Option<PuzzleChallenge>,
    popup_visible: bool,
    snoozed: bool,
    /// A snooze trigger registered by this episode is still pending.
    snooze_pending: bool,
}

impl TriggerCoordinator {
    /// Wire a scheduler and a fader around `host` and `backend`, sharing one
    /// clock and one event queue.
    pub fn new(
        host: Box<dyn NotificationHost>,
        backend: Box<dyn AudioBackend>,
        puzzle: PuzzleGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = EventQueue::new();
        let scheduler = AlarmScheduler::new(host, Arc::clone(&clock), events.clone());
        let fader = AudioFader::new(backend, Arc::clone(&clock), events.clone());
        Self {
            scheduler,
            fader,
            puzzle,
            clock,
            events,
            state: RingState::Idle,
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            ringing: None,
            challenge: None,
            popup_visible: false,
            snoozed: false,
            snooze_pending: false,
        }
    }

    pub fn with_snooze_minutes(mut self, minutes: u32) -> Self {
        self.set_snooze_minutes(minutes);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> RingState {
        self.state
    }

    pub fn scheduler(&self) -> &AlarmScheduler {
        &self.scheduler
    }

    pub fn fader(&self) -> &AudioFader {
        &self.fader
    }

    pub fn challenge(&self) -> Option<&PuzzleChallenge> {
        self.challenge.as_ref()
    }

    pub fn is_popup_visible(&self) -> bool {
        self.popup_visible
    }

    pub fn is_snoozed(&self) -> bool {
        self.snoozed
    }

    pub fn snooze_minutes(&self) -> u32 {
        self.snooze_minutes
    }

    pub fn snapshot(&self) -> AlarmSnapshot {
        let now = self.clock.now();
        AlarmSnapshot {
            ring_state: self.state,
            armed: self.scheduler.is_armed(),
            spec: self.scheduler.spec().cloned(),
            next_fire: self
                .scheduler
                .trigger()
                .and_then(|t| t.next_fire_after(now)),
            playback: self.fader.state(),
            popup_visible: self.popup_visible,
            snoozed: self.snoozed,
            snooze_minutes: self.snooze_minutes,
            puzzle_prompt: self.challenge.as_ref().map(PuzzleChallenge::prompt),
            at: now,
        }
    }

    /// Take every event produced since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // ── Settings and arming ──────────────────────────────────────────

    pub fn set_snooze_minutes(&mut self, minutes: u32) {
        self.snooze_minutes = minutes.max(1);
    }

    pub fn request_permission(&mut self) -> bool {
        self.scheduler.request_permission()
    }

    /// Arm `spec`, replacing whatever was armed.
    pub fn arm(&mut self, spec: AlarmSpec) -> Result<()> {
        self.snooze_pending = false;
        self.scheduler.set(spec)
    }

    /// Disarm and silence everything.
    pub fn disarm(&mut self) {
        self.scheduler.cancel();
        self.snooze_pending = false;
        self.fader.stop();
        if self.state != RingState::Idle {
            self.challenge = None;
            self.popup_visible = false;
            self.snoozed = false;
            self.ringing = None;
            self.transition(RingState::Idle);
        }
    }

    // ── Ring flow ────────────────────────────────────────────────────

    /// User pressed "stop": show a fresh puzzle. Returns false if there is
    /// nothing to stop.
    pub fn request_stop(&mut self) -> bool {
        match self.state {
            RingState::Ringing | RingState::Snoozed => {
                let challenge = self.puzzle.generate();
                debug!(prompt = %challenge, "Puzzle shown");
                self.events.push(Event::PuzzleShown {
                    prompt: challenge.prompt(),
                    at: self.clock.now(),
                });
                self.challenge = Some(challenge);
                self.transition(RingState::SolvingPuzzle);
                true
            }
            RingState::Idle | RingState::SolvingPuzzle => false,
        }
    }

    pub fn submit_answer(&mut self, answer: &str) -> PuzzleOutcome {
        if self.state != RingState::SolvingPuzzle {
            return PuzzleOutcome::NotActive;
        }
        let Some(challenge) = self.challenge.as_ref() else {
            return PuzzleOutcome::NotActive;
        };

        if !PuzzleGate::check(challenge, answer) {
            debug!("Wrong puzzle answer");
            self.events.push(Event::PuzzleFailed {
                at: self.clock.now(),
            });
            return PuzzleOutcome::Incorrect;
        }

        self.fader.stop();
        if self.snooze_pending {
            // Stopping from a snoozed episode stops the alarm completely.
            self.scheduler.cancel();
            self.snooze_pending = false;
        }
        self.challenge = None;
        self.popup_visible = false;
        self.snoozed = false;
        self.ringing = None;
        info!("Alarm dismissed");
        self.events.push(Event::Dismissed {
            at: self.clock.now(),
        });
        self.transition(RingState::Idle);
        PuzzleOutcome::Solved
    }

    /// Silence the alarm and ring again in `snooze_minutes`.
    ///
    /// Returns `Ok(false)` when not ringing.
    ///
    /// # Errors
    ///
    /// If the snooze trigger cannot be registered the alarm is still
    /// silenced and Snoozed, but nothing will ring later; the host error is
    /// returned so the UI can say so.
    pub fn snooze(&mut self) -> Result<bool> {
        if self.state != RingState::Ringing {
            return Ok(false);
        }
        let Some(ringing) = self.ringing.clone() else {
            return Ok(false);
        };

        self.fader.stop();
        self.snoozed = true;

        let now = self.clock.now();
        let until = now + Duration::minutes(i64::from(self.snooze_minutes));
        let spec = AlarmSpec {
            fire_at: until,
            recurrence: Recurrence::Once,
            ..ringing
        };

        let result = self.scheduler.set(spec);
        self.snooze_pending = result.is_ok();
        match &result {
            Ok(()) => {
                info!(minutes = self.snooze_minutes, "Alarm snoozed");
                self.events.push(Event::Snoozed {
                    minutes: self.snooze_minutes,
                    until,
                    at: now,
                });
            }
            Err(e) => error!(error = %e, "Failed to schedule snooze"),
        }
        self.transition(RingState::Snoozed);
        result.map(|()| true)
    }

    /// Close the snoozed popup. The snooze trigger stays armed.
    pub fn close_snoozed(&mut self) -> bool {
        if self.state != RingState::Snoozed {
            return false;
        }
        self.popup_visible = false;
        self.snoozed = false;
        self.transition(RingState::Idle);
        true
    }

    /// The popup went away without the puzzle being solved.
    pub fn dismiss_popup(&mut self) {
        match self.state {
            RingState::Ringing | RingState::SolvingPuzzle => {
                warn!("Alarm popup dismissed without solving; stopping audio");
                self.fader.stop();
                self.challenge = None;
                self.popup_visible = false;
                self.snoozed = false;
                self.ringing = None;
                self.transition(RingState::Idle);
            }
            RingState::Snoozed => {
                self.close_snoozed();
            }
            RingState::Idle => {}
        }
    }

    /// Drive the fade ramp. Call periodically.
    pub fn tick(&mut self) {
        self.fader.tick();
    }

    // ── Test sound ───────────────────────────────────────────────────

    /// Play `source` once at full volume, outside of any alarm.
    pub fn test_sound(&mut self, source: &AudioRef) -> Result<()> {
        if self.state != RingState::Idle {
            return Err(CoreError::Custom(
                "cannot test a sound while the alarm is active".into(),
            ));
        }
        self.fader.play(source, false)?;
        Ok(())
    }

    pub fn stop_test_sound(&mut self) {
        if self.state == RingState::Idle {
            self.fader.stop();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ignore_fire(&mut self, identifier: &str, reason: &str) {
        debug!(identifier, reason, "Ignoring fired signal");
        self.events.push(Event::FireIgnored {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
            at: self.clock.now(),
        });
    }

    fn transition(&mut self, to: RingState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        debug!(?from, ?to, "Ring state changed");
        self.events.push(Event::RingStateChanged {
            from,
            to,
            at: self.clock.now(),
        });
    }
}

impl NotificationSink for TriggerCoordinator {
    fn on_fired(&mut self, identifier: &str) {
        if identifier != ALARM_IDENTIFIER {
            self.ignore_fire(identifier, "unknown trigger");
            return;
        }
        if !self.scheduler.accepts(identifier) {
            self.ignore_fire(identifier, "alarm is not armed");
            return;
        }
        if matches!(self.state, RingState::Ringing | RingState::SolvingPuzzle) {
            self.ignore_fire(identifier, "alarm is already ringing");
            return;
        }
        let Some(spec) = self.scheduler.spec().cloned() else {
            self.ignore_fire(identifier, "no alarm spec");
            return;
        };

        info!("Alarm triggered");
        self.events.push(Event::AlarmFired {
            identifier: identifier.to_string(),
            at: self.clock.now(),
        });
        self.scheduler.mark_fired();
        self.snooze_pending = false;
        self.snoozed = false;
        self.challenge = None;
        self.popup_visible = true;

        match spec.audio.as_ref() {
            Some(audio) => {
                if let Err(e) = self
                    .fader
                    .play_with_fade_in(audio, spec.max_volume, spec.fade_in())
                {
                    warn!(error = %e, "Alarm is ringing without audio");
                }
            }
            None => warn!("Alarm has no audio file; ringing silently"),
        }

        self.ringing = Some(spec);
        self.transition(RingState::Ringing);
    }

    fn on_user_interacted(&mut self, identifier: &str) {
        info!(identifier, "User interacted with notification");
        self.events.push(Event::NotificationInteracted {
            identifier: identifier.to_string(),
            at: self.clock.now(),
        });
    }
}
