//! Interactive terminal session.
//!
//! Owns the coordinator and is the only place its state changes. Trigger
//! tasks and the stdin reader talk to it through a [`HostSignal`] channel;
//! a fixed interval drives the fade ramp.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use wakeroom_core::{
    AlarmSpec, AudioBackend, AudioRef, Clock, Event, NotificationSink, PuzzleGate, PuzzleOutcome,
    RingState, SystemClock, TriggerCoordinator, ALARM_IDENTIFIER,
};

use super::notify::{HostSignal, TokioNotificationHost};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Build the single-threaded runtime the session runs on.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

enum Step {
    Signal(Option<HostSignal>),
    Tick,
    Interrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    coordinator: TriggerCoordinator,
    signals: UnboundedReceiver<HostSignal>,
    sender: UnboundedSender<HostSignal>,
    tick_interval: Duration,
}

impl Session {
    /// Must be called inside the runtime: trigger tasks are spawned on it.
    pub fn new(backend: Box<dyn AudioBackend>, snooze_minutes: u32, tick_interval: Duration) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let (sender, signals) = mpsc::unbounded_channel();
        let host = TokioNotificationHost::new(sender.clone(), Arc::clone(&clock));
        let coordinator = TriggerCoordinator::new(
            Box::new(host),
            backend,
            PuzzleGate::new(),
            clock,
        )
        .with_snooze_minutes(snooze_minutes);
        Self {
            coordinator,
            signals,
            sender,
            tick_interval,
        }
    }

    /// Arm `spec` and wait for it, handling keys until the alarm is
    /// dismissed and nothing is left armed, or the user quits.
    pub async fn run_alarm(mut self, spec: AlarmSpec) -> CliResult {
        self.coordinator.request_permission();
        let armed = self.coordinator.arm(spec);
        self.render();
        armed?;

        spawn_stdin_reader(self.sender.clone());
        println!("{}", help(RingState::Idle));

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            let step = tokio::select! {
                signal = self.signals.recv() => Step::Signal(signal),
                _ = ticker.tick() => Step::Tick,
                _ = &mut ctrl_c => Step::Interrupt,
            };

            let flow = match step {
                Step::Signal(Some(HostSignal::Fired(identifier))) => {
                    self.coordinator.on_fired(&identifier);
                    Flow::Continue
                }
                Step::Signal(Some(HostSignal::Input(line))) => self.handle_input(line.trim()),
                Step::Signal(Some(HostSignal::InputClosed)) => {
                    debug!("stdin closed; keys are no longer read");
                    Flow::Continue
                }
                Step::Signal(None) => Flow::Quit,
                Step::Tick => {
                    self.coordinator.tick();
                    Flow::Continue
                }
                Step::Interrupt => {
                    info!("Interrupted");
                    self.coordinator.disarm();
                    Flow::Quit
                }
            };
            self.render();

            let finished = self.coordinator.state() == RingState::Idle
                && !self.coordinator.scheduler().is_armed();
            if flow == Flow::Quit || finished {
                break;
            }
        }
        Ok(())
    }

    /// Play `source` once and return when it ends or on Ctrl-C.
    pub async fn run_sound_test(mut self, source: &AudioRef) -> CliResult {
        let started = self.coordinator.test_sound(source);
        self.render();
        started?;

        let mut ticker = tokio::time::interval(self.tick_interval);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        while self.coordinator.fader().is_playing() {
            tokio::select! {
                _ = ticker.tick() => self.coordinator.tick(),
                _ = &mut ctrl_c => self.coordinator.stop_test_sound(),
            }
            self.render();
        }
        Ok(())
    }

    fn handle_input(&mut self, key: &str) -> Flow {
        let state = self.coordinator.state();
        if state == RingState::Ringing {
            self.coordinator.on_user_interacted(ALARM_IDENTIFIER);
        }

        match (state, key) {
            (RingState::Ringing, "s") => {
                if let Err(e) = self.coordinator.snooze() {
                    println!("snooze could not be scheduled: {e}");
                }
            }
            (RingState::Ringing | RingState::Snoozed, "d") => {
                self.coordinator.request_stop();
            }
            (RingState::Snoozed, "c") => {
                self.coordinator.close_snoozed();
            }
            (RingState::SolvingPuzzle, answer) => {
                if self.coordinator.submit_answer(answer) == PuzzleOutcome::Incorrect {
                    if let Some(challenge) = self.coordinator.challenge() {
                        println!("{challenge}");
                    }
                }
            }
            (RingState::Idle, "x") => self.coordinator.disarm(),
            (RingState::Idle, "q") => return Flow::Quit,
            (state, _) => println!("{}", help(state)),
        }
        Flow::Continue
    }

    fn render(&mut self) {
        for event in self.coordinator.drain_events() {
            if let Some(line) = describe(&event) {
                println!("{line}");
            }
        }
    }
}

fn spawn_stdin_reader(sender: UnboundedSender<HostSignal>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if sender.send(HostSignal::Input(line)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = sender.send(HostSignal::InputClosed);
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    let _ = sender.send(HostSignal::InputClosed);
                    break;
                }
            }
        }
    });
}

fn help(state: RingState) -> &'static str {
    match state {
        RingState::Idle => "[x] cancel alarm  [q] quit",
        RingState::Ringing => "[s] snooze  [d] dismiss",
        RingState::Snoozed => "[c] close  [d] dismiss",
        RingState::SolvingPuzzle => "type the answer and press enter",
    }
}

/// User-facing line for `event`, if it deserves one.
fn describe(event: &Event) -> Option<String> {
    match event {
        Event::AlarmArmed {
            next_fire: Some(next),
            ..
        } => Some(format!("alarm set for {}", next.format("%a %H:%M"))),
        Event::AlarmArmed { next_fire: None, .. } => Some("alarm set".to_string()),
        Event::AlarmCancelled { .. } => Some("alarm cancelled".to_string()),
        Event::AlarmFired { .. } => Some(format!("ALARM!  {}", help(RingState::Ringing))),
        Event::PlaybackFailed { message, .. } => Some(format!("audio unavailable: {message}")),
        Event::PlaybackStarted {
            source,
            looping: false,
            ..
        } => Some(format!("playing {}", source.file_name())),
        Event::PuzzleShown { prompt, .. } => Some(format!("solve to stop: {prompt}")),
        Event::PuzzleFailed { .. } => Some("wrong answer, try again".to_string()),
        Event::Snoozed { until, .. } => Some(format!(
            "snoozed until {}  {}",
            until.format("%H:%M"),
            help(RingState::Snoozed)
        )),
        Event::Dismissed { .. } => Some("alarm dismissed".to_string()),
        Event::PlaybackFinished { .. } => Some("playback finished".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Local, TimeZone};
    use wakeroom_core::simulation::FakeBackend;

    #[test]
    fn describe_renders_user_facing_events() {
        let at = Local.with_ymd_and_hms(2026, 6, 15, 7, 0, 0).unwrap();
        let snoozed = Event::Snoozed {
            minutes: 5,
            until: at + ChronoDuration::minutes(5),
            at,
        };
        assert_eq!(
            describe(&snoozed).as_deref(),
            Some("snoozed until 07:05  [c] close  [d] dismiss")
        );
        assert_eq!(
            describe(&Event::PuzzleShown {
                prompt: "12 + 30 = ?".into(),
                at
            })
            .as_deref(),
            Some("solve to stop: 12 + 30 = ?")
        );
        assert_eq!(describe(&Event::FadeCompleted { volume: 1.0, at }), None);
    }

    #[tokio::test]
    async fn keys_drive_the_ring_flow() {
        let backend = FakeBackend::new();
        let mut session = Session::new(Box::new(backend.clone()), 5, Duration::from_millis(50));
        let spec = AlarmSpec::new(Local::now() + ChronoDuration::hours(1))
            .with_audio(Some(AudioRef::new("/music/wake.mp3")));
        session.coordinator.arm(spec).unwrap();
        session.coordinator.on_fired(ALARM_IDENTIFIER);
        assert_eq!(session.coordinator.state(), RingState::Ringing);

        assert_eq!(session.handle_input("s"), Flow::Continue);
        assert_eq!(session.coordinator.state(), RingState::Snoozed);
        assert_eq!(session.handle_input("d"), Flow::Continue);
        assert_eq!(session.coordinator.state(), RingState::SolvingPuzzle);

        let answer = session
            .coordinator
            .challenge()
            .unwrap()
            .expected_answer
            .to_string();
        session.handle_input(&answer);
        assert_eq!(session.coordinator.state(), RingState::Idle);
        assert!(!backend.is_playing());
        assert_eq!(session.handle_input("q"), Flow::Quit);
    }
}
