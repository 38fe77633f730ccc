//! Integration tests for the full alarm flow: arm, fire, fade, snooze, solve.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone};
use wakeroom_core::simulation::{FakeBackend, RecordingHost};
use wakeroom_core::{
    AlarmSpec, AudioRef, Clock, Event, ManualClock, NotificationSink, PuzzleGate, PuzzleOutcome,
    Recurrence, RingState, TriggerCoordinator, ALARM_IDENTIFIER,
};

fn eight_am() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 6, 15, 8, 0, 0).unwrap()
}

fn setup() -> (TriggerCoordinator, RecordingHost, FakeBackend, ManualClock) {
    let clock = ManualClock::new(eight_am() - Duration::hours(8));
    let host = RecordingHost::new();
    let backend = FakeBackend::new();
    let coordinator = TriggerCoordinator::new(
        Box::new(host.clone()),
        Box::new(backend.clone()),
        PuzzleGate::with_seed(2026),
        Arc::new(clock.clone()),
    )
    .with_snooze_minutes(5);
    (coordinator, host, backend, clock)
}

fn wake_spec() -> AlarmSpec {
    AlarmSpec::new(eight_am())
        .with_audio(Some(AudioRef::new("/music/a.mp3")))
        .with_max_volume(0.8)
        .with_fade_in_secs(10.0)
}

/// Tick the coordinator every 50ms for `secs` seconds, like the session loop.
fn run_for(coordinator: &mut TriggerCoordinator, clock: &ManualClock, secs: i64) {
    for _ in 0..(secs * 20) {
        clock.advance_millis(50);
        coordinator.tick();
    }
}

#[test]
fn test_fire_fades_in_to_max_volume() {
    let (mut coordinator, host, backend, clock) = setup();
    coordinator.arm(wake_spec()).unwrap();

    let trigger = host.trigger(ALARM_IDENTIFIER).unwrap();
    assert_eq!((trigger.hour, trigger.minute), (8, 0));
    assert_eq!(trigger.next_fire_after(clock.now()), Some(eight_am()));

    clock.set(eight_am());
    coordinator.on_fired(ALARM_IDENTIFIER);
    assert_eq!(coordinator.state(), RingState::Ringing);
    assert!(coordinator.fader().is_playing());
    assert_eq!(coordinator.fader().volume(), 0.0);

    run_for(&mut coordinator, &clock, 10);
    assert_eq!(coordinator.fader().volume(), 0.8);
    assert_eq!(backend.volume(), 0.8);

    let events = coordinator.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::FadeCompleted { volume, .. } if *volume == 0.8)));
}

#[test]
fn test_snooze_replaces_trigger_and_rings_again() {
    let (mut coordinator, host, _, clock) = setup();
    coordinator.arm(wake_spec()).unwrap();
    clock.set(eight_am());
    coordinator.on_fired(ALARM_IDENTIFIER);
    run_for(&mut coordinator, &clock, 3);

    let now = clock.now();
    assert!(coordinator.snooze().unwrap());
    assert_eq!(coordinator.state(), RingState::Snoozed);
    assert!(!coordinator.fader().is_playing());

    let spec = coordinator.scheduler().spec().unwrap().clone();
    assert_eq!(spec.fire_at, now + Duration::minutes(5));
    assert_eq!(spec.recurrence, Recurrence::Once);
    assert_eq!(host.active_triggers(), vec![ALARM_IDENTIFIER.to_string()]);
    assert_eq!(host.trigger(ALARM_IDENTIFIER).unwrap().minute, 5);

    coordinator.close_snoozed();
    clock.advance(Duration::minutes(5));
    coordinator.on_fired(ALARM_IDENTIFIER);
    assert_eq!(coordinator.state(), RingState::Ringing);

    run_for(&mut coordinator, &clock, 10);
    assert_eq!(coordinator.fader().volume(), 0.8);
}

#[test]
fn test_puzzle_gate_controls_dismissal() {
    let (mut coordinator, _, _, clock) = setup();
    coordinator.arm(wake_spec()).unwrap();
    clock.set(eight_am());
    coordinator.on_fired(ALARM_IDENTIFIER);
    assert!(coordinator.request_stop());

    let challenge = *coordinator.challenge().unwrap();
    let wrong = (challenge.expected_answer + 3).to_string();
    assert_eq!(coordinator.submit_answer(&wrong), PuzzleOutcome::Incorrect);
    assert_eq!(coordinator.state(), RingState::SolvingPuzzle);
    assert_eq!(coordinator.challenge(), Some(&challenge));
    assert!(coordinator.fader().is_playing());

    let right = challenge.expected_answer.to_string();
    assert_eq!(coordinator.submit_answer(&right), PuzzleOutcome::Solved);
    assert_eq!(coordinator.state(), RingState::Idle);
    assert!(!coordinator.fader().is_playing());
}

#[test]
fn test_cancel_then_late_fire_is_ignored() {
    let (mut coordinator, host, backend, clock) = setup();
    coordinator.arm(wake_spec()).unwrap();
    coordinator.disarm();

    assert!(!coordinator.scheduler().is_armed());
    assert!(coordinator.scheduler().spec().is_none());
    assert!(host.active_triggers().is_empty());
    assert!(host.cancel_calls().contains(&ALARM_IDENTIFIER.to_string()));

    clock.set(eight_am());
    coordinator.drain_events();
    coordinator.on_fired(ALARM_IDENTIFIER);
    assert_eq!(coordinator.state(), RingState::Idle);
    assert!(backend.loads().is_empty());
    assert!(matches!(
        coordinator.drain_events().as_slice(),
        [Event::FireIgnored { .. }]
    ));
}

#[test]
fn test_daily_alarm_rings_on_consecutive_days() {
    let (mut coordinator, host, _, clock) = setup();
    coordinator
        .arm(wake_spec().with_recurrence(Recurrence::Daily))
        .unwrap();

    for day in 0..3 {
        clock.set(eight_am() + Duration::days(day));
        coordinator.on_fired(ALARM_IDENTIFIER);
        assert_eq!(coordinator.state(), RingState::Ringing, "day {day}");
        coordinator.request_stop();
        let answer = coordinator.challenge().unwrap().expected_answer.to_string();
        assert_eq!(coordinator.submit_answer(&answer), PuzzleOutcome::Solved);
        assert!(coordinator.scheduler().is_armed());
    }
    assert_eq!(host.register_calls(), 1);
}

#[test]
fn test_event_stream_tells_the_whole_story() {
    let (mut coordinator, _, _, clock) = setup();
    coordinator.request_permission();
    coordinator.arm(wake_spec()).unwrap();
    clock.set(eight_am());
    coordinator.on_fired(ALARM_IDENTIFIER);
    coordinator.snooze().unwrap();
    coordinator.close_snoozed();

    let kinds: Vec<&'static str> = coordinator
        .drain_events()
        .iter()
        .map(|e| match e {
            Event::PermissionResolved { .. } => "permission",
            Event::AlarmArmed { .. } => "armed",
            Event::AlarmFired { .. } => "fired",
            Event::PlaybackStarted { .. } => "playing",
            Event::RingStateChanged { .. } => "state",
            Event::PlaybackStopped { .. } => "stopped",
            Event::Snoozed { .. } => "snoozed",
            _ => "other",
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            "permission",
            "armed",
            "fired",
            "playing",
            "state",
            "stopped",
            "armed",
            "snoozed",
            "state",
            "state",
        ]
    );
}
