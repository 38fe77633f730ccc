//! # Wakeroom Core Library
//!
//! This library provides the core logic of the Wakeroom alarm clock. It has
//! no I/O of its own: wall-clock trigger delivery and audio output are host
//! collaborators behind traits, and the CLI binary supplies real ones.
//!
//! ## Architecture
//!
//! - **Alarm Scheduler**: holds the single armed alarm and keeps exactly one
//!   host trigger registered for it
//! - **Audio Fader**: one playback handle with a 100-step linear fade-in,
//!   advanced by the caller's periodic `tick()`
//! - **Ring Coordinator**: the Idle / Ringing / Snoozed / SolvingPuzzle state
//!   machine, including the arithmetic dismissal puzzle
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TriggerCoordinator`]: Ring state machine and entry point for hosts
//! - [`AlarmScheduler`]: Single-alarm scheduling
//! - [`AudioFader`]: Playback and fade-in
//! - [`PuzzleGate`]: Challenge generation and checking
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod audio;
pub mod clock;
pub mod error;
pub mod events;
pub mod ring;
pub mod simulation;
pub mod storage;

pub use alarm::{
    AlarmScheduler, AlarmSpec, NotificationHost, NotificationSink, Recurrence, TriggerRequest,
    ALARM_IDENTIFIER,
};
pub use audio::{AudioBackend, AudioFader, AudioRef, PlaybackHandle, PlaybackState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AudioError, ConfigError, CoreError, HostError, ValidationError};
pub use events::{Event, EventQueue};
pub use ring::{
    AlarmSnapshot, PuzzleChallenge, PuzzleGate, PuzzleOutcome, RingState, TriggerCoordinator,
};
pub use storage::Config;
