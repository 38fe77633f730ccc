use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::alarm::Recurrence;
use crate::audio::AudioRef;
use crate::ring::RingState;

/// Every state change in the system produces an Event.
/// The UI polls for events through [`EventQueue::drain`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PermissionResolved {
        granted: bool,
        at: DateTime<Local>,
    },
    AlarmArmed {
        fire_at: DateTime<Local>,
        /// First moment the registered trigger will fire.
        next_fire: Option<DateTime<Local>>,
        recurrence: Recurrence,
        at: DateTime<Local>,
    },
    AlarmCancelled {
        at: DateTime<Local>,
    },
    AlarmFired {
        identifier: String,
        at: DateTime<Local>,
    },
    /// A fired signal arrived that the coordinator refused to act on.
    FireIgnored {
        identifier: String,
        reason: String,
        at: DateTime<Local>,
    },
    NotificationInteracted {
        identifier: String,
        at: DateTime<Local>,
    },
    PlaybackStarted {
        source: AudioRef,
        looping: bool,
        volume: f32,
        at: DateTime<Local>,
    },
    PlaybackFailed {
        source: AudioRef,
        message: String,
        at: DateTime<Local>,
    },
    PlaybackStopped {
        at: DateTime<Local>,
    },
    /// Playback ended on its own (end of a non-looping source or a decode error).
    PlaybackFinished {
        at: DateTime<Local>,
    },
    FadeCompleted {
        volume: f32,
        at: DateTime<Local>,
    },
    RingStateChanged {
        from: RingState,
        to: RingState,
        at: DateTime<Local>,
    },
    PuzzleShown {
        prompt: String,
        at: DateTime<Local>,
    },
    PuzzleFailed {
        at: DateTime<Local>,
    },
    Snoozed {
        minutes: u32,
        until: DateTime<Local>,
        at: DateTime<Local>,
    },
    Dismissed {
        at: DateTime<Local>,
    },
}

/// Shared, single-threaded event buffer.
///
/// Cloned into every component at construction; all clones append to the
/// same queue so the UI sees one ordered stream.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    inner: Rc<RefCell<VecDeque<Event>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.inner.borrow_mut().push_back(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_queue() {
        let queue = EventQueue::new();
        let other = queue.clone();
        other.push(Event::PuzzleFailed { at: Local::now() });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain().len(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::Dismissed { at: Local::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Dismissed");
    }
}
