//! Contracts with the host notification subsystem.
//!
//! The host owns wall-clock trigger delivery. The core only ever talks to it
//! through [`NotificationHost`], and receives its callbacks through
//! [`NotificationSink`]. Callbacks must be delivered on the thread that owns
//! the sink.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::spec::{next_occurrence, resolve_local, AlarmSpec, Recurrence};
use crate::error::HostError;

/// A wall-clock trigger as handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    pub identifier: String,
    pub hour: u32,
    pub minute: u32,
    /// Calendar day a one-shot trigger is pinned to. `None` matches every day.
    pub date: Option<NaiveDate>,
    pub repeats: bool,
}

impl TriggerRequest {
    /// Build the trigger for `spec`, resolving a one-shot alarm to the
    /// next matching day after `now`.
    pub fn for_spec(identifier: &str, spec: &AlarmSpec, now: DateTime<Local>) -> Self {
        let (date, repeats) = match spec.recurrence {
            Recurrence::Once => (
                Some(next_occurrence(spec.time_of_day(), now).date_naive()),
                false,
            ),
            Recurrence::Daily => (None, true),
        };
        Self {
            identifier: identifier.to_string(),
            hour: spec.hour(),
            minute: spec.minute(),
            date,
            repeats,
        }
    }

    fn time_of_day(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Next moment this trigger should fire, or `None` if a one-shot
    /// trigger has already passed.
    pub fn next_fire_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        match self.date {
            Some(date) => {
                let at = resolve_local(date.and_time(self.time_of_day()));
                (at >= now).then_some(at)
            }
            None => Some(next_occurrence(self.time_of_day(), now)),
        }
    }
}

/// Host notification subsystem.
pub trait NotificationHost {
    /// Ask the user for permission to notify.
    fn request_permission(&mut self) -> Result<bool, HostError>;

    /// Register `request`, replacing any trigger with the same identifier.
    fn register_trigger(&mut self, request: TriggerRequest) -> Result<(), HostError>;

    /// Remove the trigger with `identifier`. Unknown identifiers are ignored.
    fn cancel_trigger(&mut self, identifier: &str);
}

/// Receiver of host callbacks.
pub trait NotificationSink {
    /// The trigger with `identifier` fired.
    fn on_fired(&mut self, identifier: &str);

    /// The user clicked the displayed notification.
    fn on_user_interacted(&mut self, identifier: &str);
}
