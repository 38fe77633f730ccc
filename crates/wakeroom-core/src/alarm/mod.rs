mod host;
mod scheduler;
mod spec;

pub use host::{NotificationHost, NotificationSink, TriggerRequest};
pub use scheduler::{AlarmScheduler, ALARM_IDENTIFIER};
pub use spec::{
    next_occurrence, on_day_of, parse_time_of_day, valid_fade_in_secs, AlarmSpec, Recurrence,
    DEFAULT_FADE_IN_SECS, DEFAULT_MAX_VOLUME, MAX_FADE_IN_SECS,
};
