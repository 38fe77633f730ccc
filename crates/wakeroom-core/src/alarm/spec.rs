use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::audio::AudioRef;
use crate::error::ValidationError;

pub const DEFAULT_MAX_VOLUME: f32 = 1.0;
pub const DEFAULT_FADE_IN_SECS: f64 = 30.0;
/// Longest accepted fade-in, one hour.
pub const MAX_FADE_IN_SECS: f64 = 3600.0;

/// How often an armed alarm rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// Ring at the next occurrence of hour:minute, then disarm.
    #[default]
    Once,
    /// Ring every day at hour:minute until cancelled.
    Daily,
}

/// The single live alarm.
///
/// Only the hour and minute of `fire_at` are used for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSpec {
    pub fire_at: DateTime<Local>,
    pub audio: Option<AudioRef>,
    /// Target volume of the fade-in, in (0, 1].
    pub max_volume: f32,
    pub fade_in_secs: f64,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl AlarmSpec {
    pub fn new(fire_at: DateTime<Local>) -> Self {
        Self {
            fire_at,
            audio: None,
            max_volume: DEFAULT_MAX_VOLUME,
            fade_in_secs: DEFAULT_FADE_IN_SECS,
            recurrence: Recurrence::Once,
        }
    }

    pub fn with_audio(mut self, audio: Option<AudioRef>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_max_volume(mut self, max_volume: f32) -> Self {
        self.max_volume = max_volume;
        self
    }

    pub fn with_fade_in_secs(mut self, fade_in_secs: f64) -> Self {
        self.fade_in_secs = fade_in_secs;
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn hour(&self) -> u32 {
        self.fire_at.hour()
    }

    pub fn minute(&self) -> u32 {
        self.fire_at.minute()
    }

    /// Wall-clock hour:minute the alarm matches on.
    pub fn time_of_day(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }

    /// Fade-in length, clamped to [`MAX_FADE_IN_SECS`]. Unusable values
    /// fall back to [`DEFAULT_FADE_IN_SECS`].
    pub fn fade_in(&self) -> std::time::Duration {
        let secs = if valid_fade_in_secs(self.fade_in_secs) {
            self.fade_in_secs
        } else {
            DEFAULT_FADE_IN_SECS
        };
        std::time::Duration::try_from_secs_f64(secs.min(MAX_FADE_IN_SECS))
            .unwrap_or(std::time::Duration::from_secs(DEFAULT_FADE_IN_SECS as u64))
    }

    /// Reject volumes outside (0, 1] and fade durations outside
    /// (0, [`MAX_FADE_IN_SECS`]].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.max_volume > 0.0 && self.max_volume <= 1.0) {
            return Err(ValidationError::VolumeOutOfRange(self.max_volume));
        }
        if !valid_fade_in_secs(self.fade_in_secs) {
            return Err(ValidationError::InvalidFadeDuration(self.fade_in_secs));
        }
        Ok(())
    }
}

/// True for a finite fade-in in (0, [`MAX_FADE_IN_SECS`]].
pub fn valid_fade_in_secs(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0 && secs <= MAX_FADE_IN_SECS
}

/// Parse a 24-hour `HH:MM` string.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, ValidationError> {
    let invalid = |message: &str| ValidationError::InvalidTime {
        input: input.to_string(),
        message: message.to_string(),
    };

    let (hour, minute) = input
        .trim()
        .split_once(':')
        .ok_or_else(|| invalid("expected HH:MM"))?;
    let hour: u32 = hour.parse().map_err(|_| invalid("hour is not a number"))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| invalid("minute is not a number"))?;
    if hour > 23 {
        return Err(invalid("hour must be 0-23"));
    }
    if minute > 59 {
        return Err(invalid("minute must be 0-59"));
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| invalid("not a valid time"))
}

/// `time` on the same calendar day as `now`.
pub fn on_day_of(time: NaiveTime, now: DateTime<Local>) -> DateTime<Local> {
    resolve_local(now.date_naive().and_time(time))
}

/// First moment strictly after `after` whose hour:minute equals `time`.
pub fn next_occurrence(time: NaiveTime, after: DateTime<Local>) -> DateTime<Local> {
    let today = on_day_of(time, after);
    if today > after {
        return today;
    }
    let tomorrow = after.date_naive().succ_opt().unwrap_or(after.date_naive());
    resolve_local(tomorrow.and_time(time))
}

/// Map a naive local time to a zoned one, skipping forward over DST gaps.
pub(crate) fn resolve_local(naive: NaiveDateTime) -> DateTime<Local> {
    match Local.from_local_datetime(&naive).earliest() {
        Some(at) => at,
        None => Local
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| Local.from_utc_datetime(&naive)),
    }
}
