use std::time::Duration;

use chrono::{DateTime, Local};
use clap::Subcommand;
use serde::Serialize;
use wakeroom_core::alarm::{next_occurrence, parse_time_of_day};
use wakeroom_core::storage::AlarmConfig;
use wakeroom_core::{AlarmSpec, Config, Recurrence, TriggerRequest, ALARM_IDENTIFIER};

use super::audio_ref;
use crate::host::{self, Session};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Arm the alarm and wait for it in this terminal
    Run {
        /// Wake time, HH:MM 24-hour (defaults to alarm.time)
        #[arg(long)]
        at: Option<String>,
        /// Audio file to ring with
        #[arg(long)]
        audio: Option<String>,
        /// Maximum volume, 0 < v <= 1
        #[arg(long)]
        volume: Option<f32>,
        /// Fade-in duration in seconds
        #[arg(long)]
        fade: Option<f64>,
        /// Snooze length in minutes, at least 1
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        snooze: Option<u32>,
        /// Ring every day instead of once
        #[arg(long)]
        daily: bool,
        /// Run without audio output
        #[arg(long)]
        mute: bool,
    },
    /// Print when an alarm would next fire, as JSON
    Preview {
        /// Wake time, HH:MM 24-hour (defaults to alarm.time)
        #[arg(long)]
        at: Option<String>,
        /// Ring every day instead of once
        #[arg(long)]
        daily: bool,
    },
}

/// Command-line values that override the configured alarm defaults.
#[derive(Debug, Default)]
struct Overrides {
    at: Option<String>,
    audio: Option<String>,
    volume: Option<f32>,
    fade: Option<f64>,
    daily: bool,
}

#[derive(Serialize)]
struct Preview {
    time: String,
    recurrence: Recurrence,
    next_fire: Option<DateTime<Local>>,
}

fn build_spec(
    defaults: &AlarmConfig,
    overrides: Overrides,
    now: DateTime<Local>,
) -> Result<AlarmSpec, Box<dyn std::error::Error>> {
    let time = overrides
        .at
        .or_else(|| defaults.time.clone())
        .ok_or("no alarm time: pass --at HH:MM or set alarm.time")?;
    let time = parse_time_of_day(&time)?;

    let audio = overrides
        .audio
        .or_else(|| defaults.audio_file.clone())
        .map(|path| audio_ref(&path))
        .transpose()?;
    let recurrence = if overrides.daily {
        Recurrence::Daily
    } else {
        defaults.recurrence
    };

    let spec = AlarmSpec::new(next_occurrence(time, now))
        .with_audio(audio)
        .with_max_volume(overrides.volume.unwrap_or(defaults.max_volume))
        .with_fade_in_secs(overrides.fade.unwrap_or(defaults.fade_in_secs))
        .with_recurrence(recurrence);
    spec.validate()?;
    Ok(spec)
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    match action {
        AlarmAction::Run {
            at,
            audio,
            volume,
            fade,
            snooze,
            daily,
            mute,
        } => {
            let overrides = Overrides {
                at,
                audio,
                volume,
                fade,
                daily,
            };
            let spec = build_spec(&config.alarm, overrides, Local::now())?;
            let snooze_minutes = snooze.unwrap_or(config.alarm.snooze_minutes);
            let tick_interval = Duration::from_millis(config.session.tick_interval_ms);

            let rt = host::runtime()?;
            let result = rt.block_on(async {
                let session = Session::new(host::audio_backend(mute), snooze_minutes, tick_interval);
                session.run_alarm(spec).await
            });
            // The stdin reader may still be parked on a blocking read.
            rt.shutdown_background();
            result
        }
        AlarmAction::Preview { at, daily } => {
            let now = Local::now();
            let overrides = Overrides {
                at,
                daily,
                ..Overrides::default()
            };
            // Preview does not need a playable file.
            let defaults = AlarmConfig {
                audio_file: None,
                ..config.alarm
            };
            let spec = build_spec(&defaults, overrides, now)?;
            let request = TriggerRequest::for_spec(ALARM_IDENTIFIER, &spec, now);
            let preview = Preview {
                time: spec.time_of_day().format("%H:%M").to_string(),
                recurrence: spec.recurrence,
                next_fire: request.next_fire_after(now),
            };
            println!("{}", serde_json::to_string_pretty(&preview)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;

    #[derive(Parser)]
    struct AlarmCli {
        #[command(subcommand)]
        action: AlarmAction,
    }

    #[test]
    fn zero_snooze_flag_is_rejected() {
        assert!(AlarmCli::try_parse_from(["wakeroom", "run", "--snooze", "0"]).is_err());

        let parsed = AlarmCli::try_parse_from(["wakeroom", "run", "--snooze", "1"]).unwrap();
        assert!(matches!(
            parsed.action,
            AlarmAction::Run {
                snooze: Some(1),
                ..
            }
        ));
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let defaults = AlarmConfig {
            time: Some("06:45".into()),
            max_volume: 0.5,
            ..AlarmConfig::default()
        };
        let overrides = Overrides {
            at: Some("07:15".into()),
            volume: Some(0.9),
            daily: true,
            ..Overrides::default()
        };
        let spec = build_spec(&defaults, overrides, now()).unwrap();
        assert_eq!((spec.hour(), spec.minute()), (7, 15));
        assert_eq!(spec.max_volume, 0.9);
        assert_eq!(spec.fade_in_secs, defaults.fade_in_secs);
        assert_eq!(spec.recurrence, Recurrence::Daily);
    }

    #[test]
    fn past_time_rolls_to_tomorrow() {
        let overrides = Overrides {
            at: Some("08:00".into()),
            ..Overrides::default()
        };
        let spec = build_spec(&AlarmConfig::default(), overrides, now()).unwrap();
        assert_eq!(spec.fire_at, Local.with_ymd_and_hms(2026, 6, 16, 8, 0, 0).unwrap());
    }

    #[test]
    fn missing_or_bad_input_is_rejected() {
        assert!(build_spec(&AlarmConfig::default(), Overrides::default(), now()).is_err());

        let bad_time = Overrides {
            at: Some("24:00".into()),
            ..Overrides::default()
        };
        assert!(build_spec(&AlarmConfig::default(), bad_time, now()).is_err());

        let bad_volume = Overrides {
            at: Some("07:00".into()),
            volume: Some(1.5),
            ..Overrides::default()
        };
        assert!(build_spec(&AlarmConfig::default(), bad_volume, now()).is_err());

        let bad_audio = Overrides {
            at: Some("07:00".into()),
            audio: Some("notes.txt".into()),
            ..Overrides::default()
        };
        assert!(build_spec(&AlarmConfig::default(), bad_audio, now()).is_err());

        let huge_fade = Overrides {
            at: Some("07:00".into()),
            fade: Some(1e20),
            ..Overrides::default()
        };
        assert!(build_spec(&AlarmConfig::default(), huge_fade, now()).is_err());
    }
}
