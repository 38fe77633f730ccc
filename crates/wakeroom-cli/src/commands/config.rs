use clap::Subcommand;
use wakeroom_core::{Config, ConfigError};

/// Keys users usually want, shown when a key is not recognised.
const ALARM_KEYS: &[&str] = &[
    "alarm.time",
    "alarm.audio_file",
    "alarm.max_volume",
    "alarm.fade_in_secs",
    "alarm.snooze_minutes",
    "alarm.recurrence",
    "session.tick_interval_ms",
];

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "alarm.time", "alarm.max_volume")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value (empty string clears an optional value)
        value: String,
    },
    /// List all config values
    List,
    /// Print the config file location
    Path,
    /// Reset config to defaults
    Reset,
}

fn unknown_key(key: &str) -> Box<dyn std::error::Error> {
    format!("unknown key: {key} (known keys: {})", ALARM_KEYS.join(", ")).into()
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or_else(|| unknown_key(&key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            match config.set(&key, &value) {
                Ok(()) => {}
                Err(ConfigError::UnknownKey(_)) => return Err(unknown_key(&key)),
                Err(e) => return Err(e.into()),
            }
            let shown = config.get(&key).unwrap_or_default();
            if shown.is_empty() {
                println!("{key} cleared");
            } else {
                println!("{key} = {shown}");
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config at {} reset to defaults", Config::path()?.display());
        }
    }
    Ok(())
}
