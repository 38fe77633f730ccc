use std::time::Duration;

use clap::Subcommand;
use wakeroom_core::Config;

use super::audio_ref;
use crate::host::{self, audio::RodioBackend, Session};

#[derive(Subcommand)]
pub enum SoundAction {
    /// Play a file once at full volume (Ctrl-C stops it)
    Test {
        /// Audio file (mp3, wav, flac, ogg)
        file: String,
    },
}

pub fn run(action: SoundAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SoundAction::Test { file } => {
            let source = audio_ref(&file)?;
            let config = Config::load_or_default();
            let tick_interval = Duration::from_millis(config.session.tick_interval_ms);
            let backend = RodioBackend::new()?;

            let rt = host::runtime()?;
            rt.block_on(async {
                let session = Session::new(Box::new(backend), config.alarm.snooze_minutes, tick_interval);
                session.run_sound_test(&source).await
            })
        }
    }
}
