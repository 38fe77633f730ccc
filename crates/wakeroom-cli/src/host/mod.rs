//! Host adapters: real trigger delivery, audio output and the terminal loop.

pub mod audio;
pub mod notify;
pub mod session;

use tracing::warn;
use wakeroom_core::simulation::SilentBackend;
use wakeroom_core::AudioBackend;

pub use session::{runtime, Session};

/// Pick the audio backend, falling back to silence when no device opens.
pub fn audio_backend(mute: bool) -> Box<dyn AudioBackend> {
    if mute {
        return Box::new(SilentBackend);
    }
    match audio::RodioBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!(error = %e, "No audio output; the alarm will ring silently");
            Box::new(SilentBackend)
        }
    }
}
