pub mod alarm;
pub mod config;
pub mod puzzle;
pub mod sound;

use std::path::Path;

use wakeroom_core::AudioRef;

/// File types the audio backend can decode.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg"];

/// Accept `path` as an alarm sound if it has a playable extension.
pub fn audio_ref(path: &str) -> Result<AudioRef, Box<dyn std::error::Error>> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(format!(
            "unsupported audio file '{path}' (expected one of: {})",
            AUDIO_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(AudioRef::new(path))
}
