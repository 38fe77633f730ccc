mod backend;
mod fader;
mod ramp;

pub use backend::{AudioBackend, PlaybackHandle};
pub use fader::{AudioFader, PlaybackState};
pub use ramp::{FadeRamp, FADE_STEPS};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reference to a playable audio resource on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioRef(PathBuf);

impl AudioRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Last path component, for display.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl std::fmt::Display for AudioRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
