use super::AudioRef;
use crate::error::AudioError;

/// Loads audio resources into playable handles.
pub trait AudioBackend {
    /// Open and decode `source`. A looping handle repeats until stopped.
    fn load(&mut self, source: &AudioRef, looping: bool)
        -> Result<Box<dyn PlaybackHandle>, AudioError>;
}

/// One loaded, playable resource.
pub trait PlaybackHandle {
    fn play(&mut self) -> Result<(), AudioError>;

    /// Volume in [0, 1].
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// True once playback ended on its own.
    fn is_finished(&self) -> bool;

    /// Halt playback. The handle is dropped right after.
    fn stop(&mut self);
}
