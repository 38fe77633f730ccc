use std::fs::File;
use std::io::BufReader;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use wakeroom_core::{AudioBackend, AudioError, AudioRef, PlaybackHandle};

/// Audio output through the default rodio device.
pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl RodioBackend {
    pub fn new() -> Result<Self, AudioError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn load(
        &mut self,
        source: &AudioRef,
        looping: bool,
    ) -> Result<Box<dyn PlaybackHandle>, AudioError> {
        let path = source.path();
        let file = File::open(path).map_err(|e| AudioError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::DecodeFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::OutputUnavailable(e.to_string()))?;
        sink.pause();
        if looping {
            sink.append(decoder.repeat_infinite());
        } else {
            sink.append(decoder);
        }
        Ok(Box::new(RodioHandle { sink }))
    }
}

struct RodioHandle {
    sink: Sink,
}

impl PlaybackHandle for RodioHandle {
    fn play(&mut self) -> Result<(), AudioError> {
        self.sink.play();
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}
