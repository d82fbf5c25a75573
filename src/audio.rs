use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("could not create sink: {0}")]
    Play(#[from] rodio::PlayError),
    #[error("could not decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("could not open audio file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioRequest {
    pub path: PathBuf,
    /// 0..=100
    pub volume: u8,
}

impl AudioRequest {
    /// Relative names are resolved against `base`, Windows separators are
    /// normalized first.
    pub fn new(base: &Path, file: &str, volume: i32) -> Self {
        let file = file.replace('\\', "/");
        Self {
            path: base.join(file),
            volume: volume.clamp(0, 100) as u8,
        }
    }

    pub fn level(&self) -> f32 {
        f32::from(self.volume) / 100.0
    }
}

/// Plays at most one source; a new request replaces the current one.
#[derive(Default)]
pub struct Player {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    current: Option<PathBuf>,
}

impl Player {
    /// The file still producing sound. A source that ran out counts as
    /// stopped.
    pub fn audible(&self) -> Option<&Path> {
        let sink = self.sink.as_ref()?;
        if sink.empty() {
            return None;
        }
        self.current.as_deref()
    }

    fn handle(&mut self) -> Result<&OutputStreamHandle, AudioError> {
        let output = match self.output.take() {
            Some(output) => output,
            None => OutputStream::try_default()?,
        };
        Ok(&self.output.insert(output).1)
    }

    /// Missing files are skipped without touching the current source.
    pub fn play(&mut self, request: &AudioRequest) -> Result<(), AudioError> {
        if !request.path.is_file() {
            log::debug!("audio file missing, skipped: {}", request.path.display());
            return Ok(());
        }
        log::debug!("playing: {} {}", request.path.display(), request.volume);
        let source = Decoder::new(BufReader::new(File::open(&request.path)?))?;
        let sink = Sink::try_new(self.handle()?)?;
        sink.set_volume(request.level());
        sink.append(source);
        if let Some(previous) = self.sink.replace(sink) {
            previous.stop();
        }
        self.current = Some(request.path.clone());
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.current = None;
    }
}
