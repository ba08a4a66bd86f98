//! Platform audio output.

use shtepy_audio::pcm::SampleBuffer;
use std::io;

/// Callback fired once when a buffer has finished playing on its own.
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

/// Error type for audio output operations.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("output unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("other error: {0}")]
    Other(String),
}

/// An audio output endpoint that plays decoded buffers.
pub trait AudioOutput: Send + Sync {
    /// Starts playing `buffer`.
    ///
    /// `on_complete` is invoked when playback ends naturally. It must not be
    /// invoked after the returned handle has been stopped.
    fn play(
        &self,
        buffer: SampleBuffer,
        on_complete: OnComplete,
    ) -> Result<Box<dyn PlaybackHandle>, OutputError>;
}

/// Controls a buffer that is currently playing.
pub trait PlaybackHandle: Send + Sync {
    /// Stops playback immediately. Calling it more than once has no effect.
    fn stop(&self);
}
