//! Audio output that writes raw PCM and paces completion in real time.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use shtepy_audio::pcm::SampleBuffer;
use shtepy_speech::{AudioOutput, OnComplete, OutputError, PlaybackHandle};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Plays buffers by writing them as signed 16-bit little-endian PCM.
///
/// The file is opened in `play` and written off the caller's thread;
/// completion fires once the buffer's duration has elapsed after the write,
/// as it would on a sound card. Each played buffer replaces the file's
/// previous contents.
pub struct PcmFileSink {
    path: Option<PathBuf>,
}

impl PcmFileSink {
    /// Writes played audio to `path`; with `None` audio is only paced.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

struct PacedHandle {
    cancel: CancellationToken,
}

impl PlaybackHandle for PacedHandle {
    fn stop(&self) {
        self.cancel.cancel();
    }
}

impl AudioOutput for PcmFileSink {
    fn play(
        &self,
        buffer: SampleBuffer,
        on_complete: OnComplete,
    ) -> Result<Box<dyn PlaybackHandle>, OutputError> {
        let runtime = Handle::try_current()
            .map_err(|e| OutputError::Unavailable(format!("no async runtime: {}", e)))?;

        let file = match &self.path {
            Some(path) => Some((path.clone(), File::create(path)?)),
            None => None,
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let duration = buffer.duration();
        runtime.spawn(async move {
            if let Some((path, file)) = file {
                let write = tokio::task::spawn_blocking(move || -> io::Result<u64> {
                    let mut w = BufWriter::new(file);
                    let written = buffer.write_l16_to(&mut w)?;
                    w.flush()?;
                    Ok(written)
                });
                tokio::select! {
                    _ = token.cancelled() => return,
                    result = write => match result {
                        Ok(Ok(bytes)) => debug!(path = %path.display(), bytes, "pcm written"),
                        Ok(Err(e)) => warn!(path = %path.display(), error = %e, "pcm write failed"),
                        Err(e) => warn!(path = %path.display(), error = %e, "pcm writer panicked"),
                    },
                }
            }

            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    if !token.is_cancelled() {
                        on_complete();
                    }
                }
            }
        });

        Ok(Box::new(PacedHandle { cancel }))
    }
}
