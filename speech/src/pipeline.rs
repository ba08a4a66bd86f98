//! Narration playback pipeline.
//!
//! A [`SpeechPlaybackPipeline`] owns at most one narration at a time. Each
//! call to [`start`](SpeechPlaybackPipeline::start) takes a new epoch; every
//! resumption of the request task compares its epoch against the current one
//! under the pipeline lock, so a superseded request or a late completion
//! callback can never overwrite the state of a newer narration.
//!
//! Transitions for one request run strictly
//! `Idle -> Requesting -> Decoding -> Playing -> Idle`, or end in `Error` at
//! any step.
//!
//! `Playing` is published only once the output's [`PlaybackHandle`] is held,
//! so a cancel observed in `Playing` always has a handle to stop. While the
//! output is starting the pipeline stays in `Decoding`; a cancel there marks
//! the epoch stale and the handle is stopped as soon as it arrives.

use crate::{
    AudioOutput, OnComplete, PlaybackError, PlaybackHandle, PlaybackRequest, PlaybackState,
    Synthesizer,
};
use parking_lot::Mutex;
use shtepy_audio::pcm::SampleBuffer;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Requests, decodes, and plays synthesized speech.
///
/// Cloning is cheap; clones share the same lifecycle.
#[derive(Clone)]
pub struct SpeechPlaybackPipeline {
    inner: Arc<Inner>,
}

struct Inner {
    synthesizer: Arc<dyn Synthesizer>,
    output: Arc<dyn AudioOutput>,
    slot: Mutex<Slot>,
    state: watch::Sender<PlaybackState>,
}

#[derive(Default)]
struct Slot {
    epoch: u64,
    handle: Option<Box<dyn PlaybackHandle>>,
    /// Epoch whose output finished before `play` returned its handle.
    finished_early: Option<u64>,
}

impl SpeechPlaybackPipeline {
    /// Creates an idle pipeline.
    pub fn new(synthesizer: Arc<dyn Synthesizer>, output: Arc<dyn AudioOutput>) -> Self {
        let (state, _) = watch::channel(PlaybackState::Idle);
        Self {
            inner: Arc::new(Inner {
                synthesizer,
                output,
                slot: Mutex::new(Slot::default()),
                state,
            }),
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> PlaybackState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state.subscribe()
    }

    /// Returns the epoch of the most recent start or cancel.
    pub fn epoch(&self) -> u64 {
        self.inner.slot.lock().epoch
    }

    /// Starts a narration, superseding any request or playback in flight.
    ///
    /// Must be called from within a tokio runtime. Returns
    /// [`PlaybackError::EmptyText`] without touching the pipeline when the
    /// text is blank; every other failure surfaces as
    /// [`PlaybackState::Error`].
    pub fn start(&self, request: PlaybackRequest) -> Result<(), PlaybackError> {
        if request.text.trim().is_empty() {
            return Err(PlaybackError::EmptyText);
        }

        let (epoch, superseded) = {
            let mut slot = self.inner.slot.lock();
            let superseded = slot.handle.take();
            slot.epoch += 1;
            self.inner.state.send_replace(PlaybackState::Requesting);
            (slot.epoch, superseded)
        };
        if let Some(handle) = superseded {
            debug!(epoch, "stopping superseded playback");
            handle.stop();
        }

        debug!(epoch, voice = %request.voice_id, "narration requested");
        tokio::spawn(self.inner.clone().run(epoch, request));
        Ok(())
    }

    /// Cancels the narration in flight.
    ///
    /// Playing audio is stopped before this returns; a pending request is
    /// marked stale and its result discarded when it arrives. Does nothing
    /// unless a narration is active.
    pub fn cancel(&self) {
        let (epoch, handle) = {
            let mut slot = self.inner.slot.lock();
            if !self.inner.state.borrow().is_active() {
                return;
            }
            slot.epoch += 1;
            self.inner.state.send_replace(PlaybackState::Cancelled);
            self.inner.state.send_replace(PlaybackState::Idle);
            (slot.epoch, slot.handle.take())
        };
        debug!(epoch, stopped = handle.is_some(), "narration cancelled");
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    /// Cancels the active narration, or starts `request` when none is active.
    ///
    /// Returns true if a new narration was started.
    pub fn toggle(&self, request: PlaybackRequest) -> Result<bool, PlaybackError> {
        if self.state().is_active() {
            self.cancel();
            return Ok(false);
        }
        self.start(request)?;
        Ok(true)
    }

    /// Waits until no narration is active and returns the settled state.
    pub async fn wait(&self) -> PlaybackState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_active()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>, epoch: u64, request: PlaybackRequest) {
        let result = self
            .synthesizer
            .synthesize(&request.text, &request.voice_id)
            .await;

        let payload = match result {
            Ok(Some(payload)) if !payload.is_empty() => payload,
            Ok(_) => {
                self.fail(epoch, PlaybackError::Transport("empty audio payload".to_string()));
                return;
            }
            Err(err) => {
                self.fail(epoch, PlaybackError::Transport(err.to_string()));
                return;
            }
        };

        if !self.transition(epoch, PlaybackState::Decoding) {
            debug!(epoch, "discarding stale speech payload");
            return;
        }

        let buffer = match payload.decode(request.format()) {
            Ok(buffer) => buffer,
            Err(err) => {
                self.fail(epoch, err.into());
                return;
            }
        };
        debug!(
            epoch,
            samples = buffer.len(),
            duration_ms = buffer.duration().as_millis() as u64,
            "speech decoded"
        );

        self.play(epoch, buffer);
    }

    fn play(self: &Arc<Self>, epoch: u64, buffer: SampleBuffer) {
        if self.slot.lock().epoch != epoch {
            debug!(epoch, "discarding stale speech buffer");
            return;
        }

        let pipeline: Weak<Inner> = Arc::downgrade(self);
        let on_complete: OnComplete = Box::new(move || {
            if let Some(inner) = pipeline.upgrade() {
                inner.finish(epoch);
            }
        });

        let handle = match self.output.play(buffer, on_complete) {
            Ok(handle) => handle,
            Err(err) => {
                self.fail(epoch, PlaybackError::Output(err.to_string()));
                return;
            }
        };

        let released = {
            let mut slot = self.slot.lock();
            if slot.epoch != epoch {
                // Superseded or cancelled while the output was starting.
                Some((handle, true))
            } else {
                debug!(epoch, state = "playing", "state transition");
                self.state.send_replace(PlaybackState::Playing);
                if slot.finished_early.take() == Some(epoch) {
                    debug!(epoch, "narration finished");
                    self.state.send_replace(PlaybackState::Idle);
                    Some((handle, false))
                } else {
                    slot.handle = Some(handle);
                    None
                }
            }
        };

        if let Some((handle, stop)) = released {
            if stop {
                debug!(epoch, "stopping stale playback");
                handle.stop();
            }
        }
    }

    fn finish(&self, epoch: u64) {
        let handle = {
            let mut slot = self.slot.lock();
            if slot.epoch != epoch {
                debug!(epoch, "ignoring stale playback completion");
                return;
            }
            if *self.state.borrow() == PlaybackState::Decoding {
                // The output is still inside `play`; it settles on return.
                slot.finished_early = Some(epoch);
                return;
            }
            if *self.state.borrow() != PlaybackState::Playing {
                debug!(epoch, "ignoring stale playback completion");
                return;
            }
            self.state.send_replace(PlaybackState::Idle);
            slot.handle.take()
        };
        debug!(epoch, "narration finished");
        drop(handle);
    }

    fn fail(&self, epoch: u64, err: PlaybackError) {
        let reason = err.to_string();
        if self.transition(epoch, PlaybackState::Error(err)) {
            warn!(epoch, error = %reason, "narration failed");
        } else {
            debug!(epoch, error = %reason, "discarding stale failure");
        }
    }

    /// Applies `state` if `epoch` is still current.
    fn transition(&self, epoch: u64, state: PlaybackState) -> bool {
        let slot = self.slot.lock();
        if slot.epoch != epoch {
            return false;
        }
        debug!(epoch, state = state.name(), "state transition");
        self.state.send_replace(state);
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.get_mut().handle.take() {
            handle.stop();
        }
    }
}
