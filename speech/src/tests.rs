//! Lifecycle tests for the playback pipeline.

use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use shtepy_audio::pcm::{DecodeError, SampleBuffer};
use std::collections::VecDeque;
use std::sync::{Arc, mpsc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

const ZERO_16_BYTES: &str = "AAAAAAAAAAAAAAAAAAAAAA==";

// ============================================================================
// Mock Implementations
// ============================================================================

struct Reply {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Option<String>, String>,
}

#[derive(Default)]
struct MockSynthesizer {
    calls: Mutex<Vec<(String, String)>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl MockSynthesizer {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn reply(&self, payload: &str) {
        self.replies.lock().push_back(Reply {
            gate: None,
            result: Ok(Some(payload.to_string())),
        });
    }

    fn reply_with(&self, result: Result<Option<String>, String>) {
        self.replies.lock().push_back(Reply { gate: None, result });
    }

    /// Queues a reply that is held back until the returned sender fires.
    fn gated_reply(&self, payload: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Reply {
            gate: Some(rx),
            result: Ok(Some(payload.to_string())),
        });
        tx
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<Option<EncodedAudio>, SynthesisError> {
        self.calls.lock().push((text.to_string(), voice.to_string()));
        let reply = self
            .replies
            .lock()
            .pop_front()
            .expect("unexpected synthesize call");
        if let Some(gate) = reply.gate {
            let _ = gate.await;
        }
        reply
            .result
            .map(|payload| payload.map(EncodedAudio::from))
            .map_err(SynthesisError::Transport)
    }
}

struct MockHandle {
    stops: Arc<AtomicUsize>,
}

impl PlaybackHandle for MockHandle {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

struct Played {
    buffer: SampleBuffer,
    on_complete: Option<OnComplete>,
    stops: Arc<AtomicUsize>,
}

#[derive(Default)]
struct MockOutput {
    played: Mutex<Vec<Played>>,
    fail: Mutex<Option<String>>,
    complete_immediately: bool,
}

impl MockOutput {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing(reason: &str) -> Arc<Self> {
        let output = Self::default();
        *output.fail.lock() = Some(reason.to_string());
        Arc::new(output)
    }

    fn play_count(&self) -> usize {
        self.played.lock().len()
    }

    fn buffer(&self, index: usize) -> SampleBuffer {
        self.played.lock()[index].buffer.clone()
    }

    fn stop_count(&self, index: usize) -> usize {
        self.played.lock()[index].stops.load(Ordering::SeqCst)
    }

    /// Signals natural end of the `index`-th playback.
    fn complete(&self, index: usize) {
        let callback = self.played.lock()[index].on_complete.take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl AudioOutput for MockOutput {
    fn play(
        &self,
        buffer: SampleBuffer,
        on_complete: OnComplete,
    ) -> Result<Box<dyn PlaybackHandle>, OutputError> {
        if let Some(reason) = self.fail.lock().clone() {
            return Err(OutputError::Unavailable(reason));
        }
        let stops = Arc::new(AtomicUsize::new(0));
        let on_complete = if self.complete_immediately {
            on_complete();
            None
        } else {
            Some(on_complete)
        };
        self.played.lock().push(Played {
            buffer,
            on_complete,
            stops: stops.clone(),
        });
        Ok(Box::new(MockHandle { stops }))
    }
}

/// Output whose `play` blocks until released, like a device that is slow to open.
struct BlockingOutput {
    entered: Mutex<Option<oneshot::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
    stops: Arc<AtomicUsize>,
}

impl BlockingOutput {
    fn new() -> (Arc<Self>, oneshot::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let output = Arc::new(Self {
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(Some(release_rx)),
            stops: Arc::new(AtomicUsize::new(0)),
        });
        (output, entered_rx, release_tx)
    }
}

impl AudioOutput for BlockingOutput {
    fn play(
        &self,
        _buffer: SampleBuffer,
        _on_complete: OnComplete,
    ) -> Result<Box<dyn PlaybackHandle>, OutputError> {
        let entered = self.entered.lock().take();
        if let Some(tx) = entered {
            let _ = tx.send(());
        }
        let release = self.release.lock().take();
        if let Some(rx) = release {
            let _ = rx.recv();
        }
        Ok(Box::new(MockHandle {
            stops: self.stops.clone(),
        }))
    }
}

fn pipeline(synth: &Arc<MockSynthesizer>, output: &Arc<MockOutput>) -> SpeechPlaybackPipeline {
    SpeechPlaybackPipeline::new(synth.clone(), output.clone())
}

/// Lets every runnable task finish before returning.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn wait_for_state(pipeline: &SpeechPlaybackPipeline, want: PlaybackState) {
    let mut rx = pipeline.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == want))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_narration_plays_then_idles() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline
        .start(PlaybackRequest::new("hello", "Zephyr").with_sample_rate(24000))
        .unwrap();
    assert_eq!(pipeline.state(), PlaybackState::Requesting);

    wait_for_state(&pipeline, PlaybackState::Playing).await;
    assert_eq!(
        synth.calls.lock().as_slice(),
        &[("hello".to_string(), "Zephyr".to_string())]
    );
    assert_eq!(output.play_count(), 1);

    let buffer = output.buffer(0);
    assert_eq!(buffer.len(), 8);
    assert_eq!(buffer.sample_rate(), 24000);
    assert_eq!(buffer.channels(), 1);
    assert!(buffer.samples().iter().all(|&s| s == 0.0));

    output.complete(0);
    assert_eq!(pipeline.state(), PlaybackState::Idle);
    assert_eq!(output.stop_count(0), 0);
}

#[tokio::test(start_paused = true)]
async fn test_32_char_zero_payload() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    wait_for_state(&pipeline, PlaybackState::Playing).await;

    let buffer = output.buffer(0);
    assert_eq!(buffer.len(), 12);
    assert!(buffer.samples().iter().all(|&s| s == 0.0));
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_settled_state() {
    let synth = MockSynthesizer::new();
    let output = Arc::new(MockOutput {
        complete_immediately: true,
        ..Default::default()
    });
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    let state = tokio::time::timeout(Duration::from_secs(5), pipeline.wait())
        .await
        .unwrap();
    assert_eq!(state, PlaybackState::Idle);
    assert_eq!(output.play_count(), 1);
    assert_eq!(output.stop_count(0), 0);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_text_rejected() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    let pipeline = pipeline(&synth, &output);
    let rx = pipeline.subscribe();

    let err = pipeline
        .start(PlaybackRequest::new("   \n\t", "Zephyr"))
        .unwrap_err();
    assert_eq!(err, PlaybackError::EmptyText);
    settle().await;

    assert_eq!(pipeline.state(), PlaybackState::Idle);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(synth.call_count(), 0);
    assert_eq!(output.play_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply_with(Err("connection refused".to_string()));
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Kore")).unwrap();
    let state = pipeline.wait().await;

    match state {
        PlaybackState::Error(PlaybackError::Transport(reason)) => {
            assert!(reason.contains("connection refused"));
        }
        other => panic!("unexpected state: {:?}", other),
    }
    assert_eq!(output.play_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_payload_is_transport_error() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply_with(Ok(None));
    synth.reply_with(Ok(Some(String::new())));
    let pipeline = pipeline(&synth, &output);

    for _ in 0..2 {
        pipeline.start(PlaybackRequest::new("hello", "Kore")).unwrap();
        let state = pipeline.wait().await;
        assert!(matches!(
            state,
            PlaybackState::Error(PlaybackError::Transport(_))
        ));
    }
    assert_eq!(synth.call_count(), 2);
    assert_eq!(output.play_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_payloads_never_play() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply("not*base64");
    // three bytes
    synth.reply("AAAA");
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Charon")).unwrap();
    let state = pipeline.wait().await;
    assert!(matches!(
        state,
        PlaybackState::Error(PlaybackError::Decode(DecodeError::InvalidEncoding(_)))
    ));

    pipeline.start(PlaybackRequest::new("hello", "Charon")).unwrap();
    let state = pipeline.wait().await;
    assert_eq!(
        state,
        PlaybackState::Error(PlaybackError::Decode(DecodeError::MisalignedLength(3)))
    );

    assert_eq!(output.play_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_output_failure() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::failing("device busy");
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    let state = pipeline.wait().await;
    match state {
        PlaybackState::Error(PlaybackError::Output(reason)) => assert!(reason.contains("device busy")),
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_error() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply_with(Err("timeout".to_string()));
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    assert!(matches!(pipeline.wait().await, PlaybackState::Error(_)));
    settle().await;
    // no automatic retry
    assert_eq!(synth.call_count(), 1);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    wait_for_state(&pipeline, PlaybackState::Playing).await;
    assert_eq!(synth.call_count(), 2);
}

// ============================================================================
// Single flight
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_newer_start_wins_over_late_response() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    let first = synth.gated_reply("AAAAAAAA"); // 6 bytes
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("first", "Zephyr")).unwrap();
    settle().await;
    assert_eq!(pipeline.state(), PlaybackState::Requesting);

    pipeline.start(PlaybackRequest::new("second", "Kore")).unwrap();
    wait_for_state(&pipeline, PlaybackState::Playing).await;
    assert_eq!(output.play_count(), 1);
    assert_eq!(output.buffer(0).len(), 8);

    // The first response lands after the second narration is already playing.
    first.send(()).unwrap();
    settle().await;

    assert_eq!(pipeline.state(), PlaybackState::Playing);
    assert_eq!(output.play_count(), 1);
    assert_eq!(synth.call_count(), 2);

    output.complete(0);
    assert_eq!(pipeline.state(), PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_late_failure_does_not_clobber() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    let (tx, rx) = oneshot::channel();
    synth.replies.lock().push_back(Reply {
        gate: Some(rx),
        result: Err("slow failure".to_string()),
    });
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("first", "Zephyr")).unwrap();
    settle().await;
    pipeline.start(PlaybackRequest::new("second", "Zephyr")).unwrap();
    wait_for_state(&pipeline, PlaybackState::Playing).await;

    tx.send(()).unwrap();
    settle().await;
    assert_eq!(pipeline.state(), PlaybackState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_start_while_playing_stops_previous() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply(ZERO_16_BYTES);
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("first", "Zephyr")).unwrap();
    wait_for_state(&pipeline, PlaybackState::Playing).await;
    let first_epoch = pipeline.epoch();

    pipeline.start(PlaybackRequest::new("second", "Zephyr")).unwrap();
    assert_eq!(output.stop_count(0), 1);
    assert!(pipeline.epoch() > first_epoch);

    wait_for_state(&pipeline, PlaybackState::Playing).await;
    assert_eq!(output.play_count(), 2);

    // A completion from the superseded handle is ignored.
    output.complete(0);
    assert_eq!(pipeline.state(), PlaybackState::Playing);

    output.complete(1);
    assert_eq!(pipeline.state(), PlaybackState::Idle);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_while_playing() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply(ZERO_16_BYTES);
    let gate = synth.gated_reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    wait_for_state(&pipeline, PlaybackState::Playing).await;

    pipeline.cancel();
    assert_eq!(output.stop_count(0), 1);
    assert_eq!(pipeline.state(), PlaybackState::Idle);

    // Cancelling again changes nothing.
    pipeline.cancel();
    assert_eq!(output.stop_count(0), 1);

    // A later completion from the stopped handle has no effect on a newer request.
    pipeline.start(PlaybackRequest::new("again", "Zephyr")).unwrap();
    settle().await;
    assert_eq!(pipeline.state(), PlaybackState::Requesting);
    output.complete(0);
    assert_eq!(pipeline.state(), PlaybackState::Requesting);

    drop(gate);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_while_output_starting() {
    let synth = MockSynthesizer::new();
    synth.reply(ZERO_16_BYTES);
    let (output, entered, release) = BlockingOutput::new();
    let pipeline = SpeechPlaybackPipeline::new(synth.clone(), output.clone());

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    tokio::time::timeout(Duration::from_secs(5), entered)
        .await
        .expect("output never started")
        .unwrap();

    // No handle exists yet, so the narration is not reported as playing.
    assert_eq!(pipeline.state(), PlaybackState::Decoding);

    let mut rx = pipeline.subscribe();
    pipeline.cancel();
    assert_eq!(pipeline.state(), PlaybackState::Idle);
    rx.mark_unchanged();

    release.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while output.stops.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("late handle was never stopped");

    assert_eq!(output.stops.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.state(), PlaybackState::Idle);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_completion_during_output_start() {
    let synth = MockSynthesizer::new();
    let output = Arc::new(MockOutput {
        complete_immediately: true,
        ..Default::default()
    });
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);
    let mut rx = pipeline.subscribe();

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    let mut seen = Vec::new();
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        let done = !state.is_active();
        seen.push(state);
        if done {
            break;
        }
    }

    assert_eq!(seen.last(), Some(&PlaybackState::Idle));
    assert!(!seen.iter().any(|s| matches!(s, PlaybackState::Error(_))));

    // The finished handle is released, not held for a later stop.
    drop(pipeline);
    assert_eq!(output.stop_count(0), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_requesting() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    let gate = synth.gated_reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);
    let mut rx = pipeline.subscribe();

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    settle().await;
    assert_eq!(pipeline.state(), PlaybackState::Requesting);

    pipeline.cancel();
    assert_eq!(pipeline.state(), PlaybackState::Idle);
    rx.mark_unchanged();

    gate.send(()).unwrap();
    settle().await;

    assert_eq!(pipeline.state(), PlaybackState::Idle);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(output.play_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_idle_is_noop() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    let pipeline = pipeline(&synth, &output);
    let rx = pipeline.subscribe();
    let epoch = pipeline.epoch();

    pipeline.cancel();
    pipeline.cancel();

    assert_eq!(pipeline.state(), PlaybackState::Idle);
    assert_eq!(pipeline.epoch(), epoch);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(synth.call_count(), 0);
    assert_eq!(output.play_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_error_keeps_error() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply_with(Err("boom".to_string()));
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    let state = pipeline.wait().await;
    assert!(matches!(state, PlaybackState::Error(_)));

    pipeline.cancel();
    assert_eq!(pipeline.state(), state);
}

#[tokio::test(start_paused = true)]
async fn test_toggle() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);
    let request = PlaybackRequest::new("hello", "Zephyr");

    assert!(pipeline.toggle(request.clone()).unwrap());
    wait_for_state(&pipeline, PlaybackState::Playing).await;

    assert!(!pipeline.toggle(request).unwrap());
    assert_eq!(pipeline.state(), PlaybackState::Idle);
    assert_eq!(output.stop_count(0), 1);
    assert_eq!(synth.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_playback() {
    let synth = MockSynthesizer::new();
    let output = MockOutput::new();
    synth.reply(ZERO_16_BYTES);
    let pipeline = pipeline(&synth, &output);

    pipeline.start(PlaybackRequest::new("hello", "Zephyr")).unwrap();
    wait_for_state(&pipeline, PlaybackState::Playing).await;
    settle().await;

    drop(pipeline);
    assert_eq!(output.stop_count(0), 1);

    // The completion callback outlives the pipeline harmlessly.
    output.complete(0);
    assert_eq!(output.stop_count(0), 1);
}
