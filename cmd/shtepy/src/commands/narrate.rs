//! Narrate command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde::Serialize;
use shtepy_cli::load_request;
use shtepy_gemini::{GeminiSynthesizer, VOICE_ZEPHYR};
use shtepy_speech::{PlaybackRequest, PlaybackState, SpeechPlaybackPipeline};

use super::{create_client, get_context, output, print_info, print_verbose};
use crate::Cli;
use crate::presets::{NarrationFile, Preset, PresetKind};
use crate::sink::PcmFileSink;

/// Synthesize a narration and play it.
///
/// The narration comes from TEXT, a preset (--preset with --set key=value
/// fields), or a request file (-f). Audio is written to -o as raw s16le PCM
/// and the command returns once playback has finished.
///
/// Presets:
///   memory  fields: title, author, date          (voice Zephyr)
///   legacy  fields: from, message (optional)     (voice Kore)
///   tree    fields: name, role, contribution, bio (voice Charon)
#[derive(Args)]
pub struct NarrateCommand {
    /// Text to speak
    text: Option<String>,

    /// Prebuilt voice name (overrides preset and context default)
    #[arg(long)]
    voice: Option<String>,

    /// Narration preset
    #[arg(long, value_enum)]
    preset: Option<PresetKind>,

    /// Preset field as key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    fields: Vec<String>,

    /// Sample rate of the returned PCM, in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Cancel the narration after this many seconds
    #[arg(long, value_name = "SECS")]
    cancel_after: Option<f64>,
}

#[derive(Serialize)]
struct NarrationSummary {
    voice: String,
    sample_rate_hz: u32,
    state: String,
    cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_file: Option<String>,
}

impl NarrateCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cancel_after = cancel_delay(self.cancel_after)?;
        let ctx = get_context(cli)?;
        let request = self.build_request(cli, &ctx.default_voice)?;

        print_verbose(cli, &format!("Using context: {}", ctx.name));
        print_verbose(
            cli,
            &format!("Voice: {}, prompt: {} chars", request.voice_id, request.text.len()),
        );

        let synthesizer = GeminiSynthesizer::new(create_client(&ctx)?);
        let sink = PcmFileSink::new(cli.output.as_ref().map(PathBuf::from));
        let pipeline = SpeechPlaybackPipeline::new(Arc::new(synthesizer), Arc::new(sink));

        let voice = request.voice_id.clone();
        let sample_rate_hz = request.sample_rate_hz;

        let mut rx = pipeline.subscribe();
        pipeline.start(request)?;

        let timer = tokio::time::sleep(cancel_after.unwrap_or(Duration::MAX));
        tokio::pin!(timer);
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        let mut cancelled = false;
        let mut last = String::new();
        let state = loop {
            let state = rx.borrow_and_update().clone();
            let line = state.to_string();
            if line != last {
                print_info(&format!("state: {}", line));
                last = line;
            }
            if !state.is_active() {
                break state;
            }

            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break pipeline.state();
                    }
                }
                _ = &mut timer, if cancel_after.is_some() && !cancelled => {
                    print_verbose(cli, "Cancel timer fired");
                    pipeline.cancel();
                    cancelled = true;
                }
                _ = &mut interrupt, if !cancelled => {
                    pipeline.cancel();
                    cancelled = true;
                }
            }
        };

        let summary = NarrationSummary {
            voice,
            sample_rate_hz,
            state: if cancelled { "cancelled".to_string() } else { state.name().to_string() },
            cancelled,
            audio_file: cli.output.clone(),
        };
        output(cli, None).write(&summary)?;

        match state {
            PlaybackState::Error(err) => Err(anyhow::anyhow!("narration failed: {}", err)),
            _ => Ok(()),
        }
    }

    fn build_request(&self, cli: &Cli, default_voice: &str) -> anyhow::Result<PlaybackRequest> {
        let mut request = match (&cli.input, self.preset, &self.text) {
            (Some(path), _, _) => load_request::<NarrationFile>(path)?.into_request(),
            (None, Some(kind), _) => Preset::from_fields(kind, &self.fields)?.to_request(),
            (None, None, Some(text)) => {
                let voice = if default_voice.is_empty() {
                    VOICE_ZEPHYR
                } else {
                    default_voice
                };
                PlaybackRequest::new(text.clone(), voice)
            }
            (None, None, None) => {
                anyhow::bail!("narration text is required: pass TEXT, --preset, or -f")
            }
        };

        if let Some(voice) = &self.voice {
            request.voice_id = voice.clone();
        }
        if let Some(rate) = self.sample_rate {
            if rate == 0 {
                anyhow::bail!("--sample-rate must be positive");
            }
            request.sample_rate_hz = rate;
        }
        Ok(request)
    }
}

/// Validates `--cancel-after` before any request is started.
fn cancel_delay(secs: Option<f64>) -> anyhow::Result<Option<Duration>> {
    match secs {
        None => Ok(None),
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(Some)
            .map_err(|_| anyhow::anyhow!("invalid --cancel-after: {}", secs)),
    }
}
