//! Decode command.

use std::fs::File;
use std::io::{BufWriter, Write};

use clap::Args;
use serde::Serialize;
use shtepy_audio::{Format, pcm};

use super::{output, print_success, print_verbose};
use crate::Cli;

/// Decode a base64 L16 payload file into PCM.
///
/// Reads base64 text (surrounding whitespace is trimmed), decodes it as
/// signed 16-bit little-endian mono PCM, and prints a summary. With -o the
/// samples are written back out as raw s16le.
#[derive(Args)]
pub struct DecodeCommand {
    /// File containing the base64 payload
    file: String,

    /// Sample rate of the payload, in Hz
    #[arg(long, default_value_t = 24000)]
    sample_rate: u32,
}

#[derive(Serialize)]
struct DecodeSummary {
    samples: usize,
    sample_rate_hz: u32,
    duration_ms: u128,
    peak: f32,
}

impl DecodeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(&self.file)?;
        print_verbose(cli, &format!("Read {} base64 chars", text.trim().len()));

        let buffer = pcm::decode_base64(text.trim(), Format::mono(self.sample_rate))?;

        if let Some(path) = &cli.output {
            let mut w = BufWriter::new(File::create(path)?);
            let written = buffer.write_l16_to(&mut w)?;
            w.flush()?;
            print_success(&format!("Wrote {} bytes to {}", written, path));
        }

        let summary = DecodeSummary {
            samples: buffer.len(),
            sample_rate_hz: buffer.sample_rate(),
            duration_ms: buffer.duration().as_millis(),
            peak: buffer.peak(),
        };
        output(cli, None).write(&summary)
    }
}
