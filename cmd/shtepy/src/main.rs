//! Shtepy CLI - narrate family memories with synthesized speech.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod presets;
mod sink;

use commands::{ConfigCommand, DecodeCommand, NarrateCommand};

/// Shtepy CLI - narrate family memories with synthesized speech.
///
/// Requests speech from Gemini's prebuilt TTS voices, decodes the returned
/// 16-bit PCM, and plays it into a raw PCM file paced at real time.
///
/// Configuration is stored in ~/.shtepy/shtepy/ and supports multiple contexts,
/// similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "shtepy")]
#[command(about = "Shtepy narration CLI")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.shtepy/shtepy/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout, or no audio file)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input request file (YAML or JSON, `-` for stdin)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Synthesize and play a narration
    Narrate(NarrateCommand),
    /// Decode a base64 L16 payload file
    Decode(DecodeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Narrate(cmd) => cmd.run(&cli).await,
        Commands::Decode(cmd) => cmd.run(&cli).await,
    }
}
