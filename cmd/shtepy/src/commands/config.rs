//! Context management for the Gemini speech service.

use clap::{Args, Subcommand};
use serde::Serialize;

use shtepy_cli::config::{Context as CliContext, EXTRA_DEFAULT_MODEL, mask_api_key};
use shtepy_gemini::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_TTS_MODEL, VOICE_ZEPHYR};

use super::{get_config, output, print_success};
use crate::Cli;

/// Manage Gemini contexts.
///
/// Each context holds an API key plus optional endpoint, model, voice and
/// timeout overrides. Stored in ~/.shtepy/shtepy/config.yaml.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add or replace a context
    #[command(name = "add-context")]
    AddContext {
        name: String,
        /// Gemini API key
        #[arg(long)]
        api_key: String,
        /// Endpoint override, e.g. a proxy
        #[arg(long)]
        base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Speech model override
        #[arg(long)]
        model: Option<String>,
        /// Prebuilt voice used when a narration names none
        #[arg(long)]
        voice: Option<String>,
    },
    #[command(name = "delete-context")]
    DeleteContext { name: String },
    #[command(name = "use-context")]
    UseContext { name: String },
    /// Show the effective settings of a context (-c or the current one)
    #[command(name = "get-context")]
    GetContext,
    /// Show the effective settings of every context
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
}

/// A context with Gemini defaults filled in, as narrate would use it.
#[derive(Debug, PartialEq, Eq, Serialize)]
struct EffectiveContext {
    name: String,
    current: bool,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
    timeout_secs: u64,
}

impl EffectiveContext {
    fn resolve(name: &str, ctx: &CliContext, current: bool) -> Self {
        let or_default = |value: &str, default: &str| {
            (if value.is_empty() { default } else { value }).to_string()
        };
        Self {
            name: name.to_string(),
            current,
            api_key: mask_api_key(&ctx.api_key),
            base_url: or_default(&ctx.base_url, DEFAULT_BASE_URL),
            model: ctx.default_model().unwrap_or(DEFAULT_TTS_MODEL).to_string(),
            voice: or_default(&ctx.default_voice, VOICE_ZEPHYR),
            timeout_secs: ctx.timeout().unwrap_or(DEFAULT_TIMEOUT).as_secs(),
        }
    }
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut cfg = get_config(cli)?;

        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                api_key,
                base_url,
                timeout,
                model,
                voice,
            } => {
                if api_key.trim().is_empty() {
                    anyhow::bail!("--api-key must not be empty");
                }
                let mut ctx = CliContext {
                    api_key: api_key.clone(),
                    base_url: base_url.clone().unwrap_or_default(),
                    timeout: timeout.unwrap_or(0),
                    default_voice: voice.clone().unwrap_or_default(),
                    ..Default::default()
                };
                if let Some(model) = model {
                    ctx.set_extra(EXTRA_DEFAULT_MODEL, model);
                }
                cfg.add_context(name, ctx)?;
                if cfg.current_context.is_empty() {
                    cfg.use_context(name)?;
                }
                print_success(&format!("Context \"{}\" saved to {}", name, cfg.path().display()));
            }

            ConfigSubcommand::DeleteContext { name } => {
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
            }

            ConfigSubcommand::UseContext { name } => {
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
            }

            ConfigSubcommand::GetContext => {
                let name = cli.context.as_deref().unwrap_or(&cfg.current_context);
                let Some(ctx) = cfg.resolve_context(Some(name)) else {
                    anyhow::bail!("no context selected; use -c or 'shtepy config use-context'");
                };
                let effective =
                    EffectiveContext::resolve(name, ctx, name == cfg.current_context);
                output(cli, cli.output.clone()).write(&effective)?;
            }

            ConfigSubcommand::ListContexts => {
                let contexts: Vec<EffectiveContext> = cfg
                    .list_contexts()
                    .into_iter()
                    .filter_map(|name| {
                        cfg.get_context(name).map(|ctx| {
                            EffectiveContext::resolve(name, ctx, name == cfg.current_context)
                        })
                    })
                    .collect();
                output(cli, cli.output.clone()).write(&contexts)?;
            }
        }

        Ok(())
    }
}
