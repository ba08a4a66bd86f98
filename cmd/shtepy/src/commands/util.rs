//! Utility functions for CLI commands.

use shtepy_cli::{Config, Context, Output, OutputFormat, load_config};
use shtepy_gemini::Client;

use crate::Cli;

const APP_NAME: &str = "shtepy";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context configuration to use.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    match (cfg.resolve_context(cli.context.as_deref()), cli.context.as_deref()) {
        (Some(ctx), _) => Ok(ctx.clone()),
        (None, Some(name)) => anyhow::bail!("context '{}' not found", name),
        (None, None) => anyhow::bail!(
            "no context specified. Use -c flag or set a default context with 'shtepy config use-context'"
        ),
    }
}

/// Creates a Gemini client from context configuration.
pub fn create_client(ctx: &Context) -> anyhow::Result<Client> {
    let mut builder = Client::builder(&ctx.api_key).base_url(&ctx.base_url);

    if let Some(model) = ctx.default_model() {
        builder = builder.model(model);
    }
    if let Some(timeout) = ctx.timeout() {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Returns the structured output settings for the global flags.
pub fn output(cli: &Cli, file: Option<String>) -> Output {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Yaml
    };
    Output::new(format, file)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    shtepy_cli::print_verbose(cli.verbose, msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints info message.
pub fn print_info(msg: &str) {
    eprintln!("\x1b[34mℹ\x1b[0m {}", msg);
}
