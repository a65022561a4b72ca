// Entrypoint for the CLI application.
// - Keeps `main` small: load config, authenticate, hand the client to the UI loop.
// - Returns `anyhow::Result` so setup failures are printed with context.

use anyhow::Context;
use backscnr_cli::{api::ApiClient, config::Config, ui};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so the summaries on stdout stay readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backscnr_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!("Using API at {}", config.base_url);

    let api = ApiClient::connect(&config, &mut ui::TerminalPrompt)
        .context("Could not authenticate")?;

    // Blocks until the user exits.
    ui::main_menu(&api)?;
    Ok(())
}
