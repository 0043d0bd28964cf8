use anyhow::Result;
use clap::Parser;
use rsa_chat_core::paths::settings_path;
use rsa_chat_core::{Conversation, HttpGateway, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;
mod repl;

#[derive(Parser, Debug)]
#[command(name = "rsa-chat", author, version, about = "RSA secure-messaging simulator", long_about = None)]
struct Cli {
    /// Base URL of the crypto service
    #[arg(long)]
    gateway_url: Option<String>,

    /// Settings file (defaults to the per-user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start with signature mode on
    #[arg(long)]
    signature: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = match cli.config {
        Some(path) => Settings::load(&path)?,
        None => Settings::load_or_default(&settings_path()?)?,
    };
    settings.apply_overrides(cli.gateway_url);

    let gateway = HttpGateway::new(&settings.gateway)?;
    info!(base_url = %gateway.base_url(), "crypto gateway configured");

    let conversation = Conversation::new(Arc::new(gateway))
        .with_signature_mode(cli.signature || settings.ui.start_with_signature_mode);

    repl::run(conversation).await
}
