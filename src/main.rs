use anyhow::Context;
use clap::Parser;
use playground::config::{Cli, Command};
use playground::server::{self, AppState};
use playground::{cli, telemetry, ModelCatalog, SettingsUpdate};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    telemetry::init_logging();

    let catalog = ModelCatalog::load(&args.catalog)
        .with_context(|| format!("loading model catalog {}", args.catalog.display()))?;
    let providers = args.credentials.provider_registry();
    let options = args.orchestrator_options();

    match args.command {
        Command::Models => cli::print_models(&catalog),
        Command::Serve {
            host,
            port,
            session_ttl,
        } => {
            let state = AppState::new(Arc::new(catalog), Arc::new(providers), options);
            let session_ttl = (session_ttl > 0).then(|| Duration::from_secs(session_ttl));
            server::serve(state, SocketAddr::new(host, port), session_ttl).await?;
        }
        Command::Chat {
            model,
            temperature,
            max_tokens,
        } => {
            let settings = SettingsUpdate {
                model,
                temperature,
                max_completion_tokens: max_tokens,
            };
            cli::run_chat(&catalog, &providers, options, settings).await?;
        }
    }

    Ok(())
}
