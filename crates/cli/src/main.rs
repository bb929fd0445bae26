//! RewardPilot command-line entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    init_tracing(cli.json);
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let mut config = rewardpilot_infra::config::load(cli.config.clone())?;
    if let Some(use_proxy) = cli.proxy_override() {
        config.runner.use_proxy = use_proxy;
    }

    app::run(config).await
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter);

    if json {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
}
