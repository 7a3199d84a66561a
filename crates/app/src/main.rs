use anyhow::Context as _;
use clap::Parser;

use auditdesk_app::cli::Cli;
use auditdesk_app::commands::{self, Context};
use auditdesk_app::config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("auditdesk error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    auditdesk_observability::init_with(cli.log_level(), cli.log_format);

    let config = AppConfig::load().context("failed to load configuration")?;
    let ctx = Context::open(&config, cli.format)?;

    let result = commands::dispatch(cli.command, &ctx).await;
    if let Err(err) = ctx.save_cookies() {
        tracing::warn!(error = %format!("{err:#}"), "failed to persist session cookies");
    }
    result
}
