use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use relay_app::Relay;
use relay_app::cli::{Cli, DEFAULT_CONFIG};
use relay_common::observability::{LogConfig, init_logging};
use relay_config::RelayConfigLoader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins over the file)
    let loader = match &cli.config {
        Some(path) => RelayConfigLoader::new().with_file(path),
        None => RelayConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let mut cfg = loader.load()?;
    if let Some(room) = cli.room {
        cfg.room = room;
    }

    init_logging(LogConfig {
        app_name: "relay",
        log_dir: cfg.log.dir.clone(),
        emit_stderr: cfg.log.stderr,
        format: cfg.log.format,
        ..LogConfig::default()
    })?;

    let relay = Relay::from_config(&cfg, cli.dry_run)?;
    match relay.run(&cli.event, Utc::now()).await {
        Ok(out) => {
            println!("{out}");
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "relay.failed");
            Err(err)
        }
    }
}
