use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "relay.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Relay the last hour of a chat transcript to a webhook"
)]
pub struct Cli {
    /// YAML config file (default: ./relay.yaml when present)
    #[arg(long, short, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Chat room to read, overriding the configured one
    #[arg(long)]
    pub room: Option<u32>,

    /// Log messages instead of posting them; no webhook needed
    #[arg(long)]
    pub dry_run: bool,

    /// Trigger payload handed to the run, as JSON
    #[arg(long, default_value = "null", value_parser = parse_event)]
    pub event: Value,
}

fn parse_event(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("event is not valid JSON: {e}"))
}
