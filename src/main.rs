//! Payload transform agent CLI entry point.
//!
//! Runs JSON payloads from stdin through the transit codec, in either
//! direction, using the same configuration the service loads. Useful
//! for inspecting what a payload looks like on the wire and for
//! validating configuration files.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use payload_transform_agent::{TransformAgent, TransformConfig};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "payload-transform-agent")]
#[command(
    author,
    version,
    about = "Transit-safe payload transformation for JSON API boundaries"
)]
struct Args {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Direction to run the stdin payload through
    #[arg(long, value_enum, default_value = "decode")]
    mode: Mode,

    /// Request route used for include/exclude gating
    #[arg(long, env = "TRANSFORM_ROUTE", default_value = "/")]
    route: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Validate configuration and exit.
    #[arg(long)]
    validate: bool,
}

/// Transform direction.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Recover fields from their transit form
    Decode,
    /// Wrap fields for transit
    Encode,
}

fn print_example_config() {
    let example = r#"# Payload Transform Agent Configuration Example
version: "1"

settings:
  # Maximum nesting depth accepted from a payload tree
  max_tree_depth: 64

# Field allow-list. A single-segment entry matches its key at any
# depth; a dotted entry must match the whole path. Leave empty to use
# heuristic field detection.
fields:
  - learnerTextResponse
  - learnerChoices
  - questions.scoring.rubrics.rubricQuestion

# Keys and paths never transformed (wins over `fields`)
exclude:
  - id
  - createdAt

# Route prefixes controlling where transformation applies
routes:
  include:
    - /api
  exclude:
    - /health
    - /metrics
"#;
    println!("{}", example);
}

fn load_config(path: Option<&PathBuf>) -> Result<TransformConfig> {
    let Some(config_path) = path else {
        return Ok(TransformConfig::default());
    };

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    let config = if config_path
        .extension()
        .is_some_and(|e| e == "yaml" || e == "yml")
    {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    // Print example config if requested
    if args.example_config {
        print_example_config();
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;

    // Validate only if requested
    if args.validate {
        let _agent = TransformAgent::new(config);
        info!("Configuration is valid");
        return Ok(());
    }

    let agent = TransformAgent::new(config);

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read payload from stdin")?;
    let body: serde_json::Value =
        serde_json::from_str(&input).context("stdin is not valid JSON")?;

    let output = match args.mode {
        Mode::Decode => agent
            .decode_request(&args.route, &body)
            .await
            .context("Payload rejected")?,
        Mode::Encode => agent
            .encode_response(&args.route, &body)
            .await
            .context("Payload rejected")?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
