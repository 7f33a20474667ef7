use anyhow::Result;
use capcheck_common::observability::LogConfig;
use capcheck_common::observability::init_logging;
use capcheck_config::{CapcheckConfig, CapcheckConfigLoader};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod pipeline;

/// Checks whether the image attached to a tweet shows the reference hat.
#[derive(Parser)]
#[command(name = "capcheck", version)]
struct Cli {
    /// Config file; built-in defaults apply when it is absent.
    #[arg(long, default_value = "capcheck.yaml")]
    config: PathBuf,

    /// Tweet to check, overriding the configured id.
    #[arg(long)]
    tweet_id: Option<String>,

    /// Mirror log events to stderr alongside the log file.
    #[arg(long)]
    stderr_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: CapcheckConfig = CapcheckConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;

    // Refuse to run before any network client exists, naming what is missing.
    cfg.validate()?;

    init_logging(LogConfig {
        app_name: "capcheck",
        emit_stderr: cli.stderr_log,
        ..LogConfig::default()
    })?;

    let tweet_id = cli.tweet_id.as_deref().unwrap_or(&cfg.check.tweet_id);

    let cancel = CancellationToken::new();
    let deadline = pipeline::spawn_deadline(
        cancel.clone(),
        Duration::from_secs(cfg.check.timeout_secs),
    );

    let outcome = pipeline::run_check(&cfg, tweet_id, &cancel).await;
    deadline.abort();
    let outcome = outcome?;

    tracing::info!(
        tweet_id,
        image_url = %outcome.image_url,
        result = outcome.verdict.result,
        "check finished"
    );

    // The one line this tool exists to print.
    println!(
        "{}: {}",
        if outcome.verdict.result {
            "MATCH"
        } else {
            "NO MATCH"
        },
        outcome.verdict.reasoning
    );
    Ok(())
}
