mod config;
mod metrics;
mod pipeline;

use anyhow::{Context, Result};
use autoflow_core::{Catalog, SafetyGate};
use autoflow_llm::{ContentModeration, LlmClient, ModerationClient};
use autoflow_platform::PlatformClient;
use clap::Parser;
use config::Cli;
use metrics::Metrics;
use pipeline::{Pipeline, PipelineError};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn log_dir() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("logs")
}

fn init_tracing() -> WorkerGuard {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("autoflow")
        .filename_suffix("txt")
        .build(&log_dir)
        .expect("failed to create log file appender");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_filter = EnvFilter::new("debug");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(file_filter),
        )
        .init();

    guard
}

fn read_prompt_interactively() -> Result<String> {
    let stdin = std::io::stdin();
    loop {
        print!("Describe the automation you want: ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read prompt from stdin")?;
        if read == 0 {
            anyhow::bail!("No prompt given");
        }
        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
    }
}

async fn run(cli: Cli, metrics: &mut Metrics) -> Result<()> {
    let prompt = match cli.literal_prompt() {
        Some(p) => p.to_string(),
        None => read_prompt_interactively()?,
    };

    let catalog = Catalog::builtin();
    let gate = SafetyGate::default();
    let backend = LlmClient::new(cli.llm_config());

    let moderation_client = (!cli.no_moderation).then(|| ModerationClient::new(cli.moderation_config()));
    if moderation_client.is_none() {
        warn!("Content moderation disabled");
    }
    let platform = if cli.dry_run {
        None
    } else {
        Some(PlatformClient::new(cli.platform_config()).context("Failed to build platform client")?)
    };

    info!(
        "Compiling prompt ({} chars) against catalog v{}",
        prompt.chars().count(),
        catalog.version()
    );

    let pipeline = Pipeline {
        catalog: &catalog,
        gate: &gate,
        backend: &backend,
        moderation: moderation_client
            .as_ref()
            .map(|m| m as &dyn ContentModeration),
        platform: platform.as_ref(),
    };

    let output = pipeline.run(&prompt, metrics).await?;

    for warning in &output.warnings {
        warn!("{}", warning);
    }
    match &output.submission {
        Some(submission) => {
            println!(
                "Created workflow {}: {}",
                submission.summary.id, submission.summary.name
            );
            println!("{}", submission.url);
        }
        None => {
            let json = serde_json::to_string_pretty(&output.workflow)
                .context("Failed to serialize workflow")?;
            println!("{}", json);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing();

    let metrics_file = cli.metrics_file.clone();
    let mut metrics = Metrics::new();
    let result = run(cli, &mut metrics).await;

    println!("{}", metrics.summary());
    if let Err(e) = metrics.write_snapshot(&metrics_file) {
        warn!("{:#}", e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PipelineError>() {
                Some(PipelineError::InputRejected(reason)) => {
                    eprintln!("Request not accepted: {}", reason);
                }
                _ => {
                    error!("{:#}", e);
                    eprintln!("Error: {:#}", e);
                }
            }
            ExitCode::FAILURE
        }
    }
}
