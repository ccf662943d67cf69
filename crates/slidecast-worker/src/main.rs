//! Slidecast render worker binary.
//!
//! Reads a narration script from the path given as the first argument
//! (optionally a topic as the second), submits one render job, and
//! follows its progress until it reaches a terminal state.

use anyhow::{bail, Context};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slidecast_models::{JobStatus, RenderRequest};
use slidecast_worker::{JobExecutor, PipelineContext, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("slidecast=info".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let Some(script_path) = args.next() else {
        bail!("Usage: slidecast-worker <script-file> [topic]");
    };
    let topic = args.next();

    let script = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("Failed to read script from {script_path}"))?;

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let (ctx, queue_rx) = PipelineContext::new(config);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let executor = JobExecutor::new(ctx.clone(), queue_rx, shutdown_rx);
    let executor_handle = tokio::spawn(executor.run());

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let mut request = RenderRequest::new(script);
    request.options.topic = topic;

    let mut events = ctx.tracker.subscribe();
    let job_id = ctx.submit(request).await?;
    info!(job_id = %job_id, "Job submitted");

    // Follow the job to a terminal state.
    let outcome = loop {
        match events.recv().await {
            Ok(job) if job.id == job_id => {
                info!(
                    progress = job.progress,
                    status = %job.status,
                    "{}", job.message
                );
                if job.is_terminal() {
                    break job;
                }
            }
            Ok(_) => {}
            Err(_) => {
                // Broadcast lag or closure; fall back to polling.
                if let Some(job) = ctx.tracker.get(&job_id).await {
                    if job.is_terminal() {
                        break job;
                    }
                }
            }
        }
    };

    executor_handle.abort();

    match outcome.status {
        JobStatus::Completed => {
            let result = outcome
                .result
                .context("Completed job is missing its result")?;
            info!(
                video = %result.video_path.display(),
                size = result.size_bytes,
                duration = result.duration_secs,
                "Done"
            );
            Ok(())
        }
        _ => {
            let message = outcome.error.unwrap_or_else(|| "unknown error".to_string());
            error!("Render failed: {message}");
            std::process::exit(1);
        }
    }
}
