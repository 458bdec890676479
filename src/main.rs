use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use rpcprobe::batch::{BatchResponse, run_batch};
use rpcprobe::config::{AppConfig, RunMode, load_config};
use rpcprobe::error::EntryError;
use rpcprobe::periodic::PeriodicScheduler;
use rpcprobe::probe::{ProbeOutcome, Prober, ResultRecord};
use rpcprobe::report::render_table;
use rpcprobe::stats::group_by_endpoint;

fn log_record(record: &ResultRecord) {
    match &record.outcome {
        ProbeOutcome::Success { elapsed_ms } => {
            log::info!("✅ URL: {}, Elapsed: {:.2}ms", record.endpoint, elapsed_ms)
        }
        ProbeOutcome::Failure(failure) => {
            log::warn!("❌ Probe error for {}: {}", record.endpoint, failure)
        }
    }
}

fn endpoint_width(app: &AppConfig) -> usize {
    app.endpoints
        .iter()
        .map(|e| e.as_str().chars().count())
        .max()
        .unwrap_or(10)
        .clamp(10, 60)
}

async fn run_once(app: AppConfig, prober: Arc<Prober>) -> Result<()> {
    let width = endpoint_width(&app);
    let records = run_batch(prober, app.endpoints, app.settings.concurrency).await;
    records.iter().for_each(log_record);

    print!("{}", render_table(&group_by_endpoint(records.iter().cloned()), width));
    let response = BatchResponse::from(Ok::<_, EntryError>(records));
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to encode batch response")?
    );
    Ok(())
}

async fn run_periodic(app: AppConfig, prober: Arc<Prober>) -> Result<()> {
    if app.endpoints.is_empty() {
        log::warn!("Network '{}' has no endpoints, nothing to probe", app.network);
        return Ok(());
    }

    let width = endpoint_width(&app);
    let pass_size = app.endpoints.len();
    let wanted = app.passes.map(|passes| passes as usize * pass_size);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = PeriodicScheduler::new(
        prober,
        app.endpoints,
        app.settings.max_jitter(),
        move |record| {
            let _ = tx.send(record);
        },
    );

    let mut history = Vec::new();
    scheduler.start();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                log::info!("Ctrl-C received, finishing the current pass");
                break;
            }
            Some(record) = rx.recv() => {
                log_record(&record);
                history.push(record);
                if wanted.is_some_and(|wanted| history.len() >= wanted) {
                    break;
                }
            }
        }
    }

    scheduler.stop_and_wait().await;
    while let Ok(record) = rx.try_recv() {
        log_record(&record);
        history.push(record);
    }

    print!("{}", render_table(&group_by_endpoint(history), width));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = load_config().context("Failed to load configuration")?;
    let prober = Arc::new(Prober::from_settings(&app.settings).context("Failed to set up prober")?);

    match app.mode {
        RunMode::Batch => run_once(app, prober).await,
        RunMode::Periodic => run_periodic(app, prober).await,
    }
}
