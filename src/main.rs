//! Headless client for the GPU pool backend
//!
//! Polls the workstation endpoint, logs pool status, and optionally rewrites
//! an SVG utilization chart after every poll.
//!
//! Run with: cargo run --bin gpu-pool-cli

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gpu_pool_vis::chart::{ChartRenderer, SvgSurface};
use gpu_pool_vis::core::{preprocess, Metric, MetricHistory, Validation, WorkstationGroup};
use gpu_pool_vis::fetch::{HttpFetcher, SessionFlag};
use gpu_pool_vis::{Config, Poller};
use parking_lot::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const CHART_WIDTH: f32 = 960.0;
const CHART_HEIGHT: f32 = 320.0;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gpu_pool_vis=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env()?;
    info!(url = %config.url, refresh_ms = config.refresh_interval.as_millis() as u64, "Starting");

    let session = Arc::new(SessionFlag::new());
    let fetcher = Arc::new(HttpFetcher::new(
        config.url.clone(),
        config.request_timeout,
        session.clone(),
    )?);

    let mut poller: Poller<Vec<WorkstationGroup>> = Poller::new(config.poller());
    let handle = poller.handle();
    let history = Arc::new(Mutex::new(MetricHistory::new(config.history_capacity)));

    {
        let history = history.clone();
        let chart_path = config.chart_path.clone();
        let max_points = config.max_points;
        // stays registered for every poll
        handle.on_next_fetch(move |result| {
            if let Some(groups) = result.success_value() {
                let mut history = history.lock();
                history.record(groups);
                log_pool(groups);
                if let Some(path) = &chart_path {
                    write_chart(&history, path, max_points);
                }
            }
            false
        });
    }

    poller.start(
        move || {
            let fetcher = fetcher.clone();
            async move { fetcher.fetch_groups().await.map(preprocess) }
        },
        config.refresh_interval,
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut stats_interval = tokio::time::interval(Duration::from_secs(60));

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
            _ = stats_interval.tick() => {
                let stats = handle.stats();
                let state = match &*handle.current_state() {
                    Validation::Loading => "loading".to_string(),
                    Validation::Success(groups) => format!("{} groups", groups.len()),
                    Validation::Failure(e) => format!("failing ({})", e.kind()),
                };
                info!(
                    issued = stats.issued,
                    completed = stats.completed,
                    discarded = stats.discarded,
                    skipped = stats.skipped,
                    gpus = history.lock().gpu_count(),
                    state = %state,
                    "stats"
                );
                if !session.is_valid() {
                    warn!("Backend rejected the session; refresh credentials");
                }
            }
        }
    }

    poller.stop();
    Ok(())
}

fn log_pool(groups: &[WorkstationGroup]) {
    for group in groups {
        info!(
            group = %group.name,
            workstations = group.workstations.len(),
            free = group.free_count(),
            gpus = group.gpu_count(),
            "pool"
        );
    }
}

fn write_chart(history: &MetricHistory, path: &Path, max_points: usize) {
    let metric = Metric::GpuUtil;
    let geometry = ChartRenderer::new(CHART_WIDTH, CHART_HEIGHT)
        .with_y_domain(0.0, 100.0)
        .render(&history.series(metric), max_points, metric.label());

    let mut svg = SvgSurface::new(geometry.size);
    geometry.draw(&mut svg);
    if let Err(e) = std::fs::write(path, svg.finish()) {
        error!(error = %e, path = %path.display(), "Failed to write chart");
    }
}
