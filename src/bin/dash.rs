//! Desktop dashboard for the GPU pool
//!
//! Run with: cargo run --features gui --bin gpu-pool-dash

use std::sync::Arc;

use eframe::egui;
use gpu_pool_vis::app::DashApp;
use gpu_pool_vis::fetch::{HttpFetcher, SessionFlag};
use gpu_pool_vis::Config;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gpu_pool_vis=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env()?;

    // polling runs on background workers; the UI owns the main thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("gpu-pool-poller")
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let session = Arc::new(SessionFlag::new());
    let fetcher = Arc::new(HttpFetcher::new(
        config.url.clone(),
        config.request_timeout,
        session.clone(),
    )?);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("GPU pool")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    info!(url = %config.url, "Opening dashboard");
    eframe::run_native(
        "gpu-pool-dash",
        options,
        Box::new(move |cc| Ok(Box::new(DashApp::new(cc, config, fetcher, session)))),
    )?;
    Ok(())
}
