//! Desktop dashboard
//!
//! Owns the poller; the metric history is fed from a persistent observer and
//! every completed poll requests a repaint.

mod chart;
mod groups;
mod header;

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use parking_lot::Mutex;
use tracing::info;

use crate::config::Config;
use crate::core::{preprocess, Metric, MetricHistory, WorkstationGroup};
use crate::fetch::{HttpFetcher, SessionFlag};
use crate::poller::{Poller, PollerHandle};
use crate::theme::{colors, dashboard_visuals};

pub struct DashApp {
    /// Kept alive for the lifetime of the window
    #[allow(dead_code)]
    poller: Poller<Vec<WorkstationGroup>>,
    pub(crate) handle: PollerHandle<Vec<WorkstationGroup>>,
    pub(crate) history: Arc<Mutex<MetricHistory>>,
    pub(crate) session: Arc<SessionFlag>,
    pub(crate) config: Config,
    /// Metric shown in the chart panel
    pub(crate) metric: Metric,
    pub(crate) show_groups: bool,
}

impl DashApp {
    /// Start polling and set up the UI
    ///
    /// Must be called inside a tokio runtime context.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        fetcher: Arc<HttpFetcher>,
        session: Arc<SessionFlag>,
    ) -> Self {
        cc.egui_ctx.set_visuals(dashboard_visuals());

        let history = Arc::new(Mutex::new(MetricHistory::new(config.history_capacity)));
        let mut poller: Poller<Vec<WorkstationGroup>> = Poller::new(config.poller());
        let handle = poller.handle();

        let ctx = cc.egui_ctx.clone();
        let history_clone = history.clone();
        handle.on_next_fetch(move |result| {
            if let Some(groups) = result.success_value() {
                history_clone.lock().record(groups);
            }
            ctx.request_repaint();
            false
        });

        poller.start(
            move || {
                let fetcher = fetcher.clone();
                async move { fetcher.fetch_groups().await.map(preprocess) }
            },
            config.refresh_interval,
        );
        info!(url = %config.url, "Dashboard started");

        Self {
            poller,
            handle,
            history,
            session,
            config,
            metric: Metric::GpuUtil,
            show_groups: true,
        }
    }
}

impl eframe::App for DashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // observers repaint on each poll; this keeps relative labels fresh
        ctx.request_repaint_after(Duration::from_secs(1));

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(6.0))
            .show(ctx, |ui| {
                self.render_header(ui);
            });

        if self.show_groups {
            egui::SidePanel::left("groups")
                .resizable(true)
                .default_width(420.0)
                .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(6.0))
                .show(ctx, |ui| {
                    self.render_groups(ui);
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(6.0))
            .show(ctx, |ui| {
                self.render_chart(ui);
            });
    }
}
