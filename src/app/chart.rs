//! Chart panel: metric picker and the painter-backed chart surface

use eframe::egui;

use super::DashApp;
use crate::chart::{Anchor, ChartRenderer, Pos, Rgb, Surface};
use crate::core::Metric;
use crate::theme::colors;

impl DashApp {
    pub(crate) fn render_chart(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("metric")
                .selected_text(self.metric.label())
                .show_ui(ui, |ui| {
                    for &metric in Metric::ALL {
                        ui.selectable_value(&mut self.metric, metric, metric.label());
                    }
                });
        });

        let size = ui.available_size();
        if size.x < 1.0 || size.y < 1.0 {
            return;
        }
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());

        let series = self.history.lock().series(self.metric);
        if series.iter().all(|s| s.points.len() < 2) {
            painter.text(
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                "Collecting samples...",
                egui::FontId::proportional(13.0),
                colors::TEXT_MUTED,
            );
            return;
        }

        let mut renderer = ChartRenderer::new(size.x, size.y);
        if let Some((lo, hi)) = fixed_range(self.metric) {
            renderer = renderer.with_y_domain(lo, hi);
        }
        let geometry = renderer.render(&series, self.config.max_points, self.metric.label());

        let mut surface = PainterSurface {
            painter: &painter,
            origin: response.rect.min,
        };
        geometry.draw(&mut surface);
    }
}

fn fixed_range(metric: Metric) -> Option<(f64, f64)> {
    match metric {
        Metric::GpuUtil | Metric::MemoryUtil | Metric::FanSpeed => Some((0.0, 100.0)),
        _ => None,
    }
}

/// Draws chart geometry through an egui painter, offset to the widget rect
struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
}

impl PainterSurface<'_> {
    fn at(&self, p: Pos) -> egui::Pos2 {
        self.origin + egui::vec2(p.x, p.y)
    }
}

impl Surface for PainterSurface<'_> {
    fn polyline(&mut self, points: &[Pos], color: Rgb, width: f32) {
        if points.len() < 2 {
            return;
        }
        let points = points.iter().map(|&p| self.at(p)).collect();
        self.painter.line(points, egui::Stroke::new(width, color32(color)));
    }

    fn line(&mut self, from: Pos, to: Pos, color: Rgb, width: f32) {
        self.painter
            .line_segment([self.at(from), self.at(to)], egui::Stroke::new(width, color32(color)));
    }

    fn text(&mut self, at: Pos, text: &str, anchor: Anchor, color: Rgb) {
        self.painter.text(
            self.at(at),
            align(anchor),
            text,
            egui::FontId::proportional(11.0),
            color32(color),
        );
    }
}

fn color32(Rgb(r, g, b): Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(r, g, b)
}

fn align(anchor: Anchor) -> egui::Align2 {
    match anchor {
        Anchor::TopCenter => egui::Align2::CENTER_TOP,
        Anchor::RightMiddle => egui::Align2::RIGHT_CENTER,
        Anchor::BottomCenter => egui::Align2::CENTER_BOTTOM,
    }
}
