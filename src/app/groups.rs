//! Workstation table grouped by administrative group

use eframe::egui;

use super::DashApp;
use crate::core::{Validation, Workstation};
use crate::theme::colors;

impl DashApp {
    pub(crate) fn render_groups(&self, ui: &mut egui::Ui) {
        let state = self.handle.current_state();
        let groups = match &*state {
            Validation::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new("Waiting for first poll").color(colors::TEXT_MUTED));
                });
                return;
            }
            Validation::Failure(e) => {
                ui.colored_label(colors::STATUS_ERROR, e.to_string());
                return;
            }
            Validation::Success(groups) => groups,
        };

        egui::ScrollArea::vertical().show(ui, |ui| {
            for group in groups {
                ui.label(
                    egui::RichText::new(format!(
                        "{}  {}/{} free",
                        group.name,
                        group.free_count(),
                        group.workstations.len()
                    ))
                    .color(colors::TEXT_SECONDARY)
                    .strong(),
                );

                egui::Grid::new(("group", group.name.as_str()))
                    .striped(true)
                    .num_columns(4)
                    .show(ui, |ui| {
                        for ws in &group.workstations {
                            workstation_row(ui, ws);
                        }
                    });
                ui.add_space(8.0);
            }
        });
    }
}

fn workstation_row(ui: &mut egui::Ui, ws: &Workstation) {
    ui.label(egui::RichText::new(&ws.name).monospace())
        .on_hover_text(format!("{}\n{}\n{}", ws.cpu, ws.motherboard, ws.notes));

    if ws.free {
        ui.colored_label(colors::FREE, "free");
    } else {
        ui.colored_label(colors::BUSY, "busy");
    }

    ui.label(egui::RichText::new(format!("{} GPU", ws.gpus.len())).color(colors::TEXT_MUTED));

    let mut users: Vec<&str> = ws.gpus.iter().filter_map(|g| g.user.as_deref()).collect();
    users.sort_unstable();
    users.dedup();
    let util = mean_util(ws);
    ui.label(
        egui::RichText::new(format!("{util:.0}%  {}", users.join(", "))).color(colors::TEXT_SECONDARY),
    );
    ui.end_row();
}

fn mean_util(ws: &Workstation) -> f64 {
    if ws.gpus.is_empty() {
        return 0.0;
    }
    ws.gpus.iter().map(|g| g.gpu_util_percent).sum::<f64>() / ws.gpus.len() as f64
}
