//! Header bar with poll status and controls

use eframe::egui;

use super::DashApp;
use crate::core::Validation;
use crate::theme::colors;

impl DashApp {
    pub(crate) fn render_header(&mut self, ui: &mut egui::Ui) {
        let state = self.handle.current_state();
        let stats = self.handle.stats();
        let polling = self.handle.should_fetch();

        ui.horizontal(|ui| {
            let groups_text = if self.show_groups { "Groups <<<" } else { "Groups >>>" };
            if ui.button(egui::RichText::new(groups_text)).clicked() {
                self.show_groups = !self.show_groups;
            }

            let pause_text = if polling { "Pause" } else { "Resume" };
            if ui.button(egui::RichText::new(pause_text)).clicked() {
                self.handle.set_should_fetch(!polling);
            }

            ui.add_space(10.0);

            let (status_color, status_text) = match &*state {
                Validation::Loading => (colors::STATUS_PENDING, "Loading...".to_string()),
                Validation::Success(groups) => {
                    let free: usize = groups.iter().map(|g| g.free_count()).sum();
                    let total: usize = groups.iter().map(|g| g.workstations.len()).sum();
                    (colors::STATUS_OK, format!("{free}/{total} workstations free"))
                }
                Validation::Failure(e) => (colors::STATUS_ERROR, format!("Error: {e}")),
            };
            ui.colored_label(status_color, egui::RichText::new(status_text));

            if !polling {
                ui.label(egui::RichText::new("(paused)").color(colors::TEXT_MUTED));
            }
            if !self.session.is_valid() {
                ui.colored_label(colors::STATUS_ERROR, "session expired, log in again");
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new(format!("{} GPUs tracked", self.history.lock().gpu_count()))
                        .color(colors::TEXT_MUTED),
                );
                ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                ui.label(
                    egui::RichText::new(format!("{}/{} polls", stats.completed, stats.issued))
                        .color(colors::TEXT_SECONDARY),
                );
                ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                ui.label(
                    egui::RichText::new(format!(
                        "every {}s",
                        self.config.refresh_interval.as_secs_f64()
                    ))
                    .color(colors::TEXT_MUTED),
                );
            });
        });
    }
}
