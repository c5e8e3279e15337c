//! Dark, low-contrast dashboard theme

use egui::Color32;

pub mod colors {
    use super::Color32;

    // === Backgrounds ===
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(14, 15, 17);
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(24, 26, 29);
    pub const BG_HOVER: Color32 = Color32::from_rgb(36, 38, 42);

    // === Text ===
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 230, 230);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 160, 160);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(95, 95, 95);

    pub const BORDER: Color32 = Color32::from_rgb(48, 50, 54);

    // === Poll status ===
    pub const STATUS_OK: Color32 = Color32::from_rgb(100, 200, 100);
    pub const STATUS_PENDING: Color32 = Color32::from_rgb(200, 200, 100);
    pub const STATUS_ERROR: Color32 = Color32::from_rgb(200, 100, 100);

    // === Workstation availability ===
    pub const FREE: Color32 = Color32::from_rgb(90, 170, 120);
    pub const BUSY: Color32 = Color32::from_rgb(190, 130, 70);
}

pub fn dashboard_visuals() -> egui::Visuals {
    use colors::*;

    let mut visuals = egui::Visuals::dark();

    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_ELEVATED;
    visuals.extreme_bg_color = BG_PRIMARY;
    visuals.faint_bg_color = BG_ELEVATED;
    visuals.override_text_color = Some(TEXT_PRIMARY);

    visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, BORDER);
    visuals.widgets.inactive.weak_bg_fill = BG_ELEVATED;
    visuals.widgets.hovered.weak_bg_fill = BG_HOVER;
    visuals.widgets.active.weak_bg_fill = BG_HOVER;

    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;

    visuals
}
