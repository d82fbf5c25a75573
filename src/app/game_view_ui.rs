use crate::view::Surface;
use eframe::egui;

/// Draws the current page and returns the size available to it together
/// with the link clicked this frame, if any.
pub fn game_view_ui(
    ctx: &egui::Context,
    surface: &mut Surface,
    page_size: egui::Vec2,
    scale: f32,
) -> (egui::Vec2, Option<String>) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
        .show(ctx, |ui| {
            let available = ui.available_size();
            let clicked = surface.show(ui, page_size, scale);
            (available, clicked)
        })
        .inner
}
