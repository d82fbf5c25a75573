use eframe::egui;

pub fn about_ui(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("About")
        .open(open)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            ui.heading(format!("FastQSP player v{}", env!("CARGO_PKG_VERSION")));
            ui.separator();
            egui::Grid::new("about_grid").num_columns(2).show(ui, |ui| {
                ui.label("Engine:");
                ui.label(if cfg!(feature = "qsp") {
                    "QSP (native library)"
                } else {
                    "not linked"
                });
                ui.end_row();
                ui.label("License:");
                ui.label("GPL v3");
                ui.end_row();
            });
        });
}
