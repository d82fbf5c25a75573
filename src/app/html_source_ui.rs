use eframe::egui;

fn copy_to_clipboard(text: &str) {
    let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
    if let Err(err) = result {
        log::error!("Could not copy page source: {err}");
    }
}

/// Raw markup of the page currently shown.
pub fn html_source_ui(ctx: &egui::Context, open: &mut bool, html: &str) {
    egui::Window::new("Page source")
        .open(open)
        .default_size([640.0, 480.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} bytes", html.len()));
                if ui.button("Copy").clicked() {
                    copy_to_clipboard(html);
                }
            });
            ui.separator();
            egui::ScrollArea::both().show(ui, |ui| {
                let mut source = html;
                ui.add(
                    egui::TextEdit::multiline(&mut source)
                        .code_editor()
                        .desired_width(f32::INFINITY),
                );
            });
        });
}
