use eframe::egui::{self, Key, KeyboardShortcut, Modifiers};

const OPEN: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
const EXIT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Q);
const SAVE: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::S);
const LOAD: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::L);
const FULLSCREEN: KeyboardShortcut = KeyboardShortcut::new(Modifiers::ALT, Key::Enter);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Open,
    Exit,
    Save,
    Load,
    ToggleFullscreen,
    ShowHtml,
    About,
}

const SHORTCUTS: [(KeyboardShortcut, MenuAction, bool); 5] = [
    (OPEN, MenuAction::Open, false),
    (EXIT, MenuAction::Exit, false),
    (SAVE, MenuAction::Save, true),
    (LOAD, MenuAction::Load, true),
    (FULLSCREEN, MenuAction::ToggleFullscreen, true),
];

/// Shortcuts work with the menu bar hidden too. Game shortcuts stay inert
/// until a game is loaded.
pub fn consume_shortcuts(ctx: &egui::Context, game_menu_enabled: bool) -> Vec<MenuAction> {
    ctx.input_mut(|i| {
        SHORTCUTS
            .iter()
            .filter(|(_, _, needs_game)| game_menu_enabled || !needs_game)
            .filter(|(shortcut, _, _)| i.consume_shortcut(shortcut))
            .map(|(_, action, _)| *action)
            .collect()
    })
}

fn menu_item(
    ui: &mut egui::Ui,
    label: &str,
    shortcut: Option<&KeyboardShortcut>,
    action: MenuAction,
    clicked: &mut Option<MenuAction>,
) {
    let mut button = egui::Button::new(label);
    if let Some(shortcut) = shortcut {
        button = button.shortcut_text(ui.ctx().format_shortcut(shortcut));
    }
    if ui.add(button).clicked() {
        *clicked = Some(action);
        ui.close();
    }
}

pub fn menu_bar_ui(ctx: &egui::Context, game_menu_enabled: bool) -> Option<MenuAction> {
    let mut clicked = None;
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                menu_item(ui, "Open file", Some(&OPEN), MenuAction::Open, &mut clicked);
                menu_item(ui, "Exit", Some(&EXIT), MenuAction::Exit, &mut clicked);
            });
            ui.add_enabled_ui(game_menu_enabled, |ui| {
                ui.menu_button("Game", |ui| {
                    menu_item(ui, "Save", Some(&SAVE), MenuAction::Save, &mut clicked);
                    menu_item(ui, "Load", Some(&LOAD), MenuAction::Load, &mut clicked);
                    menu_item(
                        ui,
                        "Fullscreen",
                        Some(&FULLSCREEN),
                        MenuAction::ToggleFullscreen,
                        &mut clicked,
                    );
                });
            });
            ui.menu_button("Help", |ui| {
                menu_item(ui, "Show html", None, MenuAction::ShowHtml, &mut clicked);
                menu_item(ui, "About", None, MenuAction::About, &mut clicked);
            });
        });
    });
    clicked
}
