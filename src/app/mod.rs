mod about_ui;
mod game_view_ui;
mod html_source_ui;
mod menu_bar_ui;

use eframe::egui;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tinyfiledialogs as tfd;

use crate::audio::Player;
use crate::config::Settings;
use crate::engine::ActiveEngine;
use crate::fonts;
use crate::session::{Controller, UserEvent, WindowCommand};
use crate::view::Surface;
use menu_bar_ui::MenuAction;

pub const APP_TITLE: &str = "FastQSP";

pub struct App {
    pub settings: Settings,
    pub controller: Controller<ActiveEngine>,
    pub surface: Surface,
    pub player: Player,
    pub game_menu_enabled: bool,
    pub menu_bar_visible: bool,
    pub show_html: bool,
    pub show_about: bool,
    pub pending_open: Option<PathBuf>,
    last_viewport: Option<egui::Vec2>,
    last_tick: Instant,
}

/// Only the primary button reaches the page, and nothing can be dropped on
/// the window.
pub fn filter_input(raw_input: &mut egui::RawInput) {
    raw_input.events.retain(|event| {
        !matches!(
            event,
            egui::Event::PointerButton { button, .. } if *button != egui::PointerButton::Primary
        )
    });
    raw_input.hovered_files.clear();
    raw_input.dropped_files.clear();
}

fn dir_string(path: Option<&Path>) -> String {
    path.map(|d| d.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

impl App {
    pub fn new(
        controller: Controller<ActiveEngine>,
        settings: Settings,
        pending_open: Option<PathBuf>,
    ) -> Self {
        Self {
            settings,
            controller,
            surface: Surface::default(),
            player: Player::default(),
            game_menu_enabled: false,
            menu_bar_visible: true,
            show_html: false,
            show_about: false,
            pending_open,
            last_viewport: None,
            last_tick: Instant::now(),
        }
    }

    fn handle(&mut self, ctx: &egui::Context, event: UserEvent) {
        self.controller.sync_audio(self.player.audible());
        match self.controller.dispatch(event) {
            Ok(commands) => {
                for command in commands {
                    self.apply(ctx, command);
                }
            }
            Err(err) => log::error!("{err}"),
        }
    }

    fn apply(&mut self, ctx: &egui::Context, command: WindowCommand) {
        match command {
            WindowCommand::SetHtml(html) => self.surface.set_html(html),
            WindowCommand::SetTitle(title) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Title(title))
            }
            WindowCommand::ResizeWindow { width, height } => {
                if !self.controller.is_fullscreen() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(
                        width as f32,
                        height as f32,
                    )));
                }
            }
            WindowCommand::SetScale(_) => ctx.request_repaint(),
            WindowCommand::LoadFonts(paths) => fonts::install(ctx, &paths),
            WindowCommand::EnableGameMenu => self.game_menu_enabled = true,
            WindowCommand::SetFullscreen(on) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(on))
            }
            WindowCommand::ShowMenuBar(visible) => self.menu_bar_visible = visible,
            WindowCommand::PlayAudio(request) => {
                if let Err(err) = self.player.play(&request) {
                    log::error!("Could not play {}: {err}", request.path.display());
                }
            }
            WindowCommand::StopAudio => self.player.stop(),
            WindowCommand::SetTimer(_) => self.last_tick = Instant::now(),
        }
    }

    fn open_game(&mut self, ctx: &egui::Context, path: PathBuf) {
        self.handle(ctx, UserEvent::OpenFile(path));
        if let Some(dir) = self.controller.session().game_dir.as_deref() {
            let dir = dir.to_string_lossy().to_string();
            if self.settings.last_game_dir.as_deref() != Some(dir.as_str()) {
                self.settings.last_game_dir = Some(dir);
                self.settings.store();
            }
        }
    }

    fn run_menu_action(&mut self, ctx: &egui::Context, action: MenuAction) {
        let game_dir = dir_string(self.controller.session().game_dir.as_deref());
        match action {
            MenuAction::Open => {
                let start_dir = self.settings.last_game_dir.as_deref().unwrap_or(".");
                let path = tfd::open_file_dialog(
                    "Open File",
                    start_dir,
                    Some((&["*.qsp"], "QSP game (*.qsp)")),
                );
                if let Some(path) = path {
                    self.open_game(ctx, PathBuf::from(path));
                }
            }
            MenuAction::Exit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            MenuAction::Save => {
                let path = tfd::save_file_dialog_with_filter(
                    "Save Game",
                    &game_dir,
                    &["*.sav"],
                    "QSP save-game (*.sav)",
                );
                if let Some(path) = path {
                    self.handle(ctx, UserEvent::SaveGame(PathBuf::from(path)));
                }
            }
            MenuAction::Load => {
                let path = tfd::open_file_dialog(
                    "Load Game",
                    &game_dir,
                    Some((&["*.sav"], "QSP save-game (*.sav)")),
                );
                if let Some(path) = path {
                    self.handle(ctx, UserEvent::LoadGame(PathBuf::from(path)));
                }
            }
            MenuAction::ToggleFullscreen => self.handle(ctx, UserEvent::ToggleFullscreen),
            MenuAction::ShowHtml => self.show_html = true,
            MenuAction::About => self.show_about = true,
        }
    }

    /// Tracks the size available to the game view. Returns true if settings changed.
    fn handle_window_resize(&mut self, ctx: &egui::Context, view_size: egui::Vec2) -> bool {
        if self.last_viewport != Some(view_size) {
            self.last_viewport = Some(view_size);
            self.handle(
                ctx,
                UserEvent::Resize {
                    width: view_size.x,
                    height: view_size.y,
                },
            );
        }
        if self.controller.is_fullscreen() {
            return false;
        }
        let Some(win_rect) = ctx.input(|i| i.viewport().inner_rect) else {
            return false;
        };
        let win_size = win_rect.size();
        if self.settings.window_width != Some(win_size.x)
            || self.settings.window_height != Some(win_size.y)
        {
            self.settings.window_width = Some(win_size.x);
            self.settings.window_height = Some(win_size.y);
            return true;
        }
        false
    }

    /// Advances the engine counter once per timer interval while a game runs.
    fn run_timer(&mut self, ctx: &egui::Context) {
        if !self.controller.is_loaded() {
            return;
        }
        let interval = self.controller.timer_interval();
        let elapsed = self.last_tick.elapsed();
        if elapsed >= interval {
            self.last_tick = Instant::now();
            self.handle(ctx, UserEvent::Tick);
            ctx.request_repaint_after(interval);
        } else {
            ctx.request_repaint_after(interval - elapsed);
        }
    }
}

impl eframe::App for App {
    fn raw_input_hook(&mut self, _ctx: &egui::Context, raw_input: &mut egui::RawInput) {
        filter_input(raw_input);
    }

    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        if let Some(path) = self.pending_open.take() {
            self.open_game(ctx, path);
        }

        let mut actions = menu_bar_ui::consume_shortcuts(ctx, self.game_menu_enabled);
        if self.menu_bar_visible {
            actions.extend(menu_bar_ui::menu_bar_ui(ctx, self.game_menu_enabled));
        }
        for action in actions {
            self.run_menu_action(ctx, action);
        }

        let session = self.controller.session();
        let page_size = egui::vec2(session.view_width, session.view_height);
        let (view_size, clicked) =
            game_view_ui::game_view_ui(ctx, &mut self.surface, page_size, session.scale);
        if let Some(link) = clicked {
            self.handle(ctx, UserEvent::LinkClicked(link));
        }
        if self.handle_window_resize(ctx, view_size) {
            self.settings.store();
        }

        self.run_timer(ctx);

        html_source_ui::html_source_ui(ctx, &mut self.show_html, self.surface.html());
        about_ui::about_ui(ctx, &mut self.show_about);
    }

    // Required by eframe 0.34; all drawing happens in `update`, which eframe
    // still calls every frame before `ui`.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}
}
