#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod app;
mod audio;
mod config;
mod engine;
mod fonts;
mod link;
mod page;
mod session;
mod view;

use eframe::egui;
use std::path::PathBuf;

use crate::app::{App, APP_TITLE};
use crate::config::Settings;
use crate::session::Controller;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load();
    let width = settings.window_width.unwrap_or(800.0);
    let height = settings.window_height.unwrap_or(600.0);
    // A world file given on the command line is opened on the first frame.
    let initial_game = std::env::args_os().nth(1).map(PathBuf::from);

    eframe::run_native(
        APP_TITLE,
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(APP_TITLE)
                .with_inner_size([width, height])
                .with_drag_and_drop(false),
            ..Default::default()
        },
        Box::new(move |_| {
            let controller = Controller::new(engine::create()?);
            Ok(Box::new(App::new(controller, settings, initial_game)))
        }),
    )
}
