//! Session state and the event dispatch table of the player window.
//!
//! [`Controller::dispatch`] is the only entry point: it takes one user or
//! timer event, performs the engine calls it implies and returns the
//! [`WindowCommand`]s the egui shell has to apply. Nothing in here touches
//! egui, so every transition can be exercised against a mock engine.

use crate::audio::AudioRequest;
use crate::config::{self, GameConfig};
use crate::engine::{Engine, EngineError, EngineEvent, same_file_name};
use crate::fonts;
use crate::link::{LinkDirective, LinkError};
use crate::page::PageBuilder;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GAME_WIDTH: u32 = 800;
pub const DEFAULT_GAME_HEIGHT: u32 = 600;
pub const DEFAULT_TIMER: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not open file {}: {source}", path.display())]
    WorldLoad {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("could not restart game: {0}")]
    Restart(#[source] EngineError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    OpenFile(PathBuf),
    LinkClicked(String),
    SaveGame(PathBuf),
    LoadGame(PathBuf),
    ToggleFullscreen,
    Resize { width: f32, height: f32 },
    Tick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowCommand {
    SetHtml(String),
    SetTitle(String),
    ResizeWindow { width: u32, height: u32 },
    SetScale(f32),
    LoadFonts(Vec<PathBuf>),
    EnableGameMenu,
    SetFullscreen(bool),
    ShowMenuBar(bool),
    PlayAudio(AudioRequest),
    StopAudio,
    SetTimer(Duration),
}

/// The game currently loaded, or the defaults before the first open.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub game_dir: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f32,
    pub scale: f32,
    /// Size of the letterboxed page on screen.
    pub view_width: f32,
    pub view_height: f32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None, DEFAULT_GAME_WIDTH, DEFAULT_GAME_HEIGHT)
    }
}

impl Session {
    fn new(game_dir: Option<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            game_dir,
            width,
            height,
            aspect_ratio: width as f32 / height as f32,
            scale: 1.0,
            view_width: width as f32,
            view_height: height as f32,
        }
    }

    /// Declared fields override the defaults, absent ones keep them.
    fn apply(&mut self, config: &GameConfig) {
        self.width = config.width.unwrap_or(self.width);
        self.height = config.height.unwrap_or(self.height);
        self.aspect_ratio = self.width as f32 / self.height as f32;
        self.view_width = self.width as f32;
        self.view_height = self.height as f32;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub view_width: f32,
    pub view_height: f32,
    pub scale: f32,
}

/// Largest view of the game's aspect ratio that fits `width` x `height`:
/// fit the width first, fall back to the height when that overflows.
pub fn fit_view(width: f32, height: f32, game_width: u32, ratio: f32) -> Option<Fit> {
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return None;
    }
    if game_width == 0 || !(ratio > 0.0 && ratio.is_finite()) {
        return None;
    }
    let mut view_width = width;
    let mut view_height = view_width / ratio;
    if view_height > height {
        view_height = height;
        view_width = view_height * ratio;
    }
    Some(Fit {
        view_width,
        view_height,
        scale: view_width / game_width as f32,
    })
}

pub struct Controller<E> {
    engine: E,
    builder: PageBuilder,
    session: Session,
    fullscreen: bool,
    timer: Duration,
    viewport: Option<(f32, f32)>,
    html: String,
    /// Last file the engine started, as it named it and as resolved on disk.
    playing: Option<(String, PathBuf)>,
}

impl<E: Engine> Controller<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            builder: PageBuilder::default(),
            session: Session::default(),
            fullscreen: false,
            timer: DEFAULT_TIMER,
            viewport: None,
            html: String::new(),
            playing: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_loaded(&self) -> bool {
        self.session.game_dir.is_some()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn timer_interval(&self) -> Duration {
        self.timer
    }

    /// Forgets the engine's last track unless the player still has it
    /// audible.
    pub fn sync_audio(&mut self, audible: Option<&Path>) {
        let Some((file, path)) = &self.playing else {
            return;
        };
        if audible != Some(path.as_path()) {
            log::debug!("{file} is no longer playing");
            self.playing = None;
        }
    }

    pub fn dispatch(&mut self, event: UserEvent) -> Result<Vec<WindowCommand>, SessionError> {
        let mut out = Vec::new();
        match event {
            UserEvent::OpenFile(path) => self.open_file(&path, &mut out)?,
            UserEvent::LinkClicked(link) => self.link_clicked(&link, &mut out)?,
            UserEvent::SaveGame(path) => self.save_game(&path, &mut out)?,
            UserEvent::LoadGame(path) => self.load_game(&path, &mut out)?,
            UserEvent::ToggleFullscreen => self.toggle_fullscreen(&mut out),
            UserEvent::Resize { width, height } => self.resize(width, height, &mut out),
            UserEvent::Tick => self.tick(&mut out)?,
        }
        Ok(out)
    }

    /// Runs one engine call. Callbacks raised by a failed call are dropped
    /// along with the action.
    fn call(
        &mut self,
        f: impl FnOnce(&mut E) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let playing = self.playing.as_ref().map(|(file, _)| file.clone());
        self.engine.set_playing(playing.as_deref());
        let result = f(&mut self.engine);
        if result.is_err() {
            let dropped = self.engine.drain_events();
            if !dropped.is_empty() {
                log::debug!("dropped {} engine events of a failed call", dropped.len());
            }
        }
        result
    }

    fn open_file(&mut self, path: &Path, out: &mut Vec<WindowCommand>) -> Result<(), SessionError> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        self.call(|e| e.load_world(path))
            .map_err(|source| SessionError::WorldLoad {
                path: path.to_path_buf(),
                source,
            })?;
        self.call(|e| e.restart()).map_err(SessionError::Restart)?;

        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let dir = config::parent_dir(&path).unwrap_or_else(|| PathBuf::from("."));
        log::info!("opened game {}", path.display());

        out.push(WindowCommand::EnableGameMenu);
        self.builder.set_game_dir(&dir);
        out.push(WindowCommand::LoadFonts(fonts::discover(&dir)));

        // Fields the new config leaves out keep the previous game's values.
        let mut session = Session::new(Some(dir.clone()), self.session.width, self.session.height);
        if let Some(game_config) = GameConfig::load(&dir) {
            session.apply(&game_config);
            if let Some(title) = game_config.title {
                out.push(WindowCommand::SetTitle(title));
            }
        }
        self.session = session;

        self.apply_engine_events(out);
        self.reload(out, true);
        out.push(WindowCommand::ResizeWindow {
            width: self.session.width,
            height: self.session.height,
        });
        if let Some((width, height)) = self.viewport {
            self.resize(width, height, out);
        }
        Ok(())
    }

    fn link_clicked(&mut self, link: &str, out: &mut Vec<WindowCommand>) -> Result<(), SessionError> {
        log::debug!("link clicked: {link}");
        match LinkDirective::parse(link)? {
            LinkDirective::Execute(code) => self.call(|e| e.exec_string(&code))?,
            LinkDirective::SelectObject(index) => self.call(|e| e.set_selected_object(index))?,
            LinkDirective::CloseMessage => self.builder.hide_message(),
            LinkDirective::SelectAction(index) => self.call(|e| {
                e.set_selected_action(index)?;
                e.execute_selected_action()
            })?,
        }
        self.apply_engine_events(out);
        self.reload(out, true);
        Ok(())
    }

    fn save_game(&mut self, path: &Path, out: &mut Vec<WindowCommand>) -> Result<(), SessionError> {
        if !self.is_loaded() || path.as_os_str().is_empty() {
            return Ok(());
        }
        self.call(|e| e.save_game(path))?;
        log::info!("saved game to {}", path.display());
        self.apply_engine_events(out);
        self.reload(out, false);
        Ok(())
    }

    fn load_game(&mut self, path: &Path, out: &mut Vec<WindowCommand>) -> Result<(), SessionError> {
        if !self.is_loaded() || path.as_os_str().is_empty() {
            return Ok(());
        }
        self.call(|e| e.open_saved_game(path))?;
        log::info!("loaded saved game {}", path.display());
        self.apply_engine_events(out);
        self.reload(out, true);
        Ok(())
    }

    fn toggle_fullscreen(&mut self, out: &mut Vec<WindowCommand>) {
        if !self.is_loaded() {
            return;
        }
        self.fullscreen = !self.fullscreen;
        log::debug!("fullscreen mode {}", if self.fullscreen { "on" } else { "off" });
        out.push(WindowCommand::SetFullscreen(self.fullscreen));
        out.push(WindowCommand::ShowMenuBar(!self.fullscreen));
    }

    fn resize(&mut self, width: f32, height: f32, out: &mut Vec<WindowCommand>) {
        let Some(fit) = fit_view(width, height, self.session.width, self.session.aspect_ratio)
        else {
            return;
        };
        self.viewport = Some((width, height));
        self.session.scale = fit.scale;
        self.session.view_width = fit.view_width;
        self.session.view_height = fit.view_height;
        out.push(WindowCommand::SetScale(fit.scale));
    }

    fn tick(&mut self, out: &mut Vec<WindowCommand>) -> Result<(), SessionError> {
        if !self.is_loaded() {
            return Ok(());
        }
        self.call(|e| e.exec_counter())?;
        self.apply_engine_events(out);
        self.reload(out, false);
        Ok(())
    }

    fn apply_engine_events(&mut self, out: &mut Vec<WindowCommand>) {
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::ShowMessage(text) => self.builder.show_message(text),
                EngineEvent::ShowImage(file) => self.builder.show_picture(file),
                EngineEvent::PlayFile { file, volume } => {
                    let base = self.session.game_dir.as_deref().unwrap_or(Path::new("."));
                    let request = AudioRequest::new(base, &file, volume);
                    self.playing = Some((file, request.path.clone()));
                    out.push(WindowCommand::PlayAudio(request));
                }
                EngineEvent::CloseFile(name) => {
                    let other_file = match (&name, &self.playing) {
                        (Some(name), Some((file, _))) => !same_file_name(name, file),
                        _ => false,
                    };
                    if other_file {
                        continue;
                    }
                    self.playing = None;
                    out.push(WindowCommand::StopAudio);
                }
                EngineEvent::SetTimer(ms) => {
                    self.timer = Duration::from_millis(u64::from(ms.max(1)));
                    out.push(WindowCommand::SetTimer(self.timer));
                }
            }
        }
    }

    /// Rebuilds the page. Unless `force`d, an unchanged page is not resent.
    fn reload(&mut self, out: &mut Vec<WindowCommand>, force: bool) {
        let html = self.builder.html(&self.engine.state());
        if !force && html == self.html {
            return;
        }
        self.html = html.clone();
        out.push(WindowCommand::SetHtml(html));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Call, RecordingEngine};
    use crate::engine::{GameState, ListItem};
    use std::fs;

    fn loaded(dir: &Path) -> Controller<RecordingEngine> {
        let mut controller = Controller::new(RecordingEngine::default());
        controller
            .dispatch(UserEvent::OpenFile(dir.join("game.qsp")))
            .unwrap();
        controller.engine.calls.clear();
        controller
    }

    fn html_of(commands: &[WindowCommand]) -> Option<&str> {
        commands.iter().find_map(|c| match c {
            WindowCommand::SetHtml(html) => Some(html.as_str()),
            _ => None,
        })
    }

    const FOUR_THIRDS: f32 = 800.0 / 600.0;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn fit_width_branch() {
        let fit = fit_view(1000.0, 1000.0, 800, FOUR_THIRDS).unwrap();
        assert_eq!(fit.view_width, 1000.0);
        assert!(close(fit.view_height, 750.0));
        assert_eq!(fit.scale, 1.25);
    }

    #[test]
    fn fit_height_branch() {
        let fit = fit_view(1600.0, 600.0, 800, FOUR_THIRDS).unwrap();
        assert_eq!(fit.view_height, 600.0);
        assert!(close(fit.view_width, 800.0));
        assert!(close(fit.scale, 1.0));
    }

    #[test]
    fn fit_rejects_invalid_sizes() {
        assert_eq!(fit_view(0.0, 100.0, 800, FOUR_THIRDS), None);
        assert_eq!(fit_view(100.0, -1.0, 800, FOUR_THIRDS), None);
        assert_eq!(fit_view(f32::NAN, 100.0, 800, FOUR_THIRDS), None);
        assert_eq!(fit_view(100.0, 100.0, 0, FOUR_THIRDS), None);
    }

    #[test]
    fn open_file_configures_session() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.xml"),
            r#"<settings width="1024" height="768" title="Demo">"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("fonts")).unwrap();
        fs::write(dir.path().join("fonts/a.ttf"), [0u8; 4]).unwrap();

        let mut controller = Controller::new(RecordingEngine::default());
        let world = dir.path().join("game.qsp");
        let out = controller.dispatch(UserEvent::OpenFile(world.clone())).unwrap();

        assert_eq!(
            controller.engine.calls,
            vec![Call::LoadWorld(world), Call::Restart]
        );
        assert!(controller.is_loaded());
        assert_eq!(controller.session().width, 1024);
        assert_eq!(controller.session().height, 768);
        assert!((controller.session().aspect_ratio - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!(out[0], WindowCommand::EnableGameMenu);
        assert!(matches!(&out[1], WindowCommand::LoadFonts(f) if f.len() == 1));
        assert!(out.contains(&WindowCommand::SetTitle("Demo".to_string())));
        assert!(html_of(&out).is_some());
        assert_eq!(
            out.last(),
            Some(&WindowCommand::ResizeWindow {
                width: 1024,
                height: 768
            })
        );
    }

    #[test]
    fn open_file_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let controller = loaded(dir.path());
        assert_eq!(controller.session().width, DEFAULT_GAME_WIDTH);
        assert_eq!(controller.session().height, DEFAULT_GAME_HEIGHT);
    }

    #[test]
    fn undeclared_size_carries_over_from_previous_game() {
        let first = tempfile::tempdir().unwrap();
        fs::write(
            first.path().join("config.xml"),
            r#"<settings width="1024" height="768">"#,
        )
        .unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("config.xml"), r#"<settings height="500">"#).unwrap();

        let mut controller = Controller::new(RecordingEngine::default());
        controller
            .dispatch(UserEvent::OpenFile(first.path().join("game.qsp")))
            .unwrap();
        let out = controller
            .dispatch(UserEvent::OpenFile(second.path().join("game.qsp")))
            .unwrap();
        assert_eq!(controller.session().width, 1024);
        assert_eq!(controller.session().height, 500);
        assert_eq!(
            out.last(),
            Some(&WindowCommand::ResizeWindow {
                width: 1024,
                height: 500
            })
        );
    }

    #[test]
    fn failed_world_load_leaves_window_unloaded() {
        let mut controller = Controller::new(RecordingEngine {
            fail_load: true,
            ..RecordingEngine::default()
        });
        let err = controller
            .dispatch(UserEvent::OpenFile(PathBuf::from("/nowhere/game.qsp")))
            .unwrap_err();
        assert!(matches!(err, SessionError::WorldLoad { .. }));
        assert!(!controller.is_loaded());
        assert_eq!(controller.engine.calls.len(), 1);
    }

    #[test]
    fn failed_restart_leaves_window_unloaded() {
        let mut controller = Controller::new(RecordingEngine {
            fail_restart: true,
            ..RecordingEngine::default()
        });
        let err = controller
            .dispatch(UserEvent::OpenFile(PathBuf::from("/nowhere/game.qsp")))
            .unwrap_err();
        assert!(matches!(err, SessionError::Restart(_)));
        assert!(!controller.is_loaded());
    }

    #[test]
    fn cancelled_open_is_noop() {
        let mut controller = Controller::new(RecordingEngine::default());
        let out = controller.dispatch(UserEvent::OpenFile(PathBuf::new())).unwrap();
        assert!(out.is_empty());
        assert!(controller.engine.calls.is_empty());
    }

    #[test]
    fn links_dispatch_to_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());

        let out = controller
            .dispatch(UserEvent::LinkClicked("exec:say %22hi%22".to_string()))
            .unwrap();
        assert!(html_of(&out).is_some());
        controller
            .dispatch(UserEvent::LinkClicked("obj:3".to_string()))
            .unwrap();
        controller
            .dispatch(UserEvent::LinkClicked("5".to_string()))
            .unwrap();

        assert_eq!(
            controller.engine.calls,
            vec![
                Call::ExecString("say \"hi\"".to_string()),
                Call::SelectObject(3),
                Call::SelectAction(4),
                Call::ExecuteAction,
            ]
        );
    }

    #[test]
    fn malformed_links_make_no_engine_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        for link in ["obj:abc", "abc"] {
            let err = controller
                .dispatch(UserEvent::LinkClicked(link.to_string()))
                .unwrap_err();
            assert!(matches!(err, SessionError::Link(_)));
        }
        assert!(controller.engine.calls.is_empty());
    }

    #[test]
    fn msgclose_hides_message_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        controller
            .engine
            .pending
            .push(EngineEvent::ShowMessage("Hello".to_string()));
        let out = controller
            .dispatch(UserEvent::LinkClicked("exec:msg 'Hello'".to_string()))
            .unwrap();
        assert!(html_of(&out).unwrap().contains("msgclose"));

        let out = controller
            .dispatch(UserEvent::LinkClicked("msgclose".to_string()))
            .unwrap();
        assert!(!html_of(&out).unwrap().contains("msgclose"));
        assert_eq!(controller.engine.calls.len(), 1);
    }

    #[test]
    fn save_and_load_delegate_and_ignore_empty_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        let save = dir.path().join("slot.sav");

        assert!(controller.dispatch(UserEvent::SaveGame(PathBuf::new())).unwrap().is_empty());
        assert!(controller.dispatch(UserEvent::LoadGame(PathBuf::new())).unwrap().is_empty());
        assert!(controller.engine.calls.is_empty());

        controller.dispatch(UserEvent::SaveGame(save.clone())).unwrap();
        let out = controller.dispatch(UserEvent::LoadGame(save.clone())).unwrap();
        assert!(html_of(&out).is_some());
        assert_eq!(
            controller.engine.calls,
            vec![Call::Save(save.clone()), Call::OpenSave(save)]
        );
    }

    #[test]
    fn failed_load_game_does_not_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        controller.engine.fail_open_save = true;
        let result = controller.dispatch(UserEvent::LoadGame(dir.path().join("bad.sav")));
        assert!(matches!(result, Err(SessionError::Engine(_))));
    }

    #[test]
    fn game_menu_actions_need_a_loaded_game() {
        let mut controller = Controller::new(RecordingEngine::default());
        assert!(controller.dispatch(UserEvent::ToggleFullscreen).unwrap().is_empty());
        assert!(controller
            .dispatch(UserEvent::SaveGame(PathBuf::from("a.sav")))
            .unwrap()
            .is_empty());
        assert!(controller.dispatch(UserEvent::Tick).unwrap().is_empty());
        assert!(controller.engine.calls.is_empty());
    }

    #[test]
    fn fullscreen_toggle_twice_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        let on = controller.dispatch(UserEvent::ToggleFullscreen).unwrap();
        assert_eq!(
            on,
            vec![WindowCommand::SetFullscreen(true), WindowCommand::ShowMenuBar(false)]
        );
        let off = controller.dispatch(UserEvent::ToggleFullscreen).unwrap();
        assert_eq!(
            off,
            vec![WindowCommand::SetFullscreen(false), WindowCommand::ShowMenuBar(true)]
        );
        assert!(!controller.is_fullscreen());
    }

    #[test]
    fn resize_applies_uniform_scale() {
        let mut controller = Controller::new(RecordingEngine::default());
        let out = controller
            .dispatch(UserEvent::Resize {
                width: 1000.0,
                height: 1000.0,
            })
            .unwrap();
        assert_eq!(out, vec![WindowCommand::SetScale(1.25)]);
        let out = controller
            .dispatch(UserEvent::Resize {
                width: 0.0,
                height: 10.0,
            })
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(controller.session().scale, 1.25);
        assert_eq!(controller.session().view_width, 1000.0);
        assert!(close(controller.session().view_height, 750.0));
    }

    #[test]
    fn open_rescales_for_the_new_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.xml"),
            r#"<c width="400" height="400">"#,
        )
        .unwrap();
        let mut controller = Controller::new(RecordingEngine::default());
        controller
            .dispatch(UserEvent::Resize {
                width: 800.0,
                height: 600.0,
            })
            .unwrap();
        let out = controller
            .dispatch(UserEvent::OpenFile(dir.path().join("game.qsp")))
            .unwrap();
        assert_eq!(out.last(), Some(&WindowCommand::SetScale(1.5)));
    }

    #[test]
    fn tick_advances_counter_and_resends_only_changed_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());

        let out = controller.dispatch(UserEvent::Tick).unwrap();
        assert!(out.is_empty());
        assert_eq!(controller.engine.calls, vec![Call::Counter]);

        controller.engine.state = GameState {
            main_desc: "The clock strikes".to_string(),
            ..GameState::default()
        };
        let out = controller.dispatch(UserEvent::Tick).unwrap();
        assert!(html_of(&out).unwrap().contains("The clock strikes"));
    }

    #[test]
    fn engine_callbacks_become_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        controller.engine.pending = vec![
            EngineEvent::PlayFile {
                file: "music\\theme.ogg".to_string(),
                volume: 80,
            },
            EngineEvent::SetTimer(250),
            EngineEvent::CloseFile(None),
        ];
        controller.engine.state.actions = vec![ListItem {
            image: None,
            text: "Wait".to_string(),
        }];
        let out = controller
            .dispatch(UserEvent::LinkClicked("1".to_string()))
            .unwrap();

        let game_dir = controller.session().game_dir.clone().unwrap();
        assert_eq!(
            out[0],
            WindowCommand::PlayAudio(AudioRequest {
                path: game_dir.join("music/theme.ogg"),
                volume: 80,
            })
        );
        assert_eq!(out[1], WindowCommand::SetTimer(Duration::from_millis(250)));
        assert_eq!(out[2], WindowCommand::StopAudio);
        assert_eq!(controller.timer_interval(), Duration::from_millis(250));
    }

    #[test]
    fn engine_sees_the_audible_file_until_it_stops() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        controller.engine.pending = vec![EngineEvent::PlayFile {
            file: "music\\theme.ogg".to_string(),
            volume: 80,
        }];
        controller
            .dispatch(UserEvent::LinkClicked("exec:play 'music\\theme.ogg'".to_string()))
            .unwrap();
        let path = controller.session().game_dir.clone().unwrap().join("music/theme.ogg");

        controller.sync_audio(Some(&path));
        controller.dispatch(UserEvent::Tick).unwrap();
        assert_eq!(controller.engine.playing.as_deref(), Some("music\\theme.ogg"));

        controller.sync_audio(None);
        controller.dispatch(UserEvent::Tick).unwrap();
        assert_eq!(controller.engine.playing, None);
    }

    #[test]
    fn closing_another_file_keeps_the_track() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        controller.engine.pending = vec![
            EngineEvent::PlayFile {
                file: "Music\\theme.ogg".to_string(),
                volume: 50,
            },
            EngineEvent::CloseFile(Some("door.wav".to_string())),
        ];
        let out = controller.dispatch(UserEvent::Tick).unwrap();
        assert!(!out.contains(&WindowCommand::StopAudio));

        controller.engine.pending =
            vec![EngineEvent::CloseFile(Some("music/THEME.ogg".to_string()))];
        let out = controller.dispatch(UserEvent::Tick).unwrap();
        assert_eq!(out, vec![WindowCommand::StopAudio]);
    }

    #[test]
    fn closed_or_replaced_audio_is_not_reported_playing() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = loaded(dir.path());
        controller.engine.pending = vec![EngineEvent::PlayFile {
            file: "a.ogg".to_string(),
            volume: 50,
        }];
        controller.dispatch(UserEvent::Tick).unwrap();
        let a = controller.session().game_dir.clone().unwrap().join("a.ogg");

        // The player kept an older source, so the new track never started.
        controller.sync_audio(Some(&dir.path().join("other.ogg")));
        controller.dispatch(UserEvent::Tick).unwrap();
        assert_eq!(controller.engine.playing, None);

        controller.engine.pending = vec![
            EngineEvent::PlayFile {
                file: "a.ogg".to_string(),
                volume: 50,
            },
            EngineEvent::CloseFile(None),
        ];
        controller.dispatch(UserEvent::Tick).unwrap();
        controller.sync_audio(Some(&a));
        controller.dispatch(UserEvent::Tick).unwrap();
        assert_eq!(controller.engine.playing, None);
    }
}
