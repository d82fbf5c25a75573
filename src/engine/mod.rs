//! Call contract of the external game engine.
//!
//! The engine is a process-wide interpreter with a C-style API: every call is
//! synchronous, may mutate global engine state and reports failure with a
//! boolean. [`Engine`] wraps that contract behind an explicit handle so that
//! lifecycle and reentrancy stay visible to the caller.

#[cfg(feature = "qsp")]
mod qsp;

#[cfg(feature = "qsp")]
pub use qsp::QspEngine;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{call} failed: {detail}")]
    CallFailed { call: &'static str, detail: String },
    #[error("engine is already initialized by another handle")]
    AlreadyInitialized,
    #[error("no game engine is linked into this build")]
    Unavailable,
}

impl EngineError {
    pub fn call_failed(call: &'static str, detail: impl Into<String>) -> Self {
        EngineError::CallFailed {
            call,
            detail: detail.into(),
        }
    }
}

/// One entry of the engine's action or object list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub image: Option<String>,
    pub text: String,
}

/// What the engine currently wants displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub main_desc: String,
    pub vars_desc: String,
    pub actions: Vec<ListItem>,
    pub objects: Vec<ListItem>,
    pub selected_object: Option<usize>,
    /// Descriptions are HTML fragments rather than plain text.
    pub use_html: bool,
}

/// Callbacks raised by the engine while one of its calls was running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ShowMessage(String),
    PlayFile { file: String, volume: i32 },
    /// `None` closes every playing file.
    CloseFile(Option<String>),
    /// `None` hides the current picture.
    ShowImage(Option<String>),
    SetTimer(u32),
}

pub trait Engine {
    fn load_world(&mut self, path: &Path) -> Result<(), EngineError>;
    fn restart(&mut self) -> Result<(), EngineError>;
    fn exec_string(&mut self, code: &str) -> Result<(), EngineError>;
    fn set_selected_object(&mut self, index: i32) -> Result<(), EngineError>;
    fn set_selected_action(&mut self, index: i32) -> Result<(), EngineError>;
    fn execute_selected_action(&mut self) -> Result<(), EngineError>;
    fn save_game(&mut self, path: &Path) -> Result<(), EngineError>;
    fn open_saved_game(&mut self, path: &Path) -> Result<(), EngineError>;
    fn exec_counter(&mut self) -> Result<(), EngineError>;
    fn state(&self) -> GameState;
    /// Takes the callbacks raised since the last drain, oldest first.
    fn drain_events(&mut self) -> Vec<EngineEvent>;
    /// The file that is audible right now, named the way the engine asked
    /// for it. Answers the engine's "is this file playing" callback.
    fn set_playing(&mut self, file: Option<&str>);
}

/// Whether two engine file names refer to the same file: separators and
/// ASCII case do not matter.
pub fn same_file_name(a: &str, b: &str) -> bool {
    let normalize = |s: &str| s.trim().replace('\\', "/");
    normalize(a).eq_ignore_ascii_case(&normalize(b))
}

/// Adapter used when the native library is not linked in.
///
/// Every call fails with [`EngineError::Unavailable`], which the window
/// reports the same way as any other engine failure.
#[derive(Debug, Default)]
pub struct Unlinked;

impl Engine for Unlinked {
    fn load_world(&mut self, _path: &Path) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn exec_string(&mut self, _code: &str) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn set_selected_object(&mut self, _index: i32) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn set_selected_action(&mut self, _index: i32) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn execute_selected_action(&mut self) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn save_game(&mut self, _path: &Path) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn open_saved_game(&mut self, _path: &Path) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn exec_counter(&mut self) -> Result<(), EngineError> {
        Err(EngineError::Unavailable)
    }

    fn state(&self) -> GameState {
        GameState::default()
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        Vec::new()
    }

    fn set_playing(&mut self, _file: Option<&str>) {}
}

#[cfg(feature = "qsp")]
pub type ActiveEngine = QspEngine;
#[cfg(not(feature = "qsp"))]
pub type ActiveEngine = Unlinked;

#[cfg(feature = "qsp")]
pub fn create() -> Result<ActiveEngine, EngineError> {
    QspEngine::init()
}

#[cfg(not(feature = "qsp"))]
pub fn create() -> Result<ActiveEngine, EngineError> {
    log::warn!("built without the qsp feature, games cannot be opened");
    Ok(Unlinked)
}
