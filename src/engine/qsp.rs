//! Binding to the native QSP 5.7 library.
//!
//! Strings cross the boundary as NUL-terminated `wchar_t` buffers. Callbacks
//! registered with the library push into a thread-local queue that
//! [`QspEngine::drain_events`] empties after each call.

use super::{Engine, EngineError, EngineEvent, GameState, ListItem, same_file_name};
use std::cell::RefCell;
use std::os::raw::{c_int, c_void};
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(windows)]
type QspChar = u16;
#[cfg(not(windows))]
type QspChar = u32;

type QspBool = c_int;

const QSP_TRUE: QspBool = 1;

// Callback kinds, in the order of the library's `QSP_CALL_*` enum.
const QSP_CALL_ISPLAYINGFILE: c_int = 1;
const QSP_CALL_PLAYFILE: c_int = 2;
const QSP_CALL_CLOSEFILE: c_int = 3;
const QSP_CALL_SHOWIMAGE: c_int = 4;
const QSP_CALL_SHOWMSGSTR: c_int = 9;
const QSP_CALL_SETTIMER: c_int = 11;

#[link(name = "qsp")]
unsafe extern "C" {
    fn QSPInit();
    fn QSPDeInit();
    fn QSPSetCallBack(kind: c_int, func: *const c_void);
    fn QSPLoadGameWorld(file: *const QspChar) -> QspBool;
    fn QSPRestartGame(is_refresh: QspBool) -> QspBool;
    fn QSPExecString(code: *const QspChar, is_refresh: QspBool) -> QspBool;
    fn QSPSetSelObjectIndex(index: c_int, is_refresh: QspBool) -> QspBool;
    fn QSPSetSelActionIndex(index: c_int, is_refresh: QspBool) -> QspBool;
    fn QSPExecuteSelActionCode(is_refresh: QspBool) -> QspBool;
    fn QSPSaveGame(file: *const QspChar, is_refresh: QspBool) -> QspBool;
    fn QSPOpenSavedGame(file: *const QspChar, is_refresh: QspBool) -> QspBool;
    fn QSPExecCounter(is_refresh: QspBool) -> QspBool;
    fn QSPIsHtml() -> QspBool;
    fn QSPGetMainDesc() -> *const QspChar;
    fn QSPGetVarsDesc() -> *const QspChar;
    fn QSPGetActionsCount() -> c_int;
    fn QSPGetActionData(index: c_int, image: *mut *mut QspChar, desc: *mut *mut QspChar);
    fn QSPGetObjectsCount() -> c_int;
    fn QSPGetObjectData(index: c_int, image: *mut *mut QspChar, desc: *mut *mut QspChar);
    fn QSPGetSelObjectIndex() -> c_int;
    fn QSPGetLastErrorData(
        error_num: *mut c_int,
        error_loc: *mut *mut QspChar,
        error_act_index: *mut c_int,
        error_line: *mut c_int,
    );
    fn QSPGetErrorDesc(error_num: c_int) -> *const QspChar;
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static EVENTS: RefCell<Vec<EngineEvent>> = const { RefCell::new(Vec::new()) };
    static PLAYING: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn push_event(event: EngineEvent) {
    EVENTS.with(|events| events.borrow_mut().push(event));
}

fn to_wide(s: &str) -> Vec<QspChar> {
    #[cfg(windows)]
    let mut wide: Vec<QspChar> = s.encode_utf16().collect();
    #[cfg(not(windows))]
    let mut wide: Vec<QspChar> = s.chars().map(|c| c as u32).collect();
    wide.push(0);
    wide
}

fn path_to_wide(path: &Path) -> Vec<QspChar> {
    to_wide(&path.to_string_lossy())
}

/// Copies a NUL-terminated engine string. Null yields `None`.
fn from_wide(ptr: *const QspChar) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0;
    // SAFETY: the engine hands out NUL-terminated buffers that stay valid
    // until its next mutating call, which cannot happen while we copy.
    let units = unsafe {
        while *ptr.add(len) != 0 {
            len += 1;
        }
        std::slice::from_raw_parts(ptr, len)
    };
    #[cfg(windows)]
    let text = String::from_utf16_lossy(units);
    #[cfg(not(windows))]
    let text = units
        .iter()
        .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    Some(text)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

extern "C" fn on_is_playing_file(file: *const QspChar) -> QspBool {
    let Some(file) = from_wide(file) else {
        return 0;
    };
    let playing = PLAYING.with(|playing| {
        playing
            .borrow()
            .as_deref()
            .is_some_and(|current| same_file_name(current, &file))
    });
    QspBool::from(playing)
}

// Play and close requests update PLAYING immediately. The window resets it
// from the real player before every call.
extern "C" fn on_play_file(file: *const QspChar, volume: c_int) {
    if let Some(file) = from_wide(file) {
        PLAYING.with(|playing| *playing.borrow_mut() = Some(file.clone()));
        push_event(EngineEvent::PlayFile { file, volume });
    }
}

extern "C" fn on_close_file(file: *const QspChar) {
    PLAYING.with(|playing| *playing.borrow_mut() = None);
    push_event(EngineEvent::CloseFile(non_empty(from_wide(file))));
}

extern "C" fn on_show_image(file: *const QspChar) {
    push_event(EngineEvent::ShowImage(non_empty(from_wide(file))));
}

extern "C" fn on_show_message(text: *const QspChar) {
    push_event(EngineEvent::ShowMessage(from_wide(text).unwrap_or_default()));
}

extern "C" fn on_set_timer(msecs: c_int) {
    push_event(EngineEvent::SetTimer(msecs.max(0) as u32));
}

/// Owner of the process-wide QSP instance. Dropping it de-initializes the
/// library.
pub struct QspEngine {
    // Keeps the handle on the thread that initialized the library.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl QspEngine {
    pub fn init() -> Result<Self, EngineError> {
        if INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyInitialized);
        }
        // SAFETY: guarded by INITIALIZED, so init runs once per live handle.
        unsafe {
            QSPInit();
            QSPSetCallBack(QSP_CALL_ISPLAYINGFILE, on_is_playing_file as *const c_void);
            QSPSetCallBack(QSP_CALL_PLAYFILE, on_play_file as *const c_void);
            QSPSetCallBack(QSP_CALL_CLOSEFILE, on_close_file as *const c_void);
            QSPSetCallBack(QSP_CALL_SHOWIMAGE, on_show_image as *const c_void);
            QSPSetCallBack(QSP_CALL_SHOWMSGSTR, on_show_message as *const c_void);
            QSPSetCallBack(QSP_CALL_SETTIMER, on_set_timer as *const c_void);
        }
        log::debug!("QSP init finished");
        Ok(QspEngine {
            _not_send: std::marker::PhantomData,
        })
    }

    fn check(&self, call: &'static str, ok: QspBool) -> Result<(), EngineError> {
        if ok != 0 {
            return Ok(());
        }
        Err(EngineError::call_failed(call, self.last_error()))
    }

    fn last_error(&self) -> String {
        let mut num: c_int = 0;
        let mut loc: *mut QspChar = ptr::null_mut();
        let mut act: c_int = 0;
        let mut line: c_int = 0;
        // SAFETY: out-pointers are valid locals.
        let desc = unsafe {
            QSPGetLastErrorData(&mut num, &mut loc, &mut act, &mut line);
            from_wide(QSPGetErrorDesc(num))
        };
        let desc = desc.unwrap_or_else(|| format!("error {num}"));
        match non_empty(from_wide(loc)) {
            Some(loc) => format!("{desc} (location {loc}, line {line})"),
            None => desc,
        }
    }

    fn list(
        count: c_int,
        get: unsafe extern "C" fn(c_int, *mut *mut QspChar, *mut *mut QspChar),
    ) -> Vec<ListItem> {
        (0..count.max(0))
            .map(|index| {
                let mut image: *mut QspChar = ptr::null_mut();
                let mut desc: *mut QspChar = ptr::null_mut();
                // SAFETY: index is within the count reported by the engine.
                unsafe { get(index, &mut image, &mut desc) };
                ListItem {
                    image: non_empty(from_wide(image)),
                    text: from_wide(desc).unwrap_or_default(),
                }
            })
            .collect()
    }
}

impl Drop for QspEngine {
    fn drop(&mut self) {
        // SAFETY: paired with QSPInit in `init`.
        unsafe { QSPDeInit() };
        INITIALIZED.store(false, Ordering::SeqCst);
        log::debug!("QSP deinit finished");
    }
}

impl Engine for QspEngine {
    fn load_world(&mut self, path: &Path) -> Result<(), EngineError> {
        let file = path_to_wide(path);
        let ok = unsafe { QSPLoadGameWorld(file.as_ptr()) };
        self.check("load game world", ok)
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        let ok = unsafe { QSPRestartGame(QSP_TRUE) };
        self.check("restart game", ok)
    }

    fn exec_string(&mut self, code: &str) -> Result<(), EngineError> {
        let code = to_wide(code);
        let ok = unsafe { QSPExecString(code.as_ptr(), QSP_TRUE) };
        self.check("exec string", ok)
    }

    fn set_selected_object(&mut self, index: i32) -> Result<(), EngineError> {
        let ok = unsafe { QSPSetSelObjectIndex(index, QSP_TRUE) };
        self.check("select object", ok)
    }

    fn set_selected_action(&mut self, index: i32) -> Result<(), EngineError> {
        let ok = unsafe { QSPSetSelActionIndex(index, QSP_TRUE) };
        self.check("select action", ok)
    }

    fn execute_selected_action(&mut self) -> Result<(), EngineError> {
        let ok = unsafe { QSPExecuteSelActionCode(QSP_TRUE) };
        self.check("execute action", ok)
    }

    fn save_game(&mut self, path: &Path) -> Result<(), EngineError> {
        let file = path_to_wide(path);
        let ok = unsafe { QSPSaveGame(file.as_ptr(), QSP_TRUE) };
        self.check("save game", ok)
    }

    fn open_saved_game(&mut self, path: &Path) -> Result<(), EngineError> {
        let file = path_to_wide(path);
        let ok = unsafe { QSPOpenSavedGame(file.as_ptr(), QSP_TRUE) };
        self.check("open saved game", ok)
    }

    fn exec_counter(&mut self) -> Result<(), EngineError> {
        let ok = unsafe { QSPExecCounter(QSP_TRUE) };
        self.check("exec counter", ok)
    }

    fn state(&self) -> GameState {
        // SAFETY: plain getters on the initialized library.
        unsafe {
            let selected = QSPGetSelObjectIndex();
            GameState {
                main_desc: from_wide(QSPGetMainDesc()).unwrap_or_default(),
                vars_desc: from_wide(QSPGetVarsDesc()).unwrap_or_default(),
                actions: Self::list(QSPGetActionsCount(), QSPGetActionData),
                objects: Self::list(QSPGetObjectsCount(), QSPGetObjectData),
                selected_object: usize::try_from(selected).ok(),
                use_html: QSPIsHtml() != 0,
            }
        }
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        EVENTS.with(|events| std::mem::take(&mut *events.borrow_mut()))
    }

    fn set_playing(&mut self, file: Option<&str>) {
        PLAYING.with(|playing| *playing.borrow_mut() = file.map(str::to_string));
    }
}
