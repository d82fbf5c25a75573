use regex::Regex;
use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const APP_NAME: &str = "fastqsp";
pub const GAME_CONFIG_FILE: &str = "config.xml";

/// Player preferences persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub last_game_dir: Option<String>,
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_game_dir: None,
            window_width: Some(800.0),
            window_height: Some(600.0),
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        confy::load(APP_NAME, None).unwrap_or_else(|err| {
            log::warn!("Could not read settings, using defaults: {err}");
            Settings::default()
        })
    }

    pub fn store(&self) {
        if let Err(err) = confy::store(APP_NAME, None, self) {
            log::warn!("Could not store settings: {err}");
        }
    }
}

static WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bwidth="(\d+)""#).unwrap());
static HEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bheight="(\d+)""#).unwrap());
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\btitle="([^"]+)""#).unwrap());

/// Fields a game declares on the first line of its `config.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<String>,
}

fn capture_dimension(re: &Regex, line: &str) -> Option<u32> {
    re.captures(line)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|&v| v > 0)
}

impl GameConfig {
    /// Each field is extracted on its own; anything missing or malformed is
    /// left as `None`.
    pub fn parse_line(line: &str) -> Self {
        Self {
            width: capture_dimension(&WIDTH_RE, line),
            height: capture_dimension(&HEIGHT_RE, line),
            title: TITLE_RE
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string()),
        }
    }

    /// Reads `config.xml` from `game_dir`. `None` if the file is absent or
    /// unreadable.
    pub fn load(game_dir: &Path) -> Option<Self> {
        let path = game_dir.join(GAME_CONFIG_FILE);
        let file = File::open(&path).ok()?;
        let mut line = String::new();
        if let Err(err) = BufReader::new(file).read_line(&mut line) {
            log::warn!("Could not read {}: {err}", path.display());
            return None;
        }
        Some(Self::parse_line(line.trim_end()))
    }
}

pub fn parent_dir(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
