//! Game-supplied fonts from the `fonts` directory next to the world file.

use eframe::egui::{self, FontData, FontDefinitions, FontFamily};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const FONTS_DIR: &str = "fonts";

/// Regular files in `<game_dir>/fonts`, largest first. Symlinks are skipped.
pub fn discover(game_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(game_dir.join(FONTS_DIR)) else {
        return Vec::new();
    };
    let mut fonts: Vec<(u64, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| Some((entry.metadata().ok()?.len(), entry.path())))
        .collect();
    fonts.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    fonts.into_iter().map(|(_, path)| path).collect()
}

/// Face 0 has to parse the same way the text renderer will parse it.
fn read_font(path: &Path) -> Option<Vec<u8>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            log::warn!("Could not read font {}: {err}", path.display());
            return None;
        }
    };
    if let Err(err) = skrifa::FontRef::from_index(&data, 0) {
        log::warn!("Skipping {}, not a font: {err}", path.display());
        return None;
    }
    Some(data)
}

/// Default definitions with the readable fonts in front of the proportional
/// family, in the order given. `None` when none of them is usable.
pub fn definitions(paths: &[PathBuf]) -> Option<FontDefinitions> {
    let mut defs = FontDefinitions::default();
    let mut installed = 0;
    for path in paths {
        let Some(data) = read_font(path) else {
            continue;
        };
        let name = format!("game:{}", path.display());
        defs.font_data
            .insert(name.clone(), Arc::new(FontData::from_owned(data)));
        defs.families
            .entry(FontFamily::Proportional)
            .or_default()
            .insert(installed, name);
        installed += 1;
    }
    log::debug!("{installed} of {} game fonts usable", paths.len());
    (installed > 0).then_some(defs)
}

pub fn install(ctx: &egui::Context, paths: &[PathBuf]) {
    if let Some(defs) = definitions(paths) {
        ctx.set_fonts(defs);
    }
}
