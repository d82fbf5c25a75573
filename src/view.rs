//! The game view: a small HTML presenter drawn with egui.
//!
//! Pages are parsed completely in [`Surface::set_html`], so a frame never
//! shows a half-loaded page. Anchors are not followed; their `href` is
//! handed back to the caller as a link directive.

use eframe::egui::{self, Color32, ColorImage, RichText, TextureHandle, Vec2};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BASE_FONT_SIZE: f32 = 16.0;
const HEADING_SCALE: f32 = 1.5;
const TEXT_COLOR: Color32 = Color32::from_gray(230);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Span {
    pub text: String,
    pub href: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub heading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(Span),
    Image { src: PathBuf, href: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub base: Option<PathBuf>,
    pub blocks: Vec<Block>,
}

#[derive(Default)]
struct ParseState {
    doc: Document,
    line: Vec<Inline>,
    href: Option<String>,
    bold: usize,
    italic: usize,
    heading: usize,
    skip: usize,
}

fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.html_attributes()
        .flatten()
        .find(|a| a.key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value).to_string();
            unescape(&raw).map(|v| v.to_string()).unwrap_or(raw)
        })
}

fn is_block(tag: &[u8]) -> bool {
    matches!(
        tag,
        b"p" | b"div" | b"li" | b"ul" | b"ol" | b"h1" | b"h2" | b"h3" | b"tr" | b"table"
            | b"center" | b"blockquote"
    )
}

impl ParseState {
    fn flush(&mut self, keep_empty: bool) {
        if self.line.is_empty() && !keep_empty {
            return;
        }
        let line = std::mem::take(&mut self.line);
        self.doc.blocks.push(Block::Paragraph(line));
    }

    fn push_text(&mut self, text: &str) {
        if self.skip > 0 || text.is_empty() {
            return;
        }
        let mut collapsed = String::with_capacity(text.len());
        let mut in_space = false;
        for c in text.chars() {
            if c.is_whitespace() && c != '\u{a0}' {
                if !in_space {
                    collapsed.push(' ');
                }
                in_space = true;
            } else {
                collapsed.push(c);
                in_space = false;
            }
        }
        if self.line.is_empty() {
            collapsed = collapsed.trim_start().to_string();
        }
        if collapsed.is_empty() {
            return;
        }
        let style = Span {
            text: String::new(),
            href: self.href.clone(),
            bold: self.bold > 0,
            italic: self.italic > 0,
            heading: self.heading > 0,
        };
        if let Some(Inline::Text(last)) = self.line.last_mut() {
            let same = Span {
                text: String::new(),
                ..last.clone()
            } == style;
            if same {
                last.text.push_str(&collapsed);
                return;
            }
        }
        self.line.push(Inline::Text(Span {
            text: collapsed,
            ..style
        }));
    }

    fn resolve(&self, src: &str) -> PathBuf {
        let src = src.strip_prefix("file://").unwrap_or(src).replace('\\', "/");
        let path = Path::new(&src);
        match &self.doc.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn open(&mut self, e: &BytesStart) {
        let tag = e.name().as_ref().to_ascii_lowercase();
        if self.skip > 0 {
            if !is_void(&tag) {
                self.skip += 1;
            }
            return;
        }
        match tag.as_slice() {
            b"style" | b"script" | b"title" => self.skip = 1,
            b"br" => self.flush(true),
            b"hr" => {
                self.flush(false);
                self.doc.blocks.push(Block::Rule);
            }
            b"img" => {
                if let Some(src) = attr(e, "src") {
                    let src = self.resolve(&src);
                    self.line.push(Inline::Image {
                        src,
                        href: self.href.clone(),
                    });
                }
            }
            b"base" => {
                if let Some(href) = attr(e, "href") {
                    let href = href.strip_prefix("file://").unwrap_or(&href).to_string();
                    self.doc.base = Some(PathBuf::from(href));
                }
            }
            b"a" => self.href = attr(e, "href"),
            b"b" | b"strong" => self.bold += 1,
            b"i" | b"em" => self.italic += 1,
            b"td" | b"th" => self.push_text(" "),
            t => {
                if is_block(t) {
                    self.flush(false);
                }
                if matches!(t, b"h1" | b"h2" | b"h3") {
                    self.heading += 1;
                }
            }
        }
    }

    fn close(&mut self, tag: &[u8]) {
        let tag = tag.to_ascii_lowercase();
        if self.skip > 0 {
            self.skip -= 1;
            return;
        }
        match tag.as_slice() {
            b"a" => self.href = None,
            b"b" | b"strong" => self.bold = self.bold.saturating_sub(1),
            b"i" | b"em" => self.italic = self.italic.saturating_sub(1),
            t => {
                if matches!(t, b"h1" | b"h2" | b"h3") {
                    self.heading = self.heading.saturating_sub(1);
                }
                if is_block(t) {
                    self.flush(false);
                }
            }
        }
    }
}

fn is_void(tag: &[u8]) -> bool {
    matches!(tag, b"br" | b"hr" | b"img" | b"base" | b"meta" | b"link")
}

/// A `<` that cannot open a tag, comment or declaration is text, as in
/// `1 < 2`.
fn escape_stray_lt(html: &str) -> Cow<'_, str> {
    let bytes = html.as_bytes();
    let stray = |i: usize| {
        bytes[i] == b'<'
            && !bytes
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, b'/' | b'!' | b'?'))
    };
    if !(0..bytes.len()).any(stray) {
        return Cow::Borrowed(html);
    }
    let mut out = String::with_capacity(html.len() + 8);
    for (i, c) in html.char_indices() {
        if stray(i) {
            out.push_str("&lt;");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let html = escape_stray_lt(html);
        let mut reader = Reader::from_str(&html);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = true;

        let mut state = ParseState::default();
        let mut last_error = None;
        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => state.open(e),
                Ok(Event::Empty(ref e)) if state.skip == 0 => {
                    let tag = e.name().as_ref().to_ascii_lowercase();
                    state.open(e);
                    // `<b/>`, `<style/>` and friends open nothing.
                    if !is_void(&tag) {
                        state.close(&tag);
                    }
                }
                Ok(Event::End(ref e)) => state.close(e.name().as_ref()),
                Ok(Event::Text(e)) => {
                    if let Ok(text) = e.decode() {
                        state.push_text(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Ok(text) = e.decode() {
                        state.push_text(&text);
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    if let Ok(Some(c)) = e.resolve_char_ref() {
                        state.push_text(c.encode_utf8(&mut [0; 4]));
                    } else if let Ok(name) = e.decode() {
                        match resolve_predefined_entity(&name) {
                            Some(s) => state.push_text(s),
                            None if name.eq_ignore_ascii_case("nbsp") => {
                                state.push_text("\u{a0}")
                            }
                            None => state.push_text(&format!("&{name};")),
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    let position = reader.error_position();
                    log::warn!("page markup error at {position}: {err}");
                    // Skip past the bad markup; stop if the reader is stuck.
                    if last_error == Some(position) {
                        break;
                    }
                    last_error = Some(position);
                }
                _ => {}
            }
        }
        state.flush(false);
        state.doc
    }
}

/// Lays out a page at `scale` in a `view_size` box, letterboxed on black
/// inside the available area.
#[derive(Default)]
pub struct Surface {
    html: String,
    document: Document,
    textures: HashMap<PathBuf, Option<TextureHandle>>,
}

fn load_texture(ctx: &egui::Context, path: &Path) -> Option<TextureHandle> {
    let img = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(err) => {
            log::warn!("Could not load image {}: {err}", path.display());
            return None;
        }
    };
    let size = [img.width() as usize, img.height() as usize];
    let color_img = ColorImage::from_rgba_unmultiplied(size, img.as_raw());
    Some(ctx.load_texture(
        path.to_string_lossy(),
        color_img,
        egui::TextureOptions::default(),
    ))
}

impl Surface {
    pub fn set_html(&mut self, html: String) {
        self.document = Document::parse(&html);
        self.html = html;
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Returns the `href` of a link clicked this frame.
    pub fn show(&mut self, ui: &mut egui::Ui, view_size: Vec2, scale: f32) -> Option<String> {
        let area = ui.max_rect();
        ui.painter().rect_filled(area, 0.0, Color32::BLACK);
        let view = egui::Rect::from_center_size(area.center(), view_size);

        let Surface {
            document, textures, ..
        } = self;
        let mut clicked = None;
        ui.scope_builder(egui::UiBuilder::new().max_rect(view), |ui| {
            egui::ScrollArea::vertical()
                .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for block in &document.blocks {
                        match block {
                            Block::Rule => {
                                ui.separator();
                            }
                            Block::Paragraph(line) if line.is_empty() => {
                                ui.add_space(BASE_FONT_SIZE * scale);
                            }
                            Block::Paragraph(line) => {
                                ui.horizontal_wrapped(|ui| {
                                    ui.spacing_mut().item_spacing.x = 0.0;
                                    for inline in line {
                                        if let Some(href) =
                                            show_inline(ui, inline, textures, scale)
                                        {
                                            clicked = Some(href);
                                        }
                                    }
                                });
                            }
                        }
                    }
                });
        });
        clicked
    }
}

fn show_inline(
    ui: &mut egui::Ui,
    inline: &Inline,
    textures: &mut HashMap<PathBuf, Option<TextureHandle>>,
    scale: f32,
) -> Option<String> {
    match inline {
        Inline::Text(span) => {
            let size = if span.heading {
                BASE_FONT_SIZE * HEADING_SCALE
            } else {
                BASE_FONT_SIZE
            };
            let mut text = RichText::new(&span.text).size(size * scale);
            if span.bold || span.heading {
                text = text.strong();
            }
            if span.italic {
                text = text.italics();
            }
            match &span.href {
                Some(href) => ui
                    .add(egui::Link::new(text))
                    .clicked()
                    .then(|| href.clone()),
                None => {
                    ui.label(text.color(TEXT_COLOR));
                    None
                }
            }
        }
        Inline::Image { src, href } => {
            let ctx = ui.ctx().clone();
            let tex = textures
                .entry(src.clone())
                .or_insert_with(|| load_texture(&ctx, src))
                .as_ref()?;
            let size = tex.size_vec2() * scale;
            let sense = if href.is_some() {
                egui::Sense::click()
            } else {
                egui::Sense::hover()
            };
            let response = ui.add(egui::Image::new((tex.id(), size)).sense(sense));
            href.as_ref().filter(|_| response.clicked()).cloned()
        }
    }
}
