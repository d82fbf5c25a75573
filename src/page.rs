//! Turns an engine snapshot into the markup shown by the game view.

use crate::engine::{GameState, ListItem};
use quick_xml::escape::escape;
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PageBuilder {
    game_dir: Option<PathBuf>,
    message: Option<String>,
    picture: Option<String>,
}

impl PageBuilder {
    pub fn set_game_dir(&mut self, dir: &Path) {
        self.game_dir = Some(dir.to_path_buf());
        self.message = None;
        self.picture = None;
    }

    pub fn show_message(&mut self, text: String) {
        self.message = Some(text);
    }

    pub fn hide_message(&mut self) {
        self.message = None;
    }

    pub fn show_picture(&mut self, file: Option<String>) {
        self.picture = file.map(|f| f.replace('\\', "/"));
    }

    pub fn html(&self, state: &GameState) -> String {
        let mut out = String::from("<html><head>");
        if let Some(dir) = &self.game_dir {
            let mut base = dir.to_string_lossy().replace('\\', "/");
            if !base.ends_with('/') {
                base.push('/');
            }
            let _ = write!(out, "<base href=\"{}\"/>", escape(&base));
        }
        out.push_str("</head><body>");

        if let Some(picture) = &self.picture {
            let _ = write!(
                out,
                "<div class=\"picture\"><img src=\"{}\"/></div>",
                escape(picture)
            );
        }
        out.push_str("<div class=\"main\">");
        push_desc(&mut out, &state.main_desc, state.use_html);
        out.push_str("</div>");

        if !state.vars_desc.is_empty() {
            out.push_str("<hr/><div class=\"vars\">");
            push_desc(&mut out, &state.vars_desc, state.use_html);
            out.push_str("</div>");
        }

        if !state.actions.is_empty() {
            out.push_str("<ul class=\"actions\">");
            for (i, action) in state.actions.iter().enumerate() {
                push_item(&mut out, &(i + 1).to_string(), action, false, state.use_html);
            }
            out.push_str("</ul>");
        }

        if !state.objects.is_empty() {
            out.push_str("<ul class=\"objects\">");
            for (i, object) in state.objects.iter().enumerate() {
                let selected = state.selected_object == Some(i);
                push_item(&mut out, &format!("obj:{i}"), object, selected, state.use_html);
            }
            out.push_str("</ul>");
        }

        if let Some(message) = &self.message {
            out.push_str("<div class=\"msg\">");
            push_desc(&mut out, message, state.use_html);
            out.push_str("<br/><a href=\"msgclose\">OK</a></div>");
        }

        out.push_str("</body></html>");
        out
    }
}

fn push_desc(out: &mut String, text: &str, use_html: bool) {
    if use_html {
        out.push_str(text);
        return;
    }
    let text = text.replace("\r\n", "\n");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br/>");
        }
        out.push_str(&escape(line));
    }
}

fn push_item(out: &mut String, href: &str, item: &ListItem, selected: bool, use_html: bool) {
    let _ = write!(out, "<li><a href=\"{}\">", escape(href));
    if let Some(image) = &item.image {
        let _ = write!(out, "<img src=\"{}\"/>", escape(&image.replace('\\', "/")));
    }
    if selected {
        out.push_str("<b>");
    }
    push_desc(out, &item.text, use_html);
    if selected {
        out.push_str("</b>");
    }
    out.push_str("</a></li>");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> ListItem {
        ListItem {
            image: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn plain_text_is_escaped_and_line_broken() {
        let builder = PageBuilder::default();
        let state = GameState {
            main_desc: "a < b\r\nnext".to_string(),
            ..GameState::default()
        };
        let html = builder.html(&state);
        assert!(html.contains("<div class=\"main\">a &lt; b<br/>next</div>"));
    }

    #[test]
    fn html_descriptions_pass_through() {
        let builder = PageBuilder::default();
        let state = GameState {
            main_desc: "<b>bold</b>".to_string(),
            use_html: true,
            ..GameState::default()
        };
        assert!(builder.html(&state).contains("<div class=\"main\"><b>bold</b></div>"));
    }

    #[test]
    fn actions_are_numbered_from_one_and_objects_from_zero() {
        let builder = PageBuilder::default();
        let state = GameState {
            actions: vec![item("Go north"), item("Wait")],
            objects: vec![item("Lamp"), item("Key")],
            selected_object: Some(1),
            ..GameState::default()
        };
        let html = builder.html(&state);
        assert!(html.contains("<a href=\"1\">Go north</a>"));
        assert!(html.contains("<a href=\"2\">Wait</a>"));
        assert!(html.contains("<a href=\"obj:0\">Lamp</a>"));
        assert!(html.contains("<a href=\"obj:1\"><b>Key</b></a>"));
    }

    #[test]
    fn message_box_until_hidden() {
        let mut builder = PageBuilder::default();
        builder.show_message("You win".to_string());
        let state = GameState::default();
        assert!(builder.html(&state).contains("<a href=\"msgclose\">"));
        builder.hide_message();
        assert!(!builder.html(&state).contains("msgclose"));
    }

    #[test]
    fn game_dir_becomes_base() {
        let mut builder = PageBuilder::default();
        builder.set_game_dir(Path::new("/games/demo"));
        builder.show_picture(Some("img\\intro.png".to_string()));
        let html = builder.html(&GameState::default());
        assert!(html.contains("<base href=\"/games/demo/\"/>"));
        assert!(html.contains("<img src=\"img/intro.png\"/>"));
    }

    #[test]
    fn html_is_a_pure_query() {
        let mut builder = PageBuilder::default();
        builder.show_message("hello".to_string());
        let state = GameState::default();
        assert_eq!(builder.html(&state), builder.html(&state));
    }
}
