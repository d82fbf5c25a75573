//! Commands embedded in the anchors of a game page.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDirective {
    /// `exec:<code>` runs a raw script string.
    Execute(String),
    /// `obj:<n>` selects an object.
    SelectObject(i32),
    /// `msgclose` dismisses the message box.
    CloseMessage,
    /// A bare `<n>` selects and runs action `n - 1`.
    SelectAction(i32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("unknown link format: {0:?}")]
    UnknownFormat(String),
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

impl LinkDirective {
    pub fn parse(link: &str) -> Result<Self, LinkError> {
        let unknown = || LinkError::UnknownFormat(link.to_string());
        if let Some(code) = strip_prefix_ignore_case(link, "exec:") {
            return Ok(LinkDirective::Execute(code.trim().replace("%22", "\"")));
        }
        if let Some(index) = strip_prefix_ignore_case(link, "obj:") {
            let index = index.trim().parse().map_err(|_| unknown())?;
            return Ok(LinkDirective::SelectObject(index));
        }
        if link.trim().eq_ignore_ascii_case("msgclose") {
            return Ok(LinkDirective::CloseMessage);
        }
        let number: i32 = link.trim().parse().map_err(|_| unknown())?;
        let index = number.checked_sub(1).ok_or_else(unknown)?;
        Ok(LinkDirective::SelectAction(index))
    }
}
