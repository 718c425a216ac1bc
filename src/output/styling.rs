//! Terminal styles shared by the banner and the summaries.

use std::fmt::Display;

use console::{style, StyledObject};

fn paint(
    text: impl Display,
    apply: impl FnOnce(StyledObject<String>) -> StyledObject<String>,
) -> StyledObject<String> {
    apply(style(text.to_string()))
}

pub fn banner(text: impl Display) -> StyledObject<String> {
    paint(text, |s| s.magenta().bold())
}

/// Section titles.
pub fn heading(text: impl Display) -> StyledObject<String> {
    paint(text, StyledObject::bright)
}

/// Field names, URLs of the noteable and timestamps.
pub fn muted(text: impl Display) -> StyledObject<String> {
    paint(text, StyledObject::dim)
}

/// Counts and notices.
pub fn highlight(text: impl Display) -> StyledObject<String> {
    paint(text, |s| s.bright().yellow())
}

pub fn link(text: impl Display) -> StyledObject<String> {
    paint(text, StyledObject::cyan)
}

/// Green for the environment's latest deployment, red for a failed one and
/// yellow for anything else.
pub fn deployment_text(text: impl Display, status: &str, is_last: bool) -> StyledObject<String> {
    paint(text, |s| {
        let s = s.bright();
        if is_last {
            s.green()
        } else if status == "failed" {
            s.red()
        } else {
            s.yellow()
        }
    })
}
