//! Terminal rendering for the intro demo.

use colored::{ColoredString, Colorize};
use scpc_intro::loader::typing::char_prefix;
use scpc_intro::{highlight, LoaderSnapshot, LoaderState, Token, TokenKind};

const CLEAR: &str = "\x1B[2J\x1B[H";

fn paint(token: &Token<'_>) -> ColoredString {
    match token.kind {
        TokenKind::Preprocessor => token.text.magenta(),
        TokenKind::Comment => token.text.bright_black().italic(),
        TokenKind::String | TokenKind::Char => token.text.green(),
        TokenKind::Keyword => token.text.blue().bold(),
        TokenKind::Type => token.text.cyan(),
        TokenKind::Macro => token.text.yellow(),
        TokenKind::Number => token.text.bright_red(),
        TokenKind::Operator => token.text.white(),
        TokenKind::Plain => token.text.normal(),
    }
}

/// Full-screen frame for one snapshot.
pub fn frame(snapshot: &LoaderSnapshot, snippet: &str) -> String {
    let visible = char_prefix(snippet, snapshot.progress.displayed_length);
    let mut out = String::from(CLEAR);

    for token in highlight(visible) {
        out.push_str(&paint(&token).to_string());
    }
    if snapshot.state == LoaderState::Typing && !snapshot.progress.is_complete() {
        out.push_str(&"▌".bright_white().to_string());
    }
    out.push_str("\n\n");
    out.push_str(&status_line(snapshot));
    out.push('\n');
    out
}

fn status_line(snapshot: &LoaderSnapshot) -> String {
    let state = match snapshot.state {
        LoaderState::Typing => "typing".yellow(),
        LoaderState::Holding => "holding".cyan(),
        LoaderState::Animating => "animating".magenta(),
        LoaderState::Done => "done".green().bold(),
    };
    let ready = if snapshot.ready {
        "ready".green()
    } else {
        "loading".bright_black()
    };
    let visitor = if snapshot.seen_before {
        "returning"
    } else {
        "first visit"
    };
    format!(
        "[{:>5} ms] {} | {} | {}/{} chars | {}",
        snapshot.elapsed_ms,
        state,
        ready,
        snapshot.progress.displayed_length,
        snapshot.progress.total_length,
        visitor.dimmed()
    )
}
