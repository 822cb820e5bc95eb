//! Syntax highlighting for the typed C++ snippet.
//!
//! An ordered list of anchored patterns is tried against the remaining
//! input; the first match becomes one token. When nothing matches, a single
//! character passes through as plain text. The tokenizer is pure, so the same
//! prefix always yields the same tokens, and concatenating the token texts
//! reproduces the input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Token class, named after the CSS class the page styles it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Preprocessor,
    Comment,
    String,
    Char,
    Keyword,
    Type,
    Macro,
    Number,
    Operator,
    Plain,
}

impl TokenKind {
    /// CSS class name for this kind.
    pub fn css_class(&self) -> &'static str {
        match self {
            TokenKind::Preprocessor => "preprocessor",
            TokenKind::Comment => "comment",
            TokenKind::String => "string",
            TokenKind::Char => "char",
            TokenKind::Keyword => "keyword",
            TokenKind::Type => "type",
            TokenKind::Macro => "macro",
            TokenKind::Number => "number",
            TokenKind::Operator => "operator",
            TokenKind::Plain => "plain",
        }
    }
}

/// A highlighted slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

static RULES: Lazy<Vec<(Regex, TokenKind)>> = Lazy::new(|| {
    const PATTERNS: &[(&str, TokenKind)] = &[
        (
            r"^#(?:include|define|pragma|ifndef|ifdef|endif|if|else)\b",
            TokenKind::Preprocessor,
        ),
        (r"^//[^\n]*", TokenKind::Comment),
        (r"(?s)^/\*.*?\*/", TokenKind::Comment),
        (r#"^"(?:\\.|[^"\\])*""#, TokenKind::String),
        (r"^'(?:\\.|[^'\\])'", TokenKind::Char),
        (
            r"^(?:using|namespace|void|int|long|double|float|char|bool|return|if|else|for|while|do|switch|case|break|continue|const|auto|typedef|struct|class|public|private|protected|virtual|static|template|typename|nullptr|true|false)\b",
            TokenKind::Keyword,
        ),
        (
            r"^(?:ll|lli|ld|pii|vct|vpii|umap|mset|mst|string|vector|pair|map|set|queue|stack|priority_queue|deque|list|unordered_map|unordered_set|multiset|multimap)\b",
            TokenKind::Type,
        ),
        (r"^(?:pb|mp|endl|F|S|IOS)\b", TokenKind::Macro),
        (r"^\b\d+\.?\d*\b", TokenKind::Number),
        (r"^[+\-*/%=<>!&|^~?:;,.()\[\]{}]", TokenKind::Operator),
    ];

    PATTERNS
        .iter()
        .map(|(pattern, kind)| {
            // Patterns are compile-time constants covered by the tests below.
            let regex = Regex::new(pattern).unwrap_or_else(|e| panic!("bad pattern {pattern}: {e}"));
            (regex, *kind)
        })
        .collect()
});

/// Tokenizes `text`, first match wins.
pub fn highlight(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let matched = RULES.iter().find_map(|(regex, kind)| {
            regex
                .find(rest)
                .filter(|m| !m.as_str().is_empty())
                .map(|m| (*kind, m.end()))
        });

        let (kind, len) = match matched {
            Some(hit) => hit,
            None => {
                let first = rest.chars().next().map_or(1, char::len_utf8);
                (TokenKind::Plain, first)
            }
        };

        let (head, tail) = rest.split_at(len);
        tokens.push(Token { kind, text: head });
        rest = tail;
    }

    tokens
}

// =============================================================================
// TESTS
// =============================================================================
