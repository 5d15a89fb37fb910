//! Tile notation parsing, e.g. `"1 2 × 5 = 60"` or `"3+4=7"`.
//!
//! A digit run is one tile, so consecutive light tiles must be separated by
//! whitespace or commas.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;

use super::kinds::{ConcreteToken, DisplayToken};
use crate::error::{PuzzleError, Result};

static TILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+/-|\+/−|×/÷|\*/÷|x/÷|±|\d+|[+\-−×xX*÷/=?_]").expect("tile pattern is valid")
});

/// Split text into display tokens
pub fn parse_display_tokens(text: &str) -> Result<Vec<DisplayToken>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for m in TILE_PATTERN.find_iter(text) {
        check_separator(&text[cursor..m.start()])?;
        tokens.push(m.as_str().parse()?);
        cursor = m.end();
    }
    check_separator(&text[cursor..])?;

    Ok(tokens)
}

/// Split text into concrete tokens; choice and wildcard symbols are rejected
pub fn parse_concrete_tokens(text: &str) -> Result<Vec<ConcreteToken>> {
    parse_display_tokens(text)?
        .into_iter()
        .map(|token| {
            token.resolved().ok_or_else(|| {
                PuzzleError::InvalidToken(format!("{} must be written as a concrete symbol", token))
            })
        })
        .collect()
}

/// Render tokens in tile notation, one space between tiles
pub fn format_tokens<T: Display>(tokens: &[T]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_separator(gap: &str) -> Result<()> {
    if gap.chars().all(|c| c.is_whitespace() || c == ',') {
        Ok(())
    } else {
        Err(PuzzleError::InvalidToken(gap.trim().to_string()))
    }
}
