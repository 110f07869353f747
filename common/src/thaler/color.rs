use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown peg color {0:?}")]
pub struct ParseColorError(pub String);

// A peg's color is also its identity, so there is exactly one peg per variant.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "O")]
    Orange,
    #[serde(rename = "Y")]
    Yellow,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "P")]
    Pink,
    #[serde(rename = "U")]
    Purple,
}

pub const COLOR_COUNT: usize = 7;

impl Color {
    pub const ALL: [Color; COLOR_COUNT] = [
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Pink,
        Color::Purple,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Orange => 'O',
            Color::Yellow => 'Y',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Pink => 'P',
            Color::Purple => 'U',
        }
    }

    // ANSI foreground escape used by the debug board renderer
    pub(crate) fn ansi_code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Orange => "\x1b[38;5;214m",
            Color::Yellow => "\x1b[33m",
            Color::Green => "\x1b[32m",
            Color::Blue => "\x1b[34m",
            Color::Pink => "\x1b[38;5;213m",
            Color::Purple => "\x1b[37m",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Pink => "pink",
            Color::Purple => "purple",
        };
        write!(f, "{}", name)
    }
}

// Accepts either the single-letter wire code or the full color name
impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Color::ALL
            .into_iter()
            .find(|c| {
                (trimmed.len() == 1 && trimmed.starts_with(c.letter()))
                    || trimmed.eq_ignore_ascii_case(&c.to_string())
            })
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}
