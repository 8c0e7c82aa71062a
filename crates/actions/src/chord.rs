//! Single-key chords as written in config and shown in prompts.

use std::fmt;
use std::str::FromStr;

/// One printable key, optionally shifted. Other modifiers never reach the
/// binding tables; keys carrying them pass straight through to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub key: char,
    pub shift: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordError {
    #[error("empty key chord")]
    Empty,
    #[error("unsupported modifier `{0}`")]
    UnsupportedModifier(String),
    #[error("`{0}` is not a single key")]
    NotSingleKey(String),
}

impl Chord {
    pub const fn plain(key: char) -> Self {
        Self { key, shift: false }
    }

    pub const fn shifted(key: char) -> Self {
        Self { key, shift: true }
    }

    /// Normalize a typed character: an uppercase letter is the shifted
    /// lowercase one.
    pub fn from_typed(c: char, shift: bool) -> Self {
        if c.is_uppercase() {
            Self::shifted(c.to_ascii_lowercase())
        } else {
            Self { key: c, shift }
        }
    }
}

impl FromStr for Chord {
    type Err = ChordError;

    /// Accepts `u`, `U`, `shift-u` and `shift+u`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ChordError::Empty);
        }

        let mut shift = false;
        let mut key_part = s;
        if let Some((modifier, rest)) = s.split_once(['-', '+']) {
            if rest.is_empty() {
                // A bare "-" or "+" key.
                key_part = s;
            } else {
                match modifier.to_ascii_lowercase().as_str() {
                    "shift" => shift = true,
                    other => return Err(ChordError::UnsupportedModifier(other.to_string())),
                }
                key_part = rest;
            }
        }

        let mut chars = key_part.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self::from_typed(c, shift)),
            _ => Err(ChordError::NotSingleKey(key_part.to_string())),
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shift {
            write!(f, "shift-{}", self.key)
        } else {
            write!(f, "{}", self.key)
        }
    }
}
