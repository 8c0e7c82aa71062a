use std::fmt;
use std::str::FromStr;

use actions::Chord;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Escape,
    /// Any other named key (`enter`, `f5`, ...). Never part of the grammar.
    Named(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub platform: bool,
}

impl Modifiers {
    /// Modifiers that hand the key to the host untouched.
    pub fn has_command_modifier(&self) -> bool {
        self.control || self.alt || self.platform
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty key")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
}

impl KeyEvent {
    pub fn char(c: char) -> Self {
        Self {
            key: Key::Char(c),
            modifiers: Modifiers::default(),
        }
    }

    pub fn shifted(c: char) -> Self {
        Self {
            key: Key::Char(c),
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::default()
            },
        }
    }

    pub fn escape() -> Self {
        Self {
            key: Key::Escape,
            modifiers: Modifiers::default(),
        }
    }

    pub fn is_escape(&self) -> bool {
        self.key == Key::Escape
    }

    /// The grammar-level chord, if this event can take part in a sequence.
    pub fn chord(&self) -> Option<Chord> {
        if self.modifiers.has_command_modifier() {
            return None;
        }
        match self.key {
            Key::Char(c) => Some(Chord::from_typed(c, self.modifiers.shift)),
            _ => None,
        }
    }
}

fn apply_modifier(modifiers: &mut Modifiers, name: &str) -> bool {
    match name.to_ascii_lowercase().as_str() {
        "shift" => modifiers.shift = true,
        "ctrl" | "control" => modifiers.control = true,
        "alt" | "option" => modifiers.alt = true,
        "cmd" | "meta" | "super" | "platform" => modifiers.platform = true,
        _ => return false,
    }
    true
}

impl FromStr for KeyEvent {
    type Err = KeyParseError;

    /// `u`, `U`, `shift-u`, `ctrl-c`, `escape`, `space`, `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut modifiers = Modifiers::default();
        while let Some((name, tail)) = rest.split_once('-') {
            if name.is_empty() || tail.is_empty() {
                break;
            }
            if !apply_modifier(&mut modifiers, name) {
                return Err(KeyParseError::UnknownModifier(name.to_string()));
            }
            rest = tail;
        }

        let mut chars = rest.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Char(c),
            _ => match rest.to_ascii_lowercase().as_str() {
                "escape" | "esc" => Key::Escape,
                "space" => Key::Char(' '),
                named => Key::Named(named.to_string()),
            },
        };
        Ok(Self { key, modifiers })
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (set, name) in [
            (m.control, "ctrl-"),
            (m.alt, "alt-"),
            (m.platform, "cmd-"),
            (m.shift, "shift-"),
        ] {
            if set {
                f.write_str(name)?;
            }
        }
        match &self.key {
            Key::Char(c) => write!(f, "{c}"),
            Key::Escape => f.write_str("escape"),
            Key::Named(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("u", KeyEvent::char('u'))]
    #[test_case("shift-u", KeyEvent::shifted('u'))]
    #[test_case("escape", KeyEvent::escape())]
    #[test_case("Esc", KeyEvent::escape())]
    #[test_case("-", KeyEvent::char('-'))]
    #[test_case("space", KeyEvent::char(' '))]
    fn parses_keys(text: &str, expected: KeyEvent) {
        assert_eq!(text.parse::<KeyEvent>(), Ok(expected));
    }

    #[test]
    fn parses_command_modifiers() {
        let event: KeyEvent = "ctrl-shift-c".parse().unwrap();
        assert!(event.modifiers.control);
        assert!(event.modifiers.shift);
        assert_eq!(event.key, Key::Char('c'));
        assert_eq!(event.chord(), None);
        assert_eq!(event.to_string(), "ctrl-shift-c");
    }

    #[test]
    fn rejects_unknown_modifier() {
        assert_eq!(
            "hyper-x".parse::<KeyEvent>(),
            Err(KeyParseError::UnknownModifier("hyper".into()))
        );
        assert_eq!("  ".parse::<KeyEvent>(), Err(KeyParseError::Empty));
    }

    #[test]
    fn uppercase_char_becomes_shifted_chord() {
        assert_eq!(KeyEvent::char('U').chord(), Some(Chord::shifted('u')));
        assert_eq!(KeyEvent::shifted('u').chord(), Some(Chord::shifted('u')));
        assert_eq!(KeyEvent::escape().chord(), None);
    }

    #[test]
    fn named_keys_have_no_chord() {
        let event: KeyEvent = "enter".parse().unwrap();
        assert_eq!(event.key, Key::Named("enter".into()));
        assert_eq!(event.chord(), None);
    }
}
