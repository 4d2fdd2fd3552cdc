#![forbid(unsafe_code)]

//! Key and modifier model shared by both decoders.
//!
//! # Design Notes
//!
//! - [`Modifiers`] is a bitflags set, so a combined value always decomposes
//!   back into its primitives.
//! - [`KeyCode`] is a small integer. Named keys live in bands (`1..=24` for
//!   the editing and function keys, `1065..=1072` for arrows and the xterm
//!   home/end variants, `-1` for escape) chosen so they never collide with the
//!   printable ASCII ordinals the dialect normalizer falls back to when a
//!   character was typed with a modifier but has no special name.
//! - [`KeyEvent`] is what the canonical classifier produces. It always carries
//!   a name; "no key" is expressed by the absence of the event itself.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held while a key was pressed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b000;
        /// Shift key.
        const SHIFT = 0b001;
        /// Alt/Meta key.
        const ALT   = 0b010;
        /// Control key.
        const CTRL  = 0b100;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Decoded key identity produced by the dialect normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(i32);

impl KeyCode {
    pub const ESCAPE: Self = Self(-1);
    pub const HOME: Self = Self(1);
    pub const INSERT: Self = Self(2);
    pub const DELETE: Self = Self(3);
    pub const END: Self = Self(4);
    pub const PAGEUP: Self = Self(5);
    pub const PAGEDOWN: Self = Self(6);
    /// Home as sent by rxvt-unicode and mrxvt.
    pub const HOME2: Self = Self(7);
    /// End as sent by rxvt-unicode and mrxvt.
    pub const END2: Self = Self(8);
    pub const TAB: Self = Self(10);

    pub const F1: Self = Self(11);
    pub const F2: Self = Self(12);
    pub const F3: Self = Self(13);
    pub const F4: Self = Self(14);
    pub const F5: Self = Self(15);
    pub const F6: Self = Self(17);
    pub const F7: Self = Self(18);
    pub const F8: Self = Self(19);
    pub const F9: Self = Self(20);
    pub const F10: Self = Self(21);
    pub const F11: Self = Self(23);
    pub const F12: Self = Self(24);

    pub const UP: Self = Self(1065);
    pub const DOWN: Self = Self(1066);
    pub const RIGHT: Self = Self(1067);
    pub const LEFT: Self = Self(1068);
    /// End as sent by xterm.
    pub const END3: Self = Self(1070);
    /// Home as sent by xterm.
    pub const HOME3: Self = Self(1072);

    const NAMED: [(&'static str, Self); 28] = [
        ("ESCAPE", Self::ESCAPE),
        ("HOME", Self::HOME),
        ("INSERT", Self::INSERT),
        ("DELETE", Self::DELETE),
        ("END", Self::END),
        ("PAGEUP", Self::PAGEUP),
        ("PAGEDOWN", Self::PAGEDOWN),
        ("HOME2", Self::HOME2),
        ("END2", Self::END2),
        ("TAB", Self::TAB),
        ("F1", Self::F1),
        ("F2", Self::F2),
        ("F3", Self::F3),
        ("F4", Self::F4),
        ("F5", Self::F5),
        ("F6", Self::F6),
        ("F7", Self::F7),
        ("F8", Self::F8),
        ("F9", Self::F9),
        ("F10", Self::F10),
        ("F11", Self::F11),
        ("F12", Self::F12),
        ("UP", Self::UP),
        ("DOWN", Self::DOWN),
        ("RIGHT", Self::RIGHT),
        ("LEFT", Self::LEFT),
        ("END3", Self::END3),
        ("HOME3", Self::HOME3),
    ];

    /// Wrap a raw code value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// The ASCII/Unicode fallback code for a character with no special name.
    #[must_use]
    pub const fn from_char(c: char) -> Self {
        Self(c as i32)
    }

    /// Code derived from a character ordinal shifted into one of the key bands.
    #[must_use]
    pub const fn from_ordinal(c: char, offset: i32) -> Self {
        Self(c as i32 + offset)
    }

    /// The raw integer value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Constant name of a named key (`"F3"`, `"HOME2"`, ...).
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, code)| *code == self)
            .map(|(name, _)| *name)
    }

    /// The character this code stands for, when it is a character fallback.
    #[must_use]
    pub fn as_char(self) -> Option<char> {
        if self.name().is_some() {
            return None;
        }
        u32::try_from(self.0).ok().and_then(char::from_u32)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name() {
            return f.write_str(name);
        }
        match self.as_char() {
            Some(c) if c.is_ascii_graphic() => write!(f, "{c}"),
            _ => write!(f, "#{}", self.0),
        }
    }
}

/// Error returned when a key code name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyCodeError {
    input: String,
}

impl fmt::Display for ParseKeyCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key code {:?}", self.input)
    }
}

impl std::error::Error for ParseKeyCodeError {}

impl FromStr for KeyCode {
    type Err = ParseKeyCodeError;

    /// Parse a constant name (`"PAGEUP"`, case-insensitive), a single
    /// character (`"A"`), or a `#`-prefixed raw value (`"#99"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseKeyCodeError {
            input: s.to_string(),
        };

        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Self::from_char(c));
        }
        if let Some(raw) = s.strip_prefix('#') {
            return raw.parse().map(Self).map_err(|_| err());
        }
        Self::NAMED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, code)| *code)
            .ok_or_else(err)
    }
}

/// Canonical key identifier produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    /// Carriage return.
    Return,
    /// Line feed.
    Enter,
    Tab,
    Backspace,
    Escape,
    Space,
    /// A letter or digit, always lowercase.
    Char(char),
    /// Function key `F1`..`F12`.
    F(u8),
    Up,
    Down,
    Right,
    Left,
    /// Keypad 5 with num lock off.
    Clear,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Return => "return",
            Self::Enter => "enter",
            Self::Tab => "tab",
            Self::Backspace => "backspace",
            Self::Escape => "escape",
            Self::Space => "space",
            Self::Char(c) => return write!(f, "{c}"),
            Self::F(n) => return write!(f, "f{n}"),
            Self::Up => "up",
            Self::Down => "down",
            Self::Right => "right",
            Self::Left => "left",
            Self::Clear => "clear",
            Self::Home => "home",
            Self::End => "end",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::PageUp => "pageup",
            Self::PageDown => "pagedown",
        };
        f.write_str(name)
    }
}

/// A key press recognized by the canonical classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// The chunk this event was decoded from, verbatim.
    pub sequence: String,
    /// Canonical key name.
    pub name: KeyName,
    pub ctrl: bool,
    /// Alt/Meta, including an escape prefix.
    pub meta: bool,
    pub shift: bool,
    /// Composed function-key code (`"[15~"`, `"OP"`, ...) when the chunk was
    /// matched by the function-key grammar.
    pub code: Option<String>,
}

impl KeyEvent {
    /// Create an unmodified event.
    #[must_use]
    pub fn new(sequence: impl Into<String>, name: KeyName) -> Self {
        Self {
            sequence: sequence.into(),
            name,
            ctrl: false,
            meta: false,
            shift: false,
            code: None,
        }
    }

    /// Set the modifier flags from a [`Modifiers`] set.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.ctrl = modifiers.contains(Modifiers::CTRL);
        self.meta = modifiers.contains(Modifiers::ALT);
        self.shift = modifiers.contains(Modifiers::SHIFT);
        self
    }

    /// The modifier flags as a [`Modifiers`] set.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::NONE;
        mods.set(Modifiers::CTRL, self.ctrl);
        mods.set(Modifiers::ALT, self.meta);
        mods.set(Modifiers::SHIFT, self.shift);
        mods
    }
}

/// Result of classifying one input chunk.
///
/// Both fields may be set at once: a one-character chunk such as `"a"` is
/// reported as a key and as a literal character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// The recognized key, if any.
    pub key: Option<KeyEvent>,
    /// The chunk itself when it is exactly one character long.
    pub ch: Option<char>,
}

impl Classification {
    /// True when neither a key nor a literal character was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.ch.is_none()
    }
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// What happened in a mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed (or held, when the report carries the motion bit).
    Press(MouseButton),
    /// Button released. Legacy encodings do not say which one.
    Release,
    WheelUp,
    WheelDown,
}

/// A decoded mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// Column, 0-indexed.
    pub x: u16,
    /// Row, 0-indexed.
    pub y: u16,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
    /// The pointer moved while the report was generated.
    pub motion: bool,
}
