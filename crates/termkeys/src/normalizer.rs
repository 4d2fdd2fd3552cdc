#![forbid(unsafe_code)]

//! Dialect-aware escape normalizer.
//!
//! A [`Normalizer`] maps caret-notation escape text (`^[[1;5A`) plus a
//! [`Dialect`] to a `(Modifiers, KeyCode)` pair. It owns one piece of state,
//! the pending buffer, which carries an incomplete sequence from one call to
//! the next so that a key split across two reads still decodes.
//!
//! # Algorithm
//!
//! Each call:
//!
//! 1. Prepends the pending buffer to the chunk and clears it.
//! 2. Cuts the buffer at the first interior `^` (index 3 or later, never the
//!    last character) that starts a second sequence: either `^[`, or a `^`
//!    right after a sequence terminator (a letter or `~`). The part after the
//!    cut becomes the pending buffer for the next call.
//! 3. Classifies the head by its prefix shape (`^X`, `^[[`, `^[O`, `^[^`,
//!    `^[x`) and, for CSI sequences, by the shape of the parameter tail.
//!
//! A head that is a strict prefix of some known sequence is kept pending
//! (bounded by [`MAX_PENDING_LEN`]). A head that is complete but matches
//! nothing is dropped.
//!
//! ```
//! use termkeys::{Dialect, KeyCode, Modifiers, Normalizer, Outcome};
//!
//! let mut n = Normalizer::new();
//! assert_eq!(n.feed("^[[1;", Dialect::Xterm), Outcome::Pending);
//! assert_eq!(
//!     n.feed("8B", Dialect::Xterm),
//!     Outcome::Key(Modifiers::all(), KeyCode::DOWN)
//! );
//! ```

use crate::caret;
use crate::dialect::Dialect;
use crate::event::{KeyCode, Modifiers};

/// Longest sequence (in characters) kept in the pending buffer.
///
/// Every legitimate key sequence is far shorter; anything longer is treated
/// as garbage and flushed.
pub const MAX_PENDING_LEN: usize = 32;

/// Result of one [`Normalizer::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A key was recognized.
    Key(Modifiers, KeyCode),
    /// The input is an incomplete sequence; it is buffered for the next call.
    Pending,
    /// The input matches nothing and was discarded.
    NoMatch,
}

impl Outcome {
    /// The recognized key, if any.
    #[must_use]
    pub const fn key(self) -> Option<(Modifiers, KeyCode)> {
        match self {
            Self::Key(mods, code) => Some((mods, code)),
            Self::Pending | Self::NoMatch => None,
        }
    }
}

/// Stateful decoder for one input stream.
///
/// Use one instance per stream and feed it chunks in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    pending: String,
}

impl Normalizer {
    /// Create a normalizer with an empty pending buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an incomplete sequence is waiting for more input.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The buffered incomplete sequence.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Discard any buffered input.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Decode one caret-notation chunk.
    pub fn feed(&mut self, chunk: &str, dialect: Dialect) -> Outcome {
        let span = crate::debug_span!("termkeys.feed", dialect = %dialect);
        let _guard = span.enter();

        let mut buf: Vec<char> = std::mem::take(&mut self.pending)
            .chars()
            .chain(chunk.chars())
            .collect();

        let tail = split_point(&buf).map(|at| buf.split_off(at));
        let outcome = dispatch(&buf, dialect);

        match (outcome, tail) {
            (Outcome::Pending, Some(tail)) => {
                crate::debug!(
                    stale = %text(&buf),
                    dialect = %dialect,
                    "dropping incomplete sequence interrupted by a new escape"
                );
                self.keep(tail)
            }
            (Outcome::Pending, None) => self.keep(buf),
            (resolved, tail) => {
                if resolved == Outcome::NoMatch {
                    crate::debug!(
                        sequence = %text(&buf),
                        dialect = %dialect,
                        "unrecognized escape sequence"
                    );
                }
                if let Some(tail) = tail {
                    // The outcome for this call is already decided.
                    let _ = self.keep(tail);
                }
                resolved
            }
        }
    }

    /// Decode one caret-notation chunk, returning only a recognized key.
    pub fn normalize(&mut self, chunk: &str, dialect: Dialect) -> Option<(Modifiers, KeyCode)> {
        self.feed(chunk, dialect).key()
    }

    /// Decode raw terminal input (`"\x1b[A"`) by rendering it in caret
    /// notation first.
    ///
    /// In raw input a literal `^` is only an rxvt terminator, which always
    /// follows a parameter digit. Any other `^` is typed text that would read
    /// as caret notation once encoded, so such chunks match nothing and leave
    /// the pending buffer alone.
    pub fn normalize_raw(
        &mut self,
        chunk: &str,
        dialect: Dialect,
    ) -> Option<(Modifiers, KeyCode)> {
        if self.has_stray_caret(chunk) {
            crate::debug!(
                sequence = %caret::encode(chunk),
                dialect = %dialect,
                "raw input contains a literal caret"
            );
            return None;
        }
        self.normalize(&caret::encode(chunk), dialect)
    }

    fn has_stray_caret(&self, chunk: &str) -> bool {
        let mut prev = self.pending.chars().last();
        chunk.chars().any(|c| {
            let stray = c == '^' && !prev.is_some_and(|p| p.is_ascii_digit());
            prev = Some(c);
            stray
        })
    }

    fn keep(&mut self, chars: Vec<char>) -> Outcome {
        if chars.len() > MAX_PENDING_LEN {
            crate::warn!(
                len = chars.len(),
                max = MAX_PENDING_LEN,
                "pending escape buffer overflow; flushing"
            );
            return Outcome::NoMatch;
        }
        self.pending = chars.into_iter().collect();
        crate::trace!(pending = %self.pending, "deferring sequence");
        Outcome::Pending
    }
}

fn text(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Index of a second sequence start inside the buffer.
///
/// A `^` counts when it opens `^[`, or when it follows a terminator, as in
/// `^[[1;5A^B`. Trailing `^` (the rxvt ctrl terminator) is never a cut.
fn split_point(buf: &[char]) -> Option<usize> {
    buf.windows(3)
        .skip(2)
        .position(|w| match w {
            [_, '^', '['] => true,
            [prev, '^', _] => prev.is_ascii_alphabetic() || *prev == '~',
            _ => false,
        })
        .map(|at| at + 3)
}

/// Prefix classes of a caret-notation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape<'a> {
    /// Does not begin with `^`.
    NotEscape,
    /// A strict prefix of every longer shape (`^`, `^[`, `^[O`).
    Incomplete,
    /// `^X`: ctrl shorthand.
    Control(char),
    /// `^[[...`: CSI.
    Csi(&'a [char]),
    /// `^[Ox`: SS3.
    Ss3(char),
    /// `^[^...`: a second escape marker.
    DoubleEscape(&'a [char]),
    /// `^[x`: alt shorthand.
    Alt(char),
}

fn shape(seq: &[char]) -> Shape<'_> {
    match seq {
        ['^'] | ['^', '['] | ['^', '[', 'O'] => Shape::Incomplete,
        ['^', c, ..] if *c != '[' => Shape::Control(*c),
        ['^', '[', '[', ..] => Shape::Csi(seq),
        ['^', '[', 'O', c, ..] => Shape::Ss3(*c),
        ['^', '[', '^', ..] => Shape::DoubleEscape(seq),
        ['^', '[', c, ..] => Shape::Alt(*c),
        _ => Shape::NotEscape,
    }
}

fn dispatch(seq: &[char], dialect: Dialect) -> Outcome {
    let resolved = match shape(seq) {
        Shape::NotEscape => None,
        Shape::Incomplete => return Outcome::Pending,
        Shape::Control(c) => Some((Modifiers::CTRL, KeyCode::from_char(c))),
        Shape::Csi(seq) => {
            if ends_incomplete(seq, &['[', ';']) {
                return Outcome::Pending;
            }
            csi_tail(seq, dialect)
        }
        // xterm/gnome F1-F4 below 'Z', urxvt ctrl+arrow above it
        Shape::Ss3(c) if c < 'Z' => Some((Modifiers::NONE, KeyCode::from_ordinal(c, -69))),
        Shape::Ss3(c) => Some((Modifiers::CTRL, KeyCode::from_ordinal(c, 968))),
        Shape::DoubleEscape(seq) => return double_escape(seq),
        Shape::Alt(c) if c.is_ascii_uppercase() => {
            Some((Modifiers::SHIFT | Modifiers::ALT, KeyCode::from_char(c)))
        }
        Shape::Alt(c) => Some((Modifiers::ALT, KeyCode::from_char(c))),
    };
    resolved.map_or(Outcome::NoMatch, |(mods, code)| Outcome::Key(mods, code))
}

/// True when the last character is a digit or one of `extra`, i.e. more
/// parameter bytes may follow.
fn ends_incomplete(seq: &[char], extra: &[char]) -> bool {
    seq.last()
        .is_some_and(|c| c.is_ascii_digit() || extra.contains(c))
}

/// `^[^...`: linux ctrl+alt shorthand, or an escape-prefixed sequence (alt).
fn double_escape(seq: &[char]) -> Outcome {
    let Some(&fourth) = seq.get(3) else {
        return Outcome::Pending;
    };
    if fourth != '[' {
        return Outcome::Key(Modifiers::CTRL | Modifiers::ALT, KeyCode::from_char(fourth));
    }
    match seq {
        [_, _, _, _] => return Outcome::Key(Modifiers::ALT, KeyCode::ESCAPE),
        [_, _, _, _, '[' | 'O'] => return Outcome::Pending,
        _ if ends_incomplete(seq, &[';']) => return Outcome::Pending,
        _ => {}
    }

    let Some((&last, body)) = seq.split_last() else {
        return Outcome::NoMatch;
    };
    let ctrl_alt = Modifiers::CTRL | Modifiers::ALT;
    let resolved = match last {
        '^' => number(window(body, 5, 1)).map(|v| (ctrl_alt, KeyCode::new(v))),
        '@' => number(window(body, 5, 1)).map(|v| (Modifiers::all(), KeyCode::new(v))),
        'a'..='z' => {
            let mods = if body.get(4) == Some(&'O') {
                ctrl_alt
            } else {
                Modifiers::all()
            };
            Some((mods, KeyCode::from_ordinal(last, 968)))
        }
        '~' => number(window(body, 5, 2)).map(|v| (Modifiers::ALT, KeyCode::new(v))),
        // mrxvt sends alt+F3 without the leading parameter
        'R' => Some((Modifiers::ALT, KeyCode::F3)),
        _ if body.len() > 5 => Some((Modifiers::ALT, KeyCode::from_ordinal(body[5], 1000))),
        'A'..='H' => Some((Modifiers::ALT, KeyCode::from_ordinal(last, 1000))),
        _ => None,
    };
    resolved.map_or(Outcome::NoMatch, |(mods, code)| Outcome::Key(mods, code))
}

/// Disambiguate a complete CSI sequence (`^[[` + params + final char) by the
/// shape of its parameters.
fn csi_tail(seq: &[char], dialect: Dialect) -> Option<(Modifiers, KeyCode)> {
    let (&last, rest) = seq.split_last()?;
    let params = rest.get(3..)?;

    match (params, last) {
        ([], 'Z') => Some((Modifiers::SHIFT, KeyCode::TAB)),
        // doubled bracket arrows, home and end
        ([], 'A'..='H') => Some((Modifiers::NONE, KeyCode::from_ordinal(last, 1000))),
        // mrxvt shifted arrows
        ([], 'a' | 'b') => Some((
            Modifiers::CTRL | Modifiers::SHIFT,
            KeyCode::from_ordinal(last, 968),
        )),
        ([], 'c' | 'd') => Some((Modifiers::SHIFT, KeyCode::from_ordinal(last, 968))),
        ([], _) => None,

        ([p0, p1, p2, more @ ..], '~') => {
            let value = if *p1 == ';' {
                number(&[*p0])
            } else {
                number(&[*p0, *p1])
            }?;
            let mods = MODIFIER_DIGITS
                .iter()
                .copied()
                .filter(|d| p2 == d || more.first() == Some(d))
                .find_map(digit_modifier)
                .unwrap_or(Modifiers::SHIFT);
            Some((mods, KeyCode::new(value)))
        }
        ([_, _, p2, ..], _) => {
            let mods = digit_modifier(*p2).unwrap_or(Modifiers::SHIFT);
            // xterm modified F1-F4 (P..S) vs urxvt modified arrows
            let code = if last >= 'P' {
                KeyCode::from_ordinal(last, -69)
            } else {
                KeyCode::from_ordinal(last, 1000)
            };
            Some((mods, code))
        }

        (_, '~') => {
            if let [p0, p1] = params {
                if let Some(two) = number(&[*p0, *p1]).filter(|v| *v > 24) {
                    return Some((Modifiers::SHIFT, KeyCode::new(two - shifted_f_offset(two, dialect))));
                }
            }
            if dialect == Dialect::Mrxvt && params.first() == Some(&'3') {
                return Some((Modifiers::SHIFT, KeyCode::INSERT));
            }
            number(params).map(|v| (Modifiers::NONE, KeyCode::new(v)))
        }

        // xterm F1-F5 in the doubled bracket form
        ([_], 'A'..='Z') => Some((Modifiers::NONE, KeyCode::from_ordinal(last, -54))),
        ([p0 @ 'a'..='z'], _) => Some((Modifiers::SHIFT, KeyCode::from_ordinal(*p0, 968))),
        ([p0], '^' | '@' | '$') => {
            number(&[*p0]).map(|v| (suffix_modifier(last), KeyCode::new(v)))
        }
        ([p0, p1], '^' | '@' | '$') => {
            let value = number(&[*p0, *p1])?;
            if value >= 25 {
                let offset = if matches!(value, 25 | 26 | 29) { 12 } else { 13 };
                Some((Modifiers::CTRL | Modifiers::SHIFT, KeyCode::new(value - offset)))
            } else {
                Some((suffix_modifier(last), KeyCode::new(value)))
            }
        }
        _ => None,
    }
}

/// Order in which xterm-style modifier digits are looked for.
const MODIFIER_DIGITS: [char; 5] = ['5', '3', '6', '7', '8'];

fn digit_modifier(c: char) -> Option<Modifiers> {
    match c {
        '3' => Some(Modifiers::ALT),
        '5' => Some(Modifiers::CTRL),
        '6' => Some(Modifiers::CTRL | Modifiers::SHIFT),
        '7' => Some(Modifiers::CTRL | Modifiers::ALT),
        '8' => Some(Modifiers::all()),
        _ => None,
    }
}

/// rxvt terminators: `^` ctrl, `@` ctrl+shift, `$` shift.
fn suffix_modifier(c: char) -> Modifiers {
    match c {
        '^' => Modifiers::CTRL,
        '@' => Modifiers::CTRL | Modifiers::SHIFT,
        _ => Modifiers::SHIFT,
    }
}

/// Distance from a shifted F-key's parameter to its unshifted code.
///
/// The parameters skip 16 and 22 (and linux skips 27 and 30), so the offset
/// moves by one around those gaps.
fn shifted_f_offset(param: i32, dialect: Dialect) -> i32 {
    match dialect {
        Dialect::Linux => match param {
            25 | 26 => 14,
            31 => 16,
            _ => 15,
        },
        Dialect::Urxvt | Dialect::Xterm | Dialect::Mrxvt => match param {
            25 | 26 | 29 => 12,
            _ => 13,
        },
    }
}

/// Up to `len` characters starting at `start`, clamped to the slice.
fn window(chars: &[char], start: usize, len: usize) -> &[char] {
    let start = start.min(chars.len());
    let end = start.saturating_add(len).min(chars.len());
    &chars[start..end]
}

/// Parse a non-empty run of ASCII digits.
fn number(digits: &[char]) -> Option<i32> {
    if digits.is_empty() || !digits.iter().all(char::is_ascii_digit) {
        return None;
    }
    text(digits).parse().ok()
}
