#![forbid(unsafe_code)]

//! Canonical escape classifier.
//!
//! Turns one input chunk into at most one [`KeyEvent`] without any state.
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. Fixed literals: `\r`, `\n`, `\t`, backspace/DEL (optionally
//!    escape-prefixed), escape, space.
//! 2. A single control character `0x01..=0x1A` → ctrl + letter.
//! 3. A single lowercase letter, then a single uppercase letter (shift).
//! 4. The meta-key grammar: `ESC` + one alphanumeric, nothing else.
//! 5. The function-key grammar: one or more `ESC`, a prefix (`O`, `N`, `[`
//!    or `[[`), then a numeric `~ ^ $` form, an X10 mouse report, or an
//!    optional `1;` + modifier digits + one letter.
//!
//! The function-key grammar composes a code string (prefix, leading digits,
//! terminator, trailing letter) that drops the modifier digits, then looks it
//! up in a fixed table that knows the xterm, gnome, rxvt, putty, Cygwin and
//! Linux console spellings. A code missing from the table means "no key".
//!
//! ```
//! use termkeys::classifier::classify;
//! use termkeys::event::KeyName;
//!
//! let key = classify("\x1b[1;5A").key.unwrap();
//! assert_eq!(key.name, KeyName::Up);
//! assert!(key.ctrl && !key.shift && !key.meta);
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::{Classification, KeyEvent, KeyName, Modifiers};

static META_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\x1b([a-zA-Z0-9])$").expect("meta-key grammar is a valid regex")
});

static FUNCTION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\x1b+(?P<prefix>O|N|\[|\[\[)(?:",
        r"(?P<digits>[0-9]+)(?:;(?P<modifier>[0-9]+))?(?P<terminator>[~^$])",
        r"|M(?P<button>[@ #!a`])(?P<x>.)(?P<y>.)",
        r"|(?:1;)?(?P<param>[0-9]+)?(?P<letter>[a-zA-Z])",
        r")",
    ))
    .expect("function-key grammar is a valid regex")
});

/// Classify one raw input chunk.
///
/// The returned [`Classification`] carries the recognized key (if any) and,
/// independently, the chunk itself as a literal character when it is exactly
/// one character long.
#[must_use]
pub fn classify(chunk: &str) -> Classification {
    let mut chars = chunk.chars();
    let ch = match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    };

    Classification {
        key: classify_key(chunk, ch),
        ch,
    }
}

fn classify_key(s: &str, single: Option<char>) -> Option<KeyEvent> {
    let escaped = s.len() == 2 && s.starts_with('\x1b');

    match s {
        "\r" => return Some(KeyEvent::new(s, KeyName::Return)),
        "\n" => return Some(KeyEvent::new(s, KeyName::Enter)),
        "\t" => return Some(KeyEvent::new(s, KeyName::Tab)),
        "\x08" | "\x7f" | "\x1b\x7f" | "\x1b\x08" => {
            return Some(with_meta(KeyEvent::new(s, KeyName::Backspace), escaped));
        }
        "\x1b" | "\x1b\x1b" => {
            return Some(with_meta(KeyEvent::new(s, KeyName::Escape), escaped));
        }
        " " | "\x1b " => return Some(with_meta(KeyEvent::new(s, KeyName::Space), escaped)),
        _ => {}
    }

    if let Some(c) = single {
        match c {
            // Ctrl+Space / Ctrl+@
            '\0' => {
                return Some(KeyEvent::new(s, KeyName::Space).with_modifiers(Modifiers::CTRL));
            }
            '\x01'..='\x1a' => {
                let letter = char::from(b'a' + (c as u8) - 1);
                return Some(
                    KeyEvent::new(s, KeyName::Char(letter)).with_modifiers(Modifiers::CTRL),
                );
            }
            'a'..='z' => return Some(KeyEvent::new(s, KeyName::Char(c))),
            'A'..='Z' => {
                return Some(
                    KeyEvent::new(s, KeyName::Char(c.to_ascii_lowercase()))
                        .with_modifiers(Modifiers::SHIFT),
                );
            }
            _ => {}
        }
    }

    if let Some(c) = META_KEY
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
    {
        let mut mods = Modifiers::ALT;
        mods.set(Modifiers::SHIFT, c.is_ascii_uppercase());
        return Some(KeyEvent::new(s, KeyName::Char(c.to_ascii_lowercase())).with_modifiers(mods));
    }

    FUNCTION_KEY
        .captures(s)
        .and_then(|caps| function_key(s, &caps))
}

fn with_meta(mut key: KeyEvent, meta: bool) -> KeyEvent {
    key.meta = meta;
    key
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn function_key(s: &str, caps: &Captures<'_>) -> Option<KeyEvent> {
    if caps.name("button").is_some() {
        crate::trace!(sequence = ?s, "mouse report seen by key classifier");
        return None;
    }

    let code = [
        group(caps, "prefix"),
        group(caps, "digits"),
        group(caps, "terminator"),
        group(caps, "letter"),
    ]
    .concat();

    // xterm sends 1 + a bit set; no group means "no modifier".
    let modifier = caps
        .name("modifier")
        .or_else(|| caps.name("param"))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(1)
        .saturating_sub(1);

    let Some((name, implied)) = lookup(&code) else {
        crate::debug!(code = %code, sequence = ?s, "unrecognized function key sequence");
        return None;
    };

    Some(KeyEvent {
        sequence: s.to_string(),
        name,
        ctrl: modifier & 0b0100 != 0 || implied.contains(Modifiers::CTRL),
        meta: modifier & 0b1010 != 0,
        shift: modifier & 0b0001 != 0 || implied.contains(Modifiers::SHIFT),
        code: Some(code),
    })
}

/// Map a composed function-key code to a key name plus any modifiers the
/// spelling itself implies (rxvt encodes shift and ctrl in the terminator).
fn lookup(code: &str) -> Option<(KeyName, Modifiers)> {
    use KeyName::{
        Clear, Delete, Down, End, F, Home, Insert, Left, PageDown, PageUp, Right, Tab, Up,
    };

    let plain = Modifiers::NONE;
    let shift = Modifiers::SHIFT;
    let ctrl = Modifiers::CTRL;

    let entry = match code {
        // xterm/gnome SS3, xterm/rxvt CSI n ~, Cygwin/libuv doubled bracket
        "OP" | "[11~" | "[[A" => (F(1), plain),
        "OQ" | "[12~" | "[[B" => (F(2), plain),
        "OR" | "[13~" | "[[C" => (F(3), plain),
        "OS" | "[14~" | "[[D" => (F(4), plain),
        "[[E" | "[15~" => (F(5), plain),
        "[17~" => (F(6), plain),
        "[18~" => (F(7), plain),
        "[19~" => (F(8), plain),
        "[20~" => (F(9), plain),
        "[21~" => (F(10), plain),
        "[23~" => (F(11), plain),
        "[24~" => (F(12), plain),

        // xterm CSI letter and SS3 letter
        "[A" | "OA" => (Up, plain),
        "[B" | "OB" => (Down, plain),
        "[C" | "OC" => (Right, plain),
        "[D" | "OD" => (Left, plain),
        "[E" | "OE" => (Clear, plain),
        "[F" | "OF" => (End, plain),
        "[H" | "OH" => (Home, plain),

        // CSI n ~, putty doubled bracket, rxvt 7/8
        "[1~" | "[7~" => (Home, plain),
        "[2~" => (Insert, plain),
        "[3~" => (Delete, plain),
        "[4~" | "[8~" => (End, plain),
        "[5~" | "[[5~" => (PageUp, plain),
        "[6~" | "[[6~" => (PageDown, plain),

        // rxvt with shift
        "[a" => (Up, shift),
        "[b" => (Down, shift),
        "[c" => (Right, shift),
        "[d" => (Left, shift),
        "[e" => (Clear, shift),
        "[2$" => (Insert, shift),
        "[3$" => (Delete, shift),
        "[5$" => (PageUp, shift),
        "[6$" => (PageDown, shift),
        "[7$" => (Home, shift),
        "[8$" => (End, shift),

        // rxvt with ctrl
        "Oa" => (Up, ctrl),
        "Ob" => (Down, ctrl),
        "Oc" => (Right, ctrl),
        "Od" => (Left, ctrl),
        "Oe" => (Clear, ctrl),
        "[2^" => (Insert, ctrl),
        "[3^" => (Delete, ctrl),
        "[5^" => (PageUp, ctrl),
        "[6^" => (PageDown, ctrl),
        "[7^" => (Home, ctrl),
        "[8^" => (End, ctrl),

        "[Z" => (Tab, shift),
        _ => return None,
    };
    Some(entry)
}
