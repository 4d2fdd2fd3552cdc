#![forbid(unsafe_code)]

//! Caret notation.
//!
//! The dialect normalizer reads escape text the way terminal keymaps print
//! it: `ESC` is the two characters `^[`, `0x01` is `^A`, `DEL` is `^?`.
//! [`encode`] renders raw input that way and [`decode`] reverses it.

/// Render C0 controls and `DEL` in caret notation; other characters are kept.
#[must_use]
pub fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() * 2);
    for c in raw.chars() {
        match c {
            '\0'..='\x1f' => {
                out.push('^');
                out.push(char::from(c as u8 ^ 0x40));
            }
            '\x7f' => out.push_str("^?"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn caret notation back into raw control characters.
///
/// A `^` that does not start a valid pair (`^@` through `^_`, or `^?`) is
/// kept as a literal caret.
#[must_use]
pub fn decode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(next @ '@'..='_') => {
                out.push(char::from(next as u8 ^ 0x40));
                chars.next();
            }
            Some('?') => {
                out.push('\x7f');
                chars.next();
            }
            _ => out.push('^'),
        }
    }
    out
}
