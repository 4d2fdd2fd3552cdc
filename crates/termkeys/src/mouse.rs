#![forbid(unsafe_code)]

//! Mouse report decoding.
//!
//! The key classifier recognizes the shape of an X10 mouse report but does
//! not produce a key for it. [`parse_mouse_report`] decodes the three report
//! encodings terminals use:
//!
//! | Encoding | Bytes | Coordinates |
//! |----------|-------|-------------|
//! | X10 | `ESC [ M Cb Cx Cy` | `Cx - 33`, `Cy - 33` |
//! | SGR (1006) | `ESC [ < b ; x ; y M` or `m` | decimal, 1-based |
//! | urxvt (1015) | `ESC [ b ; x ; y M` | decimal, 1-based, `b - 32` |
//!
//! All coordinates are reported 0-based.

use crate::event::{Modifiers, MouseButton, MouseEvent, MouseEventKind};

/// Decode a mouse report at the start of `buf`.
///
/// Returns the event and the number of bytes consumed, or `None` when `buf`
/// does not start with a complete report.
#[must_use]
pub fn parse_mouse_report(buf: &[u8]) -> Option<(MouseEvent, usize)> {
    let rest = buf.strip_prefix(b"\x1b[")?;
    match rest {
        [b'M', cb, cx, cy, ..] => {
            let code = u16::from(cb.checked_sub(32)?);
            let x = u16::from(cx.checked_sub(33)?);
            let y = u16::from(cy.checked_sub(33)?);
            Some((decode_button(code, x, y, false), 6))
        }
        [b'M', ..] => None,
        [b'<', params @ ..] => {
            let (fields, final_byte, used) = split_params(params)?;
            if !matches!(final_byte, b'M' | b'm') {
                return None;
            }
            let (code, x, y) = three_numbers(fields)?;
            let event = decode_button(
                code,
                x.saturating_sub(1),
                y.saturating_sub(1),
                final_byte == b'm',
            );
            Some((event, 3 + used))
        }
        params => {
            let (fields, final_byte, used) = split_params(params)?;
            if final_byte != b'M' {
                return None;
            }
            let (code, x, y) = three_numbers(fields)?;
            let event = decode_button(
                code.checked_sub(32)?,
                x.saturating_sub(1),
                y.saturating_sub(1),
                false,
            );
            Some((event, 2 + used))
        }
    }
}

/// Split off the parameter bytes (digits and `;`) and the final byte.
fn split_params(bytes: &[u8]) -> Option<(&[u8], u8, usize)> {
    let end = bytes
        .iter()
        .position(|b| !(b.is_ascii_digit() || *b == b';'))?;
    Some((&bytes[..end], bytes[end], end + 1))
}

fn three_numbers(fields: &[u8]) -> Option<(u16, u16, u16)> {
    let s = std::str::from_utf8(fields).ok()?;
    let mut parts = s.split(';');
    let code = parts.next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((code, x, y))
}

fn decode_button(code: u16, x: u16, y: u16, released: bool) -> MouseEvent {
    let mut modifiers = Modifiers::NONE;
    if code & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if code & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if code & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let wheel = code & 64 != 0;
    let kind = if released {
        MouseEventKind::Release
    } else {
        match code & 0b11 {
            0 if wheel => MouseEventKind::WheelUp,
            1 if wheel => MouseEventKind::WheelDown,
            0 => MouseEventKind::Press(MouseButton::Left),
            1 => MouseEventKind::Press(MouseButton::Middle),
            2 => MouseEventKind::Press(MouseButton::Right),
            _ => MouseEventKind::Release,
        }
    };

    MouseEvent {
        kind,
        x,
        y,
        modifiers,
        motion: code & 32 != 0,
    }
}
