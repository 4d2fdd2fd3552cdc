#![forbid(unsafe_code)]

//! Terminal key decoding: raw escape sequences in, key names and modifiers out.
//!
//! Two independent decoders cover the same input:
//!
//! - [`classify`] is stateless and dialect-agnostic. It turns one raw chunk
//!   (`"\x1b[1;5A"`) into a [`KeyEvent`] with a canonical name and
//!   ctrl/meta/shift flags.
//! - [`Normalizer`] is stateful and dialect-aware. It maps caret-notation
//!   text (`"^[[1;5A"`) plus a [`Dialect`] to a `(Modifiers, KeyCode)` pair
//!   and reassembles sequences split across reads.
//!
//! [`mouse::parse_mouse_report`] decodes the mouse reports that share the
//! CSI prefix with keys.

pub mod caret;
pub mod classifier;
pub mod dialect;
pub mod event;
pub mod logging;
pub mod mouse;
pub mod normalizer;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, warn};

pub use classifier::classify;
pub use dialect::{Dialect, ParseDialectError};
pub use event::{
    Classification, KeyCode, KeyEvent, KeyName, Modifiers, MouseButton, MouseEvent,
    MouseEventKind, ParseKeyCodeError,
};
pub use mouse::parse_mouse_report;
pub use normalizer::{MAX_PENDING_LEN, Normalizer, Outcome};
