#![forbid(unsafe_code)]

//! Terminal dialect tags.
//!
//! The dialect normalizer needs to know which emulator produced its input,
//! because linux, urxvt, xterm and mrxvt disagree on several shifted
//! function-key spellings. [`Dialect::detect`] derives the tag from the
//! environment: an explicit `TERMKEYS_DIALECT` override wins, then `TERM`,
//! then the xterm default.

use std::env;
use std::fmt;

/// Environment variable that overrides `TERM`-based detection.
pub const DIALECT_ENV_VAR: &str = "TERMKEYS_DIALECT";

/// A terminal-emulator convention for encoding keys as escape sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Linux virtual console.
    Linux,
    /// rxvt-unicode.
    Urxvt,
    /// xterm and xterm-compatible emulators.
    #[default]
    Xterm,
    /// mrxvt (multi-tabbed rxvt).
    Mrxvt,
}

/// Error returned when a string does not name a known [`Dialect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDialectError {
    input: String,
}

impl ParseDialectError {
    /// The rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseDialectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown terminal dialect {:?} (expected linux, urxvt, xterm or mrxvt)",
            self.input
        )
    }
}

impl std::error::Error for ParseDialectError {}

/// Environment snapshot used by detection.
#[derive(Debug, Clone, Default)]
struct DetectInputs {
    override_name: Option<String>,
    term: String,
}

impl DetectInputs {
    fn from_env() -> Self {
        Self {
            override_name: env::var(DIALECT_ENV_VAR).ok(),
            term: env::var("TERM").unwrap_or_default(),
        }
    }
}

impl Dialect {
    /// Every dialect, in a stable order.
    pub const ALL: [Self; 4] = [Self::Linux, Self::Urxvt, Self::Xterm, Self::Mrxvt];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Urxvt => "urxvt",
            Self::Xterm => "xterm",
            Self::Mrxvt => "mrxvt",
        }
    }

    /// Map a `TERM` value to a dialect.
    ///
    /// Returns `None` for terminals with no dedicated dialect; callers
    /// usually fall back to [`Dialect::default`].
    #[must_use]
    pub fn from_term(term: &str) -> Option<Self> {
        let term = term.trim().to_ascii_lowercase();
        if term.starts_with("linux") {
            Some(Self::Linux)
        } else if term.starts_with("rxvt-unicode") || term.starts_with("urxvt") {
            Some(Self::Urxvt)
        } else if term.starts_with("mrxvt") || term.starts_with("rxvt") {
            Some(Self::Mrxvt)
        } else if term.starts_with("xterm") {
            Some(Self::Xterm)
        } else {
            None
        }
    }

    /// Detect the dialect from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        let env = DetectInputs::from_env();
        Self::detect_from_inputs(&env)
    }

    fn detect_from_inputs(env: &DetectInputs) -> Self {
        if let Some(name) = env.override_name.as_deref() {
            if let Ok(dialect) = name.parse() {
                return dialect;
            }
            crate::debug!(value = name, "ignoring unknown {DIALECT_ENV_VAR} value");
        }
        Self::from_term(&env.term).unwrap_or_default()
    }
}

impl std::str::FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "urxvt" | "rxvt-unicode" => Ok(Self::Urxvt),
            "xterm" => Ok(Self::Xterm),
            "mrxvt" => Ok(Self::Mrxvt),
            _ => Err(ParseDialectError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
