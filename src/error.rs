//! Unified error types for the pellet sensor.
//!
//! A single `Error` enum that every subsystem can convert into.  None of
//! these are fatal to the host: script failures are logged and swallowed
//! at the dispatch boundary, an unavailable collaborator makes the mode
//! gate fail closed, and bad command parameters are reported back to the
//! caller without touching sensor state.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Rendering or running an actuator script failed.
    Script(ScriptError),
    /// An external collaborator could not answer.
    Unavailable(Collaborator),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// A command parameter was malformed.  No state was changed.
    InvalidParameter(&'static str),
    /// A pin read or write failed.
    Hardware(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(e) => write!(f, "script: {e}"),
            Self::Unavailable(c) => write!(f, "{c} unavailable"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::Hardware(msg) => write!(f, "hardware: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Script errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The template could not be rendered.
    Render(String),
    /// The rendered script was rejected or failed while running.
    Execution(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "render failed: {msg}"),
            Self::Execution(msg) => write!(f, "execution failed: {msg}"),
        }
    }
}

impl From<ScriptError> for Error {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// External subsystems the sensor depends on but does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    PrintState,
    PauseResume,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrintState => write!(f, "print state"),
            Self::PauseResume => write!(f, "pause/resume"),
        }
    }
}

impl From<Collaborator> for Error {
    fn from(c: Collaborator) -> Self {
        Self::Unavailable(c)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
