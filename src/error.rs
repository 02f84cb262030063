//! Engine error types.
//!
//! None of these are fatal to the host page: the engine logs them and degrades
//! to "nothing drawn this frame" or "no content found".

use std::fmt;

/// Errors surfaced by the balloon engine and its platform glue.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The drawing surface is not mounted yet, or context creation failed.
    /// The frame is skipped and acquisition is retried on the next frame.
    SurfaceUnavailable {
        /// Human-readable cause (for logging).
        reason: String,
    },

    /// The external content lookup failed for a popped balloon's label.
    ContentLookup {
        /// Label the lookup was issued for.
        label: String,
        /// Transport or decoding failure description.
        message: String,
    },

    /// A color pool entry is not a `#rgb` / `#rrggbb` hex string.
    InvalidColor {
        /// The rejected input.
        value: String,
    },
}

impl EngineError {
    pub fn surface(reason: impl Into<String>) -> Self {
        Self::SurfaceUnavailable {
            reason: reason.into(),
        }
    }

    pub fn lookup(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ContentLookup {
            label: label.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::SurfaceUnavailable { reason } => {
                write!(f, "drawing surface unavailable: {reason}")
            }
            EngineError::ContentLookup { label, message } => {
                write!(f, "content lookup for '{label}' failed: {message}")
            }
            EngineError::InvalidColor { value } => {
                write!(f, "invalid color '{value}' (expected #rgb or #rrggbb)")
            }
        }
    }
}

impl std::error::Error for EngineError {}
