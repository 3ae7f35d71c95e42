//! Error types for the MultiPCM core.
//!
//! Most of the chip's external surface is deliberately infallible (register
//! writes silently clamp or ignore per the hardware's own behavior). This
//! type only covers the handful of entry points where a caller benefits from
//! a diagnosable error instead of a silent clamp.

use thiserror::Error;

/// Result alias for fallible MultiPCM operations.
pub type Result<T> = std::result::Result<T, MultiPcmError>;

/// Errors reported by the fallible corners of the MultiPCM core.
#[derive(Debug, Error)]
pub enum MultiPcmError {
    /// Requested ROM size does not fit the chip's 24-bit address window.
    #[error("ROM size {size} exceeds the 24-bit addressable window (max {max})")]
    RomTooLarge {
        /// Size requested by the caller, in bytes.
        size: usize,
        /// Largest size the chip can address.
        max: usize,
    },

    /// Generic validation error, used for miscellaneous caller-contract checks.
    #[error("{0}")]
    Other(String),
}

impl From<String> for MultiPcmError {
    fn from(msg: String) -> Self {
        MultiPcmError::Other(msg)
    }
}

impl From<&str> for MultiPcmError {
    fn from(msg: &str) -> Self {
        MultiPcmError::Other(msg.to_string())
    }
}
