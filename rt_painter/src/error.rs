//! Error types for the RtPainter pipeline
//!
//! This module defines the error types used throughout the crate,
//! including device access, resource creation and render thread handoff.

use std::fmt;

/// Result type for RtPainter operations
pub type Result<T> = std::result::Result<T, Error>;

/// RtPainter errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (software device, command validation, thread handoff)
    BackendError(String),

    /// The device cannot satisfy a buffer allocation
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, pipeline, graph handle)
    InvalidResource(String),

    /// Initialization failed (engine, render thread, shader cache)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` carrying it
///
/// # Example
///
/// ```no_run
/// # use rt_painter::engine_err;
/// let err = engine_err!("rtp::soft", "submit: {} commands left open", 2);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::rtp::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError(..))` from the current function
///
/// # Example
///
/// ```no_run
/// # use rt_painter::engine_bail;
/// fn check(count: usize) -> rt_painter::rtp::Result<()> {
///     if count == 0 {
///         engine_bail!("rtp::ResourceFactory", "empty vertex input");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
