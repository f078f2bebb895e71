//! Error types for the Quasar3D engine
//!
//! Pool invariant violations (double free, lock misuse, capacity
//! overruns) are programmer errors and fail fast with a panic at the
//! violation point; see the `utils` pool modules. The types here cover
//! the checked, recoverable surface of the engine: resource creation,
//! lookups with stale handles, and subsystem initialization.

use std::fmt;

/// Result type for Quasar3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Quasar3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Invalid resource (stale handle, bad descriptor, unknown name)
    InvalidResource(String),

    /// A fixed-capacity resource pool is full
    PoolExhausted(String),

    /// Initialization failed (engine, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::PoolExhausted(msg) => write!(f, "Pool exhausted: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an [`Error::InvalidResource`], logging it through the engine
/// logger first.
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("quasar3d::BufferPool", "unknown buffer {}", 3);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        $crate::engine_error!($source, $($arg)*);
        $crate::quasar3d::Error::InvalidResource(format!($($arg)*))
    }};
}

/// Log and return an [`Error::InvalidResource`] from the enclosing
/// function.
///
/// # Example
///
/// ```ignore
/// if size == 0 {
///     engine_bail!("quasar3d::BufferPool", "buffer must have a non-zero size");
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
