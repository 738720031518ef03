//! Common result and error types for quarry.

/// The result type for operations that can only fail through a wiring bug.
///
/// `Err` means an invariant was broken (an identifier decoded against the wrong
/// kind, a mandatory upstream fact missing), never that user input was merely
/// incomplete. Incomplete input is modelled as an absent artifact instead.
pub type QuarryResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in how quarry is wired together.
///
/// These errors must not be swallowed: they are propagated to the caller and
/// reported as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the broken invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Returns an [`InternalError`] from the enclosing function unless `cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::InternalError::new(format!($($arg)+)).into());
        }
    };
}
