//! Error types for cmnds.
//!
//! Every failure the engine itself raises is a variant of [`CmndsError`].
//! Errors produced by user steps travel as [`BoxError`] and are carried
//! through [`CmndsError::Step`] untouched.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all cmnds operations.
#[derive(Error, Debug)]
pub enum CmndsError {
    /// A registration argument that must be callable was absent.
    #[error("Invalid function specified")]
    InvalidFunction,

    /// `invoke` was called for a hook that has no definition.
    #[error("Hook \"{hook}\" not found")]
    HookNotFound {
        /// The local hook name that failed to resolve.
        hook: String,
    },

    /// A channel request matched no handler.
    #[error("Handler for \"{request}\" not found")]
    HandlerNotFound {
        /// The request name that matched nothing.
        request: String,
    },

    /// A routing pattern was absent or could not be compiled.
    #[error("invalid pattern: {0}")]
    PatternInvalid(String),

    /// Nested composition requires at least one function.
    #[error("The list of functions is empty")]
    EmptyComposition,

    /// An error reported by a middleware step or an implementation.
    #[error(transparent)]
    Step(BoxError),
}

impl CmndsError {
    /// Numeric status code, present for the not-found kinds.
    pub fn code(&self) -> Option<u16> {
        match self {
            CmndsError::HookNotFound { .. } | CmndsError::HandlerNotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Returns `true` for [`HookNotFound`](Self::HookNotFound) and
    /// [`HandlerNotFound`](Self::HandlerNotFound).
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(404)
    }

    /// Converts an error reported by a step.
    ///
    /// A step that itself called into the engine may fail with a boxed
    /// `CmndsError`; that error is unboxed rather than nested inside
    /// [`Step`](Self::Step).
    pub fn from_step(err: BoxError) -> Self {
        match err.downcast::<CmndsError>() {
            Ok(inner) => *inner,
            Err(other) => CmndsError::Step(other),
        }
    }

    /// The step error, if this error came from user code.
    pub fn as_step(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            CmndsError::Step(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<BoxError> for CmndsError {
    fn from(err: BoxError) -> Self {
        CmndsError::from_step(err)
    }
}
