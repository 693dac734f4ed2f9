//! # Steps and callables
//!
//! A step is the unit every pipeline is built from: it receives [`Args`]
//! and eventually resolves to an [`Outcome`]. Implementations, before/after
//! middleware, wrap middleware and channel handlers are all steps.
//!
//! Completion is the resolution of the returned future. A future resolves
//! once, so a step can never report completion twice.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Step`] uses `impl Future` for static dispatch. Registries store steps
//! behind [`Callable`], a cloneable handle over the object-safe [`DynStep`].

use crate::{args::Args, error::BoxError};
use serde_json::Value;
use std::{fmt, future::Future, pin::Pin, sync::Arc};

/// The result of running a step.
pub type Outcome = Result<Value, BoxError>;

/// A boxed, sendable future, as returned by [`DynStep`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Builds a successful [`Outcome`].
pub fn resolve(value: impl Into<Value>) -> Outcome {
    Ok(value.into())
}

/// Builds a failed [`Outcome`].
pub fn reject(err: impl Into<BoxError>) -> Outcome {
    Err(err.into())
}

/// A continuation-passing unit of work.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Step`",
    label = "missing `Step` implementation",
    note = "Steps take `Args` and return a future resolving to `Outcome`."
)]
pub trait Step: Send + Sync + 'static {
    /// Runs the step.
    fn call(&self, args: Args) -> impl Future<Output = Outcome> + Send;
}

/// Dynamic object-safe version of [`Step`].
pub trait DynStep: Send + Sync + 'static {
    /// Runs the step (dynamic dispatch version).
    fn call_dyn(&self, args: Args) -> BoxFuture<'_, Outcome>;
}

impl<T: Step> DynStep for T {
    fn call_dyn(&self, args: Args) -> BoxFuture<'_, Outcome> {
        Box::pin(self.call(args))
    }
}

// Blanket impl for async closures
impl<F, Fut> Step for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send,
{
    fn call(&self, args: Args) -> impl Future<Output = Outcome> + Send {
        (self)(args)
    }
}

/// Adapter running a synchronous closure as a step.
struct SyncStep<F>(F);

impl<F> Step for SyncStep<F>
where
    F: Fn(Args) -> Outcome + Send + Sync + 'static,
{
    fn call(&self, args: Args) -> impl Future<Output = Outcome> + Send {
        std::future::ready((self.0)(args))
    }
}

/// A shared, cloneable handle to a step.
///
/// Two handles are the same callable when they point at the same
/// allocation; see [`Callable::ptr_eq`].
#[derive(Clone)]
pub struct Callable {
    inner: Arc<dyn DynStep>,
}

impl Callable {
    /// Wraps a step.
    ///
    /// ```rust,ignore
    /// let greet = Callable::new(|args: Args| async move {
    ///     resolve(format!("hello {}", args.first().cloned().unwrap_or_default()))
    /// });
    /// ```
    pub fn new<S: Step>(step: S) -> Self {
        Self {
            inner: Arc::new(step),
        }
    }

    /// Wraps a synchronous closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Args) -> Outcome + Send + Sync + 'static,
    {
        Self::new(SyncStep(f))
    }

    /// Runs the callable.
    pub fn call(&self, args: impl Into<Args>) -> BoxFuture<'_, Outcome> {
        self.inner.call_dyn(args.into())
    }

    /// Returns `true` if both handles refer to the same step.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}
