//! # cmnds-core
//!
//! Core traits and composition primitives for the cmnds command dispatch
//! engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! code that only needs to write steps or compose them, without the
//! registries of `cmnds-std`.
//!
//! # Building Blocks
//!
//! ## Steps ([`Step`], [`Callable`])
//!
//! A step receives positional [`Args`] and resolves to an [`Outcome`]: a
//! result value or an error. Implementations, middleware and channel
//! handlers are all steps. [`Callable`] is the shared, type-erased handle
//! registries store.
//!
//! ## Composition ([`chain`], [`nest`])
//!
//! - **Sequential chain**: each step's result feeds the next step; the first
//!   error ends the chain.
//! - **Nested wrap**: each step receives the previous composition injected
//!   in its arguments and calls it as it sees fit.
//!
//! # Error Types
//!
//! - [`CmndsError`] - every error the engine raises
//! - [`BoxError`] - errors produced by user steps

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod args;
mod compose;
mod error;
mod step;

// Re-exports
pub use args::{Args, Options};
pub use compose::{Chain, chain, nest};
pub use error::{BoxError, CmndsError};
pub use serde_json::{self, Value, json};
pub use step::{BoxFuture, Callable, DynStep, Outcome, Step, reject, resolve};
