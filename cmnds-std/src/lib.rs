//! # cmnds-std
//!
//! Registries, namespaces and pattern channels for the cmnds command
//! dispatch engine.
//!
//! This crate provides:
//! - **Named hooks**: [`Registry`], one implementation per name plus
//!   before/after/wrap middleware, with cached pipelines
//! - **Namespaces**: [`Directory`] and the process-wide [`global()`]
//! - **Pattern routing**: [`Channel`] and [`Pattern`]
//! - **Observability**: [`Emitter`] events on every registry and channel
//! - **Testing utilities**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core
pub use cmnds_core;
pub use regex;

// Modules
pub mod config;
pub mod directory;
pub mod emitter;
pub mod registry;
pub mod routing;
mod sync;
pub mod testing;
mod token;

pub use directory::{Directory, SEPARATOR, global, split_name};
pub use emitter::{Emitter, SubscriptionId};
pub use registry::{GLOBAL_NAMESPACE, HookDefinition, MiddlewareEntry, Registry, RegistryEvent, Role};
pub use routing::{
    Channel, ChannelEvent, Handler, HandlerId, HandlerOptions, IntoPattern, Pattern, Reply,
    Selector,
};
pub use token::RemovalToken;
