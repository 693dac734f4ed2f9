//! # cmnds - Command Dispatch Engine
//!
//! `cmnds` resolves named operations ("hooks") to composed pipelines and runs
//! them. A hook has one canonical implementation, extended by ordered
//! before, after and wrap middleware; pipelines are built lazily and cached
//! until the hook changes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cmnds::prelude::*;
//!
//! let cmnds = cmnds::global();
//!
//! cmnds.define("fs.readFile", Callable::from_fn(|_| resolve("file content")))?;
//! cmnds.after("fs.readFile", Callable::from_fn(|args: Args| {
//!     resolve(format!("{}!", args.str(0).unwrap_or_default()))
//! }))?;
//!
//! let content = cmnds.invoke("fs.readFile", "test.txt").await?;
//! assert_eq!(content, json!("file content!"));
//! ```
//!
//! ## Pattern Channels
//!
//! ```rust,ignore
//! let files = cmnds.channel("files");
//! files.on_with("read-*", audit, HandlerOptions::new().with_priority(5))?;
//! let reply = files.req("read-file", "notes.txt").await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use cmnds_core::{
    // Arguments
    Args,
    // Error types
    BoxError,
    BoxFuture,
    // Steps
    Callable,
    // Composition
    Chain,
    CmndsError,
    DynStep,
    Options,
    Outcome,
    Step,
    // Values
    Value,
    chain,
    json,
    nest,
    reject,
    resolve,
    serde_json,
};

pub use cmnds_std::{
    // Channels
    Channel,
    ChannelEvent,
    // Namespaces
    Directory,
    // Observability
    Emitter,
    GLOBAL_NAMESPACE,
    Handler,
    HandlerId,
    HandlerOptions,
    // Registry
    HookDefinition,
    IntoPattern,
    MiddlewareEntry,
    Pattern,
    Registry,
    RegistryEvent,
    RemovalToken,
    Reply,
    Role,
    SEPARATOR,
    Selector,
    SubscriptionId,
    global,
    split_name,
};

/// Debug diagnostics configuration.
pub mod config {
    pub use cmnds_std::config::{ENV_VAR, debug_enabled, set_debug};
}

/// Pattern matching helpers.
pub mod pattern {
    pub use cmnds_std::routing::pattern::{IntoPattern, Pattern, matches, wildcard_to_regex};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use cmnds_std::testing::*;
}

/// Prelude module - common imports for cmnds.
///
/// # Usage
///
/// ```rust,ignore
/// use cmnds::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Args, BoxError, Callable, Channel, CmndsError, Directory, HandlerOptions, Outcome,
        Registry, RemovalToken, Role, Step, Value, json, reject, resolve,
    };
}
