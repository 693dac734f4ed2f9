//! # Pattern Routing
//!
//! Pattern-based handler selection, the alternative to named hooks:
//!
//! - [`Pattern`]: wildcard (`*`, `?`) or precompiled regex matching of
//!   request names.
//! - [`Channel`]: many competing handlers per pattern, run by descending
//!   priority.
//!
//! # Choosing Between Registry and Channel
//!
//! | Shape | Use Case |
//! |-------|----------|
//! | `Registry` | One implementation per name, extended with middleware |
//! | `Channel` | Many handlers per request, chosen by pattern and priority |

pub mod channel;
pub mod pattern;

pub use channel::{Channel, ChannelEvent, Handler, HandlerId, HandlerOptions, Reply, Selector};
pub use pattern::{IntoPattern, Pattern, matches, wildcard_to_regex};
