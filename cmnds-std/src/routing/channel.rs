//! Pattern-routed channels.
//!
//! A [`Channel`] keeps any number of handlers, each registered under a
//! [`Pattern`] with a priority. A request runs every handler whose pattern
//! matches the request name, highest priority first, as a sequential chain;
//! handlers with equal priority run in registration order.

use super::pattern::{IntoPattern, Pattern};
use crate::{
    config::debug_log,
    emitter::{Emitter, SubscriptionId},
    sync::lock,
    token::RemovalToken,
};
use cmnds_core::{Args, BoxError, Callable, Chain, CmndsError, Options, Value};
use std::{
    cmp::Reverse,
    fmt,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

/// Identifies a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Registration options for [`Channel::on_with`].
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    priority: i32,
    options: Options,
}

impl HandlerOptions {
    /// Default options: priority 0, empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set priority (higher runs first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Add an entry to the options bag.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A handler registered on a channel.
#[derive(Debug, Clone)]
pub struct Handler {
    id: HandlerId,
    pattern: Pattern,
    implementation: Callable,
    priority: i32,
    options: Options,
}

impl Handler {
    /// The handler's identity.
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// The pattern the handler was registered under.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The handler function.
    pub fn implementation(&self) -> &Callable {
        &self.implementation
    }

    /// Priority (higher runs first).
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Options supplied at registration time.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// Selects handlers for [`Channel::remove_handler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every handler whose pattern was created from this text.
    Pattern(String),
    /// The handler with this id.
    Id(HandlerId),
}

impl From<&str> for Selector {
    fn from(pattern: &str) -> Self {
        Selector::Pattern(pattern.to_owned())
    }
}

impl From<String> for Selector {
    fn from(pattern: String) -> Self {
        Selector::Pattern(pattern)
    }
}

impl From<HandlerId> for Selector {
    fn from(id: HandlerId) -> Self {
        Selector::Id(id)
    }
}

/// The outcome of a successful [`Channel::req`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Result of the last handler.
    pub result: Value,
    /// Result of every handler, in execution order.
    pub results: Vec<Value>,
}

/// Events published by a [`Channel`].
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// A request matched and is about to run.
    PreRequest {
        /// The request name.
        request: String,
        /// Arguments the stack is called with.
        args: Vec<Value>,
    },
    /// A request completed successfully.
    PostRequest {
        /// The request name.
        request: String,
        /// Result of the last handler.
        result: Value,
        /// Result of every handler, in execution order.
        results: Vec<Value>,
    },
    /// A handler was removed.
    Removed {
        /// The removed handler's id.
        id: HandlerId,
        /// The removed handler.
        handler: Handler,
    },
}

struct Shared {
    name: String,
    handlers: Mutex<Vec<Handler>>,
    events: Emitter<ChannelEvent>,
    next_id: AtomicU64,
}

/// A collection of pattern-routed handlers.
///
/// `Channel` is a cheap handle; clones share the same handlers.
///
/// # Example
///
/// ```rust,ignore
/// let files = Channel::new("files");
/// files.on_with("read-*", audit, HandlerOptions::new().with_priority(5))?;
/// files.on_with("read-file", read, HandlerOptions::new().with_priority(10))?;
///
/// // runs `read`, then `audit` with read's result
/// let reply = files.req("read-file", "notes.txt").await?;
/// ```
#[derive(Clone)]
pub struct Channel {
    shared: Arc<Shared>,
}

impl Channel {
    /// Creates an empty channel.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                handlers: Mutex::new(Vec::new()),
                events: Emitter::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// The channel name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Registers `implementation` under `pattern` with priority 0.
    pub fn on(
        &self,
        pattern: impl IntoPattern,
        implementation: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        self.on_with(pattern, implementation, HandlerOptions::default())
    }

    /// Registers `implementation` under `pattern`.
    ///
    /// # Errors
    ///
    /// - [`CmndsError::InvalidFunction`] if `implementation` is `None`
    /// - [`CmndsError::PatternInvalid`] if `pattern` is absent, empty or does
    ///   not compile
    pub fn on_with(
        &self,
        pattern: impl IntoPattern,
        implementation: impl Into<Option<Callable>>,
        options: HandlerOptions,
    ) -> Result<RemovalToken, CmndsError> {
        let implementation = implementation.into().ok_or(CmndsError::InvalidFunction)?;
        let pattern = pattern.into_pattern()?;
        let id = HandlerId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));

        debug_log!(channel = %self.name(), %pattern, priority = options.priority, "handler registered");
        lock(&self.shared.handlers).push(Handler {
            id,
            pattern,
            implementation,
            priority: options.priority,
            options: options.options,
        });

        let owner = Arc::downgrade(&self.shared);
        Ok(RemovalToken::new(move || {
            Self::upgrade(&owner).is_some_and(|channel| channel.remove_handler(id) > 0)
        }))
    }

    /// Every handler whose pattern matches `request`, in registration order.
    pub fn find_match(&self, request: &str) -> Vec<Handler> {
        lock(&self.shared.handlers)
            .iter()
            .filter(|handler| handler.pattern.matches(request))
            .cloned()
            .collect()
    }

    /// Builds the handler stack for `request`.
    ///
    /// With no matching handler, the returned callable fails with
    /// [`CmndsError::HandlerNotFound`] when called.
    pub fn build_stack(&self, request: &str) -> Callable {
        match self.stack(request) {
            Ok(stack) => stack.into_callable(),
            Err(_) => {
                let request = request.to_owned();
                Callable::from_fn(move |_| {
                    Err(Box::new(CmndsError::HandlerNotFound {
                        request: request.clone(),
                    }) as BoxError)
                })
            }
        }
    }

    /// Runs every handler matching `request`, highest priority first.
    ///
    /// Publishes [`ChannelEvent::PreRequest`] before the first handler and
    /// [`ChannelEvent::PostRequest`] on success.
    ///
    /// # Errors
    ///
    /// [`CmndsError::HandlerNotFound`] if no handler matches; otherwise the
    /// first handler error, as [`CmndsError::Step`].
    pub async fn req(&self, request: &str, args: impl Into<Args>) -> Result<Reply, CmndsError> {
        let args = args.into().detached();
        let stack = self.stack(request)?;

        self.shared.events.emit_with(|| ChannelEvent::PreRequest {
            request: request.to_owned(),
            args: args.values().to_vec(),
        });
        debug_log!(channel = %self.name(), %request, handlers = stack.len(), "request");

        #[cfg(feature = "tracing")]
        let outcome = {
            use tracing::Instrument;
            let span = tracing::debug_span!("req", channel = %self.name(), %request);
            stack.call_recorded(args).instrument(span).await
        };
        #[cfg(not(feature = "tracing"))]
        let outcome = stack.call_recorded(args).await;

        let (result, results) = outcome.map_err(CmndsError::from_step)?;
        self.shared.events.emit_with(|| ChannelEvent::PostRequest {
            request: request.to_owned(),
            result: result.clone(),
            results: results.clone(),
        });
        Ok(Reply { result, results })
    }

    /// Removes the handlers chosen by `selector`, returning how many went.
    ///
    /// Publishes one [`ChannelEvent::Removed`] per removed handler.
    pub fn remove_handler(&self, selector: impl Into<Selector>) -> usize {
        let selector = selector.into();
        let removed = {
            let mut handlers = lock(&self.shared.handlers);
            let (gone, kept): (Vec<Handler>, Vec<Handler>) =
                handlers.drain(..).partition(|handler| match &selector {
                    Selector::Pattern(text) => handler.pattern.as_str() == text,
                    Selector::Id(id) => handler.id == *id,
                });
            *handlers = kept;
            gone
        };
        self.announce_removed(removed)
    }

    /// Removes every handler, returning how many went.
    pub fn remove_all_handlers(&self) -> usize {
        let removed = std::mem::take(&mut *lock(&self.shared.handlers));
        self.announce_removed(removed)
    }

    /// All handlers, in registration order.
    pub fn handlers(&self) -> Vec<Handler> {
        lock(&self.shared.handlers).clone()
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        lock(&self.shared.handlers).len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every handler and drops every event subscription.
    pub fn reset(&self) {
        self.remove_all_handlers();
        self.shared.events.clear();
    }

    /// Subscribes to this channel's events.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(listener)
    }

    /// Drops a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.events.unsubscribe(id)
    }

    /// Number of event subscriptions.
    pub fn subscribers(&self) -> usize {
        self.shared.events.len()
    }

    /// Returns `true` if both handles refer to the same channel.
    pub fn ptr_eq(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn stack(&self, request: &str) -> Result<Chain, CmndsError> {
        let mut matched = self.find_match(request);
        if matched.is_empty() {
            return Err(CmndsError::HandlerNotFound {
                request: request.to_owned(),
            });
        }
        // stable: equal priorities keep registration order
        matched.sort_by_key(|handler| Reverse(handler.priority));
        Ok(Chain::new(
            matched.into_iter().map(|handler| handler.implementation),
        ))
    }

    fn announce_removed(&self, removed: Vec<Handler>) -> usize {
        let count = removed.len();
        for handler in removed {
            debug_log!(channel = %self.name(), pattern = %handler.pattern, "handler removed");
            self.shared.events.emit_with(|| ChannelEvent::Removed {
                id: handler.id,
                handler,
            });
        }
        count
    }

    fn upgrade(owner: &Weak<Shared>) -> Option<Channel> {
        owner.upgrade().map(|shared| Channel { shared })
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.shared.name)
            .field("handlers", &self.len())
            .finish_non_exhaustive()
    }
}
