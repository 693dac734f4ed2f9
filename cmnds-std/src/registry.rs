//! Handler registry for named hooks.
//!
//! A [`Registry`] holds, per hook name, one canonical implementation and
//! three ordered middleware lists (before, after, wrap). Invoking a hook runs
//! its pipeline:
//!
//! ```text
//! before[0] → … → before[n] → wrap[m](… wrap[0](implementation) …) → after[0] → … → after[k]
//! ```
//!
//! Pipelines are built on first use and cached per hook. Any change to a
//! hook's implementation or middleware drops its cached pipeline, so the next
//! invocation sees the change.

use crate::{
    config::debug_log,
    emitter::{Emitter, SubscriptionId},
    sync::lock,
    token::RemovalToken,
};
use cmnds_core::{Args, Callable, CmndsError, Options, Value, chain, nest};
use std::{
    collections::{BTreeMap, HashMap},
    fmt, iter,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

/// Namespace name of the default registry.
pub const GLOBAL_NAMESPACE: &str = "__global__";

/// Position of a middleware entry relative to the implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Runs before the implementation; its result becomes the next input.
    Before,
    /// Runs after the implementation, receiving its result.
    After,
    /// Wraps the implementation and any earlier wrappers.
    Wrap,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Before => "before",
            Role::After => "after",
            Role::Wrap => "wrap",
        })
    }
}

/// The canonical implementation registered for a hook.
#[derive(Debug, Clone)]
pub struct HookDefinition {
    id: u64,
    name: String,
    implementation: Callable,
    options: Options,
}

impl HookDefinition {
    /// The hook name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The implementation.
    pub fn implementation(&self) -> &Callable {
        &self.implementation
    }

    /// Options supplied at definition time.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// One middleware function attached to a hook.
#[derive(Debug, Clone)]
pub struct MiddlewareEntry {
    id: u64,
    role: Role,
    step: Callable,
    options: Options,
}

impl MiddlewareEntry {
    /// Where the entry runs.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The middleware function.
    pub fn step(&self) -> &Callable {
        &self.step
    }

    /// Options supplied at registration time.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// Events published by a [`Registry`].
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A hook resolved and is about to run.
    PreInvoke {
        /// Local hook name.
        hook: String,
        /// Arguments the pipeline is called with.
        args: Vec<Value>,
    },
    /// A hook completed successfully.
    PostInvoke {
        /// Local hook name.
        hook: String,
        /// The pipeline's result.
        result: Value,
    },
    /// A definition was removed.
    Removed {
        /// Local hook name.
        hook: String,
        /// The removed definition.
        definition: HookDefinition,
    },
    /// A middleware entry was removed through its token.
    Detached {
        /// Local hook name.
        hook: String,
        /// The removed entry.
        entry: MiddlewareEntry,
    },
}

#[derive(Default)]
struct State {
    hooks: BTreeMap<String, HookDefinition>,
    before: HashMap<String, Vec<MiddlewareEntry>>,
    after: HashMap<String, Vec<MiddlewareEntry>>,
    wrap: HashMap<String, Vec<MiddlewareEntry>>,
    compiled: HashMap<String, Callable>,
}

impl State {
    fn lane(&self, role: Role) -> &HashMap<String, Vec<MiddlewareEntry>> {
        match role {
            Role::Before => &self.before,
            Role::After => &self.after,
            Role::Wrap => &self.wrap,
        }
    }

    fn lane_mut(&mut self, role: Role) -> &mut HashMap<String, Vec<MiddlewareEntry>> {
        match role {
            Role::Before => &mut self.before,
            Role::After => &mut self.after,
            Role::Wrap => &mut self.wrap,
        }
    }

    fn steps(&self, role: Role, name: &str) -> impl Iterator<Item = Callable> + '_ {
        self.lane(role)
            .get(name)
            .into_iter()
            .flatten()
            .map(|entry| entry.step.clone())
    }

    /// Composes the pipeline for `name` from the current lists.
    fn build(&self, name: &str) -> Result<Callable, CmndsError> {
        let definition = self.hooks.get(name).ok_or_else(|| CmndsError::HookNotFound {
            hook: name.to_owned(),
        })?;

        let mut core = definition.implementation.clone();
        if self.lane(Role::Wrap).get(name).is_some_and(|list| !list.is_empty()) {
            core = nest(iter::once(core).chain(self.steps(Role::Wrap, name)))?;
        }

        Ok(chain(
            self.steps(Role::Before, name)
                .chain(iter::once(core))
                .chain(self.steps(Role::After, name)),
        ))
    }

    fn clear(&mut self) {
        self.hooks.clear();
        self.before.clear();
        self.after.clear();
        self.wrap.clear();
        self.compiled.clear();
    }
}

struct Shared {
    namespace: String,
    state: Mutex<State>,
    events: Emitter<RegistryEvent>,
    next_id: AtomicU64,
}

/// A registry of named hooks.
///
/// `Registry` is a cheap handle; clones share the same hooks.
///
/// # Example
///
/// ```rust,ignore
/// let fs = Registry::new("fs");
/// fs.define("readFile", Callable::from_fn(|_| resolve("file content")))?;
/// fs.before("readFile", Callable::from_fn(|args| resolve(args.into_value())))?;
///
/// let content = fs.invoke("readFile", "test.txt").await?;
/// ```
#[derive(Clone)]
pub struct Registry {
    shared: Arc<Shared>,
}

impl Registry {
    /// Creates an empty registry for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                namespace: namespace.into(),
                state: Mutex::new(State::default()),
                events: Emitter::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// The namespace this registry serves.
    pub fn namespace(&self) -> &str {
        &self.shared.namespace
    }

    /// Registers the implementation of `name`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`CmndsError::InvalidFunction`] if `implementation` is `None`.
    pub fn define(
        &self,
        name: &str,
        implementation: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        self.define_with(name, implementation, Options::new())
    }

    /// Like [`define`](Self::define), attaching `options` to the definition.
    pub fn define_with(
        &self,
        name: &str,
        implementation: impl Into<Option<Callable>>,
        options: Options,
    ) -> Result<RemovalToken, CmndsError> {
        let implementation = implementation.into().ok_or(CmndsError::InvalidFunction)?;
        let id = self.next_id();
        {
            let mut state = lock(&self.shared.state);
            state.hooks.insert(
                name.to_owned(),
                HookDefinition {
                    id,
                    name: name.to_owned(),
                    implementation,
                    options,
                },
            );
            state.compiled.remove(name);
        }
        debug_log!(namespace = %self.namespace(), hook = %name, "hook defined");

        let owner = Arc::downgrade(&self.shared);
        let name = name.to_owned();
        Ok(RemovalToken::new(move || {
            Self::upgrade(&owner).is_some_and(|registry| registry.remove_definition(&name, id))
        }))
    }

    /// Appends before-middleware to `name`.
    pub fn before(
        &self,
        name: &str,
        step: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        self.attach(Role::Before, name, step, Options::new())
    }

    /// Appends after-middleware to `name`.
    pub fn after(
        &self,
        name: &str,
        step: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        self.attach(Role::After, name, step, Options::new())
    }

    /// Appends wrap-middleware to `name`.
    ///
    /// The wrapper finds the implementation (wrapped by every earlier
    /// wrapper) in [`Args::wrapped`].
    pub fn wrap(
        &self,
        name: &str,
        step: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        self.attach(Role::Wrap, name, step, Options::new())
    }

    /// Appends middleware with `role` and `options` to `name`.
    ///
    /// Middleware may be attached before the hook is defined.
    ///
    /// # Errors
    ///
    /// [`CmndsError::InvalidFunction`] if `step` is `None`.
    pub fn attach(
        &self,
        role: Role,
        name: &str,
        step: impl Into<Option<Callable>>,
        options: Options,
    ) -> Result<RemovalToken, CmndsError> {
        let step = step.into().ok_or(CmndsError::InvalidFunction)?;
        let id = self.next_id();
        {
            let mut state = lock(&self.shared.state);
            state
                .lane_mut(role)
                .entry(name.to_owned())
                .or_default()
                .push(MiddlewareEntry {
                    id,
                    role,
                    step,
                    options,
                });
            state.compiled.remove(name);
        }
        debug_log!(namespace = %self.namespace(), hook = %name, %role, "middleware attached");

        let owner = Arc::downgrade(&self.shared);
        let name = name.to_owned();
        Ok(RemovalToken::new(move || {
            Self::upgrade(&owner).is_some_and(|registry| registry.detach(role, &name, id))
        }))
    }

    /// Resolves `name` to its pipeline, building and caching it if needed.
    ///
    /// # Errors
    ///
    /// [`CmndsError::HookNotFound`] if `name` has no definition.
    pub fn pipeline(&self, name: &str) -> Result<Callable, CmndsError> {
        let mut state = lock(&self.shared.state);
        if let Some(compiled) = state.compiled.get(name) {
            return Ok(compiled.clone());
        }
        let built = state.build(name)?;
        state.compiled.insert(name.to_owned(), built.clone());
        debug_log!(namespace = %self.namespace(), hook = %name, "pipeline built");
        Ok(built)
    }

    /// Returns `true` if a pipeline for `name` is cached.
    pub fn is_cached(&self, name: &str) -> bool {
        lock(&self.shared.state).compiled.contains_key(name)
    }

    /// Runs the hook `name` with `args`.
    ///
    /// Publishes [`RegistryEvent::PreInvoke`] once the hook resolved and
    /// [`RegistryEvent::PostInvoke`] on success. Errors from middleware or
    /// the implementation are returned as [`CmndsError::Step`] unchanged.
    ///
    /// # Errors
    ///
    /// [`CmndsError::HookNotFound`] if `name` has no definition, before any
    /// middleware runs.
    pub async fn invoke(&self, name: &str, args: impl Into<Args>) -> Result<Value, CmndsError> {
        let args = args.into().detached();
        let pipeline = self.pipeline(name)?;

        self.shared.events.emit_with(|| RegistryEvent::PreInvoke {
            hook: name.to_owned(),
            args: args.values().to_vec(),
        });
        debug_log!(namespace = %self.namespace(), hook = %name, args = args.len(), "invoke");

        #[cfg(feature = "tracing")]
        let result = {
            use tracing::Instrument;
            let span = tracing::debug_span!("invoke", namespace = %self.namespace(), hook = %name);
            pipeline.call(args).instrument(span).await
        };
        #[cfg(not(feature = "tracing"))]
        let result = pipeline.call(args).await;

        let result = result.map_err(CmndsError::from_step)?;
        self.shared.events.emit_with(|| RegistryEvent::PostInvoke {
            hook: name.to_owned(),
            result: result.clone(),
        });
        Ok(result)
    }

    /// Returns `true` if `name` has a definition.
    pub fn has(&self, name: &str) -> bool {
        lock(&self.shared.state).hooks.contains_key(name)
    }

    /// Names of all defined hooks, sorted.
    pub fn names(&self) -> Vec<String> {
        lock(&self.shared.state).hooks.keys().cloned().collect()
    }

    /// The current definition of `name`.
    pub fn definition(&self, name: &str) -> Option<HookDefinition> {
        lock(&self.shared.state).hooks.get(name).cloned()
    }

    /// The middleware attached to `name` with `role`, in registration order.
    pub fn middleware(&self, role: Role, name: &str) -> Vec<MiddlewareEntry> {
        lock(&self.shared.state)
            .lane(role)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes `name` with all its middleware and its cached pipeline.
    ///
    /// Returns the removed definition, if there was one.
    pub fn remove(&self, name: &str) -> Option<HookDefinition> {
        let removed = {
            let mut state = lock(&self.shared.state);
            state.before.remove(name);
            state.after.remove(name);
            state.wrap.remove(name);
            state.compiled.remove(name);
            state.hooks.remove(name)
        };
        if let Some(definition) = &removed {
            debug_log!(namespace = %self.namespace(), hook = %name, "hook removed");
            self.shared.events.emit_with(|| RegistryEvent::Removed {
                hook: name.to_owned(),
                definition: definition.clone(),
            });
        }
        removed
    }

    /// Removes every hook, all middleware and every cached pipeline.
    pub fn remove_all(&self) {
        lock(&self.shared.state).clear();
        debug_log!(namespace = %self.namespace(), "all hooks removed");
    }

    /// Removes everything and drops every event subscription.
    pub fn reset(&self) {
        self.remove_all();
        self.shared.events.clear();
    }

    /// Subscribes to this registry's events.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
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

    /// Returns `true` if both handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn next_id(&self) -> u64 {
        self.shared.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn upgrade(owner: &Weak<Shared>) -> Option<Registry> {
        owner.upgrade().map(|shared| Registry { shared })
    }

    fn remove_definition(&self, name: &str, id: u64) -> bool {
        let removed = {
            let mut state = lock(&self.shared.state);
            if !state.hooks.get(name).is_some_and(|def| def.id == id) {
                return false;
            }
            state.compiled.remove(name);
            state.hooks.remove(name)
        };
        match removed {
            Some(definition) => {
                self.shared.events.emit_with(|| RegistryEvent::Removed {
                    hook: name.to_owned(),
                    definition,
                });
                true
            }
            None => false,
        }
    }

    fn detach(&self, role: Role, name: &str, id: u64) -> bool {
        let removed = {
            let mut state = lock(&self.shared.state);
            let lane = state.lane_mut(role);
            let Some(list) = lane.get_mut(name) else {
                return false;
            };
            let Some(pos) = list.iter().position(|entry| entry.id == id) else {
                return false;
            };
            let entry = list.remove(pos);
            if list.is_empty() {
                lane.remove(name);
            }
            state.compiled.remove(name);
            entry
        };
        debug_log!(namespace = %self.namespace(), hook = %name, %role, "middleware detached");
        self.shared.events.emit_with(|| RegistryEvent::Detached {
            hook: name.to_owned(),
            entry: removed,
        });
        true
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("namespace", &self.shared.namespace)
            .field("hooks", &self.names())
            .finish_non_exhaustive()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(GLOBAL_NAMESPACE)
    }
}
