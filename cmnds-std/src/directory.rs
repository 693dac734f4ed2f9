//! Namespace directory.
//!
//! A [`Directory`] maps namespace names to [`Registry`] instances, created
//! lazily on first reference, next to one default registry. Operations that
//! take a hook name route dotted names to a namespace: `"fs.readFile"` is
//! hook `readFile` in namespace `fs`. Only the first `.` splits; everything
//! after it is the local name. Names without a `.` go to the default registry.
//!
//! Channels are organised the same way, with one default channel and named
//! channels reachable through dotted request names.
//!
//! The process-wide directory is [`global()`]. It is created on first use
//! and lives for the rest of the process; [`Directory::reset_all`] returns it
//! to its initial state.

use crate::{
    config,
    registry::{GLOBAL_NAMESPACE, Registry},
    routing::{Channel, Reply},
    sync::lock,
    token::RemovalToken,
};
use cmnds_core::{Args, Callable, CmndsError, Options, Value};
use std::{
    collections::BTreeMap,
    fmt,
    sync::{LazyLock, Mutex},
};

/// Separator between namespace and local name.
pub const SEPARATOR: char = '.';

/// Maps namespace names to registries and channels.
pub struct Directory {
    default: Registry,
    namespaces: Mutex<BTreeMap<String, Registry>>,
    default_channel: Channel,
    channels: Mutex<BTreeMap<String, Channel>>,
}

/// The process-wide directory.
pub fn global() -> &'static Directory {
    static GLOBAL: LazyLock<Directory> = LazyLock::new(Directory::new);
    &GLOBAL
}

/// Splits a dotted name into namespace and local name.
pub fn split_name(name: &str) -> Option<(&str, &str)> {
    name.split_once(SEPARATOR)
}

impl Directory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            default: Registry::new(GLOBAL_NAMESPACE),
            namespaces: Mutex::new(BTreeMap::new()),
            default_channel: Channel::new(GLOBAL_NAMESPACE),
            channels: Mutex::new(BTreeMap::new()),
        }
    }

    // ------------------------------------------------------------------
    // Namespaces
    // ------------------------------------------------------------------

    /// The registry for `name`, created if missing.
    ///
    /// An empty name returns the default registry.
    pub fn namespace(&self, name: &str) -> Registry {
        if name.is_empty() {
            return self.default.clone();
        }
        lock(&self.namespaces)
            .entry(name.to_owned())
            .or_insert_with(|| Registry::new(name))
            .clone()
    }

    /// The default registry.
    pub fn default_registry(&self) -> &Registry {
        &self.default
    }

    /// Names of all namespaces, sorted. The default registry is not listed.
    pub fn namespaces(&self) -> Vec<String> {
        lock(&self.namespaces).keys().cloned().collect()
    }

    /// Every namespaced registry, sorted by name.
    pub fn registries(&self) -> Vec<Registry> {
        lock(&self.namespaces).values().cloned().collect()
    }

    /// Returns `true` if namespace `name` exists.
    pub fn has_namespace(&self, name: &str) -> bool {
        lock(&self.namespaces).contains_key(name)
    }

    /// Resets and discards namespace `name`.
    ///
    /// Handles to the registry held elsewhere stay valid but empty.
    pub fn remove_namespace(&self, name: &str) -> bool {
        let removed = lock(&self.namespaces).remove(name);
        match removed {
            Some(registry) => {
                registry.reset();
                true
            }
            None => false,
        }
    }

    /// Removes every namespace and channel and resets the defaults.
    pub fn reset_all(&self) {
        for name in self.namespaces() {
            self.remove_namespace(&name);
        }
        for name in self.channels() {
            self.remove_channel(&name);
        }
        self.default.reset();
        self.default_channel.reset();
    }

    fn resolve<'n>(&self, name: &'n str) -> (Registry, &'n str) {
        match split_name(name) {
            Some((namespace, local)) => (self.namespace(namespace), local),
            None => (self.default.clone(), name),
        }
    }

    /// Like `resolve`, but `None` instead of creating a missing namespace.
    fn lookup<'n>(&self, name: &'n str) -> Option<(Registry, &'n str)> {
        match split_name(name) {
            Some((namespace, local)) if !namespace.is_empty() => lock(&self.namespaces)
                .get(namespace)
                .map(|registry| (registry.clone(), local)),
            Some((_, local)) => Some((self.default.clone(), local)),
            None => Some((self.default.clone(), name)),
        }
    }

    // ------------------------------------------------------------------
    // Dotted-name delegation
    // ------------------------------------------------------------------

    /// [`Registry::invoke`] on the registry `name` routes to.
    pub async fn invoke(&self, name: &str, args: impl Into<Args>) -> Result<Value, CmndsError> {
        let (registry, local) = self.resolve(name);
        registry.invoke(local, args).await
    }

    /// [`Registry::define`] on the registry `name` routes to.
    pub fn define(
        &self,
        name: &str,
        implementation: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        let (registry, local) = self.resolve(name);
        registry.define(local, implementation)
    }

    /// [`Registry::define_with`] on the registry `name` routes to.
    pub fn define_with(
        &self,
        name: &str,
        implementation: impl Into<Option<Callable>>,
        options: Options,
    ) -> Result<RemovalToken, CmndsError> {
        let (registry, local) = self.resolve(name);
        registry.define_with(local, implementation, options)
    }

    /// [`Registry::before`] on the registry `name` routes to.
    pub fn before(
        &self,
        name: &str,
        step: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        let (registry, local) = self.resolve(name);
        registry.before(local, step)
    }

    /// [`Registry::after`] on the registry `name` routes to.
    pub fn after(
        &self,
        name: &str,
        step: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        let (registry, local) = self.resolve(name);
        registry.after(local, step)
    }

    /// [`Registry::wrap`] on the registry `name` routes to.
    pub fn wrap(
        &self,
        name: &str,
        step: impl Into<Option<Callable>>,
    ) -> Result<RemovalToken, CmndsError> {
        let (registry, local) = self.resolve(name);
        registry.wrap(local, step)
    }

    /// [`Registry::has`] on the registry `name` routes to.
    ///
    /// Does not create the namespace when it is missing.
    pub fn has(&self, name: &str) -> bool {
        self.lookup(name)
            .is_some_and(|(registry, local)| registry.has(local))
    }

    /// [`Registry::remove`] on the registry `name` routes to.
    ///
    /// Does not create the namespace when it is missing.
    pub fn remove(&self, name: &str) -> bool {
        self.lookup(name)
            .is_some_and(|(registry, local)| registry.remove(local).is_some())
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    /// The channel for `name`, created if missing.
    ///
    /// An empty name returns the default channel.
    pub fn channel(&self, name: &str) -> Channel {
        if name.is_empty() {
            return self.default_channel.clone();
        }
        lock(&self.channels)
            .entry(name.to_owned())
            .or_insert_with(|| Channel::new(name))
            .clone()
    }

    /// The default channel.
    pub fn default_channel(&self) -> &Channel {
        &self.default_channel
    }

    /// Names of all channels, sorted. The default channel is not listed.
    pub fn channels(&self) -> Vec<String> {
        lock(&self.channels).keys().cloned().collect()
    }

    /// Returns `true` if channel `name` exists.
    pub fn has_channel(&self, name: &str) -> bool {
        lock(&self.channels).contains_key(name)
    }

    /// Resets and discards channel `name`.
    pub fn remove_channel(&self, name: &str) -> bool {
        let removed = lock(&self.channels).remove(name);
        match removed {
            Some(channel) => {
                channel.reset();
                true
            }
            None => false,
        }
    }

    /// [`Channel::req`] on the channel `request` routes to.
    ///
    /// `"files.read"` goes to channel `files` as `read` when that channel
    /// exists. Otherwise the whole name, dots included, goes to the default
    /// channel, so default handlers for dotted patterns such as `"file.*"`
    /// stay reachable. Requests never create channels.
    pub async fn req(&self, request: &str, args: impl Into<Args>) -> Result<Reply, CmndsError> {
        let named = split_name(request).and_then(|(name, local)| {
            lock(&self.channels)
                .get(name)
                .map(|channel| (channel.clone(), local))
        });
        let (channel, local) = named.unwrap_or_else(|| (self.default_channel.clone(), request));
        channel.req(local, args).await
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Enables or disables debug diagnostics for the whole process.
    pub fn set_debug(&self, enabled: bool) {
        config::set_debug(enabled);
    }

    /// Returns whether debug diagnostics are enabled.
    pub fn debug_enabled(&self) -> bool {
        config::debug_enabled()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("namespaces", &self.namespaces())
            .field("channels", &self.channels())
            .finish_non_exhaustive()
    }
}
