#![allow(dead_code)]

use cmnds::{Args, Callable, ChannelEvent, RegistryEvent, Value, resolve};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Steps
// ============================================================================

/// Appends `text` to the first argument.
pub fn suffix(text: &'static str) -> Callable {
    Callable::from_fn(move |args: Args| {
        resolve(format!("{}{}", args.str(0).unwrap_or_default(), text))
    })
}

/// Ignores its input and resolves to `text`.
pub fn constant(text: &'static str) -> Callable {
    Callable::from_fn(move |_| resolve(text))
}

/// Asserts the first argument equals `expected`, then resolves to `next`.
pub fn expect_then(expected: &'static str, next: &'static str) -> Callable {
    Callable::from_fn(move |args: Args| {
        assert_eq!(args.str(0), Some(expected));
        resolve(next)
    })
}

/// A wrapper that calls the wrapped callable once and serves later calls
/// from its cache.
pub fn caching_wrapper() -> Callable {
    let cache: Arc<Mutex<Option<Value>>> = Arc::default();
    Callable::new(move |args: Args| {
        let cache = cache.clone();
        async move {
            let hit = cache.lock().unwrap().clone();
            match hit {
                Some(content) => resolve(format!(
                    "from cache {}",
                    content.as_str().unwrap_or_default()
                )),
                None => {
                    let content = args.proceed().await?;
                    *cache.lock().unwrap() = Some(content.clone());
                    resolve(content)
                }
            }
        }
    })
}

// ============================================================================
// Event Logs
// ============================================================================

/// A shared log of event descriptions.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn registry_listener(&self) -> impl Fn(&RegistryEvent) + Send + Sync + 'static {
        let entries = self.entries.clone();
        move |event: &RegistryEvent| {
            let entry = match event {
                RegistryEvent::PreInvoke { hook, args } => format!("pre:{hook}:{}", args.len()),
                RegistryEvent::PostInvoke { hook, result } => format!("post:{hook}:{result}"),
                RegistryEvent::Removed { hook, .. } => format!("removed:{hook}"),
                RegistryEvent::Detached { hook, entry } => {
                    format!("detached:{hook}:{}", entry.role())
                }
            };
            entries.lock().unwrap().push(entry);
        }
    }

    pub fn channel_listener(&self) -> impl Fn(&ChannelEvent) + Send + Sync + 'static {
        let entries = self.entries.clone();
        move |event: &ChannelEvent| {
            let entry = match event {
                ChannelEvent::PreRequest { request, .. } => format!("pre:{request}"),
                ChannelEvent::PostRequest {
                    request, results, ..
                } => format!("post:{request}:{}", results.len()),
                ChannelEvent::Removed { handler, .. } => {
                    format!("removed:{}", handler.pattern())
                }
            };
            entries.lock().unwrap().push(entry);
        }
    }
}
