//! Testing utilities for cmnds.
//!
//! This module provides steps that make pipelines easy to observe in tests.
//!
//! # Features
//!
//! - [`RecordingStep`]: records every argument list it receives
//! - [`CountingStep`]: counts calls and passes its input through
//! - [`constant`], [`append`], [`failing`]: one-line steps for common shapes

use crate::sync::lock;
use cmnds_core::{Args, BoxError, Callable, Outcome, Step, Value};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Recording Step
// ============================================================================

/// A step that records the arguments of every call.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingStep::new(json!("done"));
/// registry.define("op", recorder.callable())?;
///
/// registry.invoke("op", "input").await?;
/// assert_eq!(recorder.calls(), vec![vec![json!("input")]]);
/// ```
#[derive(Clone)]
pub struct RecordingStep {
    calls: Arc<Mutex<Vec<Vec<Value>>>>,
    result: Value,
}

impl RecordingStep {
    /// Create a recording step that resolves to `result`.
    pub fn new(result: impl Into<Value>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: result.into(),
        }
    }

    /// Get a clone of the recorded argument lists.
    pub fn calls(&self) -> Vec<Vec<Value>> {
        lock(&self.calls).clone()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    /// A callable sharing this recorder's log.
    pub fn callable(&self) -> Callable {
        Callable::new(self.clone())
    }
}

impl Default for RecordingStep {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl Step for RecordingStep {
    async fn call(&self, args: Args) -> Outcome {
        lock(&self.calls).push(args.into_values());
        Ok(self.result.clone())
    }
}

// ============================================================================
// Counting Step
// ============================================================================

/// A step that counts invocations and forwards its input.
#[derive(Clone, Default)]
pub struct CountingStep {
    count: Arc<AtomicUsize>,
}

impl CountingStep {
    /// Create a new counting step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    /// A callable sharing this counter.
    pub fn callable(&self) -> Callable {
        Callable::new(self.clone())
    }
}

impl Step for CountingStep {
    async fn call(&self, args: Args) -> Outcome {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(args.into_value())
    }
}

// ============================================================================
// One-line steps
// ============================================================================

/// A step that ignores its input and resolves to `value`.
pub fn constant(value: impl Into<Value>) -> Callable {
    let value = value.into();
    Callable::from_fn(move |_| Ok(value.clone()))
}

/// A step that appends `suffix` to its first argument.
///
/// A missing or non-string first argument counts as the empty string.
pub fn append(suffix: impl Into<String>) -> Callable {
    let suffix = suffix.into();
    Callable::from_fn(move |args: Args| {
        let head = args.str(0).unwrap_or_default();
        Ok(Value::String(format!("{head}{suffix}")))
    })
}

/// A step that always fails with `message`.
pub fn failing(message: impl Into<String>) -> Callable {
    let message = message.into();
    Callable::from_fn(move |_| Err(BoxError::from(message.clone())))
}
