//! Positional arguments passed along a pipeline.

use crate::step::{Callable, Outcome};
use serde_json::Value;

/// Options bag attached to definitions, middleware entries and handlers.
pub type Options = serde_json::Map<String, Value>;

/// The positional arguments a step is called with.
///
/// The first step of a chain receives the caller's arguments; every later
/// step receives exactly one value, the result of its predecessor.
///
/// Wrap middleware additionally finds the callable it wraps injected here;
/// see [`Args::wrapped`] and [`Args::proceed`].
#[derive(Clone, Debug, Default)]
pub struct Args {
    values: Vec<Value>,
    wrapped: Option<Callable>,
}

impl Args {
    /// Arguments from a list of values.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            wrapped: None,
        }
    }

    /// A single argument.
    pub fn one(value: impl Into<Value>) -> Self {
        Self::new(vec![value.into()])
    }

    /// No arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the same values with `inner` injected as the wrapped callable.
    pub fn inject(mut self, inner: Callable) -> Self {
        self.wrapped = Some(inner);
        self
    }

    /// The callable being wrapped, when running as wrap middleware.
    pub fn wrapped(&self) -> Option<&Callable> {
        self.wrapped.as_ref()
    }

    /// Returns the same values without any injected callable.
    ///
    /// Pipelines start from detached arguments, so a wrapper forwarding its
    /// own `Args` elsewhere never hands over the callable it wraps.
    pub fn detached(mut self) -> Self {
        self.wrapped = None;
        self
    }

    /// Removes and returns the wrapped callable.
    pub fn take_wrapped(&mut self) -> Option<Callable> {
        self.wrapped.take()
    }

    /// Calls the wrapped callable with these values.
    ///
    /// Without a wrapped callable the values pass straight through, the same
    /// way an empty chain forwards its input.
    pub async fn proceed(mut self) -> Outcome {
        match self.wrapped.take() {
            Some(inner) => inner.call(self).await,
            None => Ok(self.into_value()),
        }
    }

    /// The first value.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// The value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The value at `index` as a string slice.
    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// All values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when there are no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the arguments, returning the values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Collapses the arguments into a single value.
    ///
    /// No values become `Null`, one value is returned as is, several values
    /// become an `Array`.
    pub fn into_value(mut self) -> Value {
        match self.values.len() {
            0 => Value::Null,
            1 => self.values.pop().unwrap_or(Value::Null),
            _ => Value::Array(self.values),
        }
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Args::new(values)
    }
}

impl<const N: usize> From<[Value; N]> for Args {
    fn from(values: [Value; N]) -> Self {
        Args::new(values.into())
    }
}

impl From<Value> for Args {
    fn from(value: Value) -> Self {
        Args::one(value)
    }
}

impl From<&str> for Args {
    fn from(value: &str) -> Self {
        Args::one(value)
    }
}

impl From<String> for Args {
    fn from(value: String) -> Self {
        Args::one(value)
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Args::empty()
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Args::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn into_value_collapses_by_arity() {
        assert_eq!(Args::empty().into_value(), Value::Null);
        assert_eq!(Args::one("a").into_value(), json!("a"));
        assert_eq!(
            Args::from([json!(1), json!(2)]).into_value(),
            json!([1, 2])
        );
    }

    #[tokio::test]
    async fn proceed_without_wrapped_passes_through() {
        let result = Args::one("same").proceed().await.unwrap();
        assert_eq!(result, json!("same"));
    }

    #[tokio::test]
    async fn proceed_calls_the_injected_callable() {
        let inner = Callable::from_fn(|args: Args| {
            assert!(args.wrapped().is_none());
            Ok(json!(format!("inner:{}", args.str(0).unwrap_or_default())))
        });
        let result = Args::one("x").inject(inner).proceed().await.unwrap();
        assert_eq!(result, json!("inner:x"));
    }
}
