//! # Composition primitives
//!
//! Two ways of combining steps into one [`Callable`]:
//!
//! - [`chain`] runs steps one after another. Each step's result becomes the
//!   single argument of the next; the first error stops the chain.
//! - [`nest`] wraps steps around each other. Every later step receives the
//!   composition of the earlier ones injected into its [`Args`] and decides
//!   whether, when and how often to call it.
//!
//! Neither primitive holds state or makes timing assumptions; they only fix
//! the order in which steps run.

use crate::{
    args::Args,
    error::{BoxError, CmndsError},
    step::{Callable, Outcome, Step},
};
use serde_json::Value;
use std::future::Future;

/// A sequential chain of steps.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    steps: Vec<Callable>,
}

impl Chain {
    /// Creates a chain over `steps`, in order.
    pub fn new(steps: impl IntoIterator<Item = Callable>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs the chain, returning the last result together with the result
    /// of every step in execution order.
    ///
    /// An empty chain forwards its arguments and records nothing.
    pub async fn call_recorded(&self, args: Args) -> Result<(Value, Vec<Value>), BoxError> {
        let mut steps = self.steps.iter();
        let Some(first) = steps.next() else {
            return Ok((args.into_value(), Vec::new()));
        };

        let mut results = Vec::with_capacity(self.steps.len());
        let mut value = first.call(args.detached()).await?;
        for step in steps {
            results.push(value.clone());
            value = step.call(Args::one(value)).await?;
        }
        results.push(value.clone());
        Ok((value, results))
    }

    /// Converts the chain into a callable.
    pub fn into_callable(self) -> Callable {
        Callable::new(self)
    }
}

impl Step for Chain {
    async fn call(&self, args: Args) -> Outcome {
        let mut steps = self.steps.iter();
        let Some(first) = steps.next() else {
            return Ok(args.into_value());
        };

        let mut value = first.call(args.detached()).await?;
        for step in steps {
            value = step.call(Args::one(value)).await?;
        }
        Ok(value)
    }
}

/// Composes `steps` into a sequential chain.
///
/// With no steps the returned callable forwards its arguments as its result.
pub fn chain(steps: impl IntoIterator<Item = Callable>) -> Callable {
    Chain::new(steps).into_callable()
}

/// One layer of a nested composition.
struct Wrapped {
    inner: Callable,
    wrapper: Callable,
}

impl Step for Wrapped {
    fn call(&self, args: Args) -> impl Future<Output = Outcome> + Send {
        self.wrapper.call(args.inject(self.inner.clone()))
    }
}

/// Nests `fns` so that each callable wraps all of the ones before it.
///
/// `fns[0]` is the innermost callable. `fns[i + 1]` runs with the
/// composition of `fns[..=i]` available as [`Args::wrapped`].
///
/// # Errors
///
/// [`CmndsError::EmptyComposition`] if `fns` is empty.
pub fn nest(fns: impl IntoIterator<Item = Callable>) -> Result<Callable, CmndsError> {
    let mut fns = fns.into_iter();
    let mut composed = fns.next().ok_or(CmndsError::EmptyComposition)?;
    for wrapper in fns {
        composed = Callable::new(Wrapped {
            inner: composed,
            wrapper,
        });
    }
    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{reject, resolve};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn suffix(text: &'static str) -> Callable {
        Callable::from_fn(move |args: Args| {
            resolve(format!("{}{}", args.str(0).unwrap_or_default(), text))
        })
    }

    #[tokio::test]
    async fn chain_threads_results_in_order() {
        let pipeline = chain([
            Callable::from_fn(|_| resolve("You")),
            suffix(" are"),
            suffix(" amazing"),
        ]);
        let result = pipeline.call(()).await.unwrap();
        assert_eq!(result, json!("You are amazing"));
    }

    #[tokio::test]
    async fn chain_stops_at_first_error() {
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        let pipeline = chain([
            Callable::from_fn(|_| reject("OK")),
            Callable::from_fn(move |_| {
                *flag.lock().unwrap() = true;
                resolve("unreachable")
            }),
        ]);

        let err = pipeline.call(()).await.unwrap_err();
        assert_eq!(err.to_string(), "OK");
        assert!(!*ran.lock().unwrap());
    }

    #[tokio::test]
    async fn empty_chain_forwards_arguments() {
        let pipeline = chain([]);
        let result = pipeline.call([json!("a"), json!("b")]).await.unwrap();
        assert_eq!(result, json!(["a", "b"]));

        let single = pipeline.call("a").await.unwrap();
        assert_eq!(single, json!("a"));
    }

    #[tokio::test]
    async fn first_step_sees_all_caller_arguments() {
        let pipeline = chain([
            Callable::from_fn(|args: Args| resolve(args.len() as u64)),
            Callable::from_fn(|args: Args| resolve(args.len() as u64 * 10)),
        ]);
        let result = pipeline
            .call([json!(1), json!(2), json!(3)])
            .await
            .unwrap();
        assert_eq!(result, json!(10));
    }

    #[tokio::test]
    async fn chain_does_not_pass_injected_callables_on() {
        let foreign = Callable::from_fn(|_| resolve("foreign"));
        let pipeline = Chain::new([Callable::new(|args: Args| async move {
            assert!(args.wrapped().is_none());
            args.proceed().await
        })]);

        let args = Args::one("x").inject(foreign.clone());
        assert_eq!(pipeline.call(args).await.unwrap(), json!("x"));

        let args = Args::one("x").inject(foreign);
        let (last, _) = pipeline.call_recorded(args).await.unwrap();
        assert_eq!(last, json!("x"));
    }

    #[tokio::test]
    async fn call_recorded_keeps_intermediate_results() {
        let recorded = Chain::new([Callable::from_fn(|_| resolve("a")), suffix("b"), suffix("c")]);
        let (last, all) = recorded.call_recorded(Args::empty()).await.unwrap();
        assert_eq!(last, json!("abc"));
        assert_eq!(all, vec![json!("a"), json!("ab"), json!("abc")]);
    }

    #[test]
    fn nest_rejects_empty_input() {
        assert!(matches!(nest([]), Err(CmndsError::EmptyComposition)));
    }

    #[tokio::test]
    async fn nest_wraps_outward() {
        let around = |text: &'static str| {
            Callable::new(move |args: Args| async move {
                let msg = args.proceed().await?;
                resolve(format!("{} {}", msg.as_str().unwrap_or_default(), text))
            })
        };
        let composed = nest([
            Callable::from_fn(|args: Args| resolve(args.into_value())),
            around("john"),
            around("doe"),
        ])
        .unwrap();

        let result = composed.call("hello").await.unwrap();
        assert_eq!(result, json!("hello john doe"));
    }

    #[tokio::test]
    async fn nest_propagates_inner_errors() {
        let composed = nest([
            Callable::from_fn(|args: Args| reject(args.str(0).unwrap_or_default().to_string())),
            Callable::new(|args: Args| async move {
                args.proceed().await?;
                resolve("something wrong")
            }),
        ])
        .unwrap();

        let err = composed.call("OK").await.unwrap_err();
        assert_eq!(err.to_string(), "OK");
    }

    #[tokio::test]
    async fn wrapper_may_skip_the_inner_call() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let cache: Arc<Mutex<Option<Value>>> = Arc::default();

        let composed = nest([
            Callable::from_fn(move |_| {
                *counter.lock().unwrap() += 1;
                resolve("fresh")
            }),
            Callable::new(move |args: Args| {
                let cache = cache.clone();
                async move {
                    let cached = cache.lock().unwrap().clone();
                    if let Some(hit) = cached {
                        return resolve(format!("cached {}", hit.as_str().unwrap_or_default()));
                    }
                    let value = args.proceed().await?;
                    *cache.lock().unwrap() = Some(value.clone());
                    resolve(value)
                }
            }),
        ])
        .unwrap();

        assert_eq!(composed.call(()).await.unwrap(), json!("fresh"));
        assert_eq!(composed.call(()).await.unwrap(), json!("cached fresh"));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
