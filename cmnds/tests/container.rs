use cmnds::{Args, Callable, CmndsError, Registry, Role, json, resolve};

mod common;
use common::{EventLog, caching_wrapper, constant, expect_then, suffix};

#[tokio::test]
async fn test_invoke_defined_hook() {
    let fs = Registry::new("fs");
    fs.define(
        "readFile",
        Callable::from_fn(|args: Args| {
            assert_eq!(args.str(0), Some("test.txt"));
            resolve("file content")
        }),
    )
    .unwrap();

    let content = fs.invoke("readFile", "test.txt").await.unwrap();
    assert_eq!(content, json!("file content"));
}

#[tokio::test]
async fn test_before_after_and_wrap() {
    let fs = Registry::new("fs");
    fs.define("readFile", expect_then("test#2.txt", "hello"))
        .unwrap();
    fs.before("readFile", expect_then("test.txt", "test#1.txt"))
        .unwrap();
    fs.before("readFile", constant("test#2.txt")).unwrap();
    fs.after("readFile", suffix(" master")).unwrap();
    fs.after("readFile", suffix(" yoda")).unwrap();
    fs.wrap("readFile", caching_wrapper()).unwrap();

    let first = fs.invoke("readFile", "test.txt").await.unwrap();
    assert_eq!(first, json!("hello master yoda"));

    let second = fs.invoke("readFile", "test.txt").await.unwrap();
    assert_eq!(second, json!("from cache hello master yoda"));
}

#[tokio::test]
async fn test_wrappers_nest_in_registration_order() {
    let registry = Registry::new("test");
    registry.define("greet", constant("hello")).unwrap();

    let around = |text: &'static str| {
        Callable::new(move |args: Args| async move {
            let inner = args.proceed().await?;
            resolve(format!("{} {}", inner.as_str().unwrap_or_default(), text))
        })
    };
    registry.wrap("greet", around("john")).unwrap();
    registry.wrap("greet", around("doe")).unwrap();

    let result = registry.invoke("greet", ()).await.unwrap();
    assert_eq!(result, json!("hello john doe"));
}

#[tokio::test]
async fn test_missing_hook_fails_before_middleware() {
    let registry = Registry::new("test");
    let log = EventLog::new();
    registry.subscribe(log.registry_listener());
    registry
        .before("ghost", Callable::from_fn(|_| panic!("before must not run")))
        .unwrap();

    let err = registry.invoke("ghost", "x").await.unwrap_err();
    match &err {
        CmndsError::HookNotFound { hook } => assert_eq!(hook, "ghost"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), Some(404));
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_middleware_attached_before_definition() {
    let registry = Registry::new("test");
    registry.after("late", suffix("!")).unwrap();
    registry.define("late", constant("defined")).unwrap();

    assert_eq!(registry.invoke("late", ()).await.unwrap(), json!("defined!"));
}

#[tokio::test]
async fn test_step_errors_propagate_unchanged() {
    let registry = Registry::new("test");
    registry
        .define("op", Callable::from_fn(|_| cmnds::reject("disk on fire")))
        .unwrap();
    registry
        .after("op", Callable::from_fn(|_| panic!("after must not run")))
        .unwrap();

    let err = registry.invoke("op", ()).await.unwrap_err();
    assert!(matches!(err, CmndsError::Step(_)));
    assert_eq!(err.to_string(), "disk on fire");
}

#[tokio::test]
async fn test_new_middleware_invalidates_cached_pipeline() {
    let registry = Registry::new("test");
    registry.define("op", constant("core")).unwrap();

    assert_eq!(registry.invoke("op", ()).await.unwrap(), json!("core"));
    assert!(registry.is_cached("op"));

    registry.before("op", constant("ignored")).unwrap();
    assert!(!registry.is_cached("op"));
    registry.after("op", suffix("+after")).unwrap();

    assert_eq!(
        registry.invoke("op", ()).await.unwrap(),
        json!("core+after")
    );
}

#[tokio::test]
async fn test_redefinition_replaces_implementation() {
    let registry = Registry::new("test");
    registry.define("op", constant("first")).unwrap();
    registry.invoke("op", ()).await.unwrap();

    registry.define("op", constant("second")).unwrap();
    assert_eq!(registry.invoke("op", ()).await.unwrap(), json!("second"));
}

#[tokio::test]
async fn test_remove_drops_hook_and_middleware() {
    let registry = Registry::new("test");
    registry.define("op", constant("a")).unwrap();
    registry.before("op", constant("b")).unwrap();
    registry.wrap("op", caching_wrapper()).unwrap();

    let removed = registry.remove("op").unwrap();
    assert_eq!(removed.name(), "op");
    assert!(!registry.has("op"));
    assert!(registry.middleware(Role::Before, "op").is_empty());
    assert!(registry.middleware(Role::Wrap, "op").is_empty());
    assert!(registry.remove("op").is_none());

    let err = registry.invoke("op", ()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_events_follow_invocation() {
    let registry = Registry::new("test");
    let log = EventLog::new();
    registry.subscribe(log.registry_listener());

    registry.define("op", constant("x")).unwrap();
    let token = registry.after("op", Callable::from_fn(|_| resolve(7))).unwrap();
    registry.invoke("op", [json!(1), json!(2)]).await.unwrap();
    assert!(token.remove());
    registry.remove("op");

    assert_eq!(
        log.entries(),
        vec!["pre:op:2", "post:op:7", "detached:op:after", "removed:op"]
    );
}

#[test]
fn test_reset_clears_hooks_and_subscriptions() {
    let registry = Registry::new("test");
    registry.subscribe(|_| {});
    registry.define("a", constant("a")).unwrap();
    registry.define("b", constant("b")).unwrap();
    assert_eq!(registry.names(), vec!["a", "b"]);

    registry.reset();
    assert!(registry.names().is_empty());
    assert_eq!(registry.subscribers(), 0);
}

#[test]
fn test_definition_options_are_kept() {
    let registry = Registry::new("test");
    let mut options = cmnds::Options::new();
    options.insert("cache".into(), json!(true));
    registry
        .define_with("op", constant("a"), options.clone())
        .unwrap();

    let definition = registry.definition("op").unwrap();
    assert_eq!(definition.options(), &options);

    registry
        .attach(Role::After, "op", suffix("!"), options.clone())
        .unwrap();
    let entries = registry.middleware(Role::After, "op");
    assert_eq!(entries[0].role(), Role::After);
    assert_eq!(entries[0].options(), &options);
}
