//! Integration tests for the config service.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use config_service::config::{
    AnySchema, Config, ConfigError, ConfigService, ConfigSource, Env, FieldError, FnSchema,
    ValidationContext,
};
use config_service::namespaces::{server_schema, ServerConfig};
use futures_util::StreamExt;
use serde_json::{json, Value};

mod common;

use common::{service_with, stays_pending, within};

/// Accepts an object whose `port` is a number and returns it unchanged.
fn port_schema() -> FnSchema<
    impl Fn(Option<&Value>, &ValidationContext) -> Result<Value, Vec<FieldError>> + Send + Sync,
> {
    FnSchema::new(|raw: Option<&Value>, _ctx: &ValidationContext| match raw {
        Some(value) if value.get("port").map_or(false, Value::is_number) => Ok(value.clone()),
        _ => Err(vec![FieldError::new("port", "expected value of type [number]")]),
    })
}

#[tokio::test]
async fn test_server_scenario() {
    let (source, service) = service_with(json!({
        "server": { "port": 9200, "ssl": { "enabled": false } }
    }));
    service.set_schema("server", port_schema()).await.unwrap();

    let mut server = service.at_path::<Value>("server");
    let first = within(server.next()).await.unwrap().unwrap();
    assert_eq!(first, json!({ "port": 9200, "ssl": { "enabled": false } }));

    // Same `server` subtree, change elsewhere: no second emission.
    source.publish(Config::new(json!({
        "server": { "port": 9200, "ssl": { "enabled": false } },
        "logging": { "level": "debug" }
    })));
    assert!(stays_pending(server.next()).await);

    // Everything under `server` counts as used.
    let unused = service.get_unused_paths().await.unwrap();
    assert_eq!(unused, vec!["logging.level"]);
    assert!(unused.iter().all(|path| !path.starts_with("server")));
    assert_eq!(
        service.get_used_paths().await.unwrap(),
        vec!["server.port", "server.ssl.enabled"]
    );
}

#[tokio::test]
async fn test_at_path_emits_once_per_distinct_value() {
    let (source, service) = service_with(json!({ "a": { "b": 1 } }));
    service.set_schema("a", AnySchema).await.unwrap();

    let mut sub = service.at_path::<Value>("a");
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), json!({ "b": 1 }));

    source.publish(Config::new(json!({ "a": { "b": 1 } })));
    assert!(stays_pending(sub.next()).await);

    source.publish(Config::new(json!({ "a": { "b": 2 } })));
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), json!({ "b": 2 }));
}

#[tokio::test]
async fn test_at_path_emits_typed_normalized_value() {
    let (source, service) = service_with(json!({ "server": { "port": 9200 } }));
    service.set_schema("server", server_schema()).await.unwrap();

    let mut sub = service.at_path::<ServerConfig>("server");
    let server = within(sub.next()).await.unwrap().unwrap();
    assert_eq!(server.port, 9200);
    assert_eq!(server.host, "localhost");

    source.publish(Config::new(json!({ "server": { "port": 9300 } })));
    let server = within(sub.next()).await.unwrap().unwrap();
    assert_eq!(server.port, 9300);
}

#[tokio::test]
async fn test_duplicate_schema_fails_and_first_stays_active() {
    let (_source, service) = service_with(json!({ "server": { "port": 9200 } }));
    service.set_schema("server", port_schema()).await.unwrap();

    let err = service.set_schema("server", AnySchema).await.unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateSchema { ref path } if path == "server"));

    // The first registration stays active even if the second would reject the value.
    let (_source, other) = service_with(json!({ "server": { "port": "nope" } }));
    other.set_schema(["server"], AnySchema).await.unwrap();
    assert!(other.set_schema("server", port_schema()).await.is_err());
    let mut sub = other.at_path::<Value>("server");
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), json!({ "port": "nope" }));
}

#[tokio::test]
async fn test_at_path_without_schema_fails() {
    let (_source, service) = service_with(json!({ "a": 1 }));
    let mut sub = service.at_path::<Value>("a");
    let err = within(sub.next()).await.unwrap().unwrap_err();
    assert!(matches!(err, ConfigError::MissingSchema { ref path } if path == "a"));
}

#[tokio::test]
async fn test_set_schema_fails_fast_on_invalid_config() {
    let (_source, service) = service_with(json!({ "server": { "port": 0 } }));
    let err = service.set_schema("server", server_schema()).await.unwrap_err();
    match err {
        ConfigError::Validation(err) => {
            assert_eq!(err.label, "server");
            assert_eq!(err.errors[0].field, "port");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invalid_emission_ends_subscription() {
    let (source, service) = service_with(json!({ "server": { "port": 9200 } }));
    service.set_schema("server", port_schema()).await.unwrap();
    let mut sub = service.at_path::<Value>("server");
    within(sub.next()).await.unwrap().unwrap();

    source.publish(Config::new(json!({ "server": { "port": "x" } })));
    assert!(matches!(
        within(sub.next()).await,
        Some(Err(ConfigError::Validation(_)))
    ));

    source.publish(Config::new(json!({ "server": { "port": 1 } })));
    assert!(within(sub.next()).await.is_none());
}

#[tokio::test]
async fn test_resume_picks_up_change_published_after_error() {
    let (source, service) = service_with(json!({ "server": { "port": 9200 } }));
    service.set_schema("server", port_schema()).await.unwrap();
    let mut sub = service.at_path::<Value>("server");
    within(sub.next()).await.unwrap().unwrap();

    source.publish(Config::new(json!({ "server": { "port": "x" } })));
    assert!(within(sub.next()).await.unwrap().is_err());

    // Fixed before the caller gets around to resuming.
    source.publish(Config::new(json!({ "server": { "port": 9300 } })));
    sub.resume();
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), json!({ "port": 9300 }));
}

#[tokio::test]
async fn test_resume_waits_for_a_different_value() {
    let (source, service) = service_with(json!({ "server": { "port": "x" } }));
    service.set_schema(["server"], port_schema()).await.unwrap_err();
    let mut sub = service.at_path::<Value>("server");
    assert!(within(sub.next()).await.unwrap().is_err());

    sub.resume();
    source.publish(Config::new(json!({ "server": { "port": "x" } })));
    assert!(stays_pending(sub.next()).await);

    source.publish(Config::new(json!({ "server": { "port": 1 } })));
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), json!({ "port": 1 }));

    drop(source);
    assert!(within(sub.next()).await.is_none());
}

#[tokio::test]
async fn test_dotted_segment_element_addresses_nested_value() {
    let (_source, service) = service_with(json!({ "a": { "b": 1 } }));
    service.set_schema(["a.b"], AnySchema).await.unwrap();

    let err = service.set_schema(["a", "b"], AnySchema).await.unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateSchema { ref path } if path == "a.b"));

    let mut sub = service.at_path::<Value>(["a.b"]);
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), json!(1));
    assert!(service.is_enabled_at_path(["a.b"]).await.unwrap());
    assert_eq!(service.get_used_paths().await.unwrap(), vec!["a.b"]);
}

#[tokio::test]
async fn test_set_schema_waits_for_first_snapshot() {
    let source = ConfigSource::new();
    let service = ConfigService::new(source.subscribe(), Env::development());

    let registering = {
        let service = service.clone();
        tokio::spawn(async move { service.set_schema("a", AnySchema).await })
    };
    tokio::task::yield_now().await;
    assert!(!registering.is_finished());

    source.publish(Config::new(json!({ "a": true })));
    within(registering).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_optional_at_path_skips_validation_when_absent() {
    let (source, service) = service_with(json!({ "other": 1 }));
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    // The startup pass sees `opt` absent and fails; the schema stays registered.
    let schema = FnSchema::new(move |raw: Option<&Value>, _ctx: &ValidationContext| {
        counted.fetch_add(1, Ordering::SeqCst);
        raw.cloned()
            .ok_or_else(|| vec![FieldError::new("", "expected a value")])
    });
    let register = service.set_schema("opt", schema).await;
    assert!(register.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let mut sub = service.optional_at_path::<Value>("opt");
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    source.publish(Config::new(json!({ "other": 1, "opt": { "x": 1 } })));
    assert_eq!(
        within(sub.next()).await.unwrap().unwrap(),
        Some(json!({ "x": 1 }))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    source.publish(Config::new(json!({ "other": 2 })));
    assert_eq!(within(sub.next()).await.unwrap().unwrap(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(service.handled_paths().iter().all(|path| path == "opt"));
}

#[tokio::test]
async fn test_enabled_flag_absent() {
    let (_source, service) = service_with(json!({ "plugins": { "foo": { "x": 1 } } }));
    assert!(service.is_enabled_at_path("plugins.foo").await.unwrap());
    assert_eq!(service.handled_paths(), vec!["plugins.foo"]);
    assert!(service.get_unused_paths().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_enabled_flag_false() {
    let (_source, service) = service_with(json!({
        "plugins": { "foo": { "enabled": false, "x": 1 } }
    }));
    assert!(!service.is_enabled_at_path(["plugins", "foo"]).await.unwrap());
    assert_eq!(service.handled_paths(), vec!["plugins.foo"]);
    assert_eq!(
        service.get_used_paths().await.unwrap(),
        vec!["plugins.foo.enabled", "plugins.foo.x"]
    );
}

#[tokio::test]
async fn test_enabled_flag_true() {
    let (_source, service) = service_with(json!({
        "plugins": { "foo": { "enabled": true, "x": 1 } }
    }));
    assert!(service.is_enabled_at_path("plugins.foo").await.unwrap());
    assert_eq!(service.handled_paths(), vec!["plugins.foo.enabled"]);
    assert_eq!(service.get_unused_paths().await.unwrap(), vec!["plugins.foo.x"]);
}

#[tokio::test]
async fn test_enabled_flag_non_boolean_counts_as_enabled() {
    let (_source, service) = service_with(json!({ "foo": { "enabled": "false" } }));
    assert!(service.is_enabled_at_path("foo").await.unwrap());
    assert_eq!(service.handled_paths(), vec!["foo.enabled"]);
}

#[tokio::test]
async fn test_used_paths_follow_segment_prefixes() {
    let (_source, service) = service_with(json!({
        "a": { "b": { "c": 1 }, "c": 2, "bc": 3 }
    }));
    service.set_schema("a.b", AnySchema).await.unwrap();

    let used = service.get_used_paths().await.unwrap();
    assert!(used.contains(&"a.b.c".to_string()));
    assert!(!used.contains(&"a.c".to_string()));
    assert!(!used.contains(&"a.bc".to_string()));
}

async fn assert_partition(service: &ConfigService, all: &BTreeSet<String>) {
    let used = service.get_used_paths().await.unwrap();
    let unused = service.get_unused_paths().await.unwrap();
    let used_set: BTreeSet<String> = used.iter().cloned().collect();
    let unused_set: BTreeSet<String> = unused.iter().cloned().collect();
    assert!(used_set.is_disjoint(&unused_set));
    assert_eq!(&(&used_set | &unused_set), all);
    assert_eq!(used.len() + unused.len(), all.len());
}

#[tokio::test]
async fn test_used_and_unused_partition_flattened_paths() {
    let raw = json!({
        "server": { "port": 1, "ssl": { "enabled": true, "key": "k" } },
        "logging": { "level": "info", "appenders": ["console"] },
        "plugins": { "foo": { "enabled": false }, "bar": { "enabled": true, "x": 1 } }
    });
    let (_source, service) = service_with(raw.clone());
    let all: BTreeSet<String> = Config::new(raw).get_flattened_paths().into_iter().collect();

    assert_partition(&service, &all).await;
    service.is_enabled_at_path("plugins.foo").await.unwrap();
    assert_partition(&service, &all).await;
    service.is_enabled_at_path("plugins.bar").await.unwrap();
    assert_partition(&service, &all).await;
    service.set_schema("server.ssl", AnySchema).await.unwrap();
    assert_partition(&service, &all).await;
    let _logging = service.optional_at_path::<Value>("logging.missing");
    assert_partition(&service, &all).await;
}

#[tokio::test]
async fn test_concurrent_reads_are_all_logged() {
    let (_source, service) = service_with(json!({ "plugins": {} }));

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.is_enabled_at_path(format!("plugins.p{i}")).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap());
    }

    let handled: BTreeSet<String> = service.handled_paths().into_iter().collect();
    assert_eq!(handled.len(), 16);
    assert!(handled.contains("plugins.p7"));
}

#[tokio::test]
async fn test_subscription_as_stream() {
    let (source, service) = service_with(json!({ "a": 1 }));
    service.set_schema("a", AnySchema).await.unwrap();

    let stream = service.at_path::<i64>("a").into_stream();
    tokio::pin!(stream);
    assert_eq!(within(stream.next()).await.unwrap().unwrap(), 1);

    source.publish(Config::new(json!({ "a": 2 })));
    assert_eq!(within(stream.next()).await.unwrap().unwrap(), 2);

    drop(source);
    assert!(within(stream.next()).await.is_none());
}

#[tokio::test]
async fn test_full_config_is_unfiltered() {
    let (source, service) = service_with(json!({ "a": 1 }));
    let mut full = service.get_full_config();
    within(full.next()).await.unwrap();

    source.publish(Config::new(json!({ "a": 1 })));
    let snapshot = within(full.next()).await.unwrap();
    assert_eq!(snapshot.get("a"), Some(&json!(1)));
    assert!(service.handled_paths().is_empty());
}

#[tokio::test]
async fn test_log_unused_paths() {
    let (_source, service) = service_with(json!({ "a": 1, "b": { "c": 2 } }));
    service.set_schema("a", AnySchema).await.unwrap();
    assert_eq!(service.log_unused_paths().await.unwrap(), vec!["b.c"]);
}
