#![expect(missing_docs, reason = "tests")]

use std::borrow::Cow;
use std::sync::Arc;

use attrlog::{
    DEFAULT_CAPACITY, Error, FutureExt, KeyValue, Level, Log, LogAttributes, LogEntry, LogExt,
    Loggable, Logger, LoggerConfig, MatcherCache, MemorySink, Shape, Template, Value, attributes,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serial_test::serial;
use test_case::test_case;
use tokio::runtime::Builder;

#[derive(Debug, PartialEq)]
struct Greeting(Vec<(&'static str, Value)>);

impl Loggable for Greeting {
    fn shape(&self) -> Shape<'_> {
        Shape::pairs(
            self.0
                .iter()
                .map(|(key, value)| (Cow::Borrowed(*key), value.clone())),
        )
    }

    fn label(&self) -> Option<String> {
        Some("Hello world!".to_owned())
    }
}

fn pairs(attributes: &LogAttributes) -> Vec<KeyValue<'static>> {
    attributes.iter().map(KeyValue::into_owned).collect()
}

#[test]
fn renders_mapping_state() {
    let mut state = IndexMap::new();
    state.insert("foo", Value::from("abc"));
    state.insert("bar", Value::from(123));

    let attributes = LogAttributes::with_state(Value::from(state));
    assert_eq!(
        attributes.to_string(),
        "{\n State = { [foo] = abc, [bar] = 123 } \n}"
    );
}

#[test]
fn empty_attributes_render_identically() {
    let explicit = LogAttributes::new(Value::Null, Vec::<Value>::new()).unwrap();
    assert_eq!(explicit.to_string(), "{ }");
    assert_eq!(LogAttributes::default().to_string(), explicit.to_string());
}

#[test]
fn labelled_state_flattens_to_three_pairs() {
    let state = Value::object(Greeting(vec![
        ("foo", Value::from("abc")),
        ("bar", Value::from(123)),
    ]));
    let attributes = LogAttributes::with_state(state);

    let expected = vec![
        KeyValue::new("State", "Hello world!"),
        KeyValue::new("foo", "abc"),
        KeyValue::new("bar", 123),
    ];
    assert_eq!(pairs(&attributes), expected);
    // Flattening is recomputed and deterministic.
    assert_eq!(pairs(&attributes), expected);
}

#[test]
fn labelled_scopes_are_prefixed_by_depth() {
    let inner = Value::object(Greeting(vec![("foo", Value::from("abc"))]));
    let outer = Value::object(Greeting(vec![("baz", Value::from("xyz"))]));
    let attributes = LogAttributes::new(Value::Null, [inner, outer]).unwrap();

    assert_eq!(
        pairs(&attributes),
        vec![
            KeyValue::new("Scope", "Hello world!"),
            KeyValue::new("foo", "abc"),
            KeyValue::new("Scope.ParentScope", "Hello world!"),
            KeyValue::new("baz", "xyz"),
        ]
    );
}

#[test]
fn sequences_and_nulls() {
    let state = Value::from(vec![Value::from("abc"), Value::Null, Value::from(7)]);
    let attributes = LogAttributes::new(state, [Value::from(vec![Value::from(true)])]).unwrap();

    assert_eq!(
        pairs(&attributes),
        vec![
            KeyValue::new("State[0]", "abc"),
            KeyValue::new("State[1]", ""),
            KeyValue::new("State[2]", 7),
            KeyValue::new("Scope[0]", true),
        ]
    );
}

#[test]
fn null_scope_is_rejected() {
    assert_eq!(
        LogAttributes::new("state", [Value::from("ok"), Value::Null]).unwrap_err(),
        Error::InvalidArgument {
            name: "scope",
            reason: "must not be null"
        }
    );
}

#[test]
fn out_of_order_release_drains_chain() {
    let logger = Logger::default();
    let mut p1 = logger.begin_scope("p1").unwrap().unwrap();
    let mut p2 = logger.begin_scope("p2").unwrap().unwrap();
    assert_eq!(logger.current_scope().len(), 2);

    p1.release();
    assert!(logger.current_scope().is_empty());

    p2.release();
    assert!(logger.current_scope().is_empty());

    let _p3 = logger.begin_scope("p3").unwrap();
    assert_eq!(logger.current_scope().len(), 1);
}

#[test]
fn default_entry_queries_report_absence() {
    let entry = LogEntry::default();

    assert!(entry.is_trace());
    assert!(entry.has_event_id(0));
    assert!(!entry.has_message("anything"));
    assert!(!entry.has_message_where(|_| panic!("predicate must not run")));
    assert!(!entry.has_message_matching(".+").unwrap());
    assert!(!entry.has_attribute("State"));
    assert!(!entry.has_attribute_value("State", "x").unwrap());
    assert!(!entry.has_attribute_where("State", |_| true));
    assert!(entry.has_no_state());
    assert!(!entry.has_state());
    assert!(entry.has_no_scope());
    assert!(!entry.has_scope());
    assert!(!entry.has_scope_where(|_| true));
    assert!(entry.has_no_error());
    assert!(!entry.has_error());
    assert!(entry.has_error_ref(None));
    assert_eq!(entry.to_string(), "{\n Level = Trace \n}");
}

#[test]
fn repeated_key_set_reuses_matcher() {
    let cache = MatcherCache::new(DEFAULT_CAPACITY);
    let template = Template::new("Hello, {Who}!", attributes!(Who = "world")).unwrap();

    assert_eq!(template.format_message_with(&cache, None), "Hello, world!");
    assert_eq!(cache.compilations(), 1);

    let again = Template::new("Goodbye, {Who}.", attributes!(Who = "moon")).unwrap();
    assert_eq!(again.format_message_with(&cache, None), "Goodbye, moon.");
    assert_eq!(cache.compilations(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
#[serial]
fn global_cache_compiles_once_per_key_set() {
    let cache = MatcherCache::global();
    let template = Template::new(
        "{GlobalCacheKey}",
        attributes!(GlobalCacheKey = "first"),
    )
    .unwrap();

    assert_eq!(template.format_message(None), "first");
    let compiled = cache.compilations();
    assert_eq!(template.format_message(None), "first");
    assert_eq!(cache.compilations(), compiled);
}

#[test]
#[serial]
fn templated_entry_attributes() {
    let (sink, entries) = MemorySink::new();
    let logger = Logger::builder().sink(sink).build();

    logger
        .log_template(
            Level::Information,
            0,
            None,
            "Hello, {Who}!",
            attributes!(Who = "world"),
        )
        .unwrap();

    let entries = entries.lock().unwrap();
    let entry = &entries[0];
    assert!(entry.has_message("Hello, world!"));
    assert!(entry.has_attribute_value("Who", "world").unwrap());
    assert!(!entry.has_attribute_value("Who", "nope").unwrap());
    assert!(entry.has_attribute_value("State", "Hello, world!").unwrap());
    assert!(
        entry
            .has_attribute_value("State.OriginalFormat", "Hello, {Who}!")
            .unwrap()
    );
    assert!(entry.has_state_of(&Template::new("Hello, {Who}!", attributes!(Who = "world")).unwrap()));
}

#[test_case(Level::Trace, false)]
#[test_case(Level::Debug, false)]
#[test_case(Level::Information, false)]
#[test_case(Level::Warning, true)]
#[test_case(Level::Error, true)]
#[test_case(Level::Critical, true)]
#[test_case(Level::Disabled, false)]
fn enablement_with_warning_minimum(level: Level, enabled: bool) {
    let logger = Logger::builder().level(Level::Warning).build();
    assert_eq!(logger.is_enabled(level), enabled);
}

#[test]
fn disabled_is_never_enabled() {
    for minimum in Level::ALL {
        let logger = Logger::builder().level(minimum).build();
        assert!(!logger.is_enabled(Level::Disabled));
    }
}

#[test]
fn config_from_toml() {
    let config: LoggerConfig = toml::from_str(indoc::indoc! {r#"
        level = "Debug"
        include_scopes = false
    "#})
    .unwrap();
    assert_eq!(
        config,
        LoggerConfig {
            level: Level::Debug,
            include_scopes: false,
        }
    );

    let raw: LoggerConfig = toml::from_str("level = 4").unwrap();
    assert_eq!(raw.level, Level::Error);

    assert_eq!(toml::from_str::<LoggerConfig>("").unwrap(), LoggerConfig::default());
    assert!(toml::from_str::<LoggerConfig>("level = 9").is_err());
    assert!(toml::from_str::<LoggerConfig>(r#"level = "verbose""#).is_err());
}

#[test]
#[serial]
fn tasks_keep_their_own_scopes() {
    let (sink, entries) = MemorySink::new();
    let logger = Arc::new(Logger::builder().sink(sink).build());

    let runtime = Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let tasks: Vec<_> = (0..8_i32)
            .map(|task| {
                let logger = logger.clone();
                tokio::spawn(async move {
                    let steps = async {
                        for step in 0..3 {
                            logger
                                .log_template(
                                    Level::Information,
                                    task,
                                    None,
                                    "Step {Step}",
                                    attributes!(Step = step),
                                )
                                .unwrap();
                            tokio::task::yield_now().await;
                        }
                    };
                    steps
                        .with_scope(&logger, format!("task {task}"))
                        .unwrap()
                        .await;
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
    });

    assert!(logger.current_scope().is_empty());

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 24);
    for entry in entries.iter() {
        let expected = format!("task {}", entry.event_id().id());
        assert_eq!(entry.scope().len(), 1);
        assert!(entry.has_scope_value(expected));
    }
}
