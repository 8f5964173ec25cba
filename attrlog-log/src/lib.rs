//! # `attrlog-log`
//!
//! Installs an [`attrlog::Logger`] as the backend of the [`log`] facade.
//!
//! Each enabled [`log::Record`] becomes one [`LogEntry`](attrlog::LogEntry): the record's level is mapped onto the
//! [`Level`] scale, its formatted arguments become the message, and its target plus structured key-values become the
//! state pairs. Scopes begun on the wrapped logger are captured as usual.
//!
//! | `log` | `attrlog` |
//! |---|---|
//! | `Error` | [`Level::Error`] |
//! | `Warn` | [`Level::Warning`] |
//! | `Info` | [`Level::Information`] |
//! | `Debug` | [`Level::Debug`] |
//! | `Trace` | [`Level::Trace`] |
//!
//! ```rust
//! use attrlog::{Level, Logger, WriterSink};
//!
//! let logger = Logger::builder().level(Level::Debug).sink(WriterSink::stderr()).build();
//! attrlog_log::init(logger).unwrap();
//!
//! log::info!(port = 8080; "listening");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use attrlog::{EventId, Level, Log as _, Logger, Value};
use log::kv::{self, VisitSource};

/// The pair name under which a record's target is exposed.
pub const TARGET: &str = "Target";

/// A [`log::Log`] implementation forwarding records to a [`Logger`].
#[derive(Clone, Debug)]
pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    /// Creates a bridge forwarding to `logger`.
    pub fn new(logger: impl Into<Arc<Logger>>) -> Self {
        Self {
            logger: logger.into(),
        }
    }

    /// The logger records are forwarded to.
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// The most verbose `log` level the wrapped logger currently accepts.
    pub fn max_level(&self) -> log::LevelFilter {
        max_level(self.logger.level())
    }
}

/// Installs `logger` as the global `log` backend.
///
/// # Errors
///
/// Returns an error if a logger has already been set.
pub fn init(logger: impl Into<Arc<Logger>>) -> Result<(), log::SetLoggerError> {
    let bridge = LogBridge::new(logger);
    log::set_max_level(bridge.max_level());
    log::set_boxed_logger(Box::new(bridge))
}

/// Maps a `log` level onto the severity scale.
pub fn level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warning,
        log::Level::Info => Level::Information,
        log::Level::Debug => Level::Debug,
        log::Level::Trace => Level::Trace,
    }
}

/// The most verbose `log` level enabled by `minimum`.
pub fn max_level(minimum: Level) -> log::LevelFilter {
    match minimum {
        Level::Trace => log::LevelFilter::Trace,
        Level::Debug => log::LevelFilter::Debug,
        Level::Information => log::LevelFilter::Info,
        Level::Warning => log::LevelFilter::Warn,
        Level::Error => log::LevelFilter::Error,
        // `log` has no level at or above `Critical`.
        Level::Critical | Level::Disabled => log::LevelFilter::Off,
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.is_enabled(level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }

        let mut pairs = Pairs(vec![(
            Cow::Borrowed(TARGET),
            Value::from(record.target().to_owned()),
        )]);
        // Collection itself never fails, a failing source just contributes fewer pairs.
        let _ = record.key_values().visit(&mut pairs);

        let message = record.args().to_string();
        self.logger.log(
            level(record.level()),
            EventId::default(),
            Value::from(pairs.0),
            None,
            move |_, _| message.clone(),
        );
    }

    fn flush(&self) {}
}

struct Pairs(Vec<(Cow<'static, str>, Value)>);

impl<'kvs> VisitSource<'kvs> for Pairs {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.0.push((Cow::Owned(key.as_str().to_owned()), convert(&value)));
        Ok(())
    }
}

fn convert(value: &kv::Value<'_>) -> Value {
    if let Some(value) = value.to_bool() {
        Value::Bool(value)
    } else if let Some(value) = value.to_i64() {
        Value::I64(value)
    } else if let Some(value) = value.to_u64() {
        Value::U64(value)
    } else if let Some(value) = value.to_f64() {
        Value::F64(value)
    } else if let Some(value) = value.to_borrowed_str() {
        Value::from(value.to_owned())
    } else {
        Value::from(value.to_string())
    }
}
