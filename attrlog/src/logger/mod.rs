//! The logging boundary.
//!
//! [`Log`] is the contract a host logger implements: level enablement, deferred log calls and scopes. [`Logger`] is
//! the implementation shipped with this crate; it captures each enabled call as a [`LogEntry`] and hands it to its
//! [`Sink`].
//!
//! # Scopes
//!
//! [`Log::begin_scope`] pushes a frame onto the calling flow's active chain and returns a [`ScopeGuard`]. Every entry
//! logged while the guard is alive carries the chain. Each thread, and each future wrapped with
//! [`FutureExt`](crate::FutureExt), has its own chain per logger.
//!
//! ```rust
//! use attrlog::{Level, Log, LogExt, Logger, MemorySink, attributes};
//!
//! let (sink, entries) = MemorySink::new();
//! let logger = Logger::builder().level(Level::Debug).sink(sink).build();
//!
//! {
//!     let _scope = logger.begin_scope("request 42").unwrap();
//!     logger
//!         .log_template(Level::Information, 0, None, "Hello, {Who}!", attributes!(Who = "world"))
//!         .unwrap();
//! }
//! logger.log(Level::Trace, 0.into(), "ignored", None, |state, _| state.to_string());
//!
//! let entries = entries.lock().unwrap();
//! assert_eq!(entries.len(), 1);
//! assert!(entries[0].has_message("Hello, world!"));
//! assert!(entries[0].has_scope_value("request 42"));
//! ```

pub(crate) mod context;

use std::error::Error as StdError;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

pub use self::context::ScopeGuard;
use self::context::LoggerId;
use crate::entry::SharedError;
use crate::scope::ScopeChain;
use crate::sink::{NopSink, Sink};
use crate::{Error, EventId, Level, LogAttributes, LogEntry, Template, Value};

/// A host logger.
pub trait Log {
    /// Whether entries at `level` are recorded.
    fn is_enabled(&self, level: Level) -> bool;

    /// Records an entry if `level` is enabled.
    ///
    /// `formatter` produces the message from `state` and `error`; it is only called when the message is observed.
    fn log<S, F>(
        &self,
        level: Level,
        event_id: EventId,
        state: S,
        error: Option<SharedError>,
        formatter: F,
    ) where
        S: Into<Value> + Clone + Send + Sync + 'static,
        F: Fn(&S, Option<&SharedError>) -> String + Send + Sync + 'static;

    /// Begins a scope with `state` on the calling flow.
    ///
    /// Returns `Ok(None)` when the logger does not track scopes. Fails with [`Error::InvalidArgument`] if `state` is
    /// [`Value::Null`].
    fn begin_scope(&self, state: impl Into<Value>) -> Result<Option<ScopeGuard>, Error>;
}

/// Templated log calls and scope helpers for any [`Log`].
pub trait LogExt: Log {
    /// Logs a [`Template`] built from `format` and `pairs`.
    ///
    /// The message is `format` with its placeholders substituted. Fails with [`Error::InvalidArgument`] if `format`
    /// is empty or whitespace, whether or not `level` is enabled.
    fn log_template<I, K, V>(
        &self,
        level: Level,
        event_id: impl Into<EventId>,
        error: Option<SharedError>,
        format: &str,
        pairs: I,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<std::borrow::Cow<'static, str>>,
        V: Into<Value>,
    {
        if format.trim().is_empty() {
            return Err(Error::blank("format"));
        }
        if !self.is_enabled(level) {
            return Ok(());
        }

        let template = Template::new(format, pairs)?;
        self.log(
            level,
            event_id.into(),
            template,
            error,
            |template, error| {
                template.format_message(error.map(|error| &**error as &(dyn StdError + 'static)))
            },
        );
        Ok(())
    }

    /// Begins a scope whose state is `pairs`.
    ///
    /// Returns `Ok(None)` without beginning a scope if `pairs` is empty.
    fn begin_scope_pairs<I, K, V>(&self, pairs: I) -> Result<Option<ScopeGuard>, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<std::borrow::Cow<'static, str>>,
        V: Into<Value>,
    {
        let pairs: Vec<(std::borrow::Cow<'static, str>, Value)> = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        if pairs.is_empty() {
            return Ok(None);
        }
        self.begin_scope(pairs)
    }

    /// Begins a scope whose state is a [`Template`].
    ///
    /// The raw format is flattened as `Scope.OriginalFormat`.
    fn begin_scope_template<I, K, V>(
        &self,
        format: &str,
        pairs: I,
    ) -> Result<Option<ScopeGuard>, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<std::borrow::Cow<'static, str>>,
        V: Into<Value>,
    {
        self.begin_scope(Template::new(format, pairs)?)
    }
}

impl<L: Log + ?Sized> LogExt for L {}

/// Configuration for a [`Logger`], usually deserialized from a file.
///
/// ```rust
/// use attrlog::{Level, LoggerConfig};
///
/// let config: LoggerConfig = toml::from_str(r#"level = "warn""#).unwrap();
/// assert_eq!(config.level, Level::Warning);
/// assert!(config.include_scopes);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum enabled level, as a name or a raw value in `0..=6`.
    pub level: Level,
    /// Whether scopes are tracked.
    pub include_scopes: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Information,
            include_scopes: true,
        }
    }
}

/// A logger that captures enabled calls as [`LogEntry`]s and writes them to a [`Sink`].
#[derive(Debug)]
pub struct Logger {
    id: LoggerId,
    level: AtomicU8,
    include_scopes: bool,
    sink: Box<dyn Sink + Send + Sync>,
}

impl Logger {
    /// Creates a builder with the default configuration and a [`NopSink`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The minimum enabled level.
    pub fn level(&self) -> Level {
        // Only valid levels are ever stored.
        Level::from_raw(self.level.load(Ordering::Relaxed).into()).unwrap_or(Level::Disabled)
    }

    /// Changes the minimum enabled level.
    pub fn set_level(&self, level: Level) {
        let previous = self.level.swap(level.to_raw(), Ordering::Relaxed);
        tracing::debug!(previous, level = %level, "logger level changed");
    }

    /// Changes the minimum enabled level from a raw value.
    ///
    /// Fails with [`Error::LevelOutOfRange`] unless `raw` is in `0..=6`.
    pub fn set_level_raw(&self, raw: i64) -> Result<(), Error> {
        self.set_level(Level::from_raw(raw)?);
        Ok(())
    }

    /// Whether scopes are tracked.
    pub fn include_scopes(&self) -> bool {
        self.include_scopes
    }

    /// The calling flow's active scope chain, nearest first.
    pub fn current_scope(&self) -> ScopeChain {
        context::current(self.id)
    }

    /// Runs `f` with `chain` as the calling flow's active scope chain.
    ///
    /// This carries a chain captured with [`Logger::current_scope`] onto another thread. Scopes begun inside `f` end
    /// with it, and the previous chain is restored when `f` returns.
    ///
    /// ```rust
    /// use std::thread;
    ///
    /// use attrlog::{Log, Logger};
    ///
    /// let logger = Logger::default();
    /// let _scope = logger.begin_scope("request 42").unwrap();
    /// let chain = logger.current_scope();
    ///
    /// thread::scope(|s| {
    ///     s.spawn(|| logger.in_scope(chain, || assert_eq!(logger.current_scope().len(), 1)));
    /// });
    /// ```
    pub fn in_scope<R>(&self, chain: ScopeChain, f: impl FnOnce() -> R) -> R {
        let mut chain = chain;
        let _active = context::Activated::new(self.id, &mut chain);
        f()
    }

    /// The sink entries are written to.
    pub fn sink(&self) -> &(dyn Sink + Send + Sync) {
        &*self.sink
    }

    pub(crate) fn id(&self) -> LoggerId {
        self.id
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        context::forget(self.id);
    }
}

impl Log for Logger {
    fn is_enabled(&self, level: Level) -> bool {
        level.is_enabled_for(self.level())
    }

    fn log<S, F>(
        &self,
        level: Level,
        event_id: EventId,
        state: S,
        error: Option<SharedError>,
        formatter: F,
    ) where
        S: Into<Value> + Clone + Send + Sync + 'static,
        F: Fn(&S, Option<&SharedError>) -> String + Send + Sync + 'static,
    {
        if !self.is_enabled(level) {
            return;
        }

        let scope = if self.include_scopes {
            self.current_scope()
        } else {
            ScopeChain::default()
        };
        let attributes = LogAttributes::from_parts(state.clone().into(), scope);
        let message_error = error.clone();
        let message = move || formatter(&state, message_error.as_ref());

        self.sink
            .write(LogEntry::new(level, event_id, message, attributes, error));
    }

    fn begin_scope(&self, state: impl Into<Value>) -> Result<Option<ScopeGuard>, Error> {
        let state = state.into();
        if state.is_null() {
            return Err(Error::null("state"));
        }
        if !self.include_scopes {
            return Ok(None);
        }

        let chain = self.current_scope().push_frame(state);
        let Some(frame) = chain.head().cloned() else {
            return Ok(None);
        };
        context::replace(self.id, chain);
        Ok(Some(ScopeGuard::new(self.id, frame)))
    }
}

/// Builder for a [`Logger`].
#[derive(Debug, Default)]
#[must_use]
pub struct Builder {
    config: LoggerConfig,
    sink: Option<Box<dyn Sink + Send + Sync>>,
}

impl Builder {
    /// Sets the minimum enabled level, [`Level::Information`] by default.
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Sets whether scopes are tracked, `true` by default.
    pub fn include_scopes(mut self, include_scopes: bool) -> Self {
        self.config.include_scopes = include_scopes;
        self
    }

    /// Applies a whole configuration.
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the sink entries are written to, a [`NopSink`] by default.
    pub fn sink(mut self, sink: impl Sink + Send + Sync + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Builds the logger.
    pub fn build(self) -> Logger {
        Logger {
            id: LoggerId::next_id(),
            level: AtomicU8::new(self.config.level.to_raw()),
            include_scopes: self.config.include_scopes,
            sink: self.sink.unwrap_or_else(|| Box::new(NopSink)),
        }
    }
}
