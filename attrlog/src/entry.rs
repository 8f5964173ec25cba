//! Immutable log entries and their query surface.
//!
//! A [`LogEntry`] captures one log call: level, event id, a deferred message, the [`LogAttributes`] and an optional
//! error. The message is only produced when observed, through [`LogEntry::message`], a message query or rendering.
//!
//! Queries never fail on a default entry; presence queries report absence and message queries report no match
//! without invoking the supplied predicate.
//!
//! ```rust
//! use attrlog::{Level, LogAttributes, LogEntry, Value, attributes};
//!
//! let state = Value::from(attributes!(Who = "world"));
//! let entry = LogEntry::new(
//!     Level::Information,
//!     0,
//!     || "Hello, world!".to_owned(),
//!     LogAttributes::with_state(state),
//!     None,
//! );
//!
//! assert!(entry.is_information());
//! assert!(entry.has_message("Hello, world!"));
//! assert!(entry.has_attribute_value("Who", "world").unwrap());
//! assert!(!entry.has_attribute_value("Who", "nope").unwrap());
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use regex::RegexBuilder;

use crate::render::{PooledBuffer, append_scopes, append_state};
use crate::scope::ScopeChain;
use crate::value::{Value, ValueType};
use crate::{Error, EventId, Level, LogAttributes};

/// A shared error attached to a log entry.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

type MessageFn = Arc<dyn Fn() -> String + Send + Sync>;

/// How [`LogEntry::has_message_with`] compares strings.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Comparison {
    /// Exact byte-wise equality.
    #[default]
    Exact,
    /// Equality ignoring case.
    IgnoreCase,
}

/// Flags for [`LogEntry::has_message_matching_with`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct MatchOptions {
    /// Match letters regardless of case.
    pub case_insensitive: bool,
    /// `^` and `$` match at line boundaries.
    pub multi_line: bool,
    /// `.` also matches `\n`.
    pub dot_matches_new_line: bool,
    /// Whitespace and `#` comments in the pattern are ignored.
    pub ignore_whitespace: bool,
}

/// A single captured log call.
#[derive(Clone, Default)]
pub struct LogEntry {
    level: Level,
    event_id: EventId,
    message: Option<MessageFn>,
    attributes: LogAttributes,
    error: Option<SharedError>,
}

impl LogEntry {
    /// Creates a log entry.
    ///
    /// `message` is not called here; it runs each time the message is observed.
    pub fn new<M>(
        level: Level,
        event_id: impl Into<EventId>,
        message: M,
        attributes: LogAttributes,
        error: Option<SharedError>,
    ) -> Self
    where
        M: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            level,
            event_id: event_id.into(),
            message: Some(Arc::new(message)),
            attributes,
            error,
        }
    }

    /// The severity level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The event id.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Produces the message, empty for a default entry.
    pub fn message(&self) -> String {
        self.message.as_ref().map(|message| message()).unwrap_or_default()
    }

    /// The state and scope attributes.
    pub fn attributes(&self) -> &LogAttributes {
        &self.attributes
    }

    /// The state value, [`Value::Null`] when absent.
    pub fn state(&self) -> &Value {
        self.attributes.state()
    }

    /// The scope chain, nearest first.
    pub fn scope(&self) -> &ScopeChain {
        self.attributes.scope()
    }

    /// The attached error.
    pub fn error(&self) -> Option<&SharedError> {
        self.error.as_ref()
    }

    /// Whether the level is [`Level::Trace`].
    pub fn is_trace(&self) -> bool {
        self.has_level(Level::Trace)
    }

    /// Whether the level is [`Level::Debug`].
    pub fn is_debug(&self) -> bool {
        self.has_level(Level::Debug)
    }

    /// Whether the level is [`Level::Information`].
    pub fn is_information(&self) -> bool {
        self.has_level(Level::Information)
    }

    /// Whether the level is [`Level::Warning`].
    pub fn is_warning(&self) -> bool {
        self.has_level(Level::Warning)
    }

    /// Whether the level is [`Level::Error`].
    pub fn is_error(&self) -> bool {
        self.has_level(Level::Error)
    }

    /// Whether the level is [`Level::Critical`].
    pub fn is_critical(&self) -> bool {
        self.has_level(Level::Critical)
    }

    /// Whether the level equals `expected`.
    pub fn has_level(&self, expected: Level) -> bool {
        self.level == expected
    }

    /// Whether the level matches `predicate`.
    pub fn has_level_where(&self, predicate: impl FnOnce(Level) -> bool) -> bool {
        predicate(self.level)
    }

    /// Whether the event id equals `expected`, comparing numeric ids only.
    pub fn has_event_id(&self, expected: impl Into<EventId>) -> bool {
        self.event_id == expected.into()
    }

    /// Whether the event id matches `predicate`.
    pub fn has_event_id_where(&self, predicate: impl FnOnce(&EventId) -> bool) -> bool {
        predicate(&self.event_id)
    }

    /// Whether the message equals `expected`.
    pub fn has_message(&self, expected: &str) -> bool {
        self.has_message_with(expected, Comparison::Exact)
    }

    /// Whether the message equals `expected` under `comparison`.
    pub fn has_message_with(&self, expected: &str, comparison: Comparison) -> bool {
        let Some(message) = &self.message else {
            return false;
        };
        let message = message();
        match comparison {
            Comparison::Exact => message == expected,
            Comparison::IgnoreCase => message
                .chars()
                .flat_map(char::to_lowercase)
                .eq(expected.chars().flat_map(char::to_lowercase)),
        }
    }

    /// Whether the message matches `predicate`.
    ///
    /// A default entry has no message, so `predicate` is not called.
    pub fn has_message_where(&self, predicate: impl FnOnce(&str) -> bool) -> bool {
        self.message
            .as_ref()
            .is_some_and(|message| predicate(&message()))
    }

    /// Whether the message matches the regular expression `pattern`.
    ///
    /// Fails with [`Error::InvalidPattern`] if `pattern` does not compile.
    pub fn has_message_matching(&self, pattern: &str) -> Result<bool, Error> {
        self.has_message_matching_with(pattern, MatchOptions::default())
    }

    /// Whether the message matches the regular expression `pattern` compiled with `options`.
    ///
    /// Fails with [`Error::InvalidPattern`] if `pattern` does not compile.
    pub fn has_message_matching_with(
        &self,
        pattern: &str,
        options: MatchOptions,
    ) -> Result<bool, Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(options.case_insensitive)
            .multi_line(options.multi_line)
            .dot_matches_new_line(options.dot_matches_new_line)
            .ignore_whitespace(options.ignore_whitespace)
            .build()?;

        Ok(self
            .message
            .as_ref()
            .is_some_and(|message| regex.is_match(&message())))
    }

    /// Whether any attribute is named `key`.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.iter().any(|attribute| attribute.key == key)
    }

    /// Whether an attribute named `key` equals `expected`.
    ///
    /// Fails with [`Error::InvalidArgument`] if `expected` is [`Value::Null`].
    pub fn has_attribute_value(&self, key: &str, expected: impl Into<Value>) -> Result<bool, Error> {
        let expected = expected.into();
        if expected.is_null() {
            return Err(Error::null("value"));
        }
        Ok(self
            .attributes
            .iter()
            .any(|attribute| attribute.key == key && attribute.value == expected))
    }

    /// Whether an attribute named `key` holds a `T` equal to `expected`.
    pub fn has_attribute_of<T>(&self, key: &str, expected: &T) -> bool
    where
        T: ValueType + PartialEq + ?Sized,
    {
        self.attributes.iter().any(|attribute| {
            attribute.key == key && T::from_value(&attribute.value).is_some_and(|value| value == expected)
        })
    }

    /// Whether an attribute named `key` matches `predicate`.
    pub fn has_attribute_where(&self, key: &str, mut predicate: impl FnMut(&Value) -> bool) -> bool {
        self.attributes
            .iter()
            .any(|attribute| attribute.key == key && predicate(&attribute.value))
    }

    /// Whether an attribute named `key` holds a `T` matching `predicate`.
    pub fn has_attribute_where_of<T>(&self, key: &str, mut predicate: impl FnMut(&T) -> bool) -> bool
    where
        T: ValueType + ?Sized,
    {
        self.attributes.iter().any(|attribute| {
            attribute.key == key && T::from_value(&attribute.value).is_some_and(&mut predicate)
        })
    }

    /// Whether the entry was made without state.
    pub fn has_no_state(&self) -> bool {
        self.state().is_null()
    }

    /// Whether the entry was made with state.
    pub fn has_state(&self) -> bool {
        !self.has_no_state()
    }

    /// Whether the state equals `expected`; [`Value::Null`] only matches an absent state.
    pub fn has_state_value(&self, expected: impl Into<Value>) -> bool {
        *self.state() == expected.into()
    }

    /// Whether the state is a `T` equal to `expected`.
    pub fn has_state_of<T>(&self, expected: &T) -> bool
    where
        T: ValueType + PartialEq + ?Sized,
    {
        T::from_value(self.state()).is_some_and(|state| state == expected)
    }

    /// Whether the state matches `predicate`, which receives [`Value::Null`] when there is no state.
    pub fn has_state_where(&self, predicate: impl FnOnce(&Value) -> bool) -> bool {
        predicate(self.state())
    }

    /// Whether the state is a `T` matching `predicate`.
    ///
    /// Returns `false` without calling `predicate` if the state is not a `T`.
    pub fn has_state_where_of<T>(&self, predicate: impl FnOnce(&T) -> bool) -> bool
    where
        T: ValueType + ?Sized,
    {
        T::from_value(self.state()).is_some_and(predicate)
    }

    /// Whether the entry was made without any active scope.
    pub fn has_no_scope(&self) -> bool {
        self.scope().is_empty()
    }

    /// Whether the entry was made with at least one active scope.
    pub fn has_scope(&self) -> bool {
        !self.has_no_scope()
    }

    /// Whether any scope state equals `expected`; [`Value::Null`] only matches an empty chain.
    pub fn has_scope_value(&self, expected: impl Into<Value>) -> bool {
        let expected = expected.into();
        if expected.is_null() {
            return self.has_no_scope();
        }
        self.scope().states().any(|state| *state == expected)
    }

    /// Whether any scope state is a `T` equal to `expected`.
    pub fn has_scope_of<T>(&self, expected: &T) -> bool
    where
        T: ValueType + PartialEq + ?Sized,
    {
        self.scope()
            .states()
            .any(|state| T::from_value(state).is_some_and(|state| state == expected))
    }

    /// Whether any scope state matches `predicate`, nearest first, stopping at the first match.
    pub fn has_scope_where(&self, predicate: impl FnMut(&Value) -> bool) -> bool {
        self.scope().states().any(predicate)
    }

    /// Whether any scope state is a `T` matching `predicate`.
    pub fn has_scope_where_of<T>(&self, mut predicate: impl FnMut(&T) -> bool) -> bool
    where
        T: ValueType + ?Sized,
    {
        self.scope()
            .states()
            .any(|state| T::from_value(state).is_some_and(&mut predicate))
    }

    /// Whether the entry was made without an error.
    pub fn has_no_error(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the entry was made with an error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the error is an `E`.
    pub fn has_error_of<E: StdError + 'static>(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|error| error.downcast_ref::<E>().is_some())
    }

    /// Whether the error is the same allocation as `expected`; two absent errors match.
    pub fn has_error_ref(&self, expected: Option<&SharedError>) -> bool {
        match (&self.error, expected) {
            (None, None) => true,
            (Some(error), Some(expected)) => Arc::ptr_eq(error, expected),
            _ => false,
        }
    }

    /// Whether the error matches `predicate`, which receives `None` when there is no error.
    pub fn has_error_where(
        &self,
        predicate: impl FnOnce(Option<&(dyn StdError + Send + Sync + 'static)>) -> bool,
    ) -> bool {
        predicate(self.error.as_deref())
    }

    /// Whether the error is an `E` matching `predicate`.
    ///
    /// Returns `false` without calling `predicate` if there is no error or it is not an `E`.
    pub fn has_error_where_of<E: StdError + 'static>(&self, predicate: impl FnOnce(&E) -> bool) -> bool {
        self.error
            .as_deref()
            .and_then(|error| error.downcast_ref::<E>())
            .is_some_and(predicate)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write;

        let mut buffer = PooledBuffer::get();
        let _ = write!(buffer, "{{\n Level = {}", self.level);

        if self.event_id.id() != 0 {
            let _ = write!(buffer, ",\n EventId = {}", self.event_id);
        }

        // A blank message is treated as absent.
        let message = self.message();
        let message = if message.trim().is_empty() {
            None
        } else {
            let _ = write!(buffer, ",\n Message = {message}");
            Some(message)
        };

        if self.has_state() {
            buffer.push_str(",\n State = ");
            append_state(&mut buffer, self.state(), message.as_deref());
        }

        append_scopes(&mut buffer, self.scope(), ",\n ");

        if let Some(error) = &self.error {
            let _ = write!(buffer, ",\n Error = {error}");
        }

        buffer.push_str(" \n}");
        f.write_str(&buffer)
    }
}

impl fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEntry")
            .field("level", &self.level)
            .field("event_id", &self.event_id)
            .field("message", &self.message.as_ref().map(|message| message()))
            .field("attributes", &self.attributes)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::attributes;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct ConnectionError;

    #[derive(Debug, thiserror::Error)]
    #[error("timed out")]
    struct TimeoutError;

    fn entry() -> LogEntry {
        let attributes = LogAttributes::new(
            Value::from(attributes!(foo = "abc", bar = 123)),
            ["request", "session"],
        )
        .unwrap();
        LogEntry::new(
            Level::Warning,
            EventId::named(12, "slow"),
            || "Hello, world!".to_owned(),
            attributes,
            Some(Arc::new(ConnectionError)),
        )
    }

    #[test]
    fn message_is_deferred() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let entry = LogEntry::new(
            Level::Debug,
            0,
            move || {
                counter.fetch_add(1, Ordering::Relaxed);
                "lazy".to_owned()
            },
            LogAttributes::default(),
            None,
        );
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        assert_eq!(entry.message(), "lazy");
        assert!(entry.has_message("lazy"));
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn default_entry_queries() {
        let entry = LogEntry::default();

        assert!(entry.is_trace());
        assert!(entry.has_event_id(0));
        assert_eq!(entry.message(), "");
        assert!(!entry.has_message(""));
        assert!(!entry.has_message_with("", Comparison::IgnoreCase));
        assert!(!entry.has_message_where(|_| panic!("predicate must not run")));
        assert!(!entry.has_message_matching(".*").unwrap());
        assert!(!entry.has_attribute("State"));
        assert!(!entry.has_attribute_value("State", 1).unwrap());
        assert!(!entry.has_attribute_of::<i64>("State", &1));
        assert!(!entry.has_attribute_where("State", |_| true));
        assert!(!entry.has_attribute_where_of::<str>("State", |_| true));
        assert!(entry.has_no_state());
        assert!(!entry.has_state());
        assert!(entry.has_state_value(Value::Null));
        assert!(!entry.has_state_of::<str>("x"));
        assert!(entry.has_state_where(Value::is_null));
        assert!(!entry.has_state_where_of::<i64>(|_| true));
        assert!(entry.has_no_scope());
        assert!(!entry.has_scope());
        assert!(entry.has_scope_value(Value::Null));
        assert!(!entry.has_scope_value("x"));
        assert!(!entry.has_scope_of::<str>("x"));
        assert!(!entry.has_scope_where(|_| true));
        assert!(!entry.has_scope_where_of::<str>(|_| true));
        assert!(entry.has_no_error());
        assert!(!entry.has_error());
        assert!(!entry.has_error_of::<ConnectionError>());
        assert!(entry.has_error_ref(None));
        assert!(entry.has_error_where(|error| error.is_none()));
        assert!(!entry.has_error_where_of::<ConnectionError>(|_| true));
    }

    #[test]
    fn level_and_event_id() {
        let entry = entry();
        assert!(entry.is_warning());
        assert!(!entry.is_error());
        assert!(entry.has_level_where(|level| level >= Level::Warning));
        assert!(entry.has_event_id(12));
        assert!(entry.has_event_id(EventId::named(12, "other")));
        assert!(entry.has_event_id_where(|id| id.name() == Some("slow")));
    }

    #[test]
    fn message_queries() {
        let entry = entry();
        assert!(entry.has_message("Hello, world!"));
        assert!(!entry.has_message("hello, world!"));
        assert!(entry.has_message_with("HELLO, WORLD!", Comparison::IgnoreCase));
        assert!(entry.has_message_where(|message| message.starts_with("Hello")));
        assert!(entry.has_message_matching(r"^Hello, \w+!$").unwrap());
        assert!(!entry.has_message_matching("^hello").unwrap());
        let options = MatchOptions {
            case_insensitive: true,
            ..MatchOptions::default()
        };
        assert!(entry.has_message_matching_with("^hello", options).unwrap());
        assert!(matches!(
            entry.has_message_matching("("),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn attribute_queries() {
        let entry = entry();
        assert!(entry.has_attribute("foo"));
        assert!(entry.has_attribute("Scope.ParentScope"));
        assert!(!entry.has_attribute("baz"));
        assert!(entry.has_attribute_value("foo", "abc").unwrap());
        assert!(entry.has_attribute_value("bar", 123).unwrap());
        assert!(!entry.has_attribute_value("bar", "123").unwrap());
        assert_eq!(
            entry.has_attribute_value("foo", Value::Null).unwrap_err(),
            Error::null("value")
        );
        assert!(entry.has_attribute_of::<i64>("bar", &123));
        assert!(!entry.has_attribute_of::<str>("bar", "123"));
        assert!(entry.has_attribute_where("Scope", |value| value.to_string() == "request"));
        assert!(entry.has_attribute_where_of::<str>("foo", |value| value.len() == 3));
        assert!(!entry.has_attribute_where_of::<u64>("bar", |_| true));
    }

    #[test]
    fn state_queries() {
        let entry = entry();
        assert!(entry.has_state());
        assert!(!entry.has_state_value(Value::Null));
        assert!(entry.has_state_value(Value::from(attributes!(foo = "abc", bar = 123))));
        assert!(entry.has_state_where(|state| !state.is_null()));

        let scalar = LogEntry::new(
            Level::Trace,
            0,
            String::new,
            LogAttributes::with_state("plain"),
            None,
        );
        assert!(scalar.has_state_of::<str>("plain"));
        assert!(scalar.has_state_where_of::<str>(|state| state == "plain"));
        assert!(!scalar.has_state_where_of::<i64>(|_| panic!("wrong type")));
    }

    #[test]
    fn scope_queries() {
        let entry = entry();
        assert!(entry.has_scope());
        assert!(entry.has_scope_value("session"));
        assert!(!entry.has_scope_value("missing"));
        assert!(!entry.has_scope_value(Value::Null));
        assert!(entry.has_scope_of::<str>("request"));

        let mut visited = 0;
        assert!(entry.has_scope_where(|_| {
            visited += 1;
            true
        }));
        assert_eq!(visited, 1);
        assert!(entry.has_scope_where_of::<str>(|scope| scope == "session"));
    }

    #[test]
    fn error_queries() {
        let entry = entry();
        assert!(entry.has_error());
        assert!(entry.has_error_of::<ConnectionError>());
        assert!(!entry.has_error_of::<TimeoutError>());
        assert!(entry.has_error_ref(entry.error()));
        let other: SharedError = Arc::new(ConnectionError);
        assert!(!entry.has_error_ref(Some(&other)));
        assert!(!entry.has_error_ref(None));
        assert!(entry.has_error_where(|error| error.is_some_and(|error| error.to_string() == "connection refused")));
        assert!(entry.has_error_where_of::<ConnectionError>(|_| true));
        assert!(!entry.has_error_where_of::<TimeoutError>(|_| panic!("wrong type")));
    }

    #[test]
    fn render_full() {
        assert_eq!(
            entry().to_string(),
            concat!(
                "{\n Level = Warning,",
                "\n EventId = 12 (slow),",
                "\n Message = Hello, world!,",
                "\n State = { [foo] = abc, [bar] = 123 },",
                "\n Scope = request,",
                "\n ParentScope = session,",
                "\n Error = connection refused \n}",
            )
        );
    }

    #[test]
    fn render_default() {
        assert_eq!(LogEntry::default().to_string(), "{\n Level = Trace \n}");
    }

    #[test]
    fn render_skips_state_matching_message() {
        let entry = LogEntry::new(
            Level::Information,
            0,
            || "ready".to_owned(),
            LogAttributes::with_state("ready"),
            None,
        );
        assert_eq!(
            entry.to_string(),
            "{\n Level = Information,\n Message = ready,\n State =  \n}"
        );

        let blank = LogEntry::new(
            Level::Information,
            0,
            || "  ".to_owned(),
            LogAttributes::with_state("ready"),
            None,
        );
        assert_eq!(
            blank.to_string(),
            "{\n Level = Information,\n State = ready \n}"
        );
    }
}
