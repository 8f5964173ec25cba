//! # `attrlog`
//!
//! Structured log entries whose state and scopes flatten into named attributes.
//!
//! A log call carries a level, an event id, a lazily formatted message, a state value and the scopes active at the
//! time of the call. This crate models that call as an immutable [`LogEntry`], exposes its state and scopes as a flat
//! sequence of `(name, value)` pairs, renders it in a stable human readable form, and answers presence and equality
//! queries against it.
//!
//! ## Features
//!
//! - **Attributes**: State and scope values flatten into `State`, `Scope`, `Scope.ParentScope` and `[i]` names
//! - **Templates**: `{Name}` placeholders substituted from named values, with a bounded matcher cache
//! - **Scopes**: Per-thread and per-task scope chains with RAII release
//! - **Queries**: Level, event id, message, attribute, state, scope and error queries for tests
//! - **Sinks**: In-memory collection for tests and line output for development
//!
//! ## Feature Flags
//!
//! - `json` - Accept `serde_json::Value` as structured state
//!
//! ## Basic Usage
//!
//! ```rust
//! use attrlog::{Level, Logger, MemorySink, information};
//!
//! let (sink, entries) = MemorySink::new();
//! let logger = Logger::builder().level(Level::Debug).sink(sink).build();
//!
//! information!(logger, "Hello, {Who}!", Who = "world").unwrap();
//!
//! let entries = entries.lock().unwrap();
//! let entry = &entries[0];
//! assert!(entry.has_message("Hello, world!"));
//! assert!(entry.has_attribute_value("Who", "world").unwrap());
//! assert!(entry.has_attribute_value("State.OriginalFormat", "Hello, {Who}!").unwrap());
//! ```
//!
//! ## Rendering
//!
//! ```rust
//! use attrlog::{LogAttributes, Value, attributes};
//!
//! let attributes = LogAttributes::with_state(Value::from(attributes!(foo = "abc", bar = 123)));
//! assert_eq!(attributes.to_string(), "{\n State = { [foo] = abc, [bar] = 123 } \n}");
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod attributes;
mod entry;
mod error;
pub mod future;
mod level;
mod logger;
mod macros;
mod render;
pub mod scope;
pub mod sink;
pub mod template;
pub mod value;

pub use attributes::{Attributes, LogAttributes};
pub use entry::{Comparison, LogEntry, MatchOptions, SharedError};
pub use error::Error;
pub use future::{FutureExt, WithScope};
pub use level::{EventId, Level};
pub use logger::{Builder, Log, LogExt, Logger, LoggerConfig, ScopeGuard};
pub use scope::{ScopeChain, ScopeFrame};
pub use sink::{MemorySink, NopSink, Sink, WriterSink};
pub use template::{DEFAULT_CAPACITY, MatcherCache, ORIGINAL_FORMAT, Template};
pub use value::{KeyValue, Loggable, Object, Shape, Value, ValueType, dyn_eq_by_value};
