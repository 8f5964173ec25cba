//! Destinations for captured log entries.
//!
//! A [`Logger`](crate::Logger) hands every enabled entry to its [`Sink`]. Custom destinations implement the trait.
//!
//! # Built-in Sinks
//!
//! - [`NopSink`] - Discards every entry
//! - [`MemorySink`] - Collects entries in memory for inspection in tests
//! - [`WriterSink`] - Writes a one-line summary of each entry to stderr or any [`Write`](std::io::Write)

mod memory;
mod writer;

use std::fmt::Debug;

pub use self::memory::MemorySink;
pub use self::writer::WriterSink;
use crate::LogEntry;

/// Trait for receiving log entries.
///
/// # Examples
///
/// ```rust
/// use attrlog::{LogEntry, Sink};
///
/// #[derive(Debug)]
/// struct Stdout;
///
/// impl Sink for Stdout {
///     fn write(&self, entry: LogEntry) {
///         println!("{entry}");
///     }
/// }
/// ```
pub trait Sink: Debug {
    /// Receives one entry.
    fn write(&self, entry: LogEntry);
}

/// A sink that discards every entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopSink;

impl Sink for NopSink {
    fn write(&self, _: LogEntry) {}
}
