use std::sync::{Arc, Mutex, PoisonError};

use super::Sink;
use crate::LogEntry;

/// A sink that stores every entry in memory.
///
/// Useful for tests that assert on what was logged.
#[derive(Clone, Debug)]
pub struct MemorySink {
    /// Shared vector storing all written entries.
    pub entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    /// Creates a sink and returns it together with a handle to its storage.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use attrlog::{Level, Log, Logger, MemorySink};
    ///
    /// let (sink, entries) = MemorySink::new();
    /// let logger = Logger::builder().sink(sink).build();
    /// logger.log(Level::Warning, 7.into(), "low disk", None, |state, _| state.to_string());
    ///
    /// let entries = entries.lock().unwrap();
    /// assert!(entries[0].is_warning());
    /// assert!(entries[0].has_message("low disk"));
    /// ```
    pub fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                entries: entries.clone(),
            },
            entries,
        )
    }
}

impl Sink for MemorySink {
    fn write(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}
