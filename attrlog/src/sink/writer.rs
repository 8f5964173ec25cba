use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use super::Sink;
use crate::LogEntry;

/// A sink that writes a one-line summary of each entry.
///
/// Each line holds the level, the event id when it is set, the message, the flattened attributes and the error.
///
/// <div class="warning">
/// Meant for development. Hosts with real log pipelines should implement [`Sink`] for them.
/// </div>
///
/// # Examples
///
/// ```rust
/// use attrlog::{Logger, WriterSink};
///
/// let logger = Logger::builder().sink(WriterSink::stderr()).build();
/// ```
pub struct WriterSink {
    output: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    /// Creates a sink writing to `output`.
    pub fn new(output: impl Write + Send + 'static) -> Self {
        Self {
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Creates a sink writing to stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl Default for WriterSink {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for WriterSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink").finish_non_exhaustive()
    }
}

impl Sink for WriterSink {
    fn write(&self, entry: LogEntry) {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = format_entry(&entry, &mut *output) {
            tracing::warn!(%error, "failed to write log entry");
        }
    }
}

fn format_entry(entry: &LogEntry, mut output: impl Write) -> io::Result<()> {
    let mut attributes = entry
        .attributes()
        .iter()
        .fold(String::from(" ["), |mut formatted, key_value| {
            let _ = write!(formatted, "{key_value}, ");
            formatted
        });
    if attributes.len() == 2 {
        attributes.clear();
    } else {
        // Remove trailing `, `.
        attributes.truncate(attributes.len() - 2);
        attributes.push(']');
    }

    let error = entry
        .error()
        .map(|error| format!(" error: {error}"))
        .unwrap_or_default();

    // `Information` is the longest level name, pad to it to keep messages aligned.
    let level = entry.level().as_str();
    let message = entry.message();
    match entry.event_id().id() {
        0 => writeln!(output, "[{level:>11}] {message}{attributes}{error}"),
        _ => writeln!(
            output,
            "[{level:>11}:{}] {message}{attributes}{error}",
            entry.event_id()
        ),
    }
}
