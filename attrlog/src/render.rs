//! Text rendering shared by [`LogAttributes`] and [`LogEntry`].
//!
//! [`LogAttributes`]: crate::LogAttributes
//! [`LogEntry`]: crate::LogEntry

use std::fmt::Write;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use crate::scope::ScopeChain;
use crate::value::{Shape, Value};

/// Buffers kept for reuse.
const MAX_POOLED: usize = 32;

/// Buffers that grew beyond this are dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 256;

static POOL: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// A rendering buffer borrowed from the pool, returned on drop.
#[derive(Debug)]
pub(crate) struct PooledBuffer {
    buffer: String,
}

impl PooledBuffer {
    pub(crate) fn get() -> Self {
        let buffer = POOL
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Self { buffer }
    }
}

impl Deref for PooledBuffer {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if self.buffer.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        let mut pool = POOL.lock().unwrap_or_else(PoisonError::into_inner);
        if pool.len() < MAX_POOLED {
            pool.push(buffer);
        }
    }
}

/// Appends the text form of a state value.
///
/// The value's string form comes first unless it equals `skip`, followed by a `{ [k] = v, .. }` listing for pairs or
/// a `[ a, .. ]` listing for items.
pub(crate) fn append_state(buffer: &mut String, state: &Value, skip: Option<&str>) {
    let label = match state {
        Value::Null => None,
        Value::Object(object) => object.label(),
        scalar => Some(scalar.to_string()),
    };

    let mut needs_padding = false;
    if let Some(label) = &label
        && skip != Some(label.as_str())
    {
        buffer.push_str(label);
        needs_padding = true;
    }

    match state.shape() {
        Shape::Pairs(pairs) => {
            if needs_padding {
                buffer.push(' ');
            }
            buffer.push_str("{ ");
            for (index, (key, value)) in pairs.enumerate() {
                if index > 0 {
                    buffer.push_str(", ");
                }
                let _ = write!(buffer, "[{key}] = {value}");
            }
            buffer.push_str(" }");
        }
        Shape::Items(items) => {
            if needs_padding {
                buffer.push(' ');
            }
            buffer.push_str("[ ");
            for (index, value) in items.enumerate() {
                if index > 0 {
                    buffer.push_str(", ");
                }
                let _ = write!(buffer, "{value}");
            }
            buffer.push_str(" ]");
        }
        Shape::Scalar => {
            if label.is_none() {
                let _ = write!(buffer, "{state}");
            }
        }
    }
}

/// Appends one `Scope = ..` line followed by a `ParentScope = ..` line per ancestor.
///
/// `separator` precedes the first line.
pub(crate) fn append_scopes(buffer: &mut String, scope: &ScopeChain, separator: &str) {
    for (index, frame) in scope.frames().enumerate() {
        if index == 0 {
            buffer.push_str(separator);
            buffer.push_str("Scope = ");
        } else {
            buffer.push_str(",\n ParentScope = ");
        }
        append_state(buffer, frame.state(), None);
    }
}
