//! Flattening of state and scope objects into named attributes.
//!
//! [`LogAttributes`] pairs a state value with a scope chain. Iterating it yields [`KeyValue`]s: state-derived
//! attributes first, then scope attributes nearest to farthest.
//!
//! # Naming
//!
//! Each source is flattened under a prefix: `State` for the state, then `Scope`, `Scope.ParentScope`,
//! `Scope.ParentScope.ParentScope` and so on for scope frames.
//!
//! - An object with a string override first yields `(<prefix>, <override>)`.
//! - Pairs are yielded under their own names; a pair named `{OriginalFormat}` is renamed to
//!   `<prefix>.OriginalFormat`.
//! - Items are yielded as `<prefix>[0]`, `<prefix>[1]`, …
//! - Any other non-null value is yielded as `(<prefix>, value)`.
//!
//! Null pairs and items are yielded as empty strings.
//!
//! ```rust
//! use attrlog::{LogAttributes, Value, attributes};
//!
//! let state = Value::from(attributes!(foo = "abc", bar = 123));
//! let attributes = LogAttributes::new(state, ["request"]).unwrap();
//!
//! let keys: Vec<_> = attributes.iter().map(|kv| kv.key.into_owned()).collect();
//! assert_eq!(keys, ["foo", "bar", "Scope"]);
//! assert_eq!(attributes.to_string(), "{\n State = { [foo] = abc, [bar] = 123 },\n Scope = request \n}");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::iter;

use crate::render::{PooledBuffer, append_scopes, append_state};
use crate::scope::ScopeChain;
use crate::value::{KeyValue, Shape, Value};
use crate::{Error, ORIGINAL_FORMAT};

/// The state and scope attributes of a log entry.
#[derive(Clone, Debug, Default)]
pub struct LogAttributes {
    state: Value,
    scope: ScopeChain,
}

impl LogAttributes {
    /// Creates attributes from a state value and scope states given nearest first.
    ///
    /// Fails with [`Error::InvalidArgument`] if any scope state is [`Value::Null`].
    pub fn new<I>(state: impl Into<Value>, scopes: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Ok(Self {
            state: state.into(),
            scope: ScopeChain::from_states(scopes)?,
        })
    }

    /// Creates attributes with a state value and no scopes.
    pub fn with_state(state: impl Into<Value>) -> Self {
        Self {
            state: state.into(),
            scope: ScopeChain::default(),
        }
    }

    pub(crate) fn from_parts(state: Value, scope: ScopeChain) -> Self {
        Self { state, scope }
    }

    /// The state value, [`Value::Null`] when absent.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// The scope chain, nearest first.
    pub fn scope(&self) -> &ScopeChain {
        &self.scope
    }

    /// Whether there is neither state nor scope.
    pub fn is_empty(&self) -> bool {
        self.state.is_null() && self.scope.is_empty()
    }

    /// Iterates the flattened attributes.
    ///
    /// Each call recomputes the sequence from the source values.
    pub fn iter(&self) -> Attributes<'_> {
        let state = flatten(String::from("State"), &self.state);
        let scopes = self
            .scope
            .frames()
            .scan(String::new(), |prefix, frame| {
                if prefix.is_empty() {
                    prefix.push_str("Scope");
                } else {
                    prefix.push_str(".ParentScope");
                }
                Some(flatten(prefix.clone(), frame.state()))
            })
            .flatten();

        Attributes {
            inner: Box::new(state.chain(scopes)),
        }
    }
}

impl<'a> IntoIterator for &'a LogAttributes {
    type Item = KeyValue<'a>;
    type IntoIter = Attributes<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for LogAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = PooledBuffer::get();

        if !self.state.is_null() {
            buffer.push_str("{\n State = ");
            append_state(&mut buffer, &self.state, None);
        }

        let separator = if self.state.is_null() { "{\n " } else { ",\n " };
        append_scopes(&mut buffer, &self.scope, separator);

        if buffer.is_empty() {
            buffer.push_str("{ }");
        } else {
            buffer.push_str(" \n}");
        }

        f.write_str(&buffer)
    }
}

/// Iterator over flattened attributes, see [`LogAttributes::iter`].
pub struct Attributes<'a> {
    inner: Box<dyn Iterator<Item = KeyValue<'a>> + 'a>,
}

impl fmt::Debug for Attributes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes").finish_non_exhaustive()
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = KeyValue<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

fn flatten<'a>(prefix: String, state: &'a Value) -> Box<dyn Iterator<Item = KeyValue<'a>> + 'a> {
    if state.is_null() {
        return Box::new(iter::empty());
    }

    let label = state.label().map(|label| KeyValue::new(prefix.clone(), label));

    match state.shape() {
        Shape::Pairs(pairs) => {
            let renamed = format!("{prefix}.OriginalFormat");
            Box::new(label.into_iter().chain(pairs.map(move |(key, value)| {
                let key = if key == ORIGINAL_FORMAT {
                    Cow::Owned(renamed.clone())
                } else {
                    key
                };
                KeyValue {
                    key,
                    value: value.or_empty(),
                }
            })))
        }
        Shape::Items(items) => Box::new(label.into_iter().chain(items.enumerate().map(
            move |(index, value)| KeyValue::new(format!("{prefix}[{index}]"), value.or_empty()),
        ))),
        Shape::Scalar => match label {
            Some(label) => Box::new(iter::once(label)),
            None => Box::new(iter::once(KeyValue::new(prefix, state.clone()))),
        },
    }
}
