//! Message templates with `{Name}` placeholders.
//!
//! A [`Template`] holds a message format and the named values logged with it. It is usable directly as log state:
//! it flattens to its pairs followed by the raw format under `{OriginalFormat}`, and its string form is the formatted
//! message.
//!
//! # Placeholders
//!
//! A placeholder `{Name}` is replaced by the string form of the first pair named `Name`. When an error is supplied,
//! three more placeholders are recognised:
//!
//! - `{Error}`: the error followed by its source chain, joined with `: `
//! - `{Error.Message}`: the error alone
//! - `{Error.Source}`: the source chain alone
//!
//! Any other `{...}` text is left untouched.
//!
//! ```rust
//! use attrlog::{Template, attributes};
//!
//! let template = Template::new("Hello, {Who}!", attributes!(Who = "world")).unwrap();
//! assert_eq!(template.format_message(None), "Hello, world!");
//! assert_eq!(template.to_string(), "Hello, world!");
//! ```
//!
//! # Matcher cache
//!
//! Formatting compiles a regular expression matching every placeholder in play. Compiled matchers are kept in a
//! [`MatcherCache`] keyed by the sorted set of placeholder names, so call sites logging the same names in any order
//! share one matcher. The cache is bounded; see [`MatcherCache`].

mod cache;

use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::iter;
use std::sync::Arc;

use regex::Captures;

pub use self::cache::{DEFAULT_CAPACITY, MatcherCache};
use crate::Error;
use crate::value::{Loggable, Shape, Value};

/// The pair name under which a template exposes its raw format.
pub const ORIGINAL_FORMAT: &str = "{OriginalFormat}";

const ERROR_KEY: &str = r"Error(?:\.(?:Message|Source))?";

/// A message format with its named values.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    format: Arc<str>,
    pairs: Arc<[(Cow<'static, str>, Value)]>,
}

impl Template {
    /// Creates a template.
    ///
    /// Fails with [`Error::InvalidArgument`] if `format` is empty or whitespace.
    pub fn new<I, K, V>(format: impl Into<Arc<str>>, pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Cow<'static, str>>,
        V: Into<Value>,
    {
        let format = format.into();
        if format.trim().is_empty() {
            return Err(Error::blank("format"));
        }

        Ok(Self {
            format,
            pairs: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        })
    }

    /// The raw message format.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The named values, in the order given.
    pub fn pairs(&self) -> &[(Cow<'static, str>, Value)] {
        &self.pairs
    }

    /// Substitutes placeholders using the process-wide [`MatcherCache`].
    pub fn format_message(&self, error: Option<&(dyn StdError + 'static)>) -> String {
        self.format_message_with(MatcherCache::global(), error)
    }

    /// Substitutes placeholders using `cache`.
    pub fn format_message_with(
        &self,
        cache: &MatcherCache,
        error: Option<&(dyn StdError + 'static)>,
    ) -> String {
        let mut keys: Vec<String> = self
            .pairs
            .iter()
            .map(|(key, _)| regex::escape(key))
            .collect();
        if error.is_some() {
            keys.push(ERROR_KEY.to_owned());
        }
        if keys.is_empty() {
            return self.format.to_string();
        }
        keys.sort_unstable();
        keys.dedup();

        let matcher = match cache.matcher(&keys) {
            Ok(matcher) => matcher,
            Err(error) => {
                tracing::warn!(%error, format = %self.format, "failed to compile placeholder matcher");
                return self.format.to_string();
            }
        };

        matcher
            .replace_all(&self.format, |captures: &Captures<'_>| {
                self.replacement(&captures[1], error)
            })
            .into_owned()
    }

    fn replacement(&self, name: &str, error: Option<&(dyn StdError + 'static)>) -> String {
        if let Some((_, value)) = self.pairs.iter().find(|(key, _)| key == name) {
            return value.to_string();
        }

        match (name, error) {
            ("Error", Some(error)) => iter::once(error.to_string())
                .chain(sources(error))
                .collect::<Vec<_>>()
                .join(": "),
            ("Error.Message", Some(error)) => error.to_string(),
            ("Error.Source", Some(error)) => sources(error).collect::<Vec<_>>().join(": "),
            _ => String::new(),
        }
    }
}

fn sources<'a>(error: &'a (dyn StdError + 'static)) -> impl Iterator<Item = String> + 'a {
    iter::successors(error.source(), |&error| error.source()).map(ToString::to_string)
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_message(None))
    }
}

impl Loggable for Template {
    fn shape(&self) -> Shape<'_> {
        Shape::pairs(
            self.pairs
                .iter()
                .map(|(key, value)| (Cow::Borrowed(key.as_ref()), value.clone()))
                .chain(iter::once((
                    Cow::Borrowed(ORIGINAL_FORMAT),
                    Value::Str(Cow::Owned(self.format.to_string())),
                ))),
        )
    }

    fn label(&self) -> Option<String> {
        Some(self.format_message(None))
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        crate::value::dyn_eq_by_value(self, other)
    }
}

impl From<Template> for Value {
    fn from(template: Template) -> Self {
        Value::object(template)
    }
}
