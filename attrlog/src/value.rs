//! Runtime-typed attribute values.
//!
//! State and scope objects are open-ended: callers pass anything from a number to a nested map. This module defines the
//! closed set of shapes the flattener understands.
//!
//! # Value Types
//!
//! The [`Value`] enum holds scalars inline:
//! - **Null**: the absent value
//! - **Bool**, **I64**, **U64**, **F64**: primitive scalars
//! - **Str**: text, which is never treated as a sequence
//! - **Object**: a shared [`Loggable`] value classified by its [`Shape`]
//!
//! # Loggable objects
//!
//! A [`Loggable`] type reports its [`Shape`] (pairs, items or an opaque scalar) and may provide a [`label`], its own
//! string form. The shape drives both attribute naming and text rendering.
//!
//! ```rust
//! use std::borrow::Cow;
//!
//! use attrlog::{Loggable, Shape, Value};
//!
//! #[derive(Debug)]
//! struct Request {
//!     path: String,
//!     status: u16,
//! }
//!
//! impl Loggable for Request {
//!     fn shape(&self) -> Shape<'_> {
//!         Shape::pairs([
//!             (Cow::Borrowed("path"), Value::from(self.path.clone())),
//!             (Cow::Borrowed("status"), Value::from(self.status)),
//!         ])
//!     }
//!
//!     fn label(&self) -> Option<String> {
//!         Some(format!("GET {}", self.path))
//!     }
//! }
//!
//! let value = Value::object(Request { path: "/health".into(), status: 200 });
//! assert_eq!(value.to_string(), "GET /health");
//! ```
//!
//! [`label`]: Loggable::label

use std::any::Any;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// A key-value attribute pair produced by flattening.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue<'a> {
    /// The attribute key (name).
    pub key: Cow<'a, str>,
    /// The attribute value.
    pub value: Value,
}

impl<'a> KeyValue<'a> {
    /// Creates a new key-value attribute pair.
    ///
    /// ```rust
    /// use attrlog::KeyValue;
    ///
    /// let user_id = KeyValue::new("user_id", 123);
    /// assert_eq!(user_id.to_string(), "user_id: 123");
    /// ```
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<Cow<'a, str>>,
        V: Into<Value>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Converts the key into an owned one.
    pub fn into_owned(self) -> KeyValue<'static> {
        KeyValue {
            key: Cow::Owned(self.key.into_owned()),
            value: self.value,
        }
    }
}

impl fmt::Display for KeyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

impl<'a, K, V> From<(K, V)> for KeyValue<'a>
where
    K: Into<Cow<'a, str>>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// A value that can be stored as log state, scope state or an attribute.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The absent value.
    #[default]
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    I64(i64),
    /// A 64-bit unsigned integer.
    U64(u64),
    /// A 64-bit floating-point number.
    F64(f64),
    /// A text value.
    Str(Cow<'static, str>),
    /// A shared structured or opaque object.
    Object(Object),
}

impl Value {
    /// Wraps a [`Loggable`] object.
    pub fn object<T: Loggable>(value: T) -> Self {
        Value::Object(Object::new(value))
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the object if this is a [`Value::Object`].
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns a typed reference to the stored value if its runtime type is `T`.
    pub fn downcast_ref<T: ValueType + ?Sized>(&self) -> Option<&T> {
        T::from_value(self)
    }

    /// The classification used for naming and rendering.
    pub fn shape(&self) -> Shape<'_> {
        match self {
            Value::Object(object) => object.shape(),
            _ => Shape::Scalar,
        }
    }

    /// The string override of an object value, if it has one.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Object(object) => object.label(),
            _ => None,
        }
    }

    /// Replaces [`Value::Null`] with an empty string.
    pub(crate) fn or_empty(self) -> Value {
        match self {
            Value::Null => Value::Str(Cow::Borrowed("")),
            value => value,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::I64(a), Value::U64(b)) | (Value::U64(b), Value::I64(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::I64(value) => write!(f, "{value}"),
            Value::U64(value) => write!(f, "{value}"),
            Value::F64(value) => write!(f, "{value}"),
            Value::Str(value) => f.write_str(value),
            Value::Object(object) => write!(f, "{object}"),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident($target:ty): $($source:ty),*) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

impl_from!(Bool(bool): bool);
impl_from!(I64(i64): i8, i16, i32, i64);
impl_from!(U64(u64): u8, u16, u32, u64);
impl_from!(F64(f64): f32, f64);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        // isize is at most 64 bits on every supported target.
        Value::I64(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::U64(value as u64)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Str(Cow::Owned(value.to_string()))
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Cow::Owned(value))
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Str(Cow::Owned(value.clone()))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(value: Cow<'static, str>) -> Self {
        Value::Str(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::object(value)
    }
}

impl<K> From<Vec<(K, Value)>> for Value
where
    K: AsRef<str> + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn from(value: Vec<(K, Value)>) -> Self {
        Value::object(value)
    }
}

impl<K> From<IndexMap<K, Value>> for Value
where
    K: AsRef<str> + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn from(value: IndexMap<K, Value>) -> Self {
        Value::object(value)
    }
}

impl<K> From<BTreeMap<K, Value>> for Value
where
    K: AsRef<str> + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn from(value: BTreeMap<K, Value>) -> Self {
        Value::object(value)
    }
}

/// The classification of a [`Loggable`] value.
///
/// Iterators are created fresh for each call to [`Loggable::shape`], so flattening never caches results.
pub enum Shape<'a> {
    /// A mapping of name to value pairs, in the mapping's own order.
    Pairs(Box<dyn Iterator<Item = (Cow<'a, str>, Value)> + 'a>),
    /// An ordered, non-text sequence of values.
    Items(Box<dyn Iterator<Item = Value> + 'a>),
    /// An opaque value.
    Scalar,
}

impl<'a> Shape<'a> {
    /// Creates a [`Shape::Pairs`] from any pair iterator.
    pub fn pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Cow<'a, str>, Value)>,
        I::IntoIter: 'a,
    {
        Shape::Pairs(Box::new(pairs.into_iter()))
    }

    /// Creates a [`Shape::Items`] from any value iterator.
    pub fn items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'a,
    {
        Shape::Items(Box::new(items.into_iter()))
    }
}

impl fmt::Debug for Shape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Pairs(_) => f.write_str("Pairs(..)"),
            Shape::Items(_) => f.write_str("Items(..)"),
            Shape::Scalar => f.write_str("Scalar"),
        }
    }
}

/// A value that can be carried as log state or scope state.
///
/// The default implementation describes an opaque scalar without a string override, rendered through its [`Debug`]
/// form.
///
/// [`Debug`]: fmt::Debug
pub trait Loggable: Any + fmt::Debug + Send + Sync {
    /// Classifies this value for naming and rendering.
    fn shape(&self) -> Shape<'_> {
        Shape::Scalar
    }

    /// The value's own string form, if it overrides the default one.
    ///
    /// When present it is emitted as the `<prefix>` attribute ahead of any pairs or items.
    fn label(&self) -> Option<String> {
        None
    }

    /// Compares with another loggable value of unknown type.
    ///
    /// Objects sharing the same allocation are always equal; this is only consulted for distinct allocations.
    fn dyn_eq(&self, other: &dyn Any) -> bool {
        let _ = other;
        false
    }
}

/// Compares `this` with `other` when `other` has the same concrete type.
///
/// A helper for implementing [`Loggable::dyn_eq`] on types that implement [`PartialEq`].
pub fn dyn_eq_by_value<T: PartialEq + 'static>(this: &T, other: &dyn Any) -> bool {
    other.downcast_ref::<T>().is_some_and(|other| this == other)
}

/// A shared, type-erased [`Loggable`] value.
#[derive(Clone)]
pub struct Object(Arc<dyn Loggable>);

impl Object {
    /// Wraps a value.
    pub fn new<T: Loggable>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps an already shared value.
    pub fn from_arc(value: Arc<dyn Loggable>) -> Self {
        Self(value)
    }

    /// The classification of the wrapped value.
    pub fn shape(&self) -> Shape<'_> {
        self.0.shape()
    }

    /// The string override of the wrapped value, if it has one.
    pub fn label(&self) -> Option<String> {
        self.0.label()
    }

    /// Returns a reference to the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let any: &dyn Any = &*self.0;
        any.downcast_ref::<T>()
    }

    /// Whether both handles point to the same allocation.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || {
            let other: &dyn Any = &*other.0;
            self.0.dyn_eq(other)
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => write!(f, "{:?}", self.0),
        }
    }
}

/// Types that typed queries can extract from a [`Value`].
///
/// A typed query only matches when the stored value's runtime type is `Self`.
pub trait ValueType: 'static {
    /// Returns a reference to `Self` if the value holds one.
    fn from_value(value: &Value) -> Option<&Self>;
}

impl ValueType for bool {
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }
}

impl ValueType for i64 {
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::I64(value) => Some(value),
            _ => None,
        }
    }
}

impl ValueType for u64 {
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::U64(value) => Some(value),
            _ => None,
        }
    }
}

impl ValueType for f64 {
    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::F64(value) => Some(value),
            _ => None,
        }
    }
}

impl ValueType for str {
    fn from_value(value: &Value) -> Option<&Self> {
        value.as_str()
    }
}

impl<T: Loggable> ValueType for T {
    fn from_value(value: &Value) -> Option<&Self> {
        value.as_object()?.downcast_ref::<T>()
    }
}

impl Loggable for Vec<Value> {
    fn shape(&self) -> Shape<'_> {
        Shape::items(self.iter().cloned())
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        dyn_eq_by_value(self, other)
    }
}

impl<K> Loggable for Vec<(K, Value)>
where
    K: AsRef<str> + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn shape(&self) -> Shape<'_> {
        Shape::pairs(
            self.iter()
                .map(|(key, value)| (Cow::Borrowed(key.as_ref()), value.clone())),
        )
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        dyn_eq_by_value(self, other)
    }
}

impl<K> Loggable for IndexMap<K, Value>
where
    K: AsRef<str> + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn shape(&self) -> Shape<'_> {
        Shape::pairs(
            self.iter()
                .map(|(key, value)| (Cow::Borrowed(key.as_ref()), value.clone())),
        )
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| self.iter().eq(other.iter()))
    }
}

impl<K> Loggable for BTreeMap<K, Value>
where
    K: AsRef<str> + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn shape(&self) -> Shape<'_> {
        Shape::pairs(
            self.iter()
                .map(|(key, value)| (Cow::Borrowed(key.as_ref()), value.clone())),
        )
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| self.iter().eq(other.iter()))
    }
}

#[cfg(feature = "json")]
mod json {
    use std::any::Any;
    use std::borrow::Cow;

    use super::{Loggable, Shape, Value, dyn_eq_by_value};

    impl From<serde_json::Value> for Value {
        fn from(value: serde_json::Value) -> Self {
            match value {
                serde_json::Value::Null => Value::Null,
                serde_json::Value::Bool(value) => Value::Bool(value),
                serde_json::Value::Number(number) => {
                    if let Some(value) = number.as_u64() {
                        Value::U64(value)
                    } else if let Some(value) = number.as_i64() {
                        Value::I64(value)
                    } else {
                        number.as_f64().map_or(Value::Null, Value::F64)
                    }
                }
                serde_json::Value::String(value) => Value::Str(Cow::Owned(value)),
                value @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                    Value::object(value)
                }
            }
        }
    }

    impl Loggable for serde_json::Value {
        fn shape(&self) -> Shape<'_> {
            match self {
                serde_json::Value::Object(map) => Shape::pairs(
                    map.iter()
                        .map(|(key, value)| (Cow::Borrowed(key.as_str()), Value::from(value.clone()))),
                ),
                serde_json::Value::Array(items) => {
                    Shape::items(items.iter().map(|value| Value::from(value.clone())))
                }
                _ => Shape::Scalar,
            }
        }

        fn label(&self) -> Option<String> {
            match self {
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
                scalar => Some(scalar.to_string()),
            }
        }

        fn dyn_eq(&self, other: &dyn Any) -> bool {
            dyn_eq_by_value(self, other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Opaque(u32);

    impl Loggable for Opaque {
        fn dyn_eq(&self, other: &dyn Any) -> bool {
            dyn_eq_by_value(self, other)
        }
    }

    #[derive(Debug)]
    struct Greeting;

    impl Loggable for Greeting {
        fn label(&self) -> Option<String> {
            Some("Hello world!".into())
        }
    }

    #[test]
    fn display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(-5).to_string(), "-5");
        assert_eq!(Value::from(5u8).to_string(), "5");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::object(Opaque(3)).to_string(), "Opaque(3)");
        assert_eq!(Value::object(Greeting).to_string(), "Hello world!");
    }

    #[test]
    fn option_conversion() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn integer_equality_across_signedness() {
        assert_eq!(Value::from(123), Value::from(123u32));
        assert_ne!(Value::from(-1), Value::from(u64::MAX));
        assert_ne!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from("1"), Value::from(1));
    }

    #[test]
    fn object_equality() {
        let object = Object::new(Opaque(1));
        assert_eq!(object, object.clone());
        assert!(object.ptr_eq(&object.clone()));
        assert_eq!(Value::object(Opaque(1)), Value::object(Opaque(1)));
        assert_ne!(Value::object(Opaque(1)), Value::object(Opaque(2)));

        // Without `dyn_eq` only the same allocation compares equal.
        let greeting = Value::object(Greeting);
        assert_eq!(greeting, greeting.clone());
        assert_ne!(greeting, Value::object(Greeting));
    }

    #[test]
    fn collection_equality() {
        let a = Value::from(vec![("foo", Value::from("abc"))]);
        let b = Value::from(vec![("foo", Value::from("abc"))]);
        assert_eq!(a, b);
        assert_ne!(a, Value::from(vec![Value::from("abc")]));
    }

    #[test]
    fn typed_access() {
        assert_eq!(Value::from(7).downcast_ref::<i64>(), Some(&7));
        assert_eq!(Value::from(7).downcast_ref::<u64>(), None);
        assert_eq!(Value::from("abc").downcast_ref::<str>(), Some("abc"));
        assert_eq!(
            Value::object(Opaque(9)).downcast_ref::<Opaque>(),
            Some(&Opaque(9))
        );
        assert_eq!(Value::object(Greeting).downcast_ref::<Opaque>(), None);
    }

    #[test]
    fn shapes() {
        assert!(matches!(Value::from("abc").shape(), Shape::Scalar));
        assert!(matches!(
            Value::from(vec![Value::from(1)]).shape(),
            Shape::Items(_)
        ));

        let mut map = IndexMap::new();
        map.insert("foo", Value::from("abc"));
        map.insert("bar", Value::from(123));
        let value = Value::from(map);
        let Shape::Pairs(pairs) = value.shape() else {
            panic!("expected pairs");
        };
        let pairs: Vec<_> = pairs.collect();
        assert_eq!(
            pairs,
            vec![
                (Cow::Borrowed("foo"), Value::from("abc")),
                (Cow::Borrowed("bar"), Value::from(123)),
            ]
        );
    }

    #[test]
    fn key_value_display() {
        assert_eq!(KeyValue::new("user_id", 123).to_string(), "user_id: 123");
        assert_eq!(KeyValue::from(("a", "b")).into_owned().key, "a");
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_values() {
        use serde_json::json;

        use crate::LogAttributes;

        fn flattened(state: Value) -> Vec<KeyValue<'static>> {
            LogAttributes::with_state(state)
                .iter()
                .map(KeyValue::into_owned)
                .collect()
        }

        assert!(matches!(Value::from(json!(u64::MAX)), Value::U64(u64::MAX)));
        assert!(matches!(Value::from(json!(-3)), Value::I64(-3)));
        assert!(matches!(Value::from(json!(0.5)), Value::F64(value) if value == 0.5));
        assert_eq!(Value::from(json!("abc")), Value::from("abc"));
        assert!(Value::from(json!(null)).is_null());

        assert_eq!(
            flattened(Value::from(json!(["a", null, 7]))),
            vec![
                KeyValue::new("State[0]", "a"),
                KeyValue::new("State[1]", ""),
                KeyValue::new("State[2]", 7u64),
            ]
        );

        let nested = json!({ "user": { "id": 7 }, "tags": ["a", null] });
        let state = Value::from(nested.clone());
        assert_eq!(state.downcast_ref::<serde_json::Value>(), Some(&nested));
        assert_eq!(
            flattened(state),
            vec![
                KeyValue::new("tags", json!(["a", null])),
                KeyValue::new("user", json!({ "id": 7 })),
            ]
        );

        assert_eq!(
            flattened(Value::object(json!(true))),
            vec![KeyValue::new("State", "true")]
        );
    }
}
