//! Macros for templated logging.
//!
//! # Logging Macros
//!
//! - `log!`: Logs a templated message at a given level
//! - `trace!`, `debug!`, `information!`, `warning!`, `error!`, `critical!`: Log at a fixed level
//!
//! Every logging macro takes the logger first and returns the `Result` of [`LogExt::log_template`].
//!
//! # Attribute Handling
//!
//! - `attributes!`: Creates a `Vec` of named values
//! - `attribute!`: Creates a single named value
//!
//! [`LogExt::log_template`]: crate::LogExt::log_template

/// Logs a templated message at the given level.
///
/// # Examples
///
/// ```rust
/// use attrlog::{Level, Logger, MemorySink, log};
///
/// let (sink, entries) = MemorySink::new();
/// let logger = Logger::builder().sink(sink).build();
///
/// let port = 8080;
/// log!(logger, Level::Information, "Listening on {port}", port).unwrap();
/// log!(&logger, Level::Warning, "Retrying {Host}", Host = "db", "attempt" = 3).unwrap();
///
/// let entries = entries.lock().unwrap();
/// assert!(entries[0].has_message("Listening on 8080"));
/// assert!(entries[1].has_attribute_value("attempt", 3).unwrap());
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $format:literal $(, $($attributes:tt)*)?) => {{
        use $crate::LogExt as _;
        ($logger).log_template(
            $level,
            0,
            ::core::option::Option::None,
            $format,
            $crate::attributes!($($($attributes)*)?),
        )
    }};
}

/// Logs a templated trace message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($args:tt)*) => {
        $crate::log!($logger, $crate::Level::Trace, $($args)*)
    };
}

/// Logs a templated debug message.
///
/// ```rust
/// use attrlog::{Level, Logger, debug};
///
/// let logger = Logger::builder().level(Level::Debug).build();
/// let user_id = 456;
/// debug!(logger, "User {user_id} logged in", user_id, "success" = true).unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($args:tt)*) => {
        $crate::log!($logger, $crate::Level::Debug, $($args)*)
    };
}

/// Logs a templated information message.
#[macro_export]
macro_rules! information {
    ($logger:expr, $($args:tt)*) => {
        $crate::log!($logger, $crate::Level::Information, $($args)*)
    };
}

/// Logs a templated warning message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($args:tt)*) => {
        $crate::log!($logger, $crate::Level::Warning, $($args)*)
    };
}

/// Logs a templated error message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($args:tt)*) => {
        $crate::log!($logger, $crate::Level::Error, $($args)*)
    };
}

/// Logs a templated critical message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($args:tt)*) => {
        $crate::log!($logger, $crate::Level::Critical, $($args)*)
    };
}

/// Constructs a `Vec` of named values.
///
/// # Syntax
///
/// - `identifier = value` - Uses the identifier as the name
/// - `"literal" = value` - Uses the literal string as the name
/// - `identifier` - Uses the identifier as both name and value
/// - `field.subfield` - Simple dot notation for field access
///
/// # Examples
///
/// ```rust
/// use attrlog::{Template, attributes};
///
/// let user_id = 123;
/// let template = Template::new(
///     "{user_id} via {service}",
///     attributes!(user_id, "service" = "auth", version = "1.0.0"),
/// )
/// .unwrap();
/// assert_eq!(template.to_string(), "123 via auth");
/// ```
///
/// Empty attributes:
/// ```rust
/// use attrlog::attributes;
///
/// assert!(attributes!().is_empty());
/// ```
#[macro_export]
macro_rules! attributes {
    ({ $($kvs:tt)* }) => {
        $crate::attributes_inner!(@ { }, { $($kvs)* })
    };
    ($($kvs:tt)*) => {
        $crate::attributes_inner!(@ { }, { $($kvs)* })
    };
}

/// The actual implementation of `attributes!`, separated out to avoid accidentally recursing into
/// the `$($tt)*` case from the inner cases.
#[doc(hidden)]
#[macro_export]
macro_rules! attributes_inner {
    // Base case, remaining tokens is empty.
    (@ { $($val:expr,)* }, { } ) => {{
        let attributes: ::std::vec::Vec<(::std::borrow::Cow<'static, str>, $crate::Value)> =
            ::std::vec![ $($val,)* ];
        attributes
    }};

    // Recursive cases, take one key-value pair, add it to the output, and recurse on the remaining
    // tokens.
    (@ { $($out:expr,)* }, { $($key:ident).+ $(, $($rest:tt)*)? }) => {
        $crate::attributes_inner!(
            @ { $($out,)* $crate::attribute!($($key).+), },
            { $($($rest)*)? }
        )
    };
    (@ { $($out:expr,)* }, { $key:ident = $value:expr $(, $($rest:tt)*)? }) => {
        $crate::attributes_inner!(
            @ { $($out,)* $crate::attribute!($key = $value), },
            { $($($rest)*)? }
        )
    };
    (@ { $($out:expr,)* }, { $key:literal = $value:expr $(, $($rest:tt)*)? }) => {
        $crate::attributes_inner!(
            @ { $($out,)* $crate::attribute!($key = $value), },
            { $($($rest)*)? }
        )
    };
}

/// Constructs a single named value.
///
/// ```rust
/// use attrlog::{Value, attribute};
///
/// let (name, value) = attribute!(Who = "world");
/// assert_eq!(name, "Who");
/// assert_eq!(value, Value::from("world"));
/// ```
#[macro_export]
macro_rules! attribute {
    ($key:ident = $value:expr) => {
        (
            ::std::borrow::Cow::<'static, str>::Borrowed(::core::stringify!($key)),
            $crate::Value::from($value),
        )
    };
    ($key:literal = $value:expr) => {
        (
            ::std::borrow::Cow::<'static, str>::Borrowed($key),
            $crate::Value::from($value),
        )
    };
    ($($key:ident).+) => {
        (
            ::std::borrow::Cow::<'static, str>::Borrowed(::core::stringify!($($key).+)),
            $crate::Value::from($($key).+),
        )
    };
}
