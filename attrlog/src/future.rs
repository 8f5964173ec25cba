//! Scope propagation for asynchronous tasks.
//!
//! A future wrapped with [`FutureExt`] carries its own scope chain for one logger. The chain is made active every
//! time the future is polled and saved back afterwards, so scopes begun inside the task stay with the task and never
//! leak into sibling tasks polled on the same thread.
//!
//! # Examples
//!
//! ```rust
//! use attrlog::{FutureExt, Level, Log, Logger};
//!
//! async fn handle(logger: &Logger) {
//!     logger.log(Level::Information, 0.into(), "handled", None, |state, _| state.to_string());
//! }
//!
//! async fn serve(logger: &Logger) {
//!     handle(logger)
//!         .with_scope(logger, "request 42")
//!         .unwrap()
//!         .await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::logger::context::{Activated, LoggerId};
use crate::scope::ScopeChain;
use crate::{Error, Logger, Value};

impl<T> FutureExt for T where T: Future {}

/// Extension trait for carrying a logger's scope chain through a future.
pub trait FutureExt: Future + Sized {
    /// Runs the future with the caller's current scope chain of `logger`.
    fn in_current_scope(self, logger: &Logger) -> WithScope<Self> {
        WithScope {
            inner: self,
            logger: logger.id(),
            chain: logger.current_scope(),
        }
    }

    /// Runs the future with `state` pushed onto the caller's current scope chain of `logger`.
    ///
    /// The scope ends when the future completes or is dropped. Fails with [`Error::InvalidArgument`] if `state` is
    /// [`Value::Null`].
    fn with_scope(self, logger: &Logger, state: impl Into<Value>) -> Result<WithScope<Self>, Error> {
        let mut chain = logger.current_scope();
        if logger.include_scopes() {
            chain = chain.push(state)?;
        } else if state.into().is_null() {
            return Err(Error::null("state"));
        }

        Ok(WithScope {
            inner: self,
            logger: logger.id(),
            chain,
        })
    }
}

/// A future carrying its own scope chain.
///
/// Created by [`FutureExt::in_current_scope`] and [`FutureExt::with_scope`].
#[pin_project::pin_project]
#[derive(Debug)]
pub struct WithScope<T> {
    #[pin]
    inner: T,
    logger: LoggerId,
    chain: ScopeChain,
}

impl<T> Future for WithScope<T>
where
    T: Future,
{
    type Output = T::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _active = Activated::new(*this.logger, this.chain);
        this.inner.poll(cx)
    }
}
