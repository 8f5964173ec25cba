//! Per-flow active scope chains.
//!
//! Each thread keeps one active [`ScopeChain`] per logger. Asynchronous tasks carry their own chain and swap it in
//! for the duration of each poll, see [`FutureExt`].
//!
//! [`FutureExt`]: crate::future::FutureExt

use std::cell::RefCell;
use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::scope::{ScopeChain, ScopeFrame};

thread_local! {
    static CURRENT_SCOPES: RefCell<FxHashMap<u64, ScopeChain>> = RefCell::new(FxHashMap::default());
}

/// Identifies a logger's slot in the per-thread scope map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct LoggerId(u64);

impl LoggerId {
    pub(crate) fn next_id() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        LoggerId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// The active chain of `logger` on this thread.
pub(crate) fn current(logger: LoggerId) -> ScopeChain {
    CURRENT_SCOPES
        .try_with(|scopes| scopes.borrow().get(&logger.0).cloned())
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Replaces the active chain of `logger` on this thread, returning the previous one.
pub(crate) fn replace(logger: LoggerId, chain: ScopeChain) -> ScopeChain {
    CURRENT_SCOPES
        .try_with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            if chain.is_empty() {
                scopes.remove(&logger.0)
            } else {
                scopes.insert(logger.0, chain)
            }
        })
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Deactivates `frame` on this thread.
///
/// Frames pushed after `frame` and still active are deactivated with it. If `frame` is not part of the active chain
/// the whole chain is drained.
fn release(logger: LoggerId, frame: &Arc<ScopeFrame>) {
    let _ = CURRENT_SCOPES.try_with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        let Some(chain) = scopes.get_mut(&logger.0) else {
            return;
        };
        while !chain.is_empty() {
            let found = chain.is_head(frame);
            *chain = chain.parent();
            if found {
                break;
            }
        }
        if chain.is_empty() {
            scopes.remove(&logger.0);
        }
    });
}

/// Forgets every chain of `logger` on this thread.
pub(crate) fn forget(logger: LoggerId) {
    let _ = CURRENT_SCOPES.try_with(|scopes| scopes.borrow_mut().remove(&logger.0));
}

/// Keeps a captured chain active until dropped, then saves it back and restores the previous one.
pub(crate) struct Activated<'a> {
    logger: LoggerId,
    chain: &'a mut ScopeChain,
    previous: ScopeChain,
}

impl<'a> Activated<'a> {
    pub(crate) fn new(logger: LoggerId, chain: &'a mut ScopeChain) -> Self {
        let previous = replace(logger, mem::take(chain));
        Self {
            logger,
            chain,
            previous,
        }
    }
}

impl Drop for Activated<'_> {
    fn drop(&mut self) {
        *self.chain = replace(self.logger, mem::take(&mut self.previous));
    }
}

/// Releases its scope when dropped or [released](ScopeGuard::release).
///
/// Returned by [`Log::begin_scope`](crate::Log::begin_scope).
#[derive(Debug)]
#[must_use = "the scope ends when the guard is dropped"]
pub struct ScopeGuard {
    logger: LoggerId,
    frame: Option<Arc<ScopeFrame>>,

    /// ```compile_fail
    /// use attrlog::ScopeGuard;
    /// trait AssertSend: Send {}
    ///
    /// impl AssertSend for ScopeGuard {}
    /// ```
    _not_send: PhantomNotSend,
}

impl ScopeGuard {
    pub(crate) fn new(logger: LoggerId, frame: Arc<ScopeFrame>) -> Self {
        Self {
            logger,
            frame: Some(frame),
            _not_send: PhantomNotSend,
        }
    }

    /// The state this scope was begun with.
    pub fn state(&self) -> Option<&crate::Value> {
        self.frame.as_deref().map(ScopeFrame::state)
    }

    /// Releases the scope now. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if let Some(frame) = self.frame.take() {
            release(self.logger, &frame);
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Makes [`ScopeGuard`] `!Send`: it must be released on the thread whose active chain it changed.
#[derive(Debug)]
struct PhantomNotSend {
    ghost: PhantomData<*mut ()>,
}

#[allow(non_upper_case_globals)]
const PhantomNotSend: PhantomNotSend = PhantomNotSend { ghost: PhantomData };

/// # Safety:
///
/// Trivially safe, as `PhantomNotSend` doesn't have any API.
unsafe impl Sync for PhantomNotSend {}
