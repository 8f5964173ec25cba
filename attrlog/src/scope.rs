//! Immutable scope chains.
//!
//! A scope chain is a singly-linked list of [`ScopeFrame`]s, nearest first. Frames are shared through [`Arc`] and
//! never mutated, so a chain captured by a log entry stays valid however the logger's active chain changes afterwards.
//!
//! ```rust
//! use attrlog::ScopeChain;
//!
//! let outer = ScopeChain::default().push("request").unwrap();
//! let inner = outer.push("handler").unwrap();
//!
//! let states: Vec<String> = inner.states().map(|state| state.to_string()).collect();
//! assert_eq!(states, ["handler", "request"]);
//! assert_eq!(inner.parent(), outer);
//! ```

use std::sync::Arc;

use crate::{Error, Value};

/// One link of a scope chain.
#[derive(Debug)]
pub struct ScopeFrame {
    state: Value,
    parent: Option<Arc<ScopeFrame>>,
}

impl ScopeFrame {
    /// The state this frame was pushed with.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// The enclosing frame, if any.
    pub fn parent(&self) -> Option<&Arc<ScopeFrame>> {
        self.parent.as_ref()
    }
}

impl Drop for ScopeFrame {
    fn drop(&mut self) {
        // Unlink iteratively so that long chains cannot overflow the stack.
        let mut next = self.parent.take();
        while let Some(frame) = next {
            next = match Arc::try_unwrap(frame) {
                Ok(mut frame) => frame.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// A handle to the head of an immutable scope chain.
///
/// Cloning is cheap: clones share frames.
#[derive(Clone, Debug, Default)]
pub struct ScopeChain {
    head: Option<Arc<ScopeFrame>>,
}

impl ScopeChain {
    /// Returns a new chain with `state` pushed in front of this one.
    ///
    /// Fails with [`Error::InvalidArgument`] if `state` is [`Value::Null`].
    pub fn push(&self, state: impl Into<Value>) -> Result<ScopeChain, Error> {
        let state = state.into();
        if state.is_null() {
            return Err(Error::null("state"));
        }
        Ok(self.push_frame(state))
    }

    pub(crate) fn push_frame(&self, state: Value) -> ScopeChain {
        ScopeChain {
            head: Some(Arc::new(ScopeFrame {
                state,
                parent: self.head.clone(),
            })),
        }
    }

    /// Builds a chain from scope states given nearest first.
    ///
    /// Fails with [`Error::InvalidArgument`] if any state is [`Value::Null`].
    pub fn from_states<I>(states: I) -> Result<ScopeChain, Error>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let states = states
            .into_iter()
            .map(|state| {
                let state = state.into();
                if state.is_null() {
                    Err(Error::null("scope"))
                } else {
                    Ok(state)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(states
            .into_iter()
            .rev()
            .fold(ScopeChain::default(), |chain, state| chain.push_frame(state)))
    }

    /// The nearest frame, if any.
    pub fn head(&self) -> Option<&Arc<ScopeFrame>> {
        self.head.as_ref()
    }

    /// The chain without its nearest frame.
    pub fn parent(&self) -> ScopeChain {
        ScopeChain {
            head: self.head.as_ref().and_then(|frame| frame.parent.clone()),
        }
    }

    /// Whether the chain has no frames.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The number of frames.
    pub fn len(&self) -> usize {
        self.frames().count()
    }

    /// Iterates frames nearest to farthest.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            next: self.head.as_deref(),
        }
    }

    /// Iterates frame states nearest to farthest.
    pub fn states(&self) -> impl Iterator<Item = &Value> + '_ {
        self.frames().map(ScopeFrame::state)
    }

    /// Whether `frame` is this chain's head.
    pub(crate) fn is_head(&self, frame: &Arc<ScopeFrame>) -> bool {
        self.head.as_ref().is_some_and(|head| Arc::ptr_eq(head, frame))
    }
}

impl PartialEq for ScopeChain {
    fn eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Iterator over the frames of a [`ScopeChain`].
#[derive(Debug)]
pub struct Frames<'a> {
    next: Option<&'a ScopeFrame>,
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a ScopeFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.parent.as_deref();
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rejects_null() {
        assert_eq!(
            ScopeChain::default().push(Value::Null).unwrap_err(),
            Error::null("state")
        );
    }

    #[test]
    fn push_links_parent() {
        let root = ScopeChain::default();
        let outer = root.push("outer").unwrap();
        let inner = outer.push("inner").unwrap();

        assert!(root.is_empty());
        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 2);
        assert_eq!(inner.parent(), outer);
        assert_eq!(inner.parent().parent(), root);
        assert!(inner.head().unwrap().parent().is_some());
    }

    #[test]
    fn from_states_nearest_first() {
        let chain = ScopeChain::from_states(["near", "far"]).unwrap();
        let states: Vec<_> = chain.states().cloned().collect();
        assert_eq!(states, vec![Value::from("near"), Value::from("far")]);
    }

    #[test]
    fn from_states_rejects_null() {
        let error = ScopeChain::from_states([Value::from(1), Value::Null]).unwrap_err();
        assert_eq!(error, Error::null("scope"));
    }

    #[test]
    fn equality_is_identity() {
        let a = ScopeChain::default().push("x").unwrap();
        let b = ScopeChain::default().push("x").unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(ScopeChain::default(), ScopeChain::default());
    }

    #[test]
    fn deep_chain_drops() {
        let mut chain = ScopeChain::default();
        for i in 0..200_000 {
            chain = chain.push(i).unwrap();
        }
        assert_eq!(chain.len(), 200_000);
        drop(chain);
    }

    #[test]
    fn shared_tail_survives_drop() {
        let tail = ScopeChain::from_states(["b", "c"]).unwrap();
        let chain = tail.push("a").unwrap();
        drop(chain);
        assert_eq!(tail.len(), 2);
    }
}
