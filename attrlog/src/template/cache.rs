use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use regex::Regex;

/// Distinct key sets the process-wide cache holds.
pub const DEFAULT_CAPACITY: usize = 1024;

static GLOBAL: LazyLock<MatcherCache> = LazyLock::new(|| MatcherCache::new(DEFAULT_CAPACITY));

/// A bounded cache of placeholder matchers keyed by sorted placeholder key sets.
///
/// Key sets beyond `capacity` are never cached: they get a throwaway matcher per call. Nothing is evicted.
pub struct MatcherCache {
    matchers: DashMap<Box<[String]>, Arc<Regex>>,
    capacity: usize,
    len: AtomicUsize,
    compilations: AtomicUsize,
    warned_full: AtomicBool,
}

impl MatcherCache {
    /// Creates an empty cache holding at most `capacity` key sets.
    pub fn new(capacity: usize) -> Self {
        Self {
            matchers: DashMap::new(),
            capacity,
            len: AtomicUsize::new(0),
            compilations: AtomicUsize::new(0),
            warned_full: AtomicBool::new(false),
        }
    }

    /// The process-wide cache used by [`Template::format_message`].
    ///
    /// [`Template::format_message`]: super::Template::format_message
    pub fn global() -> &'static MatcherCache {
        &GLOBAL
    }

    /// The maximum number of cached key sets.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of cached key sets.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether no key set is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many matchers were compiled, cached or not.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Returns the matcher for `keys`, which must already be escaped and sorted.
    ///
    /// No map lock is held while compiling. Concurrent callers for the same missing key set may each compile it;
    /// the first insertion wins and every caller gets the winner's matcher.
    pub fn matcher(&self, keys: &[String]) -> Result<Arc<Regex>, regex::Error> {
        if let Some(matcher) = self.matchers.get(keys) {
            return Ok(Arc::clone(&matcher));
        }

        // Reserve a slot up front so in-flight compiles count against the capacity.
        if self.len.fetch_add(1, Ordering::AcqRel) >= self.capacity {
            self.len.fetch_sub(1, Ordering::AcqRel);
            return self.uncached(keys);
        }

        let compiled = match self.compile(keys) {
            Ok(matcher) => Arc::new(matcher),
            Err(error) => {
                self.len.fetch_sub(1, Ordering::AcqRel);
                return Err(error);
            }
        };

        let winner = Arc::clone(
            &self
                .matchers
                .entry(keys.into())
                .or_insert_with(|| Arc::clone(&compiled)),
        );
        if !Arc::ptr_eq(&winner, &compiled) {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        Ok(winner)
    }

    fn uncached(&self, keys: &[String]) -> Result<Arc<Regex>, regex::Error> {
        if !self.warned_full.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                capacity = self.capacity,
                "placeholder matcher cache is full, further key sets are compiled per call"
            );
        }
        self.compile(keys).map(Arc::new)
    }

    fn compile(&self, keys: &[String]) -> Result<Regex, regex::Error> {
        self.compilations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(keys = keys.len(), "compiling placeholder matcher");
        Regex::new(&format!(r"\{{({})\}}", keys.join("|")))
    }
}

impl fmt::Debug for MatcherCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("compilations", &self.compilations())
            .finish_non_exhaustive()
    }
}
