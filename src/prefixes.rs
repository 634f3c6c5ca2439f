//! Prefix enumeration: all stored keys that are themselves prefixes of a
//! query string.
//!
//! This is the mirror image of the suffix engine (`suffixes.rs`, which
//! enumerates descendants *under* a node) and has no equivalent in the
//! teacher crate's trie — it walks the query one character at a time and
//! reports a match at every valued node the walk passes through, per
//! spec §4.4.

use tracing::warn;

use crate::error::{TrieError, TrieResult};
use crate::key::{chars_to_string, Key};
use crate::trie::{Trie, ROOT};

impl<V: Clone> Trie<V> {
    /// Calls `f(key, value)` for every stored key that is a prefix of
    /// `query`, in increasing order of length.
    ///
    /// Stops after `max_depth` characters of `query` have been consumed
    /// (`0` means unbounded, clamped to [`Trie::height`]), after the whole
    /// of `query` has been consumed, or as soon as no child matches the
    /// next character — whichever comes first.
    pub fn prefixes(&self, query: &str, max_depth: usize, mut f: impl FnMut(&str, &V)) {
        let max_depth = self.resolve_max_depth(max_depth);
        let inner = self.borrow_inner();
        let chars = Key::from(query);

        // The empty string is a prefix of every query; the root node is
        // where it would be stored, and the loop below only ever checks
        // nodes reached *after* consuming at least one character.
        if let Some(value) = inner.nodes[ROOT].value.as_ref() {
            f("", value);
        }

        let mut current = ROOT;
        for (i, &ch) in chars.as_slice().iter().enumerate() {
            if i >= max_depth {
                break;
            }
            let Some(next) = inner.nodes[current].children.get(ch) else {
                break;
            };
            current = next;
            if let Some(value) = inner.nodes[current].value.as_ref() {
                f(&chars_to_string(&chars.as_slice()[..=i]), value);
            }
        }
    }

    /// Returns every stored key that is a prefix of `query`, shortest first.
    pub fn find_prefixes(&self, query: &str, max_depth: usize) -> Vec<(String, V)> {
        let mut out = Vec::new();
        self.prefixes(query, max_depth, |k, v| out.push((k.to_string(), v.clone())));
        out
    }

    /// Returns a lazy, resettable iterator over every stored key that is a
    /// prefix of `query`.
    pub fn iter_prefixes(&self, query: &str, max_depth: usize) -> PrefixIter<'_, V> {
        let mut iter = PrefixIter {
            trie: self,
            query: Key::from(query),
            max_depth: self.resolve_max_depth(max_depth),
            node: ROOT,
            i: 0,
            emitted_root: false,
            finished: false,
        };
        iter.reset();
        iter
    }
}

/// Lazy iterator returned by [`Trie::iter_prefixes`].
///
/// Holds a single `{current_node, i}` frame (spec §4.4's "one frame"),
/// re-borrowing the trie fresh on each [`Iterator::next`] call.
pub struct PrefixIter<'a, V> {
    trie: &'a Trie<V>,
    query: Key,
    max_depth: usize,
    node: usize,
    i: usize,
    emitted_root: bool,
    finished: bool,
}

impl<'a, V: Clone> PrefixIter<'a, V> {
    /// Restarts the iterator from the beginning and clears the trie's dirty
    /// flag.
    pub fn reset(&mut self) {
        self.node = ROOT;
        self.i = 0;
        self.emitted_root = false;
        self.finished = false;
        self.trie.clear_dirty();
    }
}

impl<'a, V: Clone> Iterator for PrefixIter<'a, V> {
    type Item = TrieResult<(String, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // The empty string is a prefix of every query and is stored (if at
        // all) on the root node itself, which the per-character loop below
        // never inspects.
        if !self.emitted_root {
            self.emitted_root = true;
            if self.trie.is_dirty() {
                self.finished = true;
                warn!("prefix iterator observed concurrent mutation");
                return Some(Err(TrieError::IterationInvalidated));
            }
            let inner = self.trie.borrow_inner();
            if let Some(value) = inner.nodes[ROOT].value.clone() {
                return Some(Ok((String::new(), value)));
            }
        }

        loop {
            if self.trie.is_dirty() {
                self.finished = true;
                warn!("prefix iterator observed concurrent mutation");
                return Some(Err(TrieError::IterationInvalidated));
            }
            if self.i >= self.max_depth || self.i >= self.query.len() {
                self.finished = true;
                return None;
            }

            let inner = self.trie.borrow_inner();
            let ch = self.query.as_slice()[self.i];
            let Some(next) = inner.nodes[self.node].children.get(ch) else {
                self.finished = true;
                return None;
            };
            self.node = next;
            self.i += 1;

            if let Some(value) = inner.nodes[self.node].value.clone() {
                let key = chars_to_string(&self.query.as_slice()[..self.i]);
                return Some(Ok((key, value)));
            }
        }
    }
}

impl<'a, V> std::fmt::Debug for PrefixIter<'a, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixIter")
            .field("query", &self.query.to_string())
            .field("i", &self.i)
            .field("finished", &self.finished)
            .finish()
    }
}
