#![allow(clippy::len_without_is_empty)]

//! The trie container and its core mutation operations: `search`, `add`,
//! `del`.
//!
//! Nodes live in a `Vec<Node<V>>` arena and reference each other by index,
//! continuing the arena-with-free-list layout from the teacher crate's
//! `collections::trie::Trie` (itself chosen there to keep cloning cheap and
//! avoid pointer chains). Deleted nodes go onto a free list and are reused
//! by later inserts rather than shrinking the arena.
//!
//! **Interior mutability.** The source system this crate models is a plain
//! C struct mutated through raw pointers: nothing stops a write from
//! happening while some other piece of code is mid-traversal, which is
//! exactly why it carries a `dirty` flag that every iterator checks. A
//! Rust trie whose mutators take `&mut self` would make that scenario a
//! compile error instead of a runtime one — stricter, but untestable, and
//! it would silently drop a behavior spec §5 and §8 require. So the
//! mutable state lives behind a `RefCell`: `add`/`del`/`clear` take `&self`
//! and borrow it mutably for the duration of one call, which lets an
//! iterator hold a plain `&Trie<V>` across calls to `next()` while another
//! piece of code calls `trie.add(...)` in between — at which point the
//! iterator's next `next()` observes `dirty` and fails, per spec.

use std::cell::{Ref, RefCell};

use tracing::{debug, trace};

use crate::error::{TrieError, TrieResult};
use crate::node::Node;

/// Root node always lives at this arena index.
pub(crate) const ROOT: usize = 0;

/// Best-effort per-node accounting used to keep [`Trie::mem_usage`]
/// approximately in sync with allocation. This is definitional (spec §3:
/// "best-effort accumulator"), not a precise measurement of heap usage.
const ESTIMATED_NODE_BYTES: usize = std::mem::size_of::<usize>() * 8;

/// The mutable state behind [`Trie`]'s `RefCell`.
#[derive(Debug, Clone)]
pub(crate) struct Inner<V> {
    pub(crate) nodes: Vec<Node<V>>,
    pub(crate) free_list: Vec<usize>,
    pub(crate) item_count: usize,
    pub(crate) height: usize,
    pub(crate) dirty: bool,
    pub(crate) mem_usage: usize,
}

/// An in-memory trie mapping Unicode string keys to values of type `V`.
///
/// The core never inspects `V`; it only stores, returns, and overwrites it.
/// See the crate-level docs for the suffix/prefix/correction enumeration
/// engines built on top of this container.
#[derive(Debug)]
pub struct Trie<V> {
    pub(crate) inner: RefCell<Inner<V>>,
}

impl<V> Trie<V> {
    /// Creates a new, empty trie containing only the root.
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner {
                nodes: vec![Node::new('\0')],
                free_list: Vec::new(),
                item_count: 0,
                height: 0,
                dirty: false,
                mem_usage: ESTIMATED_NODE_BYTES,
            }),
        }
    }

    /// Number of stored keys (nodes with a non-empty value).
    pub fn len(&self) -> usize {
        self.inner.borrow().item_count
    }

    /// Whether the trie holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.nodes.len() - inner.free_list.len()
    }

    /// Length of the longest key ever stored.
    ///
    /// This is a non-decreasing upper bound, not necessarily the exact
    /// current maximum: `del` does not tighten it back down (spec §9 Open
    /// Question, resolved here in favor of the looser, cheaper behavior).
    pub fn height(&self) -> usize {
        self.inner.borrow().height
    }

    /// Best-effort estimate of bytes owned by this trie's node arena.
    pub fn mem_usage(&self) -> usize {
        self.inner.borrow().mem_usage
    }

    /// Whether the trie has been mutated since the last time an iterator
    /// cleared this flag (at construction or `reset`).
    pub(crate) fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty
    }

    pub(crate) fn clear_dirty(&self) {
        self.inner.borrow_mut().dirty = false;
    }

    /// Resolves `max_depth = 0` ("unbounded") to [`Trie::height`], per
    /// spec §6.
    pub(crate) fn resolve_max_depth(&self, max_depth: usize) -> usize {
        if max_depth == 0 {
            self.height()
        } else {
            max_depth
        }
    }

    /// Read-only access to the node arena, for the suffix/prefix/correction
    /// engines in sibling modules.
    pub(crate) fn borrow_inner(&self) -> Ref<'_, Inner<V>> {
        self.inner.borrow()
    }

    /// Inserts or overwrites `key` with `value`, returning the value that
    /// was previously stored there, if any.
    ///
    /// The returned value is this crate's analogue of the source system's
    /// ref-count hook: a host embedding this trie can inspect (or drop) the
    /// displaced value however its own bookkeeping requires, instead of the
    /// core invoking a callback on its behalf.
    pub fn add(&self, key: &str, value: V) -> Option<V> {
        let mut inner = self.inner.borrow_mut();
        let mut current = ROOT;
        let mut len = 0usize;

        for ch in key.chars() {
            current = child_or_insert(&mut inner, current, ch);
            len += 1;
        }

        inner.height = inner.height.max(len);
        inner.dirty = true;

        let previous = inner.nodes[current].value.replace(value);
        if previous.is_none() {
            inner.item_count += 1;
            trace!(key, "inserted new key");
        } else {
            trace!(key, "overwrote existing key");
        }
        previous
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// Implements the "record the descent path, then walk it back"
    /// alternative from spec §9 rather than the source system's in-place
    /// back-walk: after clearing the terminal's value, every ancestor from
    /// deepest to shallowest is removed iff it is now valueless and
    /// childless. The root is never removed.
    pub fn del(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.borrow_mut();
        let mut current = ROOT;
        let mut path = Vec::with_capacity(key.chars().count());

        for ch in key.chars() {
            let next = inner.nodes[current].children.get(ch)?;
            path.push((current, ch));
            current = next;
        }

        let removed = inner.nodes[current].value.take()?;
        inner.item_count -= 1;
        inner.dirty = true;

        let mut node_to_check = current;
        while let Some((parent, ch)) = path.pop() {
            if !inner.nodes[node_to_check].is_garbage() {
                break;
            }
            inner.nodes[parent].children.remove(ch);
            recycle(&mut inner, node_to_check);
            node_to_check = parent;
        }

        debug!(key, "removed key");
        Some(removed)
    }

    /// Removes every key, without shrinking the node arena's backing
    /// storage.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.nodes.truncate(1);
        inner.nodes[ROOT].reset('\0');
        inner.free_list.clear();
        inner.item_count = 0;
        inner.height = 0;
        inner.dirty = true;
        inner.mem_usage = ESTIMATED_NODE_BYTES;
    }
}

impl<V: Clone> Trie<V> {
    /// Returns a clone of the value stored at `key`, if any.
    ///
    /// Distinguishes "no such key" from "`key` is a prefix of stored keys
    /// but was never itself inserted": both return `None` here, matching
    /// `search`'s contract in spec §4.1 (the terminal node exists either
    /// way; only a non-empty value counts as a match).
    pub fn search(&self, key: &str) -> Option<V> {
        let inner = self.inner.borrow();
        let idx = descend(&inner, ROOT, key.chars())?;
        inner.nodes[idx].value.clone()
    }

    /// Whether `key` is stored (has a value), as opposed to merely being a
    /// prefix of some stored key.
    pub fn contains(&self, key: &str) -> bool {
        self.search(key).is_some()
    }

    /// Like [`Trie::search`], but surfaces a typed [`TrieError::NotFound`]
    /// instead of `None` for callers that want `get`'s error-raising shape
    /// from spec §6 rather than `search`'s `Option`-returning one.
    pub fn get_or_err(&self, key: &str) -> TrieResult<V> {
        self.search(key).ok_or_else(|| TrieError::not_found(key))
    }

    /// Creates a full structural copy of this trie.
    ///
    /// Resolves spec §9's Open Question about `copy`'s scoping:
    /// this is unconditionally a full copy; if a caller wants a scoped
    /// subset they should build a fresh [`Trie`] from [`Trie::iter_suffixes`]
    /// results instead.
    pub fn deep_clone(&self) -> Self {
        let inner = self.inner.borrow();
        Self { inner: RefCell::new(inner.clone()) }
    }
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Extend<(String, V)> for Trie<V> {
    /// Inserts every `(key, value)` pair, in iteration order. This is the
    /// Rust-idiomatic realization of spec §6's `update` operation.
    fn extend<I: IntoIterator<Item = (String, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(&key, value);
        }
    }
}

impl<V: Clone> FromIterator<(String, V)> for Trie<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let trie = Self::new();
        for (key, value) in iter {
            trie.add(&key, value);
        }
        trie
    }
}

/// Follows `chars` from arena index `from`, returning the terminal node's
/// arena index, or `None` on the first character with no matching child
/// (fail-fast descent, spec §4.1).
pub(crate) fn descend<V>(
    inner: &Inner<V>,
    from: usize,
    chars: std::str::Chars<'_>,
) -> Option<usize> {
    let mut current = from;
    for ch in chars {
        current = inner.nodes[current].children.get(ch)?;
    }
    Some(current)
}

/// Like [`descend`] but over an already-widened character slice, used by
/// the correction engine's do/undo traversal.
pub(crate) fn descend_chars<V>(inner: &Inner<V>, from: usize, chars: &[char]) -> Option<usize> {
    let mut current = from;
    for &ch in chars {
        current = inner.nodes[current].children.get(ch)?;
    }
    Some(current)
}

fn child_or_insert<V>(inner: &mut Inner<V>, parent: usize, ch: char) -> usize {
    if let Some(idx) = inner.nodes[parent].children.get(ch) {
        return idx;
    }
    let idx = allocate(inner, ch);
    inner.nodes[parent].children.insert(ch, idx);
    idx
}

fn allocate<V>(inner: &mut Inner<V>, label: char) -> usize {
    if let Some(idx) = inner.free_list.pop() {
        inner.nodes[idx].reset(label);
        idx
    } else {
        inner.nodes.push(Node::new(label));
        inner.mem_usage += ESTIMATED_NODE_BYTES;
        inner.nodes.len() - 1
    }
}

fn recycle<V>(inner: &mut Inner<V>, idx: usize) {
    inner.nodes[idx].reset('\0');
    inner.free_list.push(idx);
}
