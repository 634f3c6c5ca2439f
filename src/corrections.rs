//! Bounded-edit correction enumeration: every stored key reachable from a
//! query by at most `max_depth` edits drawn from {delete, transpose,
//! insert, change}, per spec §4.5. This is the hardest component in the
//! crate — new relative to the teacher, built directly from the spec's
//! algorithm table rather than adapted from existing code, with its
//! frame/stack shape grounded in the suffix engine's `Frame`-and-stack
//! iterator pattern.
//!
//! Two forms are offered, both described by spec §4.5:
//! - [`Trie::corrections`] / [`Trie::find_corrections`]: a recursive
//!   do/undo DFS (§4.5.1), the natural direct translation of the
//!   algorithm.
//! - [`Trie::iter_corrections`]: the same DFS refactored into an explicit
//!   two-stack state machine (§4.5.2) that yields one match per
//!   [`Iterator::next`] call and can be paused, resumed, and reset.
//!
//! Neither form deduplicates: the same stored key may be reached by more
//! than one edit path and is reported once per path (§4.5.3). Emission
//! order is unspecified.

use tracing::warn;

use crate::error::{TrieError, TrieResult};
use crate::key::{chars_to_string, Key};
use crate::stack::BoundedStack;
use crate::trie::{descend_chars, Inner, Trie, ROOT};

/// Largest `max_depth` this crate will pre-size working stacks for.
///
/// The search space grows roughly with `max_depth` nested alternations of
/// {delete, transpose, insert-per-child, change-per-child}, so an
/// unbounded `max_depth` risks unbounded recursion (the callback form) or
/// an unbounded work stack (the iterator form). This stands in for the
/// source system's allocation-failure category (spec §7): rather than
/// letting a pathological request run until the allocator gives up, it is
/// rejected up front.
pub const MAX_CORRECTION_DEPTH: usize = 64;

impl<V: Clone> Trie<V> {
    /// Calls `f(key, value)` for every stored key reachable from `query` by
    /// at most `max_depth` edits. `max_depth = 0` means unbounded (clamped
    /// to [`Trie::height`]).
    ///
    /// Returns [`TrieError::Capacity`] if the resolved depth exceeds
    /// [`MAX_CORRECTION_DEPTH`].
    pub fn corrections(
        &self,
        query: &str,
        max_depth: usize,
        mut f: impl FnMut(&str, &V),
    ) -> TrieResult<()> {
        let max_depth = self.resolve_max_depth(max_depth);
        if max_depth > MAX_CORRECTION_DEPTH {
            return Err(TrieError::capacity(max_depth, MAX_CORRECTION_DEPTH));
        }

        let inner = self.borrow_inner();
        let mut key = Key::from(query);
        recurse(&inner, ROOT, &mut key, 0, max_depth, &mut f);
        Ok(())
    }

    /// Returns every `(key, value)` pair reachable from `query` by at most
    /// `max_depth` edits, as a non-deduplicated multiset.
    pub fn find_corrections(&self, query: &str, max_depth: usize) -> TrieResult<Vec<(String, V)>> {
        let mut out = Vec::new();
        self.corrections(query, max_depth, |k, v| out.push((k.to_string(), v.clone())))?;
        Ok(out)
    }

    /// Returns a lazy, resettable iterator over the same multiset as
    /// [`Trie::corrections`].
    pub fn iter_corrections(
        &self,
        query: &str,
        max_depth: usize,
    ) -> TrieResult<CorrectionIter<'_, V>> {
        let max_depth = self.resolve_max_depth(max_depth);
        if max_depth > MAX_CORRECTION_DEPTH {
            return Err(TrieError::capacity(max_depth, MAX_CORRECTION_DEPTH));
        }

        // Heuristic pre-sizing: the longest plausible call chain touches
        // on the order of max_depth nested edits, each possibly preceded
        // by a run of INDEXCHG steps over the (possibly insert-lengthened)
        // key. Exceeding this capacity is safe (Vec grows), just not
        // pre-allocated.
        let heuristic_depth = (max_depth + 1) * (query.chars().count() + max_depth + 2);

        let mut iter = CorrectionIter {
            trie: self,
            query: Key::from(query),
            max_depth,
            key: Key::new(),
            k0: BoundedStack::with_capacity(heuristic_depth.min(4096)),
            k1: BoundedStack::with_capacity(heuristic_depth.min(4096)),
            finished: false,
        };
        iter.reset();
        Ok(iter)
    }
}

/// Recursive do/undo DFS, spec §4.5.1.
fn recurse<V>(
    inner: &Inner<V>,
    pprefix: usize,
    key: &mut Key,
    c_index: usize,
    c_depth: usize,
    f: &mut impl FnMut(&str, &V),
) {
    // INDEXCHG can advance c_index one past key.len() (it recurses whenever
    // c_index <= key.len(), landing the next call at key.len() + 1). That
    // state is terminal and has nothing to emit: the frame at c_index ==
    // key.len() already checked the full key via an empty trailing slice.
    // Bail out before any key.as_slice()[..] access, which would otherwise
    // index past the end.
    if c_index > 0 && c_index - 1 >= key.len() {
        return;
    }

    let prefix = if c_index > 0 {
        inner.nodes[pprefix].children.get(key.as_slice()[c_index - 1])
    } else {
        Some(pprefix)
    };

    if let Some(prefix) = prefix {
        if let Some(end) = descend_chars(inner, prefix, &key.as_slice()[c_index..]) {
            if let Some(value) = inner.nodes[end].value.as_ref() {
                f(&chars_to_string(key.as_slice()), value);
            }
        }
    }

    if c_index > key.len() || c_depth == 0 {
        return;
    }

    // DELETE: restart from root, since removing a character may expose a
    // path that was not reachable from `pprefix`.
    if key.len() > 1 && c_index < key.len() {
        let deleted = key.remove(c_index);
        recurse(inner, ROOT, key, 0, c_depth - 1, f);
        key.insert(c_index, deleted);
    }

    // TRANSPOSE
    if c_index < key.len().saturating_sub(1) {
        key.transpose(c_index);
        recurse(inner, pprefix, key, c_index, c_depth - 1, f);
        key.transpose(c_index);
    }

    // INSERT and CHANGE only try characters that lead somewhere from
    // `prefix` — the pruning spec §4.5 calls essential.
    if let Some(prefix) = prefix {
        let children: Vec<(char, usize)> = inner.nodes[prefix].children.iter().collect();

        for &(c, _) in &children {
            key.insert(c_index, c);
            recurse(inner, pprefix, key, c_index, c_depth - 1, f);
            key.remove(c_index);
        }

        if c_index < key.len() {
            for &(c, _) in &children {
                let old = key.change(c_index, c);
                recurse(inner, pprefix, key, c_index, c_depth - 1, f);
                key.change(c_index, old);
            }
        }

        // INDEXCHG: advance without spending depth budget.
        if c_index <= key.len() {
            recurse(inner, prefix, key, c_index + 1, c_depth, f);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    MatchCheck,
    StopCheck,
    Delete,
    Transpose,
    Insert,
    Change,
    IndexChg,
    Done,
}

#[derive(Debug, Clone)]
struct CorrectionFrame {
    pprefix: usize,
    c_index: usize,
    c_depth: usize,
    phase: Phase,
    prefix: Option<usize>,
    prefix_computed: bool,
    children: Option<Vec<(char, usize)>>,
    insert_pos: usize,
    change_pos: usize,
    /// Whether the edit that created this frame pushed a record onto the
    /// history stack (`k1`) that must be undone when this frame finishes.
    /// False for the very first frame and for frames created by INDEXCHG,
    /// which does not mutate `key`.
    has_pending_undo: bool,
}

impl CorrectionFrame {
    fn new(pprefix: usize, c_index: usize, c_depth: usize, has_pending_undo: bool) -> Self {
        Self {
            pprefix,
            c_index,
            c_depth,
            phase: Phase::MatchCheck,
            prefix: None,
            prefix_computed: false,
            children: None,
            insert_pos: 0,
            change_pos: 0,
            has_pending_undo,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Undo {
    Delete { index: usize, ch: char },
    Transpose { index: usize },
    Insert { index: usize },
    Change { index: usize, old: char },
}

impl Undo {
    fn apply(self, key: &mut Key) {
        match self {
            Undo::Delete { index, ch } => key.insert(index, ch),
            Undo::Transpose { index } => key.transpose(index),
            Undo::Insert { index } => {
                key.remove(index);
            }
            Undo::Change { index, old } => {
                key.change(index, old);
            }
        }
    }
}

/// Lazy iterator returned by [`Trie::iter_corrections`].
///
/// Holds two explicit stacks per spec §4.5.2: `k0` (pending frames, each
/// resumable at the phase it left off on) and `k1` (a history of do'd
/// edits not yet undone). Re-borrows the trie fresh on every
/// [`Iterator::next`] call, consistent with every other iterator in this
/// crate.
pub struct CorrectionIter<'a, V> {
    trie: &'a Trie<V>,
    query: Key,
    max_depth: usize,
    key: Key,
    k0: BoundedStack<CorrectionFrame>,
    k1: BoundedStack<Undo>,
    finished: bool,
}

impl<'a, V: Clone> CorrectionIter<'a, V> {
    /// Restarts the iterator from the beginning and clears the trie's dirty
    /// flag.
    pub fn reset(&mut self) {
        self.key = self.query.clone();
        self.k0.clear();
        self.k1.clear();
        self.finished = false;
        self.trie.clear_dirty();
        self.k0.push(CorrectionFrame::new(ROOT, 0, self.max_depth, false));
    }
}

impl<'a, V: Clone> Iterator for CorrectionIter<'a, V> {
    type Item = TrieResult<(String, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.trie.is_dirty() {
            self.finished = true;
            warn!("correction iterator observed concurrent mutation");
            return Some(Err(TrieError::IterationInvalidated));
        }

        let inner = self.trie.borrow_inner();

        loop {
            let Some(mut frame) = self.k0.pop() else {
                self.finished = true;
                return None;
            };

            match frame.phase {
                Phase::MatchCheck => {
                    // Mirrors the recursive form's top-of-function guard: an
                    // IndexChg frame can be pushed at c_index == key.len() + 1
                    // (IndexChg advances whenever c_index <= key.len()). That
                    // state is terminal and has nothing to emit, so skip
                    // straight to Done instead of indexing past the key.
                    if frame.c_index > 0 && frame.c_index - 1 >= self.key.len() {
                        frame.phase = Phase::Done;
                        self.k0.push(frame);
                        continue;
                    }

                    if !frame.prefix_computed {
                        frame.prefix = if frame.c_index > 0 {
                            inner.nodes[frame.pprefix].children.get(self.key.as_slice()[frame.c_index - 1])
                        } else {
                            Some(frame.pprefix)
                        };
                        frame.prefix_computed = true;
                    }
                    frame.phase = Phase::StopCheck;

                    let emitted = frame.prefix.and_then(|prefix| {
                        descend_chars(&inner, prefix, &self.key.as_slice()[frame.c_index..])
                            .and_then(|end| inner.nodes[end].value.clone())
                    });

                    self.k0.push(frame);
                    if let Some(value) = emitted {
                        return Some(Ok((chars_to_string(self.key.as_slice()), value)));
                    }
                }

                Phase::StopCheck => {
                    frame.phase = if frame.c_index > self.key.len() || frame.c_depth == 0 {
                        Phase::Done
                    } else {
                        Phase::Delete
                    };
                    self.k0.push(frame);
                }

                Phase::Delete => {
                    if self.key.len() > 1 && frame.c_index < self.key.len() {
                        let ch = self.key.remove(frame.c_index);
                        self.k1.push(Undo::Delete { index: frame.c_index, ch });
                        let c_depth = frame.c_depth;
                        frame.phase = Phase::Transpose;
                        self.k0.push(frame);
                        self.k0.push(CorrectionFrame::new(ROOT, 0, c_depth - 1, true));
                    } else {
                        frame.phase = Phase::Transpose;
                        self.k0.push(frame);
                    }
                }

                Phase::Transpose => {
                    if frame.c_index < self.key.len().saturating_sub(1) {
                        self.key.transpose(frame.c_index);
                        self.k1.push(Undo::Transpose { index: frame.c_index });
                        let (pprefix, c_index, c_depth) = (frame.pprefix, frame.c_index, frame.c_depth);
                        frame.phase = Phase::Insert;
                        self.k0.push(frame);
                        self.k0.push(CorrectionFrame::new(pprefix, c_index, c_depth - 1, true));
                    } else {
                        frame.phase = Phase::Insert;
                        self.k0.push(frame);
                    }
                }

                Phase::Insert => match frame.prefix {
                    None => {
                        frame.phase = Phase::Change;
                        self.k0.push(frame);
                    }
                    Some(prefix) => {
                        if frame.children.is_none() {
                            frame.children = Some(inner.nodes[prefix].children.iter().collect());
                        }
                        let pos = frame.insert_pos;
                        let len = frame.children.as_ref().expect("just populated").len();
                        if pos < len {
                            let c = frame.children.as_ref().expect("just populated")[pos].0;
                            frame.insert_pos = pos + 1;
                            self.key.insert(frame.c_index, c);
                            self.k1.push(Undo::Insert { index: frame.c_index });
                            let (pprefix, c_index, c_depth) =
                                (frame.pprefix, frame.c_index, frame.c_depth);
                            self.k0.push(frame);
                            self.k0.push(CorrectionFrame::new(pprefix, c_index, c_depth - 1, true));
                        } else {
                            frame.phase = Phase::Change;
                            self.k0.push(frame);
                        }
                    }
                },

                Phase::Change => match frame.prefix {
                    None => {
                        frame.phase = Phase::IndexChg;
                        self.k0.push(frame);
                    }
                    Some(_) if frame.c_index >= self.key.len() => {
                        frame.phase = Phase::IndexChg;
                        self.k0.push(frame);
                    }
                    Some(_) => {
                        let pos = frame.change_pos;
                        let len = frame.children.as_ref().map_or(0, Vec::len);
                        if pos < len {
                            let c = frame.children.as_ref().expect("populated during Insert")[pos].0;
                            frame.change_pos = pos + 1;
                            let old = self.key.change(frame.c_index, c);
                            self.k1.push(Undo::Change { index: frame.c_index, old });
                            let (pprefix, c_index, c_depth) =
                                (frame.pprefix, frame.c_index, frame.c_depth);
                            self.k0.push(frame);
                            self.k0.push(CorrectionFrame::new(pprefix, c_index, c_depth - 1, true));
                        } else {
                            frame.phase = Phase::IndexChg;
                            self.k0.push(frame);
                        }
                    }
                },

                Phase::IndexChg => match frame.prefix {
                    Some(prefix) if frame.c_index <= self.key.len() => {
                        let (c_index, c_depth) = (frame.c_index, frame.c_depth);
                        frame.phase = Phase::Done;
                        self.k0.push(frame);
                        self.k0.push(CorrectionFrame::new(prefix, c_index + 1, c_depth, false));
                    }
                    _ => {
                        frame.phase = Phase::Done;
                        self.k0.push(frame);
                    }
                },

                Phase::Done => {
                    if frame.has_pending_undo {
                        if let Some(undo) = self.k1.pop() {
                            undo.apply(&mut self.key);
                        }
                    }
                    // Not pushed back: this call is fully resolved.
                }
            }
        }
    }
}

impl<'a, V> std::fmt::Debug for CorrectionIter<'a, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionIter")
            .field("query", &self.query.to_string())
            .field("max_depth", &self.max_depth)
            .field("finished", &self.finished)
            .finish()
    }
}
