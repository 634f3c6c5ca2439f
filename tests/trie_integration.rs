//! End-to-end scenarios for `trie::Trie`, covering the concrete scenarios
//! and quantified invariants a unit test embedded in a single module can't
//! exercise as naturally: multi-operation sequences across the core
//! mutation API and all three enumeration engines together.

#![allow(clippy::doc_lazy_continuation)]

use std::collections::HashSet;

use trie::{Trie, TrieError};

/// Insert `"cat"→1, "car"→2, "cart"→3`; `len = 3`; `search("car") = 2`;
/// `suffixes("ca") = {"cat","car","cart"}`; `prefixes("cart") = {"car","cart"}`.
#[test]
fn cat_car_cart_scenario() {
    let trie = Trie::new();
    trie.add("cat", 1);
    trie.add("car", 2);
    trie.add("cart", 3);

    assert_eq!(trie.len(), 3);
    assert_eq!(trie.search("car"), Some(2));

    let suffixes: HashSet<_> =
        trie.find_suffixes("ca", 0).into_iter().map(|(k, _)| k).collect();
    assert_eq!(suffixes, HashSet::from(["cat".to_string(), "car".to_string(), "cart".to_string()]));

    let prefixes: Vec<_> = trie.find_prefixes("cart", 0).into_iter().map(|(k, _)| k).collect();
    assert_eq!(prefixes, vec!["car".to_string(), "cart".to_string()]);
}

/// Insert `"cat"→1`; `del("cat")`; `len = 0`; `"cat" ∉ trie`; node_count
/// decays to 1 (root only).
#[test]
fn delete_prunes_back_to_an_empty_trie() {
    let trie = Trie::new();
    trie.add("cat", 1);
    assert_eq!(trie.del("cat"), Some(1));
    assert_eq!(trie.len(), 0);
    assert!(!trie.contains("cat"));
    assert_eq!(trie.node_count(), 1);
}

/// Insert `"cat","cap","can"`; `corrections("cat", 1) ⊇ {"cat","cap","can"}`
/// via CHANGE and via match-with-zero-edits.
#[test]
fn corrections_at_depth_one_recovers_all_siblings() {
    let trie = Trie::new();
    trie.add("cat", 1);
    trie.add("cap", 2);
    trie.add("can", 3);

    let got: HashSet<_> =
        trie.find_corrections("cat", 1).unwrap().into_iter().map(|(k, _)| k).collect();
    assert!(got.contains("cat"));
    assert!(got.contains("cap"));
    assert!(got.contains("can"));
}

/// Insert `"cat"`; `corrections("act", 2) ∋ "cat"` (two TRANSPOSEs, or one
/// DELETE plus one INSERT).
#[test]
fn corrections_at_depth_two_recovers_a_transposed_key() {
    let trie = Trie::new();
    trie.add("cat", 1);

    let got: HashSet<_> =
        trie.find_corrections("act", 2).unwrap().into_iter().map(|(k, _)| k).collect();
    assert!(got.contains("cat"));
}

/// Insert `"hello"→"world"`; serialize → state `S`; create a fresh trie;
/// deserialize `S`; `search("hello") = "world"`.
#[test]
fn serialize_then_deserialize_round_trips_a_value() {
    let trie = Trie::new();
    trie.add("hello", "world".to_string());

    let state = trie.serialize();
    let restored = Trie::deserialize(&state).unwrap();

    assert_eq!(restored.search("hello"), Some("world".to_string()));
}

/// Insert N keys, start `iter_suffixes("")`, consume one, mutate, `next` →
/// fails with *modified-during-iteration*. Repeated for all three
/// enumeration engines, not just suffixes.
#[test]
fn mutation_mid_iteration_invalidates_every_engine() {
    let trie = Trie::new();
    trie.add("alpha", 1);
    trie.add("alchemy", 2);
    trie.add("beta", 3);

    let mut suffix_it = trie.iter_suffixes("al", 0);
    assert!(suffix_it.next().is_some());
    trie.add("gamma", 4);
    assert!(matches!(suffix_it.next(), Some(Err(TrieError::IterationInvalidated))));

    let mut prefix_it = trie.iter_prefixes("alphabet", 0);
    assert!(prefix_it.next().is_some());
    trie.add("delta", 5);
    assert!(matches!(prefix_it.next(), Some(Err(TrieError::IterationInvalidated))));

    let mut correction_it = trie.iter_corrections("alpha", 1).unwrap();
    assert!(correction_it.next().is_some());
    trie.add("epsilon", 6);
    assert!(matches!(correction_it.next(), Some(Err(TrieError::IterationInvalidated))));
}

/// Commutativity of distinct-key insertion: inserting in either order
/// yields the same key set and the same values.
#[test]
fn insertion_order_is_commutative() {
    let forward = Trie::new();
    for (k, v) in [("cat", 1), ("car", 2), ("cart", 3), ("dog", 4)] {
        forward.add(k, v);
    }

    let backward = Trie::new();
    for (k, v) in [("dog", 4), ("cart", 3), ("car", 2), ("cat", 1)] {
        backward.add(k, v);
    }

    for key in ["cat", "car", "cart", "dog"] {
        assert_eq!(forward.search(key), backward.search(key));
    }
    assert_eq!(forward.len(), backward.len());
}

/// `item_count` tracks exactly the set of inserted-and-not-deleted keys.
#[test]
fn item_count_matches_the_live_key_set() {
    let trie = Trie::new();
    trie.add("one", 1);
    trie.add("two", 2);
    trie.add("three", 3);
    trie.del("two");

    assert_eq!(trie.len(), 2);
    assert!(trie.contains("one"));
    assert!(!trie.contains("two"));
    assert!(trie.contains("three"));
}

/// After deleting every key that shares a node's subtree, no valueless,
/// childless non-root node remains reachable.
#[test]
fn deleting_every_key_prunes_every_non_root_node() {
    let trie = Trie::new();
    trie.add("car", 1);
    trie.add("cart", 2);
    trie.add("cat", 3);

    trie.del("car");
    trie.del("cart");
    trie.del("cat");

    assert_eq!(trie.node_count(), 1);
    assert!(trie.is_empty());
}

/// A full-trie default iteration (`Trie::iter`) covers every stored key
/// exactly once.
#[test]
fn default_iter_covers_the_whole_keyset() {
    let trie = Trie::new();
    trie.add("a", 1);
    trie.add("ab", 2);
    trie.add("b", 3);

    let got: HashSet<_> = trie.iter().collect::<Result<Vec<_>, _>>().unwrap().into_iter().collect();
    assert_eq!(
        got,
        HashSet::from([("a".to_string(), 1), ("ab".to_string(), 2), ("b".to_string(), 3)])
    );
}

/// `extend` (the Rust realization of spec §6's `update`) inserts every pair
/// from a mapping-shaped iterator.
#[test]
fn extend_matches_repeated_add() {
    let via_extend: Trie<i32> =
        Trie::from_iter([("x".to_string(), 1), ("y".to_string(), 2), ("z".to_string(), 3)]);

    assert_eq!(via_extend.len(), 3);
    assert_eq!(via_extend.search("y"), Some(2));
}

/// `deep_clone` is a true structural copy: later mutation of the original
/// does not leak into the copy.
#[test]
fn deep_clone_is_a_true_full_copy() {
    let trie = Trie::new();
    trie.add("shared", 1);
    let copy = trie.deep_clone();

    trie.add("only-in-original", 2);
    trie.del("shared");

    assert_eq!(copy.search("shared"), Some(1));
    assert_eq!(copy.search("only-in-original"), None);
}

/// Reference four-operation edit distance (delete, adjacent transpose,
/// insert, change), computed independently of the correction engine, to
/// check the engine's inclusion property: every stored key within
/// `max_depth` of a query must appear somewhere in the (non-deduplicated)
/// correction multiset.
fn reference_edit_distance(a: &[char], b: &[char]) -> usize {
    let (n, m) = (a.len(), b.len());
    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        d[0][j] = j;
    }
    for i in 1..=n {
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            let mut best = (d[i - 1][j] + 1).min(d[i][j - 1] + 1).min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[i - 2][j - 2] + 1);
            }
            d[i][j] = best;
        }
    }
    d[n][m]
}

#[test]
fn corrections_include_every_key_within_the_reference_edit_distance() {
    let trie = Trie::new();
    for (i, word) in
        ["cat", "cap", "can", "act", "cart", "car", "dog", "dot", "do"].into_iter().enumerate()
    {
        trie.add(word, i);
    }

    let query = "cat";
    let max_depth = 2;
    let query_chars: Vec<char> = query.chars().collect();

    let got: HashSet<String> =
        trie.find_corrections(query, max_depth).unwrap().into_iter().map(|(k, _)| k).collect();

    for word in ["cat", "cap", "can", "act", "cart", "car", "dog", "dot", "do"] {
        let word_chars: Vec<char> = word.chars().collect();
        let distance = reference_edit_distance(&query_chars, &word_chars);
        if distance <= max_depth {
            assert!(
                got.contains(word),
                "expected corrections(\"{query}\", {max_depth}) to include {word:?} \
                 (reference edit distance {distance})"
            );
        }
    }
}
