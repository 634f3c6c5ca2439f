//! An in-memory trie mapping Unicode string keys to opaque values, with
//! suffix enumeration, prefix enumeration, and bounded-edit correction
//! enumeration built on top of the core mutation operations.
//!
//! # Layout
//!
//! - [`Key`] — the canonical, mutable character-sequence type every
//!   algorithm in this crate operates on.
//! - [`node`] — the arena node type and its per-node child index.
//! - [`Trie`] — the container plus `search`/`add`/`del`/`clear`.
//! - [`suffixes`] / [`prefixes`] / [`corrections`] — the three enumeration
//!   engines, each with a collect-all callback form and a lazy, resettable
//!   iterator form.
//! - [`serialize`] — a byte-image snapshot of a trie's node topology.
//!
//! # Example
//!
//! ```
//! use trie::Trie;
//!
//! let trie = Trie::new();
//! trie.add("cat", 1);
//! trie.add("car", 2);
//! trie.add("cart", 3);
//!
//! assert_eq!(trie.search("car"), Some(2));
//! assert_eq!(trie.find_suffixes("ca", 0).len(), 3);
//! assert_eq!(trie.find_prefixes("cart", 0).len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod corrections;
pub mod error;
pub mod key;
pub mod node;
pub mod prefixes;
pub mod serialize;
mod stack;
pub mod suffixes;
pub mod trie;

pub use corrections::{CorrectionIter, MAX_CORRECTION_DEPTH};
pub use error::{ErrorClassification, ErrorSeverity, TrieError, TrieResult};
pub use key::Key;
pub use prefixes::PrefixIter;
pub use serialize::SerializedTrie;
pub use suffixes::SuffixIter;
pub use trie::Trie;
