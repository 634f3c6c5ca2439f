//! Error types for trie operations.
//!
//! This module follows the error-handling architecture used across the
//! PulseArc codebase: a single `thiserror`-derived enum plus an
//! `ErrorClassification` trait that gives callers a uniform way to decide
//! whether an error is retryable, how severe it is, and whether it demands
//! immediate attention.
//!
//! Unlike the cross-cutting `CommonError` in `pulsearc-common`, `TrieError`
//! is scoped to exactly the failure modes this crate can produce: a missing
//! key, a `next()` call observing concurrent mutation, a malformed
//! serialized image, and an unreasonable capacity request.

use std::fmt;

use thiserror::Error;

/// Standard result type for trie operations.
pub type TrieResult<T> = Result<T, TrieError>;

/// Errors produced by [`crate::Trie`] and its iterators.
#[derive(Debug, Error)]
pub enum TrieError {
    /// `get`/`del` was asked for a key that is not present (or is present
    /// only as an unvalued path prefix).
    #[error("key not found: {key:?}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// An iterator observed the trie's `dirty` flag set during `next()`,
    /// meaning the trie was mutated after the iterator was constructed (or
    /// last reset).
    #[error("trie was modified during iteration")]
    IterationInvalidated,

    /// A caller-supplied bound (currently only the correction engine's
    /// `max_depth`) is too large to pre-size the working stacks safely.
    ///
    /// Rust's global allocator aborts the process on allocation failure
    /// rather than returning a recoverable error, so this variant does not
    /// model allocation failure directly (unlike the source system's
    /// allocator-failure category) — it instead rejects bounds before any
    /// allocation is attempted.
    #[error("requested bound {requested} exceeds the supported maximum {max}")]
    Capacity {
        /// The value the caller requested.
        requested: usize,
        /// The largest value this crate will pre-size for.
        max: usize,
    },

    /// A serialized byte image was malformed: truncated, an inconsistent
    /// record count, or a `value_index` outside the value table.
    #[error("malformed serialized trie: {reason}")]
    Serialization {
        /// Human-readable description of what was wrong.
        reason: String,
    },
}

impl TrieError {
    /// Builds a [`TrieError::NotFound`] for `key`.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Builds a [`TrieError::Capacity`] error.
    pub fn capacity(requested: usize, max: usize) -> Self {
        Self::Capacity { requested, max }
    }

    /// Builds a [`TrieError::Serialization`] error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization { reason: reason.into() }
    }
}

/// Standard classification interface for errors, mirroring
/// `pulsearc_common::error::ErrorClassification`.
pub trait ErrorClassification {
    /// Whether retrying the same operation might succeed.
    fn is_retryable(&self) -> bool;

    /// Severity level for monitoring and logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Whether this error indicates a broken invariant requiring immediate
    /// attention rather than an expected runtime condition.
    fn is_critical(&self) -> bool;
}

/// Severity levels for monitoring and alerting, mirroring
/// `pulsearc_common::error::ErrorSeverity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, expected in normal operation.
    Info,
    /// Should be monitored but does not indicate a bug.
    Warning,
    /// Requires attention.
    Error,
    /// Indicates a broken internal invariant.
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ErrorClassification for TrieError {
    fn is_retryable(&self) -> bool {
        // Nothing in this crate is transient: a missing key stays missing,
        // a dirty iterator stays failed, a bad capacity request stays bad.
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } => ErrorSeverity::Info,
            Self::IterationInvalidated => ErrorSeverity::Warning,
            Self::Capacity { .. } => ErrorSeverity::Error,
            Self::Serialization { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }
}
