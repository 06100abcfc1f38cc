//! Errors reported by a store.

use thiserror::Error;

/// A dispatch the store refused.
///
/// Refusals are published on [`Store::errors`](crate::Store::errors), so
/// the type is cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The action stream was completed, so nothing reduces actions any more.
    #[error("action stream is closed")]
    Closed,

    /// A chain of derived dispatches went deeper than
    /// [`StoreConfig::max_dispatch_depth`](crate::StoreConfig::max_dispatch_depth).
    #[error("dispatch of `{kind}` exceeded depth limit of {limit}")]
    DepthExceeded { kind: String, limit: usize },
}
