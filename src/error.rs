use thiserror::Error;

/// Errors reported by [`BPlusTreeMap`](crate::BPlusTreeMap) and [`Order`](crate::Order).
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The operation needs at least one entry, but the tree is empty.
    #[error("operation requires a non-empty tree")]
    EmptyTree,

    /// The requested order is below [`Order::MIN`](crate::Order::MIN).
    #[error("order {requested} is below the minimum of 3")]
    InvalidOrder {
        /// The order that was asked for.
        requested: usize,
    },
}

/// Result alias for fallible tree operations.
pub type Result<T> = core::result::Result<T, Error>;
