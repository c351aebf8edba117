use core::fmt;

use log::warn;

use crate::error::{Error, Result};

/// The branching factor of a [`BPlusTreeMap`](crate::BPlusTreeMap).
///
/// An order of `m` lets a node hold at most `m - 1` keys before it splits
/// ([`max_keys`](Order::max_keys)), and requires every node except the root to
/// keep at least `(m - 1) / 2` keys after a removal
/// ([`min_keys`](Order::min_keys)). Leaves and internal nodes share the same
/// bounds.
///
/// # Examples
///
/// ```
/// use bplus_index::Order;
///
/// let order = Order::new(5);
/// assert_eq!(order.max_keys(), 4);
/// assert_eq!(order.min_keys(), 2);
///
/// // Orders below the minimum are coerced up.
/// assert_eq!(Order::new(1), Order::MIN);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Order(usize);

impl Order {
    /// The smallest order a tree can be built with.
    pub const MIN: Self = Self(3);

    /// The order used by [`BPlusTreeMap::new`](crate::BPlusTreeMap::new).
    pub const DEFAULT: Self = Self(64);

    /// Creates an order, coercing anything below [`Order::MIN`] up to it.
    #[must_use]
    pub fn new(order: usize) -> Self {
        Self::try_new(order).unwrap_or_else(|_| {
            warn!("order {order} is below the minimum of {}; using {}", Self::MIN.0, Self::MIN.0);
            Self::MIN
        })
    }

    /// Creates an order, rejecting anything below [`Order::MIN`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOrder`] if `order < 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{Error, Order};
    ///
    /// assert!(Order::try_new(16).is_ok());
    /// assert_eq!(Order::try_new(2), Err(Error::InvalidOrder { requested: 2 }));
    /// ```
    pub const fn try_new(order: usize) -> Result<Self> {
        if order < Self::MIN.0 {
            Err(Error::InvalidOrder { requested: order })
        } else {
            Ok(Self(order))
        }
    }

    /// Returns the raw branching factor.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns the most keys a node may hold once an operation completes.
    #[must_use]
    pub const fn max_keys(self) -> usize {
        self.0 - 1
    }

    /// Returns the fewest keys a non-root node may hold once an operation completes.
    #[must_use]
    pub const fn min_keys(self) -> usize {
        self.max_keys() / 2
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Order> for usize {
    fn from(order: Order) -> Self {
        order.0
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn smallest_order_bounds() {
        assert_eq!(Order::MIN.max_keys(), 2);
        assert_eq!(Order::MIN.min_keys(), 1);
    }

    #[test]
    fn small_orders_are_coerced() {
        assert_eq!(Order::new(0), Order::MIN);
        assert_eq!(Order::new(2), Order::MIN);
        assert_eq!(Order::new(3).get(), 3);
    }

    #[test]
    fn default_order() {
        assert_eq!(Order::default(), Order::DEFAULT);
        assert_eq!(usize::from(Order::DEFAULT), 64);
    }

    proptest! {
        #[test]
        fn two_minimal_nodes_fit_in_one(order in 3usize..1024) {
            let order = Order::new(order);
            // A merge joins an underfull node with a minimal sibling (plus a separator
            // for internal nodes), which must never overflow.
            prop_assert!(2 * order.min_keys() <= order.max_keys());
            // A split of `max_keys + 1` keys must leave both halves at or above the minimum.
            prop_assert!((order.max_keys() + 1) / 2 >= order.min_keys());
        }
    }
}
