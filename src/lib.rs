//! An in-memory B+ tree index for Rust.
//!
//! This crate provides [`BPlusTreeMap`], an ordered map that keeps every entry in
//! its leaves and chains those leaves together in both directions. On top of the
//! usual point operations it answers nearest-key and interval questions without
//! walking back up the tree:
//!
//! - [`floor_key`](BPlusTreeMap::floor_key) / [`ceiling_key`](BPlusTreeMap::ceiling_key) - nearest key at or below / at or above a probe
//! - [`range`](BPlusTreeMap::range) - lazy scan over the half-open interval `(start, end]`
//! - [`first_key`](BPlusTreeMap::first_key) / [`last_key`](BPlusTreeMap::last_key) - O(1) via the ends of the leaf chain
//!
//! # Example
//!
//! ```
//! use bplus_index::{BPlusTreeMap, Error, Order};
//!
//! let mut index = BPlusTreeMap::with_order(Order::new(5));
//! for key in 1..=6 {
//!     index.insert(key, key * 100);
//! }
//!
//! // The sixth insert split the root leaf once.
//! assert_eq!(index.height(), 2);
//! assert_eq!(index.levels(), vec![vec![&[4][..]], vec![&[1, 2, 3][..], &[4, 5, 6][..]]]);
//!
//! index.remove(&1);
//! index.remove(&2);
//! let keys: Vec<_> = index.range(&0, &10).map(|(k, _)| *k).collect();
//! assert_eq!(keys, [3, 4, 5, 6]);
//!
//! index.clear();
//! assert_eq!(index.first_key(), Err(Error::EmptyTree));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Configurable fanout** - Pick the node [`Order`] per map
//! - **No `unsafe`** - Nodes live in an arena and refer to each other by handle
//!
//! # Implementation
//!
//! Nodes are owned by a slot arena and addressed by compact handles. Parents own
//! their children through those handles; leaves link sideways to their
//! neighbours; nothing points back up. Mutations record the root-to-leaf path on
//! the way down and use it to push splits upward or to find the siblings an
//! under-full node borrows from or merges with.
//!
//! Diagnostics go through the [`log`] facade: splits, borrows and merges at
//! `trace`, construction at `debug`, and coerced orders at `warn`.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order;
mod raw;

pub mod bplus_tree_map;

pub use bplus_tree_map::BPlusTreeMap;
pub use error::{Error, Result};
pub use order::Order;
