mod arena;
mod cursor;
mod handle;
mod node;
mod raw_bplus_tree;
mod rebalance;
mod split;

pub(crate) use cursor::LeafCursor;
pub(crate) use raw_bplus_tree::{Position, RawBPlusTree};
