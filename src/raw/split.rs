//! Overflow handling: splitting full nodes and pushing separators upward.

use log::trace;

use super::handle::Handle;
use super::node::{InternalNode, Node};
use super::raw_bplus_tree::{Path, PathElement, RawBPlusTree};

impl<K: Clone + Ord, V> RawBPlusTree<K, V> {
    /// Splits an overflowing leaf in two and propagates the new separator.
    ///
    /// The leaf keeps the lower half in place; the upper half moves to a new leaf
    /// spliced into the chain right after it.
    pub(super) fn split_leaf(&mut self, leaf_handle: Handle, path: Path) {
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let mut right = leaf.split_off_upper();
        let separator = right.key(0).clone();
        let old_next = leaf.next();

        right.set_prev(Some(leaf_handle));
        right.set_next(old_next);
        let right_handle = self.nodes.alloc(Node::Leaf(right));
        self.nodes.get_mut(leaf_handle).as_leaf_mut().set_next(Some(right_handle));

        match old_next {
            Some(next) => self.nodes.get_mut(next).as_leaf_mut().set_prev(Some(right_handle)),
            None => self.tail = right_handle,
        }

        trace!("split leaf {leaf_handle:?} -> {right_handle:?}");
        self.propagate_split(path, leaf_handle, separator, right_handle);
    }

    /// Inserts `separator`/`right` next to `left` in its parent, splitting ancestors
    /// for as long as they overflow. Grows a new root if the split reaches the top.
    fn propagate_split(&mut self, mut path: Path, mut left: Handle, mut separator: K, mut right: Handle) {
        while let Some(PathElement { node, child_index }) = path.pop() {
            let parent = self.nodes.get_mut(node).as_internal_mut();
            parent.insert_child(child_index, separator, right);
            if parent.key_count() <= self.order.max_keys() {
                return;
            }

            let (promoted, sibling) = parent.split(self.order);
            let sibling = self.nodes.alloc(Node::Internal(sibling));
            trace!("split internal {node:?} -> {sibling:?}");

            left = node;
            separator = promoted;
            right = sibling;
        }

        self.grow_root(left, separator, right);
    }

    fn grow_root(&mut self, left: Handle, separator: K, right: Handle) {
        debug_assert_eq!(left, self.root, "only the old root can split without a parent");
        let root = InternalNode::from_parts(alloc::vec![separator], alloc::vec![left, right]);
        self.root = self.nodes.alloc(Node::Internal(root));
        self.height += 1;
        trace!("grew root {:?}, height {}", self.root, self.height);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::order::Order;

    fn ascending(order: usize, count: i32) -> RawBPlusTree<i32, i32> {
        let mut tree = RawBPlusTree::new(Order::new(order));
        for key in 1..=count {
            tree.insert(key, key);
            tree.validate_invariants();
        }
        tree
    }

    #[test]
    fn root_leaf_splits_on_first_overflow() {
        let tree = ascending(5, 4);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.levels(), vec![vec![&[1, 2, 3, 4][..]]]);

        let tree = ascending(5, 5);
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.levels(), vec![vec![&[4][..]], vec![&[1, 2, 3][..], &[4, 5][..]]]);
    }

    #[test]
    fn six_ascending_keys_at_order_five() {
        let tree = ascending(5, 6);
        assert_eq!(tree.levels(), vec![vec![&[4][..]], vec![&[1, 2, 3][..], &[4, 5, 6][..]]]);

        let head = tree.leaf(tree.head);
        let tail = tree.leaf(tree.tail);
        assert_eq!(head.next(), Some(tree.tail));
        assert_eq!(tail.prev(), Some(tree.head));
        assert_eq!(head.prev(), None);
        assert_eq!(tail.next(), None);
    }

    #[test]
    fn internal_split_cascades_to_new_root() {
        // Order 3 holds at most two keys per node, so growth cascades quickly.
        let tree = ascending(3, 7);
        assert_eq!(tree.height(), 3);
        assert_eq!(
            tree.levels(),
            vec![
                vec![&[5][..]],
                vec![&[3][..], &[7][..]],
                vec![&[1, 2][..], &[3, 4][..], &[5, 6][..], &[7][..]],
            ]
        );
    }

    #[test]
    fn split_in_the_middle_relinks_neighbours() {
        let mut tree = RawBPlusTree::new(Order::new(4));
        for key in [10, 20, 30, 40, 50, 60] {
            tree.insert(key, key);
        }
        // Fill a middle leaf until it splits.
        for key in [21, 22, 23] {
            tree.insert(key, key);
            tree.validate_invariants();
        }
        let keys: Vec<i32> = {
            let mut keys = Vec::new();
            let mut position = tree.first_position();
            while let Some(current) = position {
                keys.push(*tree.entry(current).0);
                position = tree.successor(current);
            }
            keys
        };
        assert_eq!(keys, vec![10, 20, 21, 22, 23, 30, 40, 50, 60]);
    }

    #[test]
    fn descending_inserts_keep_tail_fixed() {
        let mut tree = RawBPlusTree::new(Order::new(4));
        for key in (0..100).rev() {
            tree.insert(key, key);
        }
        tree.validate_invariants();
        assert_eq!(tree.entry(tree.last_position().unwrap()), (&99, &99));
        assert_eq!(tree.entry(tree.first_position().unwrap()), (&0, &0));
    }

    #[test]
    fn overwrite_never_splits() {
        let mut tree = ascending(5, 4);
        assert_eq!(tree.insert(3, 30), Some(3));
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.levels(), vec![vec![&[1, 2, 3, 4][..]]]);
    }
}
