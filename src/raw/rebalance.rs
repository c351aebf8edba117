//! Underflow handling: borrowing from siblings, merging, and collapsing the root.
//! Also keeps separators equal to the first key of the subtree to their right.

use log::trace;

use super::handle::Handle;
use super::node::Node;
use super::raw_bplus_tree::{Path, PathElement, RawBPlusTree};

impl<K: Clone + Ord, V> RawBPlusTree<K, V> {
    /// Restores the lower bound for `node`, which has just dropped below it.
    ///
    /// Tries, in order: borrow from the left sibling, borrow from the right
    /// sibling, merge into the left sibling, merge the right sibling in. Only a
    /// merge removes a separator from the parent, so only a merge continues
    /// upward.
    pub(super) fn rebalance(&mut self, mut node: Handle, mut path: Path) {
        while let Some(PathElement { node: parent, child_index }) = path.pop() {
            if !self.nodes.get(node).is_underfull(self.order) {
                return;
            }

            let (left, right) = {
                let parent = self.nodes.get(parent).as_internal();
                let left = child_index.checked_sub(1).map(|index| parent.child(index));
                let right = (child_index + 1 < parent.child_count()).then(|| parent.child(child_index + 1));
                (left, right)
            };

            if let Some(left) = left
                && self.nodes.get(left).can_lend(self.order)
            {
                self.borrow_from_left(parent, child_index, left, node);
                return;
            }
            if let Some(right) = right
                && self.nodes.get(right).can_lend(self.order)
            {
                self.borrow_from_right(parent, child_index, node, right);
                return;
            }

            match (left, right) {
                (Some(left), _) => self.merge(parent, child_index - 1, left, node),
                (None, Some(right)) => self.merge(parent, child_index, node, right),
                (None, None) => unreachable!("internal node {parent:?} has a single child"),
            }
            node = parent;
        }

        self.collapse_root();
    }

    /// Moves the last entry of `left` to the front of `node`.
    fn borrow_from_left(&mut self, parent: Handle, child_index: usize, left: Handle, node: Handle) {
        let separator_index = child_index - 1;

        if self.nodes.get(node).is_leaf() {
            let (key, value) = self.nodes.get_mut(left).as_leaf_mut().pop_back();
            self.nodes
                .get_mut(parent)
                .as_internal_mut()
                .replace_key(separator_index, key.clone());
            self.nodes.get_mut(node).as_leaf_mut().push_front(key, value);
        } else {
            // Rotate right through the parent: the separator comes down, the lender's last key goes up.
            let (key, child) = self.nodes.get_mut(left).as_internal_mut().pop_back();
            let separator = self.nodes.get_mut(parent).as_internal_mut().replace_key(separator_index, key);
            self.nodes.get_mut(node).as_internal_mut().push_front(separator, child);
        }

        trace!("{node:?} borrowed from left sibling {left:?}");
    }

    /// Moves the first entry of `right` to the back of `node`.
    fn borrow_from_right(&mut self, parent: Handle, child_index: usize, node: Handle, right: Handle) {
        if self.nodes.get(node).is_leaf() {
            let lender = self.nodes.get_mut(right).as_leaf_mut();
            let (key, value) = lender.pop_front();
            let separator = lender.key(0).clone();
            self.nodes.get_mut(parent).as_internal_mut().replace_key(child_index, separator);
            self.nodes.get_mut(node).as_leaf_mut().push_back(key, value);
        } else {
            // Rotate left through the parent.
            let (key, child) = self.nodes.get_mut(right).as_internal_mut().pop_front();
            let separator = self.nodes.get_mut(parent).as_internal_mut().replace_key(child_index, key);
            self.nodes.get_mut(node).as_internal_mut().push_back(separator, child);
        }

        trace!("{node:?} borrowed from right sibling {right:?}");
    }

    /// Folds `right` into `left` (adjacent children of `parent` around separator
    /// `separator_index`) and frees `right`.
    fn merge(&mut self, parent: Handle, separator_index: usize, left: Handle, right: Handle) {
        let (separator, removed) = self.nodes.get_mut(parent).as_internal_mut().remove_child(separator_index);
        debug_assert_eq!(removed, right, "separator {separator_index} must sit between the merged pair");

        match self.nodes.take(right) {
            Node::Leaf(absorbed) => {
                let next = absorbed.next();
                self.nodes.get_mut(left).as_leaf_mut().append(absorbed);
                match next {
                    Some(next) => self.nodes.get_mut(next).as_leaf_mut().set_prev(Some(left)),
                    None => self.tail = left,
                }
            }
            Node::Internal(absorbed) => {
                self.nodes.get_mut(left).as_internal_mut().append(separator, absorbed);
            }
        }

        trace!("merged {right:?} into {left:?}");
    }

    /// Replaces an internal root that is down to one child with that child.
    fn collapse_root(&mut self) {
        if let Node::Internal(root) = self.nodes.get(self.root)
            && root.key_count() == 0
        {
            let child = root.child(0);
            self.nodes.free(self.root);
            self.root = child;
            self.height -= 1;
            trace!("collapsed root into {child:?}, height {}", self.height);
        }
    }

    /// Rewrites the separator that still holds `removed`, if any, to the first
    /// key of the subtree to its right.
    ///
    /// Must run after rebalancing, once every non-root leaf is back within bounds.
    pub(super) fn refresh_separator(&mut self, removed: &K) {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            match internal.keys().binary_search(removed) {
                Ok(index) => {
                    let right = internal.child(index + 1);
                    let replacement = self.first_key_under(right).clone();
                    self.nodes.get_mut(current).as_internal_mut().replace_key(index, replacement);
                    trace!("refreshed separator {index} of {current:?}");
                    return;
                }
                Err(index) => current = internal.child(index),
            }
        }
    }

    /// First key of the leftmost leaf below `handle`.
    fn first_key_under(&self, mut handle: Handle) -> &K {
        while let Node::Internal(internal) = self.nodes.get(handle) {
            handle = internal.child(0);
        }
        self.leaf(handle).key(0)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::vec;
    use alloc::vec::Vec;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::order::Order;

    fn tree_of(order: usize, keys: impl IntoIterator<Item = i32>) -> RawBPlusTree<i32, i32> {
        let mut tree = RawBPlusTree::new(Order::new(order));
        for key in keys {
            tree.insert(key, key);
        }
        tree.validate_invariants();
        tree
    }

    fn chain_keys(tree: &RawBPlusTree<i32, i32>) -> Vec<i32> {
        let mut keys = Vec::new();
        let mut position = tree.first_position();
        while let Some(current) = position {
            keys.push(*tree.entry(current).0);
            position = tree.successor(current);
        }
        keys
    }

    #[test]
    fn underflowing_first_leaf_borrows_from_right() {
        let mut tree = tree_of(5, 1..=6);

        assert_eq!(tree.remove(&1), Some(1));
        tree.validate_invariants();
        assert_eq!(tree.levels(), vec![vec![&[4][..]], vec![&[2, 3][..], &[4, 5, 6][..]]]);

        assert_eq!(tree.remove(&2), Some(2));
        tree.validate_invariants();
        assert_eq!(tree.levels(), vec![vec![&[5][..]], vec![&[3, 4][..], &[5, 6][..]]]);
        assert_eq!(chain_keys(&tree), vec![3, 4, 5, 6]);
    }

    #[test]
    fn underflowing_last_leaf_borrows_from_left() {
        let mut tree = tree_of(5, 1..=6);
        tree.remove(&5);
        tree.remove(&6);
        tree.validate_invariants();
        assert_eq!(tree.levels(), vec![vec![&[3][..]], vec![&[1, 2][..], &[3, 4][..]]]);
    }

    #[test]
    fn removing_first_key_of_a_leaf_rewrites_its_separator() {
        let mut tree = tree_of(5, 1..=6);

        // [4, 5, 6] keeps two keys, so only the separator changes.
        assert_eq!(tree.remove(&4), Some(4));
        tree.validate_invariants();
        assert_eq!(tree.levels(), vec![vec![&[5][..]], vec![&[1, 2, 3][..], &[5, 6][..]]]);
    }

    #[test]
    fn separator_above_the_parent_is_rewritten() {
        let mut tree = tree_of(3, 1..=7);
        assert_eq!(
            tree.levels(),
            vec![vec![&[5][..]], vec![&[3][..], &[7][..]], vec![&[1, 2][..], &[3, 4][..], &[5, 6][..], &[7][..]]]
        );

        // 5 heads the leftmost leaf of the root's right subtree.
        tree.remove(&5);
        tree.validate_invariants();
        assert_eq!(
            tree.levels(),
            vec![vec![&[6][..]], vec![&[3][..], &[7][..]], vec![&[1, 2][..], &[3, 4][..], &[6][..], &[7][..]]]
        );

        // [6] empties and merges cascade to the root, pulling separator 6 down with them.
        tree.remove(&6);
        tree.validate_invariants();
        assert_eq!(tree.levels(), vec![vec![&[3, 7][..]], vec![&[1, 2][..], &[3, 4][..], &[7][..]]]);
    }

    #[test]
    fn merge_collapses_root_back_to_leaf() {
        let mut tree = tree_of(5, 1..=5);
        assert_eq!(tree.height(), 2);

        tree.remove(&1);
        tree.remove(&5);
        tree.validate_invariants();
        // [2,3] / [4]: neither side can lend, so the right leaf folds into the left.
        assert_eq!(tree.levels(), vec![vec![&[2, 3, 4][..]]]);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.head, tree.root);
        assert_eq!(tree.tail, tree.root);
    }

    #[test]
    fn leftmost_leaf_merges_with_right_sibling() {
        let mut tree = tree_of(5, 1..=5);
        tree.remove(&2);
        tree.remove(&3);
        tree.validate_invariants();
        assert_eq!(tree.levels(), vec![vec![&[1, 4, 5][..]]]);
    }

    #[test]
    fn merges_cascade_through_internal_levels() {
        let mut tree = tree_of(3, 1..=7);
        assert_eq!(tree.height(), 3);

        for key in (1..=7).rev() {
            tree.remove(&key);
            tree.validate_invariants();
        }
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.levels(), vec![vec![&[][..]]]);
    }

    #[test]
    fn internal_nodes_borrow_through_parent() {
        // Large enough at order 3 for internal siblings with spare keys.
        let mut tree = tree_of(3, 0..40);
        for key in (0..40).step_by(3) {
            tree.remove(&key);
            tree.validate_invariants();
        }
        assert_eq!(chain_keys(&tree), (0..40).filter(|k| k % 3 != 0).collect::<Vec<_>>());
    }

    #[test]
    fn removing_absent_key_changes_nothing() {
        let mut tree = tree_of(4, (0..30).map(|k| k * 2));
        let before: Vec<Vec<Vec<i32>>> = snapshot(&tree);

        assert_eq!(tree.remove(&7), None);
        assert_eq!(tree.remove(&-1), None);
        assert_eq!(tree.remove(&1000), None);

        assert_eq!(snapshot(&tree), before);
        assert_eq!(tree.len(), 30);
    }

    #[test]
    fn pops_drain_in_order() {
        let mut tree = tree_of(4, 0..50);
        assert_eq!(tree.pop_first(), Some((0, 0)));
        assert_eq!(tree.pop_last(), Some((49, 49)));
        tree.validate_invariants();

        let mut drained = Vec::new();
        while let Some((key, _)) = tree.pop_first() {
            drained.push(key);
            tree.validate_invariants();
        }
        assert_eq!(drained, (1..49).collect::<Vec<_>>());
        assert_eq!(tree.pop_last(), None);
        assert_eq!(tree.height(), 0);
    }

    #[test]
    fn emptied_tree_is_reusable() {
        let mut tree = tree_of(3, 0..20);
        for key in 0..20 {
            tree.remove(&key);
        }
        tree.validate_invariants();
        for key in 0..20 {
            tree.insert(key, key);
        }
        tree.validate_invariants();
        assert_eq!(chain_keys(&tree), (0..20).collect::<Vec<_>>());
    }

    fn snapshot(tree: &RawBPlusTree<i32, i32>) -> Vec<Vec<Vec<i32>>> {
        tree.levels()
            .into_iter()
            .map(|level| level.into_iter().map(<[i32]>::to_vec).collect())
            .collect()
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
        PopFirst,
        PopLast,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0i32..400).prop_map(Op::Insert),
            4 => (0i32..400).prop_map(Op::Remove),
            1 => Just(Op::PopFirst),
            1 => Just(Op::PopLast),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn invariants_hold_after_every_operation(
            order in 3usize..10,
            ops in prop::collection::vec(op_strategy(), 0..600),
        ) {
            let mut tree: RawBPlusTree<i32, i32> = RawBPlusTree::new(Order::new(order));
            let mut model: BTreeMap<i32, i32> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        prop_assert_eq!(tree.insert(key, key * 3), model.insert(key, key * 3));
                    }
                    Op::Remove(key) => {
                        prop_assert_eq!(tree.remove_entry(&key), model.remove_entry(&key));
                    }
                    Op::PopFirst => prop_assert_eq!(tree.pop_first(), model.pop_first()),
                    Op::PopLast => prop_assert_eq!(tree.pop_last(), model.pop_last()),
                }
                tree.validate_invariants();
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert_eq!(chain_keys(&tree), model.keys().copied().collect::<Vec<_>>());
        }

        #[test]
        fn absent_removals_leave_structure_untouched(
            order in 3usize..8,
            keys in prop::collection::btree_set(0i32..200, 0..120),
            probes in prop::collection::vec(0i32..200, 1..40),
        ) {
            let mut tree = tree_of(order, keys.iter().map(|k| k * 2));
            let before = snapshot(&tree);
            for probe in probes {
                let odd = probe * 2 + 1;
                prop_assert_eq!(tree.remove(&odd), None);
            }
            prop_assert_eq!(snapshot(&tree), before);
        }
    }
}
