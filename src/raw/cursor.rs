use super::raw_bplus_tree::{Position, RawBPlusTree};

/// Walks the leaf chain between two inclusive positions, from either end.
///
/// Both ends start on live slots; once they meet the cursor is exhausted.
pub(crate) struct LeafCursor<'a, K, V> {
    tree: &'a RawBPlusTree<K, V>,
    front: Option<Position>,
    back: Option<Position>,
}

impl<'a, K, V> LeafCursor<'a, K, V> {
    /// A cursor over `front..=back`. Passing `None` for either end yields nothing.
    pub(crate) fn new(tree: &'a RawBPlusTree<K, V>, front: Option<Position>, back: Option<Position>) -> Self {
        match (front, back) {
            (Some(_), Some(_)) => Self { tree, front, back },
            _ => Self::empty(tree),
        }
    }

    /// A cursor over every entry of `tree`.
    pub(crate) fn full(tree: &'a RawBPlusTree<K, V>) -> Self {
        Self::new(tree, tree.first_position(), tree.last_position())
    }

    pub(crate) fn empty(tree: &'a RawBPlusTree<K, V>) -> Self {
        Self {
            tree,
            front: None,
            back: None,
        }
    }

    pub(crate) fn next(&mut self) -> Option<(&'a K, &'a V)> {
        let current = self.front?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = self.tree.successor(current);
        }
        Some(self.tree.entry(current))
    }

    pub(crate) fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        let current = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = self.tree.predecessor(current);
        }
        Some(self.tree.entry(current))
    }

    /// Exact while both ends share a leaf; otherwise at least one entry per end.
    pub(crate) fn size_hint(&self) -> (usize, Option<usize>) {
        match (self.front, self.back) {
            (Some((front_leaf, front_index)), Some((back_leaf, back_index))) if front_leaf == back_leaf => {
                let remaining = back_index - front_index + 1;
                (remaining, Some(remaining))
            }
            (Some(_), Some(_)) => (2, Some(self.tree.len())),
            _ => (0, Some(0)),
        }
    }
}

impl<K, V> Clone for LeafCursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
        }
    }
}
