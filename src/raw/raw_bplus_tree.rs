use alloc::vec::Vec;
use core::borrow::Borrow;

use log::debug;
use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{LeafNode, Node, SearchResult};
use crate::order::Order;

/// The core B+ tree backing `BPlusTreeMap`.
#[derive(Clone)]
pub(crate) struct RawBPlusTree<K, V> {
    /// Arena owning every node; all links are handles into it.
    pub(super) nodes: Arena<Node<K, V>>,
    /// Root node. Starts (and ends, once emptied) as an empty leaf.
    pub(super) root: Handle,
    /// Leftmost leaf.
    pub(super) head: Handle,
    /// Rightmost leaf.
    pub(super) tail: Handle,
    /// Number of key-value pairs.
    pub(super) len: usize,
    /// Levels including the leaf level; 0 while the tree holds no keys.
    pub(super) height: usize,
    pub(super) order: Order,
}

/// One step of a root-to-leaf descent.
#[derive(Clone, Copy, Debug)]
pub(super) struct PathElement {
    /// Internal node passed through.
    pub(super) node: Handle,
    /// Index of the child we descended into.
    pub(super) child_index: usize,
}

/// Ancestors of the current node, root first. Stands in for parent pointers.
pub(super) type Path = SmallVec<[PathElement; 16]>;

/// A `(leaf, index)` slot in the leaf chain.
pub(crate) type Position = (Handle, usize);

impl<K, V> RawBPlusTree<K, V> {
    pub(crate) fn new(order: Order) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::Leaf(LeafNode::new()));
        debug!("created B+ tree with order {order}");
        Self {
            nodes,
            root,
            head: root,
            tail: root,
            len: 0,
            height: 0,
            order,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn height(&self) -> usize {
        self.height
    }

    pub(crate) const fn order(&self) -> Order {
        self.order
    }

    /// Drops every entry, leaving a single empty leaf root. The arena keeps its capacity.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        let root = self.nodes.alloc(Node::Leaf(LeafNode::new()));
        self.root = root;
        self.head = root;
        self.tail = root;
        self.len = 0;
        self.height = 0;
    }

    pub(crate) fn leaf(&self, handle: Handle) -> &LeafNode<K, V> {
        self.nodes.get(handle).as_leaf()
    }

    /// Returns the entry stored at `position`.
    #[inline]
    pub(crate) fn entry(&self, (leaf, index): Position) -> (&K, &V) {
        self.leaf(leaf).entry(index)
    }

    /// Position of the first entry, if any.
    pub(crate) fn first_position(&self) -> Option<Position> {
        (!self.leaf(self.head).is_empty()).then_some((self.head, 0))
    }

    /// Position of the last entry, if any.
    pub(crate) fn last_position(&self) -> Option<Position> {
        let count = self.leaf(self.tail).key_count();
        count.checked_sub(1).map(|index| (self.tail, index))
    }

    /// The slot after `position` in the leaf chain.
    pub(crate) fn successor(&self, (leaf, index): Position) -> Option<Position> {
        let node = self.leaf(leaf);
        if index + 1 < node.key_count() {
            Some((leaf, index + 1))
        } else {
            node.next().map(|next| (next, 0))
        }
    }

    /// The slot before `position` in the leaf chain.
    pub(crate) fn predecessor(&self, (leaf, index): Position) -> Option<Position> {
        if index > 0 {
            return Some((leaf, index - 1));
        }
        let prev = self.leaf(leaf).prev()?;
        Some((prev, self.leaf(prev).key_count() - 1))
    }

    /// Key-sets of every node, level by level from the root.
    pub(crate) fn levels(&self) -> Vec<Vec<&[K]>> {
        let mut levels = Vec::with_capacity(self.height.max(1));
        let mut frontier = alloc::vec![self.root];

        while !frontier.is_empty() {
            let mut below = Vec::new();
            let mut level = Vec::with_capacity(frontier.len());
            for &handle in &frontier {
                let node = self.nodes.get(handle);
                level.push(node.keys());
                if let Node::Internal(internal) = node {
                    below.extend_from_slice(internal.children());
                }
            }
            levels.push(level);
            frontier = below;
        }

        levels
    }
}

impl<K: Ord, V> RawBPlusTree<K, V> {
    /// Descends from the root to the leaf whose key range covers `key`.
    pub(crate) fn locate<Q>(&self, key: &Q) -> Handle
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            current = internal.child(internal.search_child(key));
        }
        current
    }

    /// Like [`locate`](Self::locate), recording every internal node passed through.
    pub(super) fn locate_with_path<Q>(&self, key: &Q, path: &mut Path) -> Handle
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            let child_index = internal.search_child(key);
            path.push(PathElement {
                node: current,
                child_index,
            });
            current = internal.child(child_index);
        }
        current
    }

    /// Descends along the leftmost (`last == false`) or rightmost edge.
    pub(super) fn edge_with_path(&self, last: bool, path: &mut Path) -> Handle {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            let child_index = if last { internal.child_count() - 1 } else { 0 };
            path.push(PathElement {
                node: current,
                child_index,
            });
            current = internal.child(child_index);
        }
        current
    }

    pub(crate) fn search<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.locate(key);
        match self.leaf(leaf).search(key) {
            SearchResult::Found(index) => Some((leaf, index)),
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf, index) = self.search(key)?;
        Some(self.nodes.get_mut(leaf).as_leaf_mut().value_mut(index))
    }

    /// First position whose key is `>= key`.
    pub(crate) fn ceiling_position<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.locate(key);
        match self.leaf(leaf).search(key) {
            SearchResult::Found(index) => Some((leaf, index)),
            SearchResult::NotFound(index) => self.at_or_after(leaf, index),
        }
    }

    /// First position whose key is `> key`.
    pub(crate) fn higher_position<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.locate(key);
        match self.leaf(leaf).search(key) {
            SearchResult::Found(index) => self.at_or_after(leaf, index + 1),
            SearchResult::NotFound(index) => self.at_or_after(leaf, index),
        }
    }

    /// Last position whose key is `<= key`.
    pub(crate) fn floor_position<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.locate(key);
        match self.leaf(leaf).search(key) {
            SearchResult::Found(index) => Some((leaf, index)),
            SearchResult::NotFound(index) => self.predecessor((leaf, index)),
        }
    }

    /// Last position whose key is `< key`.
    pub(crate) fn lower_position<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let leaf = self.locate(key);
        match self.leaf(leaf).search(key) {
            SearchResult::Found(index) | SearchResult::NotFound(index) => self.predecessor((leaf, index)),
        }
    }

    // Slot `index` of `leaf`, or the head of the next leaf when `index` is past the end.
    // Keys in the next leaf are all `>=` the separator that bounded `leaf`, so this is exact.
    fn at_or_after(&self, leaf: Handle, index: usize) -> Option<Position> {
        let node = self.leaf(leaf);
        if index < node.key_count() {
            Some((leaf, index))
        } else {
            node.next().map(|next| (next, 0))
        }
    }
}

impl<K: Clone + Ord, V> RawBPlusTree<K, V> {
    /// Inserts or overwrites `key`. Returns the previous value if the key was present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut path = Path::new();
        let leaf_handle = self.locate_with_path(&key, &mut path);
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();

        let index = match leaf.search(&key) {
            SearchResult::Found(index) => return Some(leaf.replace_value(index, value)),
            SearchResult::NotFound(index) => index,
        };

        // The new key takes its slot before any split, so it is never inserted twice.
        leaf.insert(index, key, value);
        let overflowing = leaf.key_count() > self.order.max_keys();

        if self.len == 0 {
            self.height = 1;
        }
        self.len += 1;

        if overflowing {
            self.split_leaf(leaf_handle, path);
        }
        None
    }

    /// Removes `key`, returning the pair if it was present. An absent key leaves the tree untouched.
    pub(crate) fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut path = Path::new();
        let leaf = self.locate_with_path(key, &mut path);
        match self.leaf(leaf).search(key) {
            SearchResult::Found(index) => Some(self.remove_at(leaf, index, path)),
            SearchResult::NotFound(_) => None,
        }
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    pub(crate) fn pop_first(&mut self) -> Option<(K, V)> {
        if self.len == 0 {
            return None;
        }
        let mut path = Path::new();
        let leaf = self.edge_with_path(false, &mut path);
        Some(self.remove_at(leaf, 0, path))
    }

    pub(crate) fn pop_last(&mut self) -> Option<(K, V)> {
        if self.len == 0 {
            return None;
        }
        let mut path = Path::new();
        let leaf = self.edge_with_path(true, &mut path);
        let index = self.leaf(leaf).key_count() - 1;
        Some(self.remove_at(leaf, index, path))
    }

    fn remove_at(&mut self, leaf_handle: Handle, index: usize, path: Path) -> (K, V) {
        let leaf = self.nodes.get_mut(leaf_handle).as_leaf_mut();
        let entry = leaf.remove(index);
        self.len -= 1;

        // The root leaf is exempt from the lower bound.
        if !path.is_empty() && self.nodes.get(leaf_handle).is_underfull(self.order) {
            self.rebalance(leaf_handle, path);
        }
        // Only a leaf's first key can be copied into an ancestor.
        if index == 0 {
            self.refresh_separator(&entry.0);
        }
        if self.len == 0 {
            self.height = 0;
        }
        entry
    }
}
