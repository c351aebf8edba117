use alloc::vec::Vec;
use core::borrow::Borrow;

use super::handle::Handle;
use crate::order::Order;

#[derive(Clone, Debug)]
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

// Routing node: `children[i]` holds keys `< keys[i]`, `children[i + 1]` holds keys `>= keys[i]`.
#[derive(Clone, Debug)]
pub(crate) struct InternalNode<K> {
    keys: Vec<K>,
    children: Vec<Handle>,
}

// Data node: `values[i]` belongs to `keys[i]`; `prev`/`next` thread the leaf chain.
#[derive(Clone, Debug)]
pub(crate) struct LeafNode<K, V> {
    prev: Option<Handle>,
    next: Option<Handle>,
    keys: Vec<K>,
    values: Vec<V>,
}

/// Result of searching for a key in a leaf.
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl<K, V> Node<K, V> {
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub(crate) fn as_leaf(&self) -> &LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Internal(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_internal(&self) -> &InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn as_internal_mut(&mut self) -> &mut InternalNode<K> {
        match self {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    pub(crate) fn keys(&self) -> &[K] {
        match self {
            Node::Internal(internal) => internal.keys(),
            Node::Leaf(leaf) => leaf.keys(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys().len()
    }

    /// True once a removal has left this (non-root) node below the minimum.
    pub(crate) fn is_underfull(&self, order: Order) -> bool {
        self.key_count() < order.min_keys()
    }

    /// True if this node can give up an entry and stay at or above the minimum.
    pub(crate) fn can_lend(&self, order: Order) -> bool {
        self.key_count() > order.min_keys()
    }
}

impl<K> InternalNode<K> {
    /// Builds a node from parallel keys and children; `children.len()` must be `keys.len() + 1`.
    pub(crate) fn from_parts(keys: Vec<K>, children: Vec<Handle>) -> Self {
        debug_assert_eq!(children.len(), keys.len() + 1, "internal node shape");
        Self { keys, children }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    /// Returns the index of the child whose subtree must contain `key`.
    ///
    /// Finds the first separator `>= key`; an equal separator routes right,
    /// since a separator is a copy of the first key of its right subtree.
    #[inline]
    pub(crate) fn search_child<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    /// Inserts `separator` at `index` with `right` as the child just after it.
    pub(crate) fn insert_child(&mut self, index: usize, separator: K, right: Handle) {
        self.keys.insert(index, separator);
        self.children.insert(index + 1, right);
    }

    /// Removes the separator at `index` and the child to its right.
    pub(crate) fn remove_child(&mut self, index: usize) -> (K, Handle) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    /// Replaces the separator at `index`, returning the old one.
    pub(crate) fn replace_key(&mut self, index: usize, key: K) -> K {
        core::mem::replace(&mut self.keys[index], key)
    }

    /// Prepends a child together with the separator that now follows it.
    pub(crate) fn push_front(&mut self, key: K, child: Handle) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Appends a child together with the separator that now precedes it.
    pub(crate) fn push_back(&mut self, key: K, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Removes the first child and the separator that followed it.
    pub(crate) fn pop_front(&mut self) -> (K, Handle) {
        assert!(!self.keys.is_empty(), "`InternalNode::pop_front()` - node has no separators!");
        (self.keys.remove(0), self.children.remove(0))
    }

    /// Removes the last child and the separator that preceded it.
    pub(crate) fn pop_back(&mut self) -> (K, Handle) {
        match (self.keys.pop(), self.children.pop()) {
            (Some(key), Some(child)) => (key, child),
            _ => panic!("`InternalNode::pop_back()` - node has no separators!"),
        }
    }

    /// Splits an overflowing node, keeping the first `max_keys / 2 + 1` children.
    /// Returns the promoted separator and the new right node.
    pub(crate) fn split(&mut self, order: Order) -> (K, InternalNode<K>) {
        let mid = order.max_keys() / 2 + 1;
        let right_children = self.children.split_off(mid);
        let right_keys = self.keys.split_off(mid);
        let separator = match self.keys.pop() {
            Some(separator) => separator,
            None => unreachable!("an overflowing node has at least `mid` separators"),
        };
        (separator, InternalNode::from_parts(right_keys, right_children))
    }

    /// Absorbs `right`, with `separator` (taken from the parent) joining the two key runs.
    pub(crate) fn append(&mut self, separator: K, mut right: InternalNode<K>) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
    }
}

impl<K, V> LeafNode<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            prev: None,
            next: None,
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn entry(&self, index: usize) -> (&K, &V) {
        (&self.keys[index], &self.values[index])
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }

    #[inline]
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys.binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(index) => SearchResult::Found(index),
            Err(index) => SearchResult::NotFound(index),
        }
    }

    pub(crate) fn insert(&mut self, index: usize, key: K, value: V) {
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, V) {
        (self.keys.remove(index), self.values.remove(index))
    }

    pub(crate) fn replace_value(&mut self, index: usize, value: V) -> V {
        core::mem::replace(&mut self.values[index], value)
    }

    pub(crate) fn push_front(&mut self, key: K, value: V) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
    }

    pub(crate) fn push_back(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn pop_front(&mut self) -> (K, V) {
        assert!(!self.keys.is_empty(), "`LeafNode::pop_front()` - leaf is empty!");
        self.remove(0)
    }

    pub(crate) fn pop_back(&mut self) -> (K, V) {
        match (self.keys.pop(), self.values.pop()) {
            (Some(key), Some(value)) => (key, value),
            _ => panic!("`LeafNode::pop_back()` - leaf is empty!"),
        }
    }

    /// Moves the upper half of an overflowing leaf into a new, unlinked leaf.
    /// The lower (kept) half gets the extra entry when the count is odd.
    pub(crate) fn split_off_upper(&mut self) -> LeafNode<K, V> {
        let mid = self.keys.len().div_ceil(2);
        LeafNode {
            prev: None,
            next: None,
            keys: self.keys.split_off(mid),
            values: self.values.split_off(mid),
        }
    }

    /// Absorbs `right`, taking over its place in the leaf chain.
    pub(crate) fn append(&mut self, mut right: LeafNode<K, V>) {
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.next = right.next;
    }
}
