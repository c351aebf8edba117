use alloc::vec::Vec;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::ops::Index;

use crate::error::{Error, Result};
use crate::order::Order;
use crate::raw::{LeafCursor, Position, RawBPlusTree};

/// An ordered map based on a [B+ tree].
///
/// Every key-value pair lives in a leaf; internal nodes only hold separator
/// copies of leaf keys that route lookups. The leaves are chained in both
/// directions, so in-order iteration, [`range`](BPlusTreeMap::range) scans and
/// [`floor_key`](BPlusTreeMap::floor_key)/[`ceiling_key`](BPlusTreeMap::ceiling_key)
/// queries never climb back up the tree.
///
/// The fanout is fixed at construction by an [`Order`]. A node splits once it
/// holds more than `order - 1` keys and, away from the root, is repaired by
/// borrowing from or merging with a sibling once it drops below
/// `(order - 1) / 2`.
///
/// It is a logic error for a key to be modified in such a way that the key's ordering relative to
/// any other key, as determined by the [`Ord`] trait, changes while it is in the map. This is
/// normally only possible through [`Cell`], [`RefCell`], global state, I/O, or unsafe code.
/// The behavior resulting from such a logic error is not specified, but will be encapsulated to the
/// `BPlusTreeMap` that observed the logic error and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use bplus_index::{BPlusTreeMap, Order};
///
/// let mut prices = BPlusTreeMap::with_order(Order::new(4));
/// prices.insert(120, "tea");
/// prices.insert(80, "bread");
/// prices.insert(300, "coffee");
/// prices.insert(45, "milk");
///
/// // point lookups
/// assert_eq!(prices.get(&80), Some(&"bread"));
/// assert!(!prices.contains_key(&81));
///
/// // nearest keys on either side of a probe
/// assert_eq!(prices.floor_key(&100), Some(&80));
/// assert_eq!(prices.ceiling_key(&100), Some(&120));
///
/// // start-exclusive, end-inclusive scans
/// let mid: Vec<_> = prices.range(&45, &120).map(|(_, item)| *item).collect();
/// assert_eq!(mid, ["bread", "tea"]);
///
/// // iterate over everything.
/// for (price, item) in &prices {
///     println!("{item}: {price}");
/// }
/// ```
///
/// A `BPlusTreeMap` with a known list of items can be initialized from an array:
///
/// ```
/// use bplus_index::BPlusTreeMap;
///
/// let solar_distance = BPlusTreeMap::from([
///     ("Mercury", 0.4),
///     ("Venus", 0.7),
///     ("Earth", 1.0),
///     ("Mars", 1.5),
/// ]);
/// assert_eq!(solar_distance["Earth"], 1.0);
/// ```
///
/// [B+ tree]: https://en.wikipedia.org/wiki/B%2B_tree
/// [`Cell`]: core::cell::Cell
/// [`RefCell`]: core::cell::RefCell
pub struct BPlusTreeMap<K, V> {
    raw: RawBPlusTree<K, V>,
}

/// An iterator over the entries of a `BPlusTreeMap`.
///
/// This `struct` is created by the [`iter`] method on [`BPlusTreeMap`]. See its
/// documentation for more.
///
/// # Examples
///
/// ```
/// use bplus_index::BPlusTreeMap;
///
/// let map = BPlusTreeMap::from([(1, "a"), (2, "b")]);
/// let mut iter = map.iter();
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next_back(), Some((&2, &"b")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`iter`]: BPlusTreeMap::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    cursor: LeafCursor<'a, K, V>,
    remaining: usize,
}

/// An iterator over the keys of a `BPlusTreeMap`.
///
/// This `struct` is created by the [`keys`] method on [`BPlusTreeMap`].
///
/// [`keys`]: BPlusTreeMap::keys
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of a `BPlusTreeMap`.
///
/// This `struct` is created by the [`values`] method on [`BPlusTreeMap`].
///
/// [`values`]: BPlusTreeMap::values
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over a sub-range of entries in a `BPlusTreeMap`.
///
/// This `struct` is created by the [`range`] method on [`BPlusTreeMap`]. See its
/// documentation for more.
///
/// [`range`]: BPlusTreeMap::range
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    cursor: LeafCursor<'a, K, V>,
}

impl<K, V> BPlusTreeMap<K, V> {
    /// Makes a new, empty `BPlusTreeMap` with [`Order::DEFAULT`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut map = BPlusTreeMap::new();
    ///
    /// // entries can now be inserted into the empty map
    /// map.insert(1, "a");
    /// ```
    #[must_use]
    pub fn new() -> BPlusTreeMap<K, V> {
        Self::with_order(Order::DEFAULT)
    }

    /// Makes a new, empty `BPlusTreeMap` whose nodes split past `order - 1` keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusTreeMap, Order};
    ///
    /// let map: BPlusTreeMap<u32, u32> = BPlusTreeMap::with_order(Order::new(5));
    /// assert_eq!(map.order(), Order::new(5));
    ///
    /// // orders below 3 are coerced up
    /// let small: BPlusTreeMap<u32, u32> = BPlusTreeMap::with_order(Order::new(2));
    /// assert_eq!(small.order(), Order::MIN);
    /// ```
    #[must_use]
    pub fn with_order(order: Order) -> BPlusTreeMap<K, V> {
        BPlusTreeMap {
            raw: RawBPlusTree::new(order),
        }
    }

    /// Returns the order this map was built with.
    #[must_use]
    pub const fn order(&self) -> Order {
        self.raw.order()
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut a = BPlusTreeMap::new();
    /// assert_eq!(a.len(), 0);
    /// a.insert(1, "a");
    /// assert_eq!(a.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of levels in the tree, counting the leaf level.
    ///
    /// An empty map has height 0 and a map whose entries fit in a single leaf
    /// has height 1. Each root split adds a level and each root collapse
    /// removes one.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusTreeMap, Order};
    ///
    /// let mut map = BPlusTreeMap::with_order(Order::new(5));
    /// assert_eq!(map.height(), 0);
    /// for key in 1..=4 {
    ///     map.insert(key, ());
    /// }
    /// assert_eq!(map.height(), 1);
    /// map.insert(5, ());
    /// assert_eq!(map.height(), 2);
    /// ```
    #[must_use]
    pub const fn height(&self) -> usize {
        self.raw.height()
    }

    /// Clears the map, removing all elements. The order is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut a = BPlusTreeMap::new();
    /// a.insert(1, "a");
    /// a.clear();
    /// assert!(a.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the first key-value pair in the map.
    /// The key in this pair is the minimum key in the map.
    ///
    /// # Complexity
    ///
    /// O(1) - reads the head of the leaf chain.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_position().map(|position| self.raw.entry(position))
    }

    /// Returns the last key-value pair in the map.
    /// The key in this pair is the maximum key in the map.
    ///
    /// # Complexity
    ///
    /// O(1) - reads the tail of the leaf chain.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_position().map(|position| self.raw.entry(position))
    }

    /// Returns the minimum key in the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTree`] if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusTreeMap, Error};
    ///
    /// let mut map = BPlusTreeMap::new();
    /// assert_eq!(map.first_key(), Err(Error::EmptyTree));
    /// map.insert(7, "x");
    /// map.insert(3, "y");
    /// assert_eq!(map.first_key(), Ok(&3));
    /// ```
    pub fn first_key(&self) -> Result<&K> {
        self.first_key_value().map(|(key, _)| key).ok_or(Error::EmptyTree)
    }

    /// Returns the maximum key in the map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTree`] if the map is empty.
    pub fn last_key(&self) -> Result<&K> {
        self.last_key_value().map(|(key, _)| key).ok_or(Error::EmptyTree)
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// # Complexity
    ///
    /// O(1) to create the iterator; O(1) per step along the leaf chain.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            cursor: LeafCursor::full(&self.raw),
            remaining: self.raw.len(),
        }
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut a = BPlusTreeMap::new();
    /// a.insert(2, "b");
    /// a.insert(1, "a");
    ///
    /// let keys: Vec<_> = a.keys().cloned().collect();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns the key-sets of every node, level by level from the root.
    ///
    /// Read-only; meant for inspecting the shape of the tree in tests.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::{BPlusTreeMap, Order};
    ///
    /// let mut map = BPlusTreeMap::with_order(Order::new(5));
    /// for key in 1..=6 {
    ///     map.insert(key, ());
    /// }
    /// assert_eq!(map.levels(), vec![vec![&[4][..]], vec![&[1, 2, 3][..], &[4, 5, 6][..]]]);
    /// ```
    #[must_use]
    pub fn levels(&self) -> Vec<Vec<&[K]>> {
        self.raw.levels()
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut map = BPlusTreeMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    ///
    /// The supplied key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).map(|position| self.raw.entry(position))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut map = BPlusTreeMap::new();
    /// map.insert(1, "a");
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Returns the greatest key less than or equal to `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let map = BPlusTreeMap::from([(10, 'a'), (20, 'b'), (30, 'c')]);
    /// assert_eq!(map.floor_key(&20), Some(&20));
    /// assert_eq!(map.floor_key(&25), Some(&20));
    /// assert_eq!(map.floor_key(&5), None);
    /// ```
    pub fn floor_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.floor_entry(key).map(|(key, _)| key)
    }

    /// Returns the least key greater than or equal to `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let map = BPlusTreeMap::from([(10, 'a'), (20, 'b'), (30, 'c')]);
    /// assert_eq!(map.ceiling_key(&20), Some(&20));
    /// assert_eq!(map.ceiling_key(&25), Some(&30));
    /// assert_eq!(map.ceiling_key(&35), None);
    /// ```
    pub fn ceiling_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.ceiling_entry(key).map(|(key, _)| key)
    }

    /// Returns the greatest key strictly less than `key`.
    pub fn lower_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.entry_at(self.raw.lower_position(key)).map(|(key, _)| key)
    }

    /// Returns the least key strictly greater than `key`.
    pub fn higher_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.entry_at(self.raw.higher_position(key)).map(|(key, _)| key)
    }

    /// Returns the entry with the greatest key less than or equal to `key`.
    pub fn floor_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.entry_at(self.raw.floor_position(key))
    }

    /// Returns the entry with the least key greater than or equal to `key`.
    pub fn ceiling_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.entry_at(self.raw.ceiling_position(key))
    }

    /// Constructs an iterator over the entries with keys in `(start, end]`:
    /// `start` is excluded and `end` is included.
    ///
    /// Unlike [`BTreeMap::range`](alloc::collections::BTreeMap::range), a
    /// reversed or empty interval (`start >= end`) is not an error; the
    /// iterator is simply empty.
    ///
    /// # Complexity
    ///
    /// O(log n) to find both ends, then O(1) per entry yielded.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let map: BPlusTreeMap<i32, i32> = (0..100).map(|k| (k, k * k)).collect();
    ///
    /// let keys: Vec<i32> = map.range(&25, &50).map(|(k, _)| *k).collect();
    /// assert_eq!(keys, (26..=50).collect::<Vec<_>>());
    ///
    /// assert_eq!(map.range(&50, &25).next(), None);
    /// assert_eq!(map.range(&7, &7).next(), None);
    /// assert_eq!(map.range(&7, &8).next_back(), Some((&8, &64)));
    /// ```
    pub fn range<Q>(&self, start: &Q, end: &Q) -> Range<'_, K, V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        if start >= end {
            return Range {
                cursor: LeafCursor::empty(&self.raw),
            };
        }

        let front = self.raw.higher_position(start).filter(|&position| {
            let key: &Q = self.raw.entry(position).0.borrow();
            key <= end
        });
        let back = front.and(self.raw.floor_position(end));
        Range {
            cursor: LeafCursor::new(&self.raw, front, back),
        }
    }

    /// Clones the entries of [`range`](BPlusTreeMap::range) into an owned,
    /// ascending `Vec`.
    pub fn range_to_vec<Q>(&self, start: &Q, end: &Q) -> Vec<(K, V)>
    where
        K: Borrow<Q> + Ord + Clone,
        V: Clone,
        Q: ?Sized + Ord,
    {
        self.range(start, end).map(|(key, value)| (key.clone(), value.clone())).collect()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    ///
    /// If the map did have this key present, the value is updated, and the old
    /// value is returned. The key is not updated and the shape of the tree does
    /// not change.
    ///
    /// # Complexity
    ///
    /// O(log n), including any cascade of node splits.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut map = BPlusTreeMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.is_empty(), false);
    ///
    /// map.insert(37, "b");
    /// assert_eq!(map.insert(37, "c"), Some("b"));
    /// assert_eq!(map[&37], "c");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Ord + Clone,
    {
        self.raw.insert(key, value)
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map. Removing an absent key leaves the tree untouched.
    ///
    /// # Complexity
    ///
    /// O(log n), including any cascade of borrows and merges.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut map = BPlusTreeMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Ord + Clone,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }

    /// Removes a key from the map, returning the stored key and value if the key
    /// was previously in the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Ord + Clone,
        Q: ?Sized + Ord,
    {
        self.raw.remove_entry(key)
    }

    /// Removes and returns the first element in the map.
    /// The key of this element is the minimum key that was in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeMap;
    ///
    /// let mut map = BPlusTreeMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    /// while let Some((key, _val)) = map.pop_first() {
    ///     assert!(map.iter().all(|(k, _v)| *k > key));
    /// }
    /// assert!(map.is_empty());
    /// ```
    pub fn pop_first(&mut self) -> Option<(K, V)>
    where
        K: Ord + Clone,
    {
        self.raw.pop_first()
    }

    /// Removes and returns the last element in the map.
    /// The key of this element is the maximum key that was in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)>
    where
        K: Ord + Clone,
    {
        self.raw.pop_last()
    }

    fn entry_at(&self, position: Option<Position>) -> Option<(&K, &V)> {
        position.map(|position| self.raw.entry(position))
    }
}

impl<K: Clone, V: Clone> Clone for BPlusTreeMap<K, V> {
    fn clone(&self) -> Self {
        BPlusTreeMap { raw: self.raw.clone() }
    }
}

impl<K: Hash, V: Hash> Hash for BPlusTreeMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (k, v) in self {
            k.hash(state);
            v.hash(state);
        }
    }
}

// Equality and ordering look at entries only; two maps of different orders can be equal.
impl<K: PartialEq, V: PartialEq> PartialEq for BPlusTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq> Eq for BPlusTreeMap<K, V> {}

impl<K: PartialOrd, V: PartialOrd> PartialOrd for BPlusTreeMap<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord> Ord for BPlusTreeMap<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for BPlusTreeMap<K, V> {
    fn default() -> Self {
        BPlusTreeMap::new()
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for BPlusTreeMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = BPlusTreeMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for BPlusTreeMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Ord + Copy, V: Copy> Extend<(&'a K, &'a V)> for BPlusTreeMap<K, V> {
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        for (&k, &v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a BPlusTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, Q, V> Index<&Q> for BPlusTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the `BPlusTreeMap`.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Ord + Clone, V, const N: usize> From<[(K, V); N]> for BPlusTreeMap<K, V> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.cursor.next()?;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let entry = self.cursor.next_back()?;
        self.remaining -= 1;
        Some(entry)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            cursor: self.cursor.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursor.size_hint()
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.cursor.next_back()
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Range {
            cursor: self.cursor.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Range<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::vec;

    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(BPlusTreeMap<u32, String>: Clone, Default, Send, Sync);
    assert_impl_all!(Iter<'static, u32, u32>: ExactSizeIterator, FusedIterator, DoubleEndedIterator, Clone);
    assert_impl_all!(Range<'static, u32, u32>: FusedIterator, DoubleEndedIterator, Clone);

    fn map_of(order: usize, keys: impl IntoIterator<Item = i32>) -> BPlusTreeMap<i32, i32> {
        let mut map = BPlusTreeMap::with_order(Order::new(order));
        map.extend(keys.into_iter().map(|k| (k, k * 10)));
        map.raw.validate_invariants();
        map
    }

    #[test]
    fn range_bounds_are_exclusive_then_inclusive() {
        let map = map_of(3, 0..20);
        let keys: Vec<i32> = map.range(&4, &9).map(|(k, _)| *k).collect();
        assert_eq!(keys, [5, 6, 7, 8, 9]);

        // Probes between keys.
        let map = map_of(4, (0..20).map(|k| k * 5));
        let keys: Vec<i32> = map.range(&12, &33).map(|(k, _)| *k).collect();
        assert_eq!(keys, [15, 20, 25, 30]);
    }

    #[test]
    fn range_with_no_keys_inside_is_empty() {
        let map = map_of(4, (0..20).map(|k| k * 5));
        assert_eq!(map.range(&11, &14).next(), None);
        assert_eq!(map.range(&95, &1000).next(), None);
        assert_eq!(map.range(&-100, &-1).next(), None);
        assert_eq!(map.range(&10, &10).next(), None);
        assert_eq!(map.range(&10, &5).next(), None);
    }

    #[test]
    fn range_size_hint_bounds_its_length() {
        let map = map_of(4, 0..100);
        assert_eq!(map.range(&10, &5).size_hint(), (0, Some(0)));
        assert_eq!(map.range(&200, &300).size_hint(), (0, Some(0)));

        for (start, end) in [(-1, 0), (24, 50), (-1, 99)] {
            let range = map.range(&start, &end);
            let (lower, upper) = range.size_hint();
            let count = range.count();
            assert!(lower <= count, "({start}, {end}]: lower {lower} above {count}");
            assert!(upper.is_some_and(|upper| count <= upper), "({start}, {end}]: upper {upper:?} below {count}");
        }
    }

    #[test]
    fn range_walks_from_both_ends() {
        let map = map_of(3, 0..30);
        let mut range = map.range(&9, &14);
        assert_eq!(range.next_back(), Some((&14, &140)));
        assert_eq!(range.next(), Some((&10, &100)));
        let rest: Vec<i32> = range.rev().map(|(k, _)| *k).collect();
        assert_eq!(rest, [13, 12, 11]);
    }

    #[test]
    fn iter_len_tracks_both_ends() {
        let map = map_of(5, 0..12);
        let mut iter = map.iter();
        assert_eq!(iter.len(), 12);
        iter.next();
        iter.next_back();
        assert_eq!(iter.len(), 10);
        assert_eq!(iter.clone().count(), 10);
        assert_eq!(iter.last(), Some((&10, &100)));
    }

    #[test]
    fn debug_prints_as_map() {
        let map = map_of(3, 1..=3);
        assert_eq!(format!("{map:?}"), "{1: 10, 2: 20, 3: 30}");
        assert_eq!(format!("{:?}", map.keys()), "[1, 2, 3]");
        assert_eq!(format!("{:?}", map.range(&1, &3)), "[(2, 20), (3, 30)]");
    }

    #[test]
    fn equality_ignores_order() {
        let narrow = map_of(3, 0..40);
        let wide = map_of(32, (0..40).rev());
        assert_eq!(narrow, wide);
        assert_ne!(narrow, map_of(3, 0..39));
        assert!(map_of(4, [1, 2]) < map_of(4, [1, 3]));
    }

    #[test]
    fn lower_and_higher_skip_exact_matches() {
        let map = map_of(3, (0..10).map(|k| k * 2));
        assert_eq!(map.lower_key(&6), Some(&4));
        assert_eq!(map.higher_key(&6), Some(&8));
        assert_eq!(map.lower_key(&0), None);
        assert_eq!(map.higher_key(&18), None);
        assert_eq!(map.floor_entry(&7), Some((&6, &60)));
        assert_eq!(map.ceiling_entry(&7), Some((&8, &80)));
    }

    #[test]
    fn string_keys_borrow_as_str() {
        let mut map = BPlusTreeMap::with_order(Order::new(3));
        for word in ["pear", "apple", "fig", "kiwi", "plum"] {
            map.insert(String::from(word), word.len());
        }
        assert_eq!(map.get("fig"), Some(&3));
        assert_eq!(map.floor_key("grape").map(String::as_str), Some("fig"));
        assert_eq!(map.range_to_vec("apple", "kiwi"), vec![(String::from("fig"), 3), (String::from("kiwi"), 4)]);
        assert_eq!(map.remove("pear"), Some(4));
        map.raw.validate_invariants();
    }
}
