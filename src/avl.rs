//! An ordered map implemented with an AVL tree.

use std::cmp;
use std::fmt;
use std::iter::FromIterator;

use log::trace;

use crate::error::Violation;
use crate::iter::LevelOrder;
use crate::node::{Link, Node, NodePtr};
use crate::tree::Tree;
use crate::{private, OrderedMap};

/// An ordered map implemented with an AVL tree.
///
/// Every node stores the height of its subtree (a leaf has height 1) and the
/// heights of the two subtrees of any node differ by at most one.
///
/// ```
/// use balanced_trees::AvlTreeMap;
/// let mut map = AvlTreeMap::new();
/// map.insert(0, "zero");
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.find(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.find(&1).is_none());
/// ```
pub struct AvlTreeMap<K, V> {
    tree: Tree<K, V, usize>,
}

type AvlPtr<K, V> = NodePtr<K, V, usize>;
type AvlLink<K, V> = Link<K, V, usize>;

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self { tree: Tree::new() }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    ///
    /// The count is not stored, so this walks the whole tree.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns the height of the tree, 0 if it is empty.
    pub fn height(&self) -> usize {
        Self::height_of(self.tree.root)
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn find(&self, key: &K) -> Option<&V> {
        self.tree.find(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        self.tree.find_mut(key)
    }

    /// Returns true if the map contains a value for the key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.find_node(key).is_some()
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first_key_value()
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last_key_value()
    }

    /// Gets a level-order iterator over the nodes of the map, starting at the root.
    pub fn iter(&self) -> LevelOrder<'_, K, V, usize> {
        self.tree.level_order()
    }

    /// Calls `f` on every entry in ascending key order.
    pub fn for_each_in_order<F: FnMut(&K, &V)>(&self, mut f: F) {
        self.tree.inorder(|node_ptr| {
            let node = unsafe { node_ptr.as_ref() };
            f(&node.key, &node.value)
        });
    }

    /// Inserts a key-value pair into the map.
    /// If the key is present already, only its value is replaced.
    /// Always returns true.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if let Some(node_ptr) = self.tree.insert_or_update(key, value, 1) {
            let parent = unsafe { node_ptr.as_ref().parent };
            self.fixup(parent);
        }
        true
    }

    /// Removes a key from the map.
    /// Returns whether the key was previously in the map.
    pub fn remove(&mut self, key: &K) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Removes a key from the map, returning the stored key and value
    /// if the key was previously in the map.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let node_ptr = self.tree.find_node(key)?;
        let entry = self.remove_node(node_ptr);
        debug_assert!(self.find(key).is_none());
        Some(entry)
    }

    /// Checks all structural invariants of the tree.
    pub fn validate(&self) -> Result<(), Violation> {
        self.tree.validate_links()?;
        let mut result = Ok(());
        self.tree.preorder(|node_ptr| {
            if result.is_err() {
                return;
            }
            let node = unsafe { node_ptr.as_ref() };
            let left_height = Self::height_of(node.left);
            let right_height = Self::height_of(node.right);
            let computed = 1 + cmp::max(left_height, right_height);
            if node.meta != computed {
                result = Err(Violation::HeightMismatch {
                    stored: node.meta,
                    computed,
                });
            } else if left_height.abs_diff(right_height) > 1 {
                result = Err(Violation::Unbalanced {
                    balance: Self::balance(node_ptr),
                });
            }
        });
        result
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        if let Err(violation) = self.validate() {
            panic!("inconsistent AVL tree: {violation}");
        }
    }

    fn remove_node(&mut self, mut node_ptr: AvlPtr<K, V>) -> (K, V) {
        unsafe {
            // Node with two children takes over the entry of its predecessor,
            // which has no right child and is removed instead.
            if let (Some(left_ptr), Some(_)) = (node_ptr.as_ref().left, node_ptr.as_ref().right) {
                let predecessor_ptr = Tree::max_node(left_ptr);
                Node::swap_entries(node_ptr, predecessor_ptr);
                node_ptr = predecessor_ptr;
            }

            match node_ptr.as_ref().left.or(node_ptr.as_ref().right) {
                Some(child_ptr) => {
                    // Absorb the only child into node
                    Node::swap_entries(node_ptr, child_ptr);
                    node_ptr.as_mut().left = child_ptr.as_ref().left;
                    node_ptr.as_mut().right = child_ptr.as_ref().right;
                    for mut grandchild_ptr in [child_ptr.as_ref().left, child_ptr.as_ref().right]
                        .into_iter()
                        .flatten()
                    {
                        grandchild_ptr.as_mut().parent = Some(node_ptr);
                    }
                    let entry = Node::destroy(child_ptr);
                    self.fixup(Some(node_ptr));
                    entry
                }
                None => {
                    let parent = node_ptr.as_ref().parent;
                    let entry = self.tree.detach_leaf(node_ptr);
                    self.fixup(parent);
                    entry
                }
            }
        }
    }

    fn height_of(link: AvlLink<K, V>) -> usize {
        match link {
            None => 0,
            Some(node_ptr) => unsafe { node_ptr.as_ref().meta },
        }
    }

    fn balance(node_ptr: AvlPtr<K, V>) -> isize {
        let node = unsafe { node_ptr.as_ref() };
        Self::height_of(node.left) as isize - Self::height_of(node.right) as isize
    }

    fn adjust_height(mut node_ptr: AvlPtr<K, V>) {
        unsafe {
            node_ptr.as_mut().meta = 1 + cmp::max(
                Self::height_of(node_ptr.as_ref().left),
                Self::height_of(node_ptr.as_ref().right),
            );
        }
    }

    fn rotate_left(&mut self, node_ptr: AvlPtr<K, V>) -> AvlLink<K, V> {
        let right_ptr = self.tree.rotate_left(node_ptr)?;
        // Node is now below its former child
        Self::adjust_height(node_ptr);
        Self::adjust_height(right_ptr);
        Some(right_ptr)
    }

    fn rotate_right(&mut self, node_ptr: AvlPtr<K, V>) -> AvlLink<K, V> {
        let left_ptr = self.tree.rotate_right(node_ptr)?;
        Self::adjust_height(node_ptr);
        Self::adjust_height(left_ptr);
        Some(left_ptr)
    }

    /// Right-left double rotation for a right-heavy node whose right child leans left.
    fn rotate_right_left(&mut self, node_ptr: AvlPtr<K, V>) -> AvlLink<K, V> {
        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
            self.rotate_right(right_ptr);
        }
        self.rotate_left(node_ptr)
    }

    /// Left-right double rotation for a left-heavy node whose left child leans right.
    fn rotate_left_right(&mut self, node_ptr: AvlPtr<K, V>) -> AvlLink<K, V> {
        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
            self.rotate_left(left_ptr);
        }
        self.rotate_right(node_ptr)
    }

    /// Restores the AVL condition at a node whose balance factor is +2 or -2
    /// with exactly one single or double rotation.
    /// Returns the node now at the top of the subtree.
    fn fix_balance(&mut self, node_ptr: AvlPtr<K, V>) -> AvlPtr<K, V> {
        Self::adjust_height(node_ptr);
        let balance = Self::balance(node_ptr);
        debug_assert!((-2..=2).contains(&balance));
        let (left, right) = unsafe { (node_ptr.as_ref().left, node_ptr.as_ref().right) };
        let top = match balance {
            -2 => {
                if right.map_or(0, Self::balance) > 0 {
                    trace!("right-left rotation");
                    self.rotate_right_left(node_ptr)
                } else {
                    self.rotate_left(node_ptr)
                }
            }
            2 => {
                if left.map_or(0, Self::balance) < 0 {
                    trace!("left-right rotation");
                    self.rotate_left_right(node_ptr)
                } else {
                    self.rotate_right(node_ptr)
                }
            }
            _ => None,
        };
        top.unwrap_or(node_ptr)
    }

    /// Recomputes heights from given position up to the root node,
    /// rebalancing every node found out of balance on the way.
    fn fixup(&mut self, start_from: AvlLink<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            Self::adjust_height(node_ptr);
            let top_ptr = match Self::balance(node_ptr) {
                -2 | 2 => self.fix_balance(node_ptr),
                _ => node_ptr,
            };
            current = unsafe { top_ptr.as_ref().parent };
        }
    }
}

impl<K: Ord, V> private::Sealed for AvlTreeMap<K, V> {}

impl<K: Ord, V> OrderedMap<K, V> for AvlTreeMap<K, V> {
    type Meta = usize;

    fn insert(&mut self, key: K, value: V) -> bool {
        AvlTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> bool {
        AvlTreeMap::remove(self, key)
    }

    fn find(&self, key: &K) -> Option<&V> {
        AvlTreeMap::find(self, key)
    }

    fn iter(&self) -> LevelOrder<'_, K, V, usize> {
        AvlTreeMap::iter(self)
    }

    fn validate(&self) -> Result<(), Violation> {
        AvlTreeMap::validate(self)
    }
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = <LevelOrder<'a, K, V, usize> as Iterator>::Item;
    type IntoIter = LevelOrder<'a, K, V, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|node| (node.key(), node.value())))
            .finish()
    }
}
