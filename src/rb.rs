//! An ordered map implemented with a red-black tree.

use std::fmt;
use std::iter::FromIterator;

use log::trace;

use crate::error::Violation;
use crate::iter::LevelOrder;
use crate::node::{Link, Node, NodePtr};
use crate::tree::Tree;
use crate::{private, OrderedMap};

/// Node color of a red-black tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// An ordered map implemented with a red-black tree.
///
/// The root is black, no red node has a red child, and every path from the
/// root down to a missing child passes the same number of black nodes.
///
/// ```
/// use balanced_trees::RbTreeMap;
/// let mut map = RbTreeMap::new();
/// map.insert(2, "two");
/// map.insert(3, "three");
/// map.insert(10, "ten");
/// let keys: Vec<_> = map.iter().map(|node| *node.key()).collect();
/// assert_eq!(keys, [3, 2, 10]);
/// ```
pub struct RbTreeMap<K, V> {
    tree: Tree<K, V, Color>,
}

type RbPtr<K, V> = NodePtr<K, V, Color>;
type RbLink<K, V> = Link<K, V, Color>;

fn is_red<K, V>(link: RbLink<K, V>) -> bool {
    match link {
        None => false,
        Some(node_ptr) => unsafe { node_ptr.as_ref().meta == Color::Red },
    }
}

fn set_color<K, V>(link: RbLink<K, V>, color: Color) {
    if let Some(mut node_ptr) = link {
        unsafe { node_ptr.as_mut().meta = color };
    }
}

fn is_left_child<K, V>(node_ptr: RbPtr<K, V>, parent_ptr: RbPtr<K, V>) -> bool {
    unsafe { parent_ptr.as_ref().left == Some(node_ptr) }
}

fn sibling<K, V>(node_ptr: RbPtr<K, V>, parent_ptr: RbPtr<K, V>) -> RbLink<K, V> {
    unsafe {
        if is_left_child(node_ptr, parent_ptr) {
            parent_ptr.as_ref().right
        } else {
            parent_ptr.as_ref().left
        }
    }
}

impl<K: Ord, V> RbTreeMap<K, V> {
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

    /// Returns the number of black nodes on any path from the root down to a
    /// missing child, 0 if the tree is empty.
    pub fn black_height(&self) -> usize {
        let mut black_height = 0;
        let mut current = self.tree.root;
        while let Some(node_ptr) = current {
            if !is_red(current) {
                black_height += 1;
            }
            current = unsafe { node_ptr.as_ref().left };
        }
        black_height
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
    pub fn iter(&self) -> LevelOrder<'_, K, V, Color> {
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
        if let Some(node_ptr) = self.tree.insert_or_update(key, value, Color::Red) {
            self.insert_fixup(node_ptr);
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
        if is_red(self.tree.root) {
            return Err(Violation::RedRoot);
        }
        Self::validate_subtree(self.tree.root).map(|_| ())
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        if let Err(violation) = self.validate() {
            panic!("inconsistent red-black tree: {violation}");
        }
    }

    /// Returns the black height of the subtree below `link`.
    /// Recursion depth is bounded by the height of a valid tree.
    fn validate_subtree(link: RbLink<K, V>) -> Result<usize, Violation> {
        let Some(node_ptr) = link else {
            return Ok(0);
        };
        let node = unsafe { node_ptr.as_ref() };
        if node.meta == Color::Red && (is_red(node.left) || is_red(node.right)) {
            return Err(Violation::RedRedEdge);
        }
        let left = Self::validate_subtree(node.left)?;
        let right = Self::validate_subtree(node.right)?;
        if left != right {
            return Err(Violation::BlackHeightMismatch { left, right });
        }
        Ok(left + usize::from(node.meta == Color::Black))
    }

    /// Rotates left and swaps the colors of the node and its promoted child,
    /// so the colors of the two positions stay where they were.
    fn rotate_left(&mut self, mut node_ptr: RbPtr<K, V>) -> RbLink<K, V> {
        let mut right_ptr = self.tree.rotate_left(node_ptr)?;
        unsafe { std::mem::swap(&mut node_ptr.as_mut().meta, &mut right_ptr.as_mut().meta) };
        Some(right_ptr)
    }

    fn rotate_right(&mut self, mut node_ptr: RbPtr<K, V>) -> RbLink<K, V> {
        let mut left_ptr = self.tree.rotate_right(node_ptr)?;
        unsafe { std::mem::swap(&mut node_ptr.as_mut().meta, &mut left_ptr.as_mut().meta) };
        Some(left_ptr)
    }

    /// Rotates `parent_ptr` so that its child `node_ptr` moves down one level.
    fn rotate_toward(&mut self, node_ptr: RbPtr<K, V>, parent_ptr: RbPtr<K, V>) -> RbLink<K, V> {
        if is_left_child(node_ptr, parent_ptr) {
            self.rotate_left(parent_ptr)
        } else {
            self.rotate_right(parent_ptr)
        }
    }

    /// Restores the red-black properties after `node_ptr` was attached as a red leaf.
    fn insert_fixup(&mut self, node_ptr: RbPtr<K, V>) {
        let mut current = node_ptr;
        unsafe {
            while let Some(parent_ptr) = current.as_ref().parent.filter(|p| is_red(Some(*p))) {
                // A red parent is never the root, so the grandparent exists
                let Some(grandparent_ptr) = parent_ptr.as_ref().parent else {
                    break;
                };
                let parent_is_left = is_left_child(parent_ptr, grandparent_ptr);
                let uncle = sibling(parent_ptr, grandparent_ptr);

                if is_red(uncle) {
                    trace!("insert fixup: recolor");
                    set_color(Some(parent_ptr), Color::Black);
                    set_color(uncle, Color::Black);
                    set_color(Some(grandparent_ptr), Color::Red);
                    current = grandparent_ptr;
                } else if is_left_child(current, parent_ptr) != parent_is_left {
                    // Inner child: straighten the zig-zag first, then handle
                    // the former parent as the outer child.
                    trace!("insert fixup: inner rotation");
                    if parent_is_left {
                        self.rotate_left(parent_ptr);
                    } else {
                        self.rotate_right(parent_ptr);
                    }
                    current = parent_ptr;
                } else {
                    trace!("insert fixup: outer rotation");
                    if parent_is_left {
                        self.rotate_right(grandparent_ptr);
                    } else {
                        self.rotate_left(grandparent_ptr);
                    }
                }
            }
        }
        set_color(self.tree.root, Color::Black);
    }

    fn remove_node(&mut self, mut node_ptr: RbPtr<K, V>) -> (K, V) {
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
                    // A node with a single child is black and its child is a red leaf.
                    // Move the child's entry up and drop the child.
                    debug_assert!(!is_red(Some(node_ptr)) && is_red(Some(child_ptr)));
                    Node::swap_entries(node_ptr, child_ptr);
                    node_ptr.as_mut().left = None;
                    node_ptr.as_mut().right = None;
                    Node::destroy(child_ptr)
                }
                None => {
                    // Removing a black leaf below the root leaves its path one black short
                    if node_ptr.as_ref().parent.is_some() && !is_red(Some(node_ptr)) {
                        self.remove_fixup(node_ptr);
                    }
                    self.tree.detach_leaf(node_ptr)
                }
            }
        }
    }

    /// Repairs the black-height deficit on the path through `node_ptr`,
    /// moving towards the root while the deficit cannot be absorbed locally.
    fn remove_fixup(&mut self, node_ptr: RbPtr<K, V>) {
        let mut current = node_ptr;
        unsafe {
            while let Some(parent_ptr) = current.as_ref().parent {
                let Some(mut sibling_ptr) = sibling(current, parent_ptr) else {
                    debug_assert!(false, "black node without sibling");
                    break;
                };

                if is_red(Some(sibling_ptr)) {
                    // Parent turns red and the black sibling's child becomes the new sibling
                    trace!("remove fixup: red sibling");
                    self.rotate_toward(current, parent_ptr);
                    match sibling(current, parent_ptr) {
                        Some(new_sibling_ptr) => sibling_ptr = new_sibling_ptr,
                        None => {
                            debug_assert!(false, "red sibling without children");
                            break;
                        }
                    }
                }

                let near_is_left = is_left_child(current, parent_ptr);
                let (near, far) = if near_is_left {
                    (sibling_ptr.as_ref().left, sibling_ptr.as_ref().right)
                } else {
                    (sibling_ptr.as_ref().right, sibling_ptr.as_ref().left)
                };

                if !is_red(near) && !is_red(far) {
                    set_color(Some(sibling_ptr), Color::Red);
                    if is_red(Some(parent_ptr)) {
                        trace!("remove fixup: black sibling, red parent");
                        set_color(Some(parent_ptr), Color::Black);
                        break;
                    }
                    trace!("remove fixup: black sibling, black parent");
                    current = parent_ptr;
                    continue;
                }

                if !is_red(far) {
                    // Near nephew is red: turn it into the far one
                    trace!("remove fixup: red near nephew");
                    let rotated = if near_is_left {
                        self.rotate_right(sibling_ptr)
                    } else {
                        self.rotate_left(sibling_ptr)
                    };
                    sibling_ptr = rotated.unwrap_or(sibling_ptr);
                }

                trace!("remove fixup: red far nephew");
                let far = if near_is_left {
                    sibling_ptr.as_ref().right
                } else {
                    sibling_ptr.as_ref().left
                };
                set_color(far, Color::Black);
                self.rotate_toward(current, parent_ptr);
                break;
            }
        }
    }
}

impl<K: Ord, V> private::Sealed for RbTreeMap<K, V> {}

impl<K: Ord, V> OrderedMap<K, V> for RbTreeMap<K, V> {
    type Meta = Color;

    fn insert(&mut self, key: K, value: V) -> bool {
        RbTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> bool {
        RbTreeMap::remove(self, key)
    }

    fn find(&self, key: &K) -> Option<&V> {
        RbTreeMap::find(self, key)
    }

    fn iter(&self) -> LevelOrder<'_, K, V, Color> {
        RbTreeMap::iter(self)
    }

    fn validate(&self) -> Result<(), Violation> {
        RbTreeMap::validate(self)
    }
}

impl<K: Ord, V> Default for RbTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a RbTreeMap<K, V> {
    type Item = <LevelOrder<'a, K, V, Color> as Iterator>::Item;
    type IntoIter = LevelOrder<'a, K, V, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> Extend<(K, V)> for RbTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for RbTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|node| (node.key(), node.value())))
            .finish()
    }
}
