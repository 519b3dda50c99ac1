//! Ordered maps implemented with self-balancing binary search trees.
//!
//! Two balancing schemes are provided behind the common [`OrderedMap`] trait:
//!
//! - [`AvlTreeMap`] keeps the heights of sibling subtrees within one of each other.
//! - [`RbTreeMap`] colors nodes red or black and keeps the black height of all
//!   paths equal.
//!
//! Both guarantee a tree height logarithmic in the number of entries.
//! Inserting an existing key overwrites its value. Iteration walks the nodes
//! in level order, starting at the root.
//!
//! ```
//! use balanced_trees::{OrderedMap, RbTreeMap};
//! let mut map = RbTreeMap::new();
//! for key in [2, 3, 10, 19, 1] {
//!     map.insert(key, key * 10);
//! }
//! assert_eq!(map.find(&19), Some(&190));
//! let keys: Vec<_> = map.iter().map(|node| *node.key()).collect();
//! assert_eq!(keys, [3, 2, 10, 1, 19]);
//! ```
//!
//! The maps are meant for use from a single thread and are neither `Send`
//! nor `Sync`.

mod avl;
mod error;
mod iter;
mod node;
mod rb;
mod tree;

pub use avl::AvlTreeMap;
pub use error::Violation;
pub use iter::LevelOrder;
pub use node::NodeRef;
pub use rb::{Color, RbTreeMap};

mod private {
    pub trait Sealed {}
}

/// The operations shared by the balanced maps of this crate.
///
/// This trait is sealed: [`AvlTreeMap`] and [`RbTreeMap`] are its only implementations.
pub trait OrderedMap<K: Ord, V>: private::Sealed {
    /// Balancing metadata stored in each node: the subtree height for AVL
    /// trees, the [`Color`] for red-black trees.
    type Meta;

    /// Inserts a key-value pair, overwriting the value if the key is present.
    /// Always returns true.
    fn insert(&mut self, key: K, value: V) -> bool;

    /// Removes a key. Returns whether the key was present.
    fn remove(&mut self, key: &K) -> bool;

    /// Returns a reference to the value stored for the key.
    fn find(&self, key: &K) -> Option<&V>;

    /// Gets a fresh level-order iterator starting at the current root.
    fn iter(&self) -> LevelOrder<'_, K, V, Self::Meta>;

    /// Checks all structural invariants of the tree.
    fn validate(&self) -> Result<(), Violation>;

    fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Returns the number of entries. Walks the whole tree.
    fn len(&self) -> usize {
        self.iter().count()
    }
}
