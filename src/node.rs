use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::rb::Color;

pub(crate) type NodePtr<K, V, M> = NonNull<Node<K, V, M>>;
pub(crate) type Link<K, V, M> = Option<NodePtr<K, V, M>>;
pub(crate) type LinkPtr<K, V, M> = NonNull<Link<K, V, M>>;

/// A tree node carrying balancing metadata `M`.
///
/// Children are owned through `left` and `right`. The `parent` link never owns
/// and must always point to the node whose `left` or `right` refers back here.
pub(crate) struct Node<K, V, M> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Link<K, V, M>,
    pub(crate) right: Link<K, V, M>,
    pub(crate) parent: Link<K, V, M>,
    pub(crate) meta: M,
}

impl<K, V, M> Node<K, V, M> {
    pub(crate) fn create(parent: Link<K, V, M>, key: K, value: V, meta: M) -> NodePtr<K, V, M> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            meta,
        });
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    /// Frees a node that is no longer linked into any tree.
    pub(crate) unsafe fn destroy(node_ptr: NodePtr<K, V, M>) -> (K, V) {
        let boxed = Box::from_raw(node_ptr.as_ptr());
        (boxed.key, boxed.value)
    }

    /// Exchanges key and value between two nodes, leaving links and metadata in place.
    pub(crate) unsafe fn swap_entries(mut a: NodePtr<K, V, M>, mut b: NodePtr<K, V, M>) {
        debug_assert!(a != b);
        std::mem::swap(&mut a.as_mut().key, &mut b.as_mut().key);
        std::mem::swap(&mut a.as_mut().value, &mut b.as_mut().value);
    }
}

/// A shared handle to a live node of a tree.
///
/// Handles are produced by [`LevelOrder`](crate::LevelOrder) and borrow the tree,
/// so the tree cannot change while a handle exists. Removing a key that has two
/// children moves its in-order predecessor's entry into the removed node, so a
/// handle taken before such a removal may afterwards show a different key.
pub struct NodeRef<'a, K, V, M> {
    ptr: NodePtr<K, V, M>,
    marker: PhantomData<&'a Node<K, V, M>>,
}

impl<'a, K, V, M> NodeRef<'a, K, V, M> {
    pub(crate) fn new(ptr: NodePtr<K, V, M>) -> Self {
        Self {
            ptr,
            marker: PhantomData,
        }
    }

    fn node(&self) -> &'a Node<K, V, M> {
        unsafe { &*self.ptr.as_ptr() }
    }

    fn wrap(link: Link<K, V, M>) -> Option<Self> {
        link.map(Self::new)
    }

    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    pub fn value(&self) -> &'a V {
        &self.node().value
    }

    pub fn left(&self) -> Option<Self> {
        Self::wrap(self.node().left)
    }

    pub fn right(&self) -> Option<Self> {
        Self::wrap(self.node().right)
    }

    /// Returns the node this one hangs from, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        Self::wrap(self.node().parent)
    }

    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.node().left.is_none() && self.node().right.is_none()
    }
}

impl<'a, K, V> NodeRef<'a, K, V, usize> {
    /// Height of the subtree rooted at this node. A leaf has height 1.
    pub fn height(&self) -> usize {
        self.node().meta
    }

    /// Height of the left subtree minus height of the right subtree.
    pub fn balance(&self) -> isize {
        let left = self.left().map_or(0, |n| n.height());
        let right = self.right().map_or(0, |n| n.height());
        left as isize - right as isize
    }
}

impl<'a, K, V> NodeRef<'a, K, V, Color> {
    pub fn color(&self) -> Color {
        self.node().meta
    }
}

impl<'a, K, V, M> Clone for NodeRef<'a, K, V, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V, M> Copy for NodeRef<'a, K, V, M> {}

impl<'a, K, V, M> PartialEq for NodeRef<'a, K, V, M> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<'a, K, V, M> Eq for NodeRef<'a, K, V, M> {}

impl<'a, K, V, M> fmt::Debug for NodeRef<'a, K, V, M>
where
    K: fmt::Debug,
    V: fmt::Debug,
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("value", self.value())
            .field("meta", &self.node().meta)
            .finish()
    }
}
