use std::cmp::Ordering;
use std::marker::PhantomData;

use log::{debug, trace};

use crate::error::Violation;
use crate::iter::LevelOrder;
use crate::node::{Link, LinkPtr, Node, NodePtr};

/// Binary search tree storage shared by the balanced maps.
///
/// Owns the root and every node below it. Balancing is left to the engines,
/// which drive the link-level rotations provided here and keep their own
/// metadata `M` up to date.
pub(crate) struct Tree<K, V, M> {
    pub(crate) root: Link<K, V, M>,
    marker: PhantomData<Box<Node<K, V, M>>>,
}

/// Result of descending towards a key for insertion.
pub(crate) enum Slot<K, V, M> {
    /// A node with the key exists already.
    Occupied(NodePtr<K, V, M>),
    /// The key is absent; a new node belongs in `link` below `parent`.
    Vacant {
        parent: Link<K, V, M>,
        link: LinkPtr<K, V, M>,
    },
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K, V, M> Tree<K, V, M> {
    pub(crate) fn new() -> Self {
        Self {
            root: None,
            marker: PhantomData,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn level_order(&self) -> LevelOrder<'_, K, V, M> {
        LevelOrder::new(self.root)
    }

    /// Destroys all nodes, leaving an empty tree.
    pub(crate) fn clear(&mut self) {
        if self.root.is_some() {
            self.postorder(|node_ptr| unsafe {
                Node::destroy(node_ptr);
            });
            self.root = None;
            debug!("tree cleared");
        }
    }

    pub(crate) fn min_node(from: NodePtr<K, V, M>) -> NodePtr<K, V, M> {
        let mut node_ptr = from;
        while let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
            node_ptr = left_ptr;
        }
        node_ptr
    }

    pub(crate) fn max_node(from: NodePtr<K, V, M>) -> NodePtr<K, V, M> {
        let mut node_ptr = from;
        while let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
            node_ptr = right_ptr;
        }
        node_ptr
    }

    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| {
            let node = unsafe { &*Self::min_node(root_ptr).as_ptr() };
            (&node.key, &node.value)
        })
    }

    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| {
            let node = unsafe { &*Self::max_node(root_ptr).as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Points the link that currently holds `old` (in its parent, or the root
    /// link) at `new`. The parent link of `new` is left to the caller.
    pub(crate) fn replace_child(&mut self, old: NodePtr<K, V, M>, new: Link<K, V, M>) {
        unsafe {
            match old.as_ref().parent {
                None => self.root = new,
                Some(mut parent_ptr) => {
                    if parent_ptr.as_ref().left == Some(old) {
                        parent_ptr.as_mut().left = new;
                    } else {
                        debug_assert!(parent_ptr.as_ref().right == Some(old));
                        parent_ptr.as_mut().right = new;
                    }
                }
            }
        }
    }

    /// Unlinks a childless node from its parent (or the root) and frees it.
    pub(crate) fn detach_leaf(&mut self, node_ptr: NodePtr<K, V, M>) -> (K, V) {
        unsafe {
            debug_assert!(node_ptr.as_ref().left.is_none() && node_ptr.as_ref().right.is_none());
            self.replace_child(node_ptr, None);
            if self.root.is_none() {
                debug!("tree emptied");
            }
            Node::destroy(node_ptr)
        }
    }

    /// Promotes the right child of `node_ptr` into its place.
    /// Returns the promoted node, or `None` if there was no right child.
    /// The root link follows when the promoted node ends up without a parent.
    pub(crate) fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V, M>) -> Link<K, V, M> {
        unsafe {
            let mut right_ptr = node_ptr.as_ref().right?;
            trace!("rotate left");

            node_ptr.as_mut().right = right_ptr.as_ref().left;
            if let Some(mut right_left_ptr) = right_ptr.as_ref().left {
                right_left_ptr.as_mut().parent = Some(node_ptr);
            }

            self.replace_child(node_ptr, Some(right_ptr));
            right_ptr.as_mut().parent = node_ptr.as_ref().parent;

            right_ptr.as_mut().left = Some(node_ptr);
            node_ptr.as_mut().parent = Some(right_ptr);
            Some(right_ptr)
        }
    }

    /// Promotes the left child of `node_ptr` into its place.
    /// Returns the promoted node, or `None` if there was no left child.
    pub(crate) fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V, M>) -> Link<K, V, M> {
        unsafe {
            let mut left_ptr = node_ptr.as_ref().left?;
            trace!("rotate right");

            node_ptr.as_mut().left = left_ptr.as_ref().right;
            if let Some(mut left_right_ptr) = left_ptr.as_ref().right {
                left_right_ptr.as_mut().parent = Some(node_ptr);
            }

            self.replace_child(node_ptr, Some(left_ptr));
            left_ptr.as_mut().parent = node_ptr.as_ref().parent;

            left_ptr.as_mut().right = Some(node_ptr);
            node_ptr.as_mut().parent = Some(left_ptr);
            Some(left_ptr)
        }
    }

    pub(crate) fn preorder<F: FnMut(NodePtr<K, V, M>)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    pub(crate) fn inorder<F: FnMut(NodePtr<K, V, M>)>(&self, f: F) {
        self.traverse(|_| {}, f, |_| {});
    }

    fn postorder<F: FnMut(NodePtr<K, V, M>)>(&self, f: F) {
        self.traverse(|_| {}, |_| {}, f);
    }

    /// Walks the tree along parent links without recursion or extra memory.
    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodePtr<K, V, M>),
        In: FnMut(NodePtr<K, V, M>),
        Post: FnMut(NodePtr<K, V, M>),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // Post order traversal is used for node deletion,
                        // so make sure not to use node pointer after postorder call.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().left } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            postorder(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            postorder(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<K: Ord, V, M> Tree<K, V, M> {
    pub(crate) fn find_node(&self, key: &K) -> Link<K, V, M> {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    pub(crate) fn find(&self, key: &K) -> Option<&V> {
        self.find_node(key)
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    pub(crate) fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        self.find_node(key)
            .map(|node_ptr| &mut unsafe { &mut *node_ptr.as_ptr() }.value)
    }

    pub(crate) fn find_slot(&mut self, key: &K) -> Slot<K, V, M> {
        let mut parent: Link<K, V, M> = None;
        let mut link_ptr: LinkPtr<K, V, M> = unsafe { LinkPtr::new_unchecked(&mut self.root) };
        unsafe {
            while let Some(mut node_ptr) = *link_ptr.as_ref() {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => return Slot::Occupied(node_ptr),
                    Ordering::Less => {
                        link_ptr = LinkPtr::new_unchecked(&mut node_ptr.as_mut().left);
                    }
                    Ordering::Greater => {
                        link_ptr = LinkPtr::new_unchecked(&mut node_ptr.as_mut().right);
                    }
                }
                parent = Some(node_ptr);
            }
        }
        Slot::Vacant {
            parent,
            link: link_ptr,
        }
    }

    /// Inserts `key` or overwrites its value in place.
    /// Returns the newly created node, or `None` if the key was already present.
    pub(crate) fn insert_or_update(&mut self, key: K, value: V, meta: M) -> Link<K, V, M> {
        match self.find_slot(&key) {
            Slot::Occupied(mut node_ptr) => {
                unsafe { node_ptr.as_mut().value = value };
                None
            }
            Slot::Vacant { parent, mut link } => {
                let node_ptr = Node::create(parent, key, value, meta);
                unsafe { *link.as_mut() = Some(node_ptr) };
                Some(node_ptr)
            }
        }
    }

    /// Checks parent links and key ordering of the whole tree.
    /// Returns the number of nodes.
    pub(crate) fn validate_links(&self) -> Result<usize, Violation> {
        if let Some(root_ptr) = self.root {
            if unsafe { root_ptr.as_ref().parent.is_some() } {
                return Err(Violation::RootHasParent);
            }
        }

        // Level order only follows child links, so parent links are verified
        // before the traversals below climb along them.
        let mut num_nodes = 0;
        for node in self.level_order() {
            num_nodes += 1;
            for child in [node.left(), node.right()].into_iter().flatten() {
                if child.parent() != Some(node) {
                    return Err(Violation::BrokenParentLink);
                }
            }
        }

        let mut result = Ok(num_nodes);
        let mut previous: Option<NodePtr<K, V, M>> = None;
        self.inorder(|node_ptr| unsafe {
            if let Some(previous_ptr) = previous {
                if previous_ptr.as_ref().key >= node_ptr.as_ref().key {
                    result = Err(Violation::OrderViolation);
                }
            }
            previous = Some(node_ptr);
        });
        result
    }
}

impl<K, V, M> Drop for Tree<K, V, M> {
    fn drop(&mut self) {
        self.clear();
    }
}
