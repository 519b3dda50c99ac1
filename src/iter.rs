use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::node::{Link, Node, NodePtr, NodeRef};

/// A breadth-first iterator over the nodes of a tree.
///
/// Starts at the root as it is when the iterator is created and visits all
/// nodes of depth `d` before any node of depth `d + 1`, left before right.
/// Nodes are read live from the tree, not from a snapshot. The iterator
/// borrows the tree, which rules out mutation while it is alive.
pub struct LevelOrder<'a, K, V, M> {
    queue: VecDeque<NodePtr<K, V, M>>,
    marker: PhantomData<&'a Node<K, V, M>>,
}

impl<'a, K, V, M> LevelOrder<'a, K, V, M> {
    pub(crate) fn new(root: Link<K, V, M>) -> Self {
        Self {
            queue: root.into_iter().collect(),
            marker: PhantomData,
        }
    }
}

impl<'a, K, V, M> Iterator for LevelOrder<'a, K, V, M> {
    type Item = NodeRef<'a, K, V, M>;

    fn next(&mut self) -> Option<Self::Item> {
        let node_ptr = self.queue.pop_front()?;
        let node = unsafe { node_ptr.as_ref() };
        self.queue.extend(node.left);
        self.queue.extend(node.right);
        Some(NodeRef::new(node_ptr))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), None)
    }
}

impl<'a, K, V, M> FusedIterator for LevelOrder<'a, K, V, M> {}

impl<'a, K, V, M> Clone for LevelOrder<'a, K, V, M> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            marker: PhantomData,
        }
    }
}

/// Lists the nodes still waiting in the queue.
impl<'a, K, V, M> fmt::Debug for LevelOrder<'a, K, V, M>
where
    K: fmt::Debug,
    V: fmt::Debug,
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending: Vec<NodeRef<'a, K, V, M>> =
            self.queue.iter().map(|node_ptr| NodeRef::new(*node_ptr)).collect();
        f.debug_tuple("LevelOrder").field(&pending).finish()
    }
}
