//! The shared node arena behind every tree topology.
//!
//! A [`Tree`] owns all of its nodes in a slot arena. Nodes refer to their
//! parent and children through [`NodeId`] handles, so there are no owning
//! back-references and no reference cycles. The topology of each node is
//! described by its [`Partition`]; code that is shared between topologies
//! works on the arena, topology-specific code matches on the partition.
//!
//! # Payloads
//!
//! Each node owns at most one payload of the caller-chosen type `P`. There
//! is no teardown callback: a payload is dropped when it is replaced, when
//! its node is removed, or when the tree is dropped. Removal and tree drop
//! release nodes children-first, so every payload is dropped exactly once
//! and after the payloads of its descendants.
//!
//! # Concurrency
//!
//! Queries take `&self` and mutation takes `&mut self`, so a tree shared
//! between threads (it is `Sync` whenever `P` is) can be read concurrently
//! but never modified while it is being read.

mod partition;
mod query;
mod visitor;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

pub use partition::{Partition, TreeKind};
pub use visitor::{CollectingVisitor, FnVisitor, LeafVisitor};

use crate::error::TreeError;

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(1);

/// Handle to a node inside one specific [`Tree`].
///
/// Handles are cheap to copy. A handle stays valid until the node is removed;
/// after that, and in any other tree, operations taking it return a
/// [`TreeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    tree: u32,
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index inside the owning tree's arena.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{} (tree {})", self.index, self.generation, self.tree)
    }
}

/// A node of a [`Tree`].
#[derive(Debug, Clone)]
pub struct Node<P> {
    partition: Partition,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    payload: Option<P>,
}

impl<P> Node<P> {
    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[inline]
    pub fn kind(&self) -> TreeKind {
        self.partition.kind()
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Leaves are the base case of every query recursion.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }
}

#[derive(Debug, Clone)]
struct Slot<P> {
    generation: u32,
    node: Option<Node<P>>,
}

/// A spatial partition tree whose nodes carry payloads of type `P`.
#[derive(Debug)]
pub struct Tree<P> {
    id: u32,
    slots: Vec<Slot<P>>,
    free: Vec<u32>,
    root: NodeId,
    len: usize,
}

impl<P> Tree<P> {
    /// Creates a tree consisting of a single root node.
    pub fn new(partition: Partition) -> Self {
        let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
        let root = NodeId {
            tree: id,
            index: 0,
            generation: 0,
        };
        Self {
            id,
            slots: vec![Slot {
                generation: 0,
                node: Some(Node {
                    partition,
                    parent: None,
                    children: Vec::new(),
                    payload: None,
                }),
            }],
            free: Vec::new(),
            root,
            len: 1,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> Result<TreeKind, TreeError> {
        Ok(self.node(id)?.kind())
    }

    /// Number of live nodes, including the root.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.len
    }

    /// Returns `true` if `id` addresses a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_ok()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node<P>, TreeError> {
        let index = self.resolve(id)?;
        self.slots[index].node.as_ref().ok_or(TreeError::StaleNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        Ok(&self.node(id)?.children)
    }

    pub fn is_leaf(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.node(id)?.is_leaf())
    }

    pub fn partition(&self, id: NodeId) -> Result<&Partition, TreeError> {
        Ok(&self.node(id)?.partition)
    }

    /// Mutable access to a node's split parameters.
    ///
    /// Children already created keep the cells they were created with.
    pub fn partition_mut(&mut self, id: NodeId) -> Result<&mut Partition, TreeError> {
        Ok(&mut self.node_mut(id)?.partition)
    }

    /// Walks parent links up to the root. O(depth).
    pub fn root_of(&self, id: NodeId) -> Result<NodeId, TreeError> {
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    /// Number of parent hops to the root; the root has level 0. O(depth).
    pub fn level(&self, id: NodeId) -> Result<usize, TreeError> {
        let mut level = 0;
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            current = self.node(parent)?;
            level += 1;
        }
        Ok(level)
    }

    /// Largest level of any node (0 for a lone root).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((id, level)) = stack.pop() {
            depth = depth.max(level);
            if let Ok(node) = self.node(id) {
                stack.extend(node.children.iter().map(|c| (*c, level + 1)));
            }
        }
        depth
    }

    /// Creates the fixed-arity child set of `id`.
    ///
    /// The children's cells are derived from the node's partition (see
    /// [`Partition::subdivide`]). Does nothing if the node already has
    /// children or its topology has no fixed arity.
    pub fn add_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node(id)?;
        if !node.children.is_empty() {
            return Ok(());
        }
        let cells = node.partition.subdivide();
        let children: Vec<NodeId> = cells
            .into_iter()
            .map(|partition| self.allocate(partition, id))
            .collect();
        self.node_mut(id)?.children = children;
        Ok(())
    }

    /// Appends one child with an explicit partition (variable-arity trees).
    pub fn add_child(&mut self, id: NodeId, partition: Partition) -> Result<NodeId, TreeError> {
        self.resolve(id)?;
        let child = self.allocate(partition, id);
        self.node_mut(id)?.children.push(child);
        Ok(child)
    }

    /// Drops every descendant of `id`, children before parents.
    /// Does nothing if the node is a leaf.
    pub fn remove_children(&mut self, id: NodeId) -> Result<(), TreeError> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            self.release_subtree(child);
        }
        Ok(())
    }

    /// Moves `id` and its subtree below `parent`, as its last child.
    ///
    /// Meant for variable-arity trees: a fixed-arity parent would lose its
    /// child order. Fails for the root and for a `parent` inside the
    /// subtree of `id`.
    pub fn reparent(&mut self, id: NodeId, parent: NodeId) -> Result<(), TreeError> {
        self.resolve(parent)?;
        let Some(old) = self.node(id)?.parent else {
            return Err(TreeError::InvalidMove(id));
        };
        let mut current = Some(parent);
        while let Some(ancestor) = current {
            if ancestor == id {
                return Err(TreeError::InvalidMove(id));
            }
            current = self.node(ancestor)?.parent;
        }
        if old == parent {
            return Ok(());
        }

        self.node_mut(old)?.children.retain(|child| *child != id);
        self.node_mut(parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(parent);
        Ok(())
    }

    /// Installs a payload, dropping any previous one.
    pub fn set_payload(&mut self, id: NodeId, payload: P) -> Result<(), TreeError> {
        self.node_mut(id)?.payload = Some(payload);
        Ok(())
    }

    pub fn take_payload(&mut self, id: NodeId) -> Result<Option<P>, TreeError> {
        Ok(self.node_mut(id)?.payload.take())
    }

    pub fn payload(&self, id: NodeId) -> Result<Option<&P>, TreeError> {
        Ok(self.node(id)?.payload.as_ref())
    }

    pub fn payload_mut(&mut self, id: NodeId) -> Result<Option<&mut P>, TreeError> {
        Ok(self.node_mut(id)?.payload.as_mut())
    }

    /// Iterates over all live nodes in pre-order (parents before children).
    pub fn iter(&self) -> PreOrder<'_, P> {
        PreOrder {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Iterates over all leaves in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter(|id| self.node(*id).is_ok_and(Node::is_leaf))
    }

    fn resolve(&self, id: NodeId) -> Result<usize, TreeError> {
        if id.tree != self.id {
            return Err(TreeError::ForeignNode(id));
        }
        match self.slots.get(id.index()) {
            Some(slot) if slot.generation == id.generation && slot.node.is_some() => Ok(id.index()),
            _ => Err(TreeError::StaleNode(id)),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<P>, TreeError> {
        let index = self.resolve(id)?;
        self.slots[index].node.as_mut().ok_or(TreeError::StaleNode(id))
    }

    fn allocate(&mut self, partition: Partition, parent: NodeId) -> NodeId {
        let node = Node {
            partition,
            parent: Some(parent),
            children: Vec::new(),
            payload: None,
        };
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                tree: self.id,
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                tree: self.id,
                index,
                generation: 0,
            }
        }
    }

    /// Releases `id` and all of its descendants, children first.
    fn release_subtree(&mut self, id: NodeId) {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Ok(node) = self.node(current) {
                stack.extend(node.children.iter().copied());
                order.push(current);
            }
        }
        // Every node is pushed after its parent, so the reverse visits
        // children before their parents.
        for current in order.into_iter().rev() {
            let slot = &mut self.slots[current.index()];
            drop(slot.node.take());
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
            self.len -= 1;
        }
    }
}

impl<P> Drop for Tree<P> {
    fn drop(&mut self) {
        let root = self.root;
        self.release_subtree(root);
    }
}

/// Pre-order iterator over the live nodes of a [`Tree`].
#[derive(Debug)]
pub struct PreOrder<'a, P> {
    tree: &'a Tree<P>,
    stack: Vec<NodeId>,
}

impl<P> Iterator for PreOrder<'_, P> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Ok(node) = self.tree.node(id) {
            self.stack.extend(node.children.iter().rev().copied());
        }
        Some(id)
    }
}
