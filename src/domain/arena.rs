use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

use crate::domain::entities::NodeSnapshot;
use crate::domain::error::{DomainError, DomainResult};

/// Opaque, process-local node identifier.
///
/// Backed by a generational arena index: a handle of a deleted node never
/// resolves again, even when its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(Index);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{slot}.{generation}")
    }
}

/// Labeled node in the arena-based tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    label: String,
    /// None for root nodes
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl TreeNode {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }
}

/// Ordered forest of labeled nodes; the canonical document model.
///
/// Every node lives in one generational arena and is owned either by its
/// parent's child list or by the document's root list. Sibling order is
/// preserved by every mutation.
#[derive(Debug, Clone)]
pub struct TreeDocument {
    arena: Arena<TreeNode>,
    roots: Vec<NodeHandle>,
}

impl Default for TreeDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: labels and order, never handles.
impl PartialEq for TreeDocument {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl Eq for TreeDocument {}

impl TreeDocument {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Build a document from handle-free subtree values.
    pub fn from_snapshots(snapshots: &[NodeSnapshot]) -> Self {
        let mut doc = Self::new();
        for snapshot in snapshots {
            doc.insert_snapshot(None, snapshot);
        }
        doc
    }

    fn insert_snapshot(&mut self, parent: Option<NodeHandle>, snapshot: &NodeSnapshot) {
        let handle = self.alloc(snapshot.label.clone(), parent, usize::MAX);
        for child in &snapshot.children {
            self.insert_snapshot(Some(handle), child);
        }
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.arena.contains(handle.0)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&TreeNode> {
        self.arena.get(handle.0)
    }

    fn get(&self, handle: NodeHandle) -> DomainResult<&TreeNode> {
        self.node(handle).ok_or(DomainError::NodeNotFound(handle))
    }

    fn get_mut(&mut self, handle: NodeHandle) -> DomainResult<&mut TreeNode> {
        self.arena
            .get_mut(handle.0)
            .ok_or(DomainError::NodeNotFound(handle))
    }

    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    pub fn label(&self, handle: NodeHandle) -> DomainResult<&str> {
        self.get(handle).map(TreeNode::label)
    }

    pub fn parent(&self, handle: NodeHandle) -> DomainResult<Option<NodeHandle>> {
        self.get(handle).map(TreeNode::parent)
    }

    /// Ordered children of `parent`; `None` enumerates the roots.
    pub fn children(&self, parent: Option<NodeHandle>) -> DomainResult<&[NodeHandle]> {
        match parent {
            None => Ok(&self.roots),
            Some(handle) => self.get(handle).map(TreeNode::children),
        }
    }

    /// Position of `handle` among its siblings.
    pub fn index_of(&self, handle: NodeHandle) -> DomainResult<usize> {
        let parent = self.parent(handle)?;
        self.siblings(parent)
            .iter()
            .position(|&h| h == handle)
            .ok_or(DomainError::NodeNotFound(handle))
    }

    /// True if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.node(node).and_then(TreeNode::parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.node(handle).and_then(TreeNode::parent);
        }
        false
    }

    #[instrument(level = "trace", skip(self, label))]
    pub fn create_node(
        &mut self,
        parent: Option<NodeHandle>,
        label: impl Into<String>,
        index: Option<usize>,
    ) -> DomainResult<NodeHandle> {
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(DomainError::InvalidParent(p));
            }
        }
        Ok(self.alloc(label.into(), parent, index.unwrap_or(usize::MAX)))
    }

    /// Removes the node and its entire subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn delete_node(&mut self, handle: NodeHandle) -> DomainResult<()> {
        self.detach(handle)?;
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    #[instrument(level = "trace", skip(self, label))]
    pub fn rename_node(&mut self, handle: NodeHandle, label: impl Into<String>) -> DomainResult<()> {
        self.get_mut(handle)?.label = label.into();
        Ok(())
    }

    /// Re-parents `handle` under `new_parent` at `index`.
    ///
    /// `index` counts siblings after the node has been detached; an index past
    /// the end appends. Handles inside the moved subtree are preserved.
    #[instrument(level = "trace", skip(self))]
    pub fn move_node(
        &mut self,
        handle: NodeHandle,
        new_parent: Option<NodeHandle>,
        index: usize,
    ) -> DomainResult<()> {
        self.get(handle)?;
        if let Some(p) = new_parent {
            if !self.contains(p) {
                return Err(DomainError::InvalidParent(p));
            }
            if p == handle || self.is_ancestor(handle, p) {
                return Err(DomainError::CyclicMove {
                    node: handle,
                    target: p,
                });
            }
        }
        self.detach(handle)?;
        self.attach(handle, new_parent, index);
        Ok(())
    }

    /// Removes every node.
    ///
    /// `Arena::clear` resets slot generations, so nodes are removed one by one
    /// to keep old handles dead.
    pub fn clear(&mut self) {
        let handles: Vec<NodeHandle> = self.arena.iter().map(|(idx, _)| NodeHandle(idx)).collect();
        for handle in handles {
            self.arena.remove(handle.0);
        }
        self.roots.clear();
    }

    /// Number of nodes in the subtree rooted at `handle`.
    pub fn subtree_size(&self, handle: NodeHandle) -> DomainResult<usize> {
        self.get(handle)?;
        let mut count = 0;
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node(current) {
                count += 1;
                stack.extend(node.children.iter().copied());
            }
        }
        Ok(count)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, handle: NodeHandle) -> usize {
        if let Some(node) = self.node(handle) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Handle-free copy of the whole document.
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.roots
            .iter()
            .filter_map(|&root| self.snapshot_of(root).ok())
            .collect()
    }

    pub fn snapshot_of(&self, handle: NodeHandle) -> DomainResult<NodeSnapshot> {
        let node = self.get(handle)?;
        Ok(NodeSnapshot {
            label: node.label.clone(),
            children: node
                .children
                .iter()
                .map(|&child| self.snapshot_of(child))
                .collect::<DomainResult<_>>()?,
        })
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    fn siblings(&self, parent: Option<NodeHandle>) -> &[NodeHandle] {
        match parent {
            None => &self.roots,
            Some(p) => self.node(p).map(TreeNode::children).unwrap_or(&[]),
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeHandle>) -> Option<&mut Vec<NodeHandle>> {
        match parent {
            None => Some(&mut self.roots),
            Some(p) => self.arena.get_mut(p.0).map(|node| &mut node.children),
        }
    }

    fn alloc(&mut self, label: String, parent: Option<NodeHandle>, index: usize) -> NodeHandle {
        let handle = NodeHandle(self.arena.insert(TreeNode {
            label,
            parent,
            children: Vec::new(),
        }));
        self.attach(handle, parent, index);
        handle
    }

    /// Unlinks `handle` from its parent's child list; the subtree stays in the arena.
    pub(crate) fn detach(&mut self, handle: NodeHandle) -> DomainResult<()> {
        let parent = self.parent(handle)?;
        if let Some(siblings) = self.siblings_mut(parent) {
            siblings.retain(|&h| h != handle);
        }
        self.get_mut(handle)?.parent = None;
        Ok(())
    }

    /// Links a detached `handle` under `parent` at `index` (clamped to the end).
    pub(crate) fn attach(&mut self, handle: NodeHandle, parent: Option<NodeHandle>, index: usize) {
        if let Some(siblings) = self.siblings_mut(parent) {
            let index = index.min(siblings.len());
            siblings.insert(index, handle);
        }
        if let Some(node) = self.arena.get_mut(handle.0) {
            node.parent = parent;
        }
    }
}

/// Pre-order traversal over all roots, left to right.
pub struct TreeIterator<'a> {
    doc: &'a TreeDocument,
    stack: Vec<NodeHandle>,
}

impl<'a> TreeIterator<'a> {
    fn new(doc: &'a TreeDocument) -> Self {
        let stack = doc.roots.iter().rev().copied().collect();
        Self { doc, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeHandle, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.doc.node(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    doc: &'a TreeDocument,
    stack: Vec<(NodeHandle, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(doc: &'a TreeDocument) -> Self {
        let stack = doc.roots.iter().rev().map(|&h| (h, false)).collect();
        Self { doc, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeHandle, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.doc.node(current) {
                if !visited {
                    self.stack.push((current, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current, node));
                }
            }
        }
        None
    }
}
