//! Positional node addresses.
//!
//! Handles never leave the process, so a front end that is not holding live
//! handles names nodes by their sibling indices from the roots down:
//! `0/2/1` is the second child of the third child of the first root.

use std::fmt;
use std::str::FromStr;

use crate::domain::arena::{NodeHandle, TreeDocument};
use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// The empty path, addressing the document root level.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Resolve to a node; the root path does not name a node.
    pub fn resolve(&self, doc: &TreeDocument) -> DomainResult<NodeHandle> {
        self.resolve_parent(doc)?
            .ok_or_else(|| DomainError::InvalidPath("the root path does not name a node".into()))
    }

    /// Resolve to a parent reference, `None` for the root path.
    pub fn resolve_parent(&self, doc: &TreeDocument) -> DomainResult<Option<NodeHandle>> {
        let mut current: Option<NodeHandle> = None;
        for (depth, &index) in self.0.iter().enumerate() {
            let children = doc.children(current)?;
            let next = children.get(index).copied().ok_or_else(|| {
                DomainError::InvalidPath(format!(
                    "{self}: no child {index} at depth {depth} ({} available)",
                    children.len()
                ))
            })?;
            current = Some(next);
        }
        Ok(current)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        f.write_str(&parts.join("/"))
    }
}

impl FromStr for NodePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        trimmed
            .split('/')
            .map(|part| {
                part.trim()
                    .parse::<usize>()
                    .map_err(|_| DomainError::InvalidPath(format!("{s}: {part:?} is not an index")))
            })
            .collect::<DomainResult<Vec<_>>>()
            .map(Self)
    }
}

impl TreeDocument {
    /// Positional address of a live node.
    pub fn path_of(&self, handle: NodeHandle) -> DomainResult<NodePath> {
        let mut indices = Vec::new();
        let mut current = Some(handle);
        while let Some(h) = current {
            indices.push(self.index_of(h)?);
            current = self.parent(h)?;
        }
        indices.reverse();
        Ok(NodePath(indices))
    }
}
