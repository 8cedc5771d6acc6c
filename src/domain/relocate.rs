//! Subtree relocation (the model side of drag-and-drop).
//!
//! A relocation detaches a node together with its descendants and re-attaches
//! it next to, or below, a target node. Handles survive the move: the moved
//! nodes keep their identity and only their parent links change.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::domain::arena::{NodeHandle, TreeDocument};
use crate::domain::error::{DomainError, DomainResult};

/// Where a relocated subtree lands relative to the target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Sibling immediately preceding the target
    Before,
    /// Sibling immediately following the target
    After,
    /// Last child of the target
    Child,
}

impl DropPosition {
    /// Map a drop point inside the target row to a position.
    ///
    /// Upper third drops before, lower third after, the middle makes a child.
    pub fn from_offset(y_in_target: f64, target_height: f64) -> Self {
        if y_in_target < target_height * 0.33 {
            Self::Before
        } else if y_in_target > target_height * 0.66 {
            Self::After
        } else {
            Self::Child
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Child => "child",
        };
        f.write_str(s)
    }
}

impl FromStr for DropPosition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "child" => Ok(Self::Child),
            other => Err(DomainError::InvalidPath(format!(
                "unknown drop position: {other}"
            ))),
        }
    }
}

impl TreeDocument {
    /// Move `source` and its subtree to `position` relative to `target`.
    ///
    /// Fails with `CyclicMove` when `target` is `source` or lies inside its
    /// subtree; the document is left untouched in that case.
    #[instrument(level = "debug", skip(self))]
    pub fn relocate(
        &mut self,
        source: NodeHandle,
        target: NodeHandle,
        position: DropPosition,
    ) -> DomainResult<()> {
        if !self.contains(source) {
            return Err(DomainError::NodeNotFound(source));
        }
        if !self.contains(target) {
            return Err(DomainError::NodeNotFound(target));
        }
        if source == target || self.is_ancestor(source, target) {
            return Err(DomainError::CyclicMove {
                node: source,
                target,
            });
        }

        match position {
            DropPosition::Child => self.move_node(source, Some(target), usize::MAX)?,
            DropPosition::Before | DropPosition::After => {
                let parent = self.parent(target)?;
                self.detach(source)?;
                // target's index is only stable once source is out of the list
                let index = self.index_of(target)?;
                let index = match position {
                    DropPosition::After => index + 1,
                    _ => index,
                };
                self.attach(source, parent, index);
            }
        }
        debug!("relocated {} {} {}", source, position, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_drop_offsets_when_mapping_then_uses_thirds() {
        assert_eq!(DropPosition::from_offset(2.0, 21.0), DropPosition::Before);
        assert_eq!(DropPosition::from_offset(10.0, 21.0), DropPosition::Child);
        assert_eq!(DropPosition::from_offset(20.0, 21.0), DropPosition::After);
    }

    #[test]
    fn given_position_names_when_parsing_then_round_trips() {
        for position in [DropPosition::Before, DropPosition::After, DropPosition::Child] {
            assert_eq!(position.to_string().parse::<DropPosition>().unwrap(), position);
        }
        assert!("inside".parse::<DropPosition>().is_err());
    }

    #[test]
    fn given_earlier_sibling_when_dropping_after_later_sibling_then_lands_after_it() {
        let mut doc = TreeDocument::new();
        let a = doc.create_node(None, "a", None).unwrap();
        let b = doc.create_node(None, "b", None).unwrap();
        let c = doc.create_node(None, "c", None).unwrap();

        doc.relocate(a, b, DropPosition::After).unwrap();

        assert_eq!(doc.roots(), &[b, a, c]);
    }
}
