//! Domain layer: tree model, relocation and XML codec
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod codec;
pub mod entities;
pub mod error;
pub mod path;
pub mod relocate;

pub use arena::{NodeHandle, TreeDocument, TreeNode};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use path::NodePath;
pub use relocate::DropPosition;
