//! Document stores
//!
//! Concrete stores that persist tree documents through the XML codec.
//! Stores depend on I/O boundary traits (FileSystem, HttpTransport)
//! but are themselves concrete structs.

mod local_store;
mod remote_store;

pub use local_store::LocalFileStore;
pub use remote_store::RemoteDocumentStore;

use crate::application::ApplicationResult;
use crate::domain::{DocumentHandle, TreeDocument};

/// Common load/save seam of the persistence backends.
///
/// The caller keeps the `DocumentHandle`; a store only knows how to reach it.
pub trait DocumentStore {
    /// Short backend name for messages.
    fn name(&self) -> &'static str;

    /// Load a fresh document. On failure the caller's document is untouched.
    fn load(&self, handle: &DocumentHandle) -> ApplicationResult<TreeDocument>;

    /// Persist `doc` as a whole at `handle`.
    fn save(&self, handle: &DocumentHandle, doc: &TreeDocument) -> ApplicationResult<()>;
}
