//! XML file backend

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::DocumentStore;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{codec, DocumentHandle, TreeDocument};
use crate::infrastructure::traits::FileSystem;

/// Reads and writes tree documents as local XML files.
pub struct LocalFileStore {
    fs: Arc<dyn FileSystem>,
}

impl LocalFileStore {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load the document stored at `path`.
    ///
    /// Fails with an I/O error if the file cannot be read and with
    /// `MalformedXml` if it does not decode.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<TreeDocument> {
        let bytes = self.fs.read(path).with_path_context("read document", path)?;
        let doc = codec::deserialize_bytes(&bytes)?;
        info!("loaded {} nodes from {}", doc.len(), path.display());
        Ok(doc)
    }

    /// Replace the file at `path` with `doc`.
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// a failed save leaves the previous contents intact.
    #[instrument(level = "debug", skip(self, doc))]
    pub fn save(&self, path: &Path, doc: &TreeDocument) -> ApplicationResult<()> {
        if path.as_os_str().is_empty() {
            return Err(ApplicationError::InvalidHandle {
                store: self.name(),
                handle: "<empty path>".into(),
            });
        }
        let xml = codec::serialize_with_declaration(doc)?;
        debug!("writing {} bytes", xml.len());
        self.fs
            .write_atomic(path, xml.as_bytes())
            .with_path_context("write document", path)?;
        info!("saved {} nodes to {}", doc.len(), path.display());
        Ok(())
    }

    /// Save to a new location, creating missing directories, and return its handle.
    pub fn save_as(&self, path: &Path, doc: &TreeDocument) -> ApplicationResult<DocumentHandle> {
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.save(path, doc)?;
        Ok(DocumentHandle::File(path.to_path_buf()))
    }

    fn path_of<'a>(&self, handle: &'a DocumentHandle) -> ApplicationResult<&'a PathBuf> {
        match handle {
            DocumentHandle::File(path) => Ok(path),
            other => Err(ApplicationError::InvalidHandle {
                store: self.name(),
                handle: other.to_string(),
            }),
        }
    }
}

impl DocumentStore for LocalFileStore {
    fn name(&self) -> &'static str {
        "file store"
    }

    fn load(&self, handle: &DocumentHandle) -> ApplicationResult<TreeDocument> {
        LocalFileStore::load(self, self.path_of(handle)?)
    }

    fn save(&self, handle: &DocumentHandle, doc: &TreeDocument) -> ApplicationResult<()> {
        LocalFileStore::save(self, self.path_of(handle)?, doc)
    }
}
