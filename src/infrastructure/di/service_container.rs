//! Service container for dependency injection
//!
//! Wires the document stores to their I/O dependencies.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{DocumentStore, LocalFileStore, RemoteDocumentStore};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::DocumentHandle;
use crate::infrastructure::traits::{
    FileSystem, HttpTransport, RealFileSystem, ReqwestTransport, Selector, SkimSelector,
};

/// Container holding the I/O implementations shared by all stores.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// HTTP transport for the document service
    pub http: Arc<dyn HttpTransport>,

    /// Interactive picker
    pub selector: Arc<dyn Selector>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        let timeout = settings.request_timeout_secs.map(Duration::from_secs);
        let http = ReqwestTransport::new(timeout)
            .map_err(|e| ApplicationError::io("create HTTP client", e))?;
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(http),
            Arc::new(SkimSelector),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        http: Arc<dyn HttpTransport>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
            http,
            selector,
        }
    }

    pub fn local_store(&self) -> LocalFileStore {
        LocalFileStore::new(Arc::clone(&self.fs))
    }

    pub fn remote_store(&self) -> RemoteDocumentStore {
        RemoteDocumentStore::new(self.settings.webservice_url.clone(), Arc::clone(&self.http))
    }

    /// Store able to load and save `handle`.
    pub fn store_for(&self, handle: &DocumentHandle) -> Box<dyn DocumentStore> {
        match handle {
            DocumentHandle::File(_) => Box::new(self.local_store()),
            DocumentHandle::Remote { .. } => Box::new(self.remote_store()),
        }
    }
}
