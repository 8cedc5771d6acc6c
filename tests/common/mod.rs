//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{json, Value};
use tempfile::TempDir;

use arbor::domain::{NodeSnapshot, TreeDocument};
use arbor::infrastructure::traits::{
    FileSystem, HttpMethod, HttpRequest, HttpResponse, HttpTransport, RealFileSystem,
    SelectionItem, Selector,
};

pub const BASE_URL: &str = "http://docs.invalid/api/";

/// `{Root: [A: [A1], B]}`
pub fn sample_document() -> TreeDocument {
    TreeDocument::from_snapshots(&[NodeSnapshot::new("Root").with_children(vec![
        NodeSnapshot::new("A").with_children(vec![NodeSnapshot::new("A1")]),
        NodeSnapshot::new("B"),
    ])])
}

pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

#[derive(Default)]
struct Catalog {
    last_id: u64,
    docs: BTreeMap<u64, (String, String)>,
}

/// In-memory stand-in for the XML document service.
///
/// Implements `HttpTransport` directly and exposes `handle` so a real HTTP
/// server can serve the same routes.
pub struct FakeDocumentService {
    catalog: Mutex<Catalog>,
    create_key: &'static str,
    requests: Mutex<Vec<(HttpMethod, String)>>,
}

impl FakeDocumentService {
    pub fn new() -> Self {
        Self::answering_create_with("id")
    }

    /// Older services answer `create_new_xml` with `nextId`.
    pub fn answering_create_with(key: &'static str) -> Self {
        Self {
            catalog: Mutex::new(Catalog::default()),
            create_key: key,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_document(self, name: &str, xml: &str) -> Self {
        {
            let mut catalog = self.catalog.lock().unwrap();
            catalog.last_id += 1;
            let id = catalog.last_id;
            catalog.docs.insert(id, (name.to_string(), xml.to_string()));
        }
        self
    }

    pub fn xml_of(&self, id: u64) -> Option<String> {
        self.catalog.lock().unwrap().docs.get(&id).map(|(_, xml)| xml.clone())
    }

    pub fn name_of(&self, id: u64) -> Option<String> {
        self.catalog.lock().unwrap().docs.get(&id).map(|(name, _)| name.clone())
    }

    pub fn document_count(&self) -> usize {
        self.catalog.lock().unwrap().docs.len()
    }

    pub fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Route one request; `path` is relative to the API base.
    pub fn handle(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> (u16, String) {
        self.requests
            .lock()
            .unwrap()
            .push((method, path.to_string()));
        let mut catalog = self.catalog.lock().unwrap();
        let body_id = body.and_then(|b| b.get("id")).and_then(Value::as_u64);
        let body_str = |key: &str| {
            body.and_then(|b| b.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        match (method, path) {
            (HttpMethod::Get, "get_all_xml_info") => {
                let items: Vec<Value> = catalog
                    .docs
                    .iter()
                    .map(|(id, (name, _))| json!({ "id": id, "name": name }))
                    .collect();
                (200, Value::Array(items).to_string())
            }
            (HttpMethod::Get, p) if p.starts_with("get_xml_by_id/") => {
                match id_suffix(p).and_then(|id| catalog.docs.get(&id)) {
                    Some((_, xml)) => (200, xml.clone()),
                    None => (404, "not found".into()),
                }
            }
            (HttpMethod::Post, "create_new_xml") => {
                let (Some(name), Some(xml)) = (body_str("name"), body_str("xmlData")) else {
                    return (400, "name and xmlData required".into());
                };
                catalog.last_id += 1;
                let id = catalog.last_id;
                catalog.docs.insert(id, (name, xml));
                let mut answer = serde_json::Map::new();
                answer.insert(self.create_key.to_string(), json!(id));
                (201, Value::Object(answer).to_string())
            }
            (HttpMethod::Put, "update_xml_by_id") => {
                let xml = body_str("xmlData");
                match (body_id.and_then(|id| catalog.docs.get_mut(&id)), xml) {
                    (Some(entry), Some(xml)) => {
                        entry.1 = xml;
                        (200, "{}".into())
                    }
                    (None, _) => (404, "not found".into()),
                    (_, None) => (400, "xmlData required".into()),
                }
            }
            (HttpMethod::Put, "update_xml_name_by_id") => {
                let name = body_str("name");
                match (body_id.and_then(|id| catalog.docs.get_mut(&id)), name) {
                    (Some(entry), Some(name)) => {
                        entry.0 = name;
                        (200, "{}".into())
                    }
                    (None, _) => (404, "not found".into()),
                    (_, None) => (400, "name required".into()),
                }
            }
            (HttpMethod::Delete, p) if p.starts_with("delete_xml_by_id/") => {
                match id_suffix(p).and_then(|id| catalog.docs.remove(&id)) {
                    Some(_) => (200, "{}".into()),
                    None => (404, "not found".into()),
                }
            }
            _ => (400, format!("no route for {method} {path}")),
        }
    }
}

fn id_suffix(path: &str) -> Option<u64> {
    path.rsplit('/').next()?.parse().ok()
}

impl HttpTransport for FakeDocumentService {
    fn send(&self, request: &HttpRequest) -> io::Result<HttpResponse> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown host"))?;
        let (status, body) = self.handle(request.method, path, request.body.as_ref());
        Ok(HttpResponse {
            status,
            body: body.into_bytes(),
        })
    }
}

/// Transport that answers every request with a fixed status and body.
pub struct CannedTransport {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpTransport for CannedTransport {
    fn send(&self, _request: &HttpRequest) -> io::Result<HttpResponse> {
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Transport whose every request fails before reaching a server.
pub struct UnreachableTransport;

impl HttpTransport for UnreachableTransport {
    fn send(&self, _request: &HttpRequest) -> io::Result<HttpResponse> {
        Err(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))
    }
}

/// Real filesystem whose atomic writes always fail.
pub struct ReadOnlyFileSystem;

impl FileSystem for ReadOnlyFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        RealFileSystem.read(path)
    }

    fn write_atomic(&self, _path: &Path, _content: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    fn exists(&self, path: &Path) -> bool {
        RealFileSystem.exists(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        RealFileSystem.ensure_parent(path)
    }
}

/// Mock selector that returns a predetermined selection
pub struct MockSelector {
    selection_index: Option<usize>,
}

impl MockSelector {
    pub fn new(selection_index: Option<usize>) -> Self {
        Self { selection_index }
    }
}

impl Selector for MockSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        _prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        match self.selection_index {
            Some(idx) if idx < items.len() => Ok(Some(items[idx].clone())),
            Some(_) => Err("Index out of bounds".to_string()),
            None => Ok(None),
        }
    }
}
