//! HTTP+JSON document service backend

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::application::services::DocumentStore;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{codec, DocumentHandle, DocumentId, RemoteEntry, TreeDocument};
use crate::infrastructure::traits::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, SelectionItem, Selector,
};

/// Client for the remote XML document service.
///
/// Every call is a single synchronous request; nothing is cached between calls.
pub struct RemoteDocumentStore {
    base_url: String,
    http: Arc<dyn HttpTransport>,
}

impl RemoteDocumentStore {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpTransport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /get_all_xml_info`
    #[instrument(level = "debug", skip(self))]
    pub fn list(&self) -> ApplicationResult<Vec<RemoteEntry>> {
        let response = self.send(HttpMethod::Get, "get_all_xml_info", None, None)?;
        let entries: Vec<RemoteEntry> = parse_json(&response, "document list")?;
        debug!("service lists {} documents", entries.len());
        Ok(entries)
    }

    /// Look up a catalog entry by id.
    pub fn find(&self, id: DocumentId) -> ApplicationResult<RemoteEntry> {
        self.list()?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or(ApplicationError::DocumentNotFound(id))
    }

    /// `GET /get_xml_by_id/{id}`, decoded into a fresh document.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch(&self, id: DocumentId) -> ApplicationResult<TreeDocument> {
        let response = self.send(
            HttpMethod::Get,
            &format!("get_xml_by_id/{id}"),
            None,
            Some(id),
        )?;
        let doc = codec::deserialize_bytes(&response.body)?;
        info!("fetched document {id} ({} nodes)", doc.len());
        Ok(doc)
    }

    /// `POST /create_new_xml`, returning the id the service assigned.
    #[instrument(level = "debug", skip(self, doc))]
    pub fn create(&self, name: &str, doc: &TreeDocument) -> ApplicationResult<DocumentId> {
        let body = json!({ "name": name, "xmlData": codec::serialize(doc)? });
        let response = self.send(HttpMethod::Post, "create_new_xml", Some(body), None)?;
        let CreatedDocument { id } = parse_json(&response, "create response")?;
        info!("created document {id} named {name:?}");
        Ok(id)
    }

    /// `PUT /update_xml_by_id`: replace the whole XML payload.
    #[instrument(level = "debug", skip(self, doc))]
    pub fn update(&self, id: DocumentId, doc: &TreeDocument) -> ApplicationResult<()> {
        let body = json!({ "id": id, "xmlData": codec::serialize(doc)? });
        self.send(HttpMethod::Put, "update_xml_by_id", Some(body), Some(id))?;
        info!("updated document {id}");
        Ok(())
    }

    /// `PUT /update_xml_name_by_id`
    #[instrument(level = "debug", skip(self))]
    pub fn rename(&self, id: DocumentId, name: &str) -> ApplicationResult<()> {
        let body = json!({ "id": id, "name": name });
        self.send(HttpMethod::Put, "update_xml_name_by_id", Some(body), Some(id))?;
        info!("renamed document {id} to {name:?}");
        Ok(())
    }

    /// `DELETE /delete_xml_by_id/{id}`
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: DocumentId) -> ApplicationResult<()> {
        self.send(
            HttpMethod::Delete,
            &format!("delete_xml_by_id/{id}"),
            None,
            Some(id),
        )?;
        info!("deleted document {id}");
        Ok(())
    }

    /// Create a new remote document and return its handle.
    pub fn save_as(&self, name: &str, doc: &TreeDocument) -> ApplicationResult<DocumentHandle> {
        let id = self.create(name, doc)?;
        Ok(DocumentHandle::Remote {
            id,
            name: name.to_string(),
        })
    }

    /// Let the user pick a catalog entry interactively.
    ///
    /// Returns `None` when the catalog is empty or the user cancels.
    pub fn select(&self, selector: &dyn Selector) -> ApplicationResult<Option<RemoteEntry>> {
        let entries = self.list()?;
        let items: Vec<SelectionItem> = entries
            .iter()
            .map(|entry| SelectionItem {
                display: format!("{:>4}  {}", entry.id, entry.name),
                value: entry.id.to_string(),
            })
            .collect();

        let chosen = selector
            .select_one(&items, "document> ")
            .map_err(|message| ApplicationError::io("interactive selection", message))?;

        Ok(chosen.and_then(|item| {
            entries
                .into_iter()
                .find(|entry| entry.id.to_string() == item.value)
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send one request and map non-2xx statuses to errors.
    ///
    /// A 404 becomes `DocumentNotFound` when the request targets a known id.
    fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        id: Option<DocumentId>,
    ) -> ApplicationResult<HttpResponse> {
        let request = HttpRequest {
            method,
            url: self.url(path),
            body,
        };
        debug!("{} {}", request.method, request.url);

        let response = self
            .http
            .send(&request)
            .map_err(|e| ApplicationError::io(format!("{} {}", request.method, request.url), e))?;

        if response.is_success() {
            return Ok(response);
        }

        warn!(
            "{} {} answered HTTP {}",
            request.method, request.url, response.status
        );
        match (response.status, id) {
            (404, Some(id)) => Err(ApplicationError::DocumentNotFound(id)),
            (status, _) => Err(ApplicationError::ServerRejected {
                status,
                message: String::from_utf8_lossy(&response.body).trim().to_string(),
            }),
        }
    }
}

impl DocumentStore for RemoteDocumentStore {
    fn name(&self) -> &'static str {
        "web service"
    }

    fn load(&self, handle: &DocumentHandle) -> ApplicationResult<TreeDocument> {
        match handle {
            DocumentHandle::Remote { id, .. } => self.fetch(*id),
            other => Err(ApplicationError::InvalidHandle {
                store: self.name(),
                handle: other.to_string(),
            }),
        }
    }

    fn save(&self, handle: &DocumentHandle, doc: &TreeDocument) -> ApplicationResult<()> {
        match handle {
            DocumentHandle::Remote { id, .. } => self.update(*id, doc),
            other => Err(ApplicationError::InvalidHandle {
                store: self.name(),
                handle: other.to_string(),
            }),
        }
    }
}

/// Reply of `create_new_xml`; older services answer with `nextId`.
#[derive(Debug, Deserialize)]
struct CreatedDocument {
    #[serde(alias = "nextId", deserialize_with = "DocumentId::deserialize_lenient")]
    id: DocumentId,
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> ApplicationResult<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| ApplicationError::io(format!("decode {what}"), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_legacy_next_id_key_when_decoding_create_reply_then_accepted() {
        let created: CreatedDocument = serde_json::from_value(json!({ "nextId": "8" })).unwrap();
        assert_eq!(created.id, DocumentId(8));
        assert!(serde_json::from_value::<CreatedDocument>(json!({ "ok": true })).is_err());
    }
}
