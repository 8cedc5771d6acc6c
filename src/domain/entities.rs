//! Domain entities: value types shared by the tree model and the stores

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::domain::error::DomainError;

/// Handle-free value copy of a subtree.
///
/// Two documents are structurally equal when their root snapshots are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub label: String,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NodeSnapshot>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(NodeSnapshot::size).sum::<usize>()
    }
}

/// Server-assigned identifier of a remote document (always >= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(id) if id >= 1 => Ok(Self(id)),
            _ => Err(DomainError::InvalidHandle(format!(
                "document id must be a positive integer: {s:?}"
            ))),
        }
    }
}

impl DocumentId {
    /// Deserialize an id sent as a JSON number or a numeric string.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(id) if id >= 1 => Ok(Self(id)),
            RawId::Number(id) => Err(de::Error::custom(format!(
                "document id must be a positive integer: {id}"
            ))),
            RawId::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// Catalog record of the remote document service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteEntry {
    #[serde(deserialize_with = "DocumentId::deserialize_lenient")]
    pub id: DocumentId,
    #[serde(default)]
    pub name: String,
}

/// Which backend a bare document reference refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Files,
    WebService,
}

impl FromStr for DataSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "files" | "file" => Ok(Self::Files),
            "web_service" | "webservice" | "web-service" | "remote" => Ok(Self::WebService),
            other => Err(DomainError::InvalidHandle(format!(
                "unknown data source: {other}"
            ))),
        }
    }
}

/// Where a document was last loaded from or saved to.
///
/// Held by the caller and passed back into save operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentHandle {
    File(PathBuf),
    Remote { id: DocumentId, name: String },
}

fn remote_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*Id:\s*(\d+)(?:\s+Name:\s?(.*))?$").unwrap())
}

impl DocumentHandle {
    /// Parse a document reference.
    ///
    /// Accepts `Id: 3 Name: notes` and `remote:3` for remote documents. A bare
    /// number is a remote id when `source` is the web service; anything else
    /// is a file path.
    pub fn parse(raw: &str, source: DataSource) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidHandle("empty document reference".into()));
        }

        if let Some(caps) = remote_label_regex().captures(trimmed) {
            let id = caps[1].parse::<DocumentId>()?;
            let name = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            return Ok(Self::Remote { id, name });
        }

        if let Some(id) = trimmed.strip_prefix("remote:") {
            return Ok(Self::Remote {
                id: id.parse()?,
                name: String::new(),
            });
        }

        if source == DataSource::WebService && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self::Remote {
                id: trimmed.parse()?,
                name: String::new(),
            });
        }

        Ok(Self::File(PathBuf::from(trimmed)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote { id, name } => write!(f, "Id: {id} Name: {name}"),
        }
    }
}
