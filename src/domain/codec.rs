//! XML codec for tree documents.
//!
//! Wire format shared by local files and the web service:
//!
//! ```xml
//! <TreeView>
//!   <Node Text="label"><Node Text="child label"/></Node>
//! </TreeView>
//! ```
//!
//! Node identity is positional. Unknown elements and attributes are skipped
//! when reading; a `Node` without `Text` gets an empty label.

use std::borrow::Cow;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use tracing::{instrument, trace};

use crate::domain::arena::{NodeHandle, TreeDocument};
use crate::domain::error::{DomainError, DomainResult};

pub const ROOT_ELEMENT: &str = "TreeView";
pub const NODE_ELEMENT: &str = "Node";
pub const LABEL_ATTRIBUTE: &str = "Text";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize without an XML declaration (web-service payload form).
pub fn serialize(doc: &TreeDocument) -> DomainResult<String> {
    write_document(doc, false)
}

/// Serialize with a leading `<?xml ...?>` declaration (file form).
pub fn serialize_with_declaration(doc: &TreeDocument) -> DomainResult<String> {
    write_document(doc, true)
}

enum Step {
    Open(NodeHandle),
    Close,
}

#[instrument(level = "trace", skip(doc))]
fn write_document(doc: &TreeDocument, declaration: bool) -> DomainResult<String> {
    let mut writer = Writer::new(Vec::new());
    if declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_err)?;
    }
    writer
        .write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))
        .map_err(write_err)?;

    // explicit stack: nesting depth is unbounded
    let mut stack: Vec<Step> = doc.roots().iter().rev().map(|&h| Step::Open(h)).collect();
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(handle) => {
                let node = doc.node(handle).ok_or(DomainError::NodeNotFound(handle))?;
                let mut start = BytesStart::new(NODE_ELEMENT);
                start.push_attribute(label_attribute(node.label()));
                if node.children().is_empty() {
                    writer.write_event(Event::Empty(start)).map_err(write_err)?;
                } else {
                    writer.write_event(Event::Start(start)).map_err(write_err)?;
                    stack.push(Step::Close);
                    stack.extend(node.children().iter().rev().map(|&c| Step::Open(c)));
                }
            }
            Step::Close => {
                writer
                    .write_event(Event::End(BytesEnd::new(NODE_ELEMENT)))
                    .map_err(write_err)?;
            }
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
        .map_err(write_err)?;
    String::from_utf8(writer.into_inner()).map_err(write_err)
}

/// `Text="..."` with markup escaped and line breaks/tabs as character
/// references, so readers that normalize attribute whitespace keep them.
fn label_attribute(label: &str) -> Attribute<'static> {
    let mut value = String::with_capacity(label.len());
    for c in quick_xml::escape::escape(label).chars() {
        match c {
            '\n' => value.push_str("&#10;"),
            '\r' => value.push_str("&#13;"),
            '\t' => value.push_str("&#9;"),
            _ => value.push(c),
        }
    }
    Attribute {
        key: QName(LABEL_ATTRIBUTE.as_bytes()),
        value: Cow::Owned(value.into_bytes()),
    }
}

fn write_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::malformed(format!("cannot write document: {e}"))
}

/// Decode raw bytes (UTF-8, optional BOM) and parse.
pub fn deserialize_bytes(bytes: &[u8]) -> DomainResult<TreeDocument> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DomainError::malformed(format!("invalid UTF-8: {e}")))?;
    deserialize(text)
}

enum Frame {
    /// Root container (`None`) or a `Node` element whose children become child nodes
    Container(Option<NodeHandle>),
    /// Unknown element: everything below it is skipped
    Ignored,
}

/// Parse XML text into a fresh document.
///
/// The root element's name is not checked; only its direct `Node` children
/// (and theirs, recursively) become nodes.
#[instrument(level = "trace", skip(text), fields(len = text.len()))]
pub fn deserialize(text: &str) -> DomainResult<TreeDocument> {
    let mut reader = Reader::from_str(text);
    let mut doc = TreeDocument::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            DomainError::malformed(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(e) => {
                let frame = open_element(&mut doc, &stack, &e, &mut seen_root)?;
                stack.push(frame);
            }
            Event::Empty(e) => {
                open_element(&mut doc, &stack, &e, &mut seen_root)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DomainError::malformed(format!(
            "unexpected end of document: {} unclosed element(s)",
            stack.len()
        )));
    }
    if !seen_root {
        return Err(DomainError::malformed("document has no root element"));
    }
    trace!("decoded {} nodes", doc.len());
    Ok(doc)
}

fn open_element(
    doc: &mut TreeDocument,
    stack: &[Frame],
    element: &BytesStart<'_>,
    seen_root: &mut bool,
) -> DomainResult<Frame> {
    match stack.last() {
        None => {
            if *seen_root {
                return Err(DomainError::malformed("more than one root element"));
            }
            *seen_root = true;
            Ok(Frame::Container(None))
        }
        Some(Frame::Container(parent)) if element.name().as_ref() == NODE_ELEMENT.as_bytes() => {
            let label = read_label(element)?;
            let handle = doc.create_node(*parent, label, None)?;
            Ok(Frame::Container(Some(handle)))
        }
        Some(_) => Ok(Frame::Ignored),
    }
}

fn read_label(element: &BytesStart<'_>) -> DomainResult<String> {
    let attr = element
        .try_get_attribute(LABEL_ATTRIBUTE)
        .map_err(|e| DomainError::malformed(format!("bad attribute: {e}")))?;
    match attr {
        Some(attr) => attr
            .unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| DomainError::malformed(format!("bad {LABEL_ATTRIBUTE} value: {e}"))),
        None => Ok(String::new()),
    }
}
