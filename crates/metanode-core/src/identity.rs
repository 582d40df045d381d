//! Node identity resolution
//!
//! Node references are stored as node ids of the form `name@UUID`. The
//! uuid is the primary key; the name is a fallback for scenes where the
//! uuid changed, e.g. after an import. Legacy ids without a name part still
//! parse.
//!
//! When a scene holds several loaded copies of one reference, every copy
//! carries the same uuids. Lookups then take a reference hint, the owning
//! reference of the node being read, and only accept matches from it.

use crate::error::{HostError, MetadataError};
use crate::host::Host;
use crate::value::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use tracing::{debug, error, warn};

const UUID_PATTERN: &str = "[A-F0-9]{8}-(?:[A-F0-9]{4}-){3}[A-F0-9]{12}";

static UUID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{UUID_PATTERN}$")).expect("valid uuid pattern"));

static NODE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:(?P<name>[\w:|]+)@)?(?P<uuid>{UUID_PATTERN})$"))
        .expect("valid node id pattern")
});

/// Check if `text` is an uppercase host uuid
#[inline]
#[must_use]
pub fn is_uuid(text: &str) -> bool {
    UUID_RE.is_match(text)
}

/// Check if `text` is a node id, `name@UUID` or a bare uuid
#[inline]
#[must_use]
pub fn is_node_id(text: &str) -> bool {
    NODE_ID_RE.is_match(text)
}

/// Parsed node id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    name: Option<String>,
    uuid: String,
}

impl NodeId {
    /// Create node id from a node name and uuid
    #[must_use]
    pub fn new(name: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            uuid: uuid.into(),
        }
    }

    /// Node name, absent for legacy uuid-only ids
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Node uuid
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
}

impl FromStr for NodeId {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = NODE_ID_RE
            .captures(s)
            .ok_or_else(|| MetadataError::InvalidNodeId(s.to_string()))?;
        Ok(Self {
            name: caps.name("name").map(|m| m.as_str().to_string()),
            uuid: caps["uuid"].to_string(),
        })
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}@{}", self.uuid),
            None => f.write_str(&self.uuid),
        }
    }
}

/// Current unique name of a node
pub fn get_unique_node_name<H: Host>(host: &H, node: &H::Handle) -> Option<String> {
    host.node_name(node)
}

/// Node id for a live node, or an empty string if the handle is stale
pub fn get_node_id<H: Host>(host: &H, node: &H::Handle) -> String {
    if !host.is_alive(node) {
        warn!(node = ?node, "cannot build node id for a stale handle");
        return String::new();
    }
    match (host.node_name(node), host.node_uuid(node)) {
        (Some(name), Some(uuid)) => NodeId::new(name, uuid).to_string(),
        _ => {
            warn!(node = ?node, "node has no name or uuid");
            String::new()
        }
    }
}

/// First candidate, or the first owned by `ref_node` when a hint is given
fn pick<H: Host>(
    host: &H,
    candidates: Vec<H::Handle>,
    ref_node: Option<&str>,
) -> Option<H::Handle> {
    match ref_node {
        Some(ref_node) => candidates
            .into_iter()
            .find(|n| host.reference_node(n).as_deref() == Some(ref_node)),
        None => candidates.into_iter().next(),
    }
}

/// Find a node by uuid
pub fn find_node_by_uuid<H: Host>(
    host: &H,
    uuid: &str,
    ref_node: Option<&str>,
) -> Option<H::Handle> {
    pick(host, host.nodes_with_uuid(uuid), ref_node)
}

/// Find a node by name or path
pub fn find_node_by_name<H: Host>(
    host: &H,
    name: &str,
    ref_node: Option<&str>,
) -> Option<H::Handle> {
    pick(host, host.nodes_named(name), ref_node)
}

/// Find the node a node id refers to
///
/// Searches by uuid first, then by name. A node id that resolves to
/// nothing is logged and reported as `Ok(None)`.
///
/// # Errors
/// `MetadataError::InvalidNodeId` if `node_id` is not a node id.
pub fn find_node_by_id<H: Host>(
    host: &H,
    node_id: &str,
    ref_node: Option<&str>,
) -> Result<Option<H::Handle>, MetadataError> {
    let id: NodeId = node_id.parse()?;

    if let Some(node) = find_node_by_uuid(host, id.uuid(), ref_node) {
        return Ok(Some(node));
    }
    if let Some(name) = id.name() {
        if let Some(node) = find_node_by_name(host, name, ref_node) {
            debug!(node_id, "resolved node id by name, uuid has changed");
            return Ok(Some(node));
        }
    }

    error!(node_id, ref_node, "could not find node by id");
    Ok(None)
}

/// Resolve any node reference flavor to a live host handle
///
/// # Errors
/// `HostError::StaleHandle` for a dead raw handle; the host's lookup error
/// when a name does not resolve.
pub fn resolve_node_ref<H: Host>(
    host: &H,
    node: &NodeRef<H::Handle>,
) -> Result<H::Handle, HostError> {
    match node {
        NodeRef::Raw(handle) => resolve_raw(host, handle),
        NodeRef::Live(live) => {
            if host.is_alive(&live.handle) {
                Ok(live.handle.clone())
            } else {
                debug!(name = %live.name, "live handle is stale, resolving by name");
                host.resolve_node(&live.name)
            }
        }
        NodeRef::Name(name) => host.resolve_node(name),
    }
}

fn resolve_raw<H: Host>(host: &H, handle: &H::Handle) -> Result<H::Handle, HostError> {
    if host.is_alive(handle) {
        Ok(handle.clone())
    } else {
        Err(HostError::StaleHandle(format!("{handle:?}")))
    }
}
