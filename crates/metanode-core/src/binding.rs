//! Node bindings
//!
//! A binding decides how node references cross the encoder: which strings
//! are node references, how a node becomes a node id, and what a decoded
//! node id turns into. The encoder is written once against [`NodeBinding`];
//! [`Binding`] picks an implementation from configuration.

use crate::error::MetadataResult;
use crate::host::Host;
use crate::identity::{find_node_by_id, get_node_id, is_node_id, resolve_node_ref};
use crate::value::{LiveNode, NodeRef};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Node reference strategy used by the encoder
pub trait NodeBinding<H: Host> {
    /// Check if a stored string is a node reference
    fn is_node_reference(&self, text: &str) -> bool {
        is_node_id(text)
    }

    /// Node id for a reference; empty if the node cannot be resolved
    fn node_to_id(&self, host: &H, node: &NodeRef<H::Handle>) -> String {
        match resolve_node_ref(host, node) {
            Ok(handle) => get_node_id(host, &handle),
            Err(e) => {
                warn!(error = %e, "node reference does not resolve, storing empty id");
                String::new()
            }
        }
    }

    /// Node for a stored node id, `None` if it no longer resolves
    ///
    /// # Errors
    /// `InvalidNodeId` if `node_id` is not a node id.
    fn id_to_node(
        &self,
        host: &H,
        node_id: &str,
        ref_node: Option<&str>,
    ) -> MetadataResult<Option<NodeRef<H::Handle>>>;
}

/// Decodes node ids to live handles
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleBinding;

impl<H: Host> NodeBinding<H> for HandleBinding {
    fn id_to_node(
        &self,
        host: &H,
        node_id: &str,
        ref_node: Option<&str>,
    ) -> MetadataResult<Option<NodeRef<H::Handle>>> {
        Ok(find_node_by_id(host, node_id, ref_node)?.map(|handle| {
            let name = host.node_name(&handle).unwrap_or_default();
            NodeRef::Live(LiveNode::new(handle, name))
        }))
    }
}

/// Decodes node ids to unique node names
#[derive(Debug, Clone, Copy, Default)]
pub struct NameBinding;

impl<H: Host> NodeBinding<H> for NameBinding {
    fn id_to_node(
        &self,
        host: &H,
        node_id: &str,
        ref_node: Option<&str>,
    ) -> MetadataResult<Option<NodeRef<H::Handle>>> {
        Ok(find_node_by_id(host, node_id, ref_node)?
            .and_then(|handle| host.node_name(&handle))
            .map(NodeRef::Name))
    }
}

/// Binding selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Node references decode to live handles
    #[default]
    Handles,

    /// Node references decode to node names
    Names,
}

impl<H: Host> NodeBinding<H> for Binding {
    fn is_node_reference(&self, text: &str) -> bool {
        match self {
            Self::Handles => NodeBinding::<H>::is_node_reference(&HandleBinding, text),
            Self::Names => NodeBinding::<H>::is_node_reference(&NameBinding, text),
        }
    }

    fn node_to_id(&self, host: &H, node: &NodeRef<H::Handle>) -> String {
        match self {
            Self::Handles => HandleBinding.node_to_id(host, node),
            Self::Names => NameBinding.node_to_id(host, node),
        }
    }

    fn id_to_node(
        &self,
        host: &H,
        node_id: &str,
        ref_node: Option<&str>,
    ) -> MetadataResult<Option<NodeRef<H::Handle>>> {
        match self {
            Self::Handles => HandleBinding.id_to_node(host, node_id, ref_node),
            Self::Names => NameBinding.id_to_node(host, node_id, ref_node),
        }
    }
}
