//! Free-function API
//!
//! One call per operation, for callers that hold a node reference rather
//! than a controller. Binding and write path come from [`MetanodeConfig`].
//!
//! # Example
//!
//! ```ignore
//! use metanode_core::api;
//! use metanode_core::prelude::*;
//!
//! let config = MetanodeConfig::default();
//! let node = NodeRef::from("rig_ctl");
//! api::set_metadata(&config, &host, &node, "rigInfo", MetaValue::from("arm"), false)?;
//! assert!(api::has_metaclass(&host, &node, "rigInfo"));
//! ```

use crate::attributes::{has_attribute, metaclass_attribute_name, AttributeAccessor, METADATA_ATTR};
use crate::config::MetanodeConfig;
use crate::controller::MetadataController;
use crate::encoder::MetadataEncoder;
use crate::error::MetadataResult;
use crate::host::{Host, WritePath};
use crate::identity::resolve_node_ref;
use crate::value::{MetaDict, MetaValue, NodeRef};

pub use crate::query::{find_meta_node_names, find_meta_nodes};

fn controller<'h, H: Host>(
    config: &MetanodeConfig,
    host: &'h H,
    node: &NodeRef<H::Handle>,
) -> MetadataResult<MetadataController<'h, H>> {
    MetadataController::from_node(host, node, config.binding, config.undoable)
}

/// Encode metadata to stored text
pub fn encode_metadata<H: Host>(
    config: &MetanodeConfig,
    host: &H,
    data: &MetaValue<H::Handle>,
) -> String {
    MetadataEncoder::new(host, config.binding).encode_metadata(data)
}

/// Decode stored text
///
/// # Errors
/// `MetadataError::Decode` if the text is not a valid literal.
pub fn decode_metadata<H: Host>(
    config: &MetanodeConfig,
    host: &H,
    text: &str,
    ref_node: Option<&str>,
) -> MetadataResult<MetaValue<H::Handle>> {
    MetadataEncoder::new(host, config.binding).decode_metadata(text, ref_node)
}

/// Check if a node has any metadata
pub fn is_meta_node<H: Host>(host: &H, node: &NodeRef<H::Handle>) -> bool {
    has_attribute(host, node, METADATA_ATTR)
}

/// Check if a node has metadata for a metaclass
pub fn has_metaclass<H: Host>(host: &H, node: &NodeRef<H::Handle>, class_name: &str) -> bool {
    has_attribute(host, node, &metaclass_attribute_name(class_name))
}

/// Metaclass names of a node
///
/// # Errors
/// Host error if the node does not resolve.
pub fn get_metaclasses<H: Host>(
    host: &H,
    node: &NodeRef<H::Handle>,
) -> MetadataResult<Vec<String>> {
    let handle = resolve_node_ref(host, node)?;
    AttributeAccessor::new(host, handle, WritePath::default()).metaclass_names()
}

/// Metadata of a node, or of one metaclass
///
/// # Errors
/// See [`MetadataController::get_metadata`].
pub fn get_metadata<H: Host>(
    config: &MetanodeConfig,
    host: &H,
    node: &NodeRef<H::Handle>,
    class_name: Option<&str>,
) -> MetadataResult<MetaValue<H::Handle>> {
    controller(config, host, node)?.get_metadata(class_name)
}

/// Set the data of one metaclass
///
/// # Errors
/// See [`MetadataController::set_metadata`].
pub fn set_metadata<H: Host>(
    config: &MetanodeConfig,
    host: &H,
    node: &NodeRef<H::Handle>,
    class_name: &str,
    data: MetaValue<H::Handle>,
    replace: bool,
) -> MetadataResult<()> {
    controller(config, host, node)?.set_metadata(class_name, data, replace)
}

/// Overwrite all metadata on a node
///
/// # Errors
/// See [`MetadataController::set_all_metadata`].
pub fn set_all_metadata<H: Host>(
    config: &MetanodeConfig,
    host: &H,
    node: &NodeRef<H::Handle>,
    data: MetaDict<H::Handle>,
) -> MetadataResult<()> {
    controller(config, host, node)?.set_all_metadata(data)
}

/// Merge keys into the mapping stored for a metaclass
///
/// # Errors
/// See [`MetadataController::update_metadata`].
pub fn update_metadata<H: Host>(
    config: &MetanodeConfig,
    host: &H,
    node: &NodeRef<H::Handle>,
    class_name: &str,
    data: MetaDict<H::Handle>,
) -> MetadataResult<()> {
    controller(config, host, node)?.update_metadata(class_name, data)
}

/// Remove the metadata of one metaclass, or all metadata
///
/// A node without metadata, including one that does not resolve, is
/// already clean.
///
/// # Errors
/// See [`MetadataController::remove_metadata`].
pub fn remove_metadata<H: Host>(
    config: &MetanodeConfig,
    host: &H,
    node: &NodeRef<H::Handle>,
    class_name: Option<&str>,
) -> MetadataResult<bool> {
    if !is_meta_node(host, node) {
        return Ok(true);
    }
    controller(config, host, node)?.remove_metadata(class_name)
}
