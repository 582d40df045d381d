//! Metanode Core
//!
//! Class-tagged metadata stored on the attributes of scene-graph nodes.
//!
//! # Overview
//!
//! - **Host**: capability trait over the authoring host's node graph
//! - **MetaValue**: metadata values, including references to other nodes
//! - **MetadataEncoder**: value ↔ stored text, node references ↔ `name@UUID`
//! - **AttributeAccessor**: the `pyMetaData` blob and `pyMetaClass_*` markers
//! - **MetadataController**: get/set/update/remove for one node
//! - **query**: scene-wide discovery of metadata nodes
//! - **api**: free functions driven by [`MetanodeConfig`]
//!
//! # Example
//!
//! ```ignore
//! use metanode_core::prelude::*;
//!
//! let node = NodeRef::from("null1");
//! let ctl = MetadataController::from_node(&host, &node, Binding::Handles, true)?;
//! ctl.set_metadata("myMetaClass", MetaValue::from("value"), false)?;
//! assert_eq!(ctl.get_metaclasses()?, vec!["myMetaClass".to_string()]);
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod attributes;
pub mod binding;
pub mod config;
pub mod controller;
pub mod encoder;
pub mod error;
pub mod host;
pub mod identity;
pub mod query;
pub mod value;

// Re-exports
pub use attributes::{
    has_attribute, metaclass_attribute_name, validate_class_name, AttributeAccessor,
    AttributeHandle, METACLASS_ATTR_PREFIX, METADATA_ATTR,
};
pub use binding::{Binding, HandleBinding, NameBinding, NodeBinding};
pub use config::MetanodeConfig;
pub use controller::MetadataController;
pub use encoder::MetadataEncoder;
pub use error::{ConfigError, HostError, MetadataError, MetadataResult};
pub use host::{AttributeType, Host, WritePath};
pub use identity::{
    find_node_by_id, find_node_by_name, find_node_by_uuid, get_node_id, get_unique_node_name,
    is_node_id, is_uuid, resolve_node_ref, NodeId,
};
pub use query::{find_meta_node_names, find_meta_nodes, find_nodes_with_attribute};
pub use value::{LiveNode, MetaDict, MetaValue, NodeRef};

pub use metanode_literal::{Key, Literal};

/// Common imports for working with metanode
pub mod prelude {
    pub use crate::{
        Binding, Host, Key, LiveNode, MetaDict, MetaValue, MetadataController, MetadataError,
        MetadataResult, MetanodeConfig, NodeRef, WritePath,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
