//! Host capability interface
//!
//! The authoring host owns the node graph, the attribute storage, the undo
//! log and the reference mechanism. [`Host`] is the narrow slice of it this
//! crate needs; everything else in the crate is written against this trait.

use crate::error::HostError;
use std::fmt::Debug;

/// Which host command path a mutation goes through
///
/// Both paths leave the scene in the same state. `Undoable` records the
/// change in the host's undo log; `Direct` skips it and is cheaper for bulk
/// work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritePath {
    /// Undo-log integrated command
    #[default]
    Undoable,

    /// Direct API call, not undoable
    Direct,
}

impl WritePath {
    /// Check if this path is recorded in the undo log
    #[inline]
    #[must_use]
    pub fn is_undoable(self) -> bool {
        matches!(self, Self::Undoable)
    }
}

impl From<bool> for WritePath {
    fn from(undoable: bool) -> Self {
        if undoable {
            Self::Undoable
        } else {
            Self::Direct
        }
    }
}

/// Attribute storage types this crate creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// String-typed attribute, holds the metadata blob
    String,

    /// Short integer, used for existence-only marker attributes
    Short,
}

/// Capabilities required from the authoring host
///
/// All calls are synchronous and run on the host's command thread, so
/// methods take `&self`; implementations use interior mutability.
pub trait Host {
    /// Opaque handle to a live node
    type Handle: Clone + PartialEq + Debug;

    /// Resolve a node name or path to a handle
    ///
    /// # Errors
    /// `HostError::NodeNotFound` if no node matches, `AmbiguousName` if the
    /// name does not identify a single node.
    fn resolve_node(&self, name: &str) -> Result<Self::Handle, HostError>;

    /// Check if the handle still refers to an existing node
    fn is_alive(&self, node: &Self::Handle) -> bool;

    /// Current unique name of the node, or its shortest unique path
    fn node_name(&self, node: &Self::Handle) -> Option<String>;

    /// Session-persistent unique id of the node
    fn node_uuid(&self, node: &Self::Handle) -> Option<String>;

    /// Reference node owning this node, if it was loaded from a reference
    fn reference_node(&self, node: &Self::Handle) -> Option<String>;

    /// All nodes carrying the given uuid
    fn nodes_with_uuid(&self, uuid: &str) -> Vec<Self::Handle>;

    /// All nodes matching the given name or path
    fn nodes_named(&self, name: &str) -> Vec<Self::Handle>;

    /// Names of all dynamic attributes on the node
    ///
    /// # Errors
    /// Fails if the node no longer exists.
    fn list_attributes(&self, node: &Self::Handle) -> Result<Vec<String>, HostError>;

    /// Check if the node has the named attribute
    fn has_attribute(&self, node: &Self::Handle, attribute: &str) -> bool;

    /// Check if the named attribute is locked
    ///
    /// # Errors
    /// Fails if the node or attribute does not exist.
    fn is_attribute_locked(&self, node: &Self::Handle, attribute: &str) -> Result<bool, HostError>;

    /// Create a new dynamic attribute
    ///
    /// # Errors
    /// Fails if the attribute already exists or the host rejects the name.
    fn add_attribute(
        &self,
        node: &Self::Handle,
        attribute: &str,
        attribute_type: AttributeType,
        path: WritePath,
    ) -> Result<(), HostError>;

    /// Delete a dynamic attribute
    ///
    /// # Errors
    /// Fails if the attribute does not exist or is locked.
    fn delete_attribute(
        &self,
        node: &Self::Handle,
        attribute: &str,
        path: WritePath,
    ) -> Result<(), HostError>;

    /// Read a string attribute; an unset value reads as empty
    ///
    /// # Errors
    /// Fails if the node or attribute does not exist.
    fn get_string(&self, node: &Self::Handle, attribute: &str) -> Result<String, HostError>;

    /// Write a string attribute
    ///
    /// # Errors
    /// Fails if the attribute does not exist or is locked.
    fn set_string(
        &self,
        node: &Self::Handle,
        attribute: &str,
        value: &str,
        path: WritePath,
    ) -> Result<(), HostError>;

    /// Glob selection over the active document, e.g. `*.pyMetaData`
    ///
    /// # Errors
    /// `HostError::InvalidPattern` if the pattern cannot be evaluated.
    fn select(&self, pattern: &str) -> Result<Vec<Self::Handle>, HostError>;
}
