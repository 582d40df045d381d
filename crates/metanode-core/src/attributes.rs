//! Attribute storage for metadata
//!
//! Each metadata-bearing node has one string attribute, [`METADATA_ATTR`],
//! holding the encoded blob, and one marker attribute per metaclass named
//! [`METACLASS_ATTR_PREFIX`] + class name. Markers carry no value; they make
//! nodes of a class discoverable through attribute selection.

use crate::error::{HostError, MetadataError, MetadataResult};
use crate::host::{AttributeType, Host, WritePath};
use crate::identity::resolve_node_ref;
use crate::value::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Name of the attribute holding the encoded metadata
pub const METADATA_ATTR: &str = "pyMetaData";

/// Prefix of metaclass marker attribute names
pub const METACLASS_ATTR_PREFIX: &str = "pyMetaClass_";

static CLASS_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[_a-zA-Z0-9]+$").expect("valid class name pattern"));

/// Check a metaclass name is usable in an attribute name
///
/// # Errors
/// `MetadataError::InvalidClassName` if it is empty or has characters
/// outside `[_a-zA-Z0-9]`.
pub fn validate_class_name(class_name: &str) -> MetadataResult<()> {
    if CLASS_NAME_RE.is_match(class_name) {
        Ok(())
    } else {
        Err(MetadataError::InvalidClassName(class_name.to_string()))
    }
}

/// Marker attribute name for a metaclass
#[inline]
#[must_use]
pub fn metaclass_attribute_name(class_name: &str) -> String {
    format!("{METACLASS_ATTR_PREFIX}{class_name}")
}

/// Check if any flavor of node reference has an attribute
///
/// A node that cannot be resolved has no attributes.
pub fn has_attribute<H: Host>(host: &H, node: &NodeRef<H::Handle>, attribute: &str) -> bool {
    resolve_node_ref(host, node).is_ok_and(|handle| host.has_attribute(&handle, attribute))
}

/// Named attribute known to exist on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeHandle {
    name: String,
}

impl AttributeHandle {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Attribute name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Attribute operations bound to one node and one write path
#[derive(Debug)]
pub struct AttributeAccessor<'h, H: Host> {
    host: &'h H,
    node: H::Handle,
    path: WritePath,
}

impl<'h, H: Host> AttributeAccessor<'h, H> {
    /// Create accessor for a resolved node
    pub fn new(host: &'h H, node: H::Handle, path: WritePath) -> Self {
        Self { host, node, path }
    }

    /// Node handle
    #[inline]
    pub fn node(&self) -> &H::Handle {
        &self.node
    }

    /// Write path used for mutations
    #[inline]
    pub fn write_path(&self) -> WritePath {
        self.path
    }

    /// Node name for messages
    fn node_label(&self) -> String {
        self.host
            .node_name(&self.node)
            .unwrap_or_else(|| format!("{:?}", self.node))
    }

    /// Check if the node has an attribute
    #[inline]
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.host.has_attribute(&self.node, attribute)
    }

    /// Existing attribute, if present
    pub fn find_attribute(&self, attribute: &str) -> Option<AttributeHandle> {
        self.has_attribute(attribute)
            .then(|| AttributeHandle::new(attribute))
    }

    /// Metadata blob attribute, if the node has one
    pub fn metadata_attribute(&self) -> Option<AttributeHandle> {
        self.find_attribute(METADATA_ATTR)
    }

    /// Metadata blob attribute, created as a string attribute if missing
    ///
    /// # Errors
    /// Host failure while creating the attribute.
    pub fn get_or_create_metadata_attribute(&self) -> MetadataResult<AttributeHandle> {
        if let Some(attr) = self.metadata_attribute() {
            return Ok(attr);
        }
        debug!(node = %self.node_label(), path = ?self.path, "creating metadata attribute");
        self.host
            .add_attribute(&self.node, METADATA_ATTR, AttributeType::String, self.path)?;
        Ok(AttributeHandle::new(METADATA_ATTR))
    }

    /// Ensure the marker attribute for a metaclass exists
    ///
    /// # Errors
    /// `InvalidClassName` before anything is created; host failure while
    /// creating the marker.
    pub fn add_metaclass_attribute(&self, class_name: &str) -> MetadataResult<AttributeHandle> {
        validate_class_name(class_name)?;
        let name = metaclass_attribute_name(class_name);
        if let Some(attr) = self.find_attribute(&name) {
            return Ok(attr);
        }
        debug!(node = %self.node_label(), class_name, "creating metaclass attribute");
        self.host
            .add_attribute(&self.node, &name, AttributeType::Short, self.path)?;
        Ok(AttributeHandle::new(name))
    }

    /// Remove the marker attribute for a metaclass
    ///
    /// Returns `false` and leaves the marker in place if it is locked. A
    /// missing marker counts as removed.
    ///
    /// # Errors
    /// Host failure while deleting.
    pub fn remove_metaclass_attribute(&self, class_name: &str) -> MetadataResult<bool> {
        let name = metaclass_attribute_name(class_name);
        if !self.has_attribute(&name) {
            return Ok(true);
        }
        if self.is_locked(&name)? {
            warn!(
                node = %self.node_label(),
                attribute = %name,
                "cannot remove locked metaclass attribute"
            );
            return Ok(false);
        }
        self.delete(&name)?;
        Ok(true)
    }

    /// Metaclass names recorded by marker attributes, in attribute order
    ///
    /// # Errors
    /// Host failure while listing attributes.
    pub fn metaclass_names(&self) -> MetadataResult<Vec<String>> {
        Ok(self
            .host
            .list_attributes(&self.node)?
            .into_iter()
            .filter_map(|attr| attr.strip_prefix(METACLASS_ATTR_PREFIX).map(str::to_string))
            .filter(|class_name| !class_name.is_empty())
            .collect())
    }

    /// Check if an attribute is locked
    ///
    /// # Errors
    /// Host failure, e.g. the attribute does not exist.
    pub fn is_locked(&self, attribute: &str) -> Result<bool, HostError> {
        self.host.is_attribute_locked(&self.node, attribute)
    }

    /// Read a string attribute
    ///
    /// # Errors
    /// Host failure, e.g. the attribute does not exist.
    pub fn read_string(&self, attribute: &AttributeHandle) -> Result<String, HostError> {
        self.host.get_string(&self.node, attribute.name())
    }

    /// Write a string attribute through the accessor's write path
    ///
    /// # Errors
    /// Host failure, e.g. the attribute is locked.
    pub fn write_string(&self, attribute: &AttributeHandle, value: &str) -> Result<(), HostError> {
        debug!(
            node = %self.node_label(),
            attribute = attribute.name(),
            len = value.len(),
            "writing attribute"
        );
        self.host
            .set_string(&self.node, attribute.name(), value, self.path)
    }

    /// Delete an attribute through the accessor's write path
    ///
    /// # Errors
    /// Host failure, e.g. the attribute is locked.
    pub fn delete(&self, attribute: &str) -> Result<(), HostError> {
        debug!(node = %self.node_label(), attribute, path = ?self.path, "deleting attribute");
        self.host.delete_attribute(&self.node, attribute, self.path)
    }
}
