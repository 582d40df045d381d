//! Error types for metanode
//!
//! Provides error handling for:
//! - Host collaborator failures (missing nodes, attribute commands)
//! - Metadata operations (class names, decoding, node ids, updates)
//! - Configuration loading

use metanode_literal::LiteralError;

/// Errors reported by a [`Host`](crate::host::Host) implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// No node with the given name exists
    #[error("node not found: '{0}'")]
    NodeNotFound(String),

    /// More than one node matches a name that must be unique
    #[error("more than one node matches '{0}'")]
    AmbiguousName(String),

    /// Handle refers to a node that no longer exists
    #[error("stale node handle: {0}")]
    StaleHandle(String),

    /// Attribute does not exist on the node
    #[error("attribute not found: '{node}.{attribute}'")]
    AttributeNotFound { node: String, attribute: String },

    /// Attribute already exists on the node
    #[error("attribute already exists: '{node}.{attribute}'")]
    AttributeExists { node: String, attribute: String },

    /// Attribute is locked against modification
    #[error("attribute is locked: '{node}.{attribute}'")]
    AttributeLocked { node: String, attribute: String },

    /// Selection pattern the host cannot evaluate
    #[error("invalid selection pattern: '{0}'")]
    InvalidPattern(String),

    /// Any other host command failure
    #[error("host command failed: {0}")]
    Command(String),
}

impl HostError {
    /// Create attribute not found error
    pub fn attribute_not_found(node: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::AttributeNotFound {
            node: node.into(),
            attribute: attribute.into(),
        }
    }

    /// Create attribute exists error
    pub fn attribute_exists(node: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::AttributeExists {
            node: node.into(),
            attribute: attribute.into(),
        }
    }

    /// Create attribute locked error
    pub fn attribute_locked(node: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::AttributeLocked {
            node: node.into(),
            attribute: attribute.into(),
        }
    }
}

/// Main metadata error type
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Metaclass name is not a valid attribute name
    #[error("invalid metaclass name: '{0}'")]
    InvalidClassName(String),

    /// Stored text is not a valid literal
    #[error("failed to decode metadata: {0}")]
    Decode(#[from] LiteralError),

    /// Stored text decoded to something other than a mapping
    #[error("stored metadata is a '{found}', expected a dict")]
    MalformedBlob { found: &'static str },

    /// String does not match the `name@UUID` grammar
    #[error("not a valid node id: '{0}'")]
    InvalidNodeId(String),

    /// Update target is not a mapping
    #[error("metadata for class '{class_name}' on node '{node}' is a '{found}', not a mapping")]
    NotADict {
        node: String,
        class_name: String,
        found: &'static str,
    },

    /// Host collaborator failure
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

impl MetadataError {
    /// Check if this error came from invalid caller input rather than the host
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidClassName(_) | Self::InvalidNodeId(_) | Self::NotADict { .. }
        )
    }
}

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed into a configuration
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;
