//! Metadata controller
//!
//! [`MetadataController`] reads and writes the metadata of one node. A node
//! is either clean, with no metadata attribute, or populated, with a blob
//! and one marker per metaclass. Every mutation checks locks before it
//! deletes anything and validates class names before it creates anything.

use crate::attributes::{
    metaclass_attribute_name, validate_class_name, AttributeAccessor, AttributeHandle,
    METADATA_ATTR,
};
use crate::binding::{Binding, NodeBinding};
use crate::encoder::MetadataEncoder;
use crate::error::{MetadataError, MetadataResult};
use crate::host::{Host, WritePath};
use crate::identity::resolve_node_ref;
use crate::value::{MetaDict, MetaValue, NodeRef};
use metanode_literal::{Dict, Key, Literal};
use tracing::{debug, warn};

/// Metadata operations bound to one node
#[derive(Debug)]
pub struct MetadataController<'h, H: Host, B = Binding> {
    host: &'h H,
    attrs: AttributeAccessor<'h, H>,
    encoder: MetadataEncoder<'h, H, B>,
}

impl<'h, H: Host, B: NodeBinding<H>> MetadataController<'h, H, B> {
    /// Create controller for a resolved node
    pub fn new(host: &'h H, node: H::Handle, binding: B, undoable: bool) -> Self {
        Self {
            host,
            attrs: AttributeAccessor::new(host, node, WritePath::from(undoable)),
            encoder: MetadataEncoder::new(host, binding),
        }
    }

    /// Create controller for any node reference
    ///
    /// # Errors
    /// Host error if the reference does not resolve to a live node.
    pub fn from_node(
        host: &'h H,
        node: &NodeRef<H::Handle>,
        binding: B,
        undoable: bool,
    ) -> MetadataResult<Self> {
        let handle = resolve_node_ref(host, node)?;
        Ok(Self::new(host, handle, binding, undoable))
    }

    /// Node handle
    #[inline]
    pub fn node(&self) -> &H::Handle {
        self.attrs.node()
    }

    /// Attribute accessor for the node
    #[inline]
    pub fn attributes(&self) -> &AttributeAccessor<'h, H> {
        &self.attrs
    }

    /// Encoder used for the blob
    #[inline]
    pub fn encoder(&self) -> &MetadataEncoder<'h, H, B> {
        &self.encoder
    }

    fn node_label(&self) -> String {
        self.host
            .node_name(self.node())
            .unwrap_or_else(|| format!("{:?}", self.node()))
    }

    /// Owning reference of the node, used to disambiguate node ids
    fn ref_node(&self) -> Option<String> {
        self.host.reference_node(self.node())
    }

    /// Check if the node has any metadata
    pub fn is_meta_node(&self) -> bool {
        self.attrs.has_attribute(METADATA_ATTR)
    }

    /// Check if the node has metadata for a metaclass
    pub fn has_metaclass(&self, class_name: &str) -> bool {
        self.attrs
            .has_attribute(&metaclass_attribute_name(class_name))
    }

    /// Names of the metaclasses the node has markers for
    ///
    /// # Errors
    /// Host failure while listing attributes.
    pub fn get_metaclasses(&self) -> MetadataResult<Vec<String>> {
        self.attrs.metaclass_names()
    }

    /// Decoded blob as a mapping of class name to data
    fn read_all(&self, attr: &AttributeHandle) -> MetadataResult<MetaDict<H::Handle>> {
        let text = self.attrs.read_string(attr)?;
        let ref_node = self.ref_node();
        self.encoder
            .decode_metadata(&text, ref_node.as_deref())?
            .into_dict()
            .map_err(|other| MetadataError::MalformedBlob {
                found: other.type_name(),
            })
    }

    /// Parsed blob without node resolution
    fn read_raw(&self, attr: &AttributeHandle) -> MetadataResult<Dict> {
        let text = self.attrs.read_string(attr)?.replace('\r', "");
        if text.is_empty() {
            return Ok(Dict::new());
        }
        metanode_literal::parse(&text)?
            .into_dict()
            .map_err(|other| MetadataError::MalformedBlob {
                found: other.type_name(),
            })
    }

    /// Metadata of the node, or of one metaclass
    ///
    /// A clean node, or a metaclass the node has no data for, reads as an
    /// empty mapping.
    ///
    /// # Errors
    /// `Decode` or `MalformedBlob` if the stored text is not a mapping
    /// literal.
    pub fn get_metadata(&self, class_name: Option<&str>) -> MetadataResult<MetaValue<H::Handle>> {
        let Some(attr) = self.attrs.metadata_attribute() else {
            return Ok(MetaValue::empty_dict());
        };
        let mut data = self.read_all(&attr)?;
        Ok(match class_name {
            Some(class_name) => data
                .swap_remove(&Key::from(class_name))
                .unwrap_or_else(MetaValue::empty_dict),
            None => MetaValue::Dict(data),
        })
    }

    /// Set the data of one metaclass
    ///
    /// With `replace`, all metadata on the node is overwritten by this one
    /// class, without reading the existing blob.
    ///
    /// # Errors
    /// `InvalidClassName` before anything is written; decode or host
    /// failures.
    pub fn set_metadata(
        &self,
        class_name: &str,
        data: MetaValue<H::Handle>,
        replace: bool,
    ) -> MetadataResult<()> {
        validate_class_name(class_name)?;
        if replace {
            let mut all = MetaDict::new();
            all.insert(Key::from(class_name), data);
            return self.set_all_metadata(all);
        }

        let attr = self.attrs.get_or_create_metadata_attribute()?;
        self.attrs.add_metaclass_attribute(class_name)?;

        let mut all = self.read_all(&attr)?;
        all.insert(Key::from(class_name), data);
        let text = self.encoder.encode_metadata(&MetaValue::Dict(all));
        self.attrs.write_string(&attr, &text)?;
        Ok(())
    }

    /// Overwrite all metadata on the node
    ///
    /// Markers are added for every class in `data`. Markers of classes not
    /// in `data` stay; use [`remove_metadata`](Self::remove_metadata) first
    /// to drop them.
    ///
    /// # Errors
    /// `InvalidClassName` if any key is not a valid class name, before any
    /// attribute is created; host failures.
    pub fn set_all_metadata(&self, data: MetaDict<H::Handle>) -> MetadataResult<()> {
        let mut class_names = Vec::with_capacity(data.len());
        for key in data.keys() {
            let class_name = key
                .as_str()
                .ok_or_else(|| MetadataError::InvalidClassName(key.to_string()))?;
            validate_class_name(class_name)?;
            class_names.push(class_name);
        }

        let attr = self.attrs.get_or_create_metadata_attribute()?;
        for class_name in class_names {
            self.attrs.add_metaclass_attribute(class_name)?;
        }

        let text = self.encoder.encode_metadata(&MetaValue::Dict(data));
        self.attrs.write_string(&attr, &text)?;
        Ok(())
    }

    /// Merge keys into the mapping stored for a metaclass
    ///
    /// Keys in `data` replace existing keys of the same name.
    ///
    /// # Errors
    /// `NotADict` if the class holds something other than a mapping.
    pub fn update_metadata(
        &self,
        class_name: &str,
        data: MetaDict<H::Handle>,
    ) -> MetadataResult<()> {
        let mut merged = self
            .get_metadata(Some(class_name))?
            .into_dict()
            .map_err(|other| MetadataError::NotADict {
                node: self.node_label(),
                class_name: class_name.to_string(),
                found: other.type_name(),
            })?;
        merged.extend(data);
        self.set_metadata(class_name, MetaValue::Dict(merged), false)
    }

    /// Remove the metadata of one metaclass, or all metadata
    ///
    /// Returns `false`, changing nothing, when a lock prevents the removal.
    /// Removing the last metaclass removes all metadata attributes, so every
    /// marker lock is checked first. The blob is parsed before anything is
    /// deleted.
    ///
    /// # Errors
    /// Decode or host failures; a blob that does not parse leaves the node
    /// untouched.
    pub fn remove_metadata(&self, class_name: Option<&str>) -> MetadataResult<bool> {
        let Some(attr) = self.attrs.metadata_attribute() else {
            return Ok(true);
        };
        if self.attrs.is_locked(attr.name())? {
            warn!(node = %self.node_label(), "cannot remove metadata, data attribute is locked");
            return Ok(false);
        }

        let Some(class_name) = class_name else {
            return self.remove_all(&attr);
        };

        // class data is dropped without resolving the other classes' nodes
        let mut data = self.read_raw(&attr)?;
        let removed = data.shift_remove(&Key::from(class_name)).is_some();
        if data.is_empty() {
            debug!(
                node = %self.node_label(),
                class_name,
                "no metaclasses left, removing all metadata"
            );
            return self.remove_all(&attr);
        }

        if !self.attrs.remove_metaclass_attribute(class_name)? {
            return Ok(false);
        }
        if removed {
            self.attrs
                .write_string(&attr, &Literal::Dict(data).to_string())?;
        }
        Ok(true)
    }

    /// Delete every marker and the blob, or nothing if any marker is locked
    fn remove_all(&self, attr: &AttributeHandle) -> MetadataResult<bool> {
        let markers: Vec<String> = self
            .attrs
            .metaclass_names()?
            .iter()
            .map(|c| metaclass_attribute_name(c))
            .collect();

        for marker in &markers {
            if self.attrs.is_locked(marker)? {
                warn!(
                    node = %self.node_label(),
                    attribute = %marker,
                    "cannot remove metadata, metaclass attribute is locked"
                );
                return Ok(false);
            }
        }

        for marker in &markers {
            self.attrs.delete(marker)?;
        }
        self.attrs.delete(attr.name())?;
        Ok(true)
    }
}
