//! Metadata encoding
//!
//! Metadata is stored as literal text. Encoding walks the value and swaps
//! every node reference for its node id; decoding parses the text and swaps
//! node ids back for nodes through the active [`NodeBinding`].

use crate::binding::NodeBinding;
use crate::error::MetadataResult;
use crate::host::Host;
use crate::value::{MetaDict, MetaValue};
use metanode_literal::{Dict, Literal};
use tracing::error;

/// Encoder and decoder for one host and binding
#[derive(Debug)]
pub struct MetadataEncoder<'h, H, B> {
    host: &'h H,
    binding: B,
}

impl<'h, H: Host, B: NodeBinding<H>> MetadataEncoder<'h, H, B> {
    /// Create encoder
    pub fn new(host: &'h H, binding: B) -> Self {
        Self { host, binding }
    }

    /// Encode metadata to stored text
    pub fn encode_metadata(&self, data: &MetaValue<H::Handle>) -> String {
        self.encode_metadata_value(data).to_string()
    }

    /// Encode one value, replacing node references with node ids
    pub fn encode_metadata_value(&self, value: &MetaValue<H::Handle>) -> Literal {
        match value {
            MetaValue::None => Literal::None,
            MetaValue::Bool(b) => Literal::Bool(*b),
            MetaValue::Int(i) => Literal::Int(*i),
            MetaValue::Float(x) => Literal::Float(*x),
            MetaValue::Str(s) => Literal::Str(s.clone()),
            MetaValue::List(items) => {
                Literal::List(items.iter().map(|v| self.encode_metadata_value(v)).collect())
            }
            MetaValue::Tuple(items) => {
                Literal::Tuple(items.iter().map(|v| self.encode_metadata_value(v)).collect())
            }
            MetaValue::Dict(map) => Literal::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.encode_metadata_value(v)))
                    .collect::<Dict>(),
            ),
            MetaValue::Node(node) => Literal::Str(self.binding.node_to_id(self.host, node)),
        }
    }

    /// Decode stored text
    ///
    /// Empty text decodes to an empty mapping. Carriage returns are dropped
    /// before parsing.
    ///
    /// # Errors
    /// `MetadataError::Decode` if the text is not a valid literal.
    pub fn decode_metadata(
        &self,
        text: &str,
        ref_node: Option<&str>,
    ) -> MetadataResult<MetaValue<H::Handle>> {
        let text = text.replace('\r', "");
        if text.is_empty() {
            return Ok(MetaValue::empty_dict());
        }
        let literal = metanode_literal::parse(&text)?;
        Ok(self.decode_metadata_value(literal, ref_node))
    }

    /// Decode one parsed value, resolving node ids
    ///
    /// Node ids that no longer resolve become `None`.
    pub fn decode_metadata_value(
        &self,
        value: Literal,
        ref_node: Option<&str>,
    ) -> MetaValue<H::Handle> {
        match value {
            Literal::Str(s) if self.binding.is_node_reference(&s) => {
                match self.binding.id_to_node(self.host, &s, ref_node) {
                    Ok(Some(node)) => MetaValue::Node(node),
                    Ok(None) => MetaValue::None,
                    Err(e) => {
                        error!(node_id = %s, error = %e, "failed to resolve node reference");
                        MetaValue::None
                    }
                }
            }
            Literal::List(items) => MetaValue::List(
                items
                    .into_iter()
                    .map(|v| self.decode_metadata_value(v, ref_node))
                    .collect(),
            ),
            Literal::Tuple(items) => MetaValue::Tuple(
                items
                    .into_iter()
                    .map(|v| self.decode_metadata_value(v, ref_node))
                    .collect(),
            ),
            Literal::Dict(map) => MetaValue::Dict(
                map.into_iter()
                    .map(|(k, v)| (k, self.decode_metadata_value(v, ref_node)))
                    .collect::<MetaDict<H::Handle>>(),
            ),
            scalar => MetaValue::from(scalar),
        }
    }
}
