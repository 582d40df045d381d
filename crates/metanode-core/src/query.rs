//! Scene-wide metadata queries

use crate::attributes::{metaclass_attribute_name, METADATA_ATTR};
use crate::host::Host;
use tracing::debug;

/// All nodes that have an attribute, found through `*.<attribute>` selection
///
/// A pattern the host cannot evaluate, e.g. an attribute name no node has
/// ever used, selects nothing.
pub fn find_nodes_with_attribute<H: Host>(host: &H, attribute: &str) -> Vec<H::Handle> {
    let pattern = format!("*.{attribute}");
    match host.select(&pattern) {
        Ok(nodes) => nodes,
        Err(e) => {
            debug!(pattern = %pattern, error = %e, "selection failed, treating as empty");
            Vec::new()
        }
    }
}

/// All nodes with metadata, or with metadata of one metaclass
pub fn find_meta_nodes<H: Host>(host: &H, class_name: Option<&str>) -> Vec<H::Handle> {
    match class_name {
        Some(class_name) => find_nodes_with_attribute(host, &metaclass_attribute_name(class_name)),
        None => find_nodes_with_attribute(host, METADATA_ATTR),
    }
}

/// Unique names of [`find_meta_nodes`]
pub fn find_meta_node_names<H: Host>(host: &H, class_name: Option<&str>) -> Vec<String> {
    find_meta_nodes(host, class_name)
        .iter()
        .filter_map(|node| host.node_name(node))
        .collect()
}
