//! Testing utilities for the metanode workspace
//!
//! [`MemoryScene`] is an in-memory [`Host`]: nodes with names, DAG parents,
//! uuids and owning references, dynamic attributes with lock flags, and a
//! log of every attribute command with the write path it went through.

#![allow(missing_docs)]

use indexmap::IndexMap;
use metanode_core::{AttributeType, Host, HostError, WritePath};
use parking_lot::RwLock;
use tracing_subscriber::EnvFilter;

/// Install a test-writer tracing subscriber once per test binary
///
/// Honors `RUST_LOG`; defaults to debug output for the metanode crates.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("metanode_core=debug,metanode_literal=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Uppercase v4 uuid, as the host formats them
pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string().to_uppercase()
}

/// Handle to a node in a [`MemoryScene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneNode(u64);

/// Attribute command kinds recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    AddAttribute,
    DeleteAttribute,
    SetString,
}

/// One attribute command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub command: Command,
    pub node: SceneNode,
    pub attribute: String,
    pub path: WritePath,
}

#[derive(Debug, Clone)]
struct Attribute {
    attribute_type: AttributeType,
    value: String,
    locked: bool,
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    parent: Option<SceneNode>,
    uuid: String,
    reference: Option<String>,
    attributes: IndexMap<String, Attribute>,
}

#[derive(Debug, Default)]
struct SceneState {
    next_id: u64,
    nodes: IndexMap<SceneNode, NodeData>,
    log: Vec<CommandRecord>,
}

impl SceneState {
    fn path(&self, node: SceneNode) -> Option<String> {
        let data = self.nodes.get(&node)?;
        match data.parent {
            Some(parent) => Some(format!("{}|{}", self.path(parent)?, data.name)),
            None => Some(format!("|{}", data.name)),
        }
    }

    fn unique_name(&self, node: SceneNode) -> Option<String> {
        let data = self.nodes.get(&node)?;
        let shared = self.nodes.values().filter(|n| n.name == data.name).count();
        if shared == 1 {
            Some(data.name.clone())
        } else {
            self.path(node)
        }
    }

    fn matches(&self, node: SceneNode, name: &str) -> bool {
        if name.starts_with('|') {
            self.path(node).as_deref() == Some(name)
        } else if name.contains('|') {
            self.path(node)
                .is_some_and(|p| p.ends_with(&format!("|{name}")))
        } else {
            self.nodes.get(&node).is_some_and(|n| n.name == name)
        }
    }

    fn named(&self, name: &str) -> Vec<SceneNode> {
        self.nodes
            .keys()
            .copied()
            .filter(|n| self.matches(*n, name))
            .collect()
    }

    /// `name`, or `name` with the next free number among siblings
    fn free_name(&self, parent: Option<SceneNode>, name: &str) -> String {
        let taken = |candidate: &str| {
            self.nodes
                .values()
                .any(|n| n.parent == parent && n.name == candidate)
        };
        if !taken(name) {
            return name.to_string();
        }
        let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
        (1..)
            .map(|i| format!("{base}{i}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    fn insert(
        &mut self,
        parent: Option<SceneNode>,
        name: String,
        uuid: String,
        reference: Option<String>,
    ) -> SceneNode {
        self.next_id += 1;
        let node = SceneNode(self.next_id);
        self.nodes.insert(
            node,
            NodeData {
                name,
                parent,
                uuid,
                reference,
                attributes: IndexMap::new(),
            },
        );
        node
    }

    fn label(&self, node: SceneNode) -> String {
        self.unique_name(node)
            .unwrap_or_else(|| format!("{node:?}"))
    }

    fn node(&self, node: SceneNode) -> Result<&NodeData, HostError> {
        self.nodes
            .get(&node)
            .ok_or_else(|| HostError::StaleHandle(format!("{node:?}")))
    }

    fn attribute(&self, node: SceneNode, attribute: &str) -> Result<&Attribute, HostError> {
        self.node(node)?
            .attributes
            .get(attribute)
            .ok_or_else(|| HostError::attribute_not_found(self.label(node), attribute))
    }

    fn attribute_mut(
        &mut self,
        node: SceneNode,
        attribute: &str,
    ) -> Result<&mut Attribute, HostError> {
        let label = self.label(node);
        self.nodes
            .get_mut(&node)
            .ok_or_else(|| HostError::StaleHandle(format!("{node:?}")))?
            .attributes
            .get_mut(attribute)
            .ok_or_else(|| HostError::attribute_not_found(label, attribute))
    }

    fn record(&mut self, command: Command, node: SceneNode, attribute: &str, path: WritePath) {
        self.log.push(CommandRecord {
            command,
            node,
            attribute: attribute.to_string(),
            path,
        });
    }
}

fn valid_attribute_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// In-memory scene implementing [`Host`]
#[derive(Debug, Default)]
pub struct MemoryScene {
    state: RwLock<SceneState>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a top-level node; a taken name gets the next free number
    pub fn create_node(&self, name: &str) -> SceneNode {
        let mut state = self.state.write();
        let name = state.free_name(None, name);
        state.insert(None, name, new_uuid(), None)
    }

    /// Create a node under `parent`
    pub fn create_child(&self, parent: SceneNode, name: &str) -> SceneNode {
        let mut state = self.state.write();
        let name = state.free_name(Some(parent), name);
        state.insert(Some(parent), name, new_uuid(), None)
    }

    /// Create a node loaded from a reference, with a fixed uuid
    ///
    /// Loading one file twice gives nodes with equal uuids under different
    /// reference nodes and namespaces, e.g. `a:ctl` and `b:ctl`.
    pub fn create_referenced_node(&self, reference: &str, name: &str, uuid: &str) -> SceneNode {
        let mut state = self.state.write();
        let name = state.free_name(None, name);
        state.insert(None, name, uuid.to_string(), Some(reference.to_string()))
    }

    /// Create a top-level node with a fixed uuid
    pub fn create_node_with_uuid(&self, name: &str, uuid: &str) -> SceneNode {
        let mut state = self.state.write();
        let name = state.free_name(None, name);
        state.insert(None, name, uuid.to_string(), None)
    }

    /// Delete a node and its descendants; handles to them go stale
    pub fn delete_node(&self, node: SceneNode) {
        let mut state = self.state.write();
        let doomed: Vec<SceneNode> = state
            .nodes
            .keys()
            .copied()
            .filter(|n| {
                let mut cur = Some(*n);
                while let Some(c) = cur {
                    if c == node {
                        return true;
                    }
                    cur = state.nodes.get(&c).and_then(|d| d.parent);
                }
                false
            })
            .collect();
        for n in doomed {
            state.nodes.shift_remove(&n);
        }
    }

    /// Rename a node, keeping its uuid
    pub fn rename_node(&self, node: SceneNode, name: &str) {
        let mut state = self.state.write();
        let parent = state.nodes.get(&node).and_then(|d| d.parent);
        let name = state.free_name(parent, name);
        if let Some(data) = state.nodes.get_mut(&node) {
            data.name = name;
        }
    }

    /// Give a node a new uuid, as an import into another scene would
    pub fn reassign_uuid(&self, node: SceneNode) -> String {
        let uuid = new_uuid();
        if let Some(data) = self.state.write().nodes.get_mut(&node) {
            data.uuid = uuid.clone();
        }
        uuid
    }

    /// Lock or unlock an attribute
    pub fn set_locked(
        &self,
        node: SceneNode,
        attribute: &str,
        locked: bool,
    ) -> Result<(), HostError> {
        self.state.write().attribute_mut(node, attribute)?.locked = locked;
        Ok(())
    }

    /// Storage type of an attribute
    pub fn attribute_type(&self, node: SceneNode, attribute: &str) -> Option<AttributeType> {
        self.state
            .read()
            .attribute(node, attribute)
            .ok()
            .map(|a| a.attribute_type)
    }

    /// Raw stored value of an attribute
    pub fn attribute_value(&self, node: SceneNode, attribute: &str) -> Option<String> {
        self.state
            .read()
            .attribute(node, attribute)
            .ok()
            .map(|a| a.value.clone())
    }

    /// Store text directly, creating a string attribute if needed
    ///
    /// Bypasses locks and the command log; used to plant blobs written by
    /// other tools.
    pub fn plant_string(&self, node: SceneNode, attribute: &str, value: &str) {
        let mut state = self.state.write();
        if let Some(data) = state.nodes.get_mut(&node) {
            data.attributes
                .entry(attribute.to_string())
                .or_insert(Attribute {
                    attribute_type: AttributeType::String,
                    value: String::new(),
                    locked: false,
                })
                .value = value.to_string();
        }
    }

    /// All attribute commands so far
    pub fn command_log(&self) -> Vec<CommandRecord> {
        self.state.read().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.write().log.clear();
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }
}

impl Host for MemoryScene {
    type Handle = SceneNode;

    fn resolve_node(&self, name: &str) -> Result<SceneNode, HostError> {
        let state = self.state.read();
        match state.named(name).as_slice() {
            [] => Err(HostError::NodeNotFound(name.to_string())),
            [node] => Ok(*node),
            _ => Err(HostError::AmbiguousName(name.to_string())),
        }
    }

    fn is_alive(&self, node: &SceneNode) -> bool {
        self.state.read().nodes.contains_key(node)
    }

    fn node_name(&self, node: &SceneNode) -> Option<String> {
        self.state.read().unique_name(*node)
    }

    fn node_uuid(&self, node: &SceneNode) -> Option<String> {
        self.state.read().nodes.get(node).map(|n| n.uuid.clone())
    }

    fn reference_node(&self, node: &SceneNode) -> Option<String> {
        self.state
            .read()
            .nodes
            .get(node)
            .and_then(|n| n.reference.clone())
    }

    fn nodes_with_uuid(&self, uuid: &str) -> Vec<SceneNode> {
        self.state
            .read()
            .nodes
            .iter()
            .filter(|(_, n)| n.uuid == uuid)
            .map(|(k, _)| *k)
            .collect()
    }

    fn nodes_named(&self, name: &str) -> Vec<SceneNode> {
        self.state.read().named(name)
    }

    fn list_attributes(&self, node: &SceneNode) -> Result<Vec<String>, HostError> {
        Ok(self
            .state
            .read()
            .node(*node)?
            .attributes
            .keys()
            .cloned()
            .collect())
    }

    fn has_attribute(&self, node: &SceneNode, attribute: &str) -> bool {
        self.state.read().attribute(*node, attribute).is_ok()
    }

    fn is_attribute_locked(&self, node: &SceneNode, attribute: &str) -> Result<bool, HostError> {
        Ok(self.state.read().attribute(*node, attribute)?.locked)
    }

    fn add_attribute(
        &self,
        node: &SceneNode,
        attribute: &str,
        attribute_type: AttributeType,
        path: WritePath,
    ) -> Result<(), HostError> {
        let mut state = self.state.write();
        if !valid_attribute_name(attribute) {
            return Err(HostError::Command(format!("invalid attribute name '{attribute}'")));
        }
        let label = state.label(*node);
        let data = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| HostError::StaleHandle(format!("{node:?}")))?;
        if data.attributes.contains_key(attribute) {
            return Err(HostError::attribute_exists(label, attribute));
        }
        data.attributes.insert(
            attribute.to_string(),
            Attribute {
                attribute_type,
                value: String::new(),
                locked: false,
            },
        );
        state.record(Command::AddAttribute, *node, attribute, path);
        Ok(())
    }

    fn delete_attribute(
        &self,
        node: &SceneNode,
        attribute: &str,
        path: WritePath,
    ) -> Result<(), HostError> {
        let mut state = self.state.write();
        if state.attribute(*node, attribute)?.locked {
            return Err(HostError::attribute_locked(state.label(*node), attribute));
        }
        if let Some(data) = state.nodes.get_mut(node) {
            data.attributes.shift_remove(attribute);
        }
        state.record(Command::DeleteAttribute, *node, attribute, path);
        Ok(())
    }

    fn get_string(&self, node: &SceneNode, attribute: &str) -> Result<String, HostError> {
        Ok(self.state.read().attribute(*node, attribute)?.value.clone())
    }

    fn set_string(
        &self,
        node: &SceneNode,
        attribute: &str,
        value: &str,
        path: WritePath,
    ) -> Result<(), HostError> {
        let mut state = self.state.write();
        let label = state.label(*node);
        let attr = state.attribute_mut(*node, attribute)?;
        if attr.locked {
            return Err(HostError::attribute_locked(label, attribute));
        }
        attr.value = value.to_string();
        state.record(Command::SetString, *node, attribute, path);
        Ok(())
    }

    fn select(&self, pattern: &str) -> Result<Vec<SceneNode>, HostError> {
        let attribute = pattern
            .strip_prefix("*.")
            .filter(|a| valid_attribute_name(a))
            .ok_or_else(|| HostError::InvalidPattern(pattern.to_string()))?;
        let state = self.state.read();
        Ok(state
            .nodes
            .iter()
            .filter(|(_, n)| n.attributes.contains_key(attribute))
            .map(|(k, _)| *k)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taken_names_get_numbered() {
        let scene = MemoryScene::new();
        let a = scene.create_node("null1");
        let b = scene.create_node("null1");
        assert_eq!(scene.node_name(&a).as_deref(), Some("null1"));
        assert_eq!(scene.node_name(&b).as_deref(), Some("null2"));
    }

    #[test]
    fn shared_short_names_use_paths() {
        let scene = MemoryScene::new();
        let g1 = scene.create_node("grp1");
        let g2 = scene.create_node("grp2");
        let c1 = scene.create_child(g1, "ctl");
        let c2 = scene.create_child(g2, "ctl");
        assert_eq!(scene.node_name(&c1).as_deref(), Some("|grp1|ctl"));
        assert_eq!(scene.resolve_node("grp2|ctl"), Ok(c2));
        assert_eq!(scene.resolve_node("ctl"), Err(HostError::AmbiguousName("ctl".into())));
    }

    #[test]
    fn locked_attributes_refuse_changes() {
        let scene = MemoryScene::new();
        let n = scene.create_node("n");
        scene.add_attribute(&n, "a", AttributeType::String, WritePath::Direct).unwrap();
        scene.set_locked(n, "a", true).unwrap();
        assert!(scene.set_string(&n, "a", "x", WritePath::Direct).is_err());
        assert!(scene.delete_attribute(&n, "a", WritePath::Direct).is_err());
        assert!(scene.has_attribute(&n, "a"));
    }

    #[test]
    fn deleting_a_parent_stales_children() {
        let scene = MemoryScene::new();
        let g = scene.create_node("grp");
        let c = scene.create_child(g, "ctl");
        scene.delete_node(g);
        assert!(!scene.is_alive(&c));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn select_requires_attribute_glob() {
        let scene = MemoryScene::new();
        assert!(matches!(scene.select("pyMetaData"), Err(HostError::InvalidPattern(_))));
        assert_eq!(scene.select("*.pyMetaData"), Ok(vec![]));
    }
}
