//! Metadata value model
//!
//! [`MetaValue`] is the caller-facing form of stored metadata: the literal
//! value kinds plus node references. It is generic over the host handle
//! type `N`.

use indexmap::IndexMap;
use metanode_literal::{Key, Literal};

/// Insertion-ordered mapping of metadata values
pub type MetaDict<N> = IndexMap<Key, MetaValue<N>>;

/// A metadata value
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue<N> {
    /// Null value
    None,

    /// Boolean
    Bool(bool),

    /// Integer
    Int(i64),

    /// Float
    Float(f64),

    /// String
    Str(String),

    /// List-flavored sequence
    List(Vec<MetaValue<N>>),

    /// Tuple-flavored sequence
    Tuple(Vec<MetaValue<N>>),

    /// Mapping
    Dict(MetaDict<N>),

    /// Reference to another node, stored as a node id
    Node(NodeRef<N>),
}

/// A reference to a host node, in one of the forms callers hold them
#[derive(Debug, Clone)]
pub enum NodeRef<N> {
    /// Bare host handle
    Raw(N),

    /// Handle together with the unique name it had when captured
    Live(LiveNode<N>),

    /// Node name or path, resolved on use
    Name(String),
}

/// Host handle paired with the node's unique name at capture time
///
/// If the handle goes stale the name is used to find the node again.
/// Equality compares handles only.
#[derive(Debug, Clone)]
pub struct LiveNode<N> {
    /// Host handle
    pub handle: N,

    /// Unique name when the handle was obtained
    pub name: String,
}

impl<N> LiveNode<N> {
    /// Create live node
    pub fn new(handle: N, name: impl Into<String>) -> Self {
        Self {
            handle,
            name: name.into(),
        }
    }
}

impl<N: PartialEq> PartialEq for LiveNode<N> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<N> NodeRef<N> {
    /// Handle carried by this reference, if any
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Option<&N> {
        match self {
            Self::Raw(handle) => Some(handle),
            Self::Live(live) => Some(&live.handle),
            Self::Name(_) => None,
        }
    }

    /// Name carried by this reference, if any
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Raw(_) => None,
            Self::Live(live) => Some(&live.name),
            Self::Name(name) => Some(name),
        }
    }
}

/// Handle-carrying references are equal when they hold the same handle,
/// whichever flavor they are. Names only equal names.
impl<N: PartialEq> PartialEq for NodeRef<N> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Name(a), Self::Name(b)) => a == b,
            (Self::Name(_), _) | (_, Self::Name(_)) => false,
            (a, b) => a.handle() == b.handle(),
        }
    }
}

impl<N> From<&str> for NodeRef<N> {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl<N> From<String> for NodeRef<N> {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<N> From<LiveNode<N>> for NodeRef<N> {
    fn from(live: LiveNode<N>) -> Self {
        Self::Live(live)
    }
}

impl<N> MetaValue<N> {
    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn empty_dict() -> Self {
        Self::Dict(MetaDict::new())
    }

    /// Reference to the node behind a raw handle
    #[inline]
    pub fn node(handle: N) -> Self {
        Self::Node(NodeRef::Raw(handle))
    }

    /// Name of the value kind
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Node(_) => "node",
        }
    }

    /// Check if this is a mapping
    #[inline]
    #[must_use]
    pub fn is_dict(&self) -> bool {
        matches!(self, Self::Dict(_))
    }

    /// Check if this is the null value
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Borrow the mapping, if this is one
    #[inline]
    #[must_use]
    pub fn as_dict(&self) -> Option<&MetaDict<N>> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Take the mapping, or give the value back unchanged
    ///
    /// # Errors
    /// Returns `self` if this is not a mapping.
    pub fn into_dict(self) -> Result<MetaDict<N>, Self> {
        match self {
            Self::Dict(d) => Ok(d),
            other => Err(other),
        }
    }

    /// Borrow the node reference, if this is one
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeRef<N>> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Borrow the string, if this is one
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key in a mapping value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_dict()
            .and_then(|d| d.get(&Key::Str(key.to_string())))
    }
}

/// Plain conversion; strings stay strings even when they look like node ids
impl<N> From<Literal> for MetaValue<N> {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::None => Self::None,
            Literal::Bool(b) => Self::Bool(b),
            Literal::Int(i) => Self::Int(i),
            Literal::Float(x) => Self::Float(x),
            Literal::Str(s) => Self::Str(s),
            Literal::List(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Literal::Tuple(items) => Self::Tuple(items.into_iter().map(Self::from).collect()),
            Literal::Dict(map) => {
                Self::Dict(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl<N> From<NodeRef<N>> for MetaValue<N> {
    fn from(node: NodeRef<N>) -> Self {
        Self::Node(node)
    }
}

impl<N> From<bool> for MetaValue<N> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl<N> From<i64> for MetaValue<N> {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl<N> From<i32> for MetaValue<N> {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl<N> From<f64> for MetaValue<N> {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl<N> From<&str> for MetaValue<N> {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl<N> From<String> for MetaValue<N> {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<N> From<Vec<MetaValue<N>>> for MetaValue<N> {
    fn from(v: Vec<MetaValue<N>>) -> Self {
        Self::List(v)
    }
}

impl<N> From<MetaDict<N>> for MetaValue<N> {
    fn from(v: MetaDict<N>) -> Self {
        Self::Dict(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Value = MetaValue<u32>;

    #[test]
    fn handle_flavors_compare_by_handle() {
        let raw: NodeRef<u32> = NodeRef::Raw(7);
        let live = NodeRef::Live(LiveNode::new(7, "null1"));
        let renamed = NodeRef::Live(LiveNode::new(7, "null2"));
        assert_eq!(raw, live);
        assert_eq!(live, renamed);
        assert_ne!(raw, NodeRef::Raw(8));
        assert_ne!(live, NodeRef::Name("null1".to_string()));
        assert_eq!(NodeRef::<u32>::from("a"), NodeRef::Name("a".to_string()));
    }

    #[test]
    fn literal_conversion_keeps_shape() {
        let literal = metanode_literal::parse("['x', {'a': 1}, ('y', 'z')]").unwrap();
        let value = Value::from(literal);

        let mut inner = MetaDict::new();
        inner.insert(Key::from("a"), Value::Int(1));
        let expected = Value::List(vec![
            Value::from("x"),
            Value::Dict(inner),
            Value::Tuple(vec![Value::from("y"), Value::from("z")]),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn dict_access() {
        let mut map = MetaDict::new();
        map.insert(Key::from("k"), Value::from(true));
        let value = Value::Dict(map);
        assert_eq!(value.get("k"), Some(&Value::Bool(true)));
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::from("s").into_dict(), Err(Value::from("s")));
        assert_eq!(Value::node(3).type_name(), "node");
    }
}
