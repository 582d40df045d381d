//! Literal value model
//!
//! Provides [`Literal`], the closed set of values the notation can express,
//! and [`Key`], the hashable subset that may be used as a dict key.

use indexmap::IndexMap;

/// Insertion-ordered mapping, as produced by a `{...}` literal
pub type Dict = IndexMap<Key, Literal>;

/// A parsed literal value
///
/// Mirrors the value kinds a host scripting environment can round trip
/// through its literal notation: scalars, the two sequence flavors, and
/// mappings.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `None`
    None,

    /// `True` / `False`
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// Double precision float
    Float(f64),

    /// Unicode string
    Str(String),

    /// `[a, b]`
    List(Vec<Literal>),

    /// `(a, b)`
    Tuple(Vec<Literal>),

    /// `{k: v}`
    Dict(Dict),
}

/// Hashable literal, usable as a [`Dict`] key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// `None`
    None,

    /// `True` / `False`
    Bool(bool),

    /// Integer key
    Int(i64),

    /// String key
    Str(String),

    /// Tuple of hashable values
    Tuple(Vec<Key>),
}

impl Literal {
    /// Empty `{}` literal
    #[inline]
    #[must_use]
    pub fn empty_dict() -> Self {
        Self::Dict(Dict::new())
    }

    /// Name of the value kind, as the host language would report it
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
        }
    }

    /// Check if this is a dict
    #[inline]
    #[must_use]
    pub fn is_dict(&self) -> bool {
        matches!(self, Self::Dict(_))
    }

    /// Borrow the dict, if this is one
    #[inline]
    #[must_use]
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Mutably borrow the dict, if this is one
    #[inline]
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Take the dict, or give the value back unchanged
    ///
    /// # Errors
    /// Returns `self` if this is not a dict.
    pub fn into_dict(self) -> Result<Dict, Self> {
        match self {
            Self::Dict(d) => Ok(d),
            other => Err(other),
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

    /// Get the integer, if this is one
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl Key {
    /// Borrow the string, if this is a string key
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Key> for Literal {
    fn from(key: Key) -> Self {
        match key {
            Key::None => Self::None,
            Key::Bool(b) => Self::Bool(b),
            Key::Int(i) => Self::Int(i),
            Key::Str(s) => Self::Str(s),
            Key::Tuple(items) => Self::Tuple(items.into_iter().map(Self::from).collect()),
        }
    }
}

/// Lists, dicts and floats are not usable as keys; the rejected value is
/// handed back.
impl TryFrom<Literal> for Key {
    type Error = Literal;

    fn try_from(value: Literal) -> Result<Self, Self::Error> {
        match value {
            Literal::None => Ok(Self::None),
            Literal::Bool(b) => Ok(Self::Bool(b)),
            Literal::Int(i) => Ok(Self::Int(i)),
            Literal::Str(s) => Ok(Self::Str(s)),
            Literal::Tuple(items) => {
                let keys: Result<Vec<Self>, Literal> =
                    items.iter().cloned().map(Self::try_from).collect();
                match keys {
                    Ok(keys) => Ok(Self::Tuple(keys)),
                    Err(_) => Err(Literal::Tuple(items)),
                }
            }
            other => Err(other),
        }
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Literal>> for Literal {
    fn from(v: Vec<Literal>) -> Self {
        Self::List(v)
    }
}

impl From<Dict> for Literal {
    fn from(v: Dict) -> Self {
        Self::Dict(v)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Key {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_through_literal() {
        let key = Key::Tuple(vec![Key::from("a"), Key::Int(1), Key::None]);
        let lit = Literal::from(key.clone());
        assert_eq!(Key::try_from(lit), Ok(key));
    }

    #[test]
    fn unhashable_values_are_rejected() {
        let list = Literal::List(vec![Literal::Int(1)]);
        assert_eq!(Key::try_from(list.clone()), Err(list));

        let float = Literal::Float(1.5);
        assert!(Key::try_from(float).is_err());

        let nested = Literal::Tuple(vec![Literal::from("a"), Literal::empty_dict()]);
        assert_eq!(Key::try_from(nested.clone()), Err(nested));
    }

    #[test]
    fn into_dict_returns_non_dicts_unchanged() {
        let value = Literal::from("text");
        assert_eq!(value.clone().into_dict(), Err(value));
        assert!(Literal::empty_dict().into_dict().is_ok());
    }

    #[test]
    fn option_converts_to_none() {
        assert_eq!(Literal::from(None::<i64>), Literal::None);
        assert_eq!(Literal::from(Some(3_i64)), Literal::Int(3));
    }
}
