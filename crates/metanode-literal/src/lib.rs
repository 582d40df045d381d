//! Metanode Literal Notation
//!
//! The textual format node metadata is stored in: the literal subset of the
//! host scripting environment, as written by its `repr`.
//!
//! # Overview
//!
//! - **Literal**: closed value model (scalars, lists, tuples, dicts)
//! - **Key**: hashable subset of literals usable as dict keys
//! - **parse**: text → [`Literal`] over the tree-sitter Python grammar,
//!   tolerant of legacy writer output
//! - **Display**: [`Literal`] → repr-style text
//!
//! # Example
//!
//! ```rust
//! use metanode_literal::{parse, Literal};
//!
//! let value = parse("['x', {'a': 1}, ('y', 'z')]").unwrap();
//! assert!(matches!(value, Literal::List(_)));
//! assert_eq!(value.to_string(), "['x', {'a': 1}, ('y', 'z')]");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod parser;
pub mod render;
pub mod value;

// Re-exports
pub use error::LiteralError;
pub use parser::{parse, MAX_DEPTH};
pub use render::write_str_repr;
pub use value::{Dict, Key, Literal};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
