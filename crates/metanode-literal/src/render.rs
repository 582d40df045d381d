//! Repr-style rendering
//!
//! `Display` for [`Literal`] and [`Key`] writes text in the form the host
//! scripting environment's `repr` produces, so stored values stay readable
//! and re-parseable by both sides.

use crate::value::{Key, Literal};
use std::fmt::{self, Display, Formatter, Write};

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write_float(f, *x),
            Self::Str(s) => write_str_repr(f, s),
            Self::List(items) => {
                f.write_char('[')?;
                write_items(f, items)?;
                f.write_char(']')
            }
            Self::Tuple(items) => write_tuple(f, items),
            Self::Dict(map) => {
                f.write_char('{')?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_char('}')
            }
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write_str_repr(f, s),
            Self::Tuple(items) => write_tuple(f, items),
        }
    }
}

fn write_items<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_tuple<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_char('(')?;
    write_items(f, items)?;
    // one-element tuples need the trailing comma to stay tuples
    if items.len() == 1 {
        f.write_char(',')?;
    }
    f.write_char(')')
}

/// Shortest round-trip form, always distinguishable from an int
fn write_float(f: &mut Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        // Debug keeps a `.0` on integral values and switches to
        // exponent notation for very large or small magnitudes
        write!(f, "{x:?}")
    }
}

/// Write `s` as a quoted string literal
///
/// Quote choice follows repr: single quotes unless the text contains a
/// single quote and no double quote.
pub fn write_str_repr<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    out.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if c == quote => {
                out.write_char('\\')?;
                out.write_char(c)?;
            }
            c if c.is_control() => {
                let code = u32::from(c);
                if code <= 0xff {
                    write!(out, "\\x{code:02x}")?;
                } else {
                    write!(out, "\\u{code:04x}")?;
                }
            }
            c => out.write_char(c)?,
        }
    }
    out.write_char(quote)
}
