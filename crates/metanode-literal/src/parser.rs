//! Literal parser
//!
//! Text is parsed with the tree-sitter Python grammar and the syntax tree is
//! walked into a [`Literal`]. Only literal expressions are accepted. The
//! forms left behind by older writers (`u'...'` prefixes, `10L` longs) are
//! part of that grammar; their values are decoded here.

use crate::error::LiteralError;
use crate::value::{Dict, Key, Literal};
use std::iter::Peekable;
use std::str::CharIndices;
use tree_sitter::{Node, Parser, Tree};

/// Maximum container nesting accepted before giving up
pub const MAX_DEPTH: usize = 256;

/// Parse a complete literal from `text`
///
/// Leading and trailing whitespace and `#` comments are ignored.
///
/// # Errors
/// Returns [`LiteralError`] if `text` is empty or is not exactly one
/// well-formed literal.
pub fn parse(text: &str) -> Result<Literal, LiteralError> {
    // leading indentation would open an indented block
    let base = text.len() - text.trim_start().len();
    let source = &text[base..];
    if source.is_empty() {
        return Err(LiteralError::UnexpectedEnd { offset: text.len() });
    }

    let tree = parse_tree(source)?;
    TreeWalker { text, base }.module(tree.root_node())
}

fn parse_tree(source: &str) -> Result<Tree, LiteralError> {
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| LiteralError::Parser(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| LiteralError::Parser("parse did not complete".to_string()))
}

/// Named children that are not comments or line continuations
fn significant_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

/// First `ERROR` or `MISSING` node in document order
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// Converts syntax nodes of `text[base..]` into literals
struct TreeWalker<'t> {
    text: &'t str,
    base: usize,
}

impl TreeWalker<'_> {
    fn offset(&self, node: Node<'_>) -> usize {
        self.base + node.start_byte()
    }

    fn source(&self, node: Node<'_>) -> &str {
        &self.text[self.base + node.start_byte()..self.base + node.end_byte()]
    }

    /// Next non-whitespace character at or after `from`
    fn next_token(&self, from: usize) -> (usize, Option<char>) {
        let rest = &self.text[from..];
        let trimmed = rest.trim_start();
        (from + rest.len() - trimmed.len(), trimmed.chars().next())
    }

    fn syntax_error(&self, node: Node<'_>) -> LiteralError {
        let in_string = node.kind() == "string_end"
            || node.parent().is_some_and(|parent| parent.kind() == "string");
        if in_string {
            let start = node.parent().unwrap_or(node);
            return LiteralError::UnterminatedString {
                offset: self.offset(start),
            };
        }
        match self.next_token(self.offset(node)) {
            (offset, Some(found)) => LiteralError::UnexpectedChar { offset, found },
            (offset, None) => LiteralError::UnexpectedEnd { offset },
        }
    }

    fn trailing(&self, after: Node<'_>) -> LiteralError {
        match self.next_token(self.base + after.end_byte()) {
            (offset, Some(found)) => LiteralError::TrailingInput { offset, found },
            (offset, None) => LiteralError::UnexpectedEnd { offset },
        }
    }

    /// The module must hold exactly one expression statement
    fn module(&self, root: Node<'_>) -> Result<Literal, LiteralError> {
        if let Some(node) = first_error(root) {
            return Err(self.syntax_error(node));
        }

        let statements = significant_children(root);
        let Some(&statement) = statements.first() else {
            return Err(LiteralError::UnexpectedEnd {
                offset: self.text.len(),
            });
        };
        if statements.len() > 1 {
            return Err(self.trailing(statement));
        }
        if statement.kind() != "expression_statement" {
            return Err(LiteralError::Unsupported {
                offset: self.offset(statement),
                what: statement.kind(),
            });
        }

        let expressions = significant_children(statement);
        let Some(&expression) = expressions.first() else {
            return Err(LiteralError::UnexpectedEnd {
                offset: self.text.len(),
            });
        };
        if expressions.len() > 1 {
            return Err(self.trailing(expression));
        }
        self.value(expression, 0)
    }

    fn value(&self, node: Node<'_>, depth: usize) -> Result<Literal, LiteralError> {
        let offset = self.offset(node);
        if depth > MAX_DEPTH {
            return Err(LiteralError::TooDeep {
                offset,
                limit: MAX_DEPTH,
            });
        }

        match node.kind() {
            "none" => Ok(Literal::None),
            "true" => Ok(Literal::Bool(true)),
            "false" => Ok(Literal::Bool(false)),
            "integer" => integer(self.source(node), offset, false),
            "float" => float(self.source(node), offset, false),
            "identifier" => special_float(self.source(node), offset, false),
            "unary_operator" => self.signed(node),
            "string" => self.string(node).map(Literal::Str),
            "concatenated_string" => {
                let mut out = String::new();
                for part in significant_children(node) {
                    out.push_str(&self.string(part)?);
                }
                Ok(Literal::Str(out))
            }
            "parenthesized_expression" => {
                let inner = significant_children(node)
                    .first()
                    .copied()
                    .ok_or(LiteralError::UnexpectedEnd { offset })?;
                self.value(inner, depth + 1)
            }
            "list" => self.items(node, depth).map(Literal::List),
            "tuple" => self.items(node, depth).map(Literal::Tuple),
            "dictionary" => self.dict(node, depth),
            other => Err(LiteralError::Unsupported { offset, what: other }),
        }
    }

    /// Sign applied to a numeric literal, `-inf` and `-nan` included
    fn signed(&self, node: Node<'_>) -> Result<Literal, LiteralError> {
        let offset = self.offset(node);
        let negative = match node.child_by_field_name("operator").map(|op| op.kind()) {
            Some("-") => true,
            Some("+") => false,
            _ => {
                return Err(LiteralError::Unsupported {
                    offset,
                    what: "unary_operator",
                })
            }
        };
        let invalid = || LiteralError::InvalidNumber {
            offset,
            text: self.source(node).to_string(),
        };

        let argument = node.child_by_field_name("argument").ok_or_else(invalid)?;
        let text = self.source(argument);
        match argument.kind() {
            "integer" => integer(text, offset, negative),
            "float" => float(text, offset, negative),
            "identifier" => special_float(text, self.offset(argument), negative),
            _ => Err(invalid()),
        }
    }

    fn string(&self, node: Node<'_>) -> Result<String, LiteralError> {
        let offset = self.offset(node);
        if node.kind() != "string" {
            return Err(LiteralError::Unsupported {
                offset,
                what: node.kind(),
            });
        }
        decode_string(self.source(node), offset)
    }

    fn items(&self, node: Node<'_>, depth: usize) -> Result<Vec<Literal>, LiteralError> {
        significant_children(node)
            .into_iter()
            .map(|item| self.value(item, depth + 1))
            .collect()
    }

    fn dict(&self, node: Node<'_>, depth: usize) -> Result<Literal, LiteralError> {
        let mut map = Dict::new();
        for pair in significant_children(node) {
            if pair.kind() != "pair" {
                return Err(LiteralError::Unsupported {
                    offset: self.offset(pair),
                    what: pair.kind(),
                });
            }
            let (Some(key_node), Some(value_node)) = (
                pair.child_by_field_name("key"),
                pair.child_by_field_name("value"),
            ) else {
                return Err(self.syntax_error(pair));
            };

            let key = self.value(key_node, depth + 1)?;
            let key = Key::try_from(key).map_err(|rejected| LiteralError::UnhashableKey {
                offset: self.offset(key_node),
                kind: rejected.type_name(),
            })?;
            let value = self.value(value_node, depth + 1)?;
            map.insert(key, value);
        }
        Ok(Literal::Dict(map))
    }
}

fn integer(text: &str, offset: usize, negative: bool) -> Result<Literal, LiteralError> {
    let invalid = || LiteralError::InvalidNumber {
        offset,
        text: text.to_string(),
    };
    let overflow = || LiteralError::IntegerOverflow {
        offset,
        text: text.to_string(),
    };

    let body = match text.as_bytes().last().copied() {
        Some(b'j' | b'J') => {
            return Err(LiteralError::Unsupported {
                offset,
                what: "complex",
            })
        }
        // legacy long suffix
        Some(b'l' | b'L') => &text[..text.len() - 1],
        _ => text,
    };
    let body = body.replace('_', "").to_ascii_lowercase();
    let (radix, digits) = if let Some(digits) = body.strip_prefix("0x") {
        (16, digits)
    } else if let Some(digits) = body.strip_prefix("0o") {
        (8, digits)
    } else if let Some(digits) = body.strip_prefix("0b") {
        (2, digits)
    } else {
        (10, body.as_str())
    };
    if digits.is_empty() {
        return Err(invalid());
    }

    let magnitude = u128::from_str_radix(digits, radix).map_err(|_| {
        if digits.chars().all(|c| c.is_digit(radix)) {
            overflow()
        } else {
            invalid()
        }
    })?;
    let signed = if negative {
        i128::try_from(magnitude).map(|m| -m)
    } else {
        i128::try_from(magnitude)
    };
    signed
        .ok()
        .and_then(|v| i64::try_from(v).ok())
        .map(Literal::Int)
        .ok_or_else(overflow)
}

fn float(text: &str, offset: usize, negative: bool) -> Result<Literal, LiteralError> {
    let invalid = || LiteralError::InvalidNumber {
        offset,
        text: text.to_string(),
    };
    match text.as_bytes().last().copied() {
        Some(b'j' | b'J') => {
            return Err(LiteralError::Unsupported {
                offset,
                what: "complex",
            })
        }
        Some(b'l' | b'L') => return Err(invalid()),
        _ => {}
    }

    let x: f64 = text.replace('_', "").parse().map_err(|_| invalid())?;
    Ok(Literal::Float(if negative { -x } else { x }))
}

/// `inf` and `nan` as written by repr; any other bare name is rejected
fn special_float(name: &str, offset: usize, negative: bool) -> Result<Literal, LiteralError> {
    let x = match name {
        "inf" => f64::INFINITY,
        "nan" => f64::NAN,
        _ => {
            return Err(LiteralError::UnknownName {
                offset,
                name: name.to_string(),
            })
        }
    };
    Ok(Literal::Float(if negative { -x } else { x }))
}

/// Decode a string token: prefix, quotes and escapes
fn decode_string(token: &str, offset: usize) -> Result<String, LiteralError> {
    let quote_at = token
        .find(|c| c == '\'' || c == '"')
        .ok_or(LiteralError::UnterminatedString { offset })?;
    let prefix = token[..quote_at].to_ascii_lowercase();
    if prefix.contains('b') {
        return Err(LiteralError::Unsupported {
            offset,
            what: "bytes",
        });
    }
    if prefix.contains('f') {
        return Err(LiteralError::Unsupported {
            offset,
            what: "formatted string",
        });
    }

    let quoted = &token[quote_at..];
    let quote = if quoted.starts_with("'''") || quoted.starts_with("\"\"\"") {
        &quoted[..3]
    } else {
        &quoted[..1]
    };
    let body = quoted
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
        .ok_or(LiteralError::UnterminatedString { offset })?;

    if prefix.contains('r') {
        Ok(body.to_string())
    } else {
        unescape(body, offset + quote_at + quote.len())
    }
}

type Chars<'a> = Peekable<CharIndices<'a>>;

/// Resolve backslash escapes; unknown escapes are kept verbatim
fn unescape(body: &str, body_offset: usize) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escape_at = body_offset + i;
        let Some((_, escaped)) = chars.next() else {
            out.push('\\');
            break;
        };

        match escaped {
            '\n' => {}
            '\r' => {
                chars.next_if(|&(_, c)| c == '\n');
            }
            '\\' | '\'' | '"' => out.push(escaped),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match chars.next_if(|&(_, d)| d.is_digit(8)) {
                        Some((_, d)) => code = code * 8 + d.to_digit(8).unwrap_or_default(),
                        None => break,
                    }
                }
                out.push(code_point(escape_at, code)?);
            }
            'x' => {
                let code = hex_digits(&mut chars, escape_at, 2)?;
                out.push(code_point(escape_at, code)?);
            }
            'u' => {
                let high = hex_digits(&mut chars, escape_at, 4)?;
                // surrogate pairs written by narrow-unicode builds
                if (0xD800..0xDC00).contains(&high) {
                    if let Some((low, rest)) = low_surrogate(&chars, escape_at) {
                        chars = rest;
                        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        out.push(code_point(escape_at, combined)?);
                        continue;
                    }
                }
                out.push(code_point(escape_at, high)?);
            }
            'U' => {
                let code = hex_digits(&mut chars, escape_at, 8)?;
                out.push(code_point(escape_at, code)?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

/// `\uDCxx` following a high surrogate, with the position after it
fn low_surrogate<'a>(chars: &Chars<'a>, escape_at: usize) -> Option<(u32, Chars<'a>)> {
    let mut ahead = chars.clone();
    ahead.next_if(|&(_, c)| c == '\\')?;
    ahead.next_if(|&(_, c)| c == 'u')?;
    let low = hex_digits(&mut ahead, escape_at, 4).ok()?;
    (0xDC00..0xE000).contains(&low).then_some((low, ahead))
}

fn hex_digits(chars: &mut Chars<'_>, escape_at: usize, count: usize) -> Result<u32, LiteralError> {
    let mut code = 0u32;
    for _ in 0..count {
        let digit = chars
            .next_if(|&(_, c)| c.is_ascii_hexdigit())
            .and_then(|(_, c)| c.to_digit(16))
            .ok_or_else(|| LiteralError::InvalidEscape {
                offset: escape_at,
                reason: format!("expected {count} hex digits"),
            })?;
        code = code * 16 + digit;
    }
    Ok(code)
}

fn code_point(escape_at: usize, code: u32) -> Result<char, LiteralError> {
    char::from_u32(code).ok_or_else(|| LiteralError::InvalidEscape {
        offset: escape_at,
        reason: format!("invalid code point {code:#x}"),
    })
}
