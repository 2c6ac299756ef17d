//! Emit document nodes as canonical text.
//!
//! Canonical form is block style with two-space indentation. Sequences are
//! indented under their key, empty collections are written `[]` and `{}`,
//! and scalars are double-quoted only when the plain form would not read
//! back as the same scalar.

use crate::inline::is_null_marker;
use crate::node::{Mapping, Node};

/// Emit a node as canonical text, ending in a newline.
pub fn emit(node: &Node) -> String {
    let mut out = String::new();
    if is_block(node) {
        emit_block(node, 0, &mut out);
    } else {
        out.push_str(&emit_inline(node));
        out.push('\n');
    }
    out
}

/// Non-empty collections take their own lines; everything else fits after a
/// key or a dash.
fn is_block(node: &Node) -> bool {
    match node {
        Node::Mapping(m) => !m.is_empty(),
        Node::Sequence(items) => !items.is_empty(),
        _ => false,
    }
}

fn emit_inline(node: &Node) -> String {
    match node {
        Node::Null => "null".to_string(),
        Node::Scalar(s) => encode_scalar(s),
        Node::Sequence(_) => "[]".to_string(),
        Node::Mapping(_) => "{}".to_string(),
    }
}

fn emit_block(node: &Node, indent: usize, out: &mut String) {
    match node {
        Node::Mapping(m) => emit_mapping(m, indent, out),
        Node::Sequence(items) => emit_sequence(items, indent, out),
        other => {
            out.push_str(&" ".repeat(indent));
            out.push_str(&emit_inline(other));
            out.push('\n');
        }
    }
}

fn emit_mapping(mapping: &Mapping, indent: usize, out: &mut String) {
    let pad = " ".repeat(indent);
    for (key, value) in mapping {
        out.push_str(&pad);
        out.push_str(&encode_scalar(key));
        out.push(':');
        if is_block(value) {
            out.push('\n');
            emit_block(value, indent + 2, out);
        } else {
            out.push(' ');
            out.push_str(&emit_inline(value));
            out.push('\n');
        }
    }
}

fn emit_sequence(items: &[Node], indent: usize, out: &mut String) {
    let pad = " ".repeat(indent);
    for item in items {
        out.push_str(&pad);
        out.push_str("- ");
        if is_block(item) {
            // The nested block's first line moves up next to the dash.
            let mut child = String::new();
            emit_block(item, indent + 2, &mut child);
            out.push_str(&child[indent + 2..]);
        } else {
            out.push_str(&emit_inline(item));
            out.push('\n');
        }
    }
}

/// Write a scalar or key plain when possible, double-quoted otherwise.
pub(crate) fn encode_scalar(s: &str) -> String {
    if needs_quotes(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

fn needs_quotes(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return true;
    };
    if is_null_marker(s) || s.starts_with("---") || s.starts_with("...") {
        return true;
    }
    if first.is_whitespace() || s.ends_with(char::is_whitespace) {
        return true;
    }
    let indicator = match first {
        '-' => s == "-" || s.starts_with("- "),
        '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\''
        | '"' | '%' | '@' | '`' => true,
        _ => false,
    };
    indicator
        || s.contains(": ")
        || s.contains(" #")
        || s.ends_with(':')
        || s.chars().any(|c| c.is_control() || c == '\u{FEFF}')
}

fn quote(s: &str) -> String {
    let mut result = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            c if (c as u32) < 0x100 && c.is_control() => {
                result.push_str(&format!("\\x{:02X}", c as u32));
            }
            c if c.is_control() || c == '\u{FEFF}' => {
                result.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}
