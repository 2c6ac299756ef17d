//! Phase 2: Block Parser
//!
//! The block parser walks the scan lines by indentation and builds the
//! document tree. It handles:
//! - Block mappings (`key: value`, values nested by deeper indentation)
//! - Block sequences (`- item`), indented under a key or level with it
//! - Compact nesting (`- key: value`, `- - item`)
//!
//! Single-line values are handed to the inline parser.

use crate::error::{ParseError, ParseErrorKind};
use crate::inline::{parse_inline, quoted_key};
use crate::node::{Mapping, Node};
use crate::scanner::ScanLine;

type Result<T> = std::result::Result<T, ParseError>;

/// Parse scan lines into a single document node.
pub fn parse_document(lines: Vec<ScanLine>) -> Result<Node> {
    let mut parser = Parser { lines, pos: 0 };

    let Some(root_indent) = parser.peek().map(|l| l.indent) else {
        return Ok(Node::Null);
    };

    let node = parser.parse_block(root_indent)?;

    if let Some(line) = parser.peek() {
        let kind = if line.indent == root_indent {
            ParseErrorKind::ExtraContent
        } else {
            ParseErrorKind::BadIndentation
        };
        return Err(kind.at(line.line_num, line.indent));
    }

    Ok(node)
}

/// A mapping key split off the front of a line.
struct Key {
    name: String,
    /// Text after the `:`, with leading spaces removed.
    rest: String,
    /// Column where `rest` starts.
    rest_col: usize,
}

/// Returns `true` if the line is a block sequence item.
fn is_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Split `key: rest` if the line is a mapping entry.
fn split_key(line: &ScanLine) -> Result<Option<Key>> {
    let text = line.text.as_str();

    let (name, after) = match text.chars().next() {
        Some('"' | '\'') => {
            let (name, len) = quoted_key(text, line.line_num, line.indent)?;
            let tail = &text[len..];
            let trimmed = tail.trim_start_matches(' ');
            if !is_separator(trimmed, 0) {
                return Ok(None);
            }
            (name, len + (tail.len() - trimmed.len()))
        }
        Some('[' | '{') | None => return Ok(None),
        Some(_) => {
            let Some(colon) = text
                .char_indices()
                .find(|&(i, c)| c == ':' && is_separator(text, i))
                .map(|(i, _)| i)
            else {
                return Ok(None);
            };
            let name = text[..colon].trim_end();
            if name.is_empty() {
                return Err(ParseErrorKind::ExpectedKey.at(line.line_num, line.indent));
            }
            (name.to_string(), colon)
        }
    };

    // `after` points at the ':'.
    let rest = &text[after + 1..];
    let trimmed = rest.trim_start_matches(' ');
    Ok(Some(Key {
        name,
        rest: trimmed.to_string(),
        rest_col: line.indent + after + 1 + (rest.len() - trimmed.len()),
    }))
}

/// A `:` at byte `i` separates key from value when followed by a space or
/// the end of the line.
fn is_separator(text: &str, i: usize) -> bool {
    let bytes = text.as_bytes();
    bytes.get(i) == Some(&b':') && matches!(bytes.get(i + 1), None | Some(b' '))
}

struct Parser {
    lines: Vec<ScanLine>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&ScanLine> {
        self.lines.get(self.pos)
    }

    /// Parse the block starting at the current line, which sits at `indent`.
    fn parse_block(&mut self, indent: usize) -> Result<Node> {
        let line = &self.lines[self.pos];

        if is_item(&line.text) {
            return self.parse_sequence(indent);
        }
        if split_key(line)?.is_some() {
            return self.parse_mapping(indent);
        }

        let node = parse_inline(&line.text, line.line_num, line.indent)?;
        self.pos += 1;
        self.expect_no_deeper(indent)?;
        Ok(node)
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Node> {
        let mut mapping = Mapping::new();

        while let Some(line) = self.peek() {
            if line.indent != indent || is_item(&line.text) {
                break;
            }
            let line_num = line.line_num;
            let key = split_key(line)?
                .ok_or_else(|| ParseErrorKind::ExpectedKey.at(line_num, indent))?;
            if mapping.contains_key(&key.name) {
                return Err(ParseErrorKind::DuplicateKey(key.name).at(line_num, indent));
            }
            self.pos += 1;

            let value = if key.rest.is_empty() {
                match self.peek().map(|next| (next.indent, is_item(&next.text))) {
                    Some((next_indent, _)) if next_indent > indent => {
                        self.parse_block(next_indent)?
                    }
                    Some((next_indent, true)) if next_indent == indent => {
                        self.parse_sequence(indent)?
                    }
                    _ => Node::Null,
                }
            } else {
                parse_inline(&key.rest, line_num, key.rest_col)?
            };
            self.expect_no_deeper(indent)?;

            mapping.insert(key.name, value);
        }

        Ok(Node::Mapping(mapping))
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Node> {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent != indent || !is_item(&line.text) {
                break;
            }

            let after_dash = &line.text[1..];
            let content = after_dash.trim_start_matches(' ');

            if content.is_empty() {
                self.pos += 1;
                let item = match self.peek().map(|next| next.indent) {
                    Some(next_indent) if next_indent > indent => self.parse_block(next_indent)?,
                    _ => Node::Null,
                };
                items.push(item);
            } else {
                // Re-read the rest of the line as a block at its own column, so
                // `- key: a` followed by `  key2: b` continues one mapping.
                let child_indent = indent + 1 + (after_dash.len() - content.len());
                let content = content.to_string();
                let line = &mut self.lines[self.pos];
                line.text = content;
                line.indent = child_indent;
                items.push(self.parse_block(child_indent)?);
            }
            self.expect_no_deeper(indent)?;
        }

        Ok(Node::Sequence(items))
    }

    /// After an entry at `indent`, the next line must not be indented deeper.
    fn expect_no_deeper(&self, indent: usize) -> Result<()> {
        match self.peek() {
            Some(next) if next.indent > indent => {
                Err(ParseErrorKind::BadIndentation.at(next.line_num, next.indent))
            }
            _ => Ok(()),
        }
    }
}
