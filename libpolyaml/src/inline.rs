//! Single-line values: quoted and plain scalars, and flow collections.

use crate::error::{ParseError, ParseErrorKind};
use crate::node::{Mapping, Node};

type Result<T> = std::result::Result<T, ParseError>;

/// Returns `true` for the plain scalars that mean null.
pub(crate) fn is_null_marker(s: &str) -> bool {
    matches!(s, "null" | "Null" | "NULL" | "~")
}

/// Parse the value part of a line that starts at `col` on `line`.
pub(crate) fn parse_inline(text: &str, line: usize, col: usize) -> Result<Node> {
    let mut cur = Cursor::new(text, line, col);
    let node = match cur.peek() {
        Some('[' | '{') => cur.flow_node()?,
        Some('"') => Node::Scalar(cur.double_quoted()?),
        Some('\'') => Node::Scalar(cur.single_quoted()?),
        _ => {
            check_plain(text, line, col)?;
            return Ok(plain_node(text));
        }
    };
    cur.skip_spaces();
    if !cur.at_end() {
        return Err(cur.error(ParseErrorKind::ExtraContent));
    }
    Ok(node)
}

/// Parse a quoted key at the start of `text`. Returns the key and the byte
/// length it occupies.
pub(crate) fn quoted_key(text: &str, line: usize, col: usize) -> Result<(String, usize)> {
    let mut cur = Cursor::new(text, line, col);
    let key = match cur.peek() {
        Some('"') => cur.double_quoted()?,
        _ => cur.single_quoted()?,
    };
    Ok((key, cur.pos))
}

fn plain_node(s: &str) -> Node {
    if is_null_marker(s) {
        Node::Null
    } else {
        Node::Scalar(s.to_string())
    }
}

/// Reject plain scalars that would need YAML features outside the subset.
fn check_plain(s: &str, line: usize, col: usize) -> Result<()> {
    let unsupported = match s.chars().next() {
        Some('&') => Some("Anchors"),
        Some('*') => Some("Aliases"),
        Some('!') => Some("Tags"),
        Some('|' | '>') => Some("Block scalars"),
        _ => None,
    };
    if let Some(feature) = unsupported {
        return Err(ParseErrorKind::Unsupported(feature).at(line, col));
    }
    if s.starts_with("? ") || s == "?" {
        return Err(ParseErrorKind::Unsupported("Complex keys").at(line, col));
    }
    // Block sequence entries cannot start inside a value.
    if s == "-" || s.starts_with("- ") {
        return Err(ParseErrorKind::UnexpectedChar('-').at(line, col));
    }
    if let Some(c @ ('@' | '`' | ']' | '}' | ',')) = s.chars().next() {
        return Err(ParseErrorKind::UnexpectedChar(c).at(line, col));
    }
    // A nested "key: value" cannot share a line with its parent's key.
    if let Some(i) = s.find(": ") {
        return Err(ParseErrorKind::UnexpectedChar(':').at(line, col + i));
    }
    if s.ends_with(':') {
        return Err(ParseErrorKind::UnexpectedChar(':').at(line, col + s.len() - 1));
    }
    Ok(())
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, line: usize, col: usize) -> Self {
        Self {
            text,
            pos: 0,
            line,
            col,
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        kind.at(self.line, self.col + self.pos)
    }

    fn error_at(&self, kind: ParseErrorKind, pos: usize) -> ParseError {
        kind.at(self.line, self.col + pos)
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    fn double_quoted(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(ParseErrorKind::UnterminatedString, start)),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escape_pos = self.pos - 1;
                    let c = self
                        .bump()
                        .ok_or_else(|| self.error_at(ParseErrorKind::UnterminatedString, start))?;
                    let decoded = match c {
                        '\\' => '\\',
                        '"' => '"',
                        '/' => '/',
                        ' ' => ' ',
                        '0' => '\0',
                        'a' => '\x07',
                        'b' => '\x08',
                        't' | '\t' => '\t',
                        'n' => '\n',
                        'v' => '\x0b',
                        'f' => '\x0c',
                        'r' => '\r',
                        'e' => '\x1b',
                        'N' => '\u{85}',
                        '_' => '\u{a0}',
                        'x' => self.hex_escape(2, escape_pos)?,
                        'u' => self.hex_escape(4, escape_pos)?,
                        'U' => self.hex_escape(8, escape_pos)?,
                        other => {
                            return Err(
                                self.error_at(ParseErrorKind::InvalidEscape(other), escape_pos)
                            )
                        }
                    };
                    out.push(decoded);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize, escape_pos: usize) -> Result<char> {
        let end = self.pos + digits;
        let hex = self
            .text
            .get(self.pos..end)
            .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.error_at(ParseErrorKind::BadUnicodeEscape, escape_pos))?;
        let cp = u32::from_str_radix(hex, 16)
            .map_err(|_| self.error_at(ParseErrorKind::BadUnicodeEscape, escape_pos))?;
        let c = char::from_u32(cp)
            .ok_or_else(|| self.error_at(ParseErrorKind::BadUnicodeEscape, escape_pos))?;
        self.pos = end;
        Ok(c)
    }

    fn single_quoted(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(ParseErrorKind::UnterminatedString, start)),
                Some('\'') => {
                    if self.peek() == Some('\'') {
                        self.bump();
                        out.push('\'');
                    } else {
                        return Ok(out);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn flow_node(&mut self) -> Result<Node> {
        self.skip_spaces();
        match self.peek() {
            Some('[') => self.flow_sequence(),
            Some('{') => self.flow_mapping(),
            Some('"') => Ok(Node::Scalar(self.double_quoted()?)),
            Some('\'') => Ok(Node::Scalar(self.single_quoted()?)),
            _ => self.flow_plain(&[',', ']', '}']),
        }
    }

    fn flow_plain(&mut self, stops: &[char]) -> Result<Node> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) || matches!(c, '[' | '{') {
                break;
            }
            self.bump();
        }
        let s = self.text[start..self.pos].trim_end();
        match s.chars().next() {
            None => match self.peek() {
                Some(c) => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
                None => Err(self.error(ParseErrorKind::ExtraContent)),
            },
            Some(_) => {
                check_plain(s, self.line, self.col + start)?;
                Ok(plain_node(s))
            }
        }
    }

    fn flow_sequence(&mut self) -> Result<Node> {
        let open = self.pos;
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_spaces();
            match self.peek() {
                None => return Err(self.error_at(ParseErrorKind::UnclosedFlow('['), open)),
                Some(']') => {
                    self.bump();
                    return Ok(Node::Sequence(items));
                }
                Some(_) => {
                    items.push(self.flow_node()?);
                    self.flow_separator(']', open)?;
                }
            }
        }
    }

    fn flow_mapping(&mut self) -> Result<Node> {
        let open = self.pos;
        self.bump();
        let mut mapping = Mapping::new();
        loop {
            self.skip_spaces();
            let key_pos = self.pos;
            let key = match self.peek() {
                None => return Err(self.error_at(ParseErrorKind::UnclosedFlow('{'), open)),
                Some('}') => {
                    self.bump();
                    return Ok(Node::Mapping(mapping));
                }
                Some('"') => self.double_quoted()?,
                Some('\'') => self.single_quoted()?,
                Some(_) => match self.flow_plain(&[',', '}', ':'])? {
                    Node::Scalar(s) => s,
                    // Null markers used as keys keep their text.
                    _ => self.text[key_pos..self.pos].trim_end().to_string(),
                },
            };
            self.skip_spaces();
            let value = if self.peek() == Some(':') {
                self.bump();
                self.skip_spaces();
                match self.peek() {
                    Some(',' | '}') | None => Node::Null,
                    Some(_) => self.flow_node()?,
                }
            } else {
                Node::Null
            };
            if mapping.contains_key(&key) {
                return Err(self.error_at(ParseErrorKind::DuplicateKey(key), key_pos));
            }
            mapping.insert(key, value);
            self.flow_separator('}', open)?;
        }
    }

    /// Consume a `,` between entries, or stop before the closing bracket.
    fn flow_separator(&mut self, close: char, open: usize) -> Result<()> {
        self.skip_spaces();
        match self.peek() {
            Some(',') => {
                self.bump();
                Ok(())
            }
            Some(c) if c == close => Ok(()),
            Some(c) => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
            None => Err(self.error_at(ParseErrorKind::UnclosedFlow(if close == ']' {
                '['
            } else {
                '{'
            }), open)),
        }
    }
}
