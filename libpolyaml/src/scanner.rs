//! Phase 1: Scanner
//!
//! The scanner converts raw source text into scan lines. It performs:
//! - Whitespace validation (no tab indentation)
//! - Indentation counting
//! - Comment stripping (quote-aware)
//! - Blank line and document marker filtering

use crate::error::{ParseError, ParseErrorKind};

/// A single content line after the scanning phase.
#[derive(Debug, Clone)]
pub struct ScanLine {
    /// Content after indent, comments and trailing whitespace removed.
    pub text: String,
    /// Number of leading spaces, which is also the column of `text`.
    pub indent: usize,
    /// Zero-based line number for error reporting.
    pub line_num: usize,
}

/// Scan source text into content lines.
pub fn scan(source: &str) -> Result<Vec<ScanLine>, ParseError> {
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
    let mut lines = Vec::new();
    let mut seen_marker = false;

    for (line_num, raw) in source.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        let indent = count_indent(raw);
        let rest = &raw[indent..];

        // Whitespace-only lines carry no structure, tabs included.
        if rest.trim().is_empty() {
            continue;
        }
        if rest.starts_with('\t') {
            return Err(ParseErrorKind::TabIndent.at(line_num, indent));
        }

        let content = strip_comment(rest).trim_end();
        if content.is_empty() {
            continue;
        }

        if indent == 0 {
            if content == "---" {
                if seen_marker || !lines.is_empty() {
                    return Err(ParseErrorKind::MultipleDocuments.at(line_num, 0));
                }
                seen_marker = true;
                continue;
            }
            if content.starts_with('%') {
                return Err(ParseErrorKind::Unsupported("Directives").at(line_num, 0));
            }
        }

        lines.push(ScanLine {
            text: content.to_string(),
            indent,
            line_num,
        });
    }

    Ok(lines)
}

/// Convert an error's byte column to a character column on the same line.
pub fn char_column(source: &str, mut error: ParseError) -> ParseError {
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
    if let Some(prefix) = source
        .split('\n')
        .nth(error.line)
        .and_then(|raw| raw.get(..error.column))
    {
        error.column = prefix.chars().count();
    }
    error
}

/// Count the number of leading spaces in a line.
fn count_indent(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Cut the line at the first `#` that starts a comment.
///
/// A `#` starts a comment at the beginning of the content or after
/// whitespace, and never inside a quoted scalar. Quotes only open at the
/// start of a token, so apostrophes inside plain scalars are left alone.
fn strip_comment(rest: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut chars = rest.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') => match c {
                '\\' => {
                    chars.next();
                }
                '"' => quote = None,
                _ => {}
            },
            Some(_) => {
                if c == '\'' {
                    if matches!(chars.peek(), Some((_, '\''))) {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            None => {
                let at_token_start = matches!(prev, None | Some(' ' | '\t' | '[' | '{' | ','));
                match c {
                    '#' if matches!(prev, None | Some(' ' | '\t')) => return &rest[..i],
                    '"' | '\'' if at_token_start => quote = Some(c),
                    _ => {}
                }
            }
        }
        prev = Some(c);
    }

    rest
}
