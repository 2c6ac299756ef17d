//! Error types for polyaml.

use std::fmt::Display;
use thiserror::Error;

/// Result type for polyaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong while parsing a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Tab character used for indentation.
    #[error("Tab not allowed in indentation (use spaces)")]
    TabIndent,

    /// A line is indented to a level no enclosing block uses.
    #[error("Bad indentation")]
    BadIndentation,

    /// Quoted scalar without a closing quote on the same line.
    #[error("Unterminated string")]
    UnterminatedString,

    /// Unknown escape sequence in a double-quoted scalar.
    #[error("Invalid escape \"\\{0}\"")]
    InvalidEscape(char),

    /// Malformed `\x`, `\u` or `\U` escape.
    #[error("Bad Unicode escape")]
    BadUnicodeEscape,

    /// The same key appears twice in one mapping.
    #[error("Duplicate key \"{0}\"")]
    DuplicateKey(String),

    /// A mapping entry without a key.
    #[error("Expected mapping key")]
    ExpectedKey,

    /// Flow collection not closed on the same line.
    #[error("Unclosed \"{0}\"")]
    UnclosedFlow(char),

    /// Character that cannot appear at this position.
    #[error("Unexpected character \"{0}\"")]
    UnexpectedChar(char),

    /// Content left over after a complete value.
    #[error("Unexpected extra content")]
    ExtraContent,

    /// More than one `---` document in the stream.
    #[error("Multiple documents are not supported")]
    MultipleDocuments,

    /// YAML feature outside the supported subset.
    #[error("{0} are not supported")]
    Unsupported(&'static str),
}

impl ParseErrorKind {
    /// Attach a zero-based position to this error.
    pub fn at(self, line: usize, column: usize) -> ParseError {
        ParseError {
            kind: self,
            line,
            column,
        }
    }
}

/// Malformed input text. Positions are zero-based; the message shows them
/// one-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {}:{}", .line + 1, .column + 1)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

/// Configuration rejected while building a [`Yaml`](crate::Yaml).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same abstract type was registered twice.
    #[error("Union {0} is registered twice")]
    DuplicateUnion(String),

    /// A union without any variants can never resolve.
    #[error("Union {0} has no variants")]
    EmptyUnion(String),

    /// Two variants of one union would match the same mapping.
    #[error("Variants {first} and {second} of union {union} share discriminant {field}: {value}")]
    IndistinguishableVariants {
        union: String,
        first: String,
        second: String,
        field: String,
        value: String,
    },

    /// Two enum values transcode to the same text.
    #[error("Enum {type_name} writes both {first} and {second} as \"{name}\"")]
    DuplicateEnumName {
        type_name: String,
        first: String,
        second: String,
        name: String,
    },

    /// An enum value transcodes to blank text.
    #[error("Enum {type_name} cannot write {variant}: name is blank")]
    BlankEnumName { type_name: String, variant: String },

    /// The type handed to enum registration does not deserialize as an enum.
    #[error("{0} is not an enum")]
    NotAnEnum(&'static str),
}

/// Error type for serialization and deserialization.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Enum value whose transcoded name is empty or blank.
    #[error("Cannot write {type_name}::{variant} to yaml")]
    Encode { type_name: String, variant: String },

    /// Scalar that matches none of the enum's values.
    #[error("Value '{value}' not found in enum {type_name}")]
    Decode { type_name: String, value: String },

    /// Union-typed input that is not a mapping.
    #[error("Union {type_name} expects a mapping, found {found}")]
    UnionShape {
        type_name: String,
        found: &'static str,
    },

    /// No registered variant's discriminant matched. Carries the canonical
    /// text of the unmatched mapping.
    #[error("Could not find variant for type {type_name}")]
    UnionResolution { type_name: String, text: String },

    /// More than one variant matched under the unique-match policy.
    #[error("Ambiguous variants {variants:?} for type {type_name}")]
    UnionAmbiguity {
        type_name: String,
        variants: Vec<&'static str>,
        text: String,
    },

    /// Binding error raised through serde.
    #[error("{0}")]
    Message(String),
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
