//! A YAML subset serializer that writes struct fields and enum values under
//! a naming convention, and reads abstract types back by a discriminant
//! field.
//!
//! # Parsing Pipeline
//!
//! Text becomes a typed value in three phases:
//!
//! 1. **Scanner**: Splits source text into scan lines, dropping comments and
//!    blank lines and measuring indentation.
//!
//! 2. **Block Parser**: Builds a [`Node`] tree from the scan lines by
//!    indentation, handing single-line values to the inline parser.
//!
//! 3. **Binding**: Walks the node tree with serde, matching field names under
//!    the naming convention, transcoding enums, and resolving registered
//!    unions.
//!
//! Serializing runs the other way: serde builds a [`Node`] tree, which is
//! emitted as canonical block-style text.

mod de;
mod emit;
mod error;
mod inline;
mod naming;
mod node;
mod parser;
mod scanner;
mod ser;
mod transcode;
mod union;
mod yaml;

pub use emit::emit;
pub use error::{Error, ParseError, ParseErrorKind, RegistryError, Result};
pub use naming::{Camel, Hyphenated, LowerCase, NamingConvention, Pascal, Underscored, Verbatim};
pub use node::{Mapping, Node};
pub use transcode::{EnumDescriptor, EnumTranscoder};
pub use union::{ResolutionPolicy, UnionDescriptor, Variant};
pub use yaml::{Yaml, YamlBuilder};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parse a document into its untyped node tree.
///
/// # Example
///
/// ```
/// use libpolyaml::{parse, Node};
///
/// let node = parse("mode: rule\n").unwrap();
/// assert_eq!(node.as_mapping().unwrap().get("mode"), Some(&Node::from("rule")));
/// ```
pub fn parse(input: &str) -> std::result::Result<Node, ParseError> {
    // Phase 1: Scan source into lines
    let lines = scanner::scan(input)?;

    // Phase 2: Build the node tree
    parser::parse_document(lines).map_err(|e| scanner::char_column(input, e))
}

/// Serialize with the default configuration.
pub fn to_string<T: ?Sized + Serialize>(value: &T) -> Result<String> {
    Yaml::default().serialize(value)
}

/// Deserialize with the default configuration.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    Yaml::default().deserialize(input)
}
