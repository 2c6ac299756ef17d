//! JSON transcoding: convert between document nodes and JSON text.
//!
//! Mapping from JSON to nodes:
//!   - JSON null           -> Node::Null
//!   - JSON bool, number   -> Node::Scalar (printed text)
//!   - JSON string         -> Node::Scalar
//!   - JSON array          -> Node::Sequence
//!   - JSON object         -> Node::Mapping (key order preserved)
//!
//! Mapping from nodes to JSON:
//!   - Node::Null          -> JSON null
//!   - Node::Scalar        -> JSON bool, then integer, then float, else string
//!   - Node::Sequence      -> JSON array
//!   - Node::Mapping       -> JSON object
//!
//! Lossy edges:
//!   - Scalars are untyped, so the JSON string "true" comes back as a bool.
//!   - `.inf`, `-.inf` and `.nan` have no JSON form and are written as null.

use anyhow::{Context, Result};
use libpolyaml::{Node, Yaml};

/// Decode JSON text into a document node.
pub fn decode(input: &str) -> Result<Node> {
    let value: serde_json::Value = serde_json::from_str(input).context("JSON parse error")?;
    Ok(Yaml::default().to_node(&value)?)
}

/// Encode a document node as pretty-printed JSON text.
pub fn encode(node: &Node) -> Result<String> {
    let value: serde_json::Value = Yaml::default().from_node(node.clone())?;
    let mut output = serde_json::to_string_pretty(&value).context("JSON encode error")?;
    output.push('\n');
    Ok(output)
}
