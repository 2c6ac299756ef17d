//! Conversions between document text formats.

pub mod json;

use anyhow::Result;
use clap::ValueEnum;
use libpolyaml::{emit, parse, Node};

/// Text formats the tool reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
        }
    }
}

/// Read `input` in `format` into a document node.
pub fn decode(input: &str, format: Format) -> Result<Node> {
    match format {
        Format::Yaml => Ok(parse(input)?),
        Format::Json => json::decode(input),
    }
}

/// Write a document node in `format`.
pub fn encode(node: &Node, format: Format) -> Result<String> {
    match format {
        Format::Yaml => Ok(emit(node)),
        Format::Json => json::encode(node),
    }
}
