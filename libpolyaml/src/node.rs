//! Document model: the untyped intermediate form between text and values.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// A parsed document node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Node {
    /// The null marker (`null`, `~`, or a missing value).
    #[default]
    Null,
    /// Scalar text. Scalars are untyped; binding decides what they mean.
    Scalar(String),
    /// Ordered list of nodes.
    Sequence(Vec<Node>),
    /// Ordered key/value pairs with unique keys.
    Mapping(Mapping),
}

impl Node {
    /// Returns `true` if this node is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Returns the scalar text if this is a `Scalar`.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Short name of the node's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Scalar(_) => "scalar",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::emit(self))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(s)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

impl From<Mapping> for Node {
    fn from(m: Mapping) -> Self {
        Node::Mapping(m)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Scalar(s) => serializer.serialize_str(s),
            Node::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Mapping(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Insertion-ordered mapping with unique string keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, Node)>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by exact key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert an entry. An existing key keeps its position and the old value
    /// is returned.
    pub fn insert(&mut self, key: String, value: Node) -> Option<Node> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert an entry ahead of all others. The key must not be present.
    pub(crate) fn push_front(&mut self, key: String, value: Node) {
        debug_assert!(!self.contains_key(&key));
        self.entries.insert(0, (key, value));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = &'a (String, Node);
    type IntoIter = std::slice::Iter<'a, (String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k.into(), v);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position_of_existing_key() {
        let mut m = Mapping::new();
        m.insert("a".into(), Node::from("1"));
        m.insert("b".into(), Node::from("2"));
        let old = m.insert("a".into(), Node::from("3"));
        assert_eq!(old, Some(Node::from("1")));
        assert_eq!(m.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(m.get("a"), Some(&Node::from("3")));
    }

    #[test]
    fn test_push_front() {
        let mut m: Mapping = [("b", Node::Null)].into_iter().collect();
        m.push_front("a".into(), Node::from("x"));
        assert_eq!(m.keys().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_node_serializes_as_itself() {
        let node = crate::parse("a: [1, ~]\nb: {c: d}\n").unwrap();
        assert_eq!(crate::Yaml::default().to_node(&node).unwrap(), node);
    }

    #[test]
    fn test_kind() {
        assert_eq!(Node::Null.kind(), "null");
        assert_eq!(Node::from("x").kind(), "scalar");
        assert_eq!(Node::Sequence(vec![]).kind(), "sequence");
        assert_eq!(Node::Mapping(Mapping::new()).kind(), "mapping");
    }
}
