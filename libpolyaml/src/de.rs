//! Deserialize values from document nodes.

use crate::error::{Error, Result};
use crate::node::{Mapping, Node};
use crate::yaml::Config;
use serde::de::{self, DeserializeSeed, IntoDeserializer, Unexpected, Visitor};
use std::vec;

pub(crate) struct Deserializer<'a> {
    node: Node,
    config: &'a Config,
    /// Mapping keys are always text when read without a target type.
    key: bool,
}

impl<'a> Deserializer<'a> {
    pub(crate) fn new(node: Node, config: &'a Config) -> Self {
        Self {
            node,
            config,
            key: false,
        }
    }

    fn key(key: String, config: &'a Config) -> Self {
        Self {
            node: Node::Scalar(key),
            config,
            key: true,
        }
    }

    fn invalid_type(&self, exp: &dyn de::Expected) -> Error {
        de::Error::invalid_type(unexpected(&self.node), exp)
    }
}

fn unexpected(node: &Node) -> Unexpected<'_> {
    match node {
        Node::Null => Unexpected::Unit,
        Node::Scalar(s) => Unexpected::Str(s),
        Node::Sequence(_) => Unexpected::Seq,
        Node::Mapping(_) => Unexpected::Map,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_u128(s: &str) -> Option<u128> {
    let s = s.strip_prefix('+').unwrap_or(s);
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(oct) = s.strip_prefix("0o") {
        (oct, 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u128::from_str_radix(digits, radix).ok()
}

fn parse_i128(s: &str) -> Option<i128> {
    match s.strip_prefix('-') {
        Some(rest) if rest.starts_with('+') => None,
        Some(rest) => {
            let magnitude = parse_u128(rest)?;
            if magnitude == i128::MAX as u128 + 1 {
                Some(i128::MIN)
            } else {
                i128::try_from(magnitude).ok().map(|m| -m)
            }
        }
        None => i128::try_from(parse_u128(s)?).ok(),
    }
}

fn parse_f64(s: &str) -> Option<f64> {
    match s {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => {
            // Rust's parser also takes `inf` and `NaN`, which are plain words here.
            let numeric = s.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
                && s.chars().any(|c| c.is_ascii_digit())
                && s.chars().all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
            if numeric {
                s.parse().ok()
            } else {
                None
            }
        }
    }
}

macro_rules! deserialize_signed {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            match &self.node {
                Node::Scalar(s) => match parse_i128(s).and_then(|v| <$ty>::try_from(v).ok()) {
                    Some(v) => visitor.$visit(v),
                    None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
                },
                _ => Err(self.invalid_type(&visitor)),
            }
        }
    };
}

macro_rules! deserialize_unsigned {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            match &self.node {
                Node::Scalar(s) => match parse_u128(s).and_then(|v| <$ty>::try_from(v).ok()) {
                    Some(v) => visitor.$visit(v),
                    None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
                },
                _ => Err(self.invalid_type(&visitor)),
            }
        }
    };
}

impl<'de, 'a> de::Deserializer<'de> for Deserializer<'a> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Node::Null => visitor.visit_unit(),
            Node::Scalar(s) if self.key => visitor.visit_string(s),
            Node::Scalar(s) => {
                if let Some(b) = parse_bool(&s) {
                    visitor.visit_bool(b)
                } else if let Some(n) = parse_i128(&s) {
                    if let Ok(n) = i64::try_from(n) {
                        visitor.visit_i64(n)
                    } else if let Ok(n) = u64::try_from(n) {
                        visitor.visit_u64(n)
                    } else {
                        visitor.visit_string(s)
                    }
                } else if let Some(f) = parse_f64(&s) {
                    visitor.visit_f64(f)
                } else {
                    visitor.visit_string(s)
                }
            }
            Node::Sequence(items) => visitor.visit_seq(SeqAccess::new(items, self.config)),
            Node::Mapping(mapping) => {
                visitor.visit_map(MapAccess::new(mapping, self.config, None))
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match &self.node {
            Node::Scalar(s) => match parse_bool(s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
            },
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    deserialize_signed!(deserialize_i8, visit_i8, i8);
    deserialize_signed!(deserialize_i16, visit_i16, i16);
    deserialize_signed!(deserialize_i32, visit_i32, i32);
    deserialize_signed!(deserialize_i64, visit_i64, i64);
    deserialize_signed!(deserialize_i128, visit_i128, i128);
    deserialize_unsigned!(deserialize_u8, visit_u8, u8);
    deserialize_unsigned!(deserialize_u16, visit_u16, u16);
    deserialize_unsigned!(deserialize_u32, visit_u32, u32);
    deserialize_unsigned!(deserialize_u64, visit_u64, u64);
    deserialize_unsigned!(deserialize_u128, visit_u128, u128);

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match &self.node {
            Node::Scalar(s) => match parse_f64(s) {
                Some(f) => visitor.visit_f32(f as f32),
                None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
            },
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match &self.node {
            Node::Scalar(s) => match parse_f64(s) {
                Some(f) => visitor.visit_f64(f),
                None => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
            },
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match &self.node {
            Node::Scalar(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(de::Error::invalid_value(Unexpected::Str(s), &visitor)),
                }
            }
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Node::Scalar(s) => visitor.visit_string(s),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Node::Scalar(s) => visitor.visit_byte_buf(s.into_bytes()),
            Node::Sequence(items) => visitor.visit_seq(SeqAccess::new(items, self.config)),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Node::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Node::Null => visitor.visit_unit(),
            _ => Err(self.invalid_type(&visitor)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Node::Sequence(items) => visitor.visit_seq(SeqAccess::new(items, self.config)),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Node::Mapping(mapping) => {
                visitor.visit_map(MapAccess::new(mapping, self.config, None))
            }
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.node {
            Node::Mapping(mapping) => {
                let fields = Fields::new(fields, self.config);
                visitor.visit_map(MapAccess::new(mapping, self.config, Some(fields)))
            }
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let config = self.config;

        if let Some(union) = config.unions.get(name) {
            let (variant, text) = union.resolve(&self.node, config.convention(), config.unions.policy)?;
            return visitor.visit_enum(EnumAccess {
                variant: variant.variant(),
                payload: Payload::Canonical(text),
                config,
            });
        }

        match self.node {
            Node::Scalar(s) => visitor.visit_enum(EnumAccess {
                variant: config.decode_variant(name, variants, &s)?,
                payload: Payload::Unit,
                config,
            }),
            Node::Mapping(mapping) => {
                let mut entries = mapping.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((key, value)), None) => visitor.visit_enum(EnumAccess {
                        variant: config.decode_variant(name, variants, &key)?,
                        payload: Payload::Node(value),
                        config,
                    }),
                    _ => Err(de::Error::invalid_value(
                        Unexpected::Map,
                        &"a mapping with a single variant key",
                    )),
                }
            }
            Node::Null => Err(Error::Decode {
                type_name: name.to_string(),
                value: "null".to_string(),
            }),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

struct SeqAccess<'a> {
    items: vec::IntoIter<Node>,
    config: &'a Config,
}

impl<'a> SeqAccess<'a> {
    fn new(items: Vec<Node>, config: &'a Config) -> Self {
        Self {
            items: items.into_iter(),
            config,
        }
    }
}

impl<'de, 'a> de::SeqAccess<'de> for SeqAccess<'a> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        self.items
            .next()
            .map(|node| seed.deserialize(Deserializer::new(node, self.config)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Struct field names and their names under the naming convention.
struct Fields {
    names: &'static [&'static str],
    converted: Vec<String>,
}

impl Fields {
    fn new(names: &'static [&'static str], config: &Config) -> Self {
        let convention = config.convention();
        Self {
            names,
            converted: names.iter().map(|n| convention.apply(n)).collect(),
        }
    }

    /// The field a document key binds to; unknown keys pass through and are
    /// ignored by the struct.
    fn resolve(&self, key: String) -> String {
        if self.names.contains(&key.as_str()) {
            return key;
        }
        match self.converted.iter().position(|c| *c == key) {
            Some(i) => self.names[i].to_string(),
            None => key,
        }
    }
}

struct MapAccess<'a> {
    entries: vec::IntoIter<(String, Node)>,
    value: Option<Node>,
    config: &'a Config,
    fields: Option<Fields>,
}

impl<'a> MapAccess<'a> {
    fn new(mapping: Mapping, config: &'a Config, fields: Option<Fields>) -> Self {
        Self {
            entries: mapping.into_iter(),
            value: None,
            config,
            fields,
        }
    }
}

impl<'de, 'a> de::MapAccess<'de> for MapAccess<'a> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.value = Some(value);
        let key = match &self.fields {
            Some(fields) => fields.resolve(key),
            None => key,
        };
        seed.deserialize(Deserializer::key(key, self.config)).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let value = self
            .value
            .take()
            .ok_or_else(|| Error::Message("value requested before key".to_string()))?;
        seed.deserialize(Deserializer::new(value, self.config))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// What follows the variant name of an enum in the document.
enum Payload {
    /// A bare scalar naming a unit variant.
    Unit,
    /// The value under an externally tagged variant key.
    Node(Node),
    /// Canonical text of a resolved union mapping, read again as the
    /// concrete type.
    Canonical(String),
}

struct EnumAccess<'a> {
    variant: &'static str,
    payload: Payload,
    config: &'a Config,
}

impl<'de, 'a> de::EnumAccess<'de> for EnumAccess<'a> {
    type Error = Error;
    type Variant = VariantAccess<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let name: de::value::StrDeserializer<'_, Error> = self.variant.into_deserializer();
        let value = seed.deserialize(name)?;
        Ok((
            value,
            VariantAccess {
                payload: self.payload,
                config: self.config,
            },
        ))
    }
}

struct VariantAccess<'a> {
    payload: Payload,
    config: &'a Config,
}

impl<'a> VariantAccess<'a> {
    fn payload(self, expected: &'static str) -> Result<Deserializer<'a>> {
        let node = match self.payload {
            Payload::Unit => {
                return Err(de::Error::invalid_type(Unexpected::UnitVariant, &expected));
            }
            Payload::Node(node) => node,
            Payload::Canonical(text) => crate::parse(&text)?,
        };
        Ok(Deserializer::new(node, self.config))
    }
}

impl<'de, 'a> de::VariantAccess<'de> for VariantAccess<'a> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.payload {
            Payload::Unit | Payload::Canonical(_) | Payload::Node(Node::Null) => Ok(()),
            Payload::Node(other) => Err(de::Error::invalid_type(unexpected(&other), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.payload("newtype variant")?)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self.payload("tuple variant")?, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_struct(self.payload("struct variant")?, "", fields, visitor)
    }
}
