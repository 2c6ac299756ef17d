//! Serialize values into document nodes.
//!
//! Struct field names go through the naming convention, unit enum variants
//! through the enum transcoder, and variants of registered unions are
//! written as their bare payload.

use crate::error::{Error, Result};
use crate::node::{Mapping, Node};
use crate::yaml::Config;
use serde::ser::{self, Serialize};

#[derive(Clone, Copy)]
pub(crate) struct Serializer<'a> {
    config: &'a Config,
}

impl<'a> Serializer<'a> {
    pub(crate) fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Wrap an enum payload: bare for registered unions, `{variant: payload}`
    /// otherwise.
    fn variant_node(self, name: &'static str, variant: &'static str, payload: Node) -> Result<Node> {
        match self.config.unions.get(name) {
            Some(union) => union.tag(variant, payload, self.config.convention()),
            None => {
                let mut mapping = Mapping::new();
                mapping.insert(self.config.encode_variant(name, variant)?, payload);
                Ok(Node::Mapping(mapping))
            }
        }
    }

    /// Add a struct field under its converted key. Two fields landing on one
    /// key would lose data, so that is an error.
    fn insert_field(
        self,
        mapping: &mut Mapping,
        fields: &mut Vec<&'static str>,
        field: &'static str,
        value: Node,
    ) -> Result<()> {
        let convention = self.config.convention();
        let key = convention.apply(field);
        if mapping.contains_key(&key) {
            let first = fields
                .iter()
                .find(|f| convention.apply(f) == key)
                .copied()
                .unwrap_or(field);
            return Err(Error::Message(format!(
                "fields {first} and {field} both serialize as key {key}"
            )));
        }
        fields.push(field);
        mapping.insert(key, value);
        Ok(())
    }
}

fn scalar(s: impl ToString) -> Result<Node> {
    Ok(Node::Scalar(s.to_string()))
}

macro_rules! float_text {
    ($v:expr) => {{
        let v = $v;
        if v.is_nan() {
            ".nan".to_string()
        } else if v.is_infinite() {
            if v > 0.0 { ".inf" } else { "-.inf" }.to_string()
        } else {
            let s = v.to_string();
            if s.contains(|c| c == '.' || c == 'e') {
                s
            } else {
                format!("{}.0", s)
            }
        }
    }};
}

impl<'a> ser::Serializer for Serializer<'a> {
    type Ok = Node;
    type Error = Error;

    type SerializeSeq = SerializeSeq<'a>;
    type SerializeTuple = SerializeSeq<'a>;
    type SerializeTupleStruct = SerializeSeq<'a>;
    type SerializeTupleVariant = SerializeTupleVariant<'a>;
    type SerializeMap = SerializeMap<'a>;
    type SerializeStruct = SerializeStruct<'a>;
    type SerializeStructVariant = SerializeStructVariant<'a>;

    fn serialize_bool(self, v: bool) -> Result<Node> {
        scalar(v)
    }

    fn serialize_i8(self, v: i8) -> Result<Node> {
        scalar(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Node> {
        scalar(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Node> {
        scalar(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Node> {
        scalar(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Node> {
        scalar(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Node> {
        scalar(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Node> {
        scalar(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Node> {
        scalar(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Node> {
        scalar(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Node> {
        scalar(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Node> {
        scalar(float_text!(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Node> {
        scalar(float_text!(v))
    }

    fn serialize_char(self, v: char) -> Result<Node> {
        scalar(v)
    }

    fn serialize_str(self, v: &str) -> Result<Node> {
        scalar(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Node> {
        Ok(Node::Sequence(
            v.iter().map(|b| Node::Scalar(b.to_string())).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Node> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node> {
        Ok(Node::Null)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Node> {
        if self.config.unions.get(name).is_some() {
            return self.variant_node(name, variant, Node::Mapping(Mapping::new()));
        }
        Ok(Node::Scalar(self.config.encode_variant(name, variant)?))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Node> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node> {
        let payload = value.serialize(self)?;
        self.variant_node(name, variant, payload)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeSeq<'a>> {
        Ok(SerializeSeq {
            ser: self,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSeq<'a>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeSeq<'a>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant<'a>> {
        Ok(SerializeTupleVariant {
            ser: self,
            name,
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap<'a>> {
        Ok(SerializeMap {
            ser: self,
            mapping: Mapping::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeStruct<'a>> {
        Ok(SerializeStruct {
            ser: self,
            mapping: Mapping::new(),
            fields: Vec::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStructVariant<'a>> {
        Ok(SerializeStructVariant {
            ser: self,
            name,
            variant,
            mapping: Mapping::new(),
            fields: Vec::new(),
        })
    }
}

pub(crate) struct SerializeSeq<'a> {
    ser: Serializer<'a>,
    items: Vec<Node>,
}

impl<'a> ser::SerializeSeq for SerializeSeq<'a> {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Sequence(self.items))
    }
}

impl<'a> ser::SerializeTuple for SerializeSeq<'a> {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a> ser::SerializeTupleStruct for SerializeSeq<'a> {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct SerializeTupleVariant<'a> {
    ser: Serializer<'a>,
    name: &'static str,
    variant: &'static str,
    items: Vec<Node>,
}

impl<'a> ser::SerializeTupleVariant for SerializeTupleVariant<'a> {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        self.ser
            .variant_node(self.name, self.variant, Node::Sequence(self.items))
    }
}

pub(crate) struct SerializeMap<'a> {
    ser: Serializer<'a>,
    mapping: Mapping,
    next_key: Option<String>,
}

impl<'a> ser::SerializeMap for SerializeMap<'a> {
    type Ok = Node;
    type Error = Error;

    // Map keys are data, so they are written as-is.
    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        match key.serialize(self.ser)? {
            Node::Scalar(s) => {
                self.next_key = Some(s);
                Ok(())
            }
            other => Err(Error::Message(format!(
                "mapping key must be a scalar, found {}",
                other.kind()
            ))),
        }
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::Message("serialize_value called before serialize_key".into()))?;
        self.mapping.insert(key, value.serialize(self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Mapping(self.mapping))
    }
}

pub(crate) struct SerializeStruct<'a> {
    ser: Serializer<'a>,
    mapping: Mapping,
    fields: Vec<&'static str>,
}

impl<'a> ser::SerializeStruct for SerializeStruct<'a> {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let value = value.serialize(self.ser)?;
        self.ser
            .insert_field(&mut self.mapping, &mut self.fields, key, value)
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Mapping(self.mapping))
    }
}

pub(crate) struct SerializeStructVariant<'a> {
    ser: Serializer<'a>,
    name: &'static str,
    variant: &'static str,
    mapping: Mapping,
    fields: Vec<&'static str>,
}

impl<'a> ser::SerializeStructVariant for SerializeStructVariant<'a> {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        let value = value.serialize(self.ser)?;
        self.ser
            .insert_field(&mut self.mapping, &mut self.fields, key, value)
    }

    fn end(self) -> Result<Node> {
        self.ser
            .variant_node(self.name, self.variant, Node::Mapping(self.mapping))
    }
}
