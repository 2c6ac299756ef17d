//! Enum transcoding: symbolic enum values to and from their serialized text.

use crate::error::{Error, RegistryError, Result};
use crate::naming::NamingConvention;
use serde::de::{self, DeserializeOwned, Visitor};
use std::sync::Arc;

/// Converts enum values through a naming convention.
#[derive(Clone, Debug)]
pub struct EnumTranscoder {
    convention: Arc<dyn NamingConvention>,
}

impl EnumTranscoder {
    pub fn new(convention: Arc<dyn NamingConvention>) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> &dyn NamingConvention {
        self.convention.as_ref()
    }

    /// Serialized text for `variant` of `type_name`.
    pub fn encode(&self, type_name: &str, variant: &str) -> Result<String> {
        let name = self.convention.apply(variant);
        if name.trim().is_empty() {
            return Err(Error::Encode {
                type_name: type_name.to_string(),
                variant: variant.to_string(),
            });
        }
        Ok(name)
    }

    /// Find the variant whose raw or transformed name is exactly `text`.
    pub fn decode<'v>(&self, type_name: &str, variants: &[&'v str], text: &str) -> Result<&'v str> {
        variants
            .iter()
            .copied()
            .find(|v| *v == text || self.convention.apply(v) == text)
            .ok_or_else(|| Error::Decode {
                type_name: type_name.to_string(),
                value: text.to_string(),
            })
    }
}

/// The serialized names of one enum type, computed once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDescriptor {
    type_name: String,
    /// (symbolic name, serialized name) in declaration order.
    entries: Vec<(String, String)>,
}

impl EnumDescriptor {
    /// Describe an enum from its variant names. Fails if a name transcodes to
    /// blank text or two names collide.
    pub fn new(
        type_name: &str,
        variants: &[&str],
        convention: &dyn NamingConvention,
    ) -> std::result::Result<Self, RegistryError> {
        let mut entries: Vec<(String, String)> = Vec::with_capacity(variants.len());
        for variant in variants {
            let serialized = convention.apply(variant);
            if serialized.trim().is_empty() {
                return Err(RegistryError::BlankEnumName {
                    type_name: type_name.to_string(),
                    variant: variant.to_string(),
                });
            }
            if let Some((first, _)) = entries.iter().find(|(_, s)| *s == serialized) {
                return Err(RegistryError::DuplicateEnumName {
                    type_name: type_name.to_string(),
                    first: first.clone(),
                    second: variant.to_string(),
                    name: serialized,
                });
            }
            entries.push((variant.to_string(), serialized));
        }
        Ok(Self {
            type_name: type_name.to_string(),
            entries,
        })
    }

    /// Describe a serde enum type by reading the variant names its
    /// `Deserialize` impl declares.
    pub fn of<T: DeserializeOwned>(
        convention: &dyn NamingConvention,
    ) -> std::result::Result<Self, RegistryError> {
        let mut found = None;
        // The probe always fails once it has seen the enum's metadata.
        let _ = T::deserialize(Probe { found: &mut found });
        match found {
            Some((name, variants)) => Self::new(name, variants, convention),
            None => Err(RegistryError::NotAnEnum(std::any::type_name::<T>())),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Serialized text for a symbolic name.
    pub fn serialized(&self, symbolic: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(sym, _)| sym == symbolic)
            .map(|(_, s)| s.as_str())
    }

    /// Symbolic name for text that is either the raw or serialized name.
    pub fn symbolic(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(sym, ser)| sym == text || ser == text)
            .map(|(sym, _)| sym.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }
}

type EnumMeta = (&'static str, &'static [&'static str]);

/// A deserializer that only records what `deserialize_enum` is asked for.
struct Probe<'a> {
    found: &'a mut Option<EnumMeta>,
}

impl<'de, 'a> de::Deserializer<'de> for Probe<'a> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        Err(Error::Message("not an enum".to_string()))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        *self.found = Some((name, variants));
        Err(Error::Message("enum probed".to_string()))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}
