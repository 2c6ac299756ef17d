//! The serializer/deserializer facade.
//!
//! A [`Yaml`] is built once from a [`YamlBuilder`] and is then immutable.
//! Clones share the same configuration, so one instance can serve any
//! number of threads.
//!
//! ```
//! use libpolyaml::{Variant, Yaml};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Http { server: String, port: u16 }
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Socks5 { server: String, port: u16, udp: bool }
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! enum Proxy { Http(Http), Socks5(Socks5) }
//!
//! let yaml = Yaml::builder()
//!     .union("Proxy", [
//!         Variant::new("Http", "type", "http"),
//!         Variant::new("Socks5", "type", "socks5"),
//!     ])
//!     .build()
//!     .unwrap();
//!
//! let proxy: Proxy = yaml
//!     .deserialize("type: socks5\nserver: 10.0.0.1\nport: 1080\nudp: true\n")
//!     .unwrap();
//! assert_eq!(proxy, Proxy::Socks5(Socks5 { server: "10.0.0.1".into(), port: 1080, udp: true }));
//! ```

use crate::de::Deserializer;
use crate::emit::emit;
use crate::error::{Error, RegistryError, Result};
use crate::naming::{Hyphenated, NamingConvention};
use crate::node::Node;
use crate::ser::Serializer;
use crate::transcode::{EnumDescriptor, EnumTranscoder};
use crate::union::{ResolutionPolicy, UnionDescriptor, UnionRegistry, Variant};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Everything the serializer and deserializer consult while binding.
#[derive(Debug)]
pub(crate) struct Config {
    transcoder: EnumTranscoder,
    enums: HashMap<String, EnumDescriptor>,
    pub(crate) unions: UnionRegistry,
}

impl Config {
    fn new(convention: Arc<dyn NamingConvention>) -> Self {
        Self {
            transcoder: EnumTranscoder::new(convention),
            enums: HashMap::new(),
            unions: UnionRegistry::default(),
        }
    }

    pub(crate) fn convention(&self) -> &dyn NamingConvention {
        self.transcoder.convention()
    }

    /// Serialized text for a unit variant, from the registered table when
    /// there is one.
    pub(crate) fn encode_variant(&self, type_name: &str, variant: &str) -> Result<String> {
        match self.enums.get(type_name).and_then(|d| d.serialized(variant)) {
            Some(name) => Ok(name.to_string()),
            None => self.transcoder.encode(type_name, variant),
        }
    }

    pub(crate) fn decode_variant(
        &self,
        type_name: &str,
        variants: &'static [&'static str],
        text: &str,
    ) -> Result<&'static str> {
        let Some(descriptor) = self.enums.get(type_name) else {
            return self.transcoder.decode(type_name, variants, text);
        };
        descriptor
            .symbolic(text)
            .and_then(|symbolic| variants.iter().copied().find(|v| *v == symbolic))
            .ok_or_else(|| Error::Decode {
                type_name: type_name.to_string(),
                value: text.to_string(),
            })
    }
}

/// Serializes values to text and back, applying the configured naming
/// convention and union registrations.
#[derive(Clone, Debug)]
pub struct Yaml {
    config: Arc<Config>,
}

impl Default for Yaml {
    /// Hyphenated names, no unions, first-match resolution.
    fn default() -> Self {
        Self {
            config: Arc::new(Config::new(Arc::new(Hyphenated))),
        }
    }
}

impl Yaml {
    pub fn builder() -> YamlBuilder {
        YamlBuilder::default()
    }

    /// Serialize `value` to canonical text.
    pub fn serialize<T: ?Sized + Serialize>(&self, value: &T) -> Result<String> {
        trace!(type_name = std::any::type_name::<T>(), "serializing");
        Ok(emit(&self.to_node(value)?))
    }

    /// Parse `text` and bind it to `T`.
    pub fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        trace!(type_name = std::any::type_name::<T>(), "deserializing");
        let node = crate::parse(text)?;
        self.from_node(node)
    }

    /// Serialize `value` to a document node without emitting it.
    pub fn to_node<T: ?Sized + Serialize>(&self, value: &T) -> Result<Node> {
        value.serialize(Serializer::new(&self.config))
    }

    /// Bind an already parsed document node to `T`.
    pub fn from_node<T: DeserializeOwned>(&self, node: Node) -> Result<T> {
        T::deserialize(Deserializer::new(node, &self.config))
    }

    pub fn convention(&self) -> &dyn NamingConvention {
        self.config.convention()
    }

    pub fn transcoder(&self) -> &EnumTranscoder {
        &self.config.transcoder
    }

    pub fn union(&self, name: &str) -> Option<&UnionDescriptor> {
        self.config.unions.get(name)
    }

    pub fn enumeration(&self, type_name: &str) -> Option<&EnumDescriptor> {
        self.config.enums.get(type_name)
    }

    pub fn resolution_policy(&self) -> ResolutionPolicy {
        self.config.unions.policy
    }
}

type DescribeEnum = fn(&dyn NamingConvention) -> std::result::Result<EnumDescriptor, RegistryError>;

/// Collects configuration for a [`Yaml`]. Nothing is validated until
/// [`build`](YamlBuilder::build).
#[derive(Debug)]
pub struct YamlBuilder {
    convention: Arc<dyn NamingConvention>,
    unions: Vec<UnionDescriptor>,
    enums: Vec<DescribeEnum>,
    policy: ResolutionPolicy,
}

impl Default for YamlBuilder {
    fn default() -> Self {
        Self {
            convention: Arc::new(Hyphenated),
            unions: Vec::new(),
            enums: Vec::new(),
            policy: ResolutionPolicy::default(),
        }
    }
}

impl YamlBuilder {
    /// Convention for struct field names and enum values. Defaults to
    /// [`Hyphenated`].
    pub fn naming_convention(mut self, convention: impl NamingConvention + 'static) -> Self {
        self.convention = Arc::new(convention);
        self
    }

    /// Register the enum named `name` as a union. Its variants are picked by
    /// discriminant, checked in the order given.
    pub fn union(mut self, name: &'static str, variants: impl IntoIterator<Item = Variant>) -> Self {
        self.unions.push(UnionDescriptor::new(name, variants));
        self
    }

    pub fn union_descriptor(mut self, descriptor: UnionDescriptor) -> Self {
        self.unions.push(descriptor);
        self
    }

    /// Precompute the serialized names of enum `T` and check them for
    /// collisions when the facade is built.
    pub fn enumeration<T: DeserializeOwned>(mut self) -> Self {
        self.enums.push(EnumDescriptor::of::<T>);
        self
    }

    pub fn resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> std::result::Result<Yaml, RegistryError> {
        let mut config = Config::new(self.convention);
        config.unions.policy = self.policy;

        for descriptor in self.unions {
            config.unions.register(descriptor, config.transcoder.convention())?;
        }
        for describe in self.enums {
            let descriptor = describe(config.transcoder.convention())?;
            config.enums.insert(descriptor.type_name().to_string(), descriptor);
        }

        debug!(
            convention = ?config.convention(),
            unions = config.unions.len(),
            enums = config.enums.len(),
            policy = ?config.unions.policy,
            "built yaml facade"
        );
        Ok(Yaml {
            config: Arc::new(config),
        })
    }
}
