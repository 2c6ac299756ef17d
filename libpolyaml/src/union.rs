//! Tagged-union resolution.
//!
//! An abstract type is modelled as a Rust enum whose variants wrap the
//! concrete types. Registering it as a union tells the facade to pick the
//! variant from a discriminant field inside the mapping, instead of the
//! default externally tagged `{variant: payload}` shape:
//!
//! ```text
//! proxies:
//!   - name: hk
//!     type: ss        # selects Proxy::Shadowsocks
//!   - name: local
//!     type: socks5    # selects Proxy::Socks5
//! ```
//!
//! Resolution works on the plain document node, which carries no type
//! information, so it never re-enters itself. The selected variant is then
//! deserialized from the node's canonical text in a second, fully typed pass.

use crate::emit::emit;
use crate::error::{Error, RegistryError, Result};
use crate::naming::NamingConvention;
use crate::node::{Mapping, Node};
use std::collections::HashMap;
use tracing::debug;

/// One concrete shape of a union: the enum variant to build and the
/// discriminant that selects it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    variant: &'static str,
    field: String,
    value: String,
}

impl Variant {
    /// `variant` is selected when the mapping's `field` holds `value`. The
    /// field is looked up by its raw name first, then by its name under the
    /// naming convention.
    pub fn new(variant: &'static str, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            variant,
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn variant(&self) -> &'static str {
        self.variant
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn matches(&self, mapping: &Mapping, convention: &dyn NamingConvention) -> bool {
        let holds_value = |key: &str| matches!(mapping.get(key), Some(Node::Scalar(s)) if *s == self.value);
        holds_value(&self.field) || holds_value(&convention.apply(&self.field))
    }

    fn is_present(&self, mapping: &Mapping, convention: &dyn NamingConvention) -> bool {
        mapping.contains_key(&self.field) || mapping.contains_key(&convention.apply(&self.field))
    }
}

/// Which variants may match one mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// The first variant in registration order whose discriminant matches
    /// wins.
    #[default]
    FirstMatch,
    /// Exactly one variant may match; several matches are an error.
    UniqueMatch,
}

/// A named abstract type and its variants in registration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnionDescriptor {
    name: &'static str,
    variants: Vec<Variant>,
}

impl UnionDescriptor {
    pub fn new(name: &'static str, variants: impl IntoIterator<Item = Variant>) -> Self {
        Self {
            name,
            variants: variants.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Look up the registration for an enum variant name.
    pub fn variant(&self, variant: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.variant == variant)
    }

    /// Reject unions that can never resolve, or where two variants are
    /// selected by the same discriminant.
    fn validate(&self, convention: &dyn NamingConvention) -> std::result::Result<(), RegistryError> {
        if self.variants.is_empty() {
            return Err(RegistryError::EmptyUnion(self.name.to_string()));
        }
        for (i, a) in self.variants.iter().enumerate() {
            for b in &self.variants[i + 1..] {
                let same_field = a.field == b.field || convention.apply(&a.field) == convention.apply(&b.field);
                if same_field && a.value == b.value {
                    return Err(RegistryError::IndistinguishableVariants {
                        union: self.name.to_string(),
                        first: a.variant.to_string(),
                        second: b.variant.to_string(),
                        field: a.field.clone(),
                        value: a.value.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Pick the variant for a plain document node.
    ///
    /// Returns the variant together with the node's canonical text, which the
    /// caller deserializes again as the concrete type.
    pub(crate) fn resolve(
        &self,
        node: &Node,
        convention: &dyn NamingConvention,
        policy: ResolutionPolicy,
    ) -> Result<(&Variant, String)> {
        let Node::Mapping(mapping) = node else {
            return Err(Error::UnionShape {
                type_name: self.name.to_string(),
                found: node.kind(),
            });
        };
        let text = emit(node);

        let mut candidates = self.variants.iter().filter(|v| v.matches(mapping, convention));
        let Some(selected) = candidates.next() else {
            debug!(union = self.name, "no variant matched");
            return Err(Error::UnionResolution {
                type_name: self.name.to_string(),
                text,
            });
        };

        if policy == ResolutionPolicy::UniqueMatch {
            let others: Vec<&'static str> = candidates.map(|v| v.variant).collect();
            if !others.is_empty() {
                let mut variants = vec![selected.variant];
                variants.extend(others);
                debug!(union = self.name, ?variants, "ambiguous variants");
                return Err(Error::UnionAmbiguity {
                    type_name: self.name.to_string(),
                    variants,
                    text,
                });
            }
        }

        debug!(union = self.name, variant = selected.variant, "resolved union variant");
        Ok((selected, text))
    }

    /// Make sure a serialized payload carries the discriminant of `variant`,
    /// so it resolves to the same variant when read back.
    pub(crate) fn tag(
        &self,
        variant: &str,
        payload: Node,
        convention: &dyn NamingConvention,
    ) -> Result<Node> {
        let registered = self.variant(variant).ok_or_else(|| {
            Error::Message(format!("variant {variant} of union {} is not registered", self.name))
        })?;
        match payload {
            Node::Mapping(mut mapping) => {
                if !registered.is_present(&mapping, convention) {
                    mapping.push_front(
                        convention.apply(&registered.field),
                        Node::Scalar(registered.value.clone()),
                    );
                }
                Ok(Node::Mapping(mapping))
            }
            other => Err(Error::UnionShape {
                type_name: self.name.to_string(),
                found: other.kind(),
            }),
        }
    }
}

/// All registered unions, keyed by abstract type name.
#[derive(Clone, Debug, Default)]
pub(crate) struct UnionRegistry {
    unions: HashMap<&'static str, UnionDescriptor>,
    pub(crate) policy: ResolutionPolicy,
}

impl UnionRegistry {
    pub(crate) fn register(
        &mut self,
        descriptor: UnionDescriptor,
        convention: &dyn NamingConvention,
    ) -> std::result::Result<(), RegistryError> {
        if self.unions.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateUnion(descriptor.name.to_string()));
        }
        descriptor.validate(convention)?;
        self.unions.insert(descriptor.name, descriptor);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&UnionDescriptor> {
        self.unions.get(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.unions.len()
    }
}
