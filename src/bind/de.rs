//! serde [`Deserializer`] over a borrowed [`ConfigNode`]
//!
//! Scalars are converted leniently, since overrides arrive as strings: a
//! string parses into a requested number or bool, and numbers and bools
//! render into requested strings. Null stands in for an empty object,
//! map or sequence.

use serde::de::value::{MapDeserializer, SeqDeserializer, StrDeserializer};
use serde::de::{
    DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use crate::error::{ConfigError, Result};
use crate::node::ConfigNode;

static NULL: ConfigNode = ConfigNode::Null;

#[derive(Debug, Clone, Copy)]
pub struct NodeDeserializer<'de> {
    node: &'de ConfigNode,
}

impl<'de> NodeDeserializer<'de> {
    pub fn new(node: &'de ConfigNode) -> Self {
        Self { node }
    }

    fn visit_array<V: Visitor<'de>>(items: &'de [ConfigNode], visitor: V) -> Result<V::Value> {
        let mut seq: SeqDeserializer<_, ConfigError> =
            SeqDeserializer::new(items.iter().map(NodeDeserializer::new));
        let value = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(value)
    }

    fn visit_object<V: Visitor<'de>>(
        entries: impl Iterator<Item = (&'de String, &'de ConfigNode)>,
        visitor: V,
    ) -> Result<V::Value> {
        let mut map: MapDeserializer<'de, _, ConfigError> =
            MapDeserializer::new(entries.map(|(k, v)| (k.as_str(), NodeDeserializer::new(v))));
        let value = visitor.visit_map(&mut map)?;
        map.end()?;
        Ok(value)
    }
}

impl<'de> IntoDeserializer<'de, ConfigError> for NodeDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

/// Integer and float requests accept numeric strings.
macro_rules! deserialize_parsed {
    ($($method:ident => $parsed:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
                if let ConfigNode::String(s) = self.node {
                    if let Ok(v) = s.trim().parse::<$parsed>() {
                        return visitor.$visit(v);
                    }
                }
                self.deserialize_any(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for NodeDeserializer<'de> {
    type Error = ConfigError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            ConfigNode::Null => visitor.visit_unit(),
            ConfigNode::Bool(b) => visitor.visit_bool(*b),
            ConfigNode::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            ConfigNode::String(s) => visitor.visit_borrowed_str(s),
            ConfigNode::Array(items) => Self::visit_array(items, visitor),
            ConfigNode::Object(map) => Self::visit_object(map.iter(), visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if let ConfigNode::String(s) = self.node {
            match s.trim().to_ascii_lowercase().as_str() {
                "true" => return visitor.visit_bool(true),
                "false" => return visitor.visit_bool(false),
                _ => {}
            }
        }
        self.deserialize_any(visitor)
    }

    deserialize_parsed! {
        deserialize_i8 => i64, visit_i64;
        deserialize_i16 => i64, visit_i64;
        deserialize_i32 => i64, visit_i64;
        deserialize_i64 => i64, visit_i64;
        deserialize_u8 => u64, visit_u64;
        deserialize_u16 => u64, visit_u64;
        deserialize_u32 => u64, visit_u64;
        deserialize_u64 => u64, visit_u64;
        deserialize_f32 => f64, visit_f64;
        deserialize_f64 => f64, visit_f64;
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            ConfigNode::Bool(_) | ConfigNode::Number(_) => {
                visitor.visit_string(self.node.scalar_text().unwrap_or_default())
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            ConfigNode::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            ConfigNode::Null => visitor.visit_unit(),
            _ => self.deserialize_any(visitor),
        }
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
            ConfigNode::Null => Self::visit_array(&[], visitor),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            ConfigNode::Null => Self::visit_object(std::iter::empty(), visitor),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    /// Unit variants are plain strings; data-carrying variants are
    /// single-key objects.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if let ConfigNode::String(s) = self.node {
            return visitor.visit_enum(EnumNode { variant: s, value: None });
        }
        let single =
            self.node.as_object().filter(|map| map.len() == 1).and_then(|map| map.iter().next());
        if let Some((variant, value)) = single {
            return visitor.visit_enum(EnumNode { variant, value: Some(value) });
        }
        Err(serde::de::Error::custom(format!(
            "expected a string or single-key object for an enum, found {}",
            self.node.kind()
        )))
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        char bytes byte_buf unit_struct tuple tuple_struct identifier
    }
}

struct EnumNode<'de> {
    variant: &'de str,
    value: Option<&'de ConfigNode>,
}

impl<'de> EnumAccess<'de> for EnumNode<'de> {
    type Error = ConfigError;
    type Variant = VariantNode<'de>;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, Self::Variant)> {
        let name: StrDeserializer<'de, ConfigError> = self.variant.into_deserializer();
        let variant = seed.deserialize(name)?;
        Ok((variant, VariantNode { value: self.value.unwrap_or(&NULL) }))
    }
}

struct VariantNode<'de> {
    value: &'de ConfigNode,
}

impl<'de> VariantAccess<'de> for VariantNode<'de> {
    type Error = ConfigError;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value> {
        seed.deserialize(NodeDeserializer::new(self.value))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        NodeDeserializer::new(self.value).deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        NodeDeserializer::new(self.value).deserialize_map(visitor)
    }
}
