//! Mapping tree nodes onto Rust values.
//!
//! This module provides the [`Deserializer`] that reads any `T: Deserialize`
//! directly from a node of a [`Tree`], borrowing strings from the tree.
//!
//! ## Mapping
//!
//! - **Scalars** are parsed from the node value
//! - **Structs** pick up the children named like their fields; unknown
//!   children are ignored, and with duplicate keys the most recent one wins
//! - **Sequences** take every child in order, named or not
//! - **Arrays and tuples** of length `N` take the first `N` children
//! - **Maps** take every named child, parsing keys from text; unnamed children
//!   are skipped
//! - **Options** are `None` for an empty node (no value, no children)
//! - **Enums**: a node with a value names a unit variant; a node with a single
//!   named child holds the variant keyed by that child
//!
//! ## Usage
//!
//! ```rust
//! use serde_tabtree::{de::from_node, Tree};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! let tree: Tree = "point\n\tx = 1\n\ty = 2\n\tz = ignored\n".parse().unwrap();
//! let point: Point = from_node(&tree, tree.root()).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2 });
//! ```

use crate::node::{NodeId, Tree};
use crate::{Error, Result};
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, IntoDeserializer};
use serde::{forward_to_deserialize_any, Deserialize};
use std::fmt::Display;
use std::str::FromStr;

/// Deserializes an instance of `T` from `node`.
///
/// # Errors
///
/// Returns [`Error::InvalidNode`] if `node` is not a live node of `tree`, or any
/// error raised while deserializing.
pub fn from_node<'de, T>(tree: &'de Tree, node: NodeId) -> Result<T>
where
    T: Deserialize<'de>,
{
    if !tree.contains(node) {
        return Err(Error::InvalidNode);
    }
    T::deserialize(Deserializer::new(tree, node))
}

/// Deserializes `node` into `target`, replacing its previous content.
///
/// # Errors
///
/// Same as [`from_node`]. On error `target` is left untouched.
pub fn unmarshal<'de, T>(tree: &'de Tree, node: NodeId, target: &mut T) -> Result<()>
where
    T: Deserialize<'de>,
{
    *target = from_node(tree, node)?;
    Ok(())
}

fn parse_text<T>(text: &str, expected: &'static str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse().map_err(|e| Error::scalar(text, expected, e))
}

/// Implements the scalar `deserialize_*` methods by parsing `self.text()`.
macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty),)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                visitor.$visit(parse_text::<$ty>(self.text(), stringify!($ty))?)
            }
        )*
    };
}

/// The node deserializer.
#[derive(Clone, Copy)]
pub struct Deserializer<'de> {
    tree: &'de Tree,
    node: NodeId,
}

impl<'de> Deserializer<'de> {
    pub fn new(tree: &'de Tree, node: NodeId) -> Self {
        Deserializer { tree, node }
    }

    #[inline]
    fn text(&self) -> &'de str {
        self.tree.value(self.node)
    }

    fn children(&self) -> &'de [NodeId] {
        self.tree.children(self.node)
    }

    fn seq(&self, limit: usize) -> SeqDeserializer<'de> {
        let children = self.children();
        SeqDeserializer {
            tree: self.tree,
            iter: children[..limit.min(children.len())].iter(),
        }
    }

    fn named(&self) -> MapDeserializer<'de> {
        MapDeserializer {
            tree: self.tree,
            iter: self.children().iter(),
            value: None,
        }
    }
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.tree.named_count(self.node) > 0 {
            visitor.visit_map(self.named())
        } else if self.tree.child_count(self.node) > 0 {
            visitor.visit_seq(self.seq(usize::MAX))
        } else if self.text().is_empty() {
            visitor.visit_unit()
        } else {
            visitor.visit_borrowed_str(self.text())
        }
    }

    deserialize_parsed! {
        deserialize_bool => visit_bool(bool),
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.text())
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.tree.is_void(self.node) {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_seq(self.seq(usize::MAX))
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_seq(self.seq(len))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_seq(self.seq(len))
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(self.named())
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(StructDeserializer {
            tree: self.tree,
            node: self.node,
            fields: fields.iter(),
            value: None,
        })
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if !self.text().is_empty() {
            return visitor.visit_enum(self.text().into_deserializer());
        }
        match self.children() {
            [child] if !self.tree.key(*child).is_empty() => visitor.visit_enum(EnumDeserializer {
                tree: self.tree,
                node: *child,
            }),
            _ => Err(Error::custom(
                "expected a variant name or a single child keyed by the variant",
            )),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Positional access to children.
struct SeqDeserializer<'de> {
    tree: &'de Tree,
    iter: std::slice::Iter<'de, NodeId>,
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(&child) => seed.deserialize(Deserializer::new(self.tree, child)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Access to the named children, in order, duplicates included.
struct MapDeserializer<'de> {
    tree: &'de Tree,
    iter: std::slice::Iter<'de, NodeId>,
    value: Option<NodeId>,
}

impl<'de> de::MapAccess<'de> for MapDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        let tree = self.tree;
        match self.iter.find(|&&child| !tree.key(child).is_empty()) {
            Some(&child) => {
                self.value = Some(child);
                seed.deserialize(KeyDeserializer(tree.key(child))).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(child) => seed.deserialize(Deserializer::new(self.tree, child)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }
}

/// Access to the children named like the fields of a struct.
///
/// Fields are looked up through the key index, so unknown children never
/// show up and duplicates resolve to the most recent child.
struct StructDeserializer<'de> {
    tree: &'de Tree,
    node: NodeId,
    fields: std::slice::Iter<'static, &'static str>,
    value: Option<NodeId>,
}

impl<'de> de::MapAccess<'de> for StructDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        for &field in self.fields.by_ref() {
            if let Some(child) = self.tree.child_by_key(self.node, field) {
                self.value = Some(child);
                return seed
                    .deserialize(BorrowedStrDeserializer::<Error>::new(field))
                    .map(Some);
            }
        }
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(child) => seed.deserialize(Deserializer::new(self.tree, child)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }
}

/// Deserializes a map key from a child key, parsing scalars from text.
struct KeyDeserializer<'de>(&'de str);

impl<'de> KeyDeserializer<'de> {
    #[inline]
    fn text(&self) -> &'de str {
        self.0
    }
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.0)
    }

    deserialize_parsed! {
        deserialize_bool => visit_bool(bool),
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self.0.into_deserializer())
    }

    forward_to_deserialize_any! {
        str string bytes byte_buf option unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

/// Enum access for a variant stored as a single child keyed by the variant name.
struct EnumDeserializer<'de> {
    tree: &'de Tree,
    node: NodeId,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = Deserializer<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(
            self.tree.key(self.node),
        ))?;
        Ok((variant, Deserializer::new(self.tree, self.node)))
    }
}

impl<'de> de::VariantAccess<'de> for Deserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}
