//! Mapping Rust values onto tree nodes.
//!
//! This module provides the [`Serializer`] that writes any `T: Serialize`
//! directly into a node of a [`Tree`].
//!
//! ## Mapping
//!
//! - **Scalars** become the node value (`42`, `true`, `hello`)
//! - **Structs** become one child per field, keyed by field name, in declaration order
//! - **Sequences and tuples** become one unnamed child per element
//! - **Maps** become one child per entry keyed by the stringified map key,
//!   sorted by key. An empty key is rejected with [`Error::EmptyKey`], since an
//!   unnamed child would not be read back as a map entry
//! - **`None` and unit** leave the node empty (no value, no children)
//! - **Enums**: a unit variant is stored as its name; other variants as a
//!   single child keyed by the variant name
//!
//! Fields marked `#[serde(skip)]` produce no child.
//!
//! ## Usage
//!
//! ```rust
//! use serde_tabtree::{ser::marshal, Tree};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! marshal(&mut tree, root, &Point { x: 1, y: 2 }).unwrap();
//!
//! assert_eq!(tree.to_text(root), "=\n\tx = 1\n\ty = 2\n");
//! ```

use crate::node::{NodeId, Tree};
use crate::{Error, Result};
use serde::ser::Impossible;
use serde::{ser, Serialize};

/// Serializes `value` into `node`, replacing its value and children. The key is kept.
///
/// # Errors
///
/// Returns [`Error::InvalidNode`] if `node` is not a live node of `tree`, or any
/// error raised while serializing. On error `node` is left untouched.
pub fn marshal<T>(tree: &mut Tree, node: NodeId, value: &T) -> Result<()>
where
    T: ?Sized + Serialize,
{
    if !tree.contains(node) {
        return Err(Error::InvalidNode);
    }
    let scratch = to_standalone(tree, value)?;
    tree.take_content(node, scratch);
    Ok(())
}

/// Serializes `value` into a new standalone node of `tree`.
///
/// Nothing is left behind in `tree` on error.
pub(crate) fn to_standalone<T>(tree: &mut Tree, value: &T) -> Result<NodeId>
where
    T: ?Sized + Serialize,
{
    let scratch = tree.create_node("", "");
    match value.serialize(Serializer::new(tree, scratch)) {
        Ok(()) => Ok(scratch),
        Err(err) => {
            tree.discard(scratch);
            Err(err)
        }
    }
}

/// The node serializer.
///
/// Writes into the node it was created for; compound values append children.
pub struct Serializer<'a> {
    tree: &'a mut Tree,
    node: NodeId,
}

impl<'a> Serializer<'a> {
    pub fn new(tree: &'a mut Tree, node: NodeId) -> Self {
        Serializer { tree, node }
    }

    #[inline]
    fn set_value(self, text: String) -> Result<()> {
        self.tree.set_value(self.node, text);
        Ok(())
    }

    /// Appends a child keyed `variant` and returns a serializer for it.
    fn into_variant(self, variant: &'static str) -> Serializer<'a> {
        let child = self.tree.push_child(self.node, variant, "");
        Serializer {
            tree: self.tree,
            node: child,
        }
    }

    fn into_compound(self) -> Compound<'a> {
        Compound {
            tree: self.tree,
            node: self.node,
            key: None,
        }
    }
}

impl<'a> ser::Serializer for Serializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.set_value(v.to_string())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        use ser::SerializeSeq;
        let mut seq = self.serialize_seq(Some(v.len()))?;
        for byte in v {
            seq.serialize_element(byte)?;
        }
        seq.end()
    }

    fn serialize_none(self) -> Result<()> {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.set_value(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self.into_variant(variant))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a>> {
        Ok(self.into_compound())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound<'a>> {
        Ok(self.into_compound())
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'a>> {
        Ok(self.into_compound())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>> {
        Ok(self.into_variant(variant).into_compound())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'a>> {
        Ok(self.into_compound())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'a>> {
        Ok(self.into_compound())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>> {
        Ok(self.into_variant(variant).into_compound())
    }
}

/// Serializer state for sequences, maps and structs.
///
/// Every element or field is written into a freshly appended child.
pub struct Compound<'a> {
    tree: &'a mut Tree,
    node: NodeId,
    key: Option<String>,
}

impl<'a> Compound<'a> {
    fn push<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let child = self.tree.push_child(self.node, key, "");
        value.serialize(Serializer::new(&mut *self.tree, child))
    }
}

impl<'a> ser::SerializeSeq for Compound<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push("", value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTuple for Compound<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push("", value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleStruct for Compound<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push("", value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeTupleVariant for Compound<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push("", value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeMap for Compound<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key.serialize(KeySerializer)?;
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.push(&key, value)
    }

    fn end(self) -> Result<()> {
        self.tree.sort_children_by_key(self.node);
        Ok(())
    }
}

impl<'a> ser::SerializeStruct for Compound<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a> ser::SerializeStructVariant for Compound<'a> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Turns a map key into the text used as child key.
struct KeySerializer;

fn key_must_be_scalar() -> Error {
    Error::unsupported_type("map keys must be scalars")
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_bool(self, v: bool) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_none(self) -> Result<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_some<T>(self, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(key_must_be_scalar())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_scalar())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_scalar())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_scalar())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_scalar())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_scalar())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_scalar())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_scalar())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_scalar())
    }
}
