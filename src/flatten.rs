//! Custom serde Serializer that flattens any nested `Serialize` value into
//! canonical property keys with string values.
//!
//! Maps and structs descend with `.`, sequences with `[i]`. An empty map or
//! sequence is kept as an empty-string leaf so "present but empty" survives
//! flattening; `None` and unit values produce nothing.

use serde::ser::{self, Serialize};
use thiserror::Error;

use crate::path::{child_key, index_key};

/// Field name toml uses to smuggle datetimes through serde.
const TOML_DATETIME_FIELD: &str = "$__toml_private_datetime";

/// Flatten a `Serialize` value into `(canonical_key, value)` pairs.
///
/// `{"db": {"hosts": ["a", "b"]}, "tags": {}}` →
/// `[("db.hosts[0]", "a"), ("db.hosts[1]", "b"), ("tags", "")]`
pub fn flatten<S: Serialize + ?Sized>(source: &S) -> Result<Vec<(String, String)>, FlattenError> {
    let mut out = Vec::new();
    let serializer = FlattenSerializer {
        prefix: String::new(),
        out: &mut out,
    };
    source.serialize(serializer)?;
    Ok(out)
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct FlattenError(String);

impl ser::Error for FlattenError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        FlattenError(msg.to_string())
    }
}

type Out = Vec<(String, String)>;

struct FlattenSerializer<'a> {
    prefix: String,
    out: &'a mut Out,
}

impl FlattenSerializer<'_> {
    fn emit(self, value: String) -> Result<(), FlattenError> {
        if self.prefix.is_empty() {
            return Err(FlattenError(format!(
                "top-level value '{value}' must be a map or a sequence"
            )));
        }
        self.out.push((self.prefix, value));
        Ok(())
    }
}

/// Shared tail for every container: an empty one leaves a `""` leaf behind.
fn close_container(prefix: String, out: &mut Out, start_len: usize) {
    if out.len() == start_len && !prefix.is_empty() {
        out.push((prefix, String::new()));
    }
}

impl<'a> ser::Serializer for FlattenSerializer<'a> {
    type Ok = ();
    type Error = FlattenError;
    type SerializeSeq = FlattenSeqSerializer<'a>;
    type SerializeTuple = FlattenSeqSerializer<'a>;
    type SerializeTupleStruct = FlattenSeqSerializer<'a>;
    type SerializeTupleVariant = FlattenSeqSerializer<'a>;
    type SerializeMap = FlattenMapSerializer<'a>;
    type SerializeStruct = FlattenStructSerializer<'a>;
    type SerializeStructVariant = FlattenStructSerializer<'a>;

    fn serialize_bool(self, v: bool) -> Result<(), Self::Error> {
        self.emit(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<(), Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<(), Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<(), Self::Error> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<(), Self::Error> {
        self.emit(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<(), Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<(), Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<(), Self::Error> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<(), Self::Error> {
        self.emit(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<(), Self::Error> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<(), Self::Error> {
        self.emit(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<(), Self::Error> {
        self.emit(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<(), Self::Error> {
        self.emit(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<(), Self::Error> {
        Err(FlattenError("bytes not supported".into()))
    }

    fn serialize_none(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), Self::Error> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        let start_len = self.out.len();
        Ok(FlattenSeqSerializer {
            prefix: self.prefix,
            out: self.out,
            next: 0,
            start_len,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        let start_len = self.out.len();
        Ok(FlattenMapSerializer {
            prefix: self.prefix,
            out: self.out,
            current_key: None,
            start_len,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        let start_len = self.out.len();
        Ok(FlattenStructSerializer {
            prefix: self.prefix,
            out: self.out,
            start_len,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        self.serialize_struct("", len)
    }
}

// --- SerializeStruct ---

struct FlattenStructSerializer<'a> {
    prefix: String,
    out: &'a mut Out,
    start_len: usize,
}

impl ser::SerializeStruct for FlattenStructSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        let prefix = if key == TOML_DATETIME_FIELD {
            self.prefix.clone()
        } else {
            child_key(&self.prefix, key)
        };
        value.serialize(FlattenSerializer {
            prefix,
            out: self.out,
        })
    }

    fn end(self) -> Result<(), Self::Error> {
        close_container(self.prefix, self.out, self.start_len);
        Ok(())
    }
}

impl ser::SerializeStructVariant for FlattenStructSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<(), Self::Error> {
        ser::SerializeStruct::end(self)
    }
}

// --- SerializeMap ---

struct FlattenMapSerializer<'a> {
    prefix: String,
    out: &'a mut Out,
    current_key: Option<String>,
    start_len: usize,
}

impl ser::SerializeMap for FlattenMapSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Self::Error> {
        self.current_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| FlattenError("serialize_value called without serialize_key".into()))?;
        value.serialize(FlattenSerializer {
            prefix: child_key(&self.prefix, &key),
            out: self.out,
        })
    }

    fn end(self) -> Result<(), Self::Error> {
        close_container(self.prefix, self.out, self.start_len);
        Ok(())
    }
}

// --- SerializeSeq (each element gets its own `[i]` key) ---

struct FlattenSeqSerializer<'a> {
    prefix: String,
    out: &'a mut Out,
    next: usize,
    start_len: usize,
}

impl ser::SerializeSeq for FlattenSeqSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        let prefix = index_key(&self.prefix, self.next);
        self.next += 1;
        value.serialize(FlattenSerializer {
            prefix,
            out: self.out,
        })
    }

    fn end(self) -> Result<(), Self::Error> {
        close_container(self.prefix, self.out, self.start_len);
        Ok(())
    }
}

impl ser::SerializeTuple for FlattenSeqSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<(), Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for FlattenSeqSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<(), Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for FlattenSeqSerializer<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Self::Error> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<(), Self::Error> {
        ser::SerializeSeq::end(self)
    }
}

// --- Key serializer (extracts string keys from map keys) ---

struct KeySerializer;

fn non_string_key<T>() -> Result<T, FlattenError> {
    Err(FlattenError("map keys must be strings".into()))
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = FlattenError;
    type SerializeSeq = ser::Impossible<String, FlattenError>;
    type SerializeTuple = ser::Impossible<String, FlattenError>;
    type SerializeTupleStruct = ser::Impossible<String, FlattenError>;
    type SerializeTupleVariant = ser::Impossible<String, FlattenError>;
    type SerializeMap = ser::Impossible<String, FlattenError>;
    type SerializeStruct = ser::Impossible<String, FlattenError>;
    type SerializeStructVariant = ser::Impossible<String, FlattenError>;

    fn serialize_str(self, v: &str) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_char(self, v: char) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        v: &'static str,
    ) -> Result<String, Self::Error> {
        Ok(v.to_string())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        v: &T,
    ) -> Result<String, Self::Error> {
        v.serialize(self)
    }

    fn serialize_bool(self, _: bool) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_i8(self, _: i8) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_i16(self, _: i16) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_i32(self, _: i32) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_i64(self, _: i64) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_u8(self, _: u8) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_u16(self, _: u16) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_u32(self, _: u32) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_u64(self, _: u64) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_f32(self, _: f32) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_f64(self, _: f64) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_none(self) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_some<T: Serialize + ?Sized>(self, _: &T) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_unit(self) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<String, Self::Error> {
        non_string_key()
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        non_string_key()
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, Self::Error> {
        non_string_key()
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        non_string_key()
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        non_string_key()
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        non_string_key()
    }
    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        non_string_key()
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        non_string_key()
    }
}
