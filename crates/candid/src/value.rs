// Path: crates/candid/src/value.rs
//! Typed values and their Candid text rendering.

use crate::config::DecoderConfig;
use crate::types::Label;
use crate::Result;
use ica_types::app::Principal;
use num_bigint::{BigInt, BigUint};
use std::fmt;

/// A labelled record field or chosen variant alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub label: Label,
    pub value: Value,
}

impl FieldValue {
    pub fn new(label: impl Into<Label>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A value mirroring the shape of a [`Type`](crate::Type).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Nat(BigUint),
    Int(BigInt),
    Nat8(u8),
    Nat16(u16),
    Nat32(u32),
    Nat64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Reserved,
    Principal(Principal),
    Opt(Option<Box<Value>>),
    Vec(Vec<Value>),
    Record(Vec<FieldValue>),
    Variant(Box<FieldValue>),
    Func(Principal, String),
    Service(Principal),
}

impl Value {
    pub fn some(inner: Value) -> Self {
        Value::Opt(Some(Box::new(inner)))
    }

    pub fn none() -> Self {
        Value::Opt(None)
    }

    /// A `vec nat8` holding `bytes`.
    pub fn blob(bytes: &[u8]) -> Self {
        Value::Vec(bytes.iter().copied().map(Value::Nat8).collect())
    }

    /// The bytes of a `vec nat8`, if this is one.
    pub fn as_blob(&self) -> Option<Vec<u8>> {
        match self {
            Value::Vec(items) => items
                .iter()
                .map(|v| match v {
                    Value::Nat8(b) => Some(*b),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// A record whose fields are labelled `0..n`.
    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Record(
            items
                .into_iter()
                .zip(0u32..)
                .map(|(value, i)| FieldValue::new(i, value))
                .collect(),
        )
    }

    pub fn variant(label: impl Into<Label>, value: Value) -> Self {
        Value::Variant(Box::new(FieldValue::new(label, value)))
    }

    /// The record field with `label`, if any.
    pub fn field(&self, label: impl Into<Label>) -> Option<&Value> {
        let label = label.into();
        match self {
            Value::Record(fields) => fields.iter().find(|f| f.label == label).map(|f| &f.value),
            _ => None,
        }
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[FieldValue]) -> fmt::Result {
    for field in fields {
        write!(f, " {} = {};", field.label, field.value)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nat(n) => write!(f, "{n} : nat"),
            Value::Int(n) if n.sign() == num_bigint::Sign::Minus => write!(f, "{n} : int"),
            Value::Int(n) => write!(f, "+{n} : int"),
            Value::Nat8(n) => write!(f, "{n} : nat8"),
            Value::Nat16(n) => write!(f, "{n} : nat16"),
            Value::Nat32(n) => write!(f, "{n} : nat32"),
            Value::Nat64(n) => write!(f, "{n} : nat64"),
            Value::Int8(n) => write!(f, "{n:+} : int8"),
            Value::Int16(n) => write!(f, "{n:+} : int16"),
            Value::Int32(n) => write!(f, "{n:+} : int32"),
            Value::Int64(n) => write!(f, "{n:+} : int64"),
            Value::Float32(x) => write!(f, "{x:?} : float32"),
            Value::Float64(x) => write!(f, "{x:?} : float64"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Reserved => f.write_str("null : reserved"),
            Value::Principal(p) => write!(f, "principal \"{p}\""),
            Value::Opt(None) => f.write_str("null"),
            Value::Opt(Some(v)) => write!(f, "opt {v}"),
            Value::Vec(items) => {
                f.write_str("vec {")?;
                for item in items {
                    write!(f, " {item};")?;
                }
                f.write_str(" }")
            }
            Value::Record(fields) => {
                f.write_str("record {")?;
                write_fields(f, fields)?;
                f.write_str(" }")
            }
            Value::Variant(field) if field.value == Value::Null => {
                write!(f, "variant {{ {} }}", field.label)
            }
            Value::Variant(field) => write!(f, "variant {{ {} = {} }}", field.label, field.value),
            Value::Func(p, method) => write!(f, "func \"{p}\".{method}"),
            Value::Service(p) => write!(f, "service \"{p}\""),
        }
    }
}

/// A decoded message whose values were reconstructed from the wire types
/// alone, with no expected type to guide them.
#[derive(Debug, Clone, PartialEq)]
pub struct IdlArgs {
    pub args: Vec<Value>,
}

impl IdlArgs {
    /// Decodes a complete message without an expected type.
    pub fn from_bytes(bytes: &[u8], config: &DecoderConfig) -> Result<Self> {
        crate::decoder::decode_untyped(bytes, config)
    }
}

impl fmt::Display for IdlArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}
