// Path: crates/candid/src/decoder/mod.rs
//! Decodes wire messages, applying the subtyping rules that let a newer
//! producer talk to an older consumer:
//!
//! - records may carry fields the expected type lacks (skipped);
//! - expected `opt`, `null` and `reserved` fields absent from the wire
//!   decode to `null`;
//! - a wire variant alternative absent from the expected type fails;
//! - `nat` widens to `int`;
//! - `reserved` accepts and discards any value;
//! - an expected `opt T` accepts a bare `T`, and decodes to `null` when
//!   the wire value cannot be read as `T`.

use crate::config::DecoderConfig;
use crate::reader::Reader;
use crate::table::read_header;
use crate::types::{sorted_fields, Field, IntWidth, Label, Type, TypeEnv};
use crate::value::{FieldValue, IdlArgs, Value};
use crate::Result;
use ica_types::app::Principal;
use ica_types::error::CandidError;
use num_bigint::BigInt;

/// Decodes a message into `expected.len()` values.
///
/// Expected arguments missing from the wire must be `opt`, `null` or
/// `reserved`. Surplus wire arguments are skipped.
pub fn decode_args(
    bytes: &[u8],
    env: &TypeEnv,
    expected: &[Type],
    config: &DecoderConfig,
) -> Result<Vec<Value>> {
    let mut reader = Reader::new(bytes);
    let wire = read_header(&mut reader, config)?;
    let mut decoder = Decoder::new(reader, &wire.env, env, config);

    let mut values = Vec::with_capacity(expected.len());
    for (i, ty) in expected.iter().enumerate() {
        let value = match wire.roots.get(i) {
            Some(wire_ty) => decoder.value(wire_ty, ty, 0)?,
            None => decoder.absent(ty, || format!("argument {i}"))?,
        };
        values.push(value);
    }
    for wire_ty in wire.roots.iter().skip(expected.len()) {
        decoder.skip(wire_ty, 0)?;
    }
    decoder.finish()?;
    Ok(values)
}

/// Decodes a single-value message.
pub fn decode_one(bytes: &[u8], env: &TypeEnv, expected: &Type, config: &DecoderConfig) -> Result<Value> {
    let mut values = decode_args(bytes, env, std::slice::from_ref(expected), config)?;
    values
        .pop()
        .ok_or_else(|| CandidError::Custom("decoder returned no value".into()))
}

pub(crate) fn decode_untyped(bytes: &[u8], config: &DecoderConfig) -> Result<IdlArgs> {
    let mut reader = Reader::new(bytes);
    let wire = read_header(&mut reader, config)?;
    let empty = TypeEnv::new();
    let mut decoder = Decoder::new(reader, &wire.env, &empty, config);
    let args = wire
        .roots
        .iter()
        .map(|ty| decoder.untyped(ty, 0))
        .collect::<Result<Vec<_>>>()?;
    decoder.finish()?;
    Ok(IdlArgs { args })
}

struct Decoder<'b, 'e> {
    reader: Reader<'b>,
    wire: &'e TypeEnv,
    expected: &'e TypeEnv,
    config: DecoderConfig,
    elements: usize,
}

impl<'b, 'e> Decoder<'b, 'e> {
    fn new(reader: Reader<'b>, wire: &'e TypeEnv, expected: &'e TypeEnv, config: &DecoderConfig) -> Self {
        Self {
            reader,
            wire,
            expected,
            config: *config,
            elements: 0,
        }
    }

    fn finish(&self) -> Result<()> {
        match self.reader.remaining() {
            0 => Ok(()),
            n => Err(CandidError::Encoding(format!("{n} trailing bytes after the last value"))),
        }
    }

    fn enter(&mut self, depth: usize, charge: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(CandidError::DepthExceeded(self.config.max_depth));
        }
        self.elements = self.elements.saturating_add(charge);
        if self.elements > self.config.max_elements {
            return Err(CandidError::QuotaExceeded(format!(
                "more than {} elements",
                self.config.max_elements
            )));
        }
        Ok(())
    }

    /// The value of a missing field or argument of type `ty`.
    fn absent(&self, ty: &Type, what: impl FnOnce() -> String) -> Result<Value> {
        match self.expected.resolve(ty)? {
            Type::Opt(_) => Ok(Value::none()),
            Type::Null => Ok(Value::Null),
            Type::Reserved => Ok(Value::Reserved),
            other => Err(CandidError::TypeMismatch(format!(
                "{} of type {other} is missing from the wire",
                what()
            ))),
        }
    }

    fn value(&mut self, wire: &Type, expected: &Type, depth: usize) -> Result<Value> {
        self.enter(depth, 1)?;
        let (wire_env, expected_env) = (self.wire, self.expected);
        let w = wire_env.resolve(wire)?;
        let e = expected_env.resolve(expected)?;

        match (w, e) {
            (_, Type::Reserved) => {
                self.skip(w, depth)?;
                Ok(Value::Reserved)
            }
            (_, Type::Opt(inner)) => self.opt(w, inner, depth),
            (Type::Empty, _) => Err(CandidError::TypeMismatch(
                "no value has type empty".into(),
            )),
            (Type::Null, Type::Null) => Ok(Value::Null),
            (Type::Bool, Type::Bool) => self.bool(),
            (Type::Nat, Type::Nat) => Ok(Value::Nat(self.reader.nat()?)),
            (Type::Nat, Type::Int) => Ok(Value::Int(BigInt::from(self.reader.nat()?))),
            (Type::Int, Type::Int) => Ok(Value::Int(self.reader.int()?)),
            (Type::NatN(a), Type::NatN(b)) if a == b => self.fixed_nat(*a),
            (Type::IntN(a), Type::IntN(b)) if a == b => self.fixed_int(*a),
            (Type::Float32, Type::Float32) => {
                Ok(Value::Float32(f32::from_le_bytes(self.reader.take_array()?)))
            }
            (Type::Float64, Type::Float64) => {
                Ok(Value::Float64(f64::from_le_bytes(self.reader.take_array()?)))
            }
            (Type::Text, Type::Text) => Ok(Value::Text(self.reader.text()?)),
            (Type::Principal, Type::Principal) => Ok(Value::Principal(self.principal()?)),
            (Type::Vec(w_item), Type::Vec(e_item)) => {
                let len = self.vec_len(depth)?;
                let mut items = Vec::with_capacity(len.min(self.reader.remaining()));
                for _ in 0..len {
                    items.push(self.value(w_item, e_item, depth + 1)?);
                }
                Ok(Value::Vec(items))
            }
            (Type::Record(w_fields), Type::Record(e_fields)) => {
                self.record(w_fields, e_fields, depth)
            }
            (Type::Variant(w_fields), Type::Variant(e_fields)) => {
                let (w_field, index) = self.variant_tag(w_fields)?;
                let target = e_fields
                    .iter()
                    .find(|f| f.label.id() == w_field.label.id())
                    .ok_or_else(|| {
                        CandidError::TypeMismatch(format!(
                            "variant alternative {} (wire index {index}) is absent from {e}",
                            w_field.label
                        ))
                    })?;
                let value = self.value(&w_field.ty, &target.ty, depth + 1)?;
                Ok(Value::Variant(Box::new(FieldValue {
                    label: target.label.clone(),
                    value,
                })))
            }
            (Type::Func(_), Type::Func(_)) => self.func(),
            (Type::Service(_), Type::Service(_)) => Ok(Value::Service(self.service()?)),
            _ => Err(CandidError::TypeMismatch(format!(
                "wire type {w} is not a subtype of {e}"
            ))),
        }
    }

    fn opt(&mut self, w: &Type, e_inner: &Type, depth: usize) -> Result<Value> {
        match w {
            Type::Null | Type::Reserved => Ok(Value::none()),
            Type::Opt(w_inner) => match self.reader.byte()? {
                0 => Ok(Value::none()),
                1 => self.coerce(w_inner, e_inner, depth + 1),
                tag => Err(CandidError::Encoding(format!("invalid opt tag {tag}"))),
            },
            _ => {
                let expected_env = self.expected;
                match expected_env.resolve(e_inner)? {
                    // `opt null`, `opt reserved` and `opt opt T` never lift a bare value.
                    Type::Null | Type::Reserved | Type::Opt(_) => {
                        self.skip(w, depth)?;
                        Ok(Value::none())
                    }
                    _ => self.coerce(w, e_inner, depth + 1),
                }
            }
        }
    }

    /// Reads `w` as `Some(e)`, or skips it and yields `None` when the wire
    /// value is not a subtype. Other errors still abort.
    fn coerce(&mut self, w: &Type, e: &Type, depth: usize) -> Result<Value> {
        let start = self.reader.position();
        let charged = self.elements;
        match self.value(w, e, depth) {
            Ok(value) => Ok(Value::some(value)),
            Err(CandidError::TypeMismatch(reason)) => {
                log::debug!("opt payload decodes as null: {reason}");
                // The skip below charges the payload again.
                self.reader.rewind(start);
                self.elements = charged;
                self.skip(w, depth)?;
                Ok(Value::none())
            }
            Err(err) => Err(err),
        }
    }

    fn record(&mut self, w_fields: &[Field], e_fields: &[Field], depth: usize) -> Result<Value> {
        let expected = sorted_fields(e_fields);
        let mut slots: Vec<Option<Value>> = vec![None; expected.len()];
        // Wire fields arrive in ascending id order.
        for w_field in w_fields {
            match expected
                .iter()
                .position(|f| f.label.id() == w_field.label.id())
            {
                Some(i) => {
                    let e_field = expected.get(i).copied();
                    if let (Some(e_field), Some(slot)) = (e_field, slots.get_mut(i)) {
                        *slot = Some(self.value(&w_field.ty, &e_field.ty, depth + 1)?);
                    }
                }
                None => self.skip(&w_field.ty, depth + 1)?,
            }
        }
        let mut fields = Vec::with_capacity(expected.len());
        for (e_field, slot) in expected.into_iter().zip(slots) {
            let value = match slot {
                Some(value) => value,
                None => self.absent(&e_field.ty, || format!("record field {}", e_field.label))?,
            };
            fields.push(FieldValue {
                label: e_field.label.clone(),
                value,
            });
        }
        Ok(Value::Record(fields))
    }

    fn variant_tag<'f>(&mut self, w_fields: &'f [Field]) -> Result<(&'f Field, usize)> {
        let index = self.reader.len()?;
        let field = w_fields.get(index).ok_or_else(|| {
            CandidError::Encoding(format!(
                "variant index {index} out of range for {} alternatives",
                w_fields.len()
            ))
        })?;
        Ok((field, index))
    }

    fn vec_len(&mut self, depth: usize) -> Result<usize> {
        let len = self.reader.len()?;
        // Charged up front so zero-sized elements cannot stall the decoder.
        self.enter(depth, len)?;
        Ok(len)
    }

    fn skip(&mut self, w: &Type, depth: usize) -> Result<()> {
        self.untyped(w, depth).map(drop)
    }

    /// Reads a value guided only by its wire type.
    fn untyped(&mut self, wire: &Type, depth: usize) -> Result<Value> {
        self.enter(depth, 1)?;
        let wire_env = self.wire;
        match wire_env.resolve(wire)? {
            Type::Null => Ok(Value::Null),
            Type::Reserved => Ok(Value::Reserved),
            Type::Empty => Err(CandidError::TypeMismatch("no value has type empty".into())),
            Type::Bool => self.bool(),
            Type::Nat => Ok(Value::Nat(self.reader.nat()?)),
            Type::Int => Ok(Value::Int(self.reader.int()?)),
            Type::NatN(width) => self.fixed_nat(*width),
            Type::IntN(width) => self.fixed_int(*width),
            Type::Float32 => Ok(Value::Float32(f32::from_le_bytes(self.reader.take_array()?))),
            Type::Float64 => Ok(Value::Float64(f64::from_le_bytes(self.reader.take_array()?))),
            Type::Text => Ok(Value::Text(self.reader.text()?)),
            Type::Principal => Ok(Value::Principal(self.principal()?)),
            Type::Opt(inner) => match self.reader.byte()? {
                0 => Ok(Value::none()),
                1 => Ok(Value::some(self.untyped(inner, depth + 1)?)),
                tag => Err(CandidError::Encoding(format!("invalid opt tag {tag}"))),
            },
            Type::Vec(item) => {
                let len = self.vec_len(depth)?;
                let mut items = Vec::with_capacity(len.min(self.reader.remaining()));
                for _ in 0..len {
                    items.push(self.untyped(item, depth + 1)?);
                }
                Ok(Value::Vec(items))
            }
            Type::Record(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    values.push(FieldValue {
                        label: Label::Id(field.label.id()),
                        value: self.untyped(&field.ty, depth + 1)?,
                    });
                }
                Ok(Value::Record(values))
            }
            Type::Variant(fields) => {
                let (field, _) = self.variant_tag(fields)?;
                let value = self.untyped(&field.ty, depth + 1)?;
                Ok(Value::Variant(Box::new(FieldValue {
                    label: Label::Id(field.label.id()),
                    value,
                })))
            }
            Type::Func(_) => self.func(),
            Type::Service(_) => Ok(Value::Service(self.service()?)),
            Type::Var(name) => Err(CandidError::Custom(format!("unresolved wire type {name}"))),
        }
    }

    fn bool(&mut self) -> Result<Value> {
        match self.reader.byte()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            b => Err(CandidError::Encoding(format!("invalid bool byte {b}"))),
        }
    }

    fn fixed_nat(&mut self, width: IntWidth) -> Result<Value> {
        let r = &mut self.reader;
        Ok(match width {
            IntWidth::W8 => Value::Nat8(r.byte()?),
            IntWidth::W16 => Value::Nat16(u16::from_le_bytes(r.take_array()?)),
            IntWidth::W32 => Value::Nat32(u32::from_le_bytes(r.take_array()?)),
            IntWidth::W64 => Value::Nat64(u64::from_le_bytes(r.take_array()?)),
        })
    }

    fn fixed_int(&mut self, width: IntWidth) -> Result<Value> {
        let r = &mut self.reader;
        Ok(match width {
            IntWidth::W8 => Value::Int8(i8::from_le_bytes(r.take_array()?)),
            IntWidth::W16 => Value::Int16(i16::from_le_bytes(r.take_array()?)),
            IntWidth::W32 => Value::Int32(i32::from_le_bytes(r.take_array()?)),
            IntWidth::W64 => Value::Int64(i64::from_le_bytes(r.take_array()?)),
        })
    }

    fn principal(&mut self) -> Result<Principal> {
        match self.reader.byte()? {
            1 => {
                let bytes = self.reader.blob()?;
                Principal::try_from_slice(bytes)
                    .map_err(|e| CandidError::Encoding(format!("invalid principal: {e}")))
            }
            0 => Err(CandidError::Encoding("opaque principal references are not supported".into())),
            b => Err(CandidError::Encoding(format!("invalid principal tag {b}"))),
        }
    }

    fn service(&mut self) -> Result<Principal> {
        match self.reader.byte()? {
            1 => self.principal(),
            0 => Err(CandidError::Encoding("opaque service references are not supported".into())),
            b => Err(CandidError::Encoding(format!("invalid reference tag {b}"))),
        }
    }

    fn func(&mut self) -> Result<Value> {
        match self.reader.byte()? {
            1 => {
                let principal = self.service()?;
                let method = self.reader.text()?;
                Ok(Value::Func(principal, method))
            }
            0 => Err(CandidError::Encoding("opaque func references are not supported".into())),
            b => Err(CandidError::Encoding(format!("invalid reference tag {b}"))),
        }
    }
}
