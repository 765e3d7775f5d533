// Path: crates/candid/src/encoder.rs
//! Serializes values against their declared types.

use crate::leb128::{write_int, write_nat, write_unsigned};
use crate::table::build_type_table;
use crate::types::{check_unique, sorted_fields, IntWidth, Type, TypeEnv};
use crate::value::Value;
use crate::{Result, MAGIC};
use ica_types::error::CandidError;

/// Encodes a complete message: magic, type table, then each value.
///
/// Fails with [`CandidError::TypeMismatch`] when a value's shape does not
/// match its type, or when the number of values and types differ.
pub fn encode_args(env: &TypeEnv, types: &[Type], values: &[Value]) -> Result<Vec<u8>> {
    if types.len() != values.len() {
        return Err(CandidError::TypeMismatch(format!(
            "{} values for {} argument types",
            values.len(),
            types.len()
        )));
    }
    let table = build_type_table(env, types)?;
    let mut out = MAGIC.to_vec();
    table.encode_into(&mut out);
    for (value, ty) in values.iter().zip(types) {
        write_value(env, value, ty, &mut out)?;
    }
    Ok(out)
}

/// Encodes a single-value message.
pub fn encode_one(env: &TypeEnv, ty: &Type, value: &Value) -> Result<Vec<u8>> {
    encode_args(env, std::slice::from_ref(ty), std::slice::from_ref(value))
}

fn mismatch(value: &Value, ty: &Type) -> CandidError {
    CandidError::TypeMismatch(format!("cannot encode {value} as {ty}"))
}

fn write_value(env: &TypeEnv, value: &Value, ty: &Type, out: &mut Vec<u8>) -> Result<()> {
    let ty = env.resolve(ty)?;
    match (value, ty) {
        (Value::Null, Type::Null) | (Value::Reserved, Type::Reserved) => {}
        (Value::Bool(b), Type::Bool) => out.push(u8::from(*b)),
        (Value::Nat(n), Type::Nat) => write_nat(n, out),
        (Value::Int(n), Type::Int) => write_int(n, out),
        (Value::Nat8(n), Type::NatN(IntWidth::W8)) => out.push(*n),
        (Value::Nat16(n), Type::NatN(IntWidth::W16)) => out.extend_from_slice(&n.to_le_bytes()),
        (Value::Nat32(n), Type::NatN(IntWidth::W32)) => out.extend_from_slice(&n.to_le_bytes()),
        (Value::Nat64(n), Type::NatN(IntWidth::W64)) => out.extend_from_slice(&n.to_le_bytes()),
        (Value::Int8(n), Type::IntN(IntWidth::W8)) => out.extend_from_slice(&n.to_le_bytes()),
        (Value::Int16(n), Type::IntN(IntWidth::W16)) => out.extend_from_slice(&n.to_le_bytes()),
        (Value::Int32(n), Type::IntN(IntWidth::W32)) => out.extend_from_slice(&n.to_le_bytes()),
        (Value::Int64(n), Type::IntN(IntWidth::W64)) => out.extend_from_slice(&n.to_le_bytes()),
        (Value::Float32(x), Type::Float32) => out.extend_from_slice(&x.to_le_bytes()),
        (Value::Float64(x), Type::Float64) => out.extend_from_slice(&x.to_le_bytes()),
        (Value::Text(s), Type::Text) => write_blob(s.as_bytes(), out),
        (Value::Principal(p), Type::Principal) => {
            out.push(1);
            write_blob(p.as_slice(), out);
        }
        (Value::Opt(None), Type::Opt(_)) => out.push(0),
        (Value::Opt(Some(inner)), Type::Opt(inner_ty)) => {
            out.push(1);
            write_value(env, inner, inner_ty, out)?;
        }
        (Value::Vec(items), Type::Vec(item_ty)) => {
            write_unsigned(items.len() as u64, out);
            for item in items {
                write_value(env, item, item_ty, out)?;
            }
        }
        (Value::Record(values), Type::Record(fields)) => {
            let sorted = sorted_fields(fields);
            check_unique(&sorted)?;
            if values.len() != sorted.len() {
                return Err(mismatch(value, ty));
            }
            for field in sorted {
                let field_value = values
                    .iter()
                    .find(|v| v.label == field.label)
                    .ok_or_else(|| {
                        CandidError::TypeMismatch(format!(
                            "record value has no field {}",
                            field.label
                        ))
                    })?;
                write_value(env, &field_value.value, &field.ty, out)?;
            }
        }
        (Value::Variant(chosen), Type::Variant(fields)) => {
            let sorted = sorted_fields(fields);
            check_unique(&sorted)?;
            let (index, field) = sorted
                .iter()
                .enumerate()
                .find(|(_, f)| f.label == chosen.label)
                .ok_or_else(|| {
                    CandidError::TypeMismatch(format!(
                        "variant {ty} has no alternative {}",
                        chosen.label
                    ))
                })?;
            write_unsigned(index as u64, out);
            write_value(env, &chosen.value, &field.ty, out)?;
        }
        (Value::Func(p, method), Type::Func(_)) => {
            out.push(1);
            write_service_ref(p.as_slice(), out);
            write_blob(method.as_bytes(), out);
        }
        (Value::Service(p), Type::Service(_)) => write_service_ref(p.as_slice(), out),
        _ => return Err(mismatch(value, ty)),
    }
    Ok(())
}

/// A transparent service reference: `1`, then a transparent principal.
fn write_service_ref(principal: &[u8], out: &mut Vec<u8>) {
    out.push(1);
    out.push(1);
    write_blob(principal, out);
}

fn write_blob(bytes: &[u8], out: &mut Vec<u8>) {
    write_unsigned(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;
    use crate::value::FieldValue;
    use num_bigint::{BigInt, BigUint};

    fn enc(ty: Type, value: Value) -> String {
        hex::encode(encode_one(&TypeEnv::new(), &ty, &value).unwrap())
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(enc(Type::Nat, Value::Nat(BigUint::from(1u8))), "4449444c00017d01");
        assert_eq!(enc(Type::Int, Value::Int(BigInt::from(-1))), "4449444c00017c7f");
        assert_eq!(enc(Type::Bool, Value::Bool(true)), "4449444c00017e01");
        assert_eq!(enc(Type::Text, Value::Text("hi".into())), "4449444c0001710268 69".replace(' ', ""));
        assert_eq!(enc(Type::NatN(IntWidth::W16), Value::Nat16(0x0102)), "4449444c00017a0201");
        assert_eq!(enc(Type::opt(Type::Nat), Value::none()), "4449444c016e7d010000");
    }

    #[test]
    fn test_empty_args() {
        assert_eq!(hex::encode(encode_args(&TypeEnv::new(), &[], &[]).unwrap()), "4449444c0000");
    }

    #[test]
    fn test_record_fields_written_in_id_order() {
        let ty = Type::Record(vec![Field::new(2u32, Type::Nat), Field::new(1u32, Type::Bool)]);
        let value = Value::Record(vec![
            FieldValue::new(2u32, Value::Nat(BigUint::from(5u8))),
            FieldValue::new(1u32, Value::Bool(false)),
        ]);
        assert!(enc(ty, value).ends_with("0005"));
    }

    #[test]
    fn test_variant_index_is_sorted_position() {
        let ty = Type::Variant(vec![Field::new("ok", Type::Nat), Field::new("err", Type::Text)]);
        let value = Value::variant("ok", Value::Nat(BigUint::from(7u8)));
        let index_of_ok = u8::from(crate::idl_hash("ok") > crate::idl_hash("err"));
        assert!(enc(ty, value).ends_with(&format!("{index_of_ok:02x}07")));
    }

    #[test]
    fn test_shape_mismatch() {
        let env = TypeEnv::new();
        assert!(matches!(
            encode_one(&env, &Type::Nat, &Value::Text("x".into())),
            Err(CandidError::TypeMismatch(_))
        ));
        assert!(matches!(
            encode_one(
                &env,
                &Type::Record(vec![Field::new("a", Type::Nat)]),
                &Value::Record(vec![])
            ),
            Err(CandidError::TypeMismatch(_))
        ));
        assert!(matches!(
            encode_one(
                &env,
                &Type::Variant(vec![Field::new("a", Type::Null)]),
                &Value::variant("b", Value::Null)
            ),
            Err(CandidError::TypeMismatch(_))
        ));
        assert!(matches!(
            encode_args(&env, &[Type::Nat], &[]),
            Err(CandidError::TypeMismatch(_))
        ));
    }
}
