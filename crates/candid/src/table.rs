// Path: crates/candid/src/table.rs
//! Type tables: building and encoding them for outgoing messages, and
//! reading them back from untrusted wire input.

use crate::config::DecoderConfig;
use crate::leb128::{write_signed, write_unsigned};
use crate::reader::Reader;
use crate::types::{check_unique, opcode, sorted_fields, Field, FuncMode, Function, Label, Type, TypeEnv};
use crate::{Result, MAGIC};
use ica_types::error::CandidError;
use std::collections::HashMap;

/// A built type table: one encoded entry per distinct composite type, and
/// the SLEB reference of every root type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTable {
    entries: Vec<Vec<u8>>,
    roots: Vec<i64>,
}

impl TypeTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Root references: a non-negative table index or a primitive opcode.
    pub fn roots(&self) -> &[i64] {
        &self.roots
    }

    /// `count, entries.., root count, roots..` (without the magic header).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        write_unsigned(self.entries.len() as u64, out);
        for entry in &self.entries {
            out.extend_from_slice(entry);
        }
        write_unsigned(self.roots.len() as u64, out);
        for root in &self.roots {
            write_signed(*root, out);
        }
    }
}

/// Assigns table slots to every composite type reachable from `roots`.
///
/// Types with the same canonical form share a slot: record and variant
/// fields are compared in id order and non-recursive names are expanded.
/// A slot is reserved before the type's children are visited, so recursive
/// and mutually recursive definitions terminate and refer back to their own
/// index.
pub fn build_type_table(env: &TypeEnv, roots: &[Type]) -> Result<TypeTable> {
    let mut builder = TableBuilder {
        env,
        entries: Vec::new(),
        index: HashMap::new(),
    };
    for root in roots {
        builder.build(root)?;
    }
    let roots = roots
        .iter()
        .map(|root| builder.reference(root))
        .collect::<Result<Vec<_>>>()?;
    Ok(TypeTable {
        entries: builder.entries,
        roots,
    })
}

struct TableBuilder<'a> {
    env: &'a TypeEnv,
    entries: Vec<Vec<u8>>,
    index: HashMap<Type, usize>,
}

impl<'a> TableBuilder<'a> {
    fn build(&mut self, ty: &Type) -> Result<()> {
        let env = self.env;
        let actual = env.resolve(ty)?;
        if actual.primitive_opcode().is_some() {
            return Ok(());
        }
        let key = self.canonical(ty, &mut Vec::new())?;
        if self.index.contains_key(&key) {
            return Ok(());
        }
        let slot = self.entries.len();
        self.index.insert(key, slot);
        self.entries.push(Vec::new());

        let mut buf = Vec::new();
        match actual {
            Type::Opt(inner) | Type::Vec(inner) => {
                self.build(inner)?;
                let code = if matches!(actual, Type::Opt(_)) {
                    opcode::OPT
                } else {
                    opcode::VEC
                };
                write_signed(code, &mut buf);
                self.write_ref(inner, &mut buf)?;
            }
            Type::Record(fields) | Type::Variant(fields) => {
                let sorted = sorted_fields(fields);
                check_unique(&sorted)?;
                for field in &sorted {
                    self.build(&field.ty)?;
                }
                let code = if matches!(actual, Type::Record(_)) {
                    opcode::RECORD
                } else {
                    opcode::VARIANT
                };
                write_signed(code, &mut buf);
                write_unsigned(sorted.len() as u64, &mut buf);
                for field in sorted {
                    write_unsigned(u64::from(field.label.id()), &mut buf);
                    self.write_ref(&field.ty, &mut buf)?;
                }
            }
            Type::Func(func) => {
                for ty in func.args.iter().chain(&func.rets) {
                    self.build(ty)?;
                }
                write_signed(opcode::FUNC, &mut buf);
                self.write_func(func, &mut buf)?;
            }
            Type::Service(methods) => {
                let mut sorted: Vec<&(String, Function)> = methods.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                if sorted.windows(2).any(|w| matches!(w, [a, b] if a.0 == b.0)) {
                    return Err(CandidError::TypeMismatch(
                        "service declares a method twice".into(),
                    ));
                }
                for (_, func) in &sorted {
                    self.build(&Type::Func(func.clone()))?;
                }
                write_signed(opcode::SERVICE, &mut buf);
                write_unsigned(sorted.len() as u64, &mut buf);
                for (name, func) in sorted {
                    write_unsigned(name.len() as u64, &mut buf);
                    buf.extend_from_slice(name.as_bytes());
                    self.write_ref(&Type::Func(func.clone()), &mut buf)?;
                }
            }
            other => {
                return Err(CandidError::Custom(format!(
                    "type {other} has no table entry"
                )))
            }
        }
        if let Some(entry) = self.entries.get_mut(slot) {
            *entry = buf;
        }
        Ok(())
    }

    fn write_func(&self, func: &Function, buf: &mut Vec<u8>) -> Result<()> {
        write_unsigned(func.args.len() as u64, buf);
        for ty in &func.args {
            self.write_ref(ty, buf)?;
        }
        write_unsigned(func.rets.len() as u64, buf);
        for ty in &func.rets {
            self.write_ref(ty, buf)?;
        }
        write_unsigned(func.modes.len() as u64, buf);
        buf.extend(func.modes.iter().map(|m| m.to_byte()));
        Ok(())
    }

    /// The dedup key of `ty`: fields and methods sorted, names expanded
    /// except where they recur inside their own expansion.
    fn canonical(&self, ty: &Type, expanding: &mut Vec<String>) -> Result<Type> {
        Ok(match ty {
            Type::Var(_) => {
                let (name, body) = self.definition(ty)?;
                if expanding.iter().any(|n| n == name) {
                    return Ok(Type::Var(name.to_owned()));
                }
                expanding.push(name.to_owned());
                let out = self.canonical(body, expanding);
                expanding.pop();
                return out;
            }
            Type::Opt(inner) => Type::opt(self.canonical(inner, expanding)?),
            Type::Vec(inner) => Type::vec(self.canonical(inner, expanding)?),
            Type::Record(fields) | Type::Variant(fields) => {
                let fields = sorted_fields(fields)
                    .into_iter()
                    .map(|f| Ok(Field::new(f.label.id(), self.canonical(&f.ty, expanding)?)))
                    .collect::<Result<Vec<_>>>()?;
                if matches!(ty, Type::Record(_)) {
                    Type::Record(fields)
                } else {
                    Type::Variant(fields)
                }
            }
            Type::Func(func) => Type::Func(self.canonical_func(func, expanding)?),
            Type::Service(methods) => {
                let mut sorted: Vec<&(String, Function)> = methods.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                Type::Service(
                    sorted
                        .into_iter()
                        .map(|(name, func)| Ok((name.clone(), self.canonical_func(func, expanding)?)))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            other => other.clone(),
        })
    }

    fn canonical_func(&self, func: &Function, expanding: &mut Vec<String>) -> Result<Function> {
        let mut list = |types: &[Type]| {
            types
                .iter()
                .map(|ty| self.canonical(ty, expanding))
                .collect::<Result<Vec<_>>>()
        };
        let args = list(&func.args)?;
        let rets = list(&func.rets)?;
        Ok(Function {
            args,
            rets,
            modes: func.modes.clone(),
        })
    }

    /// The last name in a `Var` chain and the structure it is bound to.
    fn definition<'t>(&'t self, ty: &'t Type) -> Result<(&'t str, &'t Type)> {
        // Rejects unbound names and unproductive cycles before walking.
        self.env.resolve(ty)?;
        let mut name = "";
        let mut current = ty;
        while let Type::Var(next) = current {
            name = next.as_str();
            current = self
                .env
                .get(next)
                .ok_or_else(|| CandidError::TypeMismatch(format!("unbound type {next}")))?;
        }
        Ok((name, current))
    }

    fn reference(&self, ty: &Type) -> Result<i64> {
        let actual = self.env.resolve(ty)?;
        if let Some(code) = actual.primitive_opcode() {
            return Ok(code);
        }
        let key = self.canonical(ty, &mut Vec::new())?;
        self.index
            .get(&key)
            .map(|slot| *slot as i64)
            .ok_or_else(|| CandidError::Custom(format!("type {actual} was not built")))
    }

    fn write_ref(&self, ty: &Type, buf: &mut Vec<u8>) -> Result<()> {
        write_signed(self.reference(ty)?, buf);
        Ok(())
    }
}

/// The name under which wire table entry `index` is bound.
pub(crate) fn wire_name(index: usize) -> String {
    format!("table{index}")
}

/// A type table read from the wire. Entries are bound as `table0..`
/// in `env`; references between them are [`Type::Var`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireTable {
    pub env: TypeEnv,
    pub roots: Vec<Type>,
}

/// Reads the magic header, the type table and the root type list.
pub(crate) fn read_header(reader: &mut Reader<'_>, config: &DecoderConfig) -> Result<WireTable> {
    let magic = reader.take(MAGIC.len())?;
    if magic != MAGIC {
        return Err(CandidError::Encoding(format!(
            "bad magic header {magic:02x?}"
        )));
    }

    let count = reader.uleb(64)?;
    if count > config.max_type_table_entries as u64 {
        return Err(CandidError::TableTooLarge {
            entries: count,
            limit: config.max_type_table_entries,
        });
    }
    let count = count as usize;

    let mut entries: Vec<Type> = Vec::with_capacity(count.min(reader.remaining()));
    let mut services: Vec<(usize, Vec<(String, i64)>)> = Vec::new();
    for i in 0..count {
        let code = reader.sleb(32)?;
        let entry = match code {
            opcode::OPT => Type::opt(read_ref(reader, count)?),
            opcode::VEC => Type::vec(read_ref(reader, count)?),
            opcode::RECORD => Type::Record(read_fields(reader, count)?),
            opcode::VARIANT => Type::Variant(read_fields(reader, count)?),
            opcode::FUNC => Type::Func(read_func(reader, count)?),
            opcode::SERVICE => {
                let n = reader.len()?;
                let mut methods: Vec<(String, i64)> = Vec::with_capacity(n.min(reader.remaining()));
                for _ in 0..n {
                    let name = reader.text()?;
                    if let Some((prev, _)) = methods.last() {
                        if *prev >= name {
                            return Err(CandidError::Encoding(format!(
                                "service methods out of order at {name:?}"
                            )));
                        }
                    }
                    let target = reader.sleb(32)?;
                    if target < 0 || target as u64 >= count as u64 {
                        return Err(CandidError::Encoding(format!(
                            "service method {name:?} must reference a func entry"
                        )));
                    }
                    methods.push((name, target));
                }
                services.push((i, methods));
                Type::Service(Vec::new())
            }
            other => {
                return Err(CandidError::Encoding(format!(
                    "type table entry {i} has invalid opcode {other}"
                )))
            }
        };
        entries.push(entry);
    }

    for (slot, methods) in services {
        let mut resolved = Vec::with_capacity(methods.len());
        for (name, target) in methods {
            match entries.get(target as usize) {
                Some(Type::Func(func)) => resolved.push((name, func.clone())),
                _ => {
                    return Err(CandidError::Encoding(format!(
                        "service method {name:?} references non-func entry {target}"
                    )))
                }
            }
        }
        if let Some(entry) = entries.get_mut(slot) {
            *entry = Type::Service(resolved);
        }
    }

    let root_count = reader.len()?;
    let mut roots = Vec::with_capacity(root_count.min(reader.remaining()));
    for _ in 0..root_count {
        roots.push(read_ref(reader, count)?);
    }

    let mut env = TypeEnv::new();
    for (i, entry) in entries.into_iter().enumerate() {
        env.insert(wire_name(i), entry);
    }
    log::trace!("read type table with {count} entries and {root_count} roots");
    Ok(WireTable { env, roots })
}

fn read_ref(reader: &mut Reader<'_>, count: usize) -> Result<Type> {
    let code = reader.sleb(32)?;
    if code >= 0 {
        let index = code as usize;
        if index >= count {
            return Err(CandidError::Encoding(format!(
                "type index {index} out of range for a table of {count}"
            )));
        }
        return Ok(Type::Var(wire_name(index)));
    }
    Type::from_primitive_opcode(code)
        .ok_or_else(|| CandidError::Encoding(format!("invalid type reference {code}")))
}

fn read_fields(reader: &mut Reader<'_>, count: usize) -> Result<Vec<Field>> {
    let n = reader.len()?;
    let mut fields: Vec<Field> = Vec::with_capacity(n.min(reader.remaining()));
    for _ in 0..n {
        let id = reader.uleb(32)? as u32;
        if let Some(prev) = fields.last() {
            if prev.label.id() >= id {
                return Err(CandidError::Encoding(format!(
                    "field ids not strictly ascending: {} then {id}",
                    prev.label.id()
                )));
            }
        }
        let ty = read_ref(reader, count)?;
        fields.push(Field {
            label: Label::Id(id),
            ty,
        });
    }
    Ok(fields)
}

fn read_func(reader: &mut Reader<'_>, count: usize) -> Result<Function> {
    let read_list = |reader: &mut Reader<'_>| -> Result<Vec<Type>> {
        let n = reader.len()?;
        let mut list = Vec::with_capacity(n.min(reader.remaining()));
        for _ in 0..n {
            list.push(read_ref(reader, count)?);
        }
        Ok(list)
    };
    let args = read_list(reader)?;
    let rets = read_list(reader)?;
    let n = reader.len()?;
    let modes = reader
        .take(n)?
        .iter()
        .map(|b| FuncMode::from_byte(*b))
        .collect::<Result<Vec<_>>>()?;
    Ok(Function { args, rets, modes })
}
