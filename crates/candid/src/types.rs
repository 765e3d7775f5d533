// Path: crates/candid/src/types.rs
//! The type descriptor algebra.
//!
//! Recursive types never nest inside themselves: they name a [`Type::Var`]
//! that a [`TypeEnv`] resolves, so a cyclic interface is a flat table of
//! definitions rather than a self-referential graph.

use crate::Result;
use ica_types::error::CandidError;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The 32-bit id of a named field: `h = h * 223 + byte (mod 2^32)`.
pub fn idl_hash(name: &str) -> u32 {
    name.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(223).wrapping_add(u32::from(b)))
}

/// A record or variant field label. Labels compare, order and hash by id,
/// so `Named("a")` equals `Id(idl_hash("a"))`.
#[derive(Debug, Clone)]
pub enum Label {
    /// An explicit numeric id, as read from the wire.
    Id(u32),
    /// A field name; its id is [`idl_hash`] of the name.
    Named(String),
}

impl Label {
    pub fn id(&self) -> u32 {
        match self {
            Label::Id(id) => *id,
            Label::Named(name) => idl_hash(name),
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::Named(name.to_owned())
    }
}

impl From<u32> for Label {
    fn from(id: u32) -> Self {
        Label::Id(id)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Id(id) => write!(f, "{id}"),
            Label::Named(name) => f.write_str(name),
        }
    }
}

/// Width of the fixed-size `natN` / `intN` types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

/// A `func` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FuncMode {
    Query,
    Oneway,
    CompositeQuery,
}

impl FuncMode {
    pub fn to_byte(self) -> u8 {
        match self {
            FuncMode::Query => 1,
            FuncMode::Oneway => 2,
            FuncMode::CompositeQuery => 3,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(FuncMode::Query),
            2 => Ok(FuncMode::Oneway),
            3 => Ok(FuncMode::CompositeQuery),
            other => Err(CandidError::Encoding(format!(
                "unknown func annotation {other}"
            ))),
        }
    }
}

/// A method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Function {
    pub args: Vec<Type>,
    pub rets: Vec<Type>,
    pub modes: Vec<FuncMode>,
}

/// A record or variant field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub label: Label,
    pub ty: Type,
}

impl Field {
    pub fn new(label: impl Into<Label>, ty: Type) -> Self {
        Self {
            label: label.into(),
            ty,
        }
    }
}

/// A type descriptor. Equality here is syntactic: field order and `Var`
/// names matter. The type table dedups on a canonical form instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Bool,
    Nat,
    Int,
    NatN(IntWidth),
    IntN(IntWidth),
    Float32,
    Float64,
    Text,
    Reserved,
    Empty,
    Principal,
    Opt(Box<Type>),
    Vec(Box<Type>),
    Record(Vec<Field>),
    Variant(Vec<Field>),
    Func(Function),
    /// Methods, unique by name.
    Service(Vec<(String, Function)>),
    /// A named reference resolved through a [`TypeEnv`].
    Var(String),
}

impl Type {
    pub fn opt(inner: Type) -> Self {
        Type::Opt(Box::new(inner))
    }

    pub fn vec(inner: Type) -> Self {
        Type::Vec(Box::new(inner))
    }

    /// A record whose fields are labelled `0..n`.
    pub fn tuple(items: impl IntoIterator<Item = Type>) -> Self {
        Type::Record(
            items
                .into_iter()
                .zip(0u32..)
                .map(|(ty, i)| Field::new(i, ty))
                .collect(),
        )
    }

    /// The SLEB opcode of a primitive type, `None` for table entries.
    pub(crate) fn primitive_opcode(&self) -> Option<i64> {
        let code = match self {
            Type::Null => -1,
            Type::Bool => -2,
            Type::Nat => -3,
            Type::Int => -4,
            Type::NatN(IntWidth::W8) => -5,
            Type::NatN(IntWidth::W16) => -6,
            Type::NatN(IntWidth::W32) => -7,
            Type::NatN(IntWidth::W64) => -8,
            Type::IntN(IntWidth::W8) => -9,
            Type::IntN(IntWidth::W16) => -10,
            Type::IntN(IntWidth::W32) => -11,
            Type::IntN(IntWidth::W64) => -12,
            Type::Float32 => -13,
            Type::Float64 => -14,
            Type::Text => -15,
            Type::Reserved => -16,
            Type::Empty => -17,
            Type::Principal => -24,
            _ => return None,
        };
        Some(code)
    }

    pub(crate) fn from_primitive_opcode(code: i64) -> Option<Type> {
        let ty = match code {
            -1 => Type::Null,
            -2 => Type::Bool,
            -3 => Type::Nat,
            -4 => Type::Int,
            -5 => Type::NatN(IntWidth::W8),
            -6 => Type::NatN(IntWidth::W16),
            -7 => Type::NatN(IntWidth::W32),
            -8 => Type::NatN(IntWidth::W64),
            -9 => Type::IntN(IntWidth::W8),
            -10 => Type::IntN(IntWidth::W16),
            -11 => Type::IntN(IntWidth::W32),
            -12 => Type::IntN(IntWidth::W64),
            -13 => Type::Float32,
            -14 => Type::Float64,
            -15 => Type::Text,
            -16 => Type::Reserved,
            -17 => Type::Empty,
            -24 => Type::Principal,
            _ => return None,
        };
        Some(ty)
    }
}

/// Composite table-entry opcodes.
pub(crate) mod opcode {
    pub const OPT: i64 = -18;
    pub const VEC: i64 = -19;
    pub const RECORD: i64 = -20;
    pub const VARIANT: i64 = -21;
    pub const FUNC: i64 = -22;
    pub const SERVICE: i64 = -23;
}

/// Named type definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeEnv(BTreeMap<String, Type>);

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: Type) -> Option<Type> {
        self.0.insert(name.into(), ty)
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Follows `Var` links until a structural type is reached.
    ///
    /// A chain longer than the number of definitions must loop back on
    /// itself (`type a = b; type b = a`), which has no values.
    pub fn resolve<'t>(&'t self, mut ty: &'t Type) -> Result<&'t Type> {
        let mut hops = 0usize;
        while let Type::Var(name) = ty {
            if hops > self.0.len() {
                return Err(CandidError::TypeMismatch(format!(
                    "type {name} is an unproductive cycle"
                )));
            }
            ty = self
                .0
                .get(name)
                .ok_or_else(|| CandidError::TypeMismatch(format!("unbound type {name}")))?;
            hops += 1;
        }
        Ok(ty)
    }
}

/// Fields in wire order: ascending by id.
pub(crate) fn sorted_fields(fields: &[Field]) -> Vec<&Field> {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    sorted.sort_by_key(|f| f.label.id());
    sorted
}

/// Fails if two fields share an id.
pub(crate) fn check_unique(sorted: &[&Field]) -> Result<()> {
    for pair in sorted.windows(2) {
        if let [a, b] = pair {
            if a.label.id() == b.label.id() {
                return Err(CandidError::TypeMismatch(format!(
                    "field labels {} and {} share id {}",
                    a.label,
                    b.label,
                    a.label.id()
                )));
            }
        }
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Null => f.write_str("null"),
            Type::Bool => f.write_str("bool"),
            Type::Nat => f.write_str("nat"),
            Type::Int => f.write_str("int"),
            Type::NatN(w) => write!(f, "nat{}", w.bits()),
            Type::IntN(w) => write!(f, "int{}", w.bits()),
            Type::Float32 => f.write_str("float32"),
            Type::Float64 => f.write_str("float64"),
            Type::Text => f.write_str("text"),
            Type::Reserved => f.write_str("reserved"),
            Type::Empty => f.write_str("empty"),
            Type::Principal => f.write_str("principal"),
            Type::Opt(t) => write!(f, "opt {t}"),
            Type::Vec(t) => write!(f, "vec {t}"),
            Type::Record(fields) => {
                f.write_str("record {")?;
                for field in fields {
                    write!(f, " {} : {};", field.label, field.ty)?;
                }
                f.write_str(" }")
            }
            Type::Variant(fields) => {
                f.write_str("variant {")?;
                for field in fields {
                    write!(f, " {} : {};", field.label, field.ty)?;
                }
                f.write_str(" }")
            }
            Type::Func(func) => write!(f, "func {func}"),
            Type::Service(methods) => {
                f.write_str("service {")?;
                for (name, func) in methods {
                    write!(f, " {name} : {func};")?;
                }
                f.write_str(" }")
            }
            Type::Var(name) => f.write_str(name),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Type]) -> fmt::Result {
    f.write_str("(")?;
    for (i, ty) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.args)?;
        f.write_str(" -> ")?;
        write_list(f, &self.rets)?;
        for mode in &self.modes {
            match mode {
                FuncMode::Query => f.write_str(" query")?,
                FuncMode::Oneway => f.write_str(" oneway")?,
                FuncMode::CompositeQuery => f.write_str(" composite_query")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idl_hash_known_values() {
        assert_eq!(idl_hash(""), 0);
        assert_eq!(idl_hash("a"), 97);
        assert_eq!(idl_hash("foo"), 5_097_222);
        assert_eq!(idl_hash("bar"), 4_895_187);
    }

    #[test]
    fn test_labels_compare_by_id() {
        assert_eq!(Label::from("foo"), Label::Id(5_097_222));
        assert!(Label::from("bar") < Label::from("foo"));
    }

    #[test]
    fn test_resolve_follows_vars() {
        let mut env = TypeEnv::new();
        env.insert("a", Type::Var("b".into()));
        env.insert("b", Type::Nat);
        assert_eq!(env.resolve(&Type::Var("a".into())).unwrap(), &Type::Nat);
    }

    #[test]
    fn test_resolve_rejects_unproductive_cycle() {
        let mut env = TypeEnv::new();
        env.insert("a", Type::Var("b".into()));
        env.insert("b", Type::Var("a".into()));
        assert!(matches!(
            env.resolve(&Type::Var("a".into())),
            Err(CandidError::TypeMismatch(_))
        ));
        assert!(env.resolve(&Type::Var("missing".into())).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let fields = vec![Field::new("foo", Type::Nat), Field::new(5_097_222u32, Type::Int)];
        let sorted = sorted_fields(&fields);
        assert!(check_unique(&sorted).is_err());
    }

    #[test]
    fn test_display() {
        let ty = Type::Record(vec![
            Field::new("name", Type::Text),
            Field::new("tags", Type::vec(Type::opt(Type::NatN(IntWidth::W8)))),
        ]);
        assert_eq!(ty.to_string(), "record { name : text; tags : vec opt nat8; }");
    }
}
