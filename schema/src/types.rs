use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ValidationError, ValidationErrorKind},
    record::Record,
};

/// One of the six bounded integer subtypes.
///
/// The kind only narrows the emitted integer type and the accepted range; on
/// the wire a fixed-width value is an ordinary number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
}

impl IntKind {
    pub const ALL: [IntKind; 6] = [
        IntKind::I8,
        IntKind::U8,
        IntKind::I16,
        IntKind::U16,
        IntKind::I32,
        IntKind::U32,
    ];

    /// Smallest accepted value (inclusive).
    pub fn min(self) -> i64 {
        match self {
            IntKind::I8  => i8::MIN as i64,
            IntKind::I16 => i16::MIN as i64,
            IntKind::I32 => i32::MIN as i64,
            IntKind::U8 | IntKind::U16 | IntKind::U32 => 0,
        }
    }

    /// Largest accepted value (inclusive).
    pub fn max(self) -> i64 {
        match self {
            IntKind::I8  => i8::MAX as i64,
            IntKind::U8  => u8::MAX as i64,
            IntKind::I16 => i16::MAX as i64,
            IntKind::U16 => u16::MAX as i64,
            IntKind::I32 => i32::MAX as i64,
            IntKind::U32 => u32::MAX as i64,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8   => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32)
    }

    pub fn contains(self, value: i128) -> bool {
        value >= self.min() as i128 && value <= self.max() as i128
    }

    pub fn name(self) -> &'static str {
        match self {
            IntKind::I8  => "i8",
            IntKind::U8  => "u8",
            IntKind::I16 => "i16",
            IntKind::U16 => "u16",
            IntKind::I32 => "i32",
            IntKind::U32 => "u32",
        }
    }

    pub fn from_name(name: &str) -> Option<IntKind> {
        IntKind::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for IntKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-width integer that is known to lie inside its kind's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedInt {
    kind:  IntKind,
    value: i64,
}

impl FixedInt {
    /// Range-checked constructor. Values outside `[kind.min(), kind.max()]`
    /// are rejected, never clamped.
    pub fn new(kind: IntKind, value: impl Into<i128>) -> Result<FixedInt, ValidationError> {
        FixedInt::checked(kind, value.into(), "$")
    }

    pub(crate) fn checked(kind: IntKind, value: i128, path: &str) -> Result<FixedInt, ValidationError> {
        if !kind.contains(value) {
            return Err(ValidationError::new(
                path,
                ValidationErrorKind::OutOfRange {
                    kind,
                    value,
                    min: kind.min(),
                    max: kind.max(),
                },
            ));
        }
        Ok(FixedInt { kind, value: value as i64 })
    }

    pub fn kind(&self) -> IntKind {
        self.kind
    }

    pub fn get(&self) -> i64 {
        self.value
    }
}

impl fmt::Display for FixedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Float,
    Int,
    Bool,
    Fixed(IntKind),
}

/// Names of the built-in types as they appear in description documents and
/// as XML item tags.
pub const NATIVE_TYPES: [&str; 11] = [
    "string", "float", "int", "bool", "i8", "u8", "i16", "u16", "i32", "u32", "any",
];

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::String      => "string",
            Primitive::Float       => "float",
            Primitive::Int         => "int",
            Primitive::Bool        => "bool",
            Primitive::Fixed(kind) => kind.name(),
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        match name {
            "string" => Some(Primitive::String),
            "float"  => Some(Primitive::Float),
            "int"    => Some(Primitive::Int),
            "bool"   => Some(Primitive::Bool),
            other    => IntKind::from_name(other).map(Primitive::Fixed),
        }
    }
}

/// The type of one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    Primitive(Primitive),
    Record(Arc<Record>),
    List(Box<TypeDesc>),
    Optional(Box<TypeDesc>),
    /// Untyped fallback. Emitters map it to the target's dynamic value type.
    Dynamic,
}

impl TypeDesc {
    pub fn string() -> TypeDesc {
        TypeDesc::Primitive(Primitive::String)
    }

    pub fn float() -> TypeDesc {
        TypeDesc::Primitive(Primitive::Float)
    }

    pub fn int() -> TypeDesc {
        TypeDesc::Primitive(Primitive::Int)
    }

    pub fn bool() -> TypeDesc {
        TypeDesc::Primitive(Primitive::Bool)
    }

    pub fn fixed(kind: IntKind) -> TypeDesc {
        TypeDesc::Primitive(Primitive::Fixed(kind))
    }

    pub fn record(record: &Arc<Record>) -> TypeDesc {
        TypeDesc::Record(Arc::clone(record))
    }

    pub fn list(element: TypeDesc) -> TypeDesc {
        TypeDesc::List(Box::new(element))
    }

    /// Wraps `inner` in one level of optionality. Wrapping an optional again
    /// returns it unchanged.
    pub fn optional(inner: TypeDesc) -> TypeDesc {
        match inner {
            TypeDesc::Optional(_) => inner,
            other                 => TypeDesc::Optional(Box::new(other)),
        }
    }

    /// Tag used for this type as an XML list item and as its runtime type name.
    pub fn item_name(&self) -> String {
        match self {
            TypeDesc::Primitive(p)    => p.name().to_string(),
            TypeDesc::Record(r)       => r.name().to_string(),
            TypeDesc::List(_)         => "list".to_string(),
            TypeDesc::Optional(inner) => inner.item_name(),
            TypeDesc::Dynamic         => "any".to_string(),
        }
    }

    /// Human readable form, e.g. `list<optional<Address>>`.
    pub fn describe(&self) -> String {
        match self {
            TypeDesc::Primitive(p)    => p.name().to_string(),
            TypeDesc::Record(r)       => r.name().to_string(),
            TypeDesc::List(elem)      => format!("list<{}>", elem.describe()),
            TypeDesc::Optional(inner) => format!("optional<{}>", inner.describe()),
            TypeDesc::Dynamic         => "any".to_string(),
        }
    }

    /// Records referenced directly by this descriptor, looking through lists
    /// and optionals but not into the records themselves.
    pub fn records(&self) -> Vec<&Record> {
        match self {
            TypeDesc::Record(r)       => vec![r.as_ref()],
            TypeDesc::List(inner)
            | TypeDesc::Optional(inner) => inner.records(),
            TypeDesc::Primitive(_)
            | TypeDesc::Dynamic       => Vec::new(),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_kind_ranges() {
        assert_eq!((IntKind::I8.min(), IntKind::I8.max()), (-128, 127));
        assert_eq!((IntKind::U8.min(), IntKind::U8.max()), (0, 255));
        assert_eq!((IntKind::I16.min(), IntKind::I16.max()), (-32768, 32767));
        assert_eq!((IntKind::U16.min(), IntKind::U16.max()), (0, 65535));
        assert_eq!((IntKind::I32.min(), IntKind::I32.max()), (-2147483648, 2147483647));
        assert_eq!((IntKind::U32.min(), IntKind::U32.max()), (0, 4294967295));
    }

    #[test]
    fn test_fixed_int_boundaries() {
        for kind in IntKind::ALL {
            assert_eq!(FixedInt::new(kind, kind.min()).unwrap().get(), kind.min());
            assert_eq!(FixedInt::new(kind, kind.max()).unwrap().get(), kind.max());

            let below = FixedInt::new(kind, kind.min() as i128 - 1).unwrap_err();
            assert!(below.is_out_of_range(), "{} accepted min-1", kind);
            let above = FixedInt::new(kind, kind.max() as i128 + 1).unwrap_err();
            assert!(above.is_out_of_range(), "{} accepted max+1", kind);
        }
    }

    #[test]
    fn test_optional_collapses() {
        let once = TypeDesc::optional(TypeDesc::int());
        let twice = TypeDesc::optional(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_describe_and_item_name() {
        let ty = TypeDesc::list(TypeDesc::optional(TypeDesc::fixed(IntKind::U16)));
        assert_eq!(ty.describe(), "list<optional<u16>>");
        assert_eq!(ty.item_name(), "list");
        assert_eq!(TypeDesc::optional(TypeDesc::string()).item_name(), "string");
    }

    #[test]
    fn test_primitive_names_round_trip() {
        for name in NATIVE_TYPES.iter().filter(|n| **n != "any") {
            let p = Primitive::from_name(name).unwrap();
            assert_eq!(p.name(), *name);
        }
        assert_eq!(Primitive::from_name("Address"), None);
    }
}
