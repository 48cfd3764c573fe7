use crate::error::ValueError;
use std::fmt;

/// The scalar kinds a [`DataValue`](super::DataValue) can hold.
///
/// The names returned by [`ValueKind::type_name`] are the canonical type strings used
/// by wizard node ports and by message property records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Int64,
    UnsignedInt64,
    Float,
    Double,
    String,
    Blob,
    DateTime,
    Filename,
}

impl ValueKind {
    pub const ALL: [ValueKind; 15] = [
        ValueKind::Bool,
        ValueKind::Char,
        ValueKind::UnsignedChar,
        ValueKind::Short,
        ValueKind::UnsignedShort,
        ValueKind::Int,
        ValueKind::UnsignedInt,
        ValueKind::Int64,
        ValueKind::UnsignedInt64,
        ValueKind::Float,
        ValueKind::Double,
        ValueKind::String,
        ValueKind::Blob,
        ValueKind::DateTime,
        ValueKind::Filename,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Char => "char",
            ValueKind::UnsignedChar => "unsigned char",
            ValueKind::Short => "short",
            ValueKind::UnsignedShort => "unsigned short",
            ValueKind::Int => "int",
            ValueKind::UnsignedInt => "unsigned int",
            ValueKind::Int64 => "int64",
            ValueKind::UnsignedInt64 => "uint64",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Blob => "Blob",
            ValueKind::DateTime => "DateTime",
            ValueKind::Filename => "Filename",
        }
    }

    /// Looks up a scalar kind by its type name. `long` and `unsigned long` are
    /// accepted as aliases of the 64-bit kinds.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "long" => Some(ValueKind::Int64),
            "unsigned long" => Some(ValueKind::UnsignedInt64),
            _ => Self::ALL.into_iter().find(|kind| kind.type_name() == name),
        }
    }

    /// Kinds whose text form can be empty or contain spaces are quoted when
    /// written as sequence items.
    pub(crate) fn is_quoted(self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Filename | ValueKind::Blob)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A parsed type name: either a single scalar or a homogeneous `vector<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Scalar(ValueKind),
    Sequence(ValueKind),
}

impl TypeName {
    pub fn parse(name: &str) -> Result<Self, ValueError> {
        let trimmed = name.trim();
        if let Some(inner) = trimmed
            .strip_prefix("vector<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return ValueKind::from_type_name(inner.trim())
                .map(TypeName::Sequence)
                .ok_or_else(|| ValueError::UnknownType(name.to_string()));
        }
        ValueKind::from_type_name(trimmed)
            .map(TypeName::Scalar)
            .ok_or_else(|| ValueError::UnknownType(name.to_string()))
    }

    pub fn kind(self) -> ValueKind {
        match self {
            TypeName::Scalar(kind) | TypeName::Sequence(kind) => kind,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Scalar(kind) => write!(f, "{}", kind),
            TypeName::Sequence(kind) => write!(f, "vector<{}>", kind),
        }
    }
}
