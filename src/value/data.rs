use super::kind::{TypeName, ValueKind};
use super::{DateTime, Filename};
use crate::error::ValueError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use itertools::Itertools;
use std::any::Any;
use std::fmt;
use std::path::PathBuf;

/// A typed runtime value, used for wizard node values and message properties.
///
/// The variant is closed: every value knows its type name, can be copied from a
/// type-erased reference keyed by that name, compared, and written to and read back
/// from its XML text form.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Bool(bool),
    Char(i8),
    UnsignedChar(u8),
    Short(i16),
    UnsignedShort(u16),
    Int(i32),
    UnsignedInt(u32),
    Int64(i64),
    UnsignedInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
    DateTime(DateTime),
    Filename(Filename),
    Sequence(Sequence),
}

/// A homogeneous list of scalar values.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    kind: ValueKind,
    items: Vec<DataValue>,
}

impl Sequence {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn from_values(kind: ValueKind, items: Vec<DataValue>) -> Result<Self, ValueError> {
        let mut sequence = Self::new(kind);
        for item in items {
            sequence.push(item)?;
        }
        Ok(sequence)
    }

    pub fn push(&mut self, value: DataValue) -> Result<(), ValueError> {
        match value.scalar_kind() {
            Some(kind) if kind == self.kind => {
                self.items.push(value);
                Ok(())
            }
            Some(kind) => Err(ValueError::MixedSequence {
                expected: self.kind.to_string(),
                found: kind.to_string(),
            }),
            None => Err(ValueError::NestedSequence(value.type_name())),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn items(&self) -> &[DataValue] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn type_name(&self) -> String {
        TypeName::Sequence(self.kind).to_string()
    }
}

impl DataValue {
    /// Builds a sequence value, rejecting items of another kind.
    pub fn sequence<T, I>(kind: ValueKind, items: I) -> Result<Self, ValueError>
    where
        T: Into<DataValue>,
        I: IntoIterator<Item = T>,
    {
        let items = items.into_iter().map(Into::into).collect();
        Sequence::from_values(kind, items).map(DataValue::Sequence)
    }

    /// The scalar kind of this value; `None` for sequences.
    pub fn scalar_kind(&self) -> Option<ValueKind> {
        let kind = match self {
            DataValue::Bool(_) => ValueKind::Bool,
            DataValue::Char(_) => ValueKind::Char,
            DataValue::UnsignedChar(_) => ValueKind::UnsignedChar,
            DataValue::Short(_) => ValueKind::Short,
            DataValue::UnsignedShort(_) => ValueKind::UnsignedShort,
            DataValue::Int(_) => ValueKind::Int,
            DataValue::UnsignedInt(_) => ValueKind::UnsignedInt,
            DataValue::Int64(_) => ValueKind::Int64,
            DataValue::UnsignedInt64(_) => ValueKind::UnsignedInt64,
            DataValue::Float(_) => ValueKind::Float,
            DataValue::Double(_) => ValueKind::Double,
            DataValue::String(_) => ValueKind::String,
            DataValue::Blob(_) => ValueKind::Blob,
            DataValue::DateTime(_) => ValueKind::DateTime,
            DataValue::Filename(_) => ValueKind::Filename,
            DataValue::Sequence(_) => return None,
        };
        Some(kind)
    }

    pub fn type_name(&self) -> String {
        match self {
            DataValue::Sequence(sequence) => sequence.type_name(),
            scalar => scalar
                .scalar_kind()
                .map(|kind| kind.type_name().to_string())
                .unwrap_or_default(),
        }
    }

    /// Makes an owned, typed copy of a type-erased value, interpreting it as
    /// `type_name`.
    ///
    /// Each kind is backed by a Rust type (`i32` for `int`, `Vec<f64>` for
    /// `vector<double>`, `String` or `&'static str` for `string`, and so on). A
    /// `DataValue` of the same type (aliases included) is also accepted. Returns
    /// `None` when the type name is unknown or the value is not of the backing type.
    pub fn from_any(type_name: &str, value: &dyn Any) -> Option<Self> {
        let expected = TypeName::parse(type_name).ok()?;
        if let Some(data) = value.downcast_ref::<DataValue>() {
            let actual = TypeName::parse(&data.type_name()).ok()?;
            return (actual == expected).then(|| data.clone());
        }
        match expected {
            TypeName::Scalar(kind) => scalar_from_any(kind, value),
            TypeName::Sequence(kind) => sequence_from_any(kind, value),
        }
    }

    /// The text written into `value` attributes and `<value>` elements.
    pub fn to_xml_string(&self) -> String {
        match self {
            DataValue::Bool(v) => v.to_string(),
            DataValue::Char(v) => v.to_string(),
            DataValue::UnsignedChar(v) => v.to_string(),
            DataValue::Short(v) => v.to_string(),
            DataValue::UnsignedShort(v) => v.to_string(),
            DataValue::Int(v) => v.to_string(),
            DataValue::UnsignedInt(v) => v.to_string(),
            DataValue::Int64(v) => v.to_string(),
            DataValue::UnsignedInt64(v) => v.to_string(),
            DataValue::Float(v) => v.to_string(),
            DataValue::Double(v) => v.to_string(),
            DataValue::String(v) => v.clone(),
            DataValue::Blob(bytes) => BASE64.encode(bytes),
            DataValue::DateTime(v) => v.to_rfc3339(),
            DataValue::Filename(v) => v.full_path_and_name(),
            DataValue::Sequence(sequence) => {
                let quoted = sequence.kind.is_quoted();
                sequence
                    .items
                    .iter()
                    .map(|item| {
                        let text = item.to_xml_string();
                        if quoted { quote(&text) } else { text }
                    })
                    .join(" ")
            }
        }
    }

    /// Parses the text form written by [`DataValue::to_xml_string`].
    pub fn from_xml_string(type_name: &str, text: &str) -> Result<Self, ValueError> {
        match TypeName::parse(type_name)? {
            TypeName::Scalar(kind) => parse_scalar(kind, text),
            TypeName::Sequence(kind) => {
                let tokens = if kind.is_quoted() {
                    split_quoted(text).map_err(|message| parse_error(type_name, text, message))?
                } else {
                    text.split_whitespace().map(str::to_string).collect()
                };
                let items = tokens
                    .iter()
                    .map(|token| parse_scalar(kind, token))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DataValue::Sequence(Sequence { kind, items }))
            }
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

fn scalar_from_any(kind: ValueKind, value: &dyn Any) -> Option<DataValue> {
    match kind {
        ValueKind::Bool => value.downcast_ref::<bool>().map(|v| DataValue::Bool(*v)),
        ValueKind::Char => value.downcast_ref::<i8>().map(|v| DataValue::Char(*v)),
        ValueKind::UnsignedChar => value.downcast_ref::<u8>().map(|v| DataValue::UnsignedChar(*v)),
        ValueKind::Short => value.downcast_ref::<i16>().map(|v| DataValue::Short(*v)),
        ValueKind::UnsignedShort => value
            .downcast_ref::<u16>()
            .map(|v| DataValue::UnsignedShort(*v)),
        ValueKind::Int => value.downcast_ref::<i32>().map(|v| DataValue::Int(*v)),
        ValueKind::UnsignedInt => value.downcast_ref::<u32>().map(|v| DataValue::UnsignedInt(*v)),
        ValueKind::Int64 => value.downcast_ref::<i64>().map(|v| DataValue::Int64(*v)),
        ValueKind::UnsignedInt64 => value
            .downcast_ref::<u64>()
            .map(|v| DataValue::UnsignedInt64(*v)),
        ValueKind::Float => value.downcast_ref::<f32>().map(|v| DataValue::Float(*v)),
        ValueKind::Double => value.downcast_ref::<f64>().map(|v| DataValue::Double(*v)),
        ValueKind::String => value
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| value.downcast_ref::<&'static str>().map(|s| s.to_string()))
            .map(DataValue::String),
        ValueKind::Blob => value.downcast_ref::<Vec<u8>>().cloned().map(DataValue::Blob),
        ValueKind::DateTime => value
            .downcast_ref::<DateTime>()
            .copied()
            .or_else(|| {
                value
                    .downcast_ref::<chrono::DateTime<chrono::Utc>>()
                    .map(|dt| DateTime::from(*dt))
            })
            .map(DataValue::DateTime),
        ValueKind::Filename => value
            .downcast_ref::<Filename>()
            .cloned()
            .or_else(|| value.downcast_ref::<PathBuf>().map(|p| Filename::new(p.clone())))
            .map(DataValue::Filename),
    }
}

fn collect_sequence<T>(kind: ValueKind, value: &dyn Any) -> Option<DataValue>
where
    T: Clone + Into<DataValue> + 'static,
{
    value.downcast_ref::<Vec<T>>().map(|items| {
        DataValue::Sequence(Sequence {
            kind,
            items: items.iter().cloned().map(Into::into).collect(),
        })
    })
}

fn sequence_from_any(kind: ValueKind, value: &dyn Any) -> Option<DataValue> {
    match kind {
        ValueKind::Bool => collect_sequence::<bool>(kind, value),
        ValueKind::Char => collect_sequence::<i8>(kind, value),
        ValueKind::UnsignedChar => collect_sequence::<u8>(kind, value),
        ValueKind::Short => collect_sequence::<i16>(kind, value),
        ValueKind::UnsignedShort => collect_sequence::<u16>(kind, value),
        ValueKind::Int => collect_sequence::<i32>(kind, value),
        ValueKind::UnsignedInt => collect_sequence::<u32>(kind, value),
        ValueKind::Int64 => collect_sequence::<i64>(kind, value),
        ValueKind::UnsignedInt64 => collect_sequence::<u64>(kind, value),
        ValueKind::Float => collect_sequence::<f32>(kind, value),
        ValueKind::Double => collect_sequence::<f64>(kind, value),
        ValueKind::String => collect_sequence::<String>(kind, value),
        ValueKind::Blob => collect_sequence::<Vec<u8>>(kind, value),
        ValueKind::DateTime => collect_sequence::<DateTime>(kind, value),
        ValueKind::Filename => collect_sequence::<Filename>(kind, value),
    }
}

fn parse_error(type_name: &str, text: &str, message: impl ToString) -> ValueError {
    ValueError::Parse {
        type_name: type_name.to_string(),
        text: text.to_string(),
        message: message.to_string(),
    }
}

fn parse_number<T>(kind: ValueKind, text: &str) -> Result<T, ValueError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| parse_error(kind.type_name(), text, e))
}

fn parse_scalar(kind: ValueKind, text: &str) -> Result<DataValue, ValueError> {
    let value = match kind {
        ValueKind::Bool => match text.trim() {
            "true" | "1" => DataValue::Bool(true),
            "false" | "0" => DataValue::Bool(false),
            _ => return Err(parse_error(kind.type_name(), text, "expected true or false")),
        },
        ValueKind::Char => DataValue::Char(parse_number(kind, text)?),
        ValueKind::UnsignedChar => DataValue::UnsignedChar(parse_number(kind, text)?),
        ValueKind::Short => DataValue::Short(parse_number(kind, text)?),
        ValueKind::UnsignedShort => DataValue::UnsignedShort(parse_number(kind, text)?),
        ValueKind::Int => DataValue::Int(parse_number(kind, text)?),
        ValueKind::UnsignedInt => DataValue::UnsignedInt(parse_number(kind, text)?),
        ValueKind::Int64 => DataValue::Int64(parse_number(kind, text)?),
        ValueKind::UnsignedInt64 => DataValue::UnsignedInt64(parse_number(kind, text)?),
        ValueKind::Float => DataValue::Float(parse_number(kind, text)?),
        ValueKind::Double => DataValue::Double(parse_number(kind, text)?),
        ValueKind::String => DataValue::String(text.to_string()),
        ValueKind::Blob => DataValue::Blob(
            BASE64
                .decode(text.trim())
                .map_err(|e| parse_error(kind.type_name(), text, e))?,
        ),
        ValueKind::DateTime => DataValue::DateTime(
            DateTime::parse_rfc3339(text).map_err(|e| parse_error(kind.type_name(), text, e))?,
        ),
        ValueKind::Filename => DataValue::Filename(Filename::new(text)),
    };
    Ok(value)
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Splits `"a" "b \"c\""` into its unescaped items.
fn split_quoted(text: &str) -> Result<Vec<String>, String> {
    let mut items = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some('"') => {
                let mut item = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(c) => item.push(c),
                            None => return Err("dangling escape at end of input".to_string()),
                        },
                        Some('"') => break,
                        Some(c) => item.push(c),
                        None => return Err("unterminated quoted item".to_string()),
                    }
                }
                items.push(item);
            }
            Some(c) => return Err(format!("expected '\"' but found '{}'", c)),
        }
    }
    Ok(items)
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for DataValue {
                fn from(value: $ty) -> Self {
                    DataValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Char,
    u8 => UnsignedChar,
    i16 => Short,
    u16 => UnsignedShort,
    i32 => Int,
    u32 => UnsignedInt,
    i64 => Int64,
    u64 => UnsignedInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Blob,
    DateTime => DateTime,
    Filename => Filename,
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for DataValue {
                fn from(values: Vec<$ty>) -> Self {
                    DataValue::Sequence(Sequence {
                        kind: ValueKind::$kind,
                        items: values.into_iter().map(DataValue::from).collect(),
                    })
                }
            }
        )*
    };
}

// `Vec<u8>` is a blob; byte sequences go through `DataValue::sequence`.
impl_from_vec! {
    bool => Bool,
    i8 => Char,
    i16 => Short,
    u16 => UnsignedShort,
    i32 => Int,
    u32 => UnsignedInt,
    i64 => Int64,
    u64 => UnsignedInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    DateTime => DateTime,
    Filename => Filename,
}
