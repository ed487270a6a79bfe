use std::fmt;

use crate::errors::DecodeError;
use crate::interop::ForeignObject;

/// Host integer, width and signedness preserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integer {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl Integer {
    /// Widen to the largest signed width, `None` if the value does not fit
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::I8(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v),
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => i64::try_from(v).ok(),
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8(_) | Self::I16(_) | Self::I32(_) | Self::I64(_))
    }

    /// Width in bits
    pub const fn width(self) -> u32 {
        match self {
            Self::I8(_) | Self::U8(_) => 8,
            Self::I16(_) | Self::U16(_) => 16,
            Self::I32(_) | Self::U32(_) => 32,
            Self::I64(_) | Self::U64(_) => 64,
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{}", v),
            Self::I16(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::U8(v) => write!(f, "{}", v),
            Self::U16(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
        }
    }
}

/// Host floating point value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Float {
    F32(f32),
    F64(f64),
}

impl Float {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::F32(v) => v.into(),
            Self::F64(v) => v,
        }
    }
}

/// Every value the host can hand to, or receive from, the interpreter.
///
/// Composite variants hold further `HostValue`s; recursion bottoms out at
/// scalars, `Bytes`, `Text`, `Null` and `Opaque`.
#[derive(Debug, Clone)]
pub enum HostValue {
    Int(Integer),
    Float(Float),
    Bool(bool),
    Bytes(Vec<u8>),
    Text(String),
    Sequence(Vec<HostValue>),
    Mapping(Vec<(HostValue, HostValue)>),
    /// Element order carries no meaning
    Set(Vec<HostValue>),
    Null,
    /// Interpreter object passed through without decoding
    Opaque(ForeignObject),
}

impl HostValue {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<HostValue>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<HostValue>,
        V: Into<HostValue>,
    {
        Self::Mapping(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<HostValue>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, in the interpreter's vocabulary
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "str",
            Self::Sequence(_) => "list",
            Self::Mapping(_) => "dict",
            Self::Set(_) => "set",
            Self::Null => "None",
            Self::Opaque(_) => "opaque",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => i.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(x.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Rewrite into the shape a decode produces: integers as `I64`, floats
    /// as `F64`, recursively. Unsigned values above `i64::MAX` keep their
    /// width since no signed 64-bit form exists for them.
    pub fn normalized(&self) -> Self {
        match self {
            Self::Int(i) => match i.as_i64() {
                Some(v) => Self::Int(Integer::I64(v)),
                None => Self::Int(*i),
            },
            Self::Float(x) => Self::Float(Float::F64(x.as_f64())),
            Self::Sequence(items) => Self::Sequence(items.iter().map(Self::normalized).collect()),
            Self::Mapping(pairs) => Self::Mapping(
                pairs.iter().map(|(k, v)| (k.normalized(), v.normalized())).collect(),
            ),
            Self::Set(items) => Self::Set(items.iter().map(Self::normalized).collect()),
            other => other.clone(),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => same_members(a, b),
            (Self::Null, Self::Null) => true,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

// Multiset comparison; elements are not hashable (floats, opaque handles)
fn same_members(a: &[HostValue], b: &[HostValue]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut taken = vec![false; b.len()];
    a.iter().all(|item| {
        let slot = b
            .iter()
            .enumerate()
            .position(|(i, candidate)| !taken[i] && candidate == item);
        match slot {
            Some(i) => {
                taken[i] = true;
                true
            }
            None => false,
        }
    })
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x.as_f64()),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Bytes(b) => write!(f, "b'{}'", b.escape_ascii()),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Sequence(items) => {
                write!(f, "[{}]", items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
            }
            Self::Mapping(pairs) => write!(f, "{{{}}}",
                pairs.iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join(", ")),
            Self::Set(items) if items.is_empty() => write!(f, "set()"),
            Self::Set(items) => {
                write!(f, "{{{}}}", items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
            }
            Self::Null => write!(f, "None"),
            Self::Opaque(obj) => write!(f, "<opaque {:p}>", obj.as_ptr()),
        }
    }
}

macro_rules! int_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for HostValue {
                fn from(v: $t) -> Self {
                    HostValue::Int(Integer::$variant(v))
                }
            }
        )*
    };
}

int_from! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
}

impl From<f32> for HostValue {
    fn from(v: f32) -> Self {
        HostValue::Float(Float::F32(v))
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::Float(Float::F64(v))
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        HostValue::Bool(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        HostValue::Text(v.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(v: String) -> Self {
        HostValue::Text(v)
    }
}

impl From<&[u8]> for HostValue {
    fn from(v: &[u8]) -> Self {
        HostValue::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for HostValue {
    fn from(v: &[u8; N]) -> Self {
        HostValue::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(v: Vec<u8>) -> Self {
        HostValue::Bytes(v)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(v: Vec<HostValue>) -> Self {
        HostValue::Sequence(v)
    }
}

impl From<ForeignObject> for HostValue {
    fn from(obj: ForeignObject) -> Self {
        HostValue::Opaque(obj)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(HostValue::Null, Into::into)
    }
}

fn mismatch(expected: &'static str, found: &HostValue) -> DecodeError {
    DecodeError::Mismatch { expected, found: found.kind_name() }
}

impl TryFrom<HostValue> for i64 {
    type Error = DecodeError;

    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::Int(i) => i.as_i64().ok_or(DecodeError::IntOverflow),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl TryFrom<HostValue> for f64 {
    type Error = DecodeError;

    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::Float(x) => Ok(x.as_f64()),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl TryFrom<HostValue> for bool {
    type Error = DecodeError;

    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl TryFrom<HostValue> for String {
    type Error = DecodeError;

    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::Text(s) => Ok(s),
            other => Err(mismatch("str", &other)),
        }
    }
}

impl TryFrom<HostValue> for Vec<u8> {
    type Error = DecodeError;

    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl TryFrom<HostValue> for Vec<HostValue> {
    type Error = DecodeError;

    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::Sequence(items) => Ok(items),
            other => Err(mismatch("list", &other)),
        }
    }
}

/// Build an argument list from host literals.
///
/// ```
/// use pyhost::{host_args, HostValue};
///
/// let args = host_args![777, "Hello", 1.1, b"World"];
/// assert_eq!(args[3], HostValue::bytes("World"));
/// ```
#[macro_export]
macro_rules! host_args {
    () => {
        ::std::vec::Vec::<$crate::HostValue>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::HostValue::from($arg)),+]
    };
}
