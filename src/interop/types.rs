//! Interpreter type identification
//!
//! Dispatch uses exact type identity. The string form
//! (`ForeignKind::from_type_repr`) is kept for diagnostics and as a check
//! that both agree.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyFloat, PyList, PyLong, PySet, PyString, PyTuple};

use crate::config::CodecConfig;

/// Object kinds the codec knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKind {
    Int,
    Float,
    Bool,
    Text,
    Bytes,
    List,
    Tuple,
    Dict,
    Set,
    NoneType,
    /// Anything else, subclasses of the above included
    Other,
}

impl ForeignKind {
    /// Classify by exact type. Subclasses fall to `Other` so that their
    /// behaviour is never lost through decoding.
    pub fn of(obj: &Bound<'_, PyAny>) -> Self {
        if obj.is_none() {
            Self::NoneType
        } else if obj.is_exact_instance_of::<PyBool>() {
            Self::Bool
        } else if obj.is_exact_instance_of::<PyLong>() {
            Self::Int
        } else if obj.is_exact_instance_of::<PyFloat>() {
            Self::Float
        } else if obj.is_exact_instance_of::<PyString>() {
            Self::Text
        } else if obj.is_exact_instance_of::<PyBytes>() {
            Self::Bytes
        } else if obj.is_exact_instance_of::<PyList>() {
            Self::List
        } else if obj.is_exact_instance_of::<PyTuple>() {
            Self::Tuple
        } else if obj.is_exact_instance_of::<PyDict>() {
            Self::Dict
        } else if obj.is_exact_instance_of::<PySet>() {
            Self::Set
        } else {
            Self::Other
        }
    }

    /// Map a bare type name (`int`, `NoneType`, ...) to a kind
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "str" => Self::Text,
            "bytes" => Self::Bytes,
            "list" => Self::List,
            "tuple" => Self::Tuple,
            "dict" => Self::Dict,
            "set" => Self::Set,
            "NoneType" => Self::NoneType,
            _ => Self::Other,
        }
    }

    /// Classify from a printed type such as `<class 'int'>`
    pub fn from_type_repr(repr: &str) -> Self {
        repr.split('\'')
            .nth(1)
            .map_or(Self::Other, Self::from_type_name)
    }

    /// Interpreter name of the kind
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Text => "str",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Dict => "dict",
            Self::Set => "set",
            Self::NoneType => "NoneType",
            Self::Other => "object",
        }
    }

    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Tuple | Self::Dict | Self::Set)
    }
}

/// Printed type of an object, e.g. `<class 'int'>`
pub fn type_repr(obj: &Bound<'_, PyAny>) -> String {
    obj.get_type().to_string()
}

/// Recursion bound shared by encode and decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    pub max_depth: usize,
}

impl CodecLimits {
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH)
    }
}

impl From<&CodecConfig> for CodecLimits {
    fn from(config: &CodecConfig) -> Self {
        Self::new(config.max_depth)
    }
}
