//! Type unmarshaling - interpreter objects into host values
//!
//! Decoding never takes ownership of its input. References created along the
//! way (container members, dict key snapshots, set iteration items) are
//! released before returning, except the ones kept alive by `Opaque`.

use pyo3::exceptions::PyOverflowError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyList, PySet, PyString, PyTuple};

use super::reference::ForeignObject;
use super::types::{CodecLimits, ForeignKind};
use crate::core::{Float, HostValue, Integer};
use crate::errors::DecodeError;
use crate::logging::log_decode_error;

/// Decode one object with the default limits
pub fn decode(obj: &Bound<'_, PyAny>) -> Result<HostValue, DecodeError> {
    decode_with(obj, CodecLimits::default())
}

pub fn decode_with(obj: &Bound<'_, PyAny>, limits: CodecLimits) -> Result<HostValue, DecodeError> {
    decode_at(obj, 0, limits).inspect_err(log_decode_error)
}

fn decode_at(obj: &Bound<'_, PyAny>, depth: usize, limits: CodecLimits) -> Result<HostValue, DecodeError> {
    if depth > limits.max_depth {
        return Err(DecodeError::DepthExceeded { limit: limits.max_depth });
    }

    let value = match ForeignKind::of(obj) {
        ForeignKind::Int => {
            let v = obj.extract::<i64>().map_err(|e| int_error(obj.py(), e))?;
            HostValue::Int(Integer::I64(v))
        }
        ForeignKind::Float => HostValue::Float(Float::F64(obj.extract::<f64>().map_err(runtime)?)),
        ForeignKind::Bool => HostValue::Bool(obj.downcast::<PyBool>().map_err(downcast)?.is_true()),
        ForeignKind::Text => {
            let s = obj.downcast::<PyString>().map_err(downcast)?;
            let text = s.to_str().map_err(|e| DecodeError::InvalidText { detail: e.to_string() })?;
            HostValue::Text(text.to_owned())
        }
        ForeignKind::Bytes => HostValue::Bytes(obj.downcast::<PyBytes>().map_err(downcast)?.as_bytes().to_vec()),
        ForeignKind::List => {
            let list = obj.downcast::<PyList>().map_err(downcast)?;
            let mut items = Vec::with_capacity(list.len());
            for item in list.iter() {
                items.push(decode_at(&item, depth + 1, limits)?);
            }
            HostValue::Sequence(items)
        }
        ForeignKind::Tuple => {
            let tuple = obj.downcast::<PyTuple>().map_err(downcast)?;
            let mut items = Vec::with_capacity(tuple.len());
            for item in tuple.iter() {
                items.push(decode_at(&item, depth + 1, limits)?);
            }
            HostValue::Sequence(items)
        }
        ForeignKind::Dict => decode_dict(obj.downcast::<PyDict>().map_err(downcast)?, depth, limits)?,
        ForeignKind::Set => {
            let set = obj.downcast::<PySet>().map_err(downcast)?;
            let mut items = Vec::with_capacity(set.len());
            // Each item is a fresh reference, released at the end of its iteration
            for item in set.iter() {
                items.push(decode_at(&item, depth + 1, limits)?);
            }
            HostValue::Set(items)
        }
        ForeignKind::NoneType => HostValue::Null,
        ForeignKind::Other => HostValue::Opaque(ForeignObject::retain(obj)),
    };

    Ok(value)
}

// Keys are snapshotted first so the walk never observes a resizing dict
fn decode_dict(dict: &Bound<'_, PyDict>, depth: usize, limits: CodecLimits) -> Result<HostValue, DecodeError> {
    let keys = dict.keys();
    let mut pairs = Vec::with_capacity(keys.len());

    for key in keys.iter() {
        let value = dict
            .get_item(&key)
            .map_err(runtime)?
            .ok_or(DecodeError::MissingValue)?;
        let k = decode_at(&key, depth + 1, limits)?;
        let v = decode_at(&value, depth + 1, limits)?;
        pairs.push((k, v));
    }

    Ok(HostValue::Mapping(pairs))
}

fn int_error(py: Python<'_>, err: PyErr) -> DecodeError {
    if err.is_instance_of::<PyOverflowError>(py) {
        DecodeError::IntOverflow
    } else {
        runtime(err)
    }
}

fn runtime(err: PyErr) -> DecodeError {
    DecodeError::Runtime { detail: err.to_string() }
}

fn downcast(err: pyo3::DowncastError<'_, '_>) -> DecodeError {
    DecodeError::Runtime { detail: err.to_string() }
}
