//! Type marshaling - host values into interpreter objects
//!
//! Every function here returns one new owned reference. Container members
//! are either adopted by their slot (list, tuple) or borrowed by the
//! insertion call and released right after (dict, set).

use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyFloat, PyNone, PySet, PyString, PyTuple};

use super::reference::{adopt_into_slot, new_slotted, Slotted};
use super::types::CodecLimits;
use crate::core::{HostValue, Integer};
use crate::errors::EncodeError;
use crate::logging::log_encode_error;

/// Encode one value with the default limits
pub fn encode<'py>(py: Python<'py>, value: &HostValue) -> Result<Bound<'py, PyAny>, EncodeError> {
    encode_with(py, value, CodecLimits::default())
}

pub fn encode_with<'py>(
    py: Python<'py>,
    value: &HostValue,
    limits: CodecLimits,
) -> Result<Bound<'py, PyAny>, EncodeError> {
    encode_at(py, value, 0, limits).inspect_err(log_encode_error)
}

/// Encode an argument list into a tuple of matching arity.
///
/// On failure the partially filled tuple is dropped, which releases the
/// arguments already placed in it.
pub fn encode_args<'py>(
    py: Python<'py>,
    args: &[HostValue],
    limits: CodecLimits,
) -> Result<Bound<'py, PyTuple>, EncodeError> {
    let tuple = new_slotted(py, Slotted::Tuple, args.len())
        .map_err(|e| allocation("argument tuple", e))?;

    for (i, arg) in args.iter().enumerate() {
        let obj = encode_at(py, arg, 1, limits).inspect_err(log_encode_error)?;
        adopt_into_slot(&tuple, Slotted::Tuple, i, obj)
            .map_err(|e| allocation("argument tuple", e))?;
    }

    tuple
        .downcast_into::<PyTuple>()
        .map_err(|e| allocation("argument tuple", e.into()))
}

fn encode_at<'py>(
    py: Python<'py>,
    value: &HostValue,
    depth: usize,
    limits: CodecLimits,
) -> Result<Bound<'py, PyAny>, EncodeError> {
    if depth > limits.max_depth {
        return Err(EncodeError::DepthExceeded { limit: limits.max_depth });
    }

    match value {
        HostValue::Int(i) => Ok(int_object(py, *i)),
        HostValue::Float(x) => Ok(PyFloat::new_bound(py, x.as_f64()).into_any()),
        // Singletons: take our own reference before handing one out
        HostValue::Bool(b) => Ok(PyBool::new_bound(py, *b).to_owned().into_any()),
        HostValue::Null => Ok(PyNone::get_bound(py).to_owned().into_any()),
        HostValue::Bytes(b) => Ok(PyBytes::new_bound(py, b).into_any()),
        HostValue::Text(s) => Ok(PyString::new_bound(py, s).into_any()),
        HostValue::Sequence(items) => {
            let list = new_slotted(py, Slotted::List, items.len())
                .map_err(|e| allocation(Slotted::List.name(), e))?;
            for (i, item) in items.iter().enumerate() {
                let obj = encode_at(py, item, depth + 1, limits)?;
                adopt_into_slot(&list, Slotted::List, i, obj)
                    .map_err(|e| allocation(Slotted::List.name(), e))?;
            }
            Ok(list)
        }
        HostValue::Mapping(pairs) => {
            let dict = PyDict::new_bound(py);
            for (k, v) in pairs {
                let key = encode_at(py, k, depth + 1, limits)?;
                let val = encode_at(py, v, depth + 1, limits)?;
                dict.set_item(&key, &val)
                    .map_err(|e| insertion(py, e, "dict key", k))?;
            }
            Ok(dict.into_any())
        }
        HostValue::Set(items) => {
            let set = PySet::empty_bound(py).map_err(|e| allocation("set", e))?;
            for item in items {
                let obj = encode_at(py, item, depth + 1, limits)?;
                set.add(&obj).map_err(|e| insertion(py, e, "set member", item))?;
            }
            Ok(set.into_any())
        }
        HostValue::Opaque(obj) => Ok(obj.bind(py).clone()),
    }
}

fn int_object(py: Python<'_>, i: Integer) -> Bound<'_, PyAny> {
    let obj: PyObject = match i {
        Integer::I8(v) => v.into_py(py),
        Integer::I16(v) => v.into_py(py),
        Integer::I32(v) => v.into_py(py),
        Integer::I64(v) => v.into_py(py),
        Integer::U8(v) => v.into_py(py),
        Integer::U16(v) => v.into_py(py),
        Integer::U32(v) => v.into_py(py),
        Integer::U64(v) => v.into_py(py),
    };
    obj.into_bound(py)
}

fn allocation(what: &'static str, err: PyErr) -> EncodeError {
    EncodeError::Allocation { what, detail: err.to_string() }
}

// A TypeError from insertion means the member cannot be hashed
fn insertion(py: Python<'_>, err: PyErr, role: &str, value: &HostValue) -> EncodeError {
    if err.is_instance_of::<PyTypeError>(py) {
        EncodeError::Unsupported { shape: format!("unhashable {} ({})", role, value.kind_name()) }
    } else {
        allocation("container entry", err)
    }
}
