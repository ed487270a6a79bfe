//! Named function invocation
//!
//! One call runs lookup → encode → invoke → decode. Any failure ends the
//! call; the argument tuple and raw result are released on every path when
//! they go out of scope.

use pyo3::ffi;
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use super::marshal::encode_args;
use super::registry::FunctionRegistry;
use super::types::CodecLimits;
use super::unmarshal::decode_with;
use crate::core::HostValue;
use crate::errors::{CallError, CallErrorKind};

/// Runs calls against a registry
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    limits: CodecLimits,
}

impl Dispatcher {
    pub fn new(limits: CodecLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> CodecLimits {
        self.limits
    }

    pub fn call(
        &self,
        py: Python<'_>,
        registry: &FunctionRegistry,
        name: &str,
        args: &[HostValue],
    ) -> Result<HostValue, CallError> {
        let callable = registry
            .get(name)
            .ok_or_else(|| CallError::new(name, CallErrorKind::NotFound))?;

        let args = encode_args(py, args, self.limits)
            .map_err(|e| CallError::new(name, CallErrorKind::EncodeFailed(e)))?;

        let result = invoke(callable.bind(py), &args).map_err(|e| {
            CallError::new(name, CallErrorKind::InvokeFailed { message: Some(e.to_string()) })
        })?;

        decode_with(&result, self.limits)
            .map_err(|e| CallError::new(name, CallErrorKind::DecodeFailed(e)))
    }
}

/// Call `callable(*args)`; a missing result without a pending exception
/// surfaces as `SystemError`
pub fn invoke<'py>(callable: &Bound<'py, PyAny>, args: &Bound<'py, PyTuple>) -> PyResult<Bound<'py, PyAny>> {
    unsafe {
        Bound::from_owned_ptr_or_err(
            callable.py(),
            ffi::PyObject_CallObject(callable.as_ptr(), args.as_ptr()),
        )
    }
}
