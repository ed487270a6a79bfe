//! Module loading and attribute resolution
//!
//! A module is imported, its attribute directory enumerated, and every public
//! attribute registered by name. The module object itself is not kept; the
//! registered attributes hold whatever they need of it.

use pyo3::ffi;
use pyo3::prelude::*;
use pyo3::types::{PyList, PyString};

use super::reference::ForeignObject;
use super::registry::FunctionRegistry;
use crate::config::LoaderConfig;
use crate::errors::{LoadError, LoadStage};
use crate::logging::{log_module_loaded, log_registration_replaced};

/// Leading character of names treated as private
pub const PRIVATE_MARKER: char = '_';

/// Live import of a module plus its attribute directory
pub struct ModuleHandle<'py> {
    name: String,
    module: Bound<'py, PyAny>,
    dir: Bound<'py, PyList>,
}

impl<'py> ModuleHandle<'py> {
    /// Import `name` (dotted paths allowed) and take its directory
    pub fn import(py: Python<'py>, name: &str) -> Result<Self, LoadError> {
        // The name travels to the import machinery as a C string
        if name.is_empty() || name.contains('\0') {
            return Err(LoadError::new(name, LoadStage::EncodeName));
        }
        let name_obj = PyString::new_bound(py, name);

        let module = unsafe {
            Bound::from_owned_ptr_or_err(py, ffi::PyImport_Import(name_obj.as_ptr()))
        }
        .map_err(|e| stage_error(name, LoadStage::Import, e))?;

        let dir = unsafe { Bound::from_owned_ptr_or_err(py, ffi::PyObject_Dir(module.as_ptr())) }
            .and_then(|d| d.downcast_into::<PyList>().map_err(PyErr::from))
            .map_err(|e| stage_error(name, LoadStage::Dir, e))?;

        Ok(Self { name: name.to_owned(), module, dir })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute names in directory order
    pub fn attribute_names(&self) -> Result<Vec<String>, LoadError> {
        let mut names = Vec::with_capacity(self.dir.len());
        for item in self.dir.iter() {
            let item = item
                .downcast_into::<PyString>()
                .map_err(|e| stage_error(&self.name, LoadStage::DirItem, e.into()))?;
            let attr = item
                .to_str()
                .map_err(|e| stage_error(&self.name, LoadStage::AttrName, e))?;
            names.push(attr.to_owned());
        }
        Ok(names)
    }

    /// New reference to attribute `attr`
    pub fn resolve(&self, attr: &str) -> Result<Bound<'py, PyAny>, LoadError> {
        self.module
            .getattr(attr)
            .map_err(|e| stage_error(&self.name, LoadStage::Attribute, e))
    }
}

/// Populates a `FunctionRegistry` from modules
#[derive(Debug, Clone, Copy)]
pub struct ModuleLoader<'a> {
    config: &'a LoaderConfig,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(config: &'a LoaderConfig) -> Self {
        Self { config }
    }

    /// Whether `attr` is eligible for registration by name alone
    pub fn is_exposed(&self, attr: &str) -> bool {
        !(self.config.skip_private && attr.starts_with(PRIVATE_MARKER))
    }

    /// Load `module` and register its public attributes.
    ///
    /// Later loads replace earlier entries of the same name and release them.
    /// The first failure aborts the load; entries registered before it stay.
    /// Returns the number of names registered.
    pub fn load(&self, py: Python<'_>, module: &str, registry: &mut FunctionRegistry) -> Result<usize, LoadError> {
        let handle = ModuleHandle::import(py, module)?;
        let mut registered = 0;

        for attr in handle.attribute_names()? {
            if !self.is_exposed(&attr) {
                continue;
            }

            let obj = handle.resolve(&attr)?;
            if self.config.callables_only && !obj.is_callable() {
                continue;
            }

            if let Some(previous) = registry.insert(attr.as_str(), ForeignObject::adopt(obj)) {
                log_registration_replaced(&attr, module);
                previous.release(py);
            }
            registered += 1;
        }

        log_module_loaded(module, registered);
        Ok(registered)
    }
}

fn stage_error(module: &str, stage: LoadStage, err: PyErr) -> LoadError {
    LoadError::new(module, stage).with_detail(err.to_string())
}
