//! Ownership of interpreter references
//!
//! Every interpreter object the host holds is owned by exactly one
//! `ForeignObject` (or one `Bound` while the interpreter lock is held) and
//! released when that owner drops. Ownership moves only through the three
//! operations below:
//!
//! - `adopt` / `adopt_into_slot` take a reference that is already owned and
//!   pass it on without touching the count
//! - `retain` increments the count to own a borrowed reference or a singleton
//! - `bind` lends the object for reading without changing ownership

use core::fmt;

use pyo3::exceptions::PyOverflowError;
use pyo3::ffi;
use pyo3::prelude::*;

/// One owned reference to an interpreter object
pub struct ForeignObject(Py<PyAny>);

impl ForeignObject {
    /// Take ownership of a reference the caller already owns, such as a
    /// constructor or call result
    #[inline]
    pub fn adopt(obj: Bound<'_, PyAny>) -> Self {
        Self(obj.unbind())
    }

    /// Increment the count and own the result
    #[inline]
    pub fn retain(obj: &Bound<'_, PyAny>) -> Self {
        Self(obj.clone().unbind())
    }

    /// Borrow for reading
    #[inline]
    pub fn bind<'py>(&self, py: Python<'py>) -> &Bound<'py, PyAny> {
        self.0.bind(py)
    }

    /// Give up ownership to whatever consumes the returned `Bound`
    #[inline]
    pub fn into_bound(self, py: Python<'_>) -> Bound<'_, PyAny> {
        self.0.into_bound(py)
    }

    #[inline]
    pub fn clone_ref(&self, py: Python<'_>) -> Self {
        Self(self.0.clone_ref(py))
    }

    /// Release now, while the interpreter lock is held
    #[inline]
    pub fn release(self, py: Python<'_>) {
        drop(self.into_bound(py));
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut ffi::PyObject {
        self.0.as_ptr()
    }

    /// Current reference count (for tests and diagnostics)
    pub fn refcount(&self) -> isize {
        Python::with_gil(|py| self.0.get_refcnt(py))
    }
}

impl Clone for ForeignObject {
    fn clone(&self) -> Self {
        Python::with_gil(|py| self.clone_ref(py))
    }
}

impl PartialEq for ForeignObject {
    /// Identity, not interpreter-level equality
    fn eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr()
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForeignObject({:p})", self.as_ptr())
    }
}

/// Containers whose slot setters adopt the reference they are given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slotted {
    List,
    Tuple,
}

impl Slotted {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Tuple => "tuple",
        }
    }
}

fn ssize(n: usize) -> PyResult<ffi::Py_ssize_t> {
    ffi::Py_ssize_t::try_from(n)
        .map_err(|_| PyOverflowError::new_err("container length out of range"))
}

/// Allocate a container of `len` empty slots.
///
/// Empty slots are legal to release, so a partially filled container can be
/// dropped on any error path and frees exactly the slots already filled.
pub(crate) fn new_slotted(py: Python<'_>, kind: Slotted, len: usize) -> PyResult<Bound<'_, PyAny>> {
    let len = ssize(len)?;
    unsafe {
        let ptr = match kind {
            Slotted::List => ffi::PyList_New(len),
            Slotted::Tuple => ffi::PyTuple_New(len),
        };
        Bound::from_owned_ptr_or_err(py, ptr)
    }
}

/// Move `item` into slot `index` of a container from `new_slotted`.
///
/// The container takes the reference even when the call fails, so the item
/// must not be released separately.
pub(crate) fn adopt_into_slot(
    container: &Bound<'_, PyAny>,
    kind: Slotted,
    index: usize,
    item: Bound<'_, PyAny>,
) -> PyResult<()> {
    let index = ssize(index)?;
    let status = unsafe {
        match kind {
            Slotted::List => ffi::PyList_SetItem(container.as_ptr(), index, item.into_ptr()),
            Slotted::Tuple => ffi::PyTuple_SetItem(container.as_ptr(), index, item.into_ptr()),
        }
    };

    if status == 0 {
        Ok(())
    } else {
        Err(PyErr::fetch(container.py()))
    }
}
