//! Interoperability - calling into interpreter code with host values
//!
//! Architecture:
//! - `reference.rs` - ownership of interpreter references (adopt, retain, bind)
//! - `types.rs` - object kind identification and codec limits
//! - `marshal.rs` - host value → interpreter object
//! - `unmarshal.rs` - interpreter object → host value
//! - `registry.rs` - name → callable mapping
//! - `library.rs` - module import and attribute registration
//! - `call.rs` - named invocation
//!
//! Everything here expects the interpreter lock to be held (a `Python<'py>`
//! token or a `Bound<'py, _>` in hand).

mod call;
mod library;
mod marshal;
mod reference;
mod registry;
mod types;
mod unmarshal;

pub use call::{invoke, Dispatcher};
pub use library::{ModuleHandle, ModuleLoader, PRIVATE_MARKER};
pub use marshal::{encode, encode_args, encode_with};
pub use reference::ForeignObject;
pub use registry::FunctionRegistry;
pub use types::{type_repr, CodecLimits, ForeignKind};
pub use unmarshal::{decode, decode_with};

#[cfg(test)]
mod tests;
