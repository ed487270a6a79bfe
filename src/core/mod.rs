//! Host-side value model
//!
//! `HostValue` is the closed set of values the embedding program exchanges
//! with interpreter code.

pub mod value;

pub use value::{Float, HostValue, Integer};
