//! Embedded Python host
//!
//! Start an interpreter inside the process, load modules into a
//! name → callable registry and call those functions with host values,
//! converting arguments and results in both directions.
//!
//! ```no_run
//! use pyhost::{host_args, Session, SessionConfig};
//!
//! let session = Session::init(SessionConfig::default().with_search_path("scripts"))?;
//! session.load("libtests.test_script2")?;
//! let reversed: Vec<u8> = session.call_as("func8", &host_args![b"Hello"])?;
//! assert_eq!(reversed, b"olleH");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod interop;
pub mod logging;
pub mod session;

pub use crate::core::{Float, HostValue, Integer};
pub use config::{CodecConfig, LoaderConfig, RuntimeConfig, SessionConfig};
pub use errors::{
    CallError, CallErrorKind, ConfigError, DecodeError, EncodeError, InitError, LoadError, LoadStage,
};
pub use interop::{CodecLimits, ForeignKind, ForeignObject};
pub use logging::{init_dev_logging, init_logging, init_prod_logging, LogConfig, LogFormat, LogOutput};
pub use session::{Session, SessionStats};
