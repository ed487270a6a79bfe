//! Embedded interpreter session
//!
//! `Session` owns the function registry and is the entry point for loading
//! modules and calling their functions. Every operation first takes the
//! session lock and then the interpreter lock, in that order, so concurrent
//! callers are serialized.
//!
//! Do not call into a session while already holding the interpreter lock
//! (inside `Python::with_gil`): another thread holding the session lock may
//! be waiting for it.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use pyo3::prelude::*;
use pyo3::types::PyList;
use tracing::{info_span, warn};

use crate::config::SessionConfig;
use crate::core::HostValue;
use crate::errors::{CallError, CallErrorKind, DecodeError, InitError, LoadError};
use crate::interop::{CodecLimits, Dispatcher, ForeignObject, FunctionRegistry, ModuleLoader};
use crate::logging::{self, perf};

/// Counters since the session started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub loads: usize,
    pub calls: usize,
    pub failed_calls: usize,
    /// Names currently registered
    pub registered: usize,
}

#[derive(Debug, Default)]
struct Counters {
    loads: AtomicUsize,
    calls: AtomicUsize,
    failed_calls: AtomicUsize,
}

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    dispatcher: Dispatcher,
    registry: Mutex<FunctionRegistry>,
    counters: Counters,
}

impl Session {
    /// Start the interpreter if needed, extend its module search path and
    /// load the configured preload modules.
    pub fn init(config: SessionConfig) -> Result<Self, InitError> {
        logging::log_runtime_init(config.runtime.search_paths.len());
        pyo3::prepare_freethreaded_python();

        Python::with_gil(|py| extend_search_path(py, &config))
            .map_err(|e| InitError::SearchPath { detail: e.to_string() })?;

        let session = Self {
            dispatcher: Dispatcher::new(CodecLimits::from(&config.codec)),
            config,
            registry: Mutex::new(FunctionRegistry::new()),
            counters: Counters::default(),
        };

        for module in &session.config.loader.preload {
            session.load(module)?;
        }

        Ok(session)
    }

    /// Session from the discovered config file, with environment overrides
    pub fn from_env() -> Result<Self, InitError> {
        Self::init(SessionConfig::discover().with_env_overrides())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Import `module` and register its public attributes; returns how many
    /// names were registered
    pub fn load(&self, module: &str) -> Result<usize, LoadError> {
        let _span = info_span!("load", module).entered();
        let _perf = perf::track("load");

        let mut registry = self.registry.lock();
        self.counters.loads.fetch_add(1, Ordering::Relaxed);

        let loader = ModuleLoader::new(&self.config.loader);
        Python::with_gil(|py| loader.load(py, module, &mut registry))
            .inspect_err(|e| warn!(event = "load_error", error = %e, "Module load failed"))
    }

    /// Call the function registered as `name`
    pub fn call(&self, name: &str, args: &[HostValue]) -> Result<HostValue, CallError> {
        let _span = info_span!("call", function = name).entered();
        logging::log_call(name, args.len());

        let registry = self.registry.lock();
        self.counters.calls.fetch_add(1, Ordering::Relaxed);

        let result = Python::with_gil(|py| self.dispatcher.call(py, &registry, name, args));
        match &result {
            Ok(value) => logging::log_call_return(name, value.kind_name()),
            Err(e) => {
                self.counters.failed_calls.fetch_add(1, Ordering::Relaxed);
                logging::log_call_error(e);
            }
        }
        result
    }

    /// Call and convert the result to `T`
    pub fn call_as<T>(&self, name: &str, args: &[HostValue]) -> Result<T, CallError>
    where
        T: TryFrom<HostValue, Error = DecodeError>,
    {
        let value = self.call(name, args)?;
        T::try_from(value).map_err(|e| CallError::new(name, CallErrorKind::DecodeFailed(e)))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.registry.lock().names().into_iter().map(str::to_owned).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.lock().contains(name)
    }

    /// A new reference to the object registered as `name`
    pub fn lookup(&self, name: &str) -> Option<ForeignObject> {
        let registry = self.registry.lock();
        Python::with_gil(|py| registry.get(name).map(|obj| obj.clone_ref(py)))
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            loads: self.counters.loads.load(Ordering::Relaxed),
            calls: self.counters.calls.load(Ordering::Relaxed),
            failed_calls: self.counters.failed_calls.load(Ordering::Relaxed),
            registered: self.registry.lock().len(),
        }
    }

    /// End the session, releasing every registered reference.
    ///
    /// The interpreter itself stays initialized for the rest of the process.
    pub fn finalize(self) {
        drop(self);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        let released = if registry.is_empty() {
            0
        } else {
            Python::with_gil(|py| registry.clear(py))
        };
        logging::log_runtime_finalize(released);
    }
}

// Prepend configured directories to sys.path, skipping ones already present
fn extend_search_path(py: Python<'_>, config: &SessionConfig) -> PyResult<()> {
    let sys_path = py.import_bound("sys")?.getattr("path")?.downcast_into::<PyList>()?;

    for dir in config.runtime.search_paths.iter().rev() {
        let dir = dir.to_string_lossy().into_owned();
        if !sys_path.contains(&dir)? {
            sys_path.insert(0, &dir)?;
        }
    }
    Ok(())
}
