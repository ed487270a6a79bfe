use std::fmt;

/// A host value could not be turned into an interpreter object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The value has a shape the interpreter cannot hold (e.g. an
    /// unhashable mapping key or set member)
    Unsupported { shape: String },
    /// An interpreter constructor reported failure
    Allocation { what: &'static str, detail: String },
    DepthExceeded { limit: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { shape } => write!(f, "unsupported type: {}", shape),
            Self::Allocation { what, detail } => {
                write!(f, "failed to create {}: {}", what, detail)
            }
            Self::DepthExceeded { limit } => {
                write!(f, "value nests deeper than {} levels", limit)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// An interpreter object could not be turned into a host value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Integer does not fit in 64 signed bits
    IntOverflow,
    InvalidText { detail: String },
    /// A dict key vanished between the key snapshot and the lookup
    MissingValue,
    Runtime { detail: String },
    DepthExceeded { limit: usize },
    /// Decoded value has a different shape than the caller asked for
    Mismatch { expected: &'static str, found: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntOverflow => write!(f, "integer does not fit in 64 bits"),
            Self::InvalidText { detail } => write!(f, "string is not valid UTF-8: {}", detail),
            Self::MissingValue => write!(f, "dict value missing for snapshotted key"),
            Self::Runtime { detail } => write!(f, "interpreter error while decoding: {}", detail),
            Self::DepthExceeded { limit } => {
                write!(f, "object nests deeper than {} levels", limit)
            }
            Self::Mismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Step of a module load that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    EncodeName,
    Import,
    Dir,
    DirItem,
    AttrName,
    Attribute,
}

impl LoadStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EncodeName => "encode-name",
            Self::Import => "import",
            Self::Dir => "dir",
            Self::DirItem => "dir-item",
            Self::AttrName => "attr-name",
            Self::Attribute => "attribute",
        }
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub module: String,
    pub stage: LoadStage,
    /// Interpreter exception text, when one was pending
    pub detail: Option<String>,
}

impl LoadError {
    pub fn new(module: impl Into<String>, stage: LoadStage) -> Self {
        Self { module: module.into(), stage, detail: None }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load module '{}' at stage {}", self.module, self.stage)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallErrorKind {
    NotFound,
    EncodeFailed(EncodeError),
    /// The callable raised; `message` holds the exception text if any
    InvokeFailed { message: Option<String> },
    DecodeFailed(DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    pub name: String,
    pub kind: CallErrorKind,
}

impl CallError {
    pub fn new(name: impl Into<String>, kind: CallErrorKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, CallErrorKind::NotFound)
    }

    /// Pipeline stage the call failed in
    pub fn stage(&self) -> &'static str {
        match self.kind {
            CallErrorKind::NotFound => "lookup",
            CallErrorKind::EncodeFailed(_) => "encode",
            CallErrorKind::InvokeFailed { .. } => "invoke",
            CallErrorKind::DecodeFailed(_) => "decode",
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CallErrorKind::NotFound => write!(f, "function not found: {}", self.name),
            CallErrorKind::EncodeFailed(e) => {
                write!(f, "failed to encode arguments for {}: {}", self.name, e)
            }
            CallErrorKind::InvokeFailed { message: Some(msg) } => {
                write!(f, "failed to call function {}: {}", self.name, msg)
            }
            CallErrorKind::InvokeFailed { message: None } => {
                write!(f, "failed to call function: {}", self.name)
            }
            CallErrorKind::DecodeFailed(e) => {
                write!(f, "failed to decode result of {}: {}", self.name, e)
            }
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            CallErrorKind::EncodeFailed(e) => Some(e),
            CallErrorKind::DecodeFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Session start-up failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// Could not extend the module search path
    SearchPath { detail: String },
    Preload(LoadError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchPath { detail } => write!(f, "failed to set module search path: {}", detail),
            Self::Preload(e) => write!(f, "preload failed: {}", e),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Preload(e) => Some(e),
            Self::SearchPath { .. } => None,
        }
    }
}

impl From<LoadError> for InitError {
    fn from(e: LoadError) -> Self {
        Self::Preload(e)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to access config: {}", e),
            Self::Parse(e) => write!(f, "failed to parse config: {}", e),
            Self::Serialize(e) => write!(f, "failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Serialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Serialize(e)
    }
}
