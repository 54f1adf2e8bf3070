pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Occurs when `citrus.toml` fails to load.
    #[error("failed to load citrus.toml: {0}")]
    LoadError(String),
    /// Occurs when a variable is neither stored in the context nor reachable through
    /// a segment extractor.
    #[error("unknown variable \"{name}\": {reason}")]
    UnresolvedVariable { name: String, reason: String },
    /// Occurs when a variable is set to a null value.
    #[error("trying to set variable \"{0}\", but variable value is null")]
    VariableNullValue(String),
    /// Occurs when a variable is created with a blank name.
    #[error("can not create variable \"{0}\", please define proper variable name")]
    InvalidVariableName(String),
    #[error("invalid context variable usage: {0}")]
    InvalidVariableUsage(String),
    /// Occurs when a function expression is malformed or a function rejects its parameters.
    #[error("invalid function usage: {0}")]
    InvalidFunctionUsage(String),
    #[error("can not find function library for prefix \"{0}\"")]
    NoSuchFunctionLibrary(String),
    #[error("can not find function \"{name}\" in library \"{library}\"")]
    NoSuchFunction { name: String, library: String },
    /// Occurs when a second function library claims an already registered prefix.
    #[error("function library prefix \"{0}\" is already bound to another library")]
    DuplicateFunctionLibraryPrefix(String),
    /// Occurs when a segment extractor accepted a path segment but failed to evaluate it.
    #[error("{0}")]
    SegmentExtraction(String),
    /// Occurs when a function parameter can not be parsed or a function fails at runtime.
    #[error("{0:#}")]
    ValueError(eyre::Report),
}

impl Error {
    pub(crate) fn unresolved(name: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::UnresolvedVariable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
