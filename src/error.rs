use thiserror::Error;

/// A fatal back-end condition. These are resource or configuration bugs the
/// compiler cannot recover from; they abort the compilation with a non-zero
/// exit status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("integer scratch registers exhausted")]
    IntRegistersExhausted,
    #[error("float scratch registers exhausted")]
    FloatRegistersExhausted,
    #[error("temporary t{0} read before it was written")]
    TempReadBeforeWrite(usize),
    #[error("unknown symbol: '{0}'")]
    UnknownSymbol(String),
}
