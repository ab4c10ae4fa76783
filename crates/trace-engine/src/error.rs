//! Error taxonomy for the engine.
//!
//! A manual `enum` with hand-written `Display`/`Error` impls and `From`
//! conversions, separating failures by the pipeline stage that raised them
//! rather than collapsing everything into one stringly-typed error.

use std::fmt;

/// Failures from compiling a session's source with the native validator.
#[derive(Debug, Clone)]
pub enum CompileError {
    /// The compiler exited non-zero; carries its combined stdout+stderr.
    Rejected(String),
    /// The compiler did not finish within the timeout.
    TimedOut,
    /// The compiler could not even be spawned (missing from `PATH`, etc).
    ToolchainUnavailable(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(diagnostics) => write!(f, "compilation failed:\n{diagnostics}"),
            Self::TimedOut => write!(f, "compilation timed out"),
            Self::ToolchainUnavailable(detail) => write!(f, "no C++ toolchain available: {detail}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Failures looking up or operating on a session.
#[derive(Debug, Clone)]
pub enum SessionError {
    NotFound,
    StepOutOfRange { step: i64, total_steps: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "session not found"),
            Self::StepOutOfRange { step, total_steps } => {
                write!(f, "step {step} out of range for trace of {total_steps} states")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Top-level engine error, separating compilation/session/internal faults.
/// Request-field validation (missing `code`, unsupported language, missing
/// `sessionId`) is entirely the façade's concern and never reaches the
/// engine, so there is no `Validation` variant here -- only what the engine
/// itself can actually produce.
#[derive(Debug, Clone)]
pub enum EngineError {
    Compile(CompileError),
    Session(SessionError),
    /// Any unexpected internal fault, e.g. a poisoned session-registry
    /// mutex after a prior panic. Parsing and evaluation are total, so this
    /// variant should be rare in practice.
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile(error) => write!(f, "{error}"),
            Self::Session(error) => write!(f, "{error}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<CompileError> for EngineError {
    fn from(error: CompileError) -> Self {
        Self::Compile(error)
    }
}

impl From<SessionError> for EngineError {
    fn from(error: SessionError) -> Self {
        Self::Session(error)
    }
}
