//! Error types for boot-lua

use thiserror::Error;

/// Category of a recorded script fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The chunk never compiled (bad or truncated syntax)
    Parse,
    /// The chunk compiled but raised during evaluation
    Eval,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Parse => "parse",
            FaultKind::Eval => "eval",
        }
    }
}

/// A single fault recorded during one evaluation pass.
///
/// Faults accumulate across the whole script; only the earliest one is
/// surfaced to the caller at the end of input.
#[derive(Debug, Clone)]
pub struct ScriptFault {
    /// 1-based line where the failing chunk started
    pub line: usize,
    pub kind: FaultKind,
    pub message: String,
}

/// Errors that can occur during configuration evaluation
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lua runtime error: {0}")]
    Lua(#[from] mlua::Error),

    #[error("{} error at line {line}: {message}", .kind.as_str())]
    Script {
        line: usize,
        kind: FaultKind,
        message: String,
    },

    #[error("script defined no value")]
    UndefinedScript,
}

impl From<ScriptFault> for EvalError {
    fn from(fault: ScriptFault) -> Self {
        EvalError::Script {
            line: fault.line,
            kind: fault.kind,
            message: fault.message,
        }
    }
}

/// Result type for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;
