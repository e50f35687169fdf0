//! boot-lua: Lua evaluation for bootstrap configuration
//!
//! This crate turns a configuration script into a single value:
//! - REPL-style chunk-at-a-time evaluation with a persistent binding
//!   environment
//! - fault accumulation with earliest-wins reporting
//! - a fixed whitelist of host callables reachable from the script

mod error;
mod eval;
mod host;

pub use error::{EvalError, FaultKind, Result, ScriptFault};
pub use eval::{evaluate_file, evaluate_source};
pub use host::{HostFn, HostFns};
