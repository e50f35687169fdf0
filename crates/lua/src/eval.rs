//! Lua configuration evaluation
//!
//! A configuration script is treated as a stream of top-level chunks
//! evaluated one at a time against a single persistent Lua state, the way
//! a Lua REPL consumes input. Faults (parse or runtime) are recorded per
//! chunk and evaluation continues; at end of input the earliest fault wins.
//! A clean run yields the last value any chunk produced.

use mlua::{Function, Lua, LuaSerdeExt, MultiValue};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{EvalError, FaultKind, Result, ScriptFault};
use crate::host::HostFns;

/// Evaluate a configuration file and return its final value.
pub fn evaluate_file(config_path: &Path, host: &HostFns) -> Result<Value> {
    if !config_path.exists() {
        return Err(EvalError::ConfigNotFound(
            config_path.display().to_string(),
        ));
    }

    let source = std::fs::read_to_string(config_path)?;
    evaluate_source(&source, host)
}

/// Evaluate configuration source text and return its final value.
pub fn evaluate_source(source: &str, host: &HostFns) -> Result<Value> {
    let lua = Lua::new();
    host.register(&lua)?;

    let mut faults: Vec<ScriptFault> = Vec::new();
    let mut last_value: Option<Value> = None;

    let mut buf = String::new();
    let mut chunk_start = 1;

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;

        if buf.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            chunk_start = line_no;
        }

        buf.push_str(line);
        buf.push('\n');

        match compile_chunk(&lua, &buf) {
            Compiled::Incomplete => continue,
            Compiled::Invalid(message) => {
                debug!("parse fault at line {}: {}", chunk_start, message);
                faults.push(ScriptFault {
                    line: chunk_start,
                    kind: FaultKind::Parse,
                    message,
                });
            }
            Compiled::Chunk(func) => {
                match eval_chunk(&lua, &func) {
                    Ok(Some(value)) => last_value = Some(value),
                    Ok(None) => {}
                    Err(message) => {
                        debug!("eval fault at line {}: {}", chunk_start, message);
                        faults.push(ScriptFault {
                            line: chunk_start,
                            kind: FaultKind::Eval,
                            message,
                        });
                    }
                }
            }
        }

        buf.clear();
    }

    // A leftover buffer is a chunk the input ended in the middle of
    if !buf.is_empty() {
        faults.push(ScriptFault {
            line: chunk_start,
            kind: FaultKind::Parse,
            message: "unexpected end of input inside chunk".to_string(),
        });
    }

    if let Some(first) = faults.into_iter().next() {
        return Err(first.into());
    }

    last_value.ok_or(EvalError::UndefinedScript)
}

enum Compiled {
    /// A complete chunk, ready to run
    Chunk(Function),
    /// Needs more input lines
    Incomplete,
    /// Complete but will never compile
    Invalid(String),
}

/// Compile the accumulated buffer, preferring the expression reading.
///
/// `return <buf>` is tried first so a bare table literal or arithmetic
/// expression yields a value; anything that only reads as a statement
/// sequence (assignments, control flow) is compiled as-is.
fn compile_chunk(lua: &Lua, buf: &str) -> Compiled {
    let as_expr = format!("return {}", buf);
    match lua.load(as_expr.as_str()).into_function() {
        Ok(func) => return Compiled::Chunk(func),
        Err(mlua::Error::SyntaxError {
            incomplete_input: true,
            ..
        }) => return Compiled::Incomplete,
        Err(_) => {}
    }

    match lua.load(buf).into_function() {
        Ok(func) => Compiled::Chunk(func),
        Err(mlua::Error::SyntaxError {
            incomplete_input: true,
            ..
        }) => Compiled::Incomplete,
        Err(e) => Compiled::Invalid(e.to_string()),
    }
}

/// Run one compiled chunk; a chunk that returns nothing produces no value.
fn eval_chunk(lua: &Lua, func: &Function) -> std::result::Result<Option<Value>, String> {
    let values: MultiValue = func.call(()).map_err(|e| e.to_string())?;

    match values.into_iter().next() {
        Some(v) => lua
            .from_value::<Value>(v)
            .map(Some)
            .map_err(|e| e.to_string()),
        None => Ok(None),
    }
}
