//! Host callables exposed to configuration scripts
//!
//! A config script can only reach back into the host through a fixed
//! whitelist of named functions registered here before evaluation. Each
//! callable takes its arguments as JSON values and returns a JSON value
//! that is substituted into the Lua evaluation.

use mlua::{Lua, LuaSerdeExt, MultiValue, Result as LuaResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A single host callable.
///
/// Errors are plain strings; they surface inside the script as Lua runtime
/// errors and are recorded as faults by the evaluator.
pub type HostFn = Rc<dyn Fn(Vec<Value>) -> std::result::Result<Value, String>>;

/// The whitelist of host callables for one evaluation.
#[derive(Default, Clone)]
pub struct HostFns {
    fns: BTreeMap<String, HostFn>,
}

impl HostFns {
    pub fn new() -> Self {
        Self {
            fns: BTreeMap::new(),
        }
    }

    /// Add a callable under the given global name.
    pub fn insert<F>(&mut self, name: &str, f: F)
    where
        F: Fn(Vec<Value>) -> std::result::Result<Value, String> + 'static,
    {
        self.fns.insert(name.to_string(), Rc::new(f));
    }

    /// Register every callable as a Lua global in the given state.
    pub fn register(&self, lua: &Lua) -> LuaResult<()> {
        for (name, handler) in &self.fns {
            let handler = Rc::clone(handler);
            let name_for_err = name.clone();

            let func = lua.create_function(move |lua, args: MultiValue| {
                let mut json_args = Vec::with_capacity(args.len());
                for arg in args {
                    json_args.push(lua.from_value::<Value>(arg)?);
                }

                let out = handler(json_args).map_err(|e| {
                    mlua::Error::runtime(format!("{}: {}", name_for_err, e))
                })?;

                lua.to_value(&out)
            })?;

            lua.globals().set(name.as_str(), func)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for HostFns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFns")
            .field("names", &self.fns.keys().collect::<Vec<_>>())
            .finish()
    }
}
