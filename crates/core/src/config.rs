//! Project configuration model
//!
//! The configuration script's final value must be a table of settings.
//! From it we derive the working-area layout: `build_dir` (root),
//! `deps_dir` (tool installs, default `build_dir/lib`) and `temp_dir`
//! (always `build_dir/.temp`). Every top-level setting is kept verbatim
//! in `raw_settings` for lookups elsewhere.

use boot_lua::HostFns;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the configuration script discovered in the working directory
pub const CONFIG_FILE: &str = "bootstrap.lua";

const DEFAULT_NET_TIMEOUT_MS: u64 = 6000;
const DEFAULT_PROXY_PORT: &str = "8080";

/// Resolved project configuration, built once per run and read-only after
#[derive(Debug, Clone, Serialize)]
pub struct ProjectConfig {
    /// Root of the working area
    pub build_dir: PathBuf,
    /// Where dependencies/tools are installed
    pub deps_dir: PathBuf,
    /// Transient downloads and extraction
    pub temp_dir: PathBuf,
    /// Every top-level setting from the evaluated config, in order
    pub raw_settings: Map<String, Value>,
}

impl ProjectConfig {
    /// Evaluate a configuration script and derive the project layout.
    ///
    /// Relative paths in the script resolve against the script's own
    /// directory.
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let base = config_dir(config_path)?;
        let value = boot_lua::evaluate_file(config_path, &default_host())?;
        Self::from_value(value, &base)
    }

    /// Derive the layout from an already-evaluated configuration value.
    pub fn from_value(value: Value, cwd: &Path) -> Result<Self> {
        let raw_settings = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidConfig(format!(
                    "configuration value must be a table, got {}",
                    type_name(&other)
                )));
            }
        };

        let build_dir = match raw_settings.get("build_dir").and_then(Value::as_str) {
            Some(dir) => resolve(cwd, dir),
            None => cwd.to_path_buf(),
        };

        let deps_dir = match raw_settings
            .get("rebar_config")
            .and_then(|v| v.get("deps_dir"))
            .and_then(Value::as_str)
        {
            Some(dir) => resolve(&build_dir, dir),
            None => build_dir.join("lib"),
        };

        // temp_dir is always inside build_dir, never configurable
        let temp_dir = build_dir.join(".temp");

        debug!(
            "resolved layout: build={} deps={} temp={}",
            build_dir.display(),
            deps_dir.display(),
            temp_dir.display()
        );

        Ok(Self {
            build_dir,
            deps_dir,
            temp_dir,
            raw_settings,
        })
    }

    /// Look up a string setting by name.
    pub fn setting_str(&self, name: &str) -> Option<&str> {
        self.raw_settings.get(name).and_then(Value::as_str)
    }

    /// HTTP timeout for remote fetches (`remote_net_timeout`, milliseconds).
    pub fn net_timeout(&self) -> Duration {
        let ms = self
            .raw_settings
            .get("remote_net_timeout")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_NET_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    /// Proxy URL assembled from `remote_proxy_host`/`remote_proxy_port`.
    ///
    /// No host configured means no proxy; a missing port falls back to 8080.
    pub fn proxy_url(&self) -> Option<String> {
        let host = self.setting_str("remote_proxy_host")?;

        let port = match self.raw_settings.get("remote_proxy_port") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => DEFAULT_PROXY_PORT.to_string(),
        };

        Some(format!("http://{}:{}", host, port))
    }
}

/// The fixed set of host callables a config script may invoke.
pub fn default_host() -> HostFns {
    let mut host = HostFns::new();

    host.insert("getenv", |args| {
        let name = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| "expected a variable name".to_string())?;
        Ok(std::env::var(name)
            .map(Value::String)
            .unwrap_or(Value::Null))
    });

    host
}

/// Absolute directory containing the config file.
fn config_dir(config_path: &Path) -> Result<PathBuf> {
    let dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if dir.is_absolute() {
        Ok(dir)
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

fn resolve(base: &Path, dir: &str) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}
