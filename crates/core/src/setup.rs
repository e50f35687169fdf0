//! Project setup orchestration
//!
//! Creates the directory layout derived from the configuration and then
//! verifies the build tool, producing the descriptor handed to downstream
//! build tooling.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::install;

/// The resolved bootstrap outcome: the configuration plus the ensured
/// tool executable.
#[derive(Debug, Serialize)]
pub struct Bootstrap {
    #[serde(flatten)]
    pub config: ProjectConfig,
    /// Path to the ensured rebar executable
    pub rebar: PathBuf,
}

/// Create a directory and its parent chain; existing directories are fine.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Prepare the working area and verify the build tool.
pub fn setup(config: ProjectConfig) -> Result<Bootstrap> {
    for dir in [&config.build_dir, &config.deps_dir, &config.temp_dir] {
        ensure_dir(dir)?;
    }
    info!("Working area ready at {}", config.build_dir.display());

    let rebar = install::ensure_rebar(&config)?;

    Ok(Bootstrap { config, rebar })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn ensure_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a/b/c");

        ensure_dir(&target).unwrap();
        ensure_dir(&target).unwrap();

        assert!(target.is_dir());
    }

    #[test]
    fn temp_dir_stays_inside_build_dir() {
        let config =
            ProjectConfig::from_value(json!({ "build_dir": "/tmp/x" }), Path::new("/cwd")).unwrap();

        assert!(config.temp_dir.starts_with(&config.build_dir));
    }

    #[test]
    fn setup_creates_the_layout() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::from_value(
            json!({ "build_dir": temp.path().join("work").to_str().unwrap() }),
            temp.path(),
        )
        .unwrap();

        // Pre-install the tool so no verification work is needed
        let cached = config.deps_dir.join(install::REBAR).join(install::REBAR);
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, "").unwrap();

        let bootstrap = setup(config).unwrap();

        assert!(bootstrap.config.build_dir.is_dir());
        assert!(bootstrap.config.deps_dir.is_dir());
        assert!(bootstrap.config.temp_dir.is_dir());
        assert!(bootstrap.rebar.is_file() || install::find_on_path(install::REBAR).is_some());
    }
}
