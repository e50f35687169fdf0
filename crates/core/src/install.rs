//! Tool installation
//!
//! Ensures the `rebar` executable is present, in order of preference:
//! already on `PATH`, already installed under `deps_dir/rebar/`, or
//! downloaded as a source archive, unpacked, and built in place with the
//! tool's own bootstrap command.

use std::env;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::fetch::{self, FetchResult};
use crate::run;

/// Name of the build tool this bootstrapper ensures
pub const REBAR: &str = "rebar";

const REBAR_ARCHIVE_URL: &str = "https://github.com/rebar/rebar/archive/master.zip";
const BOOTSTRAP_CMD: &str = "./bootstrap";

/// One extracted archive entry, held in memory before installation.
///
/// The path is archive-relative with the synthetic top-level directory
/// already stripped.
#[derive(Debug)]
pub struct ExtractedEntry {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub mode: Option<u32>,
}

/// Ensure the rebar executable exists and return its path.
///
/// Idempotent: a tool found on `PATH` or at the install destination is
/// returned as-is with zero network traffic.
pub fn ensure_rebar(config: &ProjectConfig) -> Result<PathBuf> {
    if let Some(system) = find_on_path(REBAR) {
        info!("Using system {} at {}", REBAR, system.display());
        return Ok(system);
    }

    let tool_dir = config.deps_dir.join(REBAR);
    let installed = tool_dir.join(REBAR);
    if installed.exists() {
        info!("Using installed {} at {}", REBAR, installed.display());
        return Ok(installed);
    }

    let url = config
        .setting_str("rebar_url")
        .unwrap_or(REBAR_ARCHIVE_URL)
        .to_string();
    let staging = config.temp_dir.join(format!("{}.zip", REBAR));

    match fetch::fetch(&url, &staging, config)? {
        FetchResult::Saved(archive) => {
            let entries = unpack_archive(&archive)?;
            install_entries(&entries, &tool_dir)?;
        }
        FetchResult::NotFound => return Err(Error::NotFound { url }),
        FetchResult::TransportError(message) => {
            return Err(Error::Transport { url, message });
        }
    }

    run::run(BOOTSTRAP_CMD, &tool_dir)?;

    info!("Installed {} to {}", REBAR, installed.display());
    Ok(installed)
}

/// Locate an executable on the search path.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Read a zip archive fully into memory.
///
/// Directory entries are dropped; every file path loses its first
/// component (the archive's `<project>-master/` top level).
pub fn unpack_archive(archive_path: &Path) -> Result<Vec<ExtractedEntry>> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| Error::Archive {
        path: archive_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut entries = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| Error::Archive {
            path: archive_path.to_path_buf(),
            message: e.to_string(),
        })?;

        if entry.is_dir() {
            continue;
        }

        let path = entry.enclosed_name().ok_or_else(|| Error::Archive {
            path: archive_path.to_path_buf(),
            message: format!("invalid entry name: {}", entry.name()),
        })?;

        let stripped: PathBuf = path.components().skip(1).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;

        entries.push(ExtractedEntry {
            path: stripped,
            bytes,
            mode: entry.unix_mode(),
        });
    }

    debug!(
        "extracted {} entries from {}",
        entries.len(),
        archive_path.display()
    );
    Ok(entries)
}

/// Write extracted entries under `dest`, overwriting existing files.
pub fn install_entries(entries: &[ExtractedEntry], dest: &Path) -> Result<()> {
    for entry in entries {
        let target = dest.join(&entry.path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&target, &entry.bytes)?;

        #[cfg(unix)]
        if let Some(mode) = entry.mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn zip_bytes(entries: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut cursor);

        for (name, body, mode) in entries {
            let options = SimpleFileOptions::default().unix_permissions(*mode);
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }

        writer.finish().unwrap();
        cursor.into_inner()
    }

    fn write_zip(dir: &Path, entries: &[(&str, &str, u32)]) -> PathBuf {
        let path = dir.join("fixture.zip");
        fs::write(&path, zip_bytes(entries)).unwrap();
        path
    }

    #[test]
    fn top_level_directory_is_stripped() {
        let temp = TempDir::new().unwrap();
        let archive = write_zip(
            temp.path(),
            &[
                ("project-master/bin/tool", "#!/bin/sh\n", 0o755),
                ("project-master/README", "docs", 0o644),
            ],
        );

        let entries = unpack_archive(&archive).unwrap();

        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("bin/tool"), PathBuf::from("README")]);
    }

    #[test]
    fn install_writes_under_destination() {
        let temp = TempDir::new().unwrap();
        let archive = write_zip(
            temp.path(),
            &[("project-master/bin/tool", "#!/bin/sh\n", 0o755)],
        );

        let entries = unpack_archive(&archive).unwrap();
        let dest = temp.path().join(REBAR);
        install_entries(&entries, &dest).unwrap();

        let installed = dest.join("bin/tool");
        assert!(installed.is_file());
        assert_eq!(fs::read_to_string(&installed).unwrap(), "#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&installed).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn malformed_archive_is_an_archive_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("not-a-zip.zip");
        fs::write(&path, "definitely not a zip archive").unwrap();

        let result = unpack_archive(&path);
        assert!(matches!(result, Err(Error::Archive { .. })));
    }

    #[test]
    fn cached_executable_skips_the_network() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::from_value(
            json!({
                "build_dir": temp.path().to_str().unwrap(),
                // Any network attempt would fail against this address
                "rebar_url": "http://127.0.0.1:1/rebar.zip",
            }),
            temp.path(),
        )
        .unwrap();

        let cached = config.deps_dir.join(REBAR).join(REBAR);
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, "").unwrap();

        let path = ensure_rebar(&config).unwrap();
        assert_eq!(path, cached);
    }

    #[test]
    #[cfg(unix)]
    fn full_install_fetches_unpacks_and_builds() {
        let mut server = mockito::Server::new();
        let body = zip_bytes(&[
            (
                "rebar-master/bootstrap",
                "#!/bin/sh\necho building\ntouch rebar\nchmod +x rebar\n",
                0o755,
            ),
            ("rebar-master/src/rebar.erl", "%% source\n", 0o644),
        ]);
        let mock = server
            .mock("GET", "/archive/master.zip")
            .with_status(200)
            .with_body(body)
            .create();

        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::from_value(
            json!({
                "build_dir": temp.path().to_str().unwrap(),
                "rebar_url": format!("{}/archive/master.zip", server.url()),
            }),
            temp.path(),
        )
        .unwrap();

        let path = ensure_rebar(&config).unwrap();

        assert_eq!(path, config.deps_dir.join(REBAR).join(REBAR));
        assert!(path.is_file());
        assert!(config.deps_dir.join(REBAR).join("src/rebar.erl").is_file());
        assert!(config.temp_dir.join("rebar.zip").is_file());
        mock.assert();
    }

    #[test]
    fn missing_upstream_archive_is_fatal() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/archive/master.zip")
            .with_status(404)
            .create();

        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::from_value(
            json!({
                "build_dir": temp.path().to_str().unwrap(),
                "rebar_url": format!("{}/archive/master.zip", server.url()),
            }),
            temp.path(),
        )
        .unwrap();

        let result = ensure_rebar(&config);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
