//! Remote fetching
//!
//! One blocking HTTP client is built lazily per process, from the settings
//! of the first fetch (timeout, optional proxy), and reused by every later
//! call. A fetch distinguishes "absent upstream" (404) from transport
//! faults; neither leaves a file at the destination.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::error::Result;

const AGENT: &str = concat!("bootlua/", env!("CARGO_PKG_VERSION"));

/// Outcome of a single fetch.
///
/// Callers must treat anything but `Saved` as "no file".
#[derive(Debug)]
pub enum FetchResult {
    /// Body streamed to the destination path
    Saved(PathBuf),
    /// Upstream answered 404
    NotFound,
    /// Connectivity, timeout or protocol fault
    TransportError(String),
}

static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Get the process-wide HTTP client, building it on first use.
fn http_client(config: &ProjectConfig) -> std::result::Result<&'static Client, String> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client);
    }

    let mut builder = Client::builder().timeout(config.net_timeout());

    if let Some(proxy) = config.proxy_url() {
        debug!("using proxy {}", proxy);
        builder = builder.proxy(reqwest::Proxy::all(&proxy).map_err(|e| e.to_string())?);
    }

    let client = builder.build().map_err(|e| e.to_string())?;
    Ok(HTTP_CLIENT.get_or_init(|| client))
}

/// GET `url` and stream the response body to `dest`.
pub fn fetch(url: &str, dest: &Path, config: &ProjectConfig) -> Result<FetchResult> {
    info!("Fetching {}", url);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let client = match http_client(config) {
        Ok(client) => client,
        Err(message) => return Ok(FetchResult::TransportError(message)),
    };

    let mut response = match client.get(url).header(USER_AGENT, AGENT).send() {
        Ok(response) => response,
        Err(e) => return Ok(FetchResult::TransportError(e.to_string())),
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        info!("{} not found upstream", url);
        return Ok(FetchResult::NotFound);
    }
    if !status.is_success() {
        return Ok(FetchResult::TransportError(format!("HTTP {}", status)));
    }

    let mut file = File::create(dest)?;
    if let Err(e) = response.copy_to(&mut file) {
        // Never leave a partial download behind
        drop(file);
        let _ = fs::remove_file(dest);
        return Ok(FetchResult::TransportError(e.to_string()));
    }

    info!("Downloaded to {}", dest.display());
    Ok(FetchResult::Saved(dest.to_path_buf()))
}
