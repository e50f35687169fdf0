//! boot-core: bootstrap pipeline for bootlua
//!
//! This crate provides the sequential bootstrap flow: evaluate the
//! configuration, derive and create the project layout, and ensure the
//! rebar build tool is installed.

mod config;
mod error;
mod fetch;
mod install;
mod run;
mod setup;

pub use config::{CONFIG_FILE, ProjectConfig, default_host};
pub use error::{Error, Result};
pub use fetch::{FetchResult, fetch};
pub use install::{ExtractedEntry, REBAR, ensure_rebar, find_on_path, install_entries, unpack_archive};
pub use run::run;
pub use setup::{Bootstrap, ensure_dir, setup};
