use anyhow::Result;
use boot_core::ProjectConfig;
use clap::Parser;
use console::{Term, style};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// bootlua - prepare a local build environment
///
/// Evaluates the Lua configuration script, creates the derived project
/// directory layout and ensures the rebar build tool is installed,
/// downloading and building it only when absent.
#[derive(Parser)]
#[command(name = "bootlua")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration script
    #[arg(default_value = boot_core::CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();
    bootstrap(&cli.config, cli.verbose)
}

fn bootstrap(config_path: &Path, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    // Check config exists
    if !config_path.exists() {
        term.write_line(&format!(
            "{} Config file not found: {}",
            style("error:").red().bold(),
            config_path.display()
        ))?;
        std::process::exit(1);
    }

    term.write_line(&format!(
        "{} Evaluating {}",
        style("::").cyan().bold(),
        config_path.display()
    ))?;

    // Load configuration
    let config = match ProjectConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            term.write_line(&format!(
                "{} Failed to evaluate config: {}",
                style("error:").red().bold(),
                e
            ))?;
            std::process::exit(1);
        }
    };

    if verbose {
        term.write_line(&format!("  Build dir: {}", config.build_dir.display()))?;
        term.write_line(&format!("  Deps dir:  {}", config.deps_dir.display()))?;
        term.write_line(&format!("  Temp dir:  {}", config.temp_dir.display()))?;
    }

    term.write_line(&format!(
        "{} Preparing {}",
        style("::").cyan().bold(),
        config.build_dir.display()
    ))?;

    // Create the layout and verify the tool
    let bootstrap = match boot_core::setup(config) {
        Ok(bootstrap) => bootstrap,
        Err(e) => {
            term.write_line(&format!(
                "{} Bootstrap failed: {}",
                style("error:").red().bold(),
                e
            ))?;
            std::process::exit(1);
        }
    };

    // The resolved descriptor goes to stdout for downstream tooling
    println!("{}", serde_json::to_string_pretty(&bootstrap)?);

    term.write_line(&format!("{} Done!", style("::").green().bold()))?;

    Ok(())
}
