//! mt7902 driver installer CLI
//!
//! Builds, installs and loads the mt7902 kernel modules in one go.
//! Needs root: it writes under `/lib/modules` and calls `modprobe`.
//!
//! # Usage
//!
//! Run it from the root of the driver checkout (the directory holding the
//! driver Makefile), or point `MT7902_REPO_ROOT` at it.
//!
//! ```bash
//! cd mt7902 && sudo mt7902-install
//!
//! # Build a checkout somewhere else
//! sudo MT7902_REPO_ROOT=/src/mt7902 mt7902-install
//!
//! # Stage into another tree for a different kernel
//! sudo MT7902_MODULE_ROOT=/mnt/lib/modules MT7902_KERNEL_RELEASE=6.12.1 mt7902-install
//!
//! # Verbose diagnostics
//! sudo RUST_LOG=debug mt7902-install
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mt7902_installer::{error, Installer, InstallerConfig, SystemRunner};

#[derive(Parser)]
#[command(name = "mt7902-install")]
#[command(author, version, about = "Build, install and load the mt7902 driver modules", long_about = None)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(error::exit_code(&e));
    }
}

fn run() -> Result<()> {
    let config = InstallerConfig::from_env()?;
    Installer::new(config, SystemRunner).run()?;
    Ok(())
}
