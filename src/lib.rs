//! mt7902 driver module installer.
//!
//! Builds the driver with the repository Makefile, copies the resulting
//! `.ko` files to `/lib/modules/<release>/extra`, refreshes the dependency
//! index and loads the modules with `modprobe`.
//!
//! ```rust,ignore
//! use mt7902_installer::{Installer, InstallerConfig, SystemRunner};
//!
//! let config = InstallerConfig::from_env()?;
//! Installer::new(config, SystemRunner).run()?;
//! ```

pub mod config;
pub mod error;
pub mod installer;
pub mod modules;
pub mod process;
pub mod timing;

#[cfg(test)]
mod testing;

pub use config::InstallerConfig;
pub use error::InstallError;
pub use installer::{Installer, RunOutcome};
pub use modules::BuiltModule;
pub use process::{Cmd, CommandOutput, CommandRunner, SystemRunner};
pub use timing::Timer;
