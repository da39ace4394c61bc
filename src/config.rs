//! Installer configuration.
//!
//! All host-dependent values are resolved once, at process start, by
//! [`InstallerConfig::from_env`]. The pipeline only ever sees the resulting
//! struct, so tests build one by hand with injected values.

use anyhow::{Context, Result};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Overrides the repository that gets built and scanned.
pub const REPO_ROOT_ENV: &str = "MT7902_REPO_ROOT";

/// Overrides the kernel release reported by `uname`.
pub const KERNEL_RELEASE_ENV: &str = "MT7902_KERNEL_RELEASE";

/// Overrides the system module tree.
pub const MODULE_ROOT_ENV: &str = "MT7902_MODULE_ROOT";

/// Default system module tree.
pub const DEFAULT_MODULE_ROOT: &str = "/lib/modules";

/// Subdirectory of the release tree that out-of-tree modules go into.
pub const EXTRA_DIR: &str = "extra";

/// File extension of a built kernel module.
pub const MODULE_EXTENSION: &str = "ko";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Repository that contains the driver Makefile.
    pub repo_root: PathBuf,
    /// Release string of the kernel the modules are installed for.
    pub kernel_release: String,
    /// Root of the module tree (normally `/lib/modules`).
    pub module_root: PathBuf,
}

impl InstallerConfig {
    pub fn new(repo_root: impl Into<PathBuf>, kernel_release: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            kernel_release: kernel_release.into(),
            module_root: PathBuf::from(DEFAULT_MODULE_ROOT),
        }
    }

    pub fn with_module_root(mut self, module_root: impl Into<PathBuf>) -> Self {
        self.module_root = module_root.into();
        self
    }

    /// Resolve the configuration from the environment and the running kernel.
    pub fn from_env() -> Result<Self> {
        let repo_root = resolve_repo_root(env::var_os(REPO_ROOT_ENV))?;

        let kernel_release = match env::var(KERNEL_RELEASE_ENV) {
            Ok(release) if !release.trim().is_empty() => release.trim().to_string(),
            _ => running_kernel_release()?,
        };

        let module_root = env::var_os(MODULE_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODULE_ROOT));

        let config = Self {
            repo_root,
            kernel_release,
            module_root,
        };
        tracing::debug!(?config, "resolved installer configuration");
        Ok(config)
    }

    /// `<module root>/<kernel release>/extra`
    pub fn module_dest(&self) -> PathBuf {
        self.module_root.join(&self.kernel_release).join(EXTRA_DIR)
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

/// Repository to build: the override if set, else the current directory.
///
/// The installer is run from the driver checkout, the same way the driver's
/// own Makefile is.
pub fn resolve_repo_root(override_root: Option<OsString>) -> Result<PathBuf> {
    match override_root {
        Some(root) if !root.is_empty() => Ok(PathBuf::from(root)),
        _ => env::current_dir().context("Failed to determine the current directory"),
    }
}

/// Release string of the running kernel, as `uname -r` prints it.
pub fn running_kernel_release() -> Result<String> {
    let uts = nix::sys::utsname::uname().context("uname(2) failed")?;
    let release = uts
        .release()
        .to_str()
        .context("Kernel release is not valid UTF-8")?;
    Ok(release.to_string())
}
