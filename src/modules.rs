//! Built module discovery and installation.
//!
//! Discovery walks the whole repository for `*.ko` files. Installation is a
//! flat copy into the release's `extra/` directory, so two modules with the
//! same file stem can't coexist there; discovery refuses such a set before
//! anything is written.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::MODULE_EXTENSION;
use crate::error::InstallError;

/// A compiled kernel module found after the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltModule {
    /// Where the build left the file.
    pub path: PathBuf,
    /// Name `modprobe` knows it by (file name without extension).
    pub name: String,
}

impl BuiltModule {
    /// Fails when the file name has no usable stem (empty or not UTF-8).
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, InstallError> {
        let path = path.into();
        match logical_name(&path) {
            Some(name) => Ok(Self { path, name }),
            None => Err(InstallError::InvalidModuleName { path }),
        }
    }

    /// File name the module is installed under.
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// Logical module name: the file name with its extension stripped.
pub fn logical_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

fn is_module_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(MODULE_EXTENSION)
}

/// Recursively find built modules under `root`.
///
/// Entries are visited sorted by file name so the reported order is stable
/// between runs. Symlinks to regular files count as modules; symlinked
/// directories are not descended into. Fails with
/// [`InstallError::InvalidModuleName`] for a module whose name can't be
/// derived and [`InstallError::ModuleNameCollision`] when two files share a
/// logical name.
pub fn discover_modules(root: &Path) -> Result<Vec<BuiltModule>> {
    let mut modules = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to scan {} for modules", root.display()))?;
        // Path::is_file follows symlinks, DirEntry::file_type doesn't.
        if !is_module_file(entry.path()) || !entry.path().is_file() {
            continue;
        }
        let module = BuiltModule::from_path(entry.path())?;
        tracing::debug!(name = %module.name, path = %module.path.display(), "found module");
        modules.push(module);
    }

    check_name_collisions(&modules)?;
    Ok(modules)
}

/// Reject module sets in which two files map to the same logical name.
pub fn check_name_collisions(modules: &[BuiltModule]) -> Result<(), InstallError> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for module in modules {
        if let Some(first) = seen.insert(&module.name, &module.path) {
            return Err(InstallError::ModuleNameCollision {
                name: module.name.clone(),
                first: first.to_path_buf(),
                second: module.path.clone(),
            });
        }
    }
    Ok(())
}

/// Copy every module into `dest`, creating it if needed.
///
/// Existing files of the same name are overwritten. Stops at the first
/// failed copy. Returns the installed paths in input order.
pub fn install_modules(modules: &[BuiltModule], dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create module directory {}", dest.display()))?;

    let mut installed = Vec::with_capacity(modules.len());
    for module in modules {
        let file_name = module
            .file_name()
            .with_context(|| format!("Module path has no file name: {}", module.path.display()))?;
        let target = dest.join(file_name);

        println!("  {} -> {}", module.path.display(), target.display());
        fs::copy(&module.path, &target).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                module.path.display(),
                target.display()
            )
        })?;
        tracing::debug!(module = %module.name, target = %target.display(), "installed module");
        installed.push(target);
    }

    Ok(installed)
}
