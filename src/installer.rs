//! The install pipeline: build, discover, install, refresh, load.
//!
//! Every step is fatal on failure and nothing is rolled back. If `modprobe`
//! fails after the copy, the modules stay installed and indexed.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::InstallerConfig;
use crate::modules::{self, BuiltModule};
use crate::process::{Cmd, CommandRunner};
use crate::timing::Timer;

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The build produced no modules; nothing was installed or loaded.
    NothingBuilt,
    /// Modules were installed and loaded, in this order.
    Installed { modules: Vec<BuiltModule> },
}

pub struct Installer<R: CommandRunner> {
    config: InstallerConfig,
    runner: R,
}

impl<R: CommandRunner> Installer<R> {
    pub fn new(config: InstallerConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Compile the driver modules with the repository Makefile.
    pub fn build(&self) -> Result<()> {
        Cmd::new("make")
            .arg("-C")
            .arg_path(self.config.repo_root())
            .error_msg("Failed to build driver modules")
            .interactive()
            .run_with(&self.runner)?;
        Ok(())
    }

    /// Find the `.ko` files the build left in the repository.
    pub fn discover(&self) -> Result<Vec<BuiltModule>> {
        modules::discover_modules(self.config.repo_root())
    }

    /// Copy modules into `<module root>/<release>/extra`.
    pub fn install(&self, modules: &[BuiltModule]) -> Result<Vec<PathBuf>> {
        let dest = self.config.module_dest();
        modules::install_modules(modules, &dest)
            .with_context(|| format!("Failed to install modules into {}", dest.display()))
    }

    /// Rebuild the module dependency index so `modprobe` can resolve the new files.
    pub fn refresh_dependencies(&self) -> Result<()> {
        Cmd::new("depmod")
            .arg("-a")
            .error_msg("Failed to refresh module dependencies")
            .run_with(&self.runner)?;
        Ok(())
    }

    /// Load modules by logical name, in the order given.
    pub fn load(&self, modules: &[BuiltModule]) -> Result<()> {
        for module in modules {
            Cmd::new("modprobe")
                .arg(module.name.as_str())
                .error_msg(format!("Failed to load module {}", module.name))
                .run_with(&self.runner)?;
        }
        Ok(())
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> Result<RunOutcome> {
        println!("=== Building driver modules ===\n");
        let t = Timer::start("Build");
        self.build()?;
        t.finish();

        let modules = self.discover()?;
        if modules.is_empty() {
            println!("No modules were built. Aborting.");
            return Ok(RunOutcome::NothingBuilt);
        }
        println!("\nFound {} module(s):", modules.len());
        for module in &modules {
            println!("  {}", module.path.display());
        }

        println!("\n=== Installing to {} ===\n", self.config.module_dest().display());
        let t = Timer::start("Install");
        self.install(&modules)?;
        t.finish();

        println!("\n=== Refreshing module dependencies ===\n");
        let t = Timer::start("depmod");
        self.refresh_dependencies()?;
        t.finish();

        println!("\n=== Loading modules ===\n");
        let t = Timer::start("Load");
        self.load(&modules)?;
        t.finish();

        println!("\nDriver modules installed and loaded successfully.");
        Ok(RunOutcome::Installed { modules })
    }
}
