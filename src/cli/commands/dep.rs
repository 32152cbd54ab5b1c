//! dep commands - Declare, remove, and list library dependencies

use anyhow::{bail, Result};

use super::{runtime, Context};
use crate::app::{self, DependencyConfig};
use crate::resolve::{Dependency, Lockfile};

/// Declare a dependency and vendor it.
pub fn add(ctx: &Context, spec: &str, registry: Option<&str>) -> Result<()> {
    let (paths, mut config) = app::open(&ctx.workdir()?)?;

    let dep = Dependency::parse(spec);
    config.upsert_dependency(DependencyConfig {
        name: dep.name.clone(),
        version: dep.version.clone(),
        registry: registry.map(str::to_string),
    });
    // Validate (unknown registry pins, etc.) before anything is written.
    config.validate()?;

    let rt = runtime()?;
    let installed = rt.block_on(app::sync_dependencies(&paths, &config))?;
    config.write(&paths.config_path())?;

    if !ctx.quiet {
        let resolved = &installed[&dep.name];
        println!(
            "Added {} {} from registry '{}'",
            dep.name, resolved.version, resolved.registry
        );
    }
    Ok(())
}

/// Remove a declared dependency.
pub fn remove(ctx: &Context, name: &str) -> Result<()> {
    let (paths, mut config) = app::open(&ctx.workdir()?)?;

    if !config.remove_dependency(name) {
        bail!("'{}' is not a declared dependency", name);
    }

    let rt = runtime()?;
    rt.block_on(app::sync_dependencies(&paths, &config))?;
    config.write(&paths.config_path())?;

    if !ctx.quiet {
        println!("Removed {}", name);
    }
    Ok(())
}

/// List resolved dependencies from the lockfile.
pub fn list(ctx: &Context) -> Result<()> {
    let (paths, _config) = app::open(&ctx.workdir()?)?;

    let lockfile = Lockfile::read(&paths.lockfile_path())?.unwrap_or_default();
    if lockfile.libraries.is_empty() {
        if !ctx.quiet {
            println!("No dependencies.");
        }
        return Ok(());
    }

    for (name, installed) in &lockfile.libraries {
        println!("{} {} ({})", name, installed.version, installed.registry);
    }
    Ok(())
}
