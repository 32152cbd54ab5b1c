//! registry commands - Inspect configured registries

use anyhow::{bail, Result};

use super::{runtime, Context};
use crate::app;

/// List configured registries in priority order.
pub fn list(ctx: &Context) -> Result<()> {
    let (_paths, config) = app::open(&ctx.workdir()?)?;

    if config.registries.is_empty() {
        if !ctx.quiet {
            println!("No registries configured.");
        }
        return Ok(());
    }

    for registry in &config.registries {
        println!(
            "{} {} {}",
            registry.name, registry.protocol, registry.location
        );
    }
    Ok(())
}

/// Show a registry's published index.
pub fn describe(ctx: &Context, name: &str) -> Result<()> {
    let (_paths, config) = app::open(&ctx.workdir()?)?;

    let registries = app::build_registries(&config);
    let Some(registry) = registries.iter().find(|r| r.name() == name) else {
        bail!("'{}' is not a configured registry", name);
    };

    let rt = runtime()?;
    let index = rt.block_on(registry.fetch_index())?;
    println!("{}", index.marshal()?);
    Ok(())
}
