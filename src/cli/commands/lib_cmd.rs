//! lib commands - Regenerate an environment's typed library

use anyhow::{bail, Context as _, Result};

use super::{runtime, Context};
use crate::app;
use crate::schema::SchemaSpecifier;

/// Regenerate an environment's library against a new schema.
pub fn generate(ctx: &Context, api_spec: &str, env: &str) -> Result<()> {
    let (paths, _config) = app::open(&ctx.workdir()?)?;

    if !paths.environment_dir(env).is_dir() {
        bail!("environment '{}' does not exist", env);
    }

    let specifier = SchemaSpecifier::parse(api_spec).context("invalid --api-spec")?;

    let rt = runtime()?;
    let library = rt.block_on(app::regenerate_library(&paths, env, &specifier))?;

    if !ctx.quiet {
        println!(
            "Generated {} modules for environment '{}' (schema {})",
            library.files.len(),
            env,
            library.schema_version
        );
    }
    Ok(())
}
