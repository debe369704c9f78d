use super::{ProfileArgs, SessionContext};
use anyhow::{Context, Result};

pub fn run(ctx: &SessionContext, args: &ProfileArgs) -> Result<()> {
    let resolution = ctx.resolve(args)?;
    let yaml = serde_yaml::to_string(&resolution.spec).context("Failed to render profile")?;

    println!("# source: {:?}", resolution.source);
    print!("{}", yaml);
    Ok(())
}

/// Print the engine environment for the resolved profile as `KEY=VALUE`.
pub fn run_env(ctx: &SessionContext, args: &ProfileArgs) -> Result<()> {
    let resolution = ctx.resolve(args)?;
    for (key, value) in resolution.spec.env_exports() {
        println!("{}={}", key, value);
    }
    Ok(())
}
