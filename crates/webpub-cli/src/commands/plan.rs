use std::path::Path;

use webpub_core::Settings;
use webpub_deploy::remote_path;

use crate::pipeline::Plan;

/// Resolve the configuration and print what `compile` would do.
pub fn plan(root: &Path) -> anyhow::Result<()> {
    let root = std::path::absolute(root)?;
    let settings = Settings::load(&root)?;
    let plan = Plan::resolve(&root, &settings, &super::inputs_from_env())?;

    println!("Environment:  {}", plan.environment);
    println!("Config:       {}", plan.bundle.path.display());
    println!("Build output: {}", plan.bundle.output_path.display());
    println!("Views:        {}", plan.views_dir.display());
    println!("Descriptor:   {}", plan.process_path.display());
    println!("Package:      {}", plan.package_name);

    let mut renamed = plan.descriptor.clone();
    renamed.prefix_names(&plan.package_name);
    println!();
    println!("Processes:");
    for (before, after) in plan.descriptor.apps.iter().zip(&renamed.apps) {
        if before.name == after.name {
            println!("  {}", after.name);
        } else {
            println!("  {} -> {}", before.name, after.name);
        }
    }

    println!();
    if plan.environment.is_published() {
        let public_path = plan.bundle.public_path.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "output.publicPath not set in {}; required to publish assets",
                plan.bundle.path.display()
            )
        })?;
        println!("Publish:      {}", remote_path(public_path)?);
    } else {
        println!("Publish:      skipped ({} does not publish)", plan.environment);
    }

    Ok(())
}
