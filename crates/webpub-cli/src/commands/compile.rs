use std::path::Path;

use webpub_build::{CommandBundler, format_seconds};
use webpub_core::Settings;
use webpub_deploy::CommandPublisher;

use crate::pipeline::{Pipeline, PipelineError};

/// Run the full compile pipeline against the project at `root`.
pub async fn compile(root: &Path) -> anyhow::Result<()> {
    println!("start compiling...");

    let root = std::path::absolute(root)?;
    let settings = Settings::load(&root)?;
    let bundler = CommandBundler::new(&settings.bundler, &root);
    let publisher = CommandPublisher::new(&settings.publish, &root);
    let pipeline = Pipeline::new(&root, settings, bundler, publisher);

    let report = match pipeline.run(&super::inputs_from_env()).await {
        Ok(report) => report,
        Err(failure) => {
            if let PipelineError::Build(build) = &failure.error
                && let Some(diagnostics) = build.report()
            {
                eprintln!("{diagnostics}");
            }
            tracing::debug!(history = ?failure.history, "compile aborted");
            return Err(failure.into());
        }
    };

    if let Some(result) = &report.published {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    tracing::info!(
        environment = %report.environment,
        renamed = report.renamed_processes,
        templates = report.templates_moved,
        warnings = report.build.warnings,
        stages = report.history.len(),
        "compile finished"
    );
    println!("compile success in {} s", format_seconds(report.elapsed));
    Ok(())
}
