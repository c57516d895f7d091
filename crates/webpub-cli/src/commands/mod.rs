mod compile;
mod plan;

use crate::pipeline::PipelineInputs;
use webpub_core::{ENVIRONMENT_VAR, PACKAGE_NAME_VAR};

pub use compile::compile;
pub use plan::plan;

/// Read the pipeline's inputs from the process environment.
pub(crate) fn inputs_from_env() -> PipelineInputs {
    PipelineInputs {
        environment: env_value(ENVIRONMENT_VAR),
        package_name: env_value(PACKAGE_NAME_VAR),
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
}
