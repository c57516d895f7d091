use std::path::Path;

use serde::Deserialize;

/// Environment variable npm sets to the running package's name.
pub const PACKAGE_NAME_VAR: &str = "npm_package_name";

#[derive(Deserialize)]
struct PackageJson {
    name: Option<String>,
}

/// Determine the package name used to prefix process names.
///
/// `from_env` (the value of [`PACKAGE_NAME_VAR`]) wins when non-empty;
/// otherwise the `name` field of `<project_dir>/package.json` is used.
pub fn package_name(project_dir: &Path, from_env: Option<&str>) -> crate::Result<String> {
    if let Some(name) = from_env
        && !name.is_empty()
    {
        return Ok(name.to_owned());
    }

    let package_json = project_dir.join("package.json");
    if !package_json.is_file() {
        return Err(crate::Error::MissingPackageName { package_json });
    }

    let content = std::fs::read_to_string(&package_json).map_err(|e| crate::Error::PackageRead {
        path: package_json.clone(),
        source: e,
    })?;
    let parsed: PackageJson =
        serde_json::from_str(&content).map_err(|e| crate::Error::PackageParse {
            path: package_json.clone(),
            source: e,
        })?;

    match parsed.name {
        Some(name) if !name.is_empty() => {
            tracing::debug!(name = %name, "package name taken from package.json");
            Ok(name)
        }
        _ => Err(crate::Error::MissingPackageName { package_json }),
    }
}
