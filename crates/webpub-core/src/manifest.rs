//! Process manager descriptor (`process.json`) handling.
//!
//! Several applications share one process manager, so every declared process
//! is renamed to `<package>-<name>`. The rename is guarded by a plain string
//! prefix check, which keeps already-migrated descriptors untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// One process declared in the descriptor. Fields other than `name` are
/// carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A process manager descriptor with an ordered `apps` sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub apps: Vec<ProcessEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProcessDescriptor {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::ManifestRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| crate::Error::ManifestParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overwrite `path` with this descriptor as indented JSON.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let mut content =
            serde_json::to_string_pretty(self).map_err(|e| crate::Error::ManifestSerialize {
                path: path.to_path_buf(),
                source: e,
            })?;
        content.push('\n');
        std::fs::write(path, content).map_err(|e| crate::Error::ManifestWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Prefix every process name that does not already start with
    /// `package_name`. Returns the number of renamed entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use webpub_core::ProcessDescriptor;
    ///
    /// let mut desc: ProcessDescriptor =
    ///     serde_json::from_str(r#"{"apps":[{"name":"web"},{"name":"myapp-worker"}]}"#).unwrap();
    /// assert_eq!(desc.prefix_names("myapp"), 1);
    /// assert_eq!(desc.apps[0].name, "myapp-web");
    /// assert_eq!(desc.apps[1].name, "myapp-worker");
    /// ```
    pub fn prefix_names(&mut self, package_name: &str) -> usize {
        let mut renamed = 0;
        for app in &mut self.apps {
            if !app.name.starts_with(package_name) {
                app.name = format!("{package_name}-{}", app.name);
                renamed += 1;
            }
        }
        renamed
    }
}
