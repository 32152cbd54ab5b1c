//! app::scaffold
//!
//! Seeding the files of a fresh application tree.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::ConfigError;
use super::paths::AppPaths;

/// Seeded `.gitignore`: generated and vendored trees are reproducible from
/// the config and lockfile, so they stay out of version control.
pub const GITIGNORE: &str = "\
vendor/
environments/*/lib/
";

/// Seeded environment entry point.
pub const MAIN_TEMPLATE: &str = "\
local k = import \"lib/k.libsonnet\";

{
}
";

/// Per-environment spec: where the environment points and which schema
/// version its generated library was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSpec {
    /// API server URI this environment targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Namespace this environment targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Schema version the generated library was built from
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
}

impl EnvironmentSpec {
    /// Read an environment spec.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write an environment spec atomically.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |e: String| ConfigError::Io {
            path: path.display().to_string(),
            reason: e,
        };

        let mut json = serde_json::to_string_pretty(self).map_err(|e| io_err(e.to_string()))?;
        json.push('\n');

        let dir = path
            .parent()
            .ok_or_else(|| io_err("no parent directory".to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| io_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| io_err(e.to_string()))?;
        Ok(())
    }
}

/// Seed the scaffold files of a fresh tree.
///
/// Directories come from [`AppPaths::ensure_dirs`]; this writes the
/// `.gitignore` and the default environment's entry point. Existing files
/// are left alone so re-running init after a partial failure is safe.
pub fn seed_files(paths: &AppPaths, environment: &str) -> std::io::Result<()> {
    let gitignore = paths.gitignore_path();
    if !gitignore.exists() {
        std::fs::write(&gitignore, GITIGNORE)?;
    }

    let main = paths.environment_main_path(environment);
    if !main.exists() {
        std::fs::write(&main, MAIN_TEMPLATE)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn seed_writes_scaffold_files() {
        let temp = TempDir::new().unwrap();
        let paths = AppPaths::new(temp.path().to_path_buf());
        paths.ensure_dirs().unwrap();

        seed_files(&paths, "default").unwrap();
        assert_eq!(
            std::fs::read_to_string(paths.gitignore_path()).unwrap(),
            GITIGNORE
        );
        assert_eq!(
            std::fs::read_to_string(paths.environment_main_path("default")).unwrap(),
            MAIN_TEMPLATE
        );
    }

    #[test]
    fn seed_preserves_existing_files() {
        let temp = TempDir::new().unwrap();
        let paths = AppPaths::new(temp.path().to_path_buf());
        paths.ensure_dirs().unwrap();
        std::fs::write(paths.gitignore_path(), "custom\n").unwrap();

        seed_files(&paths, "default").unwrap();
        assert_eq!(
            std::fs::read_to_string(paths.gitignore_path()).unwrap(),
            "custom\n"
        );
    }

    #[test]
    fn environment_spec_roundtrips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("spec.json");

        let spec = EnvironmentSpec {
            server: Some("https://10.0.0.1:6443".to_string()),
            namespace: Some("staging".to_string()),
            schema_version: "v1.7.0".to_string(),
        };
        spec.write(&path).unwrap();
        assert_eq!(EnvironmentSpec::read(&path).unwrap(), spec);
    }

    #[test]
    fn environment_spec_omits_absent_target() {
        let spec = EnvironmentSpec {
            server: None,
            namespace: None,
            schema_version: "v1.7.0".to_string(),
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(!json.contains("server"));
        assert!(json.contains("schemaVersion"));
    }
}
