//! app::paths
//!
//! Centralized path routing for konstruct application trees.
//!
//! # Layout
//!
//! All application storage hangs off the app root:
//!
//! ```text
//! <root>/
//!   konstruct.toml     App configuration
//!   konstruct.lock     Lockfile
//!   .konstruct/        Tool metadata (exclusive lock lives here)
//!   components/        User-authored top-level objects
//!   environments/<env>/
//!     main.libsonnet   Environment entry point
//!     spec.json        Environment spec (server, namespace, schema version)
//!     lib/             Generated typed library
//!   lib/               User-written template helpers
//!   vendor/            Vendored registry libraries
//! ```
//!
//! No code outside this module computes these joins.
//!
//! # Example
//!
//! ```
//! use konstruct::app::paths::AppPaths;
//! use std::path::PathBuf;
//!
//! let paths = AppPaths::new(PathBuf::from("/work/guestbook"));
//! assert_eq!(
//!     paths.config_path(),
//!     PathBuf::from("/work/guestbook/konstruct.toml")
//! );
//! assert_eq!(
//!     paths.environment_lib_dir("default"),
//!     PathBuf::from("/work/guestbook/environments/default/lib")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Name of the default environment created by init.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Centralized path routing for one application tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// The application root directory.
    pub root: PathBuf,
}

impl AppPaths {
    /// Create paths rooted at an application directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The application root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/konstruct.toml` - the app configuration.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("konstruct.toml")
    }

    /// `<root>/konstruct.lock` - the lockfile.
    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join("konstruct.lock")
    }

    /// `<root>/.konstruct/` - tool metadata.
    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(".konstruct")
    }

    /// `<root>/.konstruct/lock` - the exclusive app lock.
    pub fn app_lock_path(&self) -> PathBuf {
        self.metadata_dir().join("lock")
    }

    /// `<root>/.gitignore`.
    pub fn gitignore_path(&self) -> PathBuf {
        self.root.join(".gitignore")
    }

    /// `<root>/components/` - user-authored top-level objects.
    pub fn components_dir(&self) -> PathBuf {
        self.root.join("components")
    }

    /// `<root>/lib/` - user-written template helpers.
    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// `<root>/vendor/` - vendored registry libraries.
    pub fn vendor_dir(&self) -> PathBuf {
        self.root.join("vendor")
    }

    /// `<root>/environments/`.
    pub fn environments_dir(&self) -> PathBuf {
        self.root.join("environments")
    }

    /// `<root>/environments/<env>/`.
    pub fn environment_dir(&self, env: &str) -> PathBuf {
        self.environments_dir().join(env)
    }

    /// `<root>/environments/<env>/lib/` - the generated typed library.
    pub fn environment_lib_dir(&self, env: &str) -> PathBuf {
        self.environment_dir(env).join("lib")
    }

    /// `<root>/environments/<env>/spec.json` - the environment spec.
    pub fn environment_spec_path(&self, env: &str) -> PathBuf {
        self.environment_dir(env).join("spec.json")
    }

    /// `<root>/environments/<env>/main.libsonnet` - the entry point.
    pub fn environment_main_path(&self, env: &str) -> PathBuf {
        self.environment_dir(env).join("main.libsonnet")
    }

    /// Whether this root already holds an initialized application.
    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    /// Create the scaffold directories.
    ///
    /// # Errors
    ///
    /// Returns an IO error if directory creation fails.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.metadata_dir())?;
        std::fs::create_dir_all(self.components_dir())?;
        std::fs::create_dir_all(self.lib_dir())?;
        std::fs::create_dir_all(self.vendor_dir())?;
        std::fs::create_dir_all(self.environment_dir(DEFAULT_ENVIRONMENT))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> AppPaths {
        AppPaths::new(PathBuf::from("/work/guestbook"))
    }

    #[test]
    fn root_level_paths() {
        assert_eq!(
            paths().config_path(),
            PathBuf::from("/work/guestbook/konstruct.toml")
        );
        assert_eq!(
            paths().lockfile_path(),
            PathBuf::from("/work/guestbook/konstruct.lock")
        );
        assert_eq!(
            paths().gitignore_path(),
            PathBuf::from("/work/guestbook/.gitignore")
        );
    }

    #[test]
    fn metadata_paths() {
        assert_eq!(
            paths().metadata_dir(),
            PathBuf::from("/work/guestbook/.konstruct")
        );
        assert_eq!(
            paths().app_lock_path(),
            PathBuf::from("/work/guestbook/.konstruct/lock")
        );
    }

    #[test]
    fn tree_paths() {
        assert_eq!(
            paths().components_dir(),
            PathBuf::from("/work/guestbook/components")
        );
        assert_eq!(paths().lib_dir(), PathBuf::from("/work/guestbook/lib"));
        assert_eq!(paths().vendor_dir(), PathBuf::from("/work/guestbook/vendor"));
    }

    #[test]
    fn environment_paths() {
        assert_eq!(
            paths().environment_dir("default"),
            PathBuf::from("/work/guestbook/environments/default")
        );
        assert_eq!(
            paths().environment_lib_dir("prod"),
            PathBuf::from("/work/guestbook/environments/prod/lib")
        );
        assert_eq!(
            paths().environment_spec_path("default"),
            PathBuf::from("/work/guestbook/environments/default/spec.json")
        );
        assert_eq!(
            paths().environment_main_path("default"),
            PathBuf::from("/work/guestbook/environments/default/main.libsonnet")
        );
    }

    #[test]
    fn ensure_dirs_creates_scaffold() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = AppPaths::new(temp.path().join("app"));
        paths.ensure_dirs().unwrap();

        assert!(paths.metadata_dir().is_dir());
        assert!(paths.components_dir().is_dir());
        assert!(paths.lib_dir().is_dir());
        assert!(paths.vendor_dir().is_dir());
        assert!(paths.environment_dir(DEFAULT_ENVIRONMENT).is_dir());
        assert!(!paths.is_initialized());
    }
}
