//! resolve
//!
//! Dependency resolution, vendoring, and lockfile maintenance.
//!
//! # Algorithm
//!
//! Resolution is all-or-nothing per invocation:
//!
//! 1. Duplicate declarations are checked for conflicts *before any fetch*
//! 2. Indexes of candidate registries are prefetched concurrently and cached
//!    for the run (each index is fetched at most once)
//! 3. Each dependency walks its candidate registries in declared priority
//!    order; the first registry publishing a satisfying ref wins, regardless
//!    of fetch completion order
//! 4. Installs stage into a temporary directory and are renamed into
//!    `vendor/<name>/<version>/` atomically; an already-present version is
//!    never re-fetched
//! 5. The lockfile is rewritten only after every install succeeded
//!
//! Version constraints are exact tags or unspecified ("whatever the index
//! publishes"); range constraints are not supported.

pub mod lockfile;

pub use lockfile::{InstalledLibrary, Lockfile, LockfileError};

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::registry::{LibraryRef, Registry, RegistryError, Spec};

/// Errors from dependency resolution and installation.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The same dependency name was declared with incompatible pins.
    #[error("dependency conflict for '{name}': {reason}")]
    Conflict {
        /// The conflicting dependency name
        name: String,
        /// The incompatibility
        reason: String,
    },

    /// No configured registry publishes a satisfying version.
    #[error("unable to resolve dependency '{name}'")]
    Unresolved {
        /// The unresolvable dependency name
        name: String,
    },

    /// A dependency pins a registry that is not configured.
    #[error("dependency '{name}' references unknown registry '{registry}'")]
    UnknownRegistry {
        /// The dependency name
        name: String,
        /// The unconfigured registry name
        registry: String,
    },

    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A lockfile operation failed.
    #[error(transparent)]
    Lockfile(#[from] LockfileError),

    /// Vendoring a resolved library failed.
    #[error("failed to install '{name}': {reason}")]
    Install {
        /// The library being installed
        name: String,
        /// The underlying failure
        reason: String,
    },
}

/// A declared dependency: name plus optional registry and version pins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Library name
    pub name: String,
    /// Restrict resolution to this registry
    pub registry: Option<String>,
    /// Exact version tag; `None` accepts whatever the index publishes
    pub version: Option<String>,
}

impl Dependency {
    /// A dependency with no pins.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: None,
            version: None,
        }
    }

    /// Parse a `name` or `name@version` argument.
    ///
    /// # Example
    ///
    /// ```
    /// use konstruct::resolve::Dependency;
    ///
    /// let dep = Dependency::parse("nginx@0.0.2");
    /// assert_eq!(dep.name, "nginx");
    /// assert_eq!(dep.version.as_deref(), Some("0.0.2"));
    ///
    /// let unpinned = Dependency::parse("nginx");
    /// assert!(unpinned.version.is_none());
    /// ```
    pub fn parse(s: &str) -> Self {
        match s.split_once('@') {
            Some((name, version)) if !version.is_empty() => Self {
                name: name.to_string(),
                registry: None,
                version: Some(version.to_string()),
            },
            // A bare trailing '@' means no pin.
            Some((name, _)) => Self::new(name),
            None => Self::new(s),
        }
    }

    /// Pin this dependency to a registry.
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Pin this dependency to an exact version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Whether a published ref satisfies this dependency's version pin.
    fn satisfied_by(&self, library_ref: &LibraryRef) -> bool {
        match &self.version {
            Some(version) => version == &library_ref.version,
            None => true,
        }
    }
}

/// One resolved dependency: the durable record plus the retrieval ref.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The durable record persisted to the lockfile
    pub installed: InstalledLibrary,
    /// The registry's retrieval ref, consumed by install
    pub library_ref: LibraryRef,
}

/// A consistent resolved set: one concrete version per name.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    entries: BTreeMap<String, Resolved>,
}

impl Resolution {
    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Resolved)> {
        self.entries.iter()
    }

    /// Number of resolved dependencies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the resolution is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The name -> installed-library mapping.
    pub fn installed(&self) -> BTreeMap<String, InstalledLibrary> {
        self.entries
            .iter()
            .map(|(name, r)| (name.clone(), r.installed.clone()))
            .collect()
    }

    /// Build the lockfile representation of this resolution.
    pub fn to_lockfile(&self) -> Lockfile {
        let mut lockfile = Lockfile::new();
        lockfile.libraries = self.installed();
        lockfile
    }
}

/// Resolves declared dependencies against configured registries.
///
/// The registry slice's order is the priority order; the "default registry
/// used when none is pinned" is simply the front of this slice, passed in
/// explicitly so resolution is a pure function of its inputs.
pub struct Resolver<'a> {
    registries: &'a [Box<dyn Registry>],
}

impl<'a> Resolver<'a> {
    /// Create a resolver over registries in priority order.
    pub fn new(registries: &'a [Box<dyn Registry>]) -> Self {
        Self { registries }
    }

    /// Resolve every declared dependency to a concrete version.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Conflict`] / [`ResolveError::UnknownRegistry`]
    ///   before any fetch
    /// - [`ResolveError::Registry`] if a consulted index fetch failed
    /// - [`ResolveError::Unresolved`] if no candidate satisfies
    pub async fn resolve(&self, dependencies: &[Dependency]) -> Result<Resolution, ResolveError> {
        let deps = check_conflicts(dependencies)?;
        self.check_registry_pins(&deps)?;

        let indexes = self.prefetch_indexes(&deps).await;

        let mut entries = BTreeMap::new();
        for dep in &deps {
            let resolved = self.resolve_one(dep, &indexes)?;
            debug!(
                name = %dep.name,
                version = %resolved.installed.version,
                registry = %resolved.installed.registry,
                "resolved dependency"
            );
            entries.insert(dep.name.clone(), resolved);
        }
        Ok(Resolution { entries })
    }

    /// Fetch and install every resolved library under `vendor_root`.
    ///
    /// Installs run concurrently; any failure aborts the batch. Each
    /// install stages into a temporary directory inside the vendor root and
    /// is renamed into place, so a failed batch never leaves a half-written
    /// library visible. A version already present on disk is skipped
    /// without contacting its registry.
    pub async fn install(
        &self,
        resolution: &Resolution,
        vendor_root: &Path,
    ) -> Result<(), ResolveError> {
        if resolution.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(vendor_root).map_err(|e| ResolveError::Install {
            name: "vendor tree".to_string(),
            reason: format!("{}: {}", vendor_root.display(), e),
        })?;

        let results = futures::future::join_all(
            resolution
                .iter()
                .map(|(name, resolved)| self.install_one(name, resolved, vendor_root)),
        )
        .await;

        results.into_iter().collect()
    }

    /// Resolve, install, and lock in one pass, reusing the lockfile when the
    /// declared dependencies are unchanged.
    ///
    /// When the existing lockfile covers exactly the declared set and every
    /// vendored path is still present, the locked records are returned
    /// without contacting any registry.
    pub async fn sync(
        &self,
        dependencies: &[Dependency],
        vendor_root: &Path,
        lockfile_path: &Path,
    ) -> Result<BTreeMap<String, InstalledLibrary>, ResolveError> {
        let deps = check_conflicts(dependencies)?;

        if let Some(existing) = Lockfile::read(lockfile_path)? {
            if let Some(installed) = reusable(&deps, &existing, vendor_root) {
                debug!("lockfile satisfies declared dependencies; skipping registries");
                return Ok(installed);
            }
        }

        let resolution = self.resolve(&deps).await?;
        self.install(&resolution, vendor_root).await?;
        resolution.to_lockfile().write(lockfile_path)?;
        Ok(resolution.installed())
    }

    /// Registries this dependency may resolve from, as indices into the
    /// priority-ordered slice.
    fn candidates(&self, dep: &Dependency) -> Vec<usize> {
        match &dep.registry {
            Some(pinned) => self
                .registries
                .iter()
                .position(|r| r.name() == pinned)
                .into_iter()
                .collect(),
            None => (0..self.registries.len()).collect(),
        }
    }

    /// Reject registry pins that name no configured registry.
    fn check_registry_pins(&self, deps: &[Dependency]) -> Result<(), ResolveError> {
        for dep in deps {
            if let Some(pinned) = &dep.registry {
                if !self.registries.iter().any(|r| r.name() == pinned) {
                    return Err(ResolveError::UnknownRegistry {
                        name: dep.name.clone(),
                        registry: pinned.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Concurrently fetch the index of every candidate registry.
    ///
    /// Results are keyed by registry position so the per-dependency walk
    /// below preserves priority order no matter which fetch finished first.
    /// Failures are stored, not raised: an index error only surfaces if the
    /// sequential walk actually needs that registry.
    async fn prefetch_indexes(
        &self,
        deps: &[Dependency],
    ) -> HashMap<usize, Result<Spec, RegistryError>> {
        let mut wanted: Vec<usize> = deps.iter().flat_map(|d| self.candidates(d)).collect();
        wanted.sort_unstable();
        wanted.dedup();

        let fetches = wanted.into_iter().map(|idx| async move {
            (idx, self.registries[idx].fetch_index().await)
        });
        futures::future::join_all(fetches).await.into_iter().collect()
    }

    /// Walk one dependency's candidates in priority order.
    fn resolve_one(
        &self,
        dep: &Dependency,
        indexes: &HashMap<usize, Result<Spec, RegistryError>>,
    ) -> Result<Resolved, ResolveError> {
        for idx in self.candidates(dep) {
            let index = match indexes.get(&idx) {
                Some(Ok(index)) => index,
                Some(Err(e)) => return Err(e.clone().into()),
                None => continue,
            };
            if let Some(library_ref) = index.get(&dep.name) {
                if dep.satisfied_by(library_ref) {
                    let registry = self.registries[idx].name().to_string();
                    return Ok(Resolved {
                        installed: InstalledLibrary {
                            version: library_ref.version.clone(),
                            path: format!("{}/{}", dep.name, library_ref.version),
                            registry,
                        },
                        library_ref: library_ref.clone(),
                    });
                }
            }
        }
        Err(ResolveError::Unresolved {
            name: dep.name.clone(),
        })
    }

    fn registry_by_name(&self, name: &str) -> Option<&dyn Registry> {
        self.registries
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.as_ref())
    }

    /// Fetch and stage one library, then rename it into the vendor tree.
    async fn install_one(
        &self,
        name: &str,
        resolved: &Resolved,
        vendor_root: &Path,
    ) -> Result<(), ResolveError> {
        let target = vendor_root.join(&resolved.installed.path);
        if target.is_dir() {
            debug!(%name, path = %resolved.installed.path, "already vendored; skipping fetch");
            return Ok(());
        }

        let registry = self
            .registry_by_name(&resolved.installed.registry)
            .ok_or_else(|| ResolveError::UnknownRegistry {
                name: name.to_string(),
                registry: resolved.installed.registry.clone(),
            })?;
        let files = registry.fetch_contents(name, &resolved.library_ref).await?;

        let install_err = |e: std::io::Error| ResolveError::Install {
            name: name.to_string(),
            reason: e.to_string(),
        };

        let stage = tempfile::Builder::new()
            .prefix(".stage-")
            .tempdir_in(vendor_root)
            .map_err(install_err)?;
        for file in &files {
            let dest = stage.path().join(&file.path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(install_err)?;
            }
            std::fs::write(&dest, &file.contents).map_err(install_err)?;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(install_err)?;
        }
        let staged = stage.keep();
        if let Err(e) = std::fs::rename(&staged, &target) {
            let _ = std::fs::remove_dir_all(&staged);
            return Err(install_err(e));
        }
        Ok(())
    }
}

/// Collapse duplicate declarations, rejecting incompatible ones.
///
/// Two declarations of the same name conflict when they disagree on
/// registry or version pin; identical duplicates are tolerated and
/// collapsed. Runs before any fetch so a failed resolution leaves the
/// vendor tree and lockfile untouched.
fn check_conflicts(dependencies: &[Dependency]) -> Result<Vec<Dependency>, ResolveError> {
    let mut seen: BTreeMap<&str, &Dependency> = BTreeMap::new();
    let mut canonical = Vec::new();

    for dep in dependencies {
        match seen.get(dep.name.as_str()) {
            None => {
                seen.insert(&dep.name, dep);
                canonical.push(dep.clone());
            }
            Some(existing) => {
                if existing.registry != dep.registry {
                    return Err(ResolveError::Conflict {
                        name: dep.name.clone(),
                        reason: format!(
                            "declared against registries {} and {}",
                            pin_desc(&existing.registry),
                            pin_desc(&dep.registry)
                        ),
                    });
                }
                if existing.version != dep.version {
                    return Err(ResolveError::Conflict {
                        name: dep.name.clone(),
                        reason: format!(
                            "declared at versions {} and {}",
                            pin_desc(&existing.version),
                            pin_desc(&dep.version)
                        ),
                    });
                }
            }
        }
    }
    Ok(canonical)
}

fn pin_desc(pin: &Option<String>) -> String {
    match pin {
        Some(p) => format!("'{}'", p),
        None => "(unpinned)".to_string(),
    }
}

/// Whether a lockfile reproduces the declared set without re-resolution.
///
/// Requires the locked name set to equal the declared name set, every pin to
/// agree with its locked record, and every vendored path to still exist.
fn reusable(
    deps: &[Dependency],
    lockfile: &Lockfile,
    vendor_root: &Path,
) -> Option<BTreeMap<String, InstalledLibrary>> {
    if deps.len() != lockfile.libraries.len() {
        return None;
    }
    for dep in deps {
        let locked = lockfile.libraries.get(&dep.name)?;
        if let Some(version) = &dep.version {
            if version != &locked.version {
                return None;
            }
        }
        if let Some(registry) = &dep.registry {
            if registry != &locked.registry {
                return None;
            }
        }
        if !vendor_root.join(&locked.path).is_dir() {
            return None;
        }
    }
    Some(lockfile.libraries.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::mock::MockRegistry;

    fn boxed(registries: Vec<MockRegistry>) -> Vec<Box<dyn Registry>> {
        registries
            .into_iter()
            .map(|r| Box::new(r) as Box<dyn Registry>)
            .collect()
    }

    mod dependency {
        use super::*;

        #[test]
        fn parse_name_only() {
            let dep = Dependency::parse("nginx");
            assert_eq!(dep.name, "nginx");
            assert!(dep.version.is_none());
            assert!(dep.registry.is_none());
        }

        #[test]
        fn parse_name_at_version() {
            let dep = Dependency::parse("nginx@0.0.2");
            assert_eq!(dep.name, "nginx");
            assert_eq!(dep.version.as_deref(), Some("0.0.2"));
        }

        #[test]
        fn parse_trailing_at_is_unpinned() {
            let dep = Dependency::parse("nginx@");
            assert_eq!(dep.name, "nginx");
            assert!(dep.version.is_none());
        }
    }

    mod conflicts {
        use super::*;

        #[test]
        fn distinct_names_pass() {
            let deps = vec![Dependency::new("a"), Dependency::new("b")];
            assert_eq!(check_conflicts(&deps).unwrap().len(), 2);
        }

        #[test]
        fn identical_duplicates_collapse() {
            let deps = vec![
                Dependency::parse("a@1.0"),
                Dependency::parse("a@1.0"),
            ];
            assert_eq!(check_conflicts(&deps).unwrap().len(), 1);
        }

        #[test]
        fn version_mismatch_conflicts() {
            let deps = vec![
                Dependency::parse("foo@1.0"),
                Dependency::parse("foo@2.0"),
            ];
            let err = check_conflicts(&deps).unwrap_err();
            assert!(matches!(err, ResolveError::Conflict { ref name, .. } if name == "foo"));
            assert!(err.to_string().contains("'1.0'"));
            assert!(err.to_string().contains("'2.0'"));
        }

        #[test]
        fn registry_mismatch_conflicts() {
            let deps = vec![
                Dependency::new("foo").with_registry("a"),
                Dependency::new("foo").with_registry("b"),
            ];
            assert!(matches!(
                check_conflicts(&deps),
                Err(ResolveError::Conflict { .. })
            ));
        }

        #[test]
        fn pinned_vs_unpinned_version_conflicts() {
            let deps = vec![Dependency::new("foo"), Dependency::parse("foo@1.0")];
            assert!(matches!(
                check_conflicts(&deps),
                Err(ResolveError::Conflict { .. })
            ));
        }
    }

    mod resolution {
        use super::*;

        #[tokio::test]
        async fn resolves_from_single_registry() {
            let registries = boxed(vec![
                MockRegistry::new("incubator").with_library("nginx", "0.0.2", &[("a", "x")]),
            ]);
            let resolver = Resolver::new(&registries);

            let resolution = resolver.resolve(&[Dependency::new("nginx")]).await.unwrap();
            let installed = resolution.installed();
            let nginx = &installed["nginx"];
            assert_eq!(nginx.version, "0.0.2");
            assert_eq!(nginx.path, "nginx/0.0.2");
            assert_eq!(nginx.registry, "incubator");
        }

        #[tokio::test]
        async fn first_registry_wins() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let b = MockRegistry::new("b").with_library("foo", "2.0", &[("a", "x")]);
            let registries = boxed(vec![a, b]);
            let resolver = Resolver::new(&registries);

            let resolution = resolver.resolve(&[Dependency::new("foo")]).await.unwrap();
            assert_eq!(resolution.installed()["foo"].version, "1.0");
            assert_eq!(resolution.installed()["foo"].registry, "a");
        }

        #[tokio::test]
        async fn falls_through_to_later_registry() {
            let a = MockRegistry::new("a");
            let b = MockRegistry::new("b").with_library("foo", "2.0", &[("a", "x")]);
            let registries = boxed(vec![a, b]);
            let resolver = Resolver::new(&registries);

            let resolution = resolver.resolve(&[Dependency::new("foo")]).await.unwrap();
            assert_eq!(resolution.installed()["foo"].registry, "b");
        }

        #[tokio::test]
        async fn version_pin_skips_unsatisfying_registry() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let b = MockRegistry::new("b").with_library("foo", "2.0", &[("a", "x")]);
            let registries = boxed(vec![a, b]);
            let resolver = Resolver::new(&registries);

            let resolution = resolver
                .resolve(&[Dependency::parse("foo@2.0")])
                .await
                .unwrap();
            assert_eq!(resolution.installed()["foo"].registry, "b");
        }

        #[tokio::test]
        async fn registry_pin_restricts_candidates() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let b = MockRegistry::new("b").with_library("foo", "2.0", &[("a", "x")]);
            let registries = boxed(vec![a, b]);
            let resolver = Resolver::new(&registries);

            let resolution = resolver
                .resolve(&[Dependency::new("foo").with_registry("b")])
                .await
                .unwrap();
            assert_eq!(resolution.installed()["foo"].version, "2.0");
        }

        #[tokio::test]
        async fn unknown_registry_pin_fails_before_fetch() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let probe = a.clone();
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);

            let result = resolver
                .resolve(&[Dependency::new("foo").with_registry("nowhere")])
                .await;
            assert!(matches!(
                result,
                Err(ResolveError::UnknownRegistry { registry, .. }) if registry == "nowhere"
            ));
            assert_eq!(probe.index_fetches(), 0);
        }

        #[tokio::test]
        async fn unsatisfiable_is_unresolved() {
            let registries = boxed(vec![
                MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]),
            ]);
            let resolver = Resolver::new(&registries);

            let result = resolver.resolve(&[Dependency::parse("foo@9.9")]).await;
            assert!(matches!(
                result,
                Err(ResolveError::Unresolved { name }) if name == "foo"
            ));
        }

        #[tokio::test]
        async fn conflict_detected_before_any_fetch() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let probe = a.clone();
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);

            let result = resolver
                .resolve(&[Dependency::parse("foo@1.0"), Dependency::parse("foo@2.0")])
                .await;
            assert!(matches!(result, Err(ResolveError::Conflict { .. })));
            assert_eq!(probe.index_fetches(), 0);
        }

        #[tokio::test]
        async fn index_fetched_once_per_run() {
            let a = MockRegistry::new("a")
                .with_library("foo", "1.0", &[("a", "x")])
                .with_library("bar", "2.0", &[("a", "x")]);
            let probe = a.clone();
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);

            resolver
                .resolve(&[Dependency::new("foo"), Dependency::new("bar")])
                .await
                .unwrap();
            assert_eq!(probe.index_fetches(), 1);
        }

        #[tokio::test]
        async fn failed_index_surfaces_only_when_consulted() {
            use crate::registry::mock::FailOn;

            // b's index is broken, but a satisfies the only dependency.
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let b = MockRegistry::new("b").with_failure(FailOn::FetchIndex(
                RegistryError::Unreachable {
                    location: "b".to_string(),
                    reason: "down".to_string(),
                },
            ));
            let registries = boxed(vec![a, b]);
            let resolver = Resolver::new(&registries);

            let resolution = resolver.resolve(&[Dependency::new("foo")]).await.unwrap();
            assert_eq!(resolution.installed()["foo"].registry, "a");

            // A dependency a cannot satisfy must consult b and surface the error.
            let result = resolver.resolve(&[Dependency::new("bar")]).await;
            assert!(matches!(result, Err(ResolveError::Registry(_))));
        }
    }

    mod installation {
        use super::*;
        use tempfile::TempDir;

        #[tokio::test]
        async fn installs_into_versioned_tree() {
            let a = MockRegistry::new("a").with_library(
                "foo",
                "1.0",
                &[("foo.libsonnet", "{}\n"), ("docs/README.md", "hi\n")],
            );
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);
            let vendor = TempDir::new().unwrap();

            let resolution = resolver.resolve(&[Dependency::new("foo")]).await.unwrap();
            resolver.install(&resolution, vendor.path()).await.unwrap();

            let root = vendor.path().join("foo/1.0");
            assert_eq!(std::fs::read_to_string(root.join("foo.libsonnet")).unwrap(), "{}\n");
            assert_eq!(
                std::fs::read_to_string(root.join("docs/README.md")).unwrap(),
                "hi\n"
            );
        }

        #[tokio::test]
        async fn reinstall_skips_fetch() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let probe = a.clone();
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);
            let vendor = TempDir::new().unwrap();

            let resolution = resolver.resolve(&[Dependency::new("foo")]).await.unwrap();
            resolver.install(&resolution, vendor.path()).await.unwrap();
            resolver.install(&resolution, vendor.path()).await.unwrap();

            assert_eq!(probe.content_fetches().len(), 1);
        }

        #[tokio::test]
        async fn no_stage_directories_left_behind() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);
            let vendor = TempDir::new().unwrap();

            let resolution = resolver.resolve(&[Dependency::new("foo")]).await.unwrap();
            resolver.install(&resolution, vendor.path()).await.unwrap();

            let names: Vec<String> = std::fs::read_dir(vendor.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            assert_eq!(names, vec!["foo".to_string()]);
        }
    }

    mod syncing {
        use super::*;
        use tempfile::TempDir;

        #[tokio::test]
        async fn sync_writes_lockfile() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);
            let root = TempDir::new().unwrap();
            let vendor = root.path().join("vendor");
            let lockfile_path = root.path().join("konstruct.lock");

            let installed = resolver
                .sync(&[Dependency::new("foo")], &vendor, &lockfile_path)
                .await
                .unwrap();
            assert_eq!(installed["foo"].version, "1.0");

            let lockfile = Lockfile::read(&lockfile_path).unwrap().unwrap();
            assert_eq!(lockfile.libraries["foo"].version, "1.0");
        }

        #[tokio::test]
        async fn unchanged_sync_skips_registries() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let probe = a.clone();
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);
            let root = TempDir::new().unwrap();
            let vendor = root.path().join("vendor");
            let lockfile_path = root.path().join("konstruct.lock");

            let deps = [Dependency::new("foo")];
            resolver.sync(&deps, &vendor, &lockfile_path).await.unwrap();
            let first_fetches = probe.index_fetches();

            let installed = resolver.sync(&deps, &vendor, &lockfile_path).await.unwrap();
            assert_eq!(installed["foo"].version, "1.0");
            assert_eq!(probe.index_fetches(), first_fetches);
        }

        #[tokio::test]
        async fn missing_vendor_path_forces_reresolution() {
            let a = MockRegistry::new("a").with_library("foo", "1.0", &[("a", "x")]);
            let probe = a.clone();
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);
            let root = TempDir::new().unwrap();
            let vendor = root.path().join("vendor");
            let lockfile_path = root.path().join("konstruct.lock");

            let deps = [Dependency::new("foo")];
            resolver.sync(&deps, &vendor, &lockfile_path).await.unwrap();
            std::fs::remove_dir_all(&vendor).unwrap();

            resolver.sync(&deps, &vendor, &lockfile_path).await.unwrap();
            assert!(vendor.join("foo/1.0").is_dir());
            assert!(probe.index_fetches() >= 2);
        }

        #[tokio::test]
        async fn changed_declaration_invalidates_lockfile() {
            let a = MockRegistry::new("a")
                .with_library("foo", "1.0", &[("a", "x")])
                .with_library("bar", "2.0", &[("a", "x")]);
            let registries = boxed(vec![a]);
            let resolver = Resolver::new(&registries);
            let root = TempDir::new().unwrap();
            let vendor = root.path().join("vendor");
            let lockfile_path = root.path().join("konstruct.lock");

            resolver
                .sync(&[Dependency::new("foo")], &vendor, &lockfile_path)
                .await
                .unwrap();
            let installed = resolver
                .sync(
                    &[Dependency::new("foo"), Dependency::new("bar")],
                    &vendor,
                    &lockfile_path,
                )
                .await
                .unwrap();

            assert_eq!(installed.len(), 2);
            let lockfile = Lockfile::read(&lockfile_path).unwrap().unwrap();
            assert!(lockfile.libraries.contains_key("bar"));
        }
    }
}
