//! app
//!
//! The application tree and the init orchestration on top of the core.
//!
//! # Responsibilities
//!
//! - [`paths`] - Centralized path routing for app storage
//! - [`config`] - `konstruct.toml`: registries and declared dependencies
//! - [`lock`] - Exclusive app lock for mutating operations
//! - [`scaffold`] - Seed files for a fresh tree
//! - Init orchestration: schema source -> generator -> resolver
//!
//! # Architecture
//!
//! Everything here composes the core modules; none of the algorithms live
//! at this layer. Operations return typed errors and never print - the CLI
//! layer formats diagnostics.

pub mod config;
pub mod lock;
pub mod paths;
pub mod scaffold;

pub use config::{AppConfig, ConfigError, DependencyConfig, RegistryConfig};
pub use lock::{AppLock, LockError};
pub use paths::{AppPaths, DEFAULT_ENVIRONMENT};
pub use scaffold::EnvironmentSpec;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::cluster::{self, ClusterError};
use crate::gen::{self, GenError};
use crate::registry::{create_registry, Registry};
use crate::resolve::{InstalledLibrary, ResolveError, Resolver};
use crate::schema::{SchemaError, SchemaSource, SchemaSpecifier};

/// Release tag used when no cluster is reachable and no specifier is given.
pub const DEFAULT_SCHEMA_TAG: &str = "v1.7.0";

/// Name of the registry seeded into a fresh app's configuration.
pub const DEFAULT_REGISTRY_NAME: &str = "incubator";

/// Location of the seeded registry.
pub const DEFAULT_REGISTRY_LOCATION: &str = "https://registry.konstruct.io/incubator";

/// Network timeout applied to registry operations.
pub const REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from application-level operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Init was asked to reuse an already-initialized root.
    #[error("'{root}' already holds a konstruct application")]
    AlreadyInitialized {
        /// The occupied root
        root: PathBuf,
    },

    /// A command ran outside an application tree.
    #[error("'{root}' is not a konstruct application (no konstruct.toml)")]
    NotAnApp {
        /// The searched root
        root: PathBuf,
    },

    /// Filesystem scaffolding failed.
    #[error("failed to scaffold {path}: {reason}")]
    Scaffold {
        /// The path that failed
        path: PathBuf,
        /// The underlying failure
        reason: String,
    },

    /// Schema acquisition or validation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Library generation failed.
    #[error(transparent)]
    Gen(#[from] GenError),

    /// Dependency resolution or installation failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Configuration handling failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The app lock could not be acquired.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Kubeconfig inspection failed.
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Options for initializing an application.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Explicit schema specifier; `None` falls back to the ambient cluster
    /// context, then to [`DEFAULT_SCHEMA_TAG`]
    pub api_spec: Option<SchemaSpecifier>,

    /// Kubeconfig to inspect for the ambient context; `None` uses the
    /// standard location
    pub kubeconfig: Option<PathBuf>,
}

/// What init produced, for the CLI to report.
#[derive(Debug, Clone)]
pub struct InitSummary {
    /// The initialized root
    pub root: PathBuf,
    /// Schema version the default environment was generated from
    pub schema_version: String,
    /// Server URI the default environment targets, if any
    pub server: Option<String>,
    /// Namespace the default environment targets, if any
    pub namespace: Option<String>,
}

/// Initialize a new application at `root`.
///
/// Scaffolds the tree, generates the default environment's typed library
/// from the chosen schema, seeds the default registry, and materializes the
/// (initially empty) dependency set into the lockfile.
pub async fn init(root: &Path, options: InitOptions) -> Result<InitSummary, AppError> {
    let paths = AppPaths::new(root.to_path_buf());
    if paths.is_initialized() {
        return Err(AppError::AlreadyInitialized {
            root: root.to_path_buf(),
        });
    }

    // Pick the schema origin and the environment's target before touching
    // the filesystem, so a bad specifier leaves nothing behind.
    let context = match &options.kubeconfig {
        Some(path) => cluster::current_context(path)?,
        None => match cluster::default_kubeconfig_path() {
            Some(path) => cluster::current_context(&path)?,
            None => None,
        },
    };
    let specifier = match options.api_spec {
        Some(specifier) => specifier,
        None => match &context {
            Some(ctx) => SchemaSpecifier::Cluster {
                server: ctx.server.clone(),
            },
            None => SchemaSpecifier::Version(DEFAULT_SCHEMA_TAG.to_string()),
        },
    };
    debug!(origin = %specifier.describe(), "initializing application");

    let scaffold_err = |path: &Path, e: std::io::Error| AppError::Scaffold {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    paths.ensure_dirs().map_err(|e| scaffold_err(root, e))?;
    scaffold::seed_files(&paths, DEFAULT_ENVIRONMENT).map_err(|e| scaffold_err(root, e))?;

    // Generate the default environment's typed library.
    let source = SchemaSource::new();
    let schema = source.resolve(&specifier).await?;
    let library = gen::generate(&schema, &paths.environment_lib_dir(DEFAULT_ENVIRONMENT))?;

    let (server, namespace) = match &context {
        Some(ctx) => (Some(ctx.server.clone()), ctx.namespace.clone()),
        None => (None, None),
    };
    EnvironmentSpec {
        server: server.clone(),
        namespace: namespace.clone(),
        schema_version: library.schema_version.clone(),
    }
    .write(&paths.environment_spec_path(DEFAULT_ENVIRONMENT))?;

    // Seed the default registry and materialize the empty dependency set.
    let config = AppConfig {
        registries: vec![RegistryConfig {
            name: DEFAULT_REGISTRY_NAME.to_string(),
            protocol: "http".to_string(),
            location: DEFAULT_REGISTRY_LOCATION.to_string(),
        }],
        dependencies: vec![],
    };
    config.write(&paths.config_path())?;
    sync_dependencies(&paths, &config).await?;

    info!(root = %root.display(), schema = %library.schema_version, "initialized application");
    Ok(InitSummary {
        root: root.to_path_buf(),
        schema_version: library.schema_version,
        server,
        namespace,
    })
}

/// Open an existing application rooted at `root`.
pub fn open(root: &Path) -> Result<(AppPaths, AppConfig), AppError> {
    let paths = AppPaths::new(root.to_path_buf());
    if !paths.is_initialized() {
        return Err(AppError::NotAnApp {
            root: root.to_path_buf(),
        });
    }
    let config = AppConfig::read(&paths.config_path())?;
    Ok((paths, config))
}

/// Build registry backends from the configuration, in priority order.
pub fn build_registries(config: &AppConfig) -> Vec<Box<dyn Registry>> {
    config
        .registries
        .iter()
        .filter_map(|r| {
            r.parsed_protocol()
                .map(|protocol| create_registry(&r.name, protocol, &r.location, REGISTRY_TIMEOUT))
        })
        .collect()
}

/// Resolve, install, and lock the configured dependencies.
///
/// Holds the app lock across the whole span so concurrent invocations
/// cannot interleave vendor-tree or lockfile writes.
pub async fn sync_dependencies(
    paths: &AppPaths,
    config: &AppConfig,
) -> Result<BTreeMap<String, InstalledLibrary>, AppError> {
    let _lock = AppLock::acquire(paths)?;

    let registries = build_registries(config);
    let resolver = Resolver::new(&registries);
    let installed = resolver
        .sync(
            &config.declared_dependencies(),
            &paths.vendor_dir(),
            &paths.lockfile_path(),
        )
        .await?;
    Ok(installed)
}

/// Regenerate an environment's typed library against a new schema.
///
/// The environment spec's schema version is updated to match; its target
/// server and namespace are preserved.
pub async fn regenerate_library(
    paths: &AppPaths,
    environment: &str,
    specifier: &SchemaSpecifier,
) -> Result<gen::GeneratedLibrary, AppError> {
    let source = SchemaSource::new();
    let schema = source.resolve(specifier).await?;
    let library = gen::generate(&schema, &paths.environment_lib_dir(environment))?;

    let spec_path = paths.environment_spec_path(environment);
    let mut spec = if spec_path.exists() {
        EnvironmentSpec::read(&spec_path)?
    } else {
        EnvironmentSpec::default()
    };
    spec.schema_version = library.schema_version.clone();
    spec.write(&spec_path)?;

    Ok(library)
}
