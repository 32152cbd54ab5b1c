//! cluster
//!
//! Ambient kubeconfig context discovery.
//!
//! # Design
//!
//! Init defaults the first environment from the current cluster context's
//! server URI and namespace, when one exists. This module reads just enough
//! of the kubeconfig to answer that: `current-context`, the matching context
//! entry, and the matching cluster's server. A missing kubeconfig or an
//! unset current context is `Ok(None)`, not an error; init has a pinned
//! schema version to fall back to.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors from kubeconfig parsing.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The kubeconfig exists but could not be read.
    #[error("failed to read kubeconfig {path}: {reason}")]
    Io {
        /// Kubeconfig path
        path: String,
        /// The underlying failure
        reason: String,
    },

    /// The kubeconfig could not be parsed.
    #[error("failed to parse kubeconfig {path}: {reason}")]
    Parse {
        /// Kubeconfig path
        path: String,
        /// Why parsing failed
        reason: String,
    },
}

/// The current cluster context, as far as init cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterContext {
    /// API server URI of the current context's cluster
    pub server: String,
    /// Namespace of the current context, if set
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Kubeconfig {
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    server: String,
}

/// The kubeconfig path: `$KUBECONFIG` if set, else `~/.kube/config`.
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KUBECONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}

/// Read the current cluster context from a kubeconfig.
///
/// Returns `Ok(None)` when the file does not exist, no current context is
/// set, or the current context does not resolve to a cluster.
///
/// # Errors
///
/// - [`ClusterError::Io`] for read failures other than a missing file
/// - [`ClusterError::Parse`] for malformed YAML
pub fn current_context(path: &Path) -> Result<Option<ClusterContext>, ClusterError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no kubeconfig");
            return Ok(None);
        }
        Err(e) => {
            return Err(ClusterError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };

    let config: Kubeconfig = serde_yaml::from_slice(&bytes).map_err(|e| ClusterError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let Some(current) = config.current_context.filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let Some(context) = config
        .contexts
        .iter()
        .find(|c| c.name == current)
        .map(|c| &c.context)
    else {
        return Ok(None);
    };
    let Some(cluster) = config
        .clusters
        .iter()
        .find(|c| c.name == context.cluster)
        .map(|c| &c.cluster)
    else {
        return Ok(None);
    };

    Ok(Some(ClusterContext {
        server: cluster.server.clone(),
        namespace: context.namespace.clone(),
    }))
}
