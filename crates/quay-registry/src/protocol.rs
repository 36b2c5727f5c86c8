//! Resolution wire protocol.
//!
//! One `find_dependencies` request per workspace: every non-relative
//! direct constraint across all projects goes into a single query, and
//! the answer is reconciled back into the workspace configuration. An
//! empty constraint set short-circuits without any network call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quay_model::{Config, ScopeDirs};

use crate::error::{RegistryError, Result};
use crate::reconcile::reconcile;
use crate::transport::Transport;

/// Protocol revision this client speaks.
pub const API_VERSION: i64 = 1;

/// One requested constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedVersion {
    /// Declared version constraint, `"*"` for any.
    pub version: String,
}

/// A package entry in the registry's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePackage {
    /// Response-local id, referenced by peers' dependency lists.
    pub id: u64,
    /// Concrete resolved version.
    pub version: String,
    /// Capability flags as an integer bitset.
    #[serde(default)]
    pub flags: u64,
    /// Content hash of the package archive.
    #[serde(default)]
    pub md5: String,
    /// Ids of this package's own dependencies within the same answer.
    #[serde(default)]
    pub dependencies: Vec<u64>,
}

/// The registry's answer to `find_dependencies`.
#[derive(Debug, Clone, Deserialize)]
pub struct FindDependenciesResponse {
    /// Protocol revision; only [`API_VERSION`] is accepted.
    pub api: Option<i64>,
    /// Registry-reported failure, surfaced verbatim.
    #[serde(default)]
    pub error: Option<String>,
    /// Archive directory on the host, `"data"` when omitted.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Map of package path to resolved package.
    #[serde(default)]
    pub packages: BTreeMap<String, RemotePackage>,
}

fn default_data_dir() -> String {
    "data".to_string()
}

/// Collect every non-relative direct constraint across all projects.
pub fn build_request(cfg: &Config) -> BTreeMap<String, RequestedVersion> {
    let mut request = BTreeMap::new();
    for project in &cfg.projects {
        for dep in project.dependencies.values() {
            if dep.package.is_relative() {
                continue;
            }
            request.insert(
                dep.package.to_string(),
                RequestedVersion {
                    version: dep.version.to_any_string(),
                },
            );
        }
    }
    request
}

/// Run the workspace resolution round-trip.
///
/// Returns the registry's archive directory, or `None` when the
/// workspace declares no constraints and no request was made.
pub fn resolve(
    cfg: &mut Config,
    dirs: &ScopeDirs,
    transport: &dyn Transport,
) -> Result<Option<String>> {
    let request = build_request(cfg);
    if request.is_empty() {
        tracing::debug!("no direct constraints, skipping resolution");
        return Ok(None);
    }

    let url = format!("{}/api/find_dependencies", cfg.host.trim_end_matches('/'));
    tracing::info!(constraints = request.len(), "resolving dependencies");
    let raw = transport.post(&url, &serde_json::to_value(&request)?)?;
    cfg.dependency_tree = Some(raw.to_string());
    let response: FindDependenciesResponse = serde_json::from_value(raw)?;

    if let Some(message) = response.error {
        return Err(RegistryError::RegistryFailure { message });
    }
    match response.api {
        Some(API_VERSION) => {}
        other => {
            return Err(RegistryError::UnsupportedApi {
                api: other.unwrap_or(0),
            })
        }
    }

    reconcile(cfg, dirs, &response.packages)?;
    Ok(Some(response.data_dir))
}
