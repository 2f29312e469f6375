//! Optional platform features gated by provider and release version
//!
//! A capability is available for a cluster if the installation's provider has
//! a minimum release version for it and the cluster's release is at least that
//! version. Providers without an entry never have the capability.
//!
//! The table is plain data, built once and handed to [`CapabilityService`].
//!
//! ```
//! use kaasctl::capabilities::{CapabilityService, CapabilityTable};
//!
//! let service = CapabilityService::new(CapabilityTable::builtin());
//! let names: Vec<&str> = service
//!     .resolve("aws", "6.4.0")
//!     .unwrap()
//!     .into_iter()
//!     .map(|c| c.name.as_str())
//!     .collect();
//! assert_eq!(names, ["Autoscaling", "AvailabilityZones"]);
//! ```

use crate::client::{ApiClient, ApiError};
use async_trait::async_trait;
use semver::Version;
use thiserror::Error;
use tracing::debug;

pub const AUTOSCALING: &str = "Autoscaling";
pub const AVAILABILITY_ZONES: &str = "AvailabilityZones";
pub const NODE_POOLS: &str = "NodePools";
pub const HA_MASTERS: &str = "HAMasters";

#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Release versions must be exactly `major.minor.patch`
    #[error("invalid semantic version '{version}'")]
    InvalidVersion { version: String },
    #[error("capability '{name}' is defined more than once")]
    DuplicateCapability { name: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Minimum release a provider needs for a capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequirement {
    pub provider: String,
    pub release_version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityDefinition {
    pub name: String,
    pub required_release_per_provider: Vec<ReleaseRequirement>,
}

impl CapabilityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        CapabilityDefinition {
            name: name.into(),
            required_release_per_provider: Vec::new(),
        }
    }

    /// Add the minimum release for `provider`, replacing an earlier entry for
    /// the same provider
    pub fn requires(mut self, provider: &str, release_version: Version) -> Self {
        match self
            .required_release_per_provider
            .iter_mut()
            .find(|r| r.provider.eq_ignore_ascii_case(provider))
        {
            Some(existing) => existing.release_version = release_version,
            None => self.required_release_per_provider.push(ReleaseRequirement {
                provider: provider.to_string(),
                release_version,
            }),
        }
        self
    }

    pub fn required_release(&self, provider: &str) -> Option<&Version> {
        self.required_release_per_provider
            .iter()
            .find(|r| r.provider.eq_ignore_ascii_case(provider))
            .map(|r| &r.release_version)
    }

    pub fn is_available(&self, provider: &str, release: &Version) -> bool {
        self.required_release(provider)
            .is_some_and(|min| release >= min)
    }
}

/// Immutable set of known capabilities, kept in definition order
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    definitions: Vec<CapabilityDefinition>,
}

impl CapabilityTable {
    pub fn new(definitions: Vec<CapabilityDefinition>) -> Result<Self, CapabilityError> {
        for (i, def) in definitions.iter().enumerate() {
            if definitions[..i].iter().any(|d| d.name == def.name) {
                return Err(CapabilityError::DuplicateCapability {
                    name: def.name.clone(),
                });
            }
        }
        Ok(CapabilityTable { definitions })
    }

    /// The capabilities this client knows about
    pub fn builtin() -> Self {
        CapabilityTable {
            definitions: vec![
                CapabilityDefinition::new(AUTOSCALING).requires("aws", Version::new(6, 3, 0)),
                CapabilityDefinition::new(AVAILABILITY_ZONES)
                    .requires("aws", Version::new(6, 1, 0))
                    .requires("azure", Version::new(12, 0, 0)),
                CapabilityDefinition::new(NODE_POOLS)
                    .requires("aws", Version::new(9, 0, 0))
                    .requires("azure", Version::new(13, 0, 0)),
                CapabilityDefinition::new(HA_MASTERS).requires("aws", Version::new(11, 4, 0)),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn definitions(&self) -> &[CapabilityDefinition] {
        &self.definitions
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Parse a release version, accepting only `major.minor.patch` with an
/// optional pre-release or build suffix. Four numeric segments are rejected.
pub fn parse_release_version(version: &str) -> Result<Version, CapabilityError> {
    Version::parse(version.trim()).map_err(|_| CapabilityError::InvalidVersion {
        version: version.to_string(),
    })
}

/// Where provider and release information comes from
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Provider of the installation, e.g. `aws`
    async fn provider(&self) -> Result<String, ApiError>;

    /// Release version the given cluster runs
    async fn release_version(&self, cluster_id: &str) -> Result<String, ApiError>;
}

#[async_trait]
impl ReleaseSource for ApiClient {
    async fn provider(&self) -> Result<String, ApiError> {
        let info = self.info(&self.default_auxiliary_params()).await?;
        Ok(info.general.provider)
    }

    async fn release_version(&self, cluster_id: &str) -> Result<String, ApiError> {
        let cluster = self
            .get_cluster(cluster_id, &self.default_auxiliary_params())
            .await?;
        Ok(cluster.release_version)
    }
}

pub struct CapabilityService {
    table: CapabilityTable,
}

impl CapabilityService {
    pub fn new(table: CapabilityTable) -> Self {
        CapabilityService { table }
    }

    pub fn table(&self) -> &CapabilityTable {
        &self.table
    }

    /// Capabilities active for `provider` at `release_version`, in table order
    pub fn resolve(
        &self,
        provider: &str,
        release_version: &str,
    ) -> Result<Vec<&CapabilityDefinition>, CapabilityError> {
        let release = parse_release_version(release_version)?;
        let active: Vec<&CapabilityDefinition> = self
            .table
            .definitions()
            .iter()
            .filter(|def| def.is_available(provider, &release))
            .collect();
        debug!(
            provider,
            release = %release,
            active = ?active.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            "resolved capabilities"
        );
        Ok(active)
    }

    /// Whether the named capability is active. Unknown names are never active.
    pub fn has_capability(
        &self,
        provider: &str,
        release_version: &str,
        name: &str,
    ) -> Result<bool, CapabilityError> {
        Ok(self
            .resolve(provider, release_version)?
            .iter()
            .any(|def| def.name == name))
    }

    /// First release that has the capability on `provider`, if it ever does
    pub fn required_release(&self, name: &str, provider: &str) -> Option<&Version> {
        self.table.get(name)?.required_release(provider)
    }

    /// Fetch provider and release version for a cluster, then resolve
    pub async fn resolve_for_cluster(
        &self,
        source: &dyn ReleaseSource,
        cluster_id: &str,
    ) -> Result<Vec<&CapabilityDefinition>, CapabilityError> {
        let provider = source.provider().await?;
        let release = source.release_version(cluster_id).await?;
        self.resolve(&provider, &release)
    }
}
