//! Mapping user-supplied cluster names or IDs to canonical cluster IDs
//!
//! A [`ClusterResolver`] lives for one command invocation. It fetches the
//! cluster list at most once per endpoint and remembers every reference it
//! resolved, so repeated lookups cost no extra requests. Nothing is persisted.

use crate::client::{models::ClusterSummary, ApiClient, ApiError};
use async_trait::async_trait;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Length of a canonical cluster ID
pub const CLUSTER_ID_LEN: usize = 5;

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no cluster with name or ID '{reference}'")]
    NotFound {
        reference: String,
        /// Names of clusters that look similar
        suggestions: Vec<String>,
    },
    #[error("name '{name}' matches {} clusters ({}), use the ID instead", .ids.len(), .ids.join(", "))]
    Ambiguous { name: String, ids: Vec<String> },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Lists the clusters visible to the current credentials
#[async_trait]
pub trait ClusterSource: Send + Sync {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, ApiError>;
}

#[async_trait]
impl ClusterSource for ApiClient {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, ApiError> {
        ApiClient::list_clusters(self, &self.default_auxiliary_params()).await
    }
}

/// Whether `reference` has the shape of a canonical cluster ID
pub fn is_cluster_id(reference: &str) -> bool {
    reference.len() == CLUSTER_ID_LEN
        && reference
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

#[derive(Debug, Default)]
pub struct ClusterResolver {
    /// Cluster listings by API endpoint
    clusters: HashMap<String, Vec<ClusterSummary>>,
    /// Resolved IDs by (API endpoint, reference)
    ids: HashMap<(String, String), String>,
}

impl ClusterResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a cluster name or ID to the canonical ID
    ///
    /// An ID-shaped reference that exists is taken as is. Otherwise the
    /// reference must match exactly one cluster name.
    pub async fn resolve(
        &mut self,
        api_endpoint: &str,
        name_or_id: &str,
        source: &dyn ClusterSource,
    ) -> Result<String, ResolveError> {
        let reference = name_or_id.trim();
        let key = (api_endpoint.to_string(), reference.to_string());
        if let Some(id) = self.ids.get(&key) {
            debug!(api_endpoint, reference, id = %id, "cluster reference cache hit");
            return Ok(id.clone());
        }
        if reference.is_empty() {
            return Err(ResolveError::NotFound {
                reference: reference.to_string(),
                suggestions: Vec::new(),
            });
        }

        let clusters = self.clusters(api_endpoint, source).await?;
        let id = match_reference(clusters, reference)?;
        debug!(api_endpoint, reference, id = %id, "resolved cluster reference");
        self.ids.insert(key, id.clone());
        Ok(id)
    }

    async fn clusters(
        &mut self,
        api_endpoint: &str,
        source: &dyn ClusterSource,
    ) -> Result<&[ClusterSummary], ApiError> {
        if !self.clusters.contains_key(api_endpoint) {
            debug!(api_endpoint, "fetching cluster list");
            let list = source.list_clusters().await?;
            self.clusters.insert(api_endpoint.to_string(), list);
        }
        Ok(self
            .clusters
            .get(api_endpoint)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

fn match_reference(clusters: &[ClusterSummary], reference: &str) -> Result<String, ResolveError> {
    if is_cluster_id(reference) && clusters.iter().any(|c| c.id == reference) {
        return Ok(reference.to_string());
    }

    let named: Vec<&ClusterSummary> = clusters.iter().filter(|c| c.name == reference).collect();
    match named.as_slice() {
        [] => Err(ResolveError::NotFound {
            reference: reference.to_string(),
            suggestions: suggest(clusters, reference),
        }),
        [only] => Ok(only.id.clone()),
        many => Err(ResolveError::Ambiguous {
            name: reference.to_string(),
            ids: many.iter().map(|c| c.id.clone()).collect(),
        }),
    }
}

fn suggest(clusters: &[ClusterSummary], reference: &str) -> Vec<String> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = clusters
        .iter()
        .filter_map(|c| {
            matcher
                .fuzzy_match(&c.name, reference)
                .map(|score| (score, c.name.as_str()))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut names: Vec<String> = Vec::new();
    for (_, name) in scored {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        if names.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    names
}
