use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Installation details returned by `GET /v4/info/`
#[derive(Deserialize, Debug, Clone)]
pub struct InfoResponse {
    pub general: GeneralInfo,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralInfo {
    pub provider: String,
    #[serde(default)]
    pub installation_name: Option<String>,
}

/// One entry of the cluster listing (`GET /v4/clusters/`)
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub release_version: Option<String>,
    #[serde(default)]
    pub create_date: Option<DateTime<Utc>>,
}

/// Cluster details (`GET /v5/clusters/{id}/`)
#[derive(Deserialize, Debug, Clone)]
pub struct ClusterDetails {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub release_version: String,
    #[serde(default)]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub master_nodes: Option<MasterNodes>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct MasterNodes {
    #[serde(default)]
    pub high_availability: bool,
}

/// Body of `PATCH /v5/clusters/{id}/`; unset fields are left untouched
#[derive(Serialize, Debug, Clone, Default)]
pub struct ModifyClusterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_nodes: Option<MasterNodes>,
}

impl ModifyClusterRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.master_nodes.is_none()
    }
}
