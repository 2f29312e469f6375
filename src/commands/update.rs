use super::connect;
use super::errors::CommandError;
use crate::capabilities::{CapabilityService, CapabilityTable, HA_MASTERS};
use crate::client::models::{MasterNodes, ModifyClusterRequest};
use crate::cluster_resolver::ClusterResolver;
use crate::GlobalArgs;
use anyhow::Result;
use clap::Subcommand;
use tracing::debug;

#[derive(Subcommand, Debug)]
pub enum UpdateCommands {
    /// Change the name of a cluster or turn on highly available masters
    Cluster {
        /// Name or ID of the cluster
        cluster: String,
        /// New name for the cluster
        #[arg(long)]
        name: Option<String>,
        /// Switch to three master nodes
        #[arg(long)]
        master_ha: bool,
    },
}

pub async fn run(cmd: UpdateCommands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        UpdateCommands::Cluster {
            cluster,
            name,
            master_ha,
        } => update_cluster(&cluster, name, master_ha, global).await,
    }
}

async fn update_cluster(
    reference: &str,
    name: Option<String>,
    master_ha: bool,
    global: &GlobalArgs,
) -> Result<()> {
    let request = ModifyClusterRequest {
        name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        master_nodes: master_ha.then(|| MasterNodes {
            high_availability: true,
        }),
    };
    if request.is_empty() {
        return Err(CommandError::NothingToUpdate.into());
    }

    let client = connect(global, "update-cluster")?;
    let mut resolver = ClusterResolver::new();
    let id = resolver
        .resolve(client.endpoint(), reference, &client)
        .await?;

    if master_ha {
        let provider = client
            .info(&client.default_auxiliary_params())
            .await?
            .general
            .provider;
        let release = client
            .get_cluster(&id, &client.default_auxiliary_params())
            .await?
            .release_version;

        let service = CapabilityService::new(CapabilityTable::builtin());
        if !service.has_capability(&provider, &release, HA_MASTERS)? {
            debug!(%provider, %release, "HA masters not available");
            return Err(CommandError::CapabilityUnsupported {
                feature: "High availability masters".to_string(),
                required_release: service.required_release(HA_MASTERS, &provider).cloned(),
            }
            .into());
        }
    }

    let updated = client
        .modify_cluster(&id, &request, &client.default_auxiliary_params())
        .await?;
    println!("Cluster '{}' ({}) has been modified.", updated.id, updated.name);
    Ok(())
}
