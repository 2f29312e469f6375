use super::connect;
use super::errors::CommandError;
use crate::cluster_resolver::ClusterResolver;
use crate::GlobalArgs;
use anyhow::Result;
use clap::Subcommand;
use dialoguer::Input;

#[derive(Subcommand, Debug)]
pub enum DeleteCommands {
    /// Delete a cluster and all workloads on it
    Cluster {
        /// Name or ID of the cluster
        cluster: String,
        /// Don't ask for confirmation
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(cmd: DeleteCommands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        DeleteCommands::Cluster { cluster, force } => delete_cluster(&cluster, force, global).await,
    }
}

async fn delete_cluster(reference: &str, force: bool, global: &GlobalArgs) -> Result<()> {
    let client = connect(global, "delete-cluster")?;
    let mut resolver = ClusterResolver::new();
    let id = resolver
        .resolve(client.endpoint(), reference, &client)
        .await?;

    if !force {
        let answer: String = Input::new()
            .with_prompt(format!(
                "Do you really want to delete cluster '{reference}'? Please type the name or ID to confirm"
            ))
            .allow_empty(true)
            .interact_text()?;
        if !is_confirmation(&answer, reference, &id) {
            println!("Cluster not deleted.");
            return Ok(());
        }
    }

    client
        .delete_cluster(&id, &client.default_auxiliary_params())
        .await
        .map_err(|err| {
            if err.is_access_forbidden() {
                anyhow::Error::new(CommandError::AccessForbidden { cluster: id.clone() })
            } else if err.is_not_found() {
                anyhow::Error::new(CommandError::ClusterNotFound { cluster: id.clone() })
            } else {
                anyhow::Error::new(err)
            }
        })?;

    println!("Cluster '{id}' will be deleted as soon as all workloads are terminated.");
    Ok(())
}

fn is_confirmation(answer: &str, reference: &str, id: &str) -> bool {
    let answer = answer.trim();
    !answer.is_empty() && (answer == reference.trim() || answer == id)
}
