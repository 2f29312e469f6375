use super::connect;
use crate::capabilities::{CapabilityService, CapabilityTable};
use crate::client::models::ClusterDetails;
use crate::cluster_resolver::ClusterResolver;
use crate::GlobalArgs;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ShowCommands {
    /// Show details of a cluster, including the optional features it supports
    Cluster {
        /// Name or ID of the cluster
        cluster: String,
    },
}

pub async fn run(cmd: ShowCommands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        ShowCommands::Cluster { cluster } => show_cluster(&cluster, global).await,
    }
}

async fn show_cluster(reference: &str, global: &GlobalArgs) -> Result<()> {
    let client = connect(global, "show-cluster")?;
    let mut resolver = ClusterResolver::new();
    let id = resolver
        .resolve(client.endpoint(), reference, &client)
        .await?;

    let details = client
        .get_cluster(&id, &client.default_auxiliary_params())
        .await?;
    let info = client.info(&client.default_auxiliary_params()).await?;

    let service = CapabilityService::new(CapabilityTable::builtin());
    let capabilities: Vec<&str> = service
        .resolve(&info.general.provider, &details.release_version)?
        .into_iter()
        .map(|c| c.name.as_str())
        .collect();

    print_details(&details, &info.general.provider, &capabilities);
    Ok(())
}

fn print_details(details: &ClusterDetails, provider: &str, capabilities: &[&str]) {
    let created = details
        .create_date
        .map(|d| d.format("%Y %B %d, %H:%M UTC").to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let ha = details
        .master_nodes
        .as_ref()
        .map(|m| if m.high_availability { "yes" } else { "no" })
        .unwrap_or("n/a");

    println!("{:<22}{}", "Cluster ID:", details.id);
    println!("{:<22}{}", "Name:", details.name);
    println!("{:<22}{}", "Owner:", details.owner.as_deref().unwrap_or("n/a"));
    println!("{:<22}{}", "Created:", created);
    println!("{:<22}{}", "Provider:", provider);
    println!("{:<22}{}", "Release version:", details.release_version);
    println!("{:<22}{}", "HA masters:", ha);
    for (key, value) in &details.labels {
        println!("{:<22}{}={}", "Label:", key, value);
    }
    if capabilities.is_empty() {
        println!("{:<22}none", "Capabilities:");
    } else {
        println!("{:<22}{}", "Capabilities:", capabilities.join(", "));
    }
}
