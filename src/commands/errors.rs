//! User-facing text for failures
//!
//! Commands return `anyhow::Error`; [`describe`] looks for the typed errors
//! of the library inside it and turns them into a headline and an
//! explanation.

use crate::capabilities::CapabilityError;
use crate::client::ApiError;
use crate::cluster_resolver::ResolveError;
use crate::config::{config_path, ConfigError};
use semver::Version;
use thiserror::Error;

/// Failures decided by the command layer itself
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("nothing to update")]
    NothingToUpdate,
    #[error("{feature} are not available for this cluster")]
    CapabilityUnsupported {
        /// Human name of the feature, plural
        feature: String,
        /// First release with the feature, if the provider supports it at all
        required_release: Option<Version>,
    },
    #[error("access to cluster '{cluster}' is forbidden")]
    AccessForbidden { cluster: String },
    #[error("cluster '{cluster}' not found")]
    ClusterNotFound { cluster: String },
}

/// Headline and explanation for an error. The explanation may be empty.
pub fn describe(err: &anyhow::Error) -> (String, String) {
    if let Some(e) = err.downcast_ref::<CommandError>() {
        return describe_command(e);
    }
    if let Some(e) = err.downcast_ref::<ResolveError>() {
        return describe_resolve(e);
    }
    if let Some(e) = err.downcast_ref::<CapabilityError>() {
        return match e {
            CapabilityError::InvalidVersion { version } => (
                format!("Invalid release version '{version}'"),
                "Release versions must have the form MAJOR.MINOR.PATCH.".to_string(),
            ),
            CapabilityError::DuplicateCapability { .. } => (e.to_string(), String::new()),
            CapabilityError::Api(api) => describe_api(api),
        };
    }
    if let Some(e) = err.downcast_ref::<ApiError>() {
        return describe_api(e);
    }
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return describe_config(e);
    }

    let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
    (err.to_string(), causes.join(": "))
}

fn describe_command(e: &CommandError) -> (String, String) {
    match e {
        CommandError::NothingToUpdate => (
            "Nothing to update".to_string(),
            "Please specify at least one of --name or --master-ha.".to_string(),
        ),
        CommandError::CapabilityUnsupported {
            feature,
            required_release: Some(release),
        } => (
            format!("{feature} are not available for this cluster"),
            format!("{feature} are only supported by releases {release} and higher."),
        ),
        CommandError::CapabilityUnsupported {
            feature,
            required_release: None,
        } => (
            format!("{feature} are not available for this cluster"),
            format!("{feature} are not supported by your provider."),
        ),
        CommandError::AccessForbidden { cluster } => (
            "Access forbidden".to_string(),
            format!("You have no permission to access cluster '{cluster}'."),
        ),
        CommandError::ClusterNotFound { cluster } => (
            "Cluster not found".to_string(),
            format!("Cluster '{cluster}' does not exist or has already been deleted."),
        ),
    }
}

fn describe_resolve(e: &ResolveError) -> (String, String) {
    match e {
        ResolveError::NotFound {
            reference,
            suggestions,
        } => {
            let headline = format!("Cluster '{reference}' not found");
            if suggestions.is_empty() {
                (headline, "No cluster with this name or ID is visible to you.".to_string())
            } else {
                (headline, format!("Did you mean: {}?", suggestions.join(", ")))
            }
        }
        ResolveError::Ambiguous { name, ids } => (
            format!("Cluster name '{name}' is ambiguous"),
            format!(
                "The name matches {} clusters ({}). Please use the cluster ID instead.",
                ids.len(),
                ids.join(", ")
            ),
        ),
        ResolveError::Api(api) => describe_api(api),
    }
}

fn describe_api(e: &ApiError) -> (String, String) {
    if e.is_unauthorized() {
        return (
            "Not authorized".to_string(),
            format!(
                "{} Please check your credentials, or pass a token with --auth-token.",
                e.details()
            ),
        );
    }
    if e.is_access_forbidden() {
        return (
            "Access forbidden".to_string(),
            format!("{} You have no permission for this action.", e.details()),
        );
    }
    if e.is_server_error() {
        return (
            "Server error".to_string(),
            format!("{} Please try again later.", e.details()),
        );
    }
    (e.message().to_string(), e.details().to_string())
}

fn describe_config(e: &ConfigError) -> (String, String) {
    let path = config_path();
    match e {
        ConfigError::EndpointMissing => (
            "No API endpoint selected".to_string(),
            format!(
                "Please pass --endpoint, or set selectedEndpoint in {}.",
                path.display()
            ),
        ),
        ConfigError::UnknownEndpoint(name) => (
            format!("Unknown endpoint '{name}'"),
            format!(
                "Pass a URL, or one of the endpoint names defined in {}.",
                path.display()
            ),
        ),
        ConfigError::MissingCredential(var) => (
            "Credentials missing".to_string(),
            format!("The environment variable {var} must contain your token."),
        ),
    }
}
