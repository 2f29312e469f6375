use crate::client::{ApiClient, ClientConfig};
use crate::{config, GlobalArgs};
use anyhow::Result;
use clap::Subcommand;
use tracing::debug;

pub mod completions;
pub mod delete;
pub mod errors;
pub mod ping;
pub mod show;
pub mod update;

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Check whether the API endpoint answers and how fast")]
    Ping,
    #[command(about = "Show details of a resource")]
    Show {
        #[command(subcommand)]
        cmd: show::ShowCommands,
    },
    #[command(about = "Change properties of a resource")]
    Update {
        #[command(subcommand)]
        cmd: update::UpdateCommands,
    },
    #[command(about = "Delete a resource")]
    Delete {
        #[command(subcommand)]
        cmd: delete::DeleteCommands,
    },
    #[command(about = "Emit shell completion scripts (bash/zsh/fish)")]
    Completions { shell: String },
}

pub async fn run(cmd: Commands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        Commands::Ping => ping::run(global).await,
        Commands::Show { cmd } => show::run(cmd, global).await,
        Commands::Update { cmd } => update::run(cmd, global).await,
        Commands::Delete { cmd } => delete::run(cmd, global).await,
        Commands::Completions { shell } => completions::run(shell),
    }
}

/// Build an API client for the selected endpoint
///
/// `--auth-token` wins over the endpoint's configured credentials.
pub(crate) fn connect(global: &GlobalArgs, activity: &str) -> Result<ApiClient> {
    let cfg = config::load_config()?;
    let endpoint = cfg.choose_endpoint(global.endpoint.as_deref())?;
    let authorization = match &global.auth_token {
        Some(token) => Some(format!("Bearer {token}")),
        None => endpoint.auth.authorization_header()?,
    };
    debug!(endpoint = %endpoint.url, activity, "connecting");

    let mut client_cfg = ClientConfig::new(endpoint.url);
    client_cfg.timeout = cfg.timeout(global.timeout);
    client_cfg.authorization = authorization;
    client_cfg.activity_name = Some(activity.to_string());
    ApiClient::new(&client_cfg)
}
