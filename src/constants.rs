use std::time::Duration;

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "KAASCTL_CONFIG_PATH";

/// Configuration file path relative to the user's config directory
pub const CONFIG_FILE: &str = "kaasctl/config.yaml";

/// Request deadline used when neither flag nor config sets one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for the `ping` command, independent of the configured timeout
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

pub const USER_AGENT: &str = concat!("kaasctl/", env!("CARGO_PKG_VERSION"));

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
pub const ACTIVITY_NAME_HEADER: &str = "X-Activity-Name";
pub const COMMAND_LINE_HEADER: &str = "X-CmdLine";
