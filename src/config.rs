//! Configuration for kaasctl
//!
//! A single YAML file lists the API endpoints the user works with and a few
//! defaults. It is read from `$KAASCTL_CONFIG_PATH` or
//! `~/.config/kaasctl/config.yaml`; a missing file is the same as an empty one.
//!
//! ## Environment Variable Expansion
//!
//! The file supports environment variable expansion with the following syntax:
//! - `${VAR}` - Simple substitution
//! - `${VAR:-default}` - Use default if VAR is unset or empty
//! - `${VAR-default}` - Use default if VAR is unset
//! - `${VAR:+alt}` - Use alt if VAR is set and non-empty
//! - `${VAR+alt}` - Use alt if VAR is set

use crate::constants::{CONFIG_FILE, CONFIG_PATH_ENV, DEFAULT_TIMEOUT};
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{env, fs, path::PathBuf};
use thiserror::Error;

/// Contents of the configuration file
///
/// # Example
///
/// ```yaml
/// selectedEndpoint: production
/// timeoutSecs: 30
/// endpoints:
///   - name: production
///     url: https://api.${KAAS_DOMAIN:-example.com}
///     provider: aws
///     auth:
///       type: bearer
///       tokenEnv: KAAS_TOKEN
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct KaasConfig {
    /// Endpoint used when no `--endpoint` flag is given
    #[serde(default)]
    pub selected_endpoint: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

/// One control-plane API the user can talk to
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    /// Short alias, usable with `--endpoint`
    pub name: String,
    /// Base URL of the API
    pub url: String,
    /// Infrastructure provider, informational only
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Authentication for an endpoint
///
/// Credentials are always sourced from environment variables.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,
    /// Token sent as the raw `Authorization` header value
    Token {
        /// Environment variable containing the token
        token_env: String,
    },
    /// Bearer token authentication
    Bearer {
        /// Environment variable containing the bearer token
        token_env: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API endpoint selected")]
    EndpointMissing,
    #[error("unknown endpoint '{0}'")]
    UnknownEndpoint(String),
    #[error("environment variable '{0}' is not set")]
    MissingCredential(String),
}

impl AuthConfig {
    /// Build the `Authorization` header value, reading the secret from the
    /// environment
    pub fn authorization_header(&self) -> Result<Option<String>, ConfigError> {
        let read = |name: &str| {
            env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingCredential(name.to_string()))
        };
        match self {
            AuthConfig::None => Ok(None),
            AuthConfig::Token { token_env } => Ok(Some(read(token_env)?)),
            AuthConfig::Bearer { token_env } => Ok(Some(format!("Bearer {}", read(token_env)?))),
        }
    }
}

impl KaasConfig {
    /// Pick the endpoint to talk to
    ///
    /// Order: the `--endpoint` flag (a configured name, or any URL), then
    /// `selectedEndpoint`, then the only configured endpoint.
    pub fn choose_endpoint(&self, flag: Option<&str>) -> Result<EndpointConfig, ConfigError> {
        if let Some(reference) = flag.map(str::trim).filter(|r| !r.is_empty()) {
            if let Some(ep) = self.find_endpoint(reference) {
                return Ok(ep.clone());
            }
            if reference.contains("://") {
                return Ok(EndpointConfig {
                    name: reference.to_string(),
                    url: reference.to_string(),
                    ..Default::default()
                });
            }
            return Err(ConfigError::UnknownEndpoint(reference.to_string()));
        }

        if let Some(selected) = &self.selected_endpoint {
            return self
                .find_endpoint(selected)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownEndpoint(selected.clone()));
        }

        match self.endpoints.as_slice() {
            [only] => Ok(only.clone()),
            _ => Err(ConfigError::EndpointMissing),
        }
    }

    /// Find an endpoint by name, or by URL ignoring a trailing slash
    pub fn find_endpoint(&self, reference: &str) -> Option<&EndpointConfig> {
        let url = reference.trim_end_matches('/');
        self.endpoints
            .iter()
            .find(|ep| ep.name == reference)
            .or_else(|| {
                self.endpoints
                    .iter()
                    .find(|ep| ep.url.trim_end_matches('/') == url)
            })
    }

    /// Request timeout, with a flag value taking precedence
    pub fn timeout(&self, flag_secs: Option<u64>) -> Duration {
        flag_secs
            .or(self.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Location of the configuration file
pub fn config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push(CONFIG_FILE);
            p
        })
}

pub fn load_config() -> anyhow::Result<KaasConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> anyhow::Result<KaasConfig> {
    if !path.exists() {
        return Ok(KaasConfig::default());
    }
    let data = preprocess_config(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(KaasConfig::default());
    }
    let cfg: KaasConfig = serde_yaml::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

pub fn expand_env_placeholders(input: &str) -> anyhow::Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?[-+])([^}]*))?\}")?;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let op = caps.get(2).map_or("", |m| m.as_str());
        let val = caps.get(3).map_or("", |m| m.as_str());
        let var = env::var(var_name).ok();

        match (var.as_deref(), op) {
            (Some(v), "") => v.to_string(),                      // ${VAR}
            (Some(v), ":-") if !v.is_empty() => v.to_string(),   // ${VAR:-default}
            (_, ":-") => val.to_string(),
            (Some(v), "-") => v.to_string(),                     // ${VAR-default}
            (None, "-") => val.to_string(),
            (Some(v), ":+") if !v.is_empty() => val.to_string(), // ${VAR:+alt}
            (Some(_), "+") => val.to_string(),                   // ${VAR+alt}
            _ => String::new(),
        }
    });
    Ok(expanded.into_owned())
}

pub fn preprocess_config(path: &Path) -> anyhow::Result<String> {
    let raw_data = fs::read_to_string(path)?;
    expand_env_placeholders(&raw_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(name: &str, url: &str) -> EndpointConfig {
        EndpointConfig {
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn two_endpoints() -> KaasConfig {
        KaasConfig {
            endpoints: vec![
                endpoint("prod", "https://api.prod.example.com"),
                endpoint("dev", "https://api.dev.example.com/"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_expand_env_placeholders() {
        env::set_var("KAASCTL_TEST_SET", "value");
        env::set_var("KAASCTL_TEST_EMPTY", "");
        env::remove_var("KAASCTL_TEST_UNSET");

        let cases = [
            ("${KAASCTL_TEST_SET}", "value"),
            ("${KAASCTL_TEST_UNSET}", ""),
            ("${KAASCTL_TEST_SET:-d}", "value"),
            ("${KAASCTL_TEST_EMPTY:-d}", "d"),
            ("${KAASCTL_TEST_UNSET:-d}", "d"),
            ("${KAASCTL_TEST_EMPTY-d}", ""),
            ("${KAASCTL_TEST_UNSET-d}", "d"),
            ("${KAASCTL_TEST_SET:+alt}", "alt"),
            ("${KAASCTL_TEST_EMPTY:+alt}", ""),
            ("${KAASCTL_TEST_EMPTY+alt}", "alt"),
            ("${KAASCTL_TEST_UNSET+alt}", ""),
            ("url: https://${KAASCTL_TEST_SET}.example.com", "url: https://value.example.com"),
            ("no placeholders", "no placeholders"),
        ];
        for (input, expected) in cases {
            assert_eq!(expand_env_placeholders(input).unwrap(), expected, "input: {input}");
        }
    }

    #[test]
    fn test_flag_selects_by_name_or_url() {
        let cfg = two_endpoints();
        assert_eq!(cfg.choose_endpoint(Some("dev")).unwrap().name, "dev");
        assert_eq!(
            cfg.choose_endpoint(Some("https://api.dev.example.com")).unwrap().name,
            "dev"
        );

        let adhoc = cfg.choose_endpoint(Some("https://other.example.com")).unwrap();
        assert_eq!(adhoc.url, "https://other.example.com");
        assert!(matches!(adhoc.auth, AuthConfig::None));
    }

    #[test]
    fn test_unknown_endpoint_name() {
        let cfg = two_endpoints();
        let err = cfg.choose_endpoint(Some("staging")).unwrap_err();
        assert_eq!(err.to_string(), "unknown endpoint 'staging'");
    }

    #[test]
    fn test_selected_endpoint_is_default() {
        let mut cfg = two_endpoints();
        assert!(matches!(
            cfg.choose_endpoint(None),
            Err(ConfigError::EndpointMissing)
        ));

        cfg.selected_endpoint = Some("prod".to_string());
        assert_eq!(cfg.choose_endpoint(None).unwrap().name, "prod");
        assert_eq!(cfg.choose_endpoint(Some("dev")).unwrap().name, "dev");
    }

    #[test]
    fn test_single_endpoint_is_implicit() {
        let cfg = KaasConfig {
            endpoints: vec![endpoint("only", "https://api.example.com")],
            ..Default::default()
        };
        assert_eq!(cfg.choose_endpoint(None).unwrap().name, "only");
        assert!(matches!(
            KaasConfig::default().choose_endpoint(None),
            Err(ConfigError::EndpointMissing)
        ));
    }

    #[test]
    fn test_timeout_precedence() {
        let mut cfg = KaasConfig::default();
        assert_eq!(cfg.timeout(None), DEFAULT_TIMEOUT);
        cfg.timeout_secs = Some(30);
        assert_eq!(cfg.timeout(None), Duration::from_secs(30));
        assert_eq!(cfg.timeout(Some(5)), Duration::from_secs(5));
    }

    #[test]
    fn test_authorization_header() {
        env::set_var("KAASCTL_TEST_TOKEN", "s3cret");
        env::remove_var("KAASCTL_TEST_NO_TOKEN");

        assert_eq!(AuthConfig::None.authorization_header().unwrap(), None);
        let bearer = AuthConfig::Bearer {
            token_env: "KAASCTL_TEST_TOKEN".to_string(),
        };
        assert_eq!(
            bearer.authorization_header().unwrap().as_deref(),
            Some("Bearer s3cret")
        );
        let token = AuthConfig::Token {
            token_env: "KAASCTL_TEST_TOKEN".to_string(),
        };
        assert_eq!(token.authorization_header().unwrap().as_deref(), Some("s3cret"));

        let missing = AuthConfig::Bearer {
            token_env: "KAASCTL_TEST_NO_TOKEN".to_string(),
        };
        assert!(matches!(
            missing.authorization_header(),
            Err(ConfigError::MissingCredential(name)) if name == "KAASCTL_TEST_NO_TOKEN"
        ));
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let cfg = load_config_from(Path::new("/nonexistent/kaasctl/config.yaml")).unwrap();
        assert!(cfg.endpoints.is_empty());
        assert!(cfg.selected_endpoint.is_none());
    }
}
