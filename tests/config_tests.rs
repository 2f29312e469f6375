use kaasctl::config::{self, AuthConfig};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_config_with_env_expansion() {
    std::env::set_var("KAASCTL_IT_DOMAIN", "example.org");
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");

    let contents = r#"# endpoints
selectedEndpoint: prod
timeoutSecs: 15
endpoints:
  - name: prod
    url: https://api.${KAASCTL_IT_DOMAIN}
    provider: aws
    auth:
      type: bearer
      tokenEnv: KAASCTL_IT_TOKEN
  - name: dev
    url: https://api.${KAASCTL_IT_DEV_DOMAIN:-dev.example.org}
"#;
    fs::write(&config_path, contents).unwrap();

    let cfg = config::load_config_from(&config_path).unwrap();
    assert_eq!(cfg.endpoints.len(), 2);
    assert_eq!(cfg.timeout(None), Duration::from_secs(15));

    let prod = cfg.choose_endpoint(None).unwrap();
    assert_eq!(prod.url, "https://api.example.org");
    assert_eq!(prod.provider.as_deref(), Some("aws"));
    assert!(matches!(
        prod.auth,
        AuthConfig::Bearer { ref token_env } if token_env == "KAASCTL_IT_TOKEN"
    ));

    let dev = cfg.choose_endpoint(Some("dev")).unwrap();
    assert_eq!(dev.url, "https://api.dev.example.org");
    assert!(matches!(dev.auth, AuthConfig::None));
}

#[test]
fn test_empty_file_is_empty_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "").unwrap();

    let cfg = config::load_config_from(&config_path).unwrap();
    assert!(cfg.endpoints.is_empty());
}

#[test]
fn test_invalid_yaml_names_the_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "endpoints: {not: [a list").unwrap();

    let err = config::load_config_from(&config_path).unwrap_err();
    assert!(err.to_string().contains("config.yaml"));
}
