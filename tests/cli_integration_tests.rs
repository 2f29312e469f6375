use serde_json::json;
use std::collections::HashSet;
use std::process::Command;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_cli_help_command() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kaasctl"));
    assert!(stdout.contains("--endpoint"));
}

#[test]
fn test_cli_without_endpoint_fails_with_headline() {
    let temp_dir = TempDir::new().unwrap();

    let output = Command::new("cargo")
        .args(["run", "--quiet", "--", "ping"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("KAASCTL_CONFIG_PATH", temp_dir.path().join("missing.yaml"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No API endpoint selected"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_show_cluster_uses_a_request_id_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/clusters/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a1b2c", "name": "production"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/clusters/a1b2c/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1b2c",
            "name": "production",
            "release_version": "6.4.0"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/info/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"general": {"provider": "aws"}})),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("missing.yaml");
    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        Command::new("cargo")
            .args(["run", "--quiet", "--", "--endpoint", uri.as_str()])
            .args(["show", "cluster", "production"])
            .current_dir(env!("CARGO_MANIFEST_DIR"))
            .env("KAASCTL_CONFIG_PATH", config_path)
            .output()
    })
    .await
    .unwrap()
    .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Autoscaling, AvailabilityZones"));

    let requests = server.received_requests().await.unwrap();
    let request_ids: HashSet<String> = requests
        .iter()
        .filter_map(|r| r.headers.get("X-Request-ID"))
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(requests.len(), 3);
    assert_eq!(request_ids.len(), 3);
}
