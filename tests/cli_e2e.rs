mod support;

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::prelude::*;
use serde_json::json;

fn leafkit(project: &std::path::Path, server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("leafkit").unwrap();
    cmd.current_dir(project)
        .env("LEAFKIT_REGISTRY_URL", server.base_url())
        .env_remove("LEAFKIT_TOKEN");
    cmd
}

#[test]
fn pull_installs_a_component_into_the_configured_path() {
    let server = MockServer::start();
    support::mount_registry(
        &server,
        support::button_manifest(),
        support::flows_manifest(json!([])),
        support::button_tarball(),
    );
    let project = tempfile::tempdir().unwrap();
    support::write_project_config(project.path());

    leafkit(project.path(), &server)
        .args(["pull", "button", "--type", "component", "-y"])
        .assert()
        .success();
    assert!(
        project
            .path()
            .join("components/ui/button/Button.tsx")
            .exists()
    );
    assert!(project.path().join("components/ui/button/index.ts").exists());
}

#[test]
fn pull_unknown_item_exits_4_with_a_json_error_body() {
    let server = MockServer::start();
    support::mount_registry(
        &server,
        support::button_manifest(),
        support::flows_manifest(json!([])),
        support::button_tarball(),
    );
    let project = tempfile::tempdir().unwrap();
    support::write_project_config(project.path());

    leafkit(project.path(), &server)
        .args(["pull", "nonexistent-item", "-y", "--json"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("\"success\":false"))
        .stdout(predicate::str::contains("COMPONENT_NOT_FOUND"));
}

#[test]
fn init_twice_without_overwrite_exits_3() {
    let server = MockServer::start();
    let project = tempfile::tempdir().unwrap();

    leafkit(project.path(), &server)
        .args(["init", "-y"])
        .assert()
        .success();
    assert!(project.path().join("leafkit.toml").exists());

    leafkit(project.path(), &server)
        .args(["init", "-y"])
        .assert()
        .code(3);

    leafkit(project.path(), &server)
        .args(["init", "-y", "--overwrite"])
        .assert()
        .success();
}

#[test]
fn pull_without_a_config_exits_2() {
    let server = MockServer::start();
    let project = tempfile::tempdir().unwrap();

    leafkit(project.path(), &server)
        .args(["pull", "button", "-y"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("leafkit init"));
}

#[test]
fn invalid_item_name_exits_6_before_any_network_call() {
    // No mocks mounted: a request would fail loudly with a connection error
    // rather than exit code 6.
    let server = MockServer::start();
    let project = tempfile::tempdir().unwrap();
    support::write_project_config(project.path());

    leafkit(project.path(), &server)
        .args(["pull", "../escape", "-y"])
        .assert()
        .code(6);
}

#[test]
fn dry_run_reports_paths_and_writes_nothing() {
    let server = MockServer::start();
    support::mount_registry(
        &server,
        support::button_manifest(),
        support::flows_manifest(json!([])),
        support::button_tarball(),
    );
    let project = tempfile::tempdir().unwrap();
    support::write_project_config(project.path());

    leafkit(project.path(), &server)
        .args(["pull", "button", "-y", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would write button/Button.tsx"));
    assert!(!project.path().join("components/ui").exists());
}

#[test]
fn list_mode_emits_the_available_components_as_json() {
    let server = MockServer::start();
    support::mount_registry(
        &server,
        support::button_manifest(),
        support::flows_manifest(json!([])),
        support::button_tarball(),
    );
    let project = tempfile::tempdir().unwrap();
    support::write_project_config(project.path());

    let assert = leafkit(project.path(), &server)
        .args(["pull", "--list", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let body: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["components"][0]["name"], json!("button"));
}

#[test]
fn flow_pull_installs_the_selected_variant() {
    let server = MockServer::start();
    let tarball = support::tarball(&[
        ("package/src/auth/(classic)/sign-in.tsx", "export {}"),
        ("package/src/auth/(classic)/sign-up.tsx", "export {}"),
    ]);
    support::mount_registry(
        &server,
        support::button_manifest(),
        support::flows_manifest(json!([{
            "type": "auth",
            "variant": "classic",
            "componentName": "Auth (classic)",
            "entryPoint": "sign-in.tsx",
        }])),
        tarball,
    );
    let project = tempfile::tempdir().unwrap();
    support::write_project_config(project.path());

    leafkit(project.path(), &server)
        .args(["pull", "auth/classic", "--type", "flow", "-y"])
        .assert()
        .success();
    assert!(
        project
            .path()
            .join("flows/auth/(classic)/sign-in.tsx")
            .exists()
    );
}

#[test]
fn generate_scaffolds_a_component_from_the_template() {
    let server = MockServer::start();
    let project = tempfile::tempdir().unwrap();
    support::write_project_config(project.path());

    leafkit(project.path(), &server)
        .args(["generate", "component", "--name", "radio-group"])
        .assert()
        .success();
    let rendered = std::fs::read_to_string(
        project
            .path()
            .join("components/ui/radio-group/RadioGroup.tsx"),
    )
    .unwrap();
    assert!(rendered.contains("RadioGroup"));
    assert!(!rendered.contains("{{pascal}}"));
}
