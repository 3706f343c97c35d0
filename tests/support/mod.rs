#![allow(dead_code)]

use base64::Engine;
use flate2::Compression;
use flate2::write::GzEncoder;
use httpmock::MockServer;
use serde_json::json;
use sha2::{Digest, Sha512};

/// Build a gzipped npm-style tarball in memory.
pub fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn sha512_integrity(data: &[u8]) -> String {
    format!(
        "sha512-{}",
        base64::engine::general_purpose::STANDARD.encode(Sha512::digest(data))
    )
}

pub fn components_manifest(components: serde_json::Value) -> serde_json::Value {
    json!({
        "version": 1,
        "generatedAt": "2026-08-01T00:00:00Z",
        "components": components,
    })
}

pub fn flows_manifest(flows: serde_json::Value) -> serde_json::Value {
    json!({
        "version": 1,
        "generatedAt": "2026-08-01T00:00:00Z",
        "flows": flows,
    })
}

pub fn button_manifest() -> serde_json::Value {
    components_manifest(json!([{
        "type": "expo",
        "lib": "nativewind",
        "name": "button",
        "componentName": "Button",
    }]))
}

pub fn button_tarball() -> Vec<u8> {
    tarball(&[
        ("package/package.json", "{\"name\":\"@leafkit/registry\"}"),
        ("package/src/button/Button.tsx", "export const Button = 1;"),
        ("package/src/button/index.ts", "export * from './Button';"),
        ("package/src/button/Button.test.tsx", "test('noop', () => {});"),
        ("package/src/button/meta.json", "{}"),
        ("package/src/button/examples/Demo.tsx", "demo"),
        ("package/src/card/Card.tsx", "export const Card = 1;"),
    ])
}

/// Mount a full registry on a mock server: components manifest, flows
/// manifest, npm latest metadata, and the package tarball (with a valid
/// sha512 integrity digest).
pub fn mount_registry(
    server: &MockServer,
    components: serde_json::Value,
    flows: serde_json::Value,
    tarball_bytes: Vec<u8>,
) {
    let integrity = sha512_integrity(&tarball_bytes);
    let tarball_url = format!("{}/tarballs/registry-0.3.0.tgz", server.base_url());
    server.mock(|when, then| {
        when.method("GET").path("/components.json");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(components.clone());
    });
    server.mock(|when, then| {
        when.method("GET").path("/flows.json");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(flows.clone());
    });
    server.mock(|when, then| {
        when.method("GET").path("/npm/@leafkit/registry/latest");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "version": "0.3.0",
                "dist": {
                    "tarball": tarball_url,
                    "integrity": integrity,
                }
            }));
    });
    server.mock(|when, then| {
        when.method("GET").path("/tarballs/registry-0.3.0.tgz");
        then.status(200)
            .header("content-type", "application/octet-stream")
            .body(tarball_bytes.clone());
    });
}

pub fn write_project_config(root: &std::path::Path) {
    std::fs::write(
        root.join("leafkit.toml"),
        "project = \"expo\"\nlib = \"nativewind\"\n\n[paths]\nui = \"components/ui\"\nflows = \"flows\"\n",
    )
    .unwrap();
}
