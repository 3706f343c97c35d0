use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine;
use flate2::read::GzDecoder;
use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha512};

use crate::config::{ProjectType, StyleLib};
use crate::error::CliError;

/// Default base URL for the hosted registry manifests.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.leafkit.dev";
/// npm package that ships every component and flow source tree.
pub const REGISTRY_PACKAGE: &str = "@leafkit/registry";

const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One installable component as listed by the remote registry. The schema is
/// strict: an unknown or malformed field fails the whole fetch, never a
/// partial acceptance.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ComponentMeta {
    #[serde(rename = "type")]
    pub project: ProjectType,
    pub lib: StyleLib,
    pub name: String,
    pub component_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// One installable multi-screen flow, keyed by `(type, variant)`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FlowMeta {
    #[serde(rename = "type")]
    pub flow_type: String,
    pub variant: String,
    pub component_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub entry_point: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ComponentRegistryDoc {
    #[allow(dead_code)]
    version: u32,
    #[allow(dead_code)]
    generated_at: String,
    components: Vec<ComponentMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct FlowRegistryDoc {
    #[allow(dead_code)]
    version: u32,
    #[allow(dead_code)]
    generated_at: String,
    flows: Vec<FlowMeta>,
}

/// Latest-version metadata from the package registry. The npm document
/// carries far more fields than we need, so this one is deliberately loose.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    pub version: String,
    pub dist: DistInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistInfo {
    pub tarball: String,
    #[serde(default)]
    pub integrity: Option<String>,
}

pub struct RegistryClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl RegistryClient {
    /// Build a client for the given manifest base URL. The bearer token, if
    /// any, comes from `LEAFKIT_TOKEN`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_token(base_url, std::env::var("LEAFKIT_TOKEN").ok())
    }

    pub fn with_token(base_url: &str, token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            http,
        })
    }

    pub fn fetch_components(&self) -> Result<Vec<ComponentMeta>> {
        let doc: ComponentRegistryDoc = self.fetch_manifest("components.json")?;
        Ok(doc.components)
    }

    pub fn fetch_flows(&self) -> Result<Vec<FlowMeta>> {
        let doc: FlowRegistryDoc = self.fetch_manifest("flows.json")?;
        Ok(doc.flows)
    }

    fn fetch_manifest<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let url = format!("{}/{file}", self.base_url);
        let response = self.get(&url, file)?;
        let body = response
            .text()
            .with_context(|| format!("failed to read {file} response body"))?;
        if body.trim().is_empty() {
            bail!("registry returned an empty body for {file}");
        }
        serde_json::from_str(&body).with_context(|| format!("malformed registry manifest {file}"))
    }

    /// Look up the latest published version of `package` and the tarball
    /// backing it.
    pub fn fetch_package_metadata(&self, package: &str) -> Result<PackageMetadata> {
        let url = self.package_metadata_url(package);
        let response = self.get(&url, package)?;
        let body = response
            .text()
            .with_context(|| format!("failed to read metadata body for {package}"))?;
        if body.trim().is_empty() {
            bail!("package registry returned an empty body for {package}");
        }
        serde_json::from_str(&body)
            .with_context(|| format!("malformed package metadata for {package}"))
    }

    fn package_metadata_url(&self, package: &str) -> String {
        // A custom base URL serves its own npm-compatible metadata endpoint;
        // the hosted default goes straight to the public npm registry.
        if self.base_url == DEFAULT_REGISTRY_URL {
            format!("{NPM_REGISTRY_URL}/{package}/latest")
        } else {
            format!("{}/npm/{package}/latest", self.base_url)
        }
    }

    /// Download the package tarball to a temp file, verify its integrity
    /// digest when the registry published one, then extract the entries the
    /// filter accepts into `dest`. The filter sees package-relative paths
    /// with the top-level wrapper directory already stripped; rejecting an
    /// entry skips file writes and directory creation alike. Returns the
    /// number of files written.
    pub fn download_and_extract<F>(&self, package: &str, dest: &Path, filter: F) -> Result<usize>
    where
        F: Fn(&Path, bool) -> bool,
    {
        let metadata = self.fetch_package_metadata(package)?;
        let mut response = self.get(&metadata.dist.tarball, package)?;

        let mut tmp = tempfile::NamedTempFile::new()
            .context("failed to create temp file for package download")?;
        let copied = std::io::copy(&mut response, tmp.as_file_mut())
            .with_context(|| format!("failed to stream tarball for {package}"))?;
        if copied == 0 {
            bail!("package registry returned an empty tarball for {package}");
        }

        if let Some(integrity) = &metadata.dist.integrity {
            tmp.as_file_mut()
                .seek(SeekFrom::Start(0))
                .context("failed to rewind downloaded tarball")?;
            verify_integrity(tmp.as_file_mut(), integrity)
                .with_context(|| format!("integrity check failed for {package}"))?;
        }

        tmp.as_file_mut()
            .seek(SeekFrom::Start(0))
            .context("failed to rewind downloaded tarball")?;
        extract_filtered(tmp.as_file_mut(), dest, filter)
    }

    fn get(&self, url: &str, what: &str) -> Result<Response> {
        let mut builder = self.http.get(url);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = builder
            .send()
            .with_context(|| format!("request for {what} failed"))?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CliError::AuthRequired {
                status: status.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            bail!("failed to fetch {what}: {status}");
        }
        Ok(response)
    }
}

/// Check an npm subresource-integrity string (`sha512-<base64>`) against the
/// given reader. Other algorithms are skipped; npm has published sha512
/// integrity for every release in the last several years.
fn verify_integrity<R: Read>(reader: &mut R, integrity: &str) -> Result<()> {
    let Some(expected) = integrity.strip_prefix("sha512-") else {
        tracing::debug!(integrity, "skipping unsupported integrity algorithm");
        return Ok(());
    };
    let mut hasher = Sha512::new();
    std::io::copy(reader, &mut hasher).context("failed to hash downloaded tarball")?;
    let actual = base64::engine::general_purpose::STANDARD.encode(hasher.finalize());
    if actual != expected {
        bail!("digest mismatch: expected sha512-{expected}, got sha512-{actual}");
    }
    Ok(())
}

/// Extract a gzipped tarball, applying `filter` entry by entry. Paths are
/// normalized by dropping the single top-level wrapper directory (`package/`
/// in npm tarballs) before the filter sees them.
pub fn extract_filtered<R, F>(reader: R, dest: &Path, filter: F) -> Result<usize>
where
    R: Read,
    F: Fn(&Path, bool) -> bool,
{
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut written = 0usize;
    for entry in archive.entries().context("failed to read package archive")? {
        let mut entry = entry.context("failed to read package archive entry")?;
        let raw_path = entry
            .path()
            .context("package entry had an invalid path")?
            .into_owned();
        let Some(stripped) = strip_wrapper_dir(&raw_path)? else {
            continue;
        };

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            if filter(&stripped, true) {
                fs::create_dir_all(dest.join(&stripped))
                    .with_context(|| format!("failed to create {}", stripped.display()))?;
            }
            continue;
        }
        if !entry_type.is_file() {
            tracing::debug!(path = %stripped.display(), "skipping non-regular package entry");
            continue;
        }
        if !filter(&stripped, false) {
            continue;
        }

        let out_path = dest.join(&stripped);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        entry
            .unpack(&out_path)
            .with_context(|| format!("failed to extract {}", stripped.display()))?;
        written += 1;
    }
    Ok(written)
}

/// Drop the leading wrapper segment and refuse anything that could escape
/// the destination. Returns `None` for the wrapper directory itself.
fn strip_wrapper_dir(raw: &Path) -> Result<Option<PathBuf>> {
    let mut components = raw.components();
    match components.next() {
        Some(Component::Normal(_)) => {}
        Some(_) => bail!("package contained a suspicious path; aborting extract"),
        None => return Ok(None),
    }
    let mut stripped = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => stripped.push(part),
            Component::CurDir => {}
            _ => bail!("package contained a suspicious path; aborting extract"),
        }
    }
    if stripped.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(stripped))
    }
}
