use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

use crate::registry::RegistryClient;

/// Extensions the registry is expected to ship. Anything else inside an
/// item's namespace is a stray file and is not installed.
const ALLOWED_EXTENSIONS: &[&str] = &["tsx", "ts", "css", "json"];
/// Namespace-relative entries that never install, regardless of extension.
const SKIPPED_DIRS: &[&str] = &["examples"];
const SKIPPED_FILES: &[&str] = &["meta.json", "README.md"];

/// What to install: a component by name, or a flow by `(type, variant)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallItem {
    Component { name: String },
    Flow { flow_type: String, variant: String },
}

impl InstallItem {
    /// The label an item goes by in output and in the destination tree:
    /// the component name, or the flow type.
    pub fn label(&self) -> &str {
        match self {
            InstallItem::Component { name } => name,
            InstallItem::Flow { flow_type, .. } => flow_type,
        }
    }

    /// Path prefix of this item's namespace inside the package, relative to
    /// the stripped package root.
    fn namespace(&self) -> PathBuf {
        match self {
            InstallItem::Component { name } => Path::new("src").join(name),
            InstallItem::Flow { flow_type, variant } => {
                Path::new("src").join(flow_type).join(format!("({variant})"))
            }
        }
    }

    /// Root of the staged extraction that gets moved into the project. For
    /// flows this is the flow type directory, so the `(variant)` route group
    /// lands inside it.
    fn staged_root(&self, staging: &Path) -> PathBuf {
        match self {
            InstallItem::Component { name } => staging.join("src").join(name),
            InstallItem::Flow { flow_type, .. } => staging.join("src").join(flow_type),
        }
    }
}

impl std::fmt::Display for InstallItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallItem::Component { name } => write!(f, "{name}"),
            InstallItem::Flow { flow_type, variant } => write!(f, "{flow_type}/{variant}"),
        }
    }
}

#[derive(Debug)]
pub enum InstallOutcome {
    /// Dry run: the namespace-relative paths that would have been written,
    /// each prefixed with the item label. The destination was not touched.
    DryRun(Vec<String>),
    Installed {
        dest: PathBuf,
        files: usize,
    },
}

/// Install one item from the registry package into `dest_base`.
///
/// The pipeline stages the filtered extraction in a fresh uniquely named
/// temp directory, then either enumerates it (dry run) or commits it into
/// place. The staging directory is removed on every exit path, success or
/// failure, by `TempDir`'s drop guard.
pub fn install_item(
    client: &RegistryClient,
    package: &str,
    item: &InstallItem,
    dest_base: &Path,
    with_tests: bool,
    dry_run: bool,
) -> Result<InstallOutcome> {
    let staging = tempfile::Builder::new()
        .prefix("leafkit-stage-")
        .tempdir()
        .context("failed to create staging directory")?;

    let namespace = item.namespace();
    let written = client.download_and_extract(package, staging.path(), |path, is_dir| {
        selects_entry(&namespace, path, is_dir, with_tests)
    })?;
    if written == 0 {
        bail!("registry package did not contain any files for `{item}`");
    }

    let staged_root = item.staged_root(staging.path());
    if dry_run {
        return Ok(InstallOutcome::DryRun(dry_run_listing(
            &staged_root,
            item.label(),
        )?));
    }

    fs::create_dir_all(dest_base)
        .with_context(|| format!("failed to create {}", dest_base.display()))?;
    let dest = dest_base.join(item.label());
    let files = commit(&staged_root, &dest)?;
    Ok(InstallOutcome::Installed { dest, files })
}

/// File-selection rule for a package entry, given the item namespace. The
/// path is package-relative with the wrapper already stripped.
pub fn selects_entry(namespace: &Path, path: &Path, is_dir: bool, with_tests: bool) -> bool {
    // Directories above the namespace root must still be created so the
    // namespace can be extracted under them.
    if is_dir && namespace.starts_with(path) {
        return true;
    }
    let Ok(rel) = path.strip_prefix(namespace) else {
        return false;
    };
    selects_in_namespace(rel, is_dir, with_tests)
}

fn selects_in_namespace(rel: &Path, is_dir: bool, with_tests: bool) -> bool {
    let components: Vec<&str> = rel
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if components.is_empty() {
        // The namespace root itself.
        return true;
    }

    if is_test_path(&components) {
        return with_tests;
    }
    if components
        .iter()
        .take(components.len() - 1)
        .any(|dir| SKIPPED_DIRS.contains(dir))
    {
        return false;
    }
    let file_name = components[components.len() - 1];
    if is_dir {
        return !SKIPPED_DIRS.contains(&file_name);
    }
    if SKIPPED_FILES.contains(&file_name) {
        return false;
    }
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext),
        None => false,
    }
}

fn is_test_path(components: &[&str]) -> bool {
    components.iter().any(|c| *c == "__tests__")
        || components
            .last()
            .is_some_and(|name| name.contains(".test.") || name.contains(".spec."))
}

/// Recursively enumerate a staged extraction, returning sorted
/// label-prefixed relative paths.
pub fn dry_run_listing(staged_root: &Path, label: &str) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(staged_root) {
        let entry = entry.context("failed to walk staged files")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(staged_root)
            .context("staged file escaped the staging root")?;
        paths.push(format!("{label}/{}", rel.display()));
    }
    paths.sort();
    Ok(paths)
}

/// Commit a staged tree into place.
///
/// The staged tree is first copied to a uniquely named sibling of the
/// destination, so the final step is a rename on the same filesystem. Any
/// previous install is moved aside rather than deleted up front and only
/// removed once the replacement is in place; if that final rename fails the
/// previous install is restored.
pub fn commit(staged_root: &Path, dest: &Path) -> Result<usize> {
    let parent = dest
        .parent()
        .context("destination path has no parent directory")?;
    let label = dest
        .file_name()
        .and_then(|n| n.to_str())
        .context("destination path has no final segment")?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let pending = parent.join(format!(".{label}.new-{nanos}"));
    let files = copy_tree(staged_root, &pending)?;

    let backup = if dest.exists() {
        let backup = parent.join(format!(".{label}.old-{nanos}"));
        fs::rename(dest, &backup)
            .with_context(|| format!("failed to move previous install aside at {}", dest.display()))?;
        Some(backup)
    } else {
        None
    };

    if let Err(err) = fs::rename(&pending, dest) {
        // Put the previous install back before reporting the failure.
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, dest);
        }
        let _ = fs::remove_dir_all(&pending);
        return Err(err)
            .with_context(|| format!("failed to move new install into {}", dest.display()));
    }

    if let Some(backup) = backup {
        if let Err(err) = fs::remove_dir_all(&backup) {
            tracing::warn!(
                backup = %backup.display(),
                error = %err,
                "failed to remove replaced install; leaving it behind"
            );
        }
    }
    Ok(files)
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut files = 0usize;
    for entry in WalkDir::new(from) {
        let entry = entry.with_context(|| format!("failed to walk {}", from.display()))?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .context("walked entry escaped its root")?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::copy(entry.path(), &target)
                .with_context(|| format!("failed to copy {}", target.display()))?;
            files += 1;
        }
    }
    Ok(files)
}
