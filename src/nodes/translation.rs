//! Location of a node's translation bundles.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use super::description::strip_base_namespace;

/// Whether `name` looks like a version directory (`v1`, `V2`, `v10`).
pub fn is_versioned_dirname(name: &str) -> bool {
    let mut chars = name.chars();
    let prefix_ok = matches!(chars.next(), Some('v' | 'V'));
    let digits = chars.as_str();
    prefix_ok
        && (1..=2).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Version directory directly inside `dir` with the highest version.
///
/// Versions compare numerically, so `v10` beats `v2`. The directory is
/// returned under its own name, so `v01` stays `v01`.
pub async fn latest_version_dir(dir: &Path) -> io::Result<Option<String>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut latest: Option<(u32, String)> = None;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_versioned_dirname(name) {
            continue;
        }
        if let Ok(version) = name[1..].parse::<u32>() {
            if latest.as_ref().is_none_or(|(max, _)| version > *max) {
                latest = Some((version, name.to_string()));
            }
        }
    }

    Ok(latest.map(|(_, name)| name))
}

/// Path of the translation file for `long_node_type` in `locale`.
///
/// The path is built next to the node's source file, inside the highest
/// version directory when there is one. A bare file name lives in `.`.
/// The file itself is not checked.
pub async fn node_translation_path(
    node_source_path: &Path,
    long_node_type: &str,
    locale: &str,
) -> io::Result<PathBuf> {
    let node_dir = match node_source_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = format!("{}.json", strip_base_namespace(long_node_type));

    let base = match latest_version_dir(node_dir).await? {
        Some(version_dir) => node_dir.join(version_dir),
        None => node_dir.to_path_buf(),
    };

    Ok(base.join("translations").join(locale).join(file_name))
}
