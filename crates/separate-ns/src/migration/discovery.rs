//! Which applications a cluster synchronises

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::fs::FileSystem;
use crate::manifest::{classify_application, ManifestClass};
use crate::paths::Layout;
use crate::{Result, ResultExt};

/// Names of the ArgoCD applications registered for `cluster`.
///
/// Directories and files that are not ArgoCD applications are skipped.
pub fn applications_in_cluster(
    fs: &dyn FileSystem,
    layout: &Layout,
    cluster: &str,
) -> Result<BTreeSet<String>> {
    let dir = layout.argocd_applications_dir(cluster);
    let entries = fs
        .read_dir(&dir)
        .with_context(|| format!("listing {}", dir.display()))?;

    let mut apps = BTreeSet::new();
    for entry in entries {
        if entry.is_dir {
            continue;
        }

        let path = dir.join(&entry.name);
        let raw = fs
            .read(&path)
            .with_context(|| format!("reading {}", path.display()))?;

        match classify_application(&raw) {
            ManifestClass::Application => {
                apps.insert(file_stem(&entry.name));
            }
            ManifestClass::NotAnApplication => {
                debug!(file = %path.display(), "not an ArgoCD application, skipping");
            }
        }
    }

    Ok(apps)
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}
