//! Deciding when an application-owned namespace can go, and removing it
//!
//! The legacy manifest is shared by every cluster with an overlay for the
//! application. It may only be deleted once each of those clusters owns its
//! own copy, otherwise a cluster that has not been upgraded yet would lose
//! its namespace on the next sync.

use tracing::debug;

use crate::fs::FileSystem;
use crate::kustomization::{lists_namespace, plan_removal, remove_namespace_entry};
use crate::manifest::namespace_name;
use crate::paths::{Layout, NAMESPACE_FILENAME};
use crate::{Result, ResultExt};

/// Whether `cluster` depends on `app`, i.e. has an overlay for it
pub fn is_associated(fs: &dyn FileSystem, layout: &Layout, cluster: &str, app: &str) -> Result<bool> {
    let overlay = layout.overlay_dir(app, cluster);
    fs.is_dir(&overlay)
        .with_context(|| format!("checking {}", overlay.display()))
}

/// Every cluster with an overlay directory for `app`.
///
/// An application without an `overlays/` directory has no dependents.
pub fn dependent_clusters(fs: &dyn FileSystem, layout: &Layout, app: &str) -> Result<Vec<String>> {
    let overlays = layout.overlays_dir(app);
    let present = fs
        .is_dir(&overlays)
        .with_context(|| format!("checking {}", overlays.display()))?;
    if !present {
        return Ok(Vec::new());
    }

    let mut clusters: Vec<String> = fs
        .read_dir(&overlays)
        .with_context(|| format!("listing {}", overlays.display()))?
        .into_iter()
        .filter(|entry| entry.is_dir)
        .map(|entry| entry.name)
        .collect();
    clusters.sort();

    Ok(clusters)
}

/// Whether `cluster` already owns a manifest for `namespace`
pub fn cluster_has_namespace(
    fs: &dyn FileSystem,
    layout: &Layout,
    cluster: &str,
    namespace: &str,
) -> Result<bool> {
    let path = layout.cluster_namespace_manifest(cluster, namespace);
    fs.exists(&path)
        .with_context(|| format!("checking {}", path.display()))
}

/// Whether `app`'s legacy namespace manifest is redundant.
///
/// True only if every dependent cluster has its own copy of the namespace.
/// The legacy manifest must exist; callers skip applications that have
/// already been cleaned.
pub fn is_cleanable(fs: &dyn FileSystem, layout: &Layout, app: &str) -> Result<bool> {
    let namespace = namespace_name(fs, &layout.legacy_namespace_manifest(app))
        .context("acquiring namespace name")?;

    let clusters = dependent_clusters(fs, layout, app).context("acquiring dependent clusters")?;

    for cluster in &clusters {
        if !cluster_has_namespace(fs, layout, cluster, &namespace)? {
            debug!(app, cluster = %cluster, namespace = %namespace, "cluster not migrated yet");
            return Ok(false);
        }
    }

    Ok(true)
}

/// Delete `app`'s legacy namespace manifest and its kustomization entry.
///
/// The kustomization edit is computed before anything is removed, so an
/// unreadable or unparseable kustomization leaves both in place.
pub fn remove_legacy_namespace(fs: &dyn FileSystem, layout: &Layout, app: &str) -> Result<()> {
    let kustomization = layout.base_kustomization(app);
    let updated = plan_removal(fs, &kustomization, NAMESPACE_FILENAME)
        .context("deleting namespace entry from kustomization")?;

    let manifest = layout.legacy_namespace_manifest(app);
    fs.remove_file(&manifest)
        .with_context(|| format!("removing {}", manifest.display()))?;

    if let Some(updated) = updated {
        fs.write(&kustomization, updated.as_bytes())
            .with_context(|| format!("writing {}", kustomization.display()))?;
    }

    Ok(())
}

/// Drop a `namespace.yaml` entry left behind after the manifest itself is gone.
///
/// A run interrupted between deleting the manifest and rewriting the
/// kustomization leaves such an entry; the next run finishes the job.
pub fn repair_dangling_entry(
    fs: &dyn FileSystem,
    layout: &Layout,
    app: &str,
    dry_run: bool,
) -> Result<bool> {
    let kustomization = layout.base_kustomization(app);
    let present = fs
        .exists(&kustomization)
        .with_context(|| format!("checking {}", kustomization.display()))?;
    if !present || !lists_namespace(fs, &kustomization)? {
        return Ok(false);
    }

    debug!(app, "kustomization still lists a removed namespace.yaml");
    if !dry_run {
        remove_namespace_entry(fs, &kustomization)?;
    }

    Ok(true)
}
