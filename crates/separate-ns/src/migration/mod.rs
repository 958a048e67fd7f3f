//! Moving namespace ownership from applications to clusters
//!
//! A run for one cluster has three steps:
//!
//! 1. discover the applications the cluster synchronises
//! 2. copy each application-owned namespace manifest into the cluster
//! 3. sweep: delete legacy manifests that every dependent cluster has copied
//!
//! Step 2 finishes before step 3 starts, because the current cluster's own
//! copy is part of what step 3 checks. Re-running is always safe; the second
//! run finds nothing to do.

pub mod cleanup;
pub mod discovery;
pub mod migrate;

use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::manifest::namespace_name;
use crate::paths::Layout;
use crate::{Result, ResultExt};

pub use cleanup::{dependent_clusters, is_associated, is_cleanable};
pub use discovery::applications_in_cluster;
pub use migrate::{migrate_application, NamespaceCopy};

/// Inputs for one migration run
pub struct MigrationOptions<'a> {
    pub fs: &'a dyn FileSystem,
    pub layout: &'a Layout,
    /// Name of the cluster being upgraded
    pub cluster: &'a str,
    /// Compute and log every decision without touching the tree
    pub dry_run: bool,
}

/// What a run did, or under dry-run would have done
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Applications synchronised by the cluster
    pub applications: Vec<String>,
    /// Namespace manifests copied into the cluster
    pub copies: Vec<NamespaceCopy>,
    /// Applications whose legacy namespace manifest was removed
    pub removed: Vec<String>,
    /// Applications whose legacy manifest stays because a dependent has not migrated
    pub retained: Vec<String>,
    /// Applications whose kustomization still listed an already removed manifest
    pub repaired: Vec<String>,
}

impl MigrationReport {
    /// Whether the run changed (or would change) anything
    pub fn is_empty(&self) -> bool {
        self.copies.is_empty() && self.removed.is_empty() && self.repaired.is_empty()
    }

    /// Whether no legacy namespace manifest is left waiting on another cluster
    pub fn is_complete(&self) -> bool {
        self.is_empty() && self.retained.is_empty()
    }
}

/// Migrate every application-owned namespace of `opts.cluster`.
///
/// Any failure aborts the run. There is no rollback; running again picks up
/// where the failed run stopped.
pub fn migrate_cluster(opts: &MigrationOptions<'_>) -> Result<MigrationReport> {
    let MigrationOptions {
        fs,
        layout,
        cluster,
        dry_run,
    } = *opts;

    let apps = applications_in_cluster(fs, layout, cluster)
        .with_context(|| format!("scanning for applications in cluster {cluster}"))?;

    let mut report = MigrationReport {
        applications: apps.iter().cloned().collect(),
        ..Default::default()
    };

    for app in &apps {
        let copy = migrate_application(fs, layout, cluster, app, dry_run)
            .with_context(|| format!("migrating {app} in cluster {cluster}"))?;
        if let Some(copy) = copy {
            info!(
                app = %app,
                namespace = %copy.namespace,
                dry_run,
                "copied namespace to cluster"
            );
            report.copies.push(copy);
        }
    }

    debug!("cleaning up redundant application owned namespaces");

    for app in &apps {
        sweep_application(opts, app, &mut report)
            .with_context(|| format!("cleaning up {app} in cluster {cluster}"))?;
    }

    Ok(report)
}

fn sweep_application(
    opts: &MigrationOptions<'_>,
    app: &str,
    report: &mut MigrationReport,
) -> Result<()> {
    let MigrationOptions {
        fs,
        layout,
        cluster,
        dry_run,
    } = *opts;

    debug!(app, "checking for redundant namespace");

    let legacy = layout.legacy_namespace_manifest(app);
    let has_legacy = fs
        .exists(&legacy)
        .with_context(|| format!("checking {}", legacy.display()))?;

    if !has_legacy {
        if cleanup::repair_dangling_entry(fs, layout, app, dry_run)? {
            report.repaired.push(app.to_string());
        }
        debug!(app, "fully migrated, ignoring");
        return Ok(());
    }

    // Under dry-run this cluster's copy was never written.
    let planned_here = dry_run && report.copies.iter().any(|c| c.application == app);
    let cleanable = if planned_here {
        cleanable_after_planned_copy(opts, app)?
    } else {
        is_cleanable(fs, layout, app)?
    };

    if !cleanable {
        if is_associated(fs, layout, cluster, app)? {
            debug!(app, cluster, "cluster owns its copy, other clusters still depend on the application namespace");
        } else {
            debug!(app, cluster, "cluster has no overlay for application, other clusters still depend on it");
        }
        report.retained.push(app.to_string());
        return Ok(());
    }

    info!(app = %app, dry_run, "removing redundant application owned namespace");
    if !dry_run {
        cleanup::remove_legacy_namespace(fs, layout, app)?;
    }
    report.removed.push(app.to_string());

    Ok(())
}

/// Dry-run variant of the cleanup check that counts the current cluster's
/// planned (unwritten) copy as present, so dry-run reports match a real run.
fn cleanable_after_planned_copy(opts: &MigrationOptions<'_>, app: &str) -> Result<bool> {
    let MigrationOptions {
        fs,
        layout,
        cluster,
        ..
    } = *opts;

    let namespace = namespace_name(fs, &layout.legacy_namespace_manifest(app))
        .context("acquiring namespace name")?;

    for dependent in dependent_clusters(fs, layout, app)? {
        if dependent == cluster {
            continue;
        }
        if !cleanup::cluster_has_namespace(fs, layout, &dependent, &namespace)? {
            return Ok(false);
        }
    }

    Ok(true)
}
