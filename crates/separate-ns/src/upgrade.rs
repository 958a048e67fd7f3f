//! The upgrade: preflight, namespace sync, migration

use tracing::{debug, info};

use crate::argocd::{enable_namespaces_sync, EnableNamespacesSyncOptions};
use crate::declaration::ClusterDeclaration;
use crate::fs::FileSystem;
use crate::kubectl::ManifestApplier;
use crate::migration::{migrate_cluster, MigrationOptions, MigrationReport};
use crate::paths::Layout;
use crate::{Error, Result, ResultExt};

/// Everything one upgrade run works with
pub struct UpgradeContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub applier: &'a dyn ManifestApplier,
    pub layout: &'a Layout,
    pub declaration: &'a ClusterDeclaration,
    pub dry_run: bool,
}

/// Run the upgrade for the declared cluster.
///
/// Returns [`Error::NothingToDo`] when the repository has no applications.
pub async fn run_upgrade(ctx: &UpgradeContext<'_>) -> Result<MigrationReport> {
    debug!("running preflight tests");
    preflight(ctx.fs, ctx.layout).context("running preflight tests")?;

    debug!("enabling namespace synchronization");
    enable_namespaces_sync(&EnableNamespacesSyncOptions {
        fs: ctx.fs,
        applier: ctx.applier,
        layout: ctx.layout,
        declaration: ctx.declaration,
        dry_run: ctx.dry_run,
    })
    .await
    .context("adding namespaces app manifest")?;

    debug!("migrating application owned namespaces");
    let report = migrate_cluster(&MigrationOptions {
        fs: ctx.fs,
        layout: ctx.layout,
        cluster: ctx.declaration.name(),
        dry_run: ctx.dry_run,
    })
    .context("migrating existing namespaces")?;

    info!(
        cluster = ctx.declaration.name(),
        applications = report.applications.len(),
        copied = report.copies.len(),
        removed = report.removed.len(),
        retained = report.retained.len(),
        dry_run = ctx.dry_run,
        "namespace migration finished"
    );

    Ok(report)
}

fn preflight(fs: &dyn FileSystem, layout: &Layout) -> Result<()> {
    let applications_dir = layout.applications_dir();
    let present = fs
        .is_dir(&applications_dir)
        .with_context(|| format!("checking {}", applications_dir.display()))?;

    if !present {
        debug!(dir = %applications_dir.display(), "no application directory found, ignoring upgrade");
        return Err(Error::NothingToDo);
    }

    Ok(())
}
