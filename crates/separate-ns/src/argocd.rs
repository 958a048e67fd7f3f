//! Letting ArgoCD manage the cluster namespaces directory

use std::path::Path;

use minijinja::{context, Environment};
use tracing::debug;

use crate::declaration::ClusterDeclaration;
use crate::fs::FileSystem;
use crate::kubectl::ManifestApplier;
use crate::paths::{Layout, NAMESPACES_APPLICATION_FILENAME, README_FILENAME};
use crate::{Result, ResultExt};

/// Name of the ArgoCD application that syncs the namespaces directory
pub const NAMESPACES_APPLICATION_NAME: &str = "namespaces";

const APPLICATION_TEMPLATE: &str = include_str!("../templates/argocd-application.yaml");
const README_TEMPLATE: &str = include_str!("../templates/namespaces-readme.md");

fn render(name: &str, template: &str, ctx: minijinja::Value) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template(name, template)?;
    Ok(env.get_template(name)?.render(ctx)?)
}

/// Render an ArgoCD application syncing `target_dir` from the IAC repository
pub fn scaffold_application(name: &str, target_dir: &Path, repository_url: &str) -> Result<String> {
    render(
        "argocd-application",
        APPLICATION_TEMPLATE,
        context! {
            name => name,
            target_dir => target_dir.display().to_string(),
            repository_url => repository_url,
        },
    )
}

fn readme(layout: &Layout, cluster: &str) -> Result<String> {
    let application_manifest = layout
        .relative_argocd_config_dir(cluster)
        .join(NAMESPACES_APPLICATION_FILENAME);

    render(
        "namespaces-readme",
        README_TEMPLATE,
        context! {
            cluster => cluster,
            application_manifest => application_manifest.display().to_string(),
        },
    )
}

/// Inputs for enabling namespace synchronisation
pub struct EnableNamespacesSyncOptions<'a> {
    pub fs: &'a dyn FileSystem,
    pub applier: &'a dyn ManifestApplier,
    pub layout: &'a Layout,
    pub declaration: &'a ClusterDeclaration,
    pub dry_run: bool,
}

/// Create the namespaces directory and register it with ArgoCD.
///
/// Every step is idempotent: files are overwritten with identical content
/// and `kubectl apply` converges.
pub async fn enable_namespaces_sync(opts: &EnableNamespacesSyncOptions<'_>) -> Result<()> {
    let cluster = opts.declaration.name();
    let namespaces_dir = opts.layout.namespaces_dir(cluster);

    if !opts.dry_run {
        debug!(dir = %namespaces_dir.display(), "preparing directory structure");

        opts.fs
            .create_dir_all(&namespaces_dir)
            .with_context(|| format!("preparing {}", namespaces_dir.display()))?;

        let readme_path = namespaces_dir.join(README_FILENAME);
        opts.fs
            .write(&readme_path, readme(opts.layout, cluster)?.as_bytes())
            .with_context(|| format!("creating {}", readme_path.display()))?;
    }

    debug!("adding namespaces ArgoCD application");

    let application = scaffold_application(
        NAMESPACES_APPLICATION_NAME,
        &opts.layout.relative_namespaces_dir(cluster),
        &opts.declaration.repository_url(),
    )
    .context("scaffolding ArgoCD application")?;

    if opts.dry_run {
        return Ok(());
    }

    let manifest_path = opts.layout.namespaces_application_manifest(cluster);
    opts.fs
        .write(&manifest_path, application.as_bytes())
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    opts.applier
        .apply(&application)
        .await
        .context("applying namespaces ArgoCD application")?;

    Ok(())
}
