//! Copying application-owned namespaces into the cluster

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::manifest::parse_namespace_name;
use crate::paths::Layout;
use crate::{Result, ResultExt};

/// A namespace manifest copied (or, under dry-run, to be copied) into a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceCopy {
    pub application: String,
    pub namespace: String,
    pub destination: PathBuf,
}

/// Copy `app`'s base namespace manifest into `cluster`'s namespaces directory.
///
/// Returns `None` when the application owns no namespace manifest, which is
/// the steady state once every cluster has been migrated, and when the
/// cluster already holds an identical copy. The source file is left in
/// place; removing it is the cleanup sweep's decision.
pub fn migrate_application(
    fs: &dyn FileSystem,
    layout: &Layout,
    cluster: &str,
    app: &str,
    dry_run: bool,
) -> Result<Option<NamespaceCopy>> {
    debug!(app, "migrating");

    let source = layout.legacy_namespace_manifest(app);
    let present = fs
        .exists(&source)
        .with_context(|| format!("checking {}", source.display()))?;
    if !present {
        debug!(app, "namespace owned by application not found, ignoring");
        return Ok(None);
    }

    let content = fs
        .read(&source)
        .with_context(|| format!("reading {}", source.display()))?;
    let namespace = parse_namespace_name(&content, &source).context("acquiring namespace name")?;
    debug!(app, namespace = %namespace, "namespace owned by application found, migrating");

    let destination = layout.cluster_namespace_manifest(cluster, &namespace);

    if fs
        .exists(&destination)
        .with_context(|| format!("checking {}", destination.display()))?
    {
        let existing = fs
            .read(&destination)
            .with_context(|| format!("reading {}", destination.display()))?;
        if existing == content {
            debug!(app, namespace = %namespace, "cluster already owns namespace, ignoring");
            return Ok(None);
        }

        // Two applications in one cluster declaring the same namespace name
        // share one destination file. The later copy wins.
        warn!(
            app,
            namespace = %namespace,
            destination = %destination.display(),
            "cluster already has a different manifest for this namespace, overwriting"
        );
    }

    if !dry_run {
        fs.write(&destination, &content)
            .with_context(|| format!("copying to {}", destination.display()))?;
    }

    Ok(Some(NamespaceCopy {
        application: app.to_string(),
        namespace,
        destination,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    const NAMESPACE: &[u8] = b"apiVersion: v1\nkind: Namespace\nmetadata:\n  name: mock-namespace\n  labels:\n    team: a\n";

    fn layout() -> Layout {
        Layout::new("/", "infrastructure")
    }

    #[test]
    fn copies_namespace_byte_for_byte() {
        let fs = MemoryFileSystem::new();
        fs.write(&layout().legacy_namespace_manifest("mock-app-one"), NAMESPACE)
            .unwrap();

        let copy = migrate_application(&fs, &layout(), "mock-cluster", "mock-app-one", false)
            .unwrap()
            .unwrap();

        let destination = layout().cluster_namespace_manifest("mock-cluster", "mock-namespace");
        assert_eq!(copy.destination, destination);
        assert_eq!(copy.namespace, "mock-namespace");
        assert_eq!(fs.read(&destination).unwrap(), NAMESPACE);
        assert!(fs
            .exists(&layout().legacy_namespace_manifest("mock-app-one"))
            .unwrap());
    }

    #[test]
    fn application_without_namespace_is_left_alone() {
        let fs = MemoryFileSystem::new();
        fs.create_dir_all(&layout().application_base_dir("mock-app-one"))
            .unwrap();

        let copy =
            migrate_application(&fs, &layout(), "mock-cluster", "mock-app-one", false).unwrap();

        assert!(copy.is_none());
        assert!(!fs.exists(&layout().namespaces_dir("mock-cluster")).unwrap());
    }

    #[test]
    fn dry_run_plans_the_copy_without_writing() {
        let fs = MemoryFileSystem::new();
        fs.write(&layout().legacy_namespace_manifest("mock-app-one"), NAMESPACE)
            .unwrap();
        let before = fs.snapshot();

        let copy = migrate_application(&fs, &layout(), "mock-cluster", "mock-app-one", true)
            .unwrap()
            .unwrap();

        assert_eq!(copy.namespace, "mock-namespace");
        assert_eq!(fs.snapshot(), before);
    }

    #[test]
    fn malformed_legacy_namespace_fails() {
        let fs = MemoryFileSystem::new();
        fs.write(&layout().legacy_namespace_manifest("mock-app-one"), b"kind: Namespace\n")
            .unwrap();

        assert!(migrate_application(&fs, &layout(), "mock-cluster", "mock-app-one", false).is_err());
    }

    // ==========================================================================
    // Story: Cluster already owns the namespace
    // ==========================================================================

    #[test]
    fn identical_copy_in_cluster_is_not_copied_again() {
        let fs = MemoryFileSystem::new();
        let destination = layout().cluster_namespace_manifest("mock-cluster", "mock-namespace");
        fs.write(&layout().legacy_namespace_manifest("mock-app-one"), NAMESPACE)
            .unwrap();
        fs.write(&destination, NAMESPACE).unwrap();

        let copy =
            migrate_application(&fs, &layout(), "mock-cluster", "mock-app-one", false).unwrap();

        assert!(copy.is_none());
        assert_eq!(fs.read(&destination).unwrap(), NAMESPACE);
    }

    #[test]
    fn different_manifest_for_same_namespace_is_overwritten() {
        let fs = MemoryFileSystem::new();
        let destination = layout().cluster_namespace_manifest("mock-cluster", "mock-namespace");
        fs.write(&layout().legacy_namespace_manifest("mock-app-two"), NAMESPACE)
            .unwrap();
        fs.write(
            &destination,
            b"apiVersion: v1\nkind: Namespace\nmetadata:\n  name: mock-namespace\n",
        )
        .unwrap();

        let copy = migrate_application(&fs, &layout(), "mock-cluster", "mock-app-two", false)
            .unwrap()
            .unwrap();

        assert_eq!(copy.application, "mock-app-two");
        assert_eq!(fs.read(&destination).unwrap(), NAMESPACE);
    }
}
