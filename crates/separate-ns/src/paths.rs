//! Repository layout
//!
//! ```text
//! <root>/<output>/applications/<app>/base/{namespace.yaml, kustomization.yaml}
//! <root>/<output>/applications/<app>/overlays/<cluster>/
//! <root>/<output>/<cluster>/argocd/applications/<app>.yaml
//! <root>/<output>/<cluster>/argocd/namespaces/<namespace>.yaml
//! ```

use std::path::{Path, PathBuf};

use crate::declaration::ClusterDeclaration;

pub const ARGOCD_CONFIG_DIR: &str = "argocd";
pub const ARGOCD_NAMESPACES_DIR: &str = "namespaces";
pub const ARGOCD_APPLICATIONS_DIR: &str = "applications";
pub const APPLICATIONS_DIR: &str = "applications";
pub const APPLICATION_BASE_DIR: &str = "base";
pub const APPLICATION_OVERLAYS_DIR: &str = "overlays";
pub const NAMESPACE_FILENAME: &str = "namespace.yaml";
pub const KUSTOMIZATION_FILENAME: &str = "kustomization.yaml";
pub const README_FILENAME: &str = "README.md";
pub const NAMESPACES_APPLICATION_FILENAME: &str = "namespaces.yaml";

/// Absolute paths inside one repository output directory
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    output_path: PathBuf,
}

impl Layout {
    /// `root` is the absolute repository root, `output_path` is relative to it
    pub fn new(root: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_path: output_path.into(),
        }
    }

    pub fn for_declaration(root: impl Into<PathBuf>, declaration: &ClusterDeclaration) -> Self {
        Self::new(root, declaration.output_path())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output_path)
    }

    pub fn applications_dir(&self) -> PathBuf {
        self.output_dir().join(APPLICATIONS_DIR)
    }

    pub fn application_dir(&self, app: &str) -> PathBuf {
        self.applications_dir().join(app)
    }

    pub fn application_base_dir(&self, app: &str) -> PathBuf {
        self.application_dir(app).join(APPLICATION_BASE_DIR)
    }

    /// The application-owned namespace manifest that predates the migration
    pub fn legacy_namespace_manifest(&self, app: &str) -> PathBuf {
        self.application_base_dir(app).join(NAMESPACE_FILENAME)
    }

    pub fn base_kustomization(&self, app: &str) -> PathBuf {
        self.application_base_dir(app).join(KUSTOMIZATION_FILENAME)
    }

    pub fn overlays_dir(&self, app: &str) -> PathBuf {
        self.application_dir(app).join(APPLICATION_OVERLAYS_DIR)
    }

    pub fn overlay_dir(&self, app: &str, cluster: &str) -> PathBuf {
        self.overlays_dir(app).join(cluster)
    }

    /// `<output>/<cluster>/argocd`, relative to the repository root
    pub fn relative_argocd_config_dir(&self, cluster: &str) -> PathBuf {
        self.output_path.join(cluster).join(ARGOCD_CONFIG_DIR)
    }

    /// `<output>/<cluster>/argocd/namespaces`, relative to the repository root
    pub fn relative_namespaces_dir(&self, cluster: &str) -> PathBuf {
        self.relative_argocd_config_dir(cluster)
            .join(ARGOCD_NAMESPACES_DIR)
    }

    pub fn argocd_config_dir(&self, cluster: &str) -> PathBuf {
        self.root.join(self.relative_argocd_config_dir(cluster))
    }

    pub fn argocd_applications_dir(&self, cluster: &str) -> PathBuf {
        self.argocd_config_dir(cluster).join(ARGOCD_APPLICATIONS_DIR)
    }

    pub fn namespaces_dir(&self, cluster: &str) -> PathBuf {
        self.root.join(self.relative_namespaces_dir(cluster))
    }

    /// The cluster-owned copy of a namespace manifest
    pub fn cluster_namespace_manifest(&self, cluster: &str, namespace: &str) -> PathBuf {
        self.namespaces_dir(cluster).join(format!("{namespace}.yaml"))
    }

    pub fn namespaces_application_manifest(&self, cluster: &str) -> PathBuf {
        self.argocd_config_dir(cluster)
            .join(NAMESPACES_APPLICATION_FILENAME)
    }
}
