//! Reading the few manifest fields the migration cares about

use std::path::Path;

use serde::Deserialize;

use crate::fs::FileSystem;
use crate::{Error, Result, ResultExt};

pub const ARGOCD_APPLICATION_API_VERSION: &str = "argoproj.io/v1alpha1";
pub const ARGOCD_APPLICATION_KIND: &str = "Application";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeMeta {
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct NamespaceManifest {
    #[serde(default)]
    metadata: ObjectMeta,
}

/// Outcome of checking whether a file is an ArgoCD application manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestClass {
    Application,
    NotAnApplication,
}

/// Classify raw bytes as an ArgoCD application or not.
///
/// This is a best-effort filter: anything that does not parse, or parses to
/// a different apiVersion/kind, is simply not an application.
pub fn classify_application(raw: &[u8]) -> ManifestClass {
    match serde_yaml::from_slice::<TypeMeta>(raw) {
        Ok(meta)
            if meta.api_version == ARGOCD_APPLICATION_API_VERSION
                && meta.kind == ARGOCD_APPLICATION_KIND =>
        {
            ManifestClass::Application
        }
        _ => ManifestClass::NotAnApplication,
    }
}

/// Extract `metadata.name` from a namespace manifest.
///
/// `path` is only used for error messages.
pub fn parse_namespace_name(raw: &[u8], path: &Path) -> Result<String> {
    let manifest: NamespaceManifest = serde_yaml::from_slice(raw)
        .map_err(|e| Error::malformed(path, format!("unmarshalling: {e}")))?;

    let name = manifest.metadata.name.trim();
    if name.is_empty() {
        return Err(Error::malformed(path, "missing metadata.name"));
    }

    Ok(name.to_string())
}

/// Read a namespace manifest and return its logical name
pub fn namespace_name(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let raw = fs
        .read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_namespace_name(&raw, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    // ==========================================================================
    // Story: Application classifier
    // ==========================================================================

    #[test]
    fn argocd_application_is_classified_as_application() {
        let raw = b"apiVersion: argoproj.io/v1alpha1\nkind: Application\nmetadata:\n  name: app\n";
        assert_eq!(classify_application(raw), ManifestClass::Application);
    }

    #[test]
    fn wrong_kind_or_version_is_not_an_application() {
        let project = b"apiVersion: argoproj.io/v1alpha1\nkind: AppProject\n";
        let old = b"apiVersion: argoproj.io/v1alpha0\nkind: Application\n";

        assert_eq!(classify_application(project), ManifestClass::NotAnApplication);
        assert_eq!(classify_application(old), ManifestClass::NotAnApplication);
    }

    #[test]
    fn garbage_is_not_an_application() {
        assert_eq!(
            classify_application(b"{{{ not yaml"),
            ManifestClass::NotAnApplication
        );
        assert_eq!(
            classify_application(b"- a\n- list\n"),
            ManifestClass::NotAnApplication
        );
        assert_eq!(classify_application(b""), ManifestClass::NotAnApplication);
    }

    // ==========================================================================
    // Story: Namespace manifest reader
    // ==========================================================================

    #[test]
    fn namespace_name_comes_from_metadata() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/base/namespace.yaml");
        fs.write(path, b"apiVersion: v1\nkind: Namespace\nmetadata:\n  name: apps\n")
            .unwrap();

        assert_eq!(namespace_name(&fs, path).unwrap(), "apps");
    }

    #[test]
    fn namespace_without_name_is_malformed() {
        let err = parse_namespace_name(b"apiVersion: v1\nkind: Namespace\n", Path::new("ns.yaml"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedManifest { .. }));
    }

    #[test]
    fn unparseable_namespace_is_malformed() {
        let err = parse_namespace_name(b"metadata: [", Path::new("ns.yaml")).unwrap_err();
        assert!(matches!(err, Error::MalformedManifest { .. }));
    }

    #[test]
    fn missing_namespace_file_is_an_io_error() {
        let fs = MemoryFileSystem::new();
        let err = namespace_name(&fs, Path::new("/missing.yaml")).unwrap_err();
        assert!(matches!(err, Error::Context { .. }));
    }
}
