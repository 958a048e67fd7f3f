//! Editing the `resources` list of a kustomization file

use std::path::Path;

use serde_yaml::Value;

use crate::fs::FileSystem;
use crate::paths::NAMESPACE_FILENAME;
use crate::{Result, ResultExt};

/// Compute the kustomization with the first `entry` removed from `resources`.
///
/// Every other key and every other resource keeps its position. Returns
/// `None` when there is no such entry. Nothing is written, so a caller can
/// validate the edit before making any other change.
pub fn plan_removal(fs: &dyn FileSystem, path: &Path, entry: &str) -> Result<Option<String>> {
    let raw = fs
        .read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut document: Value = serde_yaml::from_slice(&raw)
        .with_context(|| format!("unmarshalling {}", path.display()))?;

    let Some(resources) = document
        .get_mut("resources")
        .and_then(Value::as_sequence_mut)
    else {
        return Ok(None);
    };

    let Some(index) = resources.iter().position(|r| r.as_str() == Some(entry)) else {
        return Ok(None);
    };
    resources.remove(index);

    let updated = serde_yaml::to_string(&document)
        .with_context(|| format!("marshalling {}", path.display()))?;
    Ok(Some(updated))
}

/// Remove the first `entry` from the kustomization's `resources` list.
///
/// Returns `false`, without writing, when there is no such entry.
pub fn remove_resource(fs: &dyn FileSystem, path: &Path, entry: &str) -> Result<bool> {
    match plan_removal(fs, path, entry)? {
        Some(updated) => {
            fs.write(path, updated.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Drop `namespace.yaml` from an application base kustomization
pub fn remove_namespace_entry(fs: &dyn FileSystem, path: &Path) -> Result<bool> {
    remove_resource(fs, path, NAMESPACE_FILENAME)
}

/// Whether `namespace.yaml` is still listed in the kustomization
pub fn lists_namespace(fs: &dyn FileSystem, path: &Path) -> Result<bool> {
    Ok(resources(fs, path)?
        .iter()
        .any(|resource| resource == NAMESPACE_FILENAME))
}

/// Read the `resources` list, mostly useful for checks and tests
pub fn resources(fs: &dyn FileSystem, path: &Path) -> Result<Vec<String>> {
    let raw = fs
        .read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let document: Value = serde_yaml::from_slice(&raw)
        .with_context(|| format!("unmarshalling {}", path.display()))?;

    Ok(document
        .get("resources")
        .and_then(Value::as_sequence)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    const PATH: &str = "/base/kustomization.yaml";

    fn kustomization_with(entries: &[&str]) -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        let mut yaml = String::from("resources:\n");
        for entry in entries {
            yaml.push_str(&format!("- {entry}\n"));
        }
        fs.write(Path::new(PATH), yaml.as_bytes()).unwrap();
        fs
    }

    fn remove_and_list(entries: &[&str]) -> Vec<String> {
        let fs = kustomization_with(entries);
        remove_namespace_entry(&fs, Path::new(PATH)).unwrap();
        resources(&fs, Path::new(PATH)).unwrap()
    }

    #[test]
    fn single_entry_leaves_empty_list() {
        assert!(remove_and_list(&["namespace.yaml"]).is_empty());
    }

    #[test]
    fn entry_is_removed_wherever_it_sits() {
        assert_eq!(
            remove_and_list(&["namespace.yaml", "service.yaml", "deployment.yaml"]),
            vec!["service.yaml", "deployment.yaml"]
        );
        assert_eq!(
            remove_and_list(&["service.yaml", "namespace.yaml", "deployment.yaml"]),
            vec!["service.yaml", "deployment.yaml"]
        );
        assert_eq!(
            remove_and_list(&["service.yaml", "deployment.yaml", "namespace.yaml"]),
            vec!["service.yaml", "deployment.yaml"]
        );
    }

    #[test]
    fn only_the_first_match_is_removed_and_duplicates_survive() {
        assert_eq!(
            remove_and_list(&["a.yaml", "namespace.yaml", "a.yaml", "namespace.yaml"]),
            vec!["a.yaml", "a.yaml", "namespace.yaml"]
        );
    }

    #[test]
    fn absent_entry_does_not_rewrite_the_file() {
        let fs = MemoryFileSystem::new();
        let original = b"resources:   # hand formatted\n  - service.yaml\n";
        fs.write(Path::new(PATH), original).unwrap();

        let removed = remove_namespace_entry(&fs, Path::new(PATH)).unwrap();

        assert!(!removed);
        assert_eq!(fs.read(Path::new(PATH)).unwrap(), original);
    }

    #[test]
    fn planning_does_not_write() {
        let fs = kustomization_with(&["namespace.yaml", "service.yaml"]);
        let before = fs.read(Path::new(PATH)).unwrap();

        let planned = plan_removal(&fs, Path::new(PATH), "namespace.yaml").unwrap();

        assert!(planned.unwrap().contains("service.yaml"));
        assert_eq!(fs.read(Path::new(PATH)).unwrap(), before);
        assert!(lists_namespace(&fs, Path::new(PATH)).unwrap());
    }

    #[test]
    fn missing_resources_key_is_a_no_op() {
        let fs = MemoryFileSystem::new();
        fs.write(Path::new(PATH), b"namePrefix: demo-\n").unwrap();

        assert!(!remove_namespace_entry(&fs, Path::new(PATH)).unwrap());
    }

    #[test]
    fn other_keys_are_kept_in_order() {
        let fs = MemoryFileSystem::new();
        let yaml = "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\nresources:\n- deployment.yaml\n- namespace.yaml\npatches:\n- path: patch.yaml\n";
        fs.write(Path::new(PATH), yaml.as_bytes()).unwrap();

        assert!(remove_namespace_entry(&fs, Path::new(PATH)).unwrap());

        let updated = String::from_utf8(fs.read(Path::new(PATH)).unwrap()).unwrap();
        let api = updated.find("apiVersion").unwrap();
        let kind = updated.find("kind").unwrap();
        let resources = updated.find("resources").unwrap();
        let patches = updated.find("patches").unwrap();
        assert!(api < kind && kind < resources && resources < patches);
        assert!(updated.contains("patch.yaml"));
        assert!(!updated.contains("namespace.yaml"));
    }
}
