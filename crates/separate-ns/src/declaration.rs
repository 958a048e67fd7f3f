//! Cluster declaration
//!
//! Only the fields this upgrade reads are modelled; everything else in the
//! declaration file is ignored.

use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result, ResultExt};

/// Environment variable holding the path of the cluster declaration
pub const DECLARATION_ENV: &str = "OKCTL_CLUSTER_DECLARATION";

/// A cluster as declared by its operator
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeclaration {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ClusterMeta,
    pub github: ClusterGithub,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClusterMeta {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterGithub {
    #[serde(default)]
    pub organisation: String,
    #[serde(default)]
    pub repository: String,
    pub output_path: String,
}

impl ClusterDeclaration {
    /// Parse a declaration and check the fields the migration depends on
    pub fn parse(raw: &str, source: &Path) -> Result<Self> {
        let declaration: ClusterDeclaration = serde_yaml::from_str(raw)
            .with_context(|| format!("parsing cluster declaration {}", source.display()))?;

        if declaration.metadata.name.trim().is_empty() {
            return Err(Error::malformed(source, "metadata.name is empty"));
        }
        if declaration.github.output_path.trim().is_empty() {
            return Err(Error::malformed(source, "github.outputPath is empty"));
        }

        Ok(declaration)
    }

    /// Read and parse a declaration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading cluster declaration {}", path.display()))?;
        Self::parse(&raw, path)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn output_path(&self) -> &str {
        &self.github.output_path
    }

    /// SSH URL of the IAC repository, as used by ArgoCD
    pub fn repository_url(&self) -> String {
        format!(
            "git@github.com:{}/{}",
            self.github.organisation, self.github.repository
        )
    }
}
