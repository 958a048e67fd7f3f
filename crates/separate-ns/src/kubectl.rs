//! Applying manifests to the cluster
//!
//! Shells out to `kubectl`, which picks up the operator's current context.

use std::process::Stdio;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::{Error, Result};

const KUBECTL_BINARY: &str = "kubectl";

/// Trait for applying a manifest to the cluster
///
/// This trait abstracts kubectl execution for testability.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManifestApplier: Send + Sync {
    /// Apply a single YAML manifest
    async fn apply(&self, manifest: &str) -> Result<()>;
}

/// Applier that pipes manifests into `kubectl apply -f -`
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
}

impl Kubectl {
    pub fn new() -> Self {
        Self {
            binary: KUBECTL_BINARY.to_string(),
        }
    }

    #[cfg(test)]
    fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManifestApplier for Kubectl {
    async fn apply(&self, manifest: &str) -> Result<()> {
        debug!(binary = %self.binary, "applying manifest");

        let mut child = Command::new(&self.binary)
            .args(["apply", "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A process that exits early closes the pipe; its exit status says why.
            if let Err(e) = stdin.write_all(manifest.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(Error::command_failed(format!(
                "{} apply failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
