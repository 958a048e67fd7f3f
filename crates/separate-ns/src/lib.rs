//! Separate namespaces from applications
//!
//! Upgrade that moves `Namespace` manifests out of application base
//! directories and into a per-cluster namespaces directory synced by ArgoCD.

pub mod argocd;
pub mod declaration;
pub mod error;
pub mod fs;
pub mod kubectl;
pub mod kustomization;
pub mod manifest;
pub mod migration;
pub mod paths;
pub mod repo;
pub mod upgrade;

pub use error::{Error, Result, ResultExt};

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::info;

use crate::declaration::{ClusterDeclaration, DECLARATION_ENV};
use crate::fs::OsFileSystem;
use crate::kubectl::Kubectl;
use crate::migration::MigrationReport;
use crate::paths::Layout;
use crate::upgrade::{run_upgrade, UpgradeContext};

/// Moves application-owned namespaces into the cluster namespaces directory
///
/// Boolean flags take an explicit value, e.g. `--dry-run=false`.
#[derive(Parser, Debug)]
#[command(name = "separate-ns-from-app")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Don't actually do any changes, just show what would be done
    #[arg(short = 'n', long, default_value_t = true, action = ArgAction::Set)]
    pub dry_run: bool,

    /// Path to the cluster declaration
    #[arg(long, env = DECLARATION_ENV)]
    pub cluster_declaration: Option<PathBuf>,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }

    /// Run the upgrade
    pub async fn run(self) -> Result<()> {
        let declaration_path = self
            .cluster_declaration
            .ok_or(Error::MissingDeclaration {
                env: DECLARATION_ENV,
            })?;
        let declaration = ClusterDeclaration::load(&declaration_path)?;

        let cwd = std::env::current_dir().context("acquiring current directory")?;
        let root = repo::repository_root(&cwd).context("acquiring repository root dir")?;
        let layout = Layout::for_declaration(root, &declaration);

        if self.dry_run {
            info!("dry run, no changes will be made");
        }

        let fs = OsFileSystem;
        let kubectl = Kubectl::new();
        let ctx = UpgradeContext {
            fs: &fs,
            applier: &kubectl,
            layout: &layout,
            declaration: &declaration,
            dry_run: self.dry_run,
        };

        match run_upgrade(&ctx).await {
            Ok(report) => {
                log_report(&report, self.dry_run);
                Ok(())
            }
            Err(e) if e.is_nothing_to_do() => {
                info!("nothing to do: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn log_report(report: &MigrationReport, dry_run: bool) {
    let verb = if dry_run { "would" } else { "did" };

    for app in &report.retained {
        info!(
            "keeping namespace.yaml in {}: other clusters have not migrated yet",
            app
        );
    }

    if report.is_empty() {
        info!("{}", idle_summary(report));
        return;
    }

    for copy in &report.copies {
        info!(
            "{} copy namespace {} from {} to {}",
            verb,
            copy.namespace,
            copy.application,
            copy.destination.display()
        );
    }
    for app in &report.removed {
        info!("{} remove namespace.yaml from {}", verb, app);
    }
    for app in &report.repaired {
        info!("{} drop stale namespace.yaml entry from {}", verb, app);
    }
}

/// Summary for a run that changed nothing
fn idle_summary(report: &MigrationReport) -> &'static str {
    if report.is_complete() {
        "all application namespaces already migrated"
    } else {
        "cluster already migrated, legacy namespaces wait for other clusters"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_is_the_default() {
        let cli = Cli::try_parse_from(["separate-ns-from-app"]).unwrap();
        assert!(cli.dry_run);
        assert!(!cli.debug);
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn dry_run_can_be_disabled_explicitly() {
        let cli = Cli::try_parse_from([
            "separate-ns-from-app",
            "--dry-run=false",
            "--debug",
            "--cluster-declaration",
            "cluster.yaml",
        ])
        .unwrap();

        assert!(!cli.dry_run);
        assert_eq!(cli.log_level(), "debug");
        assert_eq!(cli.cluster_declaration, Some(PathBuf::from("cluster.yaml")));
    }

    #[test]
    fn idle_run_with_retained_namespaces_does_not_claim_completion() {
        let waiting = MigrationReport {
            applications: vec!["shared".to_string()],
            retained: vec!["shared".to_string()],
            ..Default::default()
        };
        let done = MigrationReport {
            applications: vec!["shared".to_string()],
            ..Default::default()
        };

        assert!(waiting.is_empty());
        assert!(!waiting.is_complete());
        assert_ne!(idle_summary(&waiting), idle_summary(&done));
        assert_eq!(
            idle_summary(&done),
            "all application namespaces already migrated"
        );
    }
}
