//! Locating the IAC repository

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::{Error, Result};

/// Absolute path of the working tree containing `start`.
///
/// Works from any subdirectory of the repository, like
/// `git rev-parse --show-toplevel`.
pub fn repository_root(start: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(start)?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| Error::command_failed("repository has no working directory (bare repository)"))?;

    Ok(workdir.to_path_buf())
}
