//! Make sure the vendor CLI can be run before we try to run it

use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};
use thiserror::Error;

use crate::Status;

#[derive(Debug, Error, PartialEq)]
pub enum PreflightError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("{} is not executable", .0.display())]
    NotExecutable(PathBuf),
}

impl PreflightError {
    pub fn status(&self) -> Status {
        Status::Critical
    }
}

/// Check that `cli` exists and that we are allowed to execute it
pub fn check_cli(cli: &Path) -> Result<(), PreflightError> {
    if !cli.exists() {
        return Err(PreflightError::Missing(cli.to_owned()));
    }
    if cli.is_dir() || access(cli, AccessFlags::X_OK).is_err() {
        return Err(PreflightError::NotExecutable(cli.to_owned()));
    }
    Ok(())
}
