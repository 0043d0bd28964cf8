//! Per-user locations on disk.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

const SETTINGS_FILE: &str = "settings.json";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "rsa-chat", "simulator")
        .context("no home directory to keep rsa-chat settings in")
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Default location read when no `--config` is given.
pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}
