// src/infra/paths.rs - Platform-aware path management
//
// All paths respect the CHATKEEP_HOME environment variable for isolation.
// When CHATKEEP_HOME is set, config and data live under that directory.
// When unset, config uses ~/.chatkeep/ and data uses the platform
// data-local directory.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<Option<ProjectDirs>> = OnceLock::new();

fn project_dirs() -> Option<&'static ProjectDirs> {
    PROJECT_DIRS
        .get_or_init(|| ProjectDirs::from("", "", "chatkeep"))
        .as_ref()
}

/// Returns the CHATKEEP_HOME override, if set.
fn chatkeep_home() -> Option<PathBuf> {
    std::env::var_os("CHATKEEP_HOME").map(PathBuf::from)
}

/// Home directory, or the working directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $CHATKEEP_HOME/ or ~/.chatkeep/
pub fn config_dir() -> PathBuf {
    if let Some(home) = chatkeep_home() {
        return home;
    }
    dirs_home().join(".chatkeep")
}

/// Data directory: $CHATKEEP_HOME/data/ or the platform data-local dir
pub fn data_dir() -> PathBuf {
    if let Some(home) = chatkeep_home() {
        return home.join("data");
    }
    match project_dirs() {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Default database path
pub fn db_path() -> PathBuf {
    data_dir().join("chatkeep.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
