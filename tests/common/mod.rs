//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uprun::config::parse_playbook_file;
use uprun::runner::{Context, Engine, Verbosity};

/// Create a temporary directory with a playbook.yml file
pub fn create_playbook(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let playbook_path = temp_dir.path().join("playbook.yml");
    fs::write(&playbook_path, content).unwrap();
    (temp_dir, playbook_path)
}

/// Write a file under `dir`, creating parent directories
pub fn write_file(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// A silent engine rooted at the playbook's directory, using the default
/// source search path
pub fn engine_for(playbook_path: &Path) -> Engine {
    let dir = playbook_path.parent().unwrap().to_path_buf();
    Engine::new(
        Context::new()
            .with_working_dir(dir)
            .with_playbook_path(playbook_path.to_path_buf())
            .with_files_path(Some(".../files:...".to_string()))
            .with_verbosity(Verbosity::Silent),
    )
}

/// Load and run a playbook with [`engine_for`]
pub fn run_playbook(playbook_path: &Path) -> (Engine, uprun::Result<()>) {
    let playbook = parse_playbook_file(playbook_path).unwrap();
    let mut engine = engine_for(playbook_path);
    let result = engine.run_playbook(&playbook);
    (engine, result)
}

#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}
