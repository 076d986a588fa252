use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = ".job-board";

/// Default data directory (~/.job-board)
pub fn app_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

/// Path of config.json inside the data directory
pub fn config_json_path() -> PathBuf {
    app_dir().join("config.json")
}

/// Path of the persisted session record inside `data_dir`
pub fn session_store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session_store.json")
}

/// Make sure `dir` exists
pub fn ensure_dir(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}
