//! Path utilities for webapp-bundler directories

use std::path::PathBuf;

/// Default root for transient workspaces (<tmp>/webapp-bundler)
pub fn default_work_root() -> PathBuf {
    std::env::temp_dir().join("webapp-bundler")
}

/// Default config file path (~/.config/webapp-bundler/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("webapp-bundler"))
        .unwrap_or_else(|| PathBuf::from(".webapp-bundler"))
        .join("config.toml")
}
