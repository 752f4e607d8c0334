//! Utility modules

pub mod names;
pub mod paths;

pub use names::{
    cache_name, download_file_name, generate_workspace_name, sanitize_app_name, MAX_NAME_LEN,
};
pub use paths::{default_config_path, default_work_root};
