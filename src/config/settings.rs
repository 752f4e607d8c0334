use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::util::paths::default_work_root;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerSettings,
    /// Root directory for transient workspaces and archives
    pub work_root: PathBuf,
    /// Page capture settings
    pub capture: CaptureConfig,
    /// Per-IP rate limiting
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Allow any origin in CORS responses.
    pub cors_permissive: bool,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// How long a page may take to settle
    pub timeout: Duration,
    /// Maximum number of browser sessions running at once
    pub max_concurrent: usize,
    /// How long a request may wait for a free browser session (None = forever)
    pub queue_timeout: Option<Duration>,
    /// Explicit Chrome/Chromium binary (None = auto-detect)
    pub chrome_path: Option<PathBuf>,
    /// Run Chrome with its sandbox enabled
    pub sandbox: bool,
    /// Browser viewport size
    pub window_size: (u32, u32),
    /// User agent override
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests allowed per client within one window
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_permissive: true,
            body_limit_bytes: 64 * 1024,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_concurrent: 4,
            queue_timeout: Some(Duration::from_secs(60)),
            chrome_path: None,
            sandbox: true,
            window_size: (1280, 800),
            user_agent: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // 100 requests per 15 minutes
        Self {
            enabled: true,
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            work_root: default_work_root(),
            capture: CaptureConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// TOML representation of the `[server]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_permissive: Option<bool>,
    pub body_limit_bytes: Option<usize>,
}

/// TOML representation of the `[workspace]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlWorkspaceConfig {
    pub root: Option<PathBuf>,
}

/// TOML representation of the `[capture]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlCaptureConfig {
    pub timeout_secs: Option<u64>,
    pub max_concurrent: Option<usize>,
    /// 0 disables the queue timeout
    pub queue_timeout_secs: Option<u64>,
    pub chrome_path: Option<PathBuf>,
    pub sandbox: Option<bool>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
    pub user_agent: Option<String>,
}

/// TOML representation of the `[rate_limit]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlRateLimitConfig {
    pub enabled: Option<bool>,
    pub max_requests: Option<u32>,
    pub window_secs: Option<u64>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub server: Option<TomlServerConfig>,
    pub workspace: Option<TomlWorkspaceConfig>,
    pub capture: Option<TomlCaptureConfig>,
    pub rate_limit: Option<TomlRateLimitConfig>,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// parsed is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = Config::default();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        config.apply_toml(&contents)?;

        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Merge TOML settings on top of the current values
    pub fn apply_toml(&mut self, contents: &str) -> anyhow::Result<()> {
        let toml_config: TomlConfig =
            toml::from_str(contents).context("Failed to parse config file")?;

        if let Some(server) = toml_config.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(cors) = server.cors_permissive {
                self.server.cors_permissive = cors;
            }
            if let Some(limit) = server.body_limit_bytes {
                self.server.body_limit_bytes = limit;
            }
        }

        if let Some(root) = toml_config.workspace.and_then(|w| w.root) {
            self.work_root = root;
        }

        if let Some(capture) = toml_config.capture {
            if let Some(secs) = capture.timeout_secs {
                self.capture.timeout = Duration::from_secs(secs);
            }
            if let Some(max) = capture.max_concurrent {
                self.capture.max_concurrent = max;
            }
            if let Some(secs) = capture.queue_timeout_secs {
                self.capture.queue_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            if let Some(path) = capture.chrome_path {
                self.capture.chrome_path = Some(path);
            }
            if let Some(sandbox) = capture.sandbox {
                self.capture.sandbox = sandbox;
            }
            if let Some(width) = capture.window_width {
                self.capture.window_size.0 = width;
            }
            if let Some(height) = capture.window_height {
                self.capture.window_size.1 = height;
            }
            if let Some(ua) = capture.user_agent {
                self.capture.user_agent = Some(ua);
            }
        }

        if let Some(rate) = toml_config.rate_limit {
            if let Some(enabled) = rate.enabled {
                self.rate_limit.enabled = enabled;
            }
            if let Some(max) = rate.max_requests {
                self.rate_limit.max_requests = max;
            }
            if let Some(secs) = rate.window_secs {
                self.rate_limit.window = Duration::from_secs(secs);
            }
        }

        self.validate()
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.capture.max_concurrent == 0 {
            anyhow::bail!("capture.max_concurrent must be at least 1");
        }
        if self.capture.timeout.is_zero() {
            anyhow::bail!("capture.timeout_secs must be at least 1");
        }
        if self.rate_limit.enabled && self.rate_limit.max_requests == 0 {
            anyhow::bail!("rate_limit.max_requests must be at least 1 when enabled");
        }
        if self.rate_limit.enabled && self.rate_limit.window.is_zero() {
            anyhow::bail!("rate_limit.window_secs must be at least 1 when enabled");
        }
        Ok(())
    }

    /// Write the example config if no file exists yet
    pub fn write_example(path: &Path) -> anyhow::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}
