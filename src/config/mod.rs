mod settings;

pub use settings::{
    CaptureConfig, Config, RateLimitConfig, ServerSettings, TomlConfig, EXAMPLE_CONFIG,
};
