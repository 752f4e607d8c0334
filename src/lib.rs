pub mod bundle;
pub mod capture;
pub mod config;
pub mod util;
pub mod web;

pub use bundle::{
    BundleError, BundleService, GenerateRequest, GeneratedBundle, ValidatedRequest, Workspace,
    WorkspaceAllocator,
};
pub use capture::{
    BoundedRenderer, CaptureError, CapturedPage, ChromeRenderer, MockOutcome, MockRenderer,
    PageRenderer,
};
pub use config::Config;
pub use util::{generate_workspace_name, sanitize_app_name};
pub use web::{build_router, run_server, WebAppState};
