//! Bundle pipeline: workspace allocation, synthesis, archiving and orchestration.

pub mod archive;
pub mod error;
pub mod pipeline;
pub mod synth;
pub mod templates;
pub mod workspace;

pub use archive::create_archive;
pub use error::BundleError;
pub use pipeline::{BundleService, GenerateRequest, GeneratedBundle, ValidatedRequest};
pub use synth::{write_bundle, BundleFiles, BUNDLE_FILES};
pub use workspace::{Workspace, WorkspaceAllocator};
