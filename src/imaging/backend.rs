//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two operations media copying needs:
//! identify (read dimensions) and resize (downscale and re-encode in the
//! source format).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and statically
//! linked. Tests use the recording `MockBackend` below.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared by the rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixels where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize `params.source` to exactly `width × height` and write it to
    /// `params.output`, keeping the output extension's format.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
