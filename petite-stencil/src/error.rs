//! Error types for the petite-stencil crate.

use thiserror::Error;

/// Main error type for petite-stencil operations.
///
/// Errors are only produced while building tables, descriptors and
/// controllers. Dispatching a batch never fails: a missing table or binding
/// is skipped and a broken precondition panics.
#[derive(Debug, Error)]
pub enum Error {
    /// Buffer descriptor whose components do not fit inside one stride.
    #[error("Invalid buffer descriptor (offset: {offset}, length: {length}, stride: {stride})")]
    InvalidBufferDescriptor {
        offset: usize,
        length: usize,
        stride: usize,
    },

    /// Stencil table arrays disagree in length or layout.
    #[error("Inconsistent stencil table: {0}")]
    StencilTableMismatch(String),

    /// Index out of bounds.
    #[error("Index {index} out of bounds (max: {max})")]
    IndexOutOfBounds { index: usize, max: usize },

    /// Invalid buffer size.
    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// A vertex slice could not be viewed as `f32` elements.
    #[error("Cannot view buffer as f32 elements: {0:?}")]
    BufferCast(bytemuck::PodCastError),

    /// A fixed worker count of zero.
    #[error("Invalid thread count: {0}")]
    InvalidThreadCount(usize),

    /// The worker pool could not be started.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias using our Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
