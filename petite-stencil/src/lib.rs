//#![warn(missing_docs)]
//! # Parallel Stencil Evaluation
//!
//! Refines subdivision surface vertices on the CPU by applying precomputed
//! stencils. A stencil describes one refined vertex as a linear blend of
//! coarse control vertices. Once the stencils are known, moving the control
//! vertices only requires re-running the blend, which is what this crate does,
//! spread across a pool of worker threads.
//!
//! The split follows [*Pixar’s
//! OpenSubdiv*](https://graphics.pixar.com/opensubdiv/):
//!
//! * [`far`] holds the table side: the [`StencilTable`](far::StencilTable)
//!   and the [`KernelBatch`](far::KernelBatch) ranges that cut it into
//!   independent units of work.
//! * [`osd`] holds the compute side: the
//!   [`BufferDescriptor`](osd::BufferDescriptor) that locates an attribute
//!   inside a (possibly interleaved) buffer, the weighted-sum kernel and the
//!   [`CpuComputeController`](osd::CpuComputeController) that binds buffers
//!   and dispatches batches.
//!
//! Building the stencil weights (topology refinement) is not part of this
//! crate. Tables are handed in ready-made.
//!
//! ## Example
//!
//! ```
//! use petite_stencil::far::{KernelBatch, StencilTable};
//! use petite_stencil::osd::{
//!     AttributeBinding, BufferDescriptor, ComputeControllerOptions, CpuComputeContext,
//!     CpuComputeController,
//! };
//!
//! // Two control vertices, one refined vertex halfway between them.
//! let table = StencilTable::new(2, vec![2], vec![0u32.into(), 1u32.into()], vec![0.5, 0.5])?;
//!
//! let desc = BufferDescriptor::new(0, 3, 3)?;
//! let mut positions = vec![
//!     0.0, 0.0, 0.0, // control vertex 0
//!     2.0, 4.0, 0.0, // control vertex 1
//!     0.0, 0.0, 0.0, // refined vertex 0
//! ];
//!
//! let controller = CpuComputeController::new(ComputeControllerOptions::default())?;
//! let context = CpuComputeContext {
//!     vertex: Some(&table),
//!     varying: None,
//! };
//!
//! controller.refine(
//!     &context,
//!     &[KernelBatch::whole(&table)],
//!     Some(AttributeBinding::in_place(&mut positions, desc)),
//!     None,
//! );
//!
//! assert_eq!(&positions[6..], &[1.0, 2.0, 0.0]);
//! # Ok::<(), petite_stencil::Error>(())
//! ```
//!
//! ## Cargo Features
#![doc = document_features::document_features!()]

pub mod error;
pub mod far;
pub mod osd;

pub use error::{Error, Result};

/// A control vertex or stencil index.
///
/// # Examples
///
/// ```
/// use petite_stencil::Index;
///
/// let idx = Index::from(42u32);
/// assert_eq!(idx.0, 42);
///
/// let as_usize: usize = Index::from(100usize).into();
/// assert_eq!(as_usize, 100);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
#[repr(transparent)]
pub struct Index(pub u32);

impl From<usize> for Index {
    #[inline]
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    #[inline]
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}
