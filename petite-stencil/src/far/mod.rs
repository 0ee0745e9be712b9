//! `Far` holds the table side of stencil evaluation.
//!
//! A [`StencilTable`] is a representation of refinement weights suitable for
//! efficient parallel processing of primvar refinement: every refined vertex
//! is described by a contiguous run of control vertex indices and blending
//! weights.
//!
//! The tables themselves are produced by topology refinement, which is not
//! part of this crate. They arrive here fully built and are only ever read.
//!
//! The main types in `far` are:
//!
//! * [`StencilTable`] – The flattened stencil runs of one attribute class.
//! * [`KernelBatch`] – A `[start, end)` range of stencils that can be
//!   evaluated independently of any other batch.
//! * [`InterpolationMode`] – Which attribute class (vertex or varying) a
//!   table refines.
pub mod kernel_batch;
pub use kernel_batch::*;

pub mod stencil_table;
pub use stencil_table::*;
