//! # Osd
//! `Osd` contains the device dependent code that evaluates
//! [`far`](crate::far) stencil tables. This crate ships the multi-threaded
//! CPU backend:
//!
//! * **Refinement**
//!
//!   Compute stencil-based subdivision of vertex and varying attributes on a
//!   pool of CPU threads, see [`CpuComputeController`].
//! * **Interleaved/Batched Buffer Configuration**
//!
//!   Provide a consistent [`BufferDescriptor`] to deal with arbitrary buffer
//!   layout.
//!
//! Controllers don't own vertex buffers. Clients provide their own buffers as
//! source and destination and keep ownership of them throughout.
pub mod buffer_descriptor;
pub use buffer_descriptor::*;

pub mod compute_context;
pub use compute_context::*;

pub mod cpu_compute_controller;
pub use cpu_compute_controller::*;

pub mod cpu_kernel;
pub use cpu_kernel::*;
