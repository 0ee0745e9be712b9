//! Multi-threaded CPU compute controller.
//!
//! The controller owns a fixed pool of worker threads. Buffers are attached
//! with [`CpuComputeController::bind()`], which returns a
//! [`CpuComputeSession`] holding the [`BindState`]. Batches dispatched through
//! the session are spread over the pool and have completed when the call
//! returns.
//!
//! ```
//! use petite_stencil::far::{KernelBatch, StencilTable};
//! use petite_stencil::osd::{
//!     AttributeBinding, BufferDescriptor, CpuComputeContext, CpuComputeController,
//! };
//!
//! let table = StencilTable::new(2, vec![2], vec![0u32.into(), 1u32.into()], vec![0.5, 0.5])?;
//! let context = CpuComputeContext::new(Some(&table), None);
//!
//! let desc = BufferDescriptor::new(0, 1, 1)?;
//! let src = [2.0, 4.0];
//! let mut dst = [0.0; 3];
//!
//! let controller = CpuComputeController::with_thread_count(2)?;
//! let mut session = controller.bind(
//!     Some(AttributeBinding::split(&src, desc, &mut dst, desc)),
//!     None,
//! );
//! session.apply_stencil_table_kernel(KernelBatch::whole(&table), &context);
//! session.synchronize();
//! drop(session);
//!
//! // The refined vertex follows the two control vertex slots.
//! assert_eq!(dst, [0.0, 0.0, 3.0]);
//! # Ok::<(), petite_stencil::Error>(())
//! ```
use std::num::NonZeroUsize;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use super::buffer_descriptor::BufferDescriptor;
use super::compute_context::ComputeContext;
use super::cpu_kernel::compute_stencils;
use crate::far::{InterpolationMode, KernelBatch, StencilTable};
use crate::{Error, Result};

/// How many worker threads a [`CpuComputeController`] uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThreadCount {
    /// As many threads as the platform can run in parallel.
    #[default]
    Auto,
    /// Exactly this many threads. `1` evaluates on the calling thread.
    Fixed(usize),
}

impl ThreadCount {
    /// Map a signed worker count hint to a [`ThreadCount`].
    ///
    /// Negative hints (conventionally `-1`) mean [`ThreadCount::Auto`].
    pub fn from_hint(hint: i32) -> Self {
        if hint < 0 {
            ThreadCount::Auto
        } else {
            ThreadCount::Fixed(hint as usize)
        }
    }

    /// Returns the number of threads this resolves to on this machine.
    pub fn resolve(self) -> Result<usize> {
        match self {
            ThreadCount::Auto => {
                Ok(std::thread::available_parallelism().map_or(1, NonZeroUsize::get))
            }
            ThreadCount::Fixed(0) => Err(Error::InvalidThreadCount(0)),
            ThreadCount::Fixed(count) => Ok(count),
        }
    }
}

/// Options for creating a [`CpuComputeController`].
#[derive(Clone, Copy, Debug)]
pub struct ComputeControllerOptions {
    /// Worker thread count. Default: [`ThreadCount::Auto`].
    pub thread_count: ThreadCount,
    /// Smallest number of refined vertices handed to one task. Default: `64`.
    pub min_vertices_per_task: usize,
}

impl Default for ComputeControllerOptions {
    fn default() -> Self {
        Self {
            thread_count: ThreadCount::Auto,
            min_vertices_per_task: 64,
        }
    }
}

/// One bound source/destination buffer pair of an attribute class.
///
/// Refined vertex `i` of a table with `n` control vertices is always written
/// to destination vertex `n + i`; refined vertices follow the control
/// vertices.
#[derive(Debug)]
pub enum AttributeBinding<'a> {
    /// Control vertices are read from `src`, refined vertices are written to
    /// `dst`.
    Split {
        src: &'a [f32],
        src_desc: BufferDescriptor,
        dst: &'a mut [f32],
        dst_desc: BufferDescriptor,
    },
    /// One buffer holding the control vertices followed by the refined
    /// vertices.
    InPlace {
        buffer: &'a mut [f32],
        desc: BufferDescriptor,
    },
}

impl<'a> AttributeBinding<'a> {
    #[inline]
    pub fn split(
        src: &'a [f32],
        src_desc: BufferDescriptor,
        dst: &'a mut [f32],
        dst_desc: BufferDescriptor,
    ) -> Self {
        AttributeBinding::Split {
            src,
            src_desc,
            dst,
            dst_desc,
        }
    }

    #[inline]
    pub fn in_place(buffer: &'a mut [f32], desc: BufferDescriptor) -> Self {
        AttributeBinding::InPlace { buffer, desc }
    }

    /// Like [`split()`](Self::split) for buffers of plain-old-data vertices,
    /// e.g. `[f32; 3]` or a `#[repr(C)]` struct of `f32` fields. Descriptors
    /// count `f32` elements.
    pub fn split_pod<T: bytemuck::Pod>(
        src: &'a [T],
        src_desc: BufferDescriptor,
        dst: &'a mut [T],
        dst_desc: BufferDescriptor,
    ) -> Result<Self> {
        Ok(Self::split(
            bytemuck::try_cast_slice(src).map_err(Error::BufferCast)?,
            src_desc,
            bytemuck::try_cast_slice_mut(dst).map_err(Error::BufferCast)?,
            dst_desc,
        ))
    }

    /// Like [`in_place()`](Self::in_place) for buffers of plain-old-data
    /// vertices.
    pub fn in_place_pod<T: bytemuck::Pod>(
        buffer: &'a mut [T],
        desc: BufferDescriptor,
    ) -> Result<Self> {
        Ok(Self::in_place(
            bytemuck::try_cast_slice_mut(buffer).map_err(Error::BufferCast)?,
            desc,
        ))
    }

    fn dispatch(
        &mut self,
        table: &StencilTable,
        batch: KernelBatch,
        pool: Option<&ThreadPool>,
        min_vertices_per_task: usize,
    ) {
        if batch.is_empty() {
            return;
        }

        match self {
            AttributeBinding::Split {
                src,
                src_desc,
                dst,
                dst_desc,
            } => compute_stencils(
                src,
                *src_desc,
                dst,
                *dst_desc,
                table.control_vertex_count(),
                table,
                batch,
                pool,
                min_vertices_per_task,
            ),
            AttributeBinding::InPlace { buffer, desc } => {
                let (split, dst_desc) = desc.split_at_vertex(table.control_vertex_count());
                assert!(
                    split <= buffer.len(),
                    "buffer holds {} elements, {} control vertices need {split}",
                    buffer.len(),
                    table.control_vertex_count()
                );

                let (src, dst) = buffer.split_at_mut(split);
                compute_stencils(
                    src,
                    *desc,
                    dst,
                    dst_desc,
                    0,
                    table,
                    batch,
                    pool,
                    min_vertices_per_task,
                );
            }
        }
    }
}

/// The buffers currently attached to a [`CpuComputeSession`].
#[derive(Debug, Default)]
pub struct BindState<'a> {
    pub vertex: Option<AttributeBinding<'a>>,
    pub varying: Option<AttributeBinding<'a>>,
}

impl<'a> BindState<'a> {
    #[inline]
    pub fn binding(&self, mode: InterpolationMode) -> Option<&AttributeBinding<'a>> {
        match mode {
            InterpolationMode::Vertex => self.vertex.as_ref(),
            InterpolationMode::Varying => self.varying.as_ref(),
        }
    }

    #[inline]
    fn binding_mut(&mut self, mode: InterpolationMode) -> Option<&mut AttributeBinding<'a>> {
        match mode {
            InterpolationMode::Vertex => self.vertex.as_mut(),
            InterpolationMode::Varying => self.varying.as_mut(),
        }
    }
}

/// Refines vertex and varying attributes on a pool of CPU threads.
#[derive(Debug)]
pub struct CpuComputeController {
    thread_count: usize,
    min_vertices_per_task: usize,
    pool: Option<ThreadPool>,
}

impl CpuComputeController {
    /// Create a controller, resolving the thread count once.
    ///
    /// A thread count of one runs every batch on the calling thread and
    /// starts no pool.
    pub fn new(options: ComputeControllerOptions) -> Result<Self> {
        let thread_count = options.thread_count.resolve()?;

        let pool = if thread_count > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(thread_count)
                    .thread_name(|i| format!("petite-stencil-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        debug!(
            thread_count,
            requested = ?options.thread_count,
            min_vertices_per_task = options.min_vertices_per_task,
            "Created CPU compute controller"
        );

        Ok(Self {
            thread_count,
            min_vertices_per_task: options.min_vertices_per_task,
            pool,
        })
    }

    /// Create a controller with a fixed number of threads.
    pub fn with_thread_count(thread_count: usize) -> Result<Self> {
        Self::new(ComputeControllerOptions {
            thread_count: ThreadCount::Fixed(thread_count),
            ..Default::default()
        })
    }

    /// Returns the resolved number of worker threads.
    #[inline]
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    #[inline]
    pub fn min_vertices_per_task(&self) -> usize {
        self.min_vertices_per_task
    }

    /// Attach buffers for the vertex and/or varying attribute class.
    ///
    /// A class left `None` is skipped by every dispatch of the session.
    pub fn bind<'a>(
        &self,
        vertex: Option<AttributeBinding<'a>>,
        varying: Option<AttributeBinding<'a>>,
    ) -> CpuComputeSession<'_, 'a> {
        let mut session = CpuComputeSession {
            controller: self,
            bind_state: BindState::default(),
        };
        session.bind(vertex, varying);
        session
    }

    /// Bind, evaluate `batches` in order, unbind and synchronize.
    pub fn refine<C>(
        &self,
        context: &C,
        batches: &[KernelBatch],
        vertex: Option<AttributeBinding<'_>>,
        varying: Option<AttributeBinding<'_>>,
    ) where
        C: ComputeContext + ?Sized,
    {
        let mut session = self.bind(vertex, varying);
        session.execute_batches(batches, context);
        session.unbind();
        session.synchronize();
    }

    /// Wait for all dispatched batches to finish.
    ///
    /// Dispatch joins its worker tasks before returning, so there is never
    /// outstanding work by the time this is called.
    #[inline]
    pub fn synchronize(&self) {}
}

/// A [`CpuComputeController`] with buffers bound.
///
/// Bound buffers stay borrowed until the session is dropped, so they can
/// neither be read by the caller nor freed while a dispatch may touch them.
#[derive(Debug)]
pub struct CpuComputeSession<'c, 'a> {
    controller: &'c CpuComputeController,
    bind_state: BindState<'a>,
}

impl<'c, 'a> CpuComputeSession<'c, 'a> {
    /// Replace the bound buffers.
    pub fn bind(
        &mut self,
        vertex: Option<AttributeBinding<'a>>,
        varying: Option<AttributeBinding<'a>>,
    ) {
        debug!(
            vertex = vertex.is_some(),
            varying = varying.is_some(),
            "Binding buffers"
        );
        self.bind_state = BindState { vertex, varying };
    }

    /// Detach all buffers. Later dispatches do nothing until rebound.
    pub fn unbind(&mut self) {
        debug!("Unbinding buffers");
        self.bind_state = BindState::default();
    }

    #[inline]
    pub fn is_bound(&self, mode: InterpolationMode) -> bool {
        self.bind_state.binding(mode).is_some()
    }

    #[inline]
    pub fn bind_state(&self) -> &BindState<'a> {
        &self.bind_state
    }

    #[inline]
    pub fn controller(&self) -> &'c CpuComputeController {
        self.controller
    }

    /// Evaluate the stencils of `batch` for every attribute class that has
    /// both a table in `context` and a bound buffer.
    ///
    /// A class missing either is skipped. This is not an error, it allows
    /// refining only some attributes.
    ///
    /// # Panics
    ///
    /// If `batch` reaches past the end of a dispatched table or a bound
    /// buffer is too short for it.
    pub fn apply_stencil_table_kernel<C>(&mut self, batch: KernelBatch, context: &C)
    where
        C: ComputeContext + ?Sized,
    {
        for mode in InterpolationMode::ALL {
            let Some(table) = context.stencil_table(mode) else {
                trace!(?mode, "No stencil table, skipping");
                continue;
            };

            let Some(binding) = self.bind_state.binding_mut(mode) else {
                trace!(?mode, "No buffer bound, skipping");
                continue;
            };

            trace!(?mode, %batch, stencils = table.len(), "Dispatching batch");
            binding.dispatch(
                table,
                batch,
                self.controller.pool.as_ref(),
                self.controller.min_vertices_per_task,
            );
        }
    }

    /// Apply each batch in order.
    pub fn execute_batches<C>(&mut self, batches: &[KernelBatch], context: &C)
    where
        C: ComputeContext + ?Sized,
    {
        for &batch in batches {
            self.apply_stencil_table_kernel(batch, context);
        }
    }

    /// See [`CpuComputeController::synchronize()`].
    #[inline]
    pub fn synchronize(&self) {
        self.controller.synchronize();
    }
}
