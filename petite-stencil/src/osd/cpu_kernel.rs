//! Weighted-sum stencil kernel.
//!
//! Every refined vertex is the sum of its stencil's control vertices, each
//! scaled by its weight. Refined vertices never read each other, so a batch
//! can be spread over any number of threads: each thread owns a disjoint set
//! of destination vertex slots and only reads the shared source buffer.
use rayon::prelude::*;
use rayon::ThreadPool;

use super::buffer_descriptor::BufferDescriptor;
use crate::far::{KernelBatch, StencilTable};
use crate::{Error, Result};

/// Evaluate every stencil of `table` on the current thread.
///
/// Stencil `i` is written to vertex `i` of `dst_buffer`, i.e. the destination
/// holds refined vertices only. This differs from
/// [`CpuComputeController`](super::CpuComputeController), which writes stencil
/// `i` to vertex `control_vertex_count + i` so control and refined vertices
/// can share one buffer layout. Do not mix the two on the same buffer.
///
/// * `src_buffer` -- Input primvar buffer.
/// * `src_desc` -- Vertex buffer descriptor for the input buffer.
/// * `dst_buffer` -- Output primvar buffer.
/// * `dst_desc` -- Vertex buffer descriptor for the output buffer.
/// * `stencil_table` -- A [`StencilTable`].
pub fn evaluate_stencils(
    src_buffer: &[f32],
    src_desc: BufferDescriptor,
    dst_buffer: &mut [f32],
    dst_desc: BufferDescriptor,
    stencil_table: &StencilTable,
) -> Result<()> {
    let expected = src_desc.required_len(stencil_table.control_vertex_count());
    if src_buffer.len() < expected {
        return Err(Error::InvalidBufferSize {
            expected,
            actual: src_buffer.len(),
        });
    }

    let expected = dst_desc.required_len(stencil_table.len());
    if dst_buffer.len() < expected {
        return Err(Error::InvalidBufferSize {
            expected,
            actual: dst_buffer.len(),
        });
    }

    compute_stencils(
        src_buffer,
        src_desc,
        dst_buffer,
        dst_desc,
        0,
        stencil_table,
        KernelBatch::whole(stencil_table),
        None,
        1,
    );

    Ok(())
}

/// Evaluate the stencils of `batch`.
///
/// Stencil `i` is written to vertex `dst_base + i` of `dst`. Only the first
/// `min(src_desc.length(), dst_desc.length())` components of each
/// destination vertex are touched; anything else sharing the stride is left
/// alone.
///
/// With a `pool` of more than one thread the batch is split into tasks of at
/// least `min_vertices_per_task` vertices. The per-vertex summation order is
/// the stencil order in either case, so the result does not depend on the
/// number of threads.
///
/// # Panics
///
/// If `batch` reaches past the end of `table`, if `dst` is too short to hold
/// vertex `dst_base + batch.end() - 1` or if a stencil reads past the end of
/// `src`.
#[allow(clippy::too_many_arguments)]
pub fn compute_stencils(
    src: &[f32],
    src_desc: BufferDescriptor,
    dst: &mut [f32],
    dst_desc: BufferDescriptor,
    dst_base: usize,
    table: &StencilTable,
    batch: KernelBatch,
    pool: Option<&ThreadPool>,
    min_vertices_per_task: usize,
) {
    assert!(
        batch.end() <= table.len(),
        "batch {batch} exceeds stencil table of length {}",
        table.len()
    );

    let length = src_desc.length().min(dst_desc.length());
    if batch.is_empty() || length == 0 {
        return;
    }

    let end = dst_desc.required_len(dst_base + batch.end());
    assert!(
        dst.len() >= end,
        "destination buffer holds {} elements, batch {batch} needs {end}",
        dst.len()
    );

    let start = dst_desc.element_index(dst_base + batch.start(), 0);
    let window = &mut dst[start..end];

    let eval = |(i, vertex): (usize, &mut [f32])| {
        compute_stencil(src, src_desc, table, batch.start() + i, &mut vertex[..length]);
    };

    match pool {
        Some(pool) if pool.current_num_threads() > 1 => pool.install(|| {
            window
                .par_chunks_mut(dst_desc.stride())
                .enumerate()
                .with_min_len(min_vertices_per_task.max(1))
                .for_each(eval)
        }),
        _ => window
            .chunks_mut(dst_desc.stride())
            .enumerate()
            .for_each(eval),
    }
}

/// Evaluate stencil `index` of `table` into `dst`, one element per
/// component.
#[inline]
pub fn compute_stencil(
    src: &[f32],
    src_desc: BufferDescriptor,
    table: &StencilTable,
    index: usize,
    dst: &mut [f32],
) {
    let size = table.sizes()[index] as usize;
    let offset = usize::from(table.offsets()[index]);
    let indices = &table.control_indices()[offset..offset + size];
    let weights = &table.weights()[offset..offset + size];

    let length = dst.len();
    dst.fill(0.0);

    for (&control, &weight) in indices.iter().zip(weights) {
        let control = usize::from(control);
        debug_assert!(
            control < table.control_vertex_count(),
            "stencil {index} reads control vertex {control} of {}",
            table.control_vertex_count()
        );

        let base = src_desc.element_index(control, 0);
        for (d, s) in dst.iter_mut().zip(&src[base..base + length]) {
            *d += weight * s;
        }
    }
}
