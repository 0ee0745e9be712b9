//! Tests for the osd module.


use petite_stencil::far::{InterpolationMode, KernelBatch, StencilTable};
use petite_stencil::osd::{
    self, AttributeBinding, BufferDescriptor, ComputeControllerOptions, CpuComputeContext,
    CpuComputeController, ThreadCount,
};
use petite_stencil::Index;
use test_utils::{control_buffer, mixed_table, reference_vertex, SENTINEL};

fn indices(values: &[u32]) -> Vec<Index> {
    values.iter().copied().map(Index::from).collect()
}

fn midpoint_table() -> StencilTable {
    StencilTable::new(4, vec![2], indices(&[0, 1]), vec![0.5, 0.5])
        .expect("Failed to create StencilTable")
}

#[test]
fn test_midpoint_split_buffers() -> anyhow::Result<()> {
    let table = midpoint_table();
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 3)?;

    let mut src = vec![0.0f32; 4 * 3];
    src[3] = 2.0;
    let mut dst = vec![SENTINEL; 5 * 3];

    let controller = CpuComputeController::with_thread_count(2)?;
    controller.refine(
        &context,
        &[KernelBatch::whole(&table)],
        Some(AttributeBinding::split(&src, desc, &mut dst, desc)),
        None,
    );

    // Refined vertex 0 lands after the four control vertex slots.
    assert_eq!(&dst[12..15], &[1.0, 0.0, 0.0]);
    assert!(dst[..12].iter().all(|&v| v == SENTINEL));
    Ok(())
}

#[test]
fn test_midpoint_in_place() -> anyhow::Result<()> {
    let table = midpoint_table();
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 3)?;

    let mut buffer = vec![0.0f32; 5 * 3];
    buffer[3] = 2.0;
    buffer[12..].fill(SENTINEL);

    let controller = CpuComputeController::with_thread_count(1)?;
    controller.refine(
        &context,
        &[KernelBatch::whole(&table)],
        Some(AttributeBinding::in_place(&mut buffer, desc)),
        None,
    );

    assert_eq!(&buffer[12..], &[1.0, 0.0, 0.0]);
    assert_eq!(buffer[3], 2.0);
    Ok(())
}

#[test]
fn test_batch_writes_only_its_range() -> anyhow::Result<()> {
    let control_vertex_count = 4;
    let table = mixed_table(control_vertex_count, 10);
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 3)?;

    let src = control_buffer(control_vertex_count, 3);
    let mut dst = vec![SENTINEL; (control_vertex_count + 10) * 3];

    let controller = CpuComputeController::with_thread_count(4)?;
    assert_eq!(controller.thread_count(), 4);

    let mut session =
        controller.bind(Some(AttributeBinding::split(&src, desc, &mut dst, desc)), None);
    session.apply_stencil_table_kernel(KernelBatch::new(2, 5), &context);
    session.synchronize();
    drop(session);

    for i in 0..10 {
        let vertex = &dst[(control_vertex_count + i) * 3..(control_vertex_count + i + 1) * 3];
        if (2..5).contains(&i) {
            assert_eq!(vertex, &reference_vertex(&table, &src, 3, 3, i)[..], "stencil {i}");
        } else {
            assert!(vertex.iter().all(|&v| v == SENTINEL), "stencil {i} was written");
        }
    }
    Ok(())
}

#[test]
fn test_thread_count_does_not_change_result() -> anyhow::Result<()> {
    let control_vertex_count = 37;
    let stencil_count = 1000;
    let table = mixed_table(control_vertex_count, stencil_count);
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 4)?;
    let src = control_buffer(control_vertex_count, 4);

    let run = |thread_count: usize| -> anyhow::Result<Vec<f32>> {
        let controller = CpuComputeController::new(ComputeControllerOptions {
            thread_count: ThreadCount::Fixed(thread_count),
            min_vertices_per_task: 8,
        })?;
        let mut dst = vec![0.0f32; (control_vertex_count + stencil_count) * 4];
        controller.refine(
            &context,
            &KernelBatch::partition(stencil_count, 3),
            Some(AttributeBinding::split(&src, desc, &mut dst, desc)),
            None,
        );
        Ok(dst)
    };

    let single = run(1)?;
    for thread_count in [2, 4, 7] {
        let multi = run(thread_count)?;
        assert!(
            single.iter().zip(&multi).all(|(a, b)| a.to_bits() == b.to_bits()),
            "{thread_count} threads differ from one"
        );
    }

    for i in 0..stencil_count {
        let start = (control_vertex_count + i) * 4;
        assert_eq!(&single[start..start + 3], &reference_vertex(&table, &src, 4, 3, i)[..]);
    }
    Ok(())
}

#[test]
fn test_rerun_is_bit_identical() -> anyhow::Result<()> {
    let table = mixed_table(16, 300);
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 3)?;
    let src = control_buffer(16, 3);
    let mut dst = vec![0.0f32; (16 + 300) * 3];

    let controller = CpuComputeController::new(ComputeControllerOptions::default())?;
    let batches = KernelBatch::chunks(table.len(), 64);

    let mut session =
        controller.bind(Some(AttributeBinding::split(&src, desc, &mut dst, desc)), None);
    session.execute_batches(&batches, &context);
    drop(session);
    let first = dst.clone();

    controller.refine(
        &context,
        &batches,
        Some(AttributeBinding::split(&src, desc, &mut dst, desc)),
        None,
    );

    assert_eq!(
        first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
        dst.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn test_empty_batch_is_noop() -> anyhow::Result<()> {
    let table = mixed_table(4, 10);
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 3)?;
    let src = control_buffer(4, 3);
    let mut dst = vec![SENTINEL; 14 * 3];

    let controller = CpuComputeController::with_thread_count(4)?;
    controller.refine(
        &context,
        &[KernelBatch::new(3, 3), KernelBatch::new(10, 10)],
        Some(AttributeBinding::split(&src, desc, &mut dst, desc)),
        None,
    );

    assert!(dst.iter().all(|&v| v == SENTINEL));
    Ok(())
}

#[test]
fn test_empty_stencil_yields_zero() -> anyhow::Result<()> {
    let table = StencilTable::new(2, vec![1, 0], indices(&[1]), vec![2.0])?;
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 2, 2)?;
    let src = [1.0, 2.0, 3.0, 4.0];
    let mut dst = [SENTINEL; 8];

    let controller = CpuComputeController::with_thread_count(1)?;
    controller.refine(
        &context,
        &[KernelBatch::whole(&table)],
        Some(AttributeBinding::split(&src, desc, &mut dst, desc)),
        None,
    );

    assert_eq!(&dst[4..], &[6.0, 8.0, 0.0, 0.0]);
    Ok(())
}

#[test]
fn test_unbound_varying_is_skipped() -> anyhow::Result<()> {
    let vertex_table = mixed_table(4, 6);
    let varying_table = midpoint_table();
    let context = CpuComputeContext::new(Some(&vertex_table), Some(&varying_table));
    let desc = BufferDescriptor::new(0, 3, 3)?;

    let src = control_buffer(4, 3);
    let mut dst = vec![SENTINEL; 10 * 3];
    let mut varying = control_buffer(4, 3);
    varying.resize(5 * 3, SENTINEL);

    let controller = CpuComputeController::with_thread_count(2)?;
    let mut session = controller.bind(None, Some(AttributeBinding::in_place(&mut varying, desc)));
    assert!(session.is_bound(InterpolationMode::Varying));

    // Rebinding the vertex class alone drops the varying buffer.
    session.bind(Some(AttributeBinding::split(&src, desc, &mut dst, desc)), None);
    assert!(!session.is_bound(InterpolationMode::Varying));
    // Valid for both tables, so a varying dispatch would write slot 4.
    session.apply_stencil_table_kernel(KernelBatch::new(0, 1), &context);
    drop(session);

    assert!(varying[12..].iter().all(|&v| v == SENTINEL));
    assert_eq!(&varying[..12], &control_buffer(4, 3)[..]);
    assert_eq!(&dst[12..15], &reference_vertex(&vertex_table, &src, 3, 3, 0)[..]);
    assert!(dst[15..].iter().all(|&v| v == SENTINEL));
    Ok(())
}

#[test]
fn test_missing_table_is_skipped() -> anyhow::Result<()> {
    let table = midpoint_table();
    // Only a varying table, but only a vertex buffer bound.
    let context = CpuComputeContext::new(None, Some(&table));
    let desc = BufferDescriptor::new(0, 3, 3)?;

    let mut buffer = vec![SENTINEL; 5 * 3];
    let controller = CpuComputeController::with_thread_count(1)?;
    controller.refine(
        &context,
        &[KernelBatch::whole(&table)],
        Some(AttributeBinding::in_place(&mut buffer, desc)),
        None,
    );

    assert!(buffer.iter().all(|&v| v == SENTINEL));
    Ok(())
}

#[test]
fn test_vertex_and_varying_together() -> anyhow::Result<()> {
    let vertex_table = mixed_table(4, 8);
    let varying_table =
        StencilTable::new(4, vec![1, 2], indices(&[3, 0, 2]), vec![1.0, 0.25, 0.75])?;
    let context = CpuComputeContext::new(Some(&vertex_table), Some(&varying_table));

    let vertex_desc = BufferDescriptor::new(0, 3, 3)?;
    let varying_desc = BufferDescriptor::new(0, 1, 1)?;

    let mut positions = control_buffer(4, 3);
    positions.resize(12 * 3, SENTINEL);
    let mut colors = vec![0.0, 1.0, 2.0, 3.0, SENTINEL, SENTINEL];

    let controller = CpuComputeController::with_thread_count(3)?;
    let mut session = controller.bind(
        Some(AttributeBinding::in_place(&mut positions, vertex_desc)),
        Some(AttributeBinding::in_place(&mut colors, varying_desc)),
    );
    // Covers both tables; the varying table only has two stencils.
    session.apply_stencil_table_kernel(KernelBatch::new(0, 2), &context);
    session.unbind();
    session.apply_stencil_table_kernel(KernelBatch::new(2, 8), &context);
    drop(session);

    assert_eq!(&colors[4..], &[3.0, 1.5]);
    assert_eq!(&positions[12..15], &reference_vertex(&vertex_table, &positions, 3, 3, 0)[..]);
    // Stencils dispatched after unbinding are not written.
    assert!(positions[18..].iter().all(|&v| v == SENTINEL));
    Ok(())
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

#[test]
fn test_interleaved_attributes() -> anyhow::Result<()> {
    let table = midpoint_table();
    let context = CpuComputeContext::new(Some(&table), Some(&table));

    let mut vertices = vec![
        Vertex {
            position: [0.0, 0.0, 0.0],
            uv: [0.0, 0.0],
        },
        Vertex {
            position: [2.0, 4.0, 6.0],
            uv: [1.0, 0.5],
        },
    ];
    vertices.resize(
        5,
        Vertex {
            position: [SENTINEL; 3],
            uv: [SENTINEL; 2],
        },
    );

    let position_desc = BufferDescriptor::new(0, 3, 5)?;
    let uv_desc = BufferDescriptor::new(3, 2, 5)?;
    let controller = CpuComputeController::with_thread_count(2)?;

    // Positions only: the uv of the refined vertex must survive.
    controller.refine(
        &context,
        &[KernelBatch::whole(&table)],
        Some(AttributeBinding::in_place_pod(&mut vertices, position_desc)?),
        None,
    );
    assert_eq!(vertices[4].position, [1.0, 2.0, 3.0]);
    assert_eq!(vertices[4].uv, [SENTINEL; 2]);

    controller.refine(
        &context,
        &[KernelBatch::whole(&table)],
        None,
        Some(AttributeBinding::in_place_pod(&mut vertices, uv_desc)?),
    );
    assert_eq!(vertices[4].uv, [0.5, 0.25]);
    assert_eq!(vertices[4].position, [1.0, 2.0, 3.0]);
    Ok(())
}

#[test]
fn test_partitioned_batches_match_whole_table() -> anyhow::Result<()> {
    let table = mixed_table(9, 123);
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 3)?;
    let src = control_buffer(9, 3);

    let mut whole = vec![0.0f32; table.len() * 3];
    osd::evaluate_stencils(&src, desc, &mut whole, desc, &table)?;

    let mut batched = vec![0.0f32; (9 + table.len()) * 3];
    let controller = CpuComputeController::with_thread_count(4)?;
    controller.refine(
        &context,
        &KernelBatch::partition(table.len(), 5),
        Some(AttributeBinding::split(&src, desc, &mut batched, desc)),
        None,
    );

    assert_eq!(&batched[9 * 3..], &whole[..]);
    Ok(())
}

#[test]
fn test_auto_thread_count() -> anyhow::Result<()> {
    let controller = CpuComputeController::new(ComputeControllerOptions {
        thread_count: ThreadCount::from_hint(-1),
        ..Default::default()
    })?;
    assert!(controller.thread_count() >= 1);
    Ok(())
}

#[test]
#[should_panic]
fn test_short_destination_panics() {
    let table = midpoint_table();
    let context = CpuComputeContext::new(Some(&table), None);
    let desc = BufferDescriptor::new(0, 3, 3).unwrap();
    let src = control_buffer(4, 3);
    // Room for the control vertices only.
    let mut dst = vec![0.0f32; 4 * 3];

    let controller = CpuComputeController::with_thread_count(2).unwrap();
    controller.refine(
        &context,
        &[KernelBatch::whole(&table)],
        Some(AttributeBinding::split(&src, desc, &mut dst, desc)),
        None,
    );
}
