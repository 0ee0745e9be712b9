use crate::far::{InterpolationMode, StencilTable};

/// Supplies the stencil tables a controller dispatches against.
///
/// Either table may be missing. A controller skips the attribute class of a
/// missing table.
pub trait ComputeContext {
    /// The table refining attributes of class `mode`, if any.
    fn stencil_table(&self, mode: InterpolationMode) -> Option<&StencilTable>;

    #[inline]
    fn vertex_stencil_table(&self) -> Option<&StencilTable> {
        self.stencil_table(InterpolationMode::Vertex)
    }

    #[inline]
    fn varying_stencil_table(&self) -> Option<&StencilTable> {
        self.stencil_table(InterpolationMode::Varying)
    }
}

/// Borrows the vertex and varying stencil tables for CPU evaluation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuComputeContext<'a> {
    pub vertex: Option<&'a StencilTable>,
    pub varying: Option<&'a StencilTable>,
}

impl<'a> CpuComputeContext<'a> {
    #[inline]
    pub fn new(vertex: Option<&'a StencilTable>, varying: Option<&'a StencilTable>) -> Self {
        Self { vertex, varying }
    }
}

impl ComputeContext for CpuComputeContext<'_> {
    #[inline]
    fn stencil_table(&self, mode: InterpolationMode) -> Option<&StencilTable> {
        match mode {
            InterpolationMode::Vertex => self.vertex,
            InterpolationMode::Varying => self.varying,
        }
    }
}
