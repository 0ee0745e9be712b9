use crate::{Error, Result};

/// Describes where one per-vertex attribute lives inside a flat `f32` buffer.
///
/// Component `j` of vertex `k` is found at element
/// `offset + k * stride + j`. Several attributes can share one buffer
/// (interleaving) by using the same `stride` and different offsets.
///
/// All values are in elements, not bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    offset: usize,
    length: usize,
    stride: usize,
}

impl BufferDescriptor {
    /// Create a descriptor for an attribute with `length` components.
    ///
    /// Fails if the components of one vertex would spill into the next one,
    /// i.e. when `length` exceeds `stride` minus the
    /// [local offset](Self::local_offset).
    pub fn new(offset: usize, length: usize, stride: usize) -> Result<Self> {
        let desc = Self {
            offset,
            length,
            stride,
        };

        if desc.is_empty() || desc.is_valid() {
            Ok(desc)
        } else {
            Err(Error::InvalidBufferDescriptor {
                offset,
                length,
                stride,
            })
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of components per vertex.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the relative offset within a stride.
    #[inline]
    pub fn local_offset(&self) -> usize {
        if self.stride != 0 {
            self.offset % self.stride
        } else {
            0
        }
    }

    /// True if the descriptor values are internally consistent.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.length != 0 && self.length <= self.stride - self.local_offset()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.length
    }

    /// Element index of `component` of `vertex`.
    #[inline]
    pub fn element_index(&self, vertex: usize, component: usize) -> usize {
        self.offset + vertex * self.stride + component
    }

    /// Minimum buffer length needed to address vertices `0..vertex_count`.
    #[inline]
    pub fn required_len(&self, vertex_count: usize) -> usize {
        if vertex_count == 0 || self.is_empty() {
            0
        } else {
            self.element_index(vertex_count - 1, self.length)
        }
    }

    /// Element at which vertex `vertex` of this attribute starts, and the
    /// descriptor addressing vertex `vertex + k` as `k` in a buffer that
    /// begins there.
    #[inline]
    pub(crate) fn split_at_vertex(&self, vertex: usize) -> (usize, Self) {
        let split = self.element_index(vertex, 0);
        (split, Self { offset: 0, ..*self })
    }
}
