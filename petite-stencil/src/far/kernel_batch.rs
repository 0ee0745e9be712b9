//! Ranges of stencils dispatched as one unit of work.
use std::ops::Range;

use super::StencilTable;

/// A contiguous `[start, end)` range of stencils.
///
/// Batches over the same table never overlap, so every batch writes a
/// disjoint set of refined vertices and batches can be evaluated in any order
/// or concurrently. An empty batch (`start == end`) is valid and does nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, derive_more::Display)]
#[display("[{start}, {end})")]
pub struct KernelBatch {
    start: usize,
    end: usize,
}

impl KernelBatch {
    /// Create a batch covering stencils `start..end`.
    ///
    /// # Panics
    ///
    /// If `start > end`.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "KernelBatch start {start} is past end {end}");
        Self { start, end }
    }

    /// A single batch covering every stencil in `table`.
    #[inline]
    pub fn whole(table: &StencilTable) -> Self {
        Self::new(0, table.len())
    }

    /// Index of the first stencil in the batch.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the index of the last stencil in the batch.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the number of stencils in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Split `0..len` into at most `batch_count` batches of near equal size.
    ///
    /// Batch lengths differ by at most one, none is empty and together they
    /// cover `0..len` in order.
    ///
    /// # Panics
    ///
    /// If `batch_count` is zero.
    pub fn partition(len: usize, batch_count: usize) -> Vec<KernelBatch> {
        assert!(batch_count > 0, "cannot partition into zero batches");

        let batch_count = batch_count.min(len);
        if batch_count == 0 {
            return Vec::new();
        }

        let base = len / batch_count;
        let remainder = len % batch_count;

        let mut start = 0;
        (0..batch_count)
            .map(|i| {
                let end = start + base + usize::from(i < remainder);
                let batch = KernelBatch::new(start, end);
                start = end;
                batch
            })
            .collect()
    }

    /// Split `0..len` into batches of at most `max_batch_len` stencils.
    ///
    /// # Panics
    ///
    /// If `max_batch_len` is zero.
    pub fn chunks(len: usize, max_batch_len: usize) -> Vec<KernelBatch> {
        assert!(max_batch_len > 0, "batch length must be non-zero");

        (0..len)
            .step_by(max_batch_len)
            .map(|start| KernelBatch::new(start, (start + max_batch_len).min(len)))
            .collect()
    }
}

impl From<Range<usize>> for KernelBatch {
    #[inline]
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}
