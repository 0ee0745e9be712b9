//! Table of subdivision stencils.
//!
//! A stencil assigns a series of control vertex indices with a blending weight
//! to one refined vertex. When the control vertices move in space, the refined
//! vertex can be very efficiently recomputed simply by applying the blending
//! weights to the series of coarse control vertices.
//!
//! The table stores all stencils flattened: `sizes[i]` pairs starting at
//! `offsets[i]` inside `control_indices` and `weights` belong to stencil `i`.
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{Error, Index, Result};

/// Gives read access to a single stencil in a [`StencilTable`].
#[derive(Clone, Copy, Debug)]
pub struct Stencil<'a> {
    indices: &'a [Index],
    weights: &'a [f32],
}

impl<'a> Stencil<'a> {
    /// Returns the indices of the control vertices.
    #[inline]
    pub fn indices(&self) -> &'a [Index] {
        self.indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &'a [f32] {
        self.weights
    }

    /// Returns the number of control vertices blended by this stencil.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates `(control index, weight)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, f32)> + 'a {
        self.indices.iter().copied().zip(self.weights.iter().copied())
    }
}

/// Container for stencil data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StencilTable {
    control_vertex_count: usize,
    sizes: Vec<u32>,
    offsets: Vec<Index>,
    control_indices: Vec<Index>,
    weights: Vec<f32>,
}

impl StencilTable {
    /// Create a new stencil table from per-stencil sizes and the flattened
    /// indices and weights.
    ///
    /// Offsets are computed as the running sum of `sizes`.
    pub fn new(
        control_vertex_count: usize,
        sizes: Vec<u32>,
        control_indices: Vec<Index>,
        weights: Vec<f32>,
    ) -> Result<StencilTable> {
        let mut offsets = Vec::with_capacity(sizes.len());
        let mut offset = 0usize;
        for &size in &sizes {
            offsets.push(Index::from(offset));
            offset += size as usize;
        }

        Self::with_offsets(control_vertex_count, sizes, offsets, control_indices, weights)
    }

    /// Create a new stencil table with explicit offsets.
    pub fn with_offsets(
        control_vertex_count: usize,
        sizes: Vec<u32>,
        offsets: Vec<Index>,
        control_indices: Vec<Index>,
        weights: Vec<f32>,
    ) -> Result<StencilTable> {
        let table = StencilTable {
            control_vertex_count,
            sizes,
            offsets,
            control_indices,
            weights,
        };
        table.validate()?;

        Ok(table)
    }

    /// Create a new stencil table from a sequence of `(indices, weights)`
    /// runs, one per stencil.
    pub fn from_stencils<'s, I>(control_vertex_count: usize, stencils: I) -> Result<StencilTable>
    where
        I: IntoIterator<Item = (&'s [Index], &'s [f32])>,
    {
        let mut sizes = Vec::new();
        let mut control_indices = Vec::new();
        let mut weights = Vec::new();

        for (i, (indices, stencil_weights)) in stencils.into_iter().enumerate() {
            if indices.len() != stencil_weights.len() {
                return Err(Error::StencilTableMismatch(format!(
                    "stencil {i} has {} indices but {} weights",
                    indices.len(),
                    stencil_weights.len()
                )));
            }
            sizes.push(indices.len() as u32);
            control_indices.extend_from_slice(indices);
            weights.extend_from_slice(stencil_weights);
        }

        Self::new(control_vertex_count, sizes, control_indices, weights)
    }

    fn validate(&self) -> Result<()> {
        if self.sizes.len() != self.offsets.len() {
            return Err(Error::StencilTableMismatch(format!(
                "{} sizes but {} offsets",
                self.sizes.len(),
                self.offsets.len()
            )));
        }

        if self.control_indices.len() != self.weights.len() {
            return Err(Error::StencilTableMismatch(format!(
                "{} control indices but {} weights",
                self.control_indices.len(),
                self.weights.len()
            )));
        }

        for (i, (&size, &offset)) in self.sizes.iter().zip(&self.offsets).enumerate() {
            let end = usize::from(offset) + size as usize;
            if end > self.control_indices.len() {
                return Err(Error::StencilTableMismatch(format!(
                    "stencil {i} ends at {end}, past {} control indices",
                    self.control_indices.len()
                )));
            }
        }

        self.validate_control_indices()
    }

    #[cfg(feature = "stencil_validation")]
    fn validate_control_indices(&self) -> Result<()> {
        match self
            .control_indices
            .iter()
            .find(|&&index| usize::from(index) >= self.control_vertex_count)
        {
            Some(&index) => Err(Error::IndexOutOfBounds {
                index: index.into(),
                max: self.control_vertex_count,
            }),
            None => Ok(()),
        }
    }

    #[cfg(not(feature = "stencil_validation"))]
    #[inline]
    fn validate_control_indices(&self) -> Result<()> {
        Ok(())
    }

    /// Returns the number of stencils in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Returns the number of control vertices indexed in the table.
    #[inline]
    pub fn control_vertex_count(&self) -> usize {
        self.control_vertex_count
    }

    /// Returns a Stencil at index i in the table.
    #[inline]
    pub fn stencil(&self, i: Index) -> Option<Stencil<'_>> {
        let i = usize::from(i);
        let size = *self.sizes.get(i)? as usize;
        let start = usize::from(self.offsets[i]);

        Some(Stencil {
            indices: &self.control_indices[start..start + size],
            weights: &self.weights[start..start + size],
        })
    }

    /// Returns the number of control vertices of each stencil in the table.
    #[inline]
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the offset to a given stencil.
    #[inline]
    pub fn offsets(&self) -> &[Index] {
        &self.offsets
    }

    /// Returns the indices of the control vertices.
    #[inline]
    pub fn control_indices(&self) -> &[Index] {
        &self.control_indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

/// The attribute class a [`StencilTable`] refines.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum InterpolationMode {
    /// Primary per-vertex data, e.g. positions.
    Vertex = 0,
    /// Secondary data refined with its own (usually bilinear) stencils.
    Varying,
}

impl InterpolationMode {
    /// Both classes in dispatch order.
    pub const ALL: [InterpolationMode; 2] = [InterpolationMode::Vertex, InterpolationMode::Varying];
}
