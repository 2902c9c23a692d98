//! Shape and stride bookkeeping
//!
//! Everything here is counted in elements, never bytes or bits, so slicing
//! and iteration are identical for byte-aligned and sub-byte types.

use crate::error::{BlobError, Result};

/// Highest supported rank
pub const MAX_RANK: usize = 8;

/// Offset, shape and strides of a view, in elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    rank: usize,
    dims: [usize; MAX_RANK],
    strides: [usize; MAX_RANK],
    offset: usize,
}

impl Layout {
    /// Row-major layout for `shape`, starting at element 0
    pub fn row_major(shape: &[usize]) -> Result<Self> {
        Self::row_major_at(shape, 0)
    }

    /// Row-major layout for `shape`, starting at element `offset`
    ///
    /// Fails with `SizeMismatch` (expected `u64::MAX`) when the highest element
    /// index would not fit in a `usize`. Every other method relies on this
    /// bound and does plain arithmetic.
    pub fn row_major_at(shape: &[usize], offset: usize) -> Result<Self> {
        if shape.is_empty() || shape.len() > MAX_RANK {
            return Err(BlobError::InvalidDimension {
                dim: shape.len(),
                rank: MAX_RANK,
            });
        }

        let overflow = || BlobError::SizeMismatch {
            expected: u64::MAX,
            actual: 0,
        };

        let mut dims = [0; MAX_RANK];
        let mut strides = [0; MAX_RANK];
        let mut stride: usize = 1;
        for d in (0..shape.len()).rev() {
            dims[d] = shape[d];
            strides[d] = stride;
            stride = stride.checked_mul(shape[d].max(1)).ok_or_else(overflow)?;
        }
        // `stride` now bounds the element count, and so the extent
        offset.checked_add(stride).ok_or_else(overflow)?;

        Ok(Self {
            rank: shape.len(),
            dims,
            strides,
            offset,
        })
    }

    /// One-dimensional layout of `len` elements
    pub fn vector(len: usize) -> Self {
        let mut dims = [0; MAX_RANK];
        let mut strides = [0; MAX_RANK];
        dims[0] = len;
        strides[0] = 1;
        Self {
            rank: 1,
            dims,
            strides,
            offset: 0,
        }
    }

    /// Row-major `[rows, cols]` layout
    pub fn matrix(rows: usize, cols: usize) -> Self {
        let mut layout = Self::vector(rows);
        layout.rank = 2;
        layout.dims[1] = cols;
        layout.strides[0] = cols.max(1);
        layout.strides[1] = 1;
        layout
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.rank]
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides[..self.rank]
    }

    /// Element index of the first element
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements (1 for rank 0)
    pub fn len(&self) -> usize {
        self.dims().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the highest element index this layout can touch
    pub fn extent(&self) -> usize {
        if self.is_empty() {
            return self.offset;
        }
        let last: usize = self
            .dims()
            .iter()
            .zip(self.strides())
            .map(|(dim, stride)| (dim - 1) * stride)
            .sum();
        self.offset + last + 1
    }

    /// Element index for a multi-dimensional index, `None` if out of bounds
    pub fn linear(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.rank {
            return None;
        }
        let mut linear = self.offset;
        for ((&i, &dim), &stride) in index.iter().zip(self.dims()).zip(self.strides()) {
            if i >= dim {
                return None;
            }
            linear += i * stride;
        }
        Some(linear)
    }

    /// Element index of the `k`-th element in row-major order
    pub fn nth(&self, k: usize) -> usize {
        let mut remaining = k;
        let mut linear = self.offset;
        for d in (0..self.rank).rev() {
            let dim = self.dims[d];
            linear += (remaining % dim) * self.strides[d];
            remaining /= dim;
        }
        linear
    }

    /// Restrict dimension `dim` to `[lower, upper)`
    pub fn slice(&self, dim: usize, lower: usize, upper: usize) -> Result<Self> {
        if dim >= self.rank {
            return Err(BlobError::InvalidDimension {
                dim,
                rank: self.rank,
            });
        }
        let size = self.dims[dim];
        if lower > upper || upper > size {
            return Err(BlobError::InvalidSliceBounds { lower, upper, size });
        }

        let mut sliced = *self;
        sliced.dims[dim] = upper - lower;
        sliced.offset += lower * self.strides[dim];
        Ok(sliced)
    }

    /// Drop the outermost dimension, fixing it at `index`
    ///
    /// Callers guarantee `rank > 0` and `index < dims[0]`.
    pub fn row(&self, index: usize) -> Self {
        debug_assert!(self.rank > 0 && index < self.dims[0]);

        let mut dims = [0; MAX_RANK];
        let mut strides = [0; MAX_RANK];
        dims[..self.rank - 1].copy_from_slice(&self.dims[1..self.rank]);
        strides[..self.rank - 1].copy_from_slice(&self.strides[1..self.rank]);

        Self {
            rank: self.rank - 1,
            dims,
            strides,
            offset: self.offset + index * self.strides[0],
        }
    }

    /// True when elements are laid out densely in row-major order
    pub fn is_contiguous(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut expected = 1;
        for d in (0..self.rank).rev() {
            if self.dims[d] != 1 && self.strides[d] != expected {
                return false;
            }
            expected *= self.dims[d];
        }
        true
    }
}
