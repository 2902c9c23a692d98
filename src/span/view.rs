//! Span and SpanMut
//!
//! Both are `Copy` descriptors (layout + borrowed bytes). Copying duplicates
//! the view, never the data. `SpanMut` writes through `Cell<u8>`, so every
//! copy of a mutable view sees the same bytes, including two 4-bit elements
//! that share one byte.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use bytes::{Bytes, BytesMut};

use crate::dtype::DataType;
use crate::error::{BlobError, Result};

use super::bits::{bytes_for, read_raw, write_raw, ByteSource};
use super::element::{Element, NativeElement};
use super::iter::{Rows, RowsMut, Values, ValuesMut};
use super::layout::Layout;

/// Bytes a read-only Span points into
#[derive(Clone, Copy)]
pub(crate) enum Backing<'a> {
    Plain(&'a [u8]),
    Cells(&'a [Cell<u8>]),
}

impl ByteSource for Backing<'_> {
    fn load(&self, index: usize) -> u8 {
        match self {
            Backing::Plain(bytes) => bytes[index],
            Backing::Cells(cells) => cells[index].get(),
        }
    }

    fn as_plain(&self) -> Option<&[u8]> {
        match self {
            Backing::Plain(bytes) => Some(*bytes),
            Backing::Cells(_) => None,
        }
    }
}

impl Backing<'_> {
    fn byte_len(&self) -> usize {
        match self {
            Backing::Plain(bytes) => bytes.len(),
            Backing::Cells(cells) => cells.len(),
        }
    }
}

/// Row-major layout of `shape`, checked against `byte_len` bytes of storage
fn sized_layout<T: Element>(shape: &[usize], byte_len: usize) -> Result<Layout> {
    let too_small = |expected: u64| BlobError::SizeMismatch {
        expected,
        actual: byte_len as u64,
    };

    let layout = Layout::row_major(shape).map_err(|err| match err {
        BlobError::SizeMismatch { expected, .. } => too_small(expected),
        other => other,
    })?;

    let needed = layout
        .extent()
        .checked_mul(T::BITS)
        .map(|bits| bits.div_ceil(8))
        .ok_or_else(|| too_small(u64::MAX))?;
    if needed > byte_len {
        return Err(too_small(needed as u64));
    }
    Ok(layout)
}

fn native_bytes<T: NativeElement>(values: &[T]) -> &[u8] {
    bytemuck::cast_slice(values)
}

fn native_cells<T: NativeElement>(values: &mut [T]) -> &[Cell<u8>] {
    Cell::from_mut(bytemuck::cast_slice_mut::<T, u8>(values)).as_slice_of_cells()
}

fn panic_out_of_bounds(index: &[usize], shape: &[usize]) -> ! {
    panic!("span index {index:?} out of bounds for shape {shape:?}")
}

// =============================================================================
// Span
// =============================================================================

/// Read-only, strided, typed view over bytes it does not own
#[derive(Clone, Copy)]
pub struct Span<'a, T: Element> {
    backing: Backing<'a>,
    layout: Layout,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> Span<'a, T> {
    /// View `bytes` as a row-major array of `shape`
    pub fn new(bytes: &'a [u8], shape: &[usize]) -> Result<Self> {
        let layout = sized_layout::<T>(shape, bytes.len())?;
        Ok(Self::from_parts(Backing::Plain(bytes), layout))
    }

    /// One-dimensional view over every element `bytes` can hold
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        let len = bytes.len() * 8 / T::BITS;
        Self::from_parts(Backing::Plain(bytes), Layout::vector(len))
    }

    pub(crate) fn from_parts(backing: Backing<'a>, layout: Layout) -> Self {
        Self {
            backing,
            layout,
            _marker: PhantomData,
        }
    }

    pub(crate) fn backing(&self) -> Backing<'a> {
        self.backing
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.dims()
    }

    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    /// Total element count
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Element at `index`
    ///
    /// # Panics
    /// If the index length differs from the rank or any index is out of bounds.
    pub fn at(&self, index: &[usize]) -> T {
        self.get(index)
            .unwrap_or_else(|| panic_out_of_bounds(index, self.shape()))
    }

    /// Element at `index`, `None` when out of bounds
    pub fn get(&self, index: &[usize]) -> Option<T> {
        let linear = self.layout.linear(index)?;
        Some(T::from_raw(read_raw(&self.backing, linear, T::BITS)))
    }

    /// The single element of a one-element view (e.g. a rank-0 row)
    ///
    /// # Panics
    /// If the view does not hold exactly one element.
    pub fn value(&self) -> T {
        assert_eq!(self.len(), 1, "value() on a span of {} elements", self.len());
        T::from_raw(read_raw(&self.backing, self.layout.nth(0), T::BITS))
    }

    /// Restrict `dim` to `[lower, upper)`
    pub fn slice(&self, dim: usize, lower: usize, upper: usize) -> Result<Self> {
        Ok(Self::from_parts(self.backing, self.layout.slice(dim, lower, upper)?))
    }

    /// Restrict `dim` to `[lower, end)`
    pub fn slice_from(&self, dim: usize, lower: usize) -> Result<Self> {
        let upper = self.dim_size(dim)?;
        self.slice(dim, lower, upper)
    }

    /// Whole of `dim` (validates the dimension only)
    pub fn slice_full(&self, dim: usize) -> Result<Self> {
        self.slice_from(dim, 0)
    }

    fn dim_size(&self, dim: usize) -> Result<usize> {
        self.shape()
            .get(dim)
            .copied()
            .ok_or(BlobError::InvalidDimension {
                dim,
                rank: self.rank(),
            })
    }

    /// All elements in row-major order
    pub fn values(&self) -> Result<Values<'a, T>> {
        if self.rank() == 0 {
            return Err(BlobError::NotIterable);
        }
        Ok(Values::new(self.backing, self.layout))
    }

    /// Sub-spans one rank lower, along the outermost dimension
    pub fn rows(&self) -> Result<Rows<'a, T>> {
        if self.rank() == 0 {
            return Err(BlobError::NotIterable);
        }
        Ok(Rows::new(self.backing, self.layout))
    }

    /// Elements copied out in row-major order
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.len())
            .map(|k| T::from_raw(read_raw(&self.backing, self.layout.nth(k), T::BITS)))
            .collect()
    }

    /// Borrowed payload bytes, when the view is dense and byte-aligned
    pub fn contiguous_bytes(&self) -> Option<&'a [u8]> {
        let Backing::Plain(bytes) = self.backing else {
            return None;
        };
        if !self.layout.is_contiguous() {
            return None;
        }
        let start_bit = self.layout.offset() * T::BITS;
        let bit_len = self.len() * T::BITS;
        if start_bit % 8 != 0 {
            return None;
        }
        let start = start_bit / 8;
        bytes.get(start..start + bit_len.div_ceil(8))
    }

    /// Dense row-major copy of the elements, sub-byte types packed
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::zeroed(bytes_for(self.len(), T::BITS));
        {
            let cells = Cell::from_mut(&mut out[..]).as_slice_of_cells();
            for k in 0..self.len() {
                let raw = read_raw(&self.backing, self.layout.nth(k), T::BITS);
                write_raw(cells, k, T::BITS, raw);
            }
        }
        out.freeze()
    }
}

impl<'a, T: NativeElement> Span<'a, T> {
    /// One-dimensional view over a typed slice
    pub fn from_slice(values: &'a [T]) -> Self {
        Self::from_parts(Backing::Plain(native_bytes(values)), Layout::vector(values.len()))
    }

    /// One-dimensional view whose size is fixed by the array type
    pub fn from_array<const N: usize>(values: &'a [T; N]) -> Self {
        Self::from_slice(values)
    }

    /// Two-dimensional `[R, C]` view whose shape is fixed by the array type
    pub fn from_matrix<const R: usize, const C: usize>(values: &'a [[T; C]; R]) -> Self {
        Self::from_parts(Backing::Plain(native_bytes(values.as_flattened())), Layout::matrix(R, C))
    }

    /// Zero-copy typed slice, when the view is dense and the bytes are aligned for `T`
    pub fn as_slice(&self) -> Option<&'a [T]> {
        bytemuck::try_cast_slice(self.contiguous_bytes()?).ok()
    }
}

impl<T: Element> Default for Span<'_, T> {
    /// Empty one-dimensional span
    fn default() -> Self {
        Self::from_bytes(&[])
    }
}

impl<T: Element> fmt::Debug for Span<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("data_type", &T::DATA_TYPE)
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("offset", &self.layout.offset())
            .field("backing_len", &self.backing.byte_len())
            .finish()
    }
}

// =============================================================================
// SpanMut
// =============================================================================

/// Mutable, strided, typed view over bytes it does not own
///
/// Copies of a `SpanMut` alias the same bytes; `set` takes `&self`.
#[derive(Clone, Copy)]
pub struct SpanMut<'a, T: Element> {
    cells: &'a [Cell<u8>],
    layout: Layout,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> SpanMut<'a, T> {
    /// Mutable row-major view of `shape` over `bytes`
    pub fn new(bytes: &'a mut [u8], shape: &[usize]) -> Result<Self> {
        let layout = sized_layout::<T>(shape, bytes.len())?;
        Ok(Self::from_parts(Cell::from_mut(bytes).as_slice_of_cells(), layout))
    }

    /// One-dimensional mutable view over every element `bytes` can hold
    pub fn from_bytes(bytes: &'a mut [u8]) -> Self {
        let len = bytes.len() * 8 / T::BITS;
        Self::from_parts(Cell::from_mut(bytes).as_slice_of_cells(), Layout::vector(len))
    }

    pub(crate) fn from_parts(cells: &'a [Cell<u8>], layout: Layout) -> Self {
        Self {
            cells,
            layout,
            _marker: PhantomData,
        }
    }

    pub(crate) fn cells(&self) -> &'a [Cell<u8>] {
        self.cells
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Read-only view of the same bytes
    pub fn as_span(&self) -> Span<'a, T> {
        Span::from_parts(Backing::Cells(self.cells), self.layout)
    }

    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.dims()
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// # Panics
    /// If the index length differs from the rank or any index is out of bounds.
    pub fn at(&self, index: &[usize]) -> T {
        self.as_span().at(index)
    }

    pub fn get(&self, index: &[usize]) -> Option<T> {
        self.as_span().get(index)
    }

    pub fn value(&self) -> T {
        self.as_span().value()
    }

    /// Write `value` at `index`
    ///
    /// # Panics
    /// If the index length differs from the rank or any index is out of bounds.
    pub fn set(&self, index: &[usize], value: T) {
        let linear = self
            .layout
            .linear(index)
            .unwrap_or_else(|| panic_out_of_bounds(index, self.shape()));
        write_raw(self.cells, linear, T::BITS, value.to_raw());
    }

    /// Write `value` to every element of the view
    pub fn fill(&self, value: T) {
        for k in 0..self.len() {
            write_raw(self.cells, self.layout.nth(k), T::BITS, value.to_raw());
        }
    }

    /// Copy `source` element-wise into this view; shapes must match
    ///
    /// `source` may overlap this view (e.g. a shifted slice of the same
    /// `SpanMut`); the result is as if it were copied out first.
    pub fn copy_from(&self, source: &Span<'_, T>) -> Result<()> {
        if source.shape() != self.shape() {
            return Err(BlobError::SizeMismatch {
                expected: self.len() as u64,
                actual: source.len() as u64,
            });
        }

        // Only cell-backed sources can share bytes with `self.cells`
        let staged;
        let (backing, layout) = match source.backing() {
            Backing::Cells(_) => {
                staged = source.to_bytes();
                (Backing::Plain(&staged[..]), Layout::vector(source.len()))
            }
            plain => (plain, *source.layout()),
        };

        for k in 0..self.len() {
            let raw = read_raw(&backing, layout.nth(k), T::BITS);
            write_raw(self.cells, self.layout.nth(k), T::BITS, raw);
        }
        Ok(())
    }

    pub fn slice(&self, dim: usize, lower: usize, upper: usize) -> Result<Self> {
        Ok(Self::from_parts(self.cells, self.layout.slice(dim, lower, upper)?))
    }

    pub fn slice_from(&self, dim: usize, lower: usize) -> Result<Self> {
        let upper = self.as_span().dim_size(dim)?;
        self.slice(dim, lower, upper)
    }

    pub fn slice_full(&self, dim: usize) -> Result<Self> {
        self.slice_from(dim, 0)
    }

    /// Read-only element iteration
    pub fn values(&self) -> Result<Values<'a, T>> {
        self.as_span().values()
    }

    /// Read-only row iteration
    pub fn rows(&self) -> Result<Rows<'a, T>> {
        self.as_span().rows()
    }

    /// Writable element handles in row-major order
    pub fn values_mut(&self) -> Result<ValuesMut<'a, T>> {
        if self.rank() == 0 {
            return Err(BlobError::NotIterable);
        }
        Ok(ValuesMut::new(self.cells, self.layout))
    }

    /// Mutable sub-spans one rank lower, along the outermost dimension
    pub fn rows_mut(&self) -> Result<RowsMut<'a, T>> {
        if self.rank() == 0 {
            return Err(BlobError::NotIterable);
        }
        Ok(RowsMut::new(self.cells, self.layout))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_span().to_vec()
    }
}

impl<'a, T: NativeElement> SpanMut<'a, T> {
    /// One-dimensional mutable view over a typed slice
    pub fn from_slice(values: &'a mut [T]) -> Self {
        let len = values.len();
        Self::from_parts(native_cells(values), Layout::vector(len))
    }

    pub fn from_array<const N: usize>(values: &'a mut [T; N]) -> Self {
        Self::from_slice(values)
    }

    pub fn from_matrix<const R: usize, const C: usize>(values: &'a mut [[T; C]; R]) -> Self {
        Self::from_parts(native_cells(values.as_flattened_mut()), Layout::matrix(R, C))
    }
}

impl<'a, T: Element> From<SpanMut<'a, T>> for Span<'a, T> {
    fn from(span: SpanMut<'a, T>) -> Self {
        span.as_span()
    }
}

impl<T: Element> fmt::Debug for SpanMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanMut")
            .field("data_type", &T::DATA_TYPE)
            .field("shape", &self.shape())
            .field("offset", &self.layout.offset())
            .finish()
    }
}
