//! SpanCast
//!
//! Reinterpret a span of `T` as a span of `U` over the same bytes. Only the
//! last dimension changes: its bit length is re-divided by `U::BITS`.
//! Nothing is copied.

use crate::error::{BlobError, Result};

use super::element::Element;
use super::layout::Layout;
use super::view::{Span, SpanMut};

/// Layout of a `T` view reinterpreted as `U`
fn cast_layout<T: Element, U: Element>(layout: &Layout) -> Result<Layout> {
    if layout.rank() == 0 {
        return Err(BlobError::IncompatibleCast(
            "cannot reinterpret a rank-0 span".to_string(),
        ));
    }
    if !layout.is_contiguous() {
        return Err(BlobError::IncompatibleCast(format!(
            "span with shape {:?} and strides {:?} is not contiguous",
            layout.dims(),
            layout.strides()
        )));
    }

    let start_bits = layout.offset() * T::BITS;
    if start_bits % U::BITS != 0 {
        return Err(BlobError::IncompatibleCast(format!(
            "start bit {} is not a multiple of {} ({} bits)",
            start_bits,
            U::DATA_TYPE,
            U::BITS
        )));
    }

    let last = layout.rank() - 1;
    let last_bits = layout.dims()[last] * T::BITS;
    if last_bits % U::BITS != 0 {
        return Err(BlobError::IncompatibleCast(format!(
            "last dimension of {} bits does not divide into {} ({} bits)",
            last_bits,
            U::DATA_TYPE,
            U::BITS
        )));
    }

    let mut dims = layout.dims().to_vec();
    dims[last] = last_bits / U::BITS;
    Layout::row_major_at(&dims, start_bits / U::BITS)
}

impl<'a, T: Element> Span<'a, T> {
    /// View the same bytes as elements of `U`
    ///
    /// Fails with `IncompatibleCast` unless the span is contiguous, starts on
    /// a `U` boundary and its last dimension holds a whole number of `U`.
    pub fn cast<U: Element>(&self) -> Result<Span<'a, U>> {
        let layout = cast_layout::<T, U>(self.layout())?;
        Ok(Span::from_parts(self.backing(), layout))
    }
}

impl<'a, T: Element> SpanMut<'a, T> {
    /// Mutable view of the same bytes as elements of `U`
    pub fn cast<U: Element>(&self) -> Result<SpanMut<'a, U>> {
        let layout = cast_layout::<T, U>(self.layout())?;
        Ok(SpanMut::from_parts(self.cells(), layout))
    }
}
