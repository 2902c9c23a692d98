//! Span Module
//!
//! Typed, strided, multi-dimensional views over bytes owned elsewhere
//! (a mapped blob file, or a caller's buffer).
//!
//! ## Layering
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Span / SpanMut / AnySpan    (view.rs, any.rs)│
//! ├──────────────────────────────────────────────┤
//! │ Layout: shape, strides, slicing (layout.rs)  │  counted in elements
//! ├──────────────────────────────────────────────┤
//! │ Addressing: element → (byte, bit)  (bits.rs) │  the only bit math
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Sub-byte elements are packed low bits first: for 4-bit types element `2k`
//! is the low nibble of byte `k`, for 1-bit types element `8k` is bit 0.

mod any;
mod bits;
mod cast;
mod element;
mod iter;
mod layout;
mod view;

use std::cell::Cell;

use bytes::{Bytes, BytesMut};

pub use any::AnySpan;
pub use element::{Element, Int4, NativeElement, UInt1, UInt2, UInt4};
pub use iter::{ElementMut, Rows, RowsMut, Values, ValuesMut};
pub use layout::{Layout, MAX_RANK};
pub use view::{Span, SpanMut};

/// Pack `values` densely into a new buffer (sub-byte types share bytes)
pub fn pack<T: Element>(values: &[T]) -> Bytes {
    let mut out = BytesMut::zeroed(bits::bytes_for(values.len(), T::BITS));
    {
        let cells = Cell::from_mut(&mut out[..]).as_slice_of_cells();
        for (index, value) in values.iter().enumerate() {
            bits::write_raw(cells, index, T::BITS, value.to_raw());
        }
    }
    out.freeze()
}
