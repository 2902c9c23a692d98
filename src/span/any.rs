//! Type-erased span
//!
//! A record's element type is only known at run time; `AnySpan` carries the
//! matching typed span so callers can dispatch with one `match`.

use half::{bf16, f16};

use crate::dtype::DataType;
use crate::error::Result;

use super::element::{Int4, UInt1, UInt2, UInt4};
use super::view::Span;

/// A span of whichever element type a record stores
#[derive(Debug, Clone, Copy)]
pub enum AnySpan<'a> {
    Int8(Span<'a, i8>),
    UInt8(Span<'a, u8>),
    Int16(Span<'a, i16>),
    UInt16(Span<'a, u16>),
    Int32(Span<'a, i32>),
    UInt32(Span<'a, u32>),
    Int64(Span<'a, i64>),
    UInt64(Span<'a, u64>),
    Float16(Span<'a, f16>),
    BFloat16(Span<'a, bf16>),
    Float32(Span<'a, f32>),
    Float64(Span<'a, f64>),
    Int4(Span<'a, Int4>),
    UInt4(Span<'a, UInt4>),
    UInt1(Span<'a, UInt1>),
    UInt2(Span<'a, UInt2>),
}

/// Apply `$body` to the inner span, whatever its element type
macro_rules! with_span {
    ($any:expr, $span:ident => $body:expr) => {
        match $any {
            AnySpan::Int8($span) => $body,
            AnySpan::UInt8($span) => $body,
            AnySpan::Int16($span) => $body,
            AnySpan::UInt16($span) => $body,
            AnySpan::Int32($span) => $body,
            AnySpan::UInt32($span) => $body,
            AnySpan::Int64($span) => $body,
            AnySpan::UInt64($span) => $body,
            AnySpan::Float16($span) => $body,
            AnySpan::BFloat16($span) => $body,
            AnySpan::Float32($span) => $body,
            AnySpan::Float64($span) => $body,
            AnySpan::Int4($span) => $body,
            AnySpan::UInt4($span) => $body,
            AnySpan::UInt1($span) => $body,
            AnySpan::UInt2($span) => $body,
        }
    };
}

impl<'a> AnySpan<'a> {
    /// Typed view of `shape` over `bytes`, chosen by `data_type`
    pub fn new(data_type: DataType, bytes: &'a [u8], shape: &[usize]) -> Result<Self> {
        Ok(match data_type {
            DataType::Int8 => AnySpan::Int8(Span::new(bytes, shape)?),
            DataType::UInt8 => AnySpan::UInt8(Span::new(bytes, shape)?),
            DataType::Int16 => AnySpan::Int16(Span::new(bytes, shape)?),
            DataType::UInt16 => AnySpan::UInt16(Span::new(bytes, shape)?),
            DataType::Int32 => AnySpan::Int32(Span::new(bytes, shape)?),
            DataType::UInt32 => AnySpan::UInt32(Span::new(bytes, shape)?),
            DataType::Int64 => AnySpan::Int64(Span::new(bytes, shape)?),
            DataType::UInt64 => AnySpan::UInt64(Span::new(bytes, shape)?),
            DataType::Float16 => AnySpan::Float16(Span::new(bytes, shape)?),
            DataType::BFloat16 => AnySpan::BFloat16(Span::new(bytes, shape)?),
            DataType::Float32 => AnySpan::Float32(Span::new(bytes, shape)?),
            DataType::Float64 => AnySpan::Float64(Span::new(bytes, shape)?),
            DataType::Int4 => AnySpan::Int4(Span::new(bytes, shape)?),
            DataType::UInt4 => AnySpan::UInt4(Span::new(bytes, shape)?),
            DataType::UInt1 => AnySpan::UInt1(Span::new(bytes, shape)?),
            DataType::UInt2 => AnySpan::UInt2(Span::new(bytes, shape)?),
        })
    }

    pub fn data_type(&self) -> DataType {
        with_span!(self, span => span.data_type())
    }

    pub fn len(&self) -> usize {
        with_span!(self, span => span.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> &[usize] {
        with_span!(self, span => span.shape())
    }

    /// Up to `limit` elements rendered with `Display`, in row-major order
    pub fn format_values(&self, limit: usize) -> Vec<String> {
        with_span!(self, span => match span.values() {
            Ok(values) => values.take(limit).map(|v| v.to_string()).collect(),
            Err(_) => vec![span.value().to_string()],
        })
    }
}
