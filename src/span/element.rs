//! Element types a Span can hold
//!
//! A closed, sealed set mirroring `DataType`. Each element converts to and
//! from a raw little-endian bit pattern; `bits` does the addressing.

use std::fmt;

use half::{bf16, f16};

use crate::dtype::DataType;

use super::bits::sign_extend;

mod sealed {
    pub trait Sealed {}
}

/// A value that can be stored in a Span
pub trait Element: Copy + fmt::Debug + PartialEq + Send + Sync + 'static + sealed::Sealed {
    /// Stored data type
    const DATA_TYPE: DataType;

    /// Width in bits
    const BITS: usize = Self::DATA_TYPE.bit_width();

    /// Rebuild from the low `BITS` of `raw`
    fn from_raw(raw: u64) -> Self;

    /// Bit pattern, only the low `BITS` are meaningful
    fn to_raw(self) -> u64;
}

/// Byte-aligned element whose every bit pattern is a valid value
///
/// Slices of these can be viewed in place as bytes and back.
pub trait NativeElement: Element + bytemuck::Pod {}

macro_rules! impl_int_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dtype;

                fn from_raw(raw: u64) -> Self {
                    raw as $ty
                }

                fn to_raw(self) -> u64 {
                    self as u64
                }
            }

            impl NativeElement for $ty {}
        )*
    };
}

macro_rules! impl_float_element {
    ($($ty:ty => $dtype:ident as $bits:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dtype;

                fn from_raw(raw: u64) -> Self {
                    <$ty>::from_bits(raw as $bits)
                }

                fn to_raw(self) -> u64 {
                    self.to_bits() as u64
                }
            }

            impl NativeElement for $ty {}
        )*
    };
}

impl_int_element! {
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
}

impl_float_element! {
    f16 => Float16 as u16,
    bf16 => BFloat16 as u16,
    f32 => Float32 as u32,
    f64 => Float64 as u64,
}

// =============================================================================
// Sub-byte Integers
// =============================================================================

/// Signed 4-bit integer in `[-8, 7]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Int4(i8);

impl Int4 {
    pub const MIN: Int4 = Int4(-8);
    pub const MAX: Int4 = Int4(7);

    /// `None` if `value` does not fit in 4 bits
    pub fn new(value: i8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0).contains(&value).then_some(Self(value))
    }

    /// Keep the low nibble of `value`, sign-extended
    pub fn wrapping(value: i8) -> Self {
        Self(sign_extend(u64::from(value as u8 & 0x0F), 4) as i8)
    }

    pub fn get(self) -> i8 {
        self.0
    }
}

impl From<Int4> for i8 {
    fn from(value: Int4) -> Self {
        value.0
    }
}

impl fmt::Display for Int4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl sealed::Sealed for Int4 {}

impl Element for Int4 {
    const DATA_TYPE: DataType = DataType::Int4;

    fn from_raw(raw: u64) -> Self {
        Self(sign_extend(raw & 0x0F, 4) as i8)
    }

    fn to_raw(self) -> u64 {
        u64::from(self.0 as u8 & 0x0F)
    }
}

/// Unsigned integers narrower than a byte, stored low bits first
macro_rules! impl_sub_byte_uint {
    ($($(#[$doc:meta])* $name:ident => $dtype:ident, $bits:literal;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
            pub struct $name(u8);

            impl $name {
                const MASK: u8 = (1 << $bits) - 1;

                pub const MIN: $name = $name(0);
                pub const MAX: $name = $name(Self::MASK);

                #[doc = concat!("`None` if `value` does not fit in ", $bits, " bits")]
                pub fn new(value: u8) -> Option<Self> {
                    (value <= Self::MASK).then_some(Self(value))
                }

                #[doc = concat!("Keep the low ", $bits, " bits of `value`")]
                pub fn wrapping(value: u8) -> Self {
                    Self(value & Self::MASK)
                }

                pub fn get(self) -> u8 {
                    self.0
                }
            }

            impl From<$name> for u8 {
                fn from(value: $name) -> Self {
                    value.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl sealed::Sealed for $name {}

            impl Element for $name {
                const DATA_TYPE: DataType = DataType::$dtype;

                fn from_raw(raw: u64) -> Self {
                    Self(raw as u8 & Self::MASK)
                }

                fn to_raw(self) -> u64 {
                    u64::from(self.0)
                }
            }
        )*
    };
}

impl_sub_byte_uint! {
    /// Unsigned 4-bit integer in `[0, 15]`
    UInt4 => UInt4, 4;
    /// Unsigned 2-bit integer in `[0, 3]`
    UInt2 => UInt2, 2;
    /// Single bit, `0` or `1`
    UInt1 => UInt1, 1;
}
