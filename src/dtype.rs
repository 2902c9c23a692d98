//! Element data types
//!
//! The closed set of element types a record may hold. The numeric codes are
//! part of the on-disk format and must never be renumbered.

use std::fmt;

/// Element type of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum DataType {
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,
    Float16 = 9,
    BFloat16 = 10,
    Float32 = 11,
    Float64 = 12,
    /// Signed 4-bit integer, two per byte
    Int4 = 13,
    /// Unsigned 4-bit integer, two per byte
    UInt4 = 14,
    /// Unsigned 1-bit integer, eight per byte
    UInt1 = 15,
    /// Unsigned 2-bit integer, four per byte
    UInt2 = 16,
}

impl DataType {
    /// Every supported type, in code order
    pub const ALL: [DataType; 16] = [
        DataType::Int8,
        DataType::UInt8,
        DataType::Int16,
        DataType::UInt16,
        DataType::Int32,
        DataType::UInt32,
        DataType::Int64,
        DataType::UInt64,
        DataType::Float16,
        DataType::BFloat16,
        DataType::Float32,
        DataType::Float64,
        DataType::Int4,
        DataType::UInt4,
        DataType::UInt1,
        DataType::UInt2,
    ];

    /// On-disk code
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Decode an on-disk code; `None` for anything outside the closed set
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|dt| dt.code() == code)
    }

    /// Width of one element in bits
    pub const fn bit_width(self) -> usize {
        match self {
            DataType::UInt1 => 1,
            DataType::UInt2 => 2,
            DataType::Int4 | DataType::UInt4 => 4,
            DataType::Int8 | DataType::UInt8 => 8,
            DataType::Int16 | DataType::UInt16 | DataType::Float16 | DataType::BFloat16 => 16,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 32,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => 64,
        }
    }

    /// True for types narrower than a byte
    pub const fn is_sub_byte(self) -> bool {
        self.bit_width() < 8
    }

    /// Bytes needed to store `count` elements, rounded up to a whole byte
    ///
    /// Returns `None` on overflow.
    pub fn byte_len(self, count: u64) -> Option<u64> {
        let bits = count.checked_mul(self.bit_width() as u64)?;
        Some(bits.div_ceil(8))
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::UInt8 => "uint8",
            DataType::Int16 => "int16",
            DataType::UInt16 => "uint16",
            DataType::Int32 => "int32",
            DataType::UInt32 => "uint32",
            DataType::Int64 => "int64",
            DataType::UInt64 => "uint64",
            DataType::Float16 => "float16",
            DataType::BFloat16 => "bfloat16",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Int4 => "int4",
            DataType::UInt4 => "uint4",
            DataType::UInt1 => "uint1",
            DataType::UInt2 => "uint2",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
