//! Element addressing on top of byte storage
//!
//! The only place that knows about bit offsets. An element index becomes a
//! `(byte, bit)` position; byte-aligned widths are assembled little-endian,
//! sub-byte widths are masked out of a single byte (low bits first).

use std::cell::Cell;

/// Readable byte storage
pub(crate) trait ByteSource {
    fn load(&self, index: usize) -> u8;

    /// Direct slice access, when the storage is a plain byte slice
    fn as_plain(&self) -> Option<&[u8]> {
        None
    }
}

/// Writable byte storage (interior mutability, so `&self`)
pub(crate) trait ByteSink: ByteSource {
    fn store(&self, index: usize, value: u8);
}

impl ByteSource for [u8] {
    fn load(&self, index: usize) -> u8 {
        self[index]
    }

    fn as_plain(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl ByteSource for [Cell<u8>] {
    fn load(&self, index: usize) -> u8 {
        self[index].get()
    }
}

impl ByteSink for [Cell<u8>] {
    fn store(&self, index: usize, value: u8) {
        self[index].set(value);
    }
}

/// Byte and bit position of element `index` for `bits`-wide elements
pub(crate) fn locate(index: usize, bits: usize) -> (usize, u32) {
    let bit = index * bits;
    (bit / 8, (bit % 8) as u32)
}

/// Bytes needed to hold `count` elements of `bits` width
pub(crate) fn bytes_for(count: usize, bits: usize) -> usize {
    (count * bits).div_ceil(8)
}

/// Raw bit pattern of element `index`, zero-extended
pub(crate) fn read_raw<S: ByteSource + ?Sized>(src: &S, index: usize, bits: usize) -> u64 {
    if bits % 8 == 0 {
        let width = bits / 8;
        let start = index * width;
        if let Some(plain) = src.as_plain() {
            let mut buf = [0u8; 8];
            buf[..width].copy_from_slice(&plain[start..start + width]);
            return u64::from_le_bytes(buf);
        }
        (0..width).fold(0u64, |raw, i| raw | (u64::from(src.load(start + i)) << (8 * i)))
    } else {
        let (byte, shift) = locate(index, bits);
        let mask = (1u8 << bits) - 1;
        u64::from((src.load(byte) >> shift) & mask)
    }
}

/// Store the low `bits` of `raw` as element `index`
///
/// Sub-byte writes preserve the neighbouring element sharing the byte.
pub(crate) fn write_raw<S: ByteSink + ?Sized>(dst: &S, index: usize, bits: usize, raw: u64) {
    if bits % 8 == 0 {
        let width = bits / 8;
        let start = index * width;
        for i in 0..width {
            dst.store(start + i, (raw >> (8 * i)) as u8);
        }
    } else {
        let (byte, shift) = locate(index, bits);
        let mask = ((1u8 << bits) - 1) << shift;
        let old = dst.load(byte);
        dst.store(byte, (old & !mask) | (((raw as u8) << shift) & mask));
    }
}

/// Sign-extend the low `bits` of `raw`
pub(crate) fn sign_extend(raw: u64, bits: usize) -> i64 {
    let shift = 64 - bits as u32;
    ((raw << shift) as i64) >> shift
}
