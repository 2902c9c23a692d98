//! Tests for span reinterpretation
//!
//! These tests verify:
//! - Same-bytes reinterpretation between byte-aligned types
//! - Sub-byte <-> byte reinterpretation
//! - Cast invertibility
//! - Rejection of views that cannot be reinterpreted

use weightblob::{BlobError, Int4, Span, SpanMut, UInt1, UInt2, UInt4};

// =============================================================================
// Basic Tests
// =============================================================================

#[test]
fn test_cast_basics() {
    let bytes = [1u8, 0, 0, 0, 2, 0, 0, 0];
    let span = Span::<u8>::from_bytes(&bytes);

    let words = span.cast::<u32>().unwrap();

    assert_eq!(words.shape(), &[2]);
    assert_eq!(words.to_vec(), vec![1, 2]);
    assert_eq!(words.cast::<u8>().unwrap().to_vec(), bytes.to_vec());
}

#[test]
fn test_cast_keeps_outer_dims() {
    let bytes: Vec<u8> = (0..16).collect();
    let span = Span::<u8>::new(&bytes, &[2, 8]).unwrap();

    let halves = span.cast::<u16>().unwrap();

    assert_eq!(halves.shape(), &[2, 4]);
    assert_eq!(halves.at(&[1, 0]), u16::from_le_bytes([8, 9]));
}

#[test]
fn test_cast_float_bits() {
    let bits = [1.0f32.to_bits(), (-2.5f32).to_bits()];
    let span = Span::from_slice(&bits);

    let floats = span.cast::<f32>().unwrap();

    assert_eq!(floats.to_vec(), vec![1.0, -2.5]);
}

#[test]
fn test_cast_sliced_at_boundary() {
    let bytes: Vec<u8> = (0..8).collect();
    let span = Span::<u8>::from_bytes(&bytes);

    let tail = span.slice_from(0, 4).unwrap().cast::<u32>().unwrap();

    assert_eq!(tail.to_vec(), vec![u32::from_le_bytes([4, 5, 6, 7])]);
}

// =============================================================================
// Sub-byte Tests
// =============================================================================

#[test]
fn test_cast_from_int4() {
    let bytes = [0x21u8, 0x43];
    let nibbles = Span::<UInt4>::from_bytes(&bytes);

    let packed = nibbles.cast::<u8>().unwrap();

    assert_eq!(packed.shape(), &[2]);
    assert_eq!(packed.to_vec(), vec![0x21, 0x43]);
}

#[test]
fn test_cast_to_int4() {
    let bytes = [0xF8u8, 0x21];
    let span = Span::<u8>::from_bytes(&bytes);

    let signed = span.cast::<Int4>().unwrap();
    let unsigned = span.cast::<UInt4>().unwrap();

    assert_eq!(signed.len(), 4);
    assert_eq!(
        signed.values().unwrap().map(Int4::get).collect::<Vec<_>>(),
        vec![-8, -1, 1, 2]
    );
    assert_eq!(
        unsigned.values().unwrap().map(UInt4::get).collect::<Vec<_>>(),
        vec![8, 15, 1, 2]
    );
}

#[test]
fn test_cast_to_int4_multi_dimensional() {
    let bytes = [0x21u8, 0x43, 0x65, 0x87];
    let span = Span::<u8>::new(&bytes, &[2, 2]).unwrap();

    let nibbles = span.cast::<UInt4>().unwrap();

    assert_eq!(nibbles.shape(), &[2, 4]);
    assert_eq!(nibbles.at(&[1, 3]), UInt4::new(8).unwrap());
}

#[test]
fn test_cast_invertibility() {
    let bytes: Vec<u8> = (0..=255).collect();
    let span = Span::<u8>::new(&bytes, &[16, 16]).unwrap();

    let nibbles = span.cast::<Int4>().unwrap();
    let back = nibbles.cast::<u8>().unwrap();

    assert_eq!(nibbles.shape(), &[16, 32]);
    assert_eq!(back.shape(), span.shape());
    assert_eq!(back.to_vec(), bytes);
    assert_eq!(back.contiguous_bytes(), Some(&bytes[..]));
}

#[test]
fn test_cast_between_narrow_widths() {
    let bytes = [0b1001_1100u8, 0xFF];
    let span = Span::<u8>::new(&bytes, &[2]).unwrap();

    let pairs = span.cast::<UInt2>().unwrap();
    assert_eq!(pairs.shape(), &[8]);
    assert_eq!(pairs.at(&[1]), UInt2::MAX);
    assert_eq!(pairs.at(&[3]), UInt2::new(2).unwrap());

    let bits = pairs.cast::<UInt1>().unwrap();
    assert_eq!(bits.shape(), &[16]);
    assert_eq!(bits.at(&[2]), UInt1::MAX);
    assert_eq!(bits.at(&[5]), UInt1::MIN);

    let nibbles = bits.slice(0, 8, 16).unwrap().cast::<UInt4>().unwrap();
    assert_eq!(nibbles.to_vec(), vec![UInt4::MAX, UInt4::MAX]);

    assert!(matches!(
        bits.slice(0, 0, 3).unwrap().cast::<UInt2>(),
        Err(BlobError::IncompatibleCast(_))
    ));
}

#[test]
fn test_cast_mutable() {
    let mut bytes = [0u8; 2];
    {
        let span = SpanMut::<u8>::from_bytes(&mut bytes);
        let nibbles = span.cast::<UInt4>().unwrap();

        nibbles.set(&[3], UInt4::new(0xC).unwrap());
        nibbles.set(&[0], UInt4::new(0x1).unwrap());

        assert_eq!(span.to_vec(), vec![0x01, 0xC0]);
    }
    assert_eq!(bytes, [0x01, 0xC0]);
}

// =============================================================================
// Incompatible Casts
// =============================================================================

#[test]
fn test_cast_incompatible_length() {
    let bytes = [0u8; 3];
    let span = Span::<u8>::from_bytes(&bytes);

    assert!(matches!(span.cast::<u16>(), Err(BlobError::IncompatibleCast(_))));

    let nibbles = Span::<Int4>::new(&bytes, &[3]).unwrap();
    assert!(matches!(nibbles.cast::<u8>(), Err(BlobError::IncompatibleCast(_))));
}

#[test]
fn test_cast_incompatible_offset() {
    let bytes = [0u8; 8];
    let span = Span::<u8>::from_bytes(&bytes);

    let shifted = span.slice(0, 1, 5).unwrap();

    assert!(matches!(shifted.cast::<u32>(), Err(BlobError::IncompatibleCast(_))));
    assert!(shifted.cast::<UInt4>().is_ok());
}

#[test]
fn test_cast_incompatible_strides() {
    let bytes = [0u8; 16];
    let span = Span::<u8>::new(&bytes, &[4, 4]).unwrap();

    let columns = span.slice(1, 0, 2).unwrap();

    assert!(matches!(columns.cast::<u16>(), Err(BlobError::IncompatibleCast(_))));
}

#[test]
fn test_cast_incompatible_rank_zero() {
    let bytes = [0u8; 4];
    let span = Span::<u8>::from_bytes(&bytes);

    let scalar = span.rows().unwrap().next().unwrap();

    assert!(matches!(scalar.cast::<UInt4>(), Err(BlobError::IncompatibleCast(_))));
}
