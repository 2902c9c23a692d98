//! Tests for the storage writer
//!
//! These tests verify:
//! - Alignment of every record offset
//! - Appending to an existing file preserves earlier records
//! - Every supported data type reads back bit-for-bit
//! - Argument validation (type, size) and lifecycle errors

use std::path::{Path, PathBuf};

use half::{bf16, f16};
use tempfile::TempDir;
use weightblob::storage::ALIGNMENT;
use weightblob::{
    BlobError, Config, DataType, Int4, Span, StorageReader, StorageWriter, SyncStrategy, UInt1,
    UInt2, UInt4,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_blob() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("weights.wblob");
    (temp_dir, path)
}

fn create_writer(path: &Path) -> StorageWriter {
    StorageWriter::create(path, &Config::default()).unwrap()
}

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_writes_header() {
    let (_temp, path) = setup_temp_blob();

    let mut writer = create_writer(&path);
    assert_eq!(writer.record_count().unwrap(), 0);
    assert!(!writer.is_encrypted().unwrap());
    writer.finalize().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 64);
    assert_eq!(&bytes[0..4], b"WBLB");
    assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
}

#[test]
fn test_create_already_exists() {
    let (_temp, path) = setup_temp_blob();
    create_writer(&path).finalize().unwrap();

    let result = StorageWriter::create(&path, &Config::default());
    assert!(matches!(result, Err(BlobError::AlreadyExists(_))));

    let config = Config::builder().truncate_existing(true).build();
    let mut writer = StorageWriter::create(&path, &config).unwrap();
    writer.write_values(&[1u8]).unwrap();
    writer.finalize().unwrap();

    assert_eq!(StorageReader::open(&path).unwrap().record_count().unwrap(), 1);
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_alignment() {
    let (_temp, path) = setup_temp_blob();
    let mut writer = create_writer(&path);

    let offsets: Vec<u64> = (1..=5)
        .map(|len| writer.write_values(&vec![7u8; len * 13]).unwrap())
        .collect();
    writer.finalize().unwrap();

    assert!(offsets.iter().all(|offset| offset % ALIGNMENT == 0));
    assert_eq!(offsets[0], 128);
    assert_eq!(offsets[1], 256);

    let reader = StorageReader::open(&path).unwrap();
    assert_eq!(reader.offsets().unwrap(), offsets);
}

#[test]
fn test_single_byte_record() {
    let (_temp, path) = setup_temp_blob();
    let mut writer = create_writer(&path);

    let first = writer.write_values(&[0xABu8]).unwrap();
    let second = writer.write_values(&[0xCDu8]).unwrap();
    writer.finalize().unwrap();

    assert_eq!(second - first, 128);

    let reader = StorageReader::open(&path).unwrap();
    assert_eq!(reader.raw_bytes(first).unwrap(), &[0xAB]);
    assert_eq!(reader.raw_bytes(second).unwrap(), &[0xCD]);
}

#[test]
fn test_write_record_strided_span() {
    let (_temp, path) = setup_temp_blob();
    let bytes: Vec<u8> = (0..12).collect();
    let matrix = Span::<u8>::new(&bytes, &[3, 4]).unwrap();
    let column = matrix.slice(1, 1, 2).unwrap();

    let mut writer = create_writer(&path);
    let whole = writer.write_record(DataType::UInt8, 12, &matrix).unwrap();
    let strided = writer.write_record(DataType::UInt8, 3, &column).unwrap();
    writer.finalize().unwrap();

    let reader = StorageReader::open(&path).unwrap();
    assert_eq!(reader.raw_bytes(whole).unwrap(), &bytes[..]);
    assert_eq!(reader.view_at::<u8>(strided).unwrap().to_vec(), vec![1, 5, 9]);
}

#[test]
fn test_supported_types_round_trip() {
    let (_temp, path) = setup_temp_blob();
    let mut writer = create_writer(&path);

    let offsets = [
        writer.write_values(&[i8::MIN, -1, 0, i8::MAX]).unwrap(),
        writer.write_values(&[0u8, 128, 255]).unwrap(),
        writer.write_values(&[i16::MIN, 0x1234, i16::MAX]).unwrap(),
        writer.write_values(&[u16::MAX, 1]).unwrap(),
        writer.write_values(&[i32::MIN, -7, i32::MAX]).unwrap(),
        writer.write_values(&[u32::MAX, 0xDEAD_BEEF]).unwrap(),
        writer.write_values(&[i64::MIN, i64::MAX]).unwrap(),
        writer.write_values(&[u64::MAX, 1 << 40]).unwrap(),
        writer.write_values(&[f16::from_f32(0.5), f16::NEG_INFINITY]).unwrap(),
        writer.write_values(&[bf16::from_f32(-3.0), bf16::MAX]).unwrap(),
        writer.write_values(&[f32::MIN_POSITIVE, -0.0]).unwrap(),
        writer.write_values(&[std::f64::consts::PI]).unwrap(),
        writer.write_values(&[Int4::MIN, Int4::MAX, Int4::new(-3).unwrap()]).unwrap(),
        writer.write_values(&[UInt4::MAX, UInt4::MIN, UInt4::new(6).unwrap()]).unwrap(),
        writer.write_values(&[UInt1::MAX, UInt1::MIN, UInt1::MAX]).unwrap(),
        writer.write_values(&[UInt2::new(2).unwrap(), UInt2::MAX, UInt2::MIN]).unwrap(),
    ];
    writer.finalize().unwrap();

    let reader = StorageReader::open(&path).unwrap();
    reader.verify().unwrap();

    let stored: Vec<DataType> = offsets.iter().map(|&o| reader.data_type(o).unwrap()).collect();
    assert_eq!(stored, DataType::ALL.to_vec());

    assert_eq!(reader.view_at::<i8>(offsets[0]).unwrap().to_vec(), vec![i8::MIN, -1, 0, i8::MAX]);
    assert_eq!(reader.view_at::<u8>(offsets[1]).unwrap().to_vec(), vec![0, 128, 255]);
    assert_eq!(
        reader.view_at::<i16>(offsets[2]).unwrap().to_vec(),
        vec![i16::MIN, 0x1234, i16::MAX]
    );
    assert_eq!(reader.view_at::<u16>(offsets[3]).unwrap().to_vec(), vec![u16::MAX, 1]);
    assert_eq!(
        reader.view_at::<i32>(offsets[4]).unwrap().to_vec(),
        vec![i32::MIN, -7, i32::MAX]
    );
    assert_eq!(reader.view_at::<u32>(offsets[5]).unwrap().to_vec(), vec![u32::MAX, 0xDEAD_BEEF]);
    assert_eq!(reader.view_at::<i64>(offsets[6]).unwrap().to_vec(), vec![i64::MIN, i64::MAX]);
    assert_eq!(reader.view_at::<u64>(offsets[7]).unwrap().to_vec(), vec![u64::MAX, 1 << 40]);
    assert_eq!(
        reader.view_at::<f16>(offsets[8]).unwrap().to_vec(),
        vec![f16::from_f32(0.5), f16::NEG_INFINITY]
    );
    assert_eq!(
        reader.view_at::<bf16>(offsets[9]).unwrap().to_vec(),
        vec![bf16::from_f32(-3.0), bf16::MAX]
    );

    let floats = reader.view_at::<f32>(offsets[10]).unwrap().to_vec();
    assert_eq!(floats[0], f32::MIN_POSITIVE);
    assert!(floats[1] == 0.0 && floats[1].is_sign_negative());

    assert_eq!(reader.view_at::<f64>(offsets[11]).unwrap().to_vec(), vec![std::f64::consts::PI]);
    assert_eq!(
        reader.view_at::<Int4>(offsets[12]).unwrap().to_vec(),
        vec![Int4::MIN, Int4::MAX, Int4::new(-3).unwrap()]
    );
    assert_eq!(
        reader.view_at::<UInt4>(offsets[13]).unwrap().to_vec(),
        vec![UInt4::MAX, UInt4::MIN, UInt4::new(6).unwrap()]
    );
    assert_eq!(
        reader.view_at::<UInt1>(offsets[14]).unwrap().to_vec(),
        vec![UInt1::MAX, UInt1::MIN, UInt1::MAX]
    );
    assert_eq!(reader.raw_bytes(offsets[14]).unwrap(), &[0b101]);
    assert_eq!(
        reader.view_at::<UInt2>(offsets[15]).unwrap().to_vec(),
        vec![UInt2::new(2).unwrap(), UInt2::MAX, UInt2::MIN]
    );
}

#[test]
fn test_every_record_commits_before_finalize() {
    let (_temp, path) = setup_temp_blob();
    let config = Config::builder().sync_strategy(SyncStrategy::EveryRecord).build();
    let mut writer = StorageWriter::create(&path, &config).unwrap();

    let mut offsets = Vec::new();
    for round in 0..3u8 {
        offsets.push(writer.write_values(&vec![round; 70]).unwrap());

        let reader = StorageReader::open(&path).unwrap();
        reader.verify().unwrap();
        assert_eq!(reader.offsets().unwrap(), offsets);
        assert_eq!(reader.raw_bytes(offsets[round as usize]).unwrap(), &[round; 70][..]);
    }
    writer.finalize().unwrap();
}

#[test]
fn test_type_mismatch() {
    let (_temp, path) = setup_temp_blob();
    let mut writer = create_writer(&path);
    let values = [1u8, 2, 3];
    let span = Span::from_slice(&values);

    let result = writer.write_record(DataType::Int8, 3, &span);

    assert!(matches!(
        result,
        Err(BlobError::TypeMismatch {
            expected: DataType::Int8,
            found: DataType::UInt8
        })
    ));
    assert_eq!(writer.record_count().unwrap(), 0);
}

#[test]
fn test_size_mismatch() {
    let (_temp, path) = setup_temp_blob();
    let mut writer = create_writer(&path);
    let values = [1.0f32, 2.0];
    let span = Span::from_slice(&values);

    let result = writer.write_record(DataType::Float32, 3, &span);

    assert!(matches!(result, Err(BlobError::SizeMismatch { expected: 3, actual: 2 })));
    assert!(result.unwrap_err().is_usage_error());
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_append_preserves_records() {
    let (_temp, path) = setup_temp_blob();

    let mut writer = create_writer(&path);
    let first = writer.write_values(&[1i32, 2, 3]).unwrap();
    writer.finalize().unwrap();

    let config = Config::builder().sync_strategy(SyncStrategy::EveryRecord).build();
    let mut writer = StorageWriter::append(&path, &config).unwrap();
    assert_eq!(writer.record_count().unwrap(), 1);
    let second = writer.write_values(&[UInt4::new(5).unwrap()]).unwrap();
    writer.finalize().unwrap();

    assert!(second > first);
    assert_eq!(second % ALIGNMENT, 0);

    let reader = StorageReader::open(&path).unwrap();
    assert_eq!(reader.offsets().unwrap(), vec![first, second]);
    assert_eq!(reader.view_at::<i32>(first).unwrap().to_vec(), vec![1, 2, 3]);
    assert_eq!(reader.view_at::<UInt4>(second).unwrap().at(&[0]), UInt4::new(5).unwrap());
}

#[test]
fn test_append_keeps_encrypted_flag() {
    let (_temp, path) = setup_temp_blob();
    let config = Config::builder().encrypted(true).build();
    StorageWriter::create(&path, &config).unwrap().finalize().unwrap();

    let writer = StorageWriter::append(&path, &Config::default()).unwrap();

    assert!(writer.is_encrypted().unwrap());
}

#[test]
fn test_append_rejects_bad_files() {
    let (_temp, path) = setup_temp_blob();

    assert!(matches!(
        StorageWriter::append(&path, &Config::default()),
        Err(BlobError::FileNotFound(_))
    ));

    std::fs::write(&path, b"").unwrap();
    assert!(matches!(
        StorageWriter::append(&path, &Config::default()),
        Err(BlobError::FileEmpty(_))
    ));

    std::fs::write(&path, [0u8; 64]).unwrap();
    assert!(matches!(
        StorageWriter::append(&path, &Config::default()),
        Err(BlobError::InvalidHeader(_))
    ));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_finalize_closes_writer() {
    let (_temp, path) = setup_temp_blob();
    let mut writer = create_writer(&path);
    writer.write_values(&[1u8]).unwrap();
    writer.finalize().unwrap();

    assert!(!writer.is_open());
    assert!(matches!(writer.write_values(&[2u8]), Err(BlobError::NotOpen)));
    assert!(matches!(writer.record_count(), Err(BlobError::NotOpen)));
    assert!(matches!(writer.finalize(), Err(BlobError::NotOpen)));
}

#[test]
fn test_drop_without_finalize() {
    let (_temp, path) = setup_temp_blob();
    let offset = {
        let mut writer = create_writer(&path);
        writer.write_values(&[4u16, 5]).unwrap()
    };

    let reader = StorageReader::open(&path).unwrap();
    assert_eq!(reader.view_at::<u16>(offset).unwrap().to_vec(), vec![4, 5]);
}
