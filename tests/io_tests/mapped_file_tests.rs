//! Tests for read-only mapped files

use std::path::PathBuf;

use tempfile::TempDir;
use weightblob::file::{open_for_read, FixedBlock, MappedFile};
use weightblob::storage::{BlobHeader, HEADER_SIZE};
use weightblob::BlobError;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_temp_file(contents: &[u8]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.bin");
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_file_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.bin");

    let result = MappedFile::open(&path);

    assert!(matches!(result, Err(BlobError::FileNotFound(p)) if p == path));
}

#[test]
fn test_file_empty() {
    let (_temp, path) = write_temp_file(&[]);

    let result = MappedFile::open(&path);

    assert!(matches!(result, Err(BlobError::FileEmpty(_))));
    assert!(matches!(open_for_read(&path), Err(BlobError::FileEmpty(_))));
}

#[cfg(unix)]
#[test]
fn test_file_no_access() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, path) = write_temp_file(b"secret");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users bypass permission bits
    if std::fs::File::open(&path).is_ok() {
        return;
    }

    let result = MappedFile::open(&path);

    assert!(matches!(result, Err(BlobError::FileAccessDenied(_))));
    assert!(result.unwrap_err().is_resource_error());
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_data() {
    let contents: Vec<u8> = (0u8..=255).collect();
    let (_temp, path) = write_temp_file(&contents);

    let file = MappedFile::open(&path).unwrap();

    assert_eq!(file.len(), 256);
    assert_eq!(file.read_at(0, 4).unwrap(), &[0, 1, 2, 3]);
    assert_eq!(file.read_at(250, 6).unwrap(), &[250, 251, 252, 253, 254, 255]);
    assert_eq!(file.as_bytes(), &contents[..]);
}

#[test]
fn test_read_out_of_range() {
    let (_temp, path) = write_temp_file(&[1u8; 32]);
    let file = MappedFile::open(&path).unwrap();

    assert!(matches!(
        file.read_at(30, 3),
        Err(BlobError::OffsetOutOfRange { offset: 30, length: 3, limit: 32 })
    ));
    assert!(matches!(
        file.read_at(u64::MAX, 2),
        Err(BlobError::OffsetOutOfRange { .. })
    ));
}

#[test]
fn test_read_struct() {
    let mut contents = vec![0xAAu8; 16];
    contents.extend(BlobHeader::new(false).encode().unwrap());
    let (_temp, path) = write_temp_file(&contents);

    let file = MappedFile::open(&path).unwrap();
    let header: BlobHeader = file.read_struct(16).unwrap();

    assert_eq!(header, BlobHeader::new(false));
    assert!(header.validate().is_ok());
    assert!(matches!(
        file.read_struct::<BlobHeader>(17),
        Err(BlobError::OffsetOutOfRange { length, .. }) if length == HEADER_SIZE
    ));
}
