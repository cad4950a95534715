//! Tests for chain writers

use crate::util::chain_writer::{
    ChainWriter, DEFAULT_BUFFER_SIZE, GzipWriter, PlainWriter, chain_writer_for,
};
use flate2::read::MultiGzDecoder;
use logfold_config::Compression;
use std::io::{Read, Write};
use tempfile::NamedTempFile;

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    MultiGzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

// ============================================================================
// PlainWriter Tests
// ============================================================================

#[test]
fn test_plain_writer_extension() {
    assert_eq!(PlainWriter::default().file_extension(), ".csv");
    assert_eq!(PlainWriter::new(1024).file_extension(), ".csv");
}

#[test]
fn test_plain_writer_wrap_and_write() {
    let writer = PlainWriter::new(4096);
    let temp_file = NamedTempFile::new().unwrap();
    let file = temp_file.reopen().unwrap();

    let mut chain = writer.wrap(file).unwrap();
    chain.write_all(b"a,b,c\n").unwrap();
    chain.flush().unwrap();

    assert_eq!(chain.bytes_written(), 6);
    assert_eq!(std::fs::read(temp_file.path()).unwrap(), b"a,b,c\n");
}

#[test]
fn test_plain_writer_finish() {
    let writer = PlainWriter::new(4096);
    let temp_file = NamedTempFile::new().unwrap();
    let file = temp_file.reopen().unwrap();

    let mut chain = writer.wrap(file).unwrap();
    for i in 0..10 {
        chain.write_all(format!("row {}\n", i).as_bytes()).unwrap();
    }
    chain.finish().unwrap();

    let content = std::fs::read_to_string(temp_file.path()).unwrap();
    assert!(content.starts_with("row 0\n"));
    assert!(content.ends_with("row 9\n"));
}

// ============================================================================
// GzipWriter Tests
// ============================================================================

#[test]
fn test_gzip_writer_extension() {
    assert_eq!(GzipWriter::default().file_extension(), ".csv.gz");
}

#[test]
fn test_gzip_writer_finish_produces_valid_gzip() {
    let writer = GzipWriter::new(4096);
    let temp_file = NamedTempFile::new().unwrap();
    let file = temp_file.reopen().unwrap();

    let original = b"event_fc,http_user_agent\n3,Mozilla/5.0\n";

    let mut chain = writer.wrap(file).unwrap();
    chain.write_all(original).unwrap();
    assert_eq!(chain.bytes_written(), original.len() as u64);
    chain.finish().unwrap();

    let compressed = std::fs::read(temp_file.path()).unwrap();
    assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    assert_eq!(gunzip(&compressed).unwrap(), original);
}

#[test]
fn test_gzip_flush_then_more_writes() {
    let writer = GzipWriter::new(16).with_level(1);
    let temp_file = NamedTempFile::new().unwrap();
    let file = temp_file.reopen().unwrap();

    let mut chain = writer.wrap(file).unwrap();
    chain.write_all(b"first\n").unwrap();
    chain.flush().unwrap();
    chain.write_all(b"second\n").unwrap();
    chain.finish().unwrap();

    let compressed = std::fs::read(temp_file.path()).unwrap();
    assert_eq!(gunzip(&compressed).unwrap(), b"first\nsecond\n");
}

#[test]
fn test_gzip_large_input() {
    let writer = GzipWriter::default();
    let temp_file = NamedTempFile::new().unwrap();
    let file = temp_file.reopen().unwrap();

    let line = "2021-03-04 11:00:00.123,8.8.8.8,Mountain View\n";
    let mut chain = writer.wrap(file).unwrap();
    for _ in 0..10_000 {
        chain.write_all(line.as_bytes()).unwrap();
    }
    chain.finish().unwrap();

    let compressed = std::fs::read(temp_file.path()).unwrap();
    let decompressed = gunzip(&compressed).unwrap();
    assert_eq!(decompressed.len(), line.len() * 10_000);
    assert!(compressed.len() < decompressed.len() / 10);
}

#[test]
fn test_chain_writer_for_compression() {
    assert_eq!(
        chain_writer_for(Compression::Gzip, DEFAULT_BUFFER_SIZE).file_extension(),
        ".csv.gz"
    );
    assert_eq!(
        chain_writer_for(Compression::None, DEFAULT_BUFFER_SIZE).file_extension(),
        ".csv"
    );
}
