//! Unit tests for script export: encodings, replacement and atomic writes.

use ddl_export::export::{export, Charset};
use ddl_export::ExportError;
use std::fs;
use tempfile::TempDir;

const SCRIPT: &str = "CREATE TABLE Café (\n    id BIGINT\n)\n;\n";

#[test]
fn test_utf8_roundtrip_and_digest() {
    let dir = TempDir::new().unwrap();
    let file = export(dir.path(), "create.sql", SCRIPT, "utf-8").unwrap();

    assert_eq!(fs::read_to_string(&file.path).unwrap(), SCRIPT);
    assert_eq!(file.bytes, SCRIPT.len());
    assert_eq!(file.sha256.len(), 64);

    let again = export(dir.path(), "other.sql", SCRIPT, "UTF8").unwrap();
    assert_eq!(file.sha256, again.sha256);
}

#[test]
fn test_single_byte_encodings() {
    let dir = TempDir::new().unwrap();

    let latin1 = export(dir.path(), "latin1.sql", SCRIPT, "ISO-8859-1").unwrap();
    let bytes = fs::read(&latin1.path).unwrap();
    assert!(bytes.contains(&0xE9));
    assert_eq!(bytes.len(), SCRIPT.chars().count());

    let ascii = export(dir.path(), "ascii.sql", SCRIPT, "US-ASCII").unwrap();
    let text = fs::read_to_string(&ascii.path).unwrap();
    assert!(text.starts_with("CREATE TABLE Caf? ("));
}

#[test]
fn test_windows_code_page() {
    let dir = TempDir::new().unwrap();
    let file = export(dir.path(), "cp1252.sql", "-- € Café\n", "windows-1252").unwrap();
    let bytes = fs::read(&file.path).unwrap();
    assert_eq!(bytes, b"-- \x80 Caf\xE9\n".to_vec());
}

#[test]
fn test_utf16_variants() {
    let dir = TempDir::new().unwrap();
    let be = fs::read(export(dir.path(), "be.sql", "AB", "UTF-16BE").unwrap().path).unwrap();
    let le = fs::read(export(dir.path(), "le.sql", "AB", "utf-16le").unwrap().path).unwrap();
    let bom = fs::read(export(dir.path(), "bom.sql", "AB", "UTF-16").unwrap().path).unwrap();

    assert_eq!(be, vec![0x00, 0x41, 0x00, 0x42]);
    assert_eq!(le, vec![0x41, 0x00, 0x42, 0x00]);
    assert_eq!(bom, vec![0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]);
}

#[test]
fn test_existing_file_is_replaced_whole() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drop.sql");
    fs::write(&path, "x".repeat(4096)).unwrap();

    export(dir.path(), "drop.sql", "DROP TABLE t\n;\n", "UTF-8").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "DROP TABLE t\n;\n");

    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn test_unknown_encoding() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("never");
    let err = export(&target, "create.sql", SCRIPT, "MAC-KLINGON").unwrap_err();
    assert!(matches!(err, ExportError::UnknownEncoding(ref name) if name == "MAC-KLINGON"));
    assert!(!target.exists());
    assert!(Charset::resolve("latin1").is_ok());
}
