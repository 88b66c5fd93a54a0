use restwire::fs::{FileSystem, OsFileSystem};
use std::fs;

#[test]
fn test_read_to_string() {
    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("test.txt");
    fs::write(&file_path, "Hello, world!").unwrap();

    let content = OsFileSystem.read_to_string(&file_path).unwrap();
    assert_eq!(content, "Hello, world!");
}

#[test]
fn test_write_all_replaces_contents() {
    let temp_dir = tempfile::tempdir().unwrap();
    let file_path = temp_dir.path().join("config.toml");

    OsFileSystem.write_all(&file_path, b"first").unwrap();
    OsFileSystem.write_all(&file_path, b"second").unwrap();
    assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
}

#[test]
fn test_create_dir_all_and_exists() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested = temp_dir.path().join("a").join("b").join("c");

    assert!(!OsFileSystem.exists(&nested));
    OsFileSystem.create_dir_all(&nested).unwrap();
    assert!(OsFileSystem.exists(&nested));
    OsFileSystem.create_dir_all(&nested).unwrap();
}

#[test]
fn test_read_missing_file_is_not_found() {
    let temp_dir = tempfile::tempdir().unwrap();
    let err = OsFileSystem
        .read_to_string(&temp_dir.path().join("missing.txt"))
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
