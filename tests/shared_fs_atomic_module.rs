use std::fs;
use tempfile::tempdir;
use traceflow::shared::fs_atomic::atomic_write_file;

#[test]
fn atomic_write_creates_and_overwrites_files() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("record.json");

    atomic_write_file(&path, b"{\"v\":1}").expect("first write");
    assert_eq!(fs::read_to_string(&path).expect("read"), "{\"v\":1}");

    atomic_write_file(&path, b"{\"v\":2}").expect("overwrite");
    assert_eq!(fs::read_to_string(&path).expect("read"), "{\"v\":2}");
}

#[test]
fn atomic_write_leaves_no_temp_files_behind() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("record.json");
    atomic_write_file(&path, b"payload").expect("write");

    let names = fs::read_dir(dir.path())
        .expect("read_dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["record.json".to_string()]);
}

#[test]
fn atomic_write_fails_when_parent_is_missing() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("record.json");
    assert!(atomic_write_file(&path, b"payload").is_err());
}
