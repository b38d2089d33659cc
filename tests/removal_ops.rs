mod common;

use common::{fresh_fs, GID, UID};
use kvfs::error::FsError;

#[test]
fn unlink_removes_file_and_cache_does_not_serve_stale_hit() {
    let mut fs = fresh_fs();
    fs.create("/f", 0o644, UID, GID).unwrap();
    fs.getattr("/f").unwrap(); // warm the cache
    fs.unlink("/f").unwrap();
    let err = fs.getattr("/f").unwrap_err();
    assert!(matches!(err, FsError::NotFound));
}

#[test]
fn unlink_missing_is_not_found() {
    let mut fs = fresh_fs();
    let err = fs.unlink("/nope").unwrap_err();
    assert!(matches!(err, FsError::NotFound));
}

#[test]
fn rmdir_rejects_non_empty_directory() {
    let mut fs = fresh_fs();
    fs.mkdir("/a", 0o755, UID, GID).unwrap();
    fs.create("/a/b", 0o644, UID, GID).unwrap();
    let err = fs.rmdir("/a").unwrap_err();
    assert!(matches!(err, FsError::NotEmpty));
}

#[test]
fn rmdir_empty_directory_then_repeat_is_not_found() {
    let mut fs = fresh_fs();
    fs.mkdir("/a", 0o755, UID, GID).unwrap();
    fs.rmdir("/a").unwrap();
    let err = fs.rmdir("/a").unwrap_err();
    assert!(matches!(err, FsError::NotFound));
}

#[test]
fn removing_a_middle_sibling_preserves_remaining_children() {
    let mut fs = fresh_fs();
    fs.mkdir("/d", 0o755, UID, GID).unwrap();
    fs.create("/d/a", 0o644, UID, GID).unwrap();
    fs.create("/d/b", 0o644, UID, GID).unwrap();
    fs.create("/d/c", 0o644, UID, GID).unwrap();

    fs.unlink("/d/b").unwrap();

    let mut names: Vec<_> = fs.readdir("/d").unwrap().into_iter().map(|e| e.name).collect();
    names.sort();
    assert_eq!(names, vec!["a", "c"]);
    assert!(fs.getattr("/d/a").is_ok());
    assert!(fs.getattr("/d/c").is_ok());
}

#[test]
fn full_lifecycle_end_to_end() {
    let mut fs = fresh_fs();
    fs.mkdir("/d", 0o755, UID, GID).unwrap();
    fs.create("/d/f", 0o644, UID, GID).unwrap();
    fs.write("/d/f", b"hello", 0).unwrap();
    assert_eq!(fs.getattr("/d/f").unwrap().size, 5);
    assert_eq!(fs.read("/d/f", 0, 5).unwrap(), b"hello");

    fs.unlink("/d/f").unwrap();
    assert!(matches!(fs.getattr("/d/f").unwrap_err(), FsError::NotFound));
    assert!(fs.readdir("/d").unwrap().is_empty());

    fs.rmdir("/d").unwrap();
    assert!(matches!(fs.rmdir("/d").unwrap_err(), FsError::NotFound));
}
