mod common;

use common::{fresh_fs, GID, UID};
use kvfs::error::FsError;

#[test]
fn mkdir_sets_directory_mode_bit() {
    let mut fs = fresh_fs();
    fs.mkdir("/d", 0o755, UID, GID).unwrap();
    let node = fs.getattr("/d").unwrap();
    assert!(node.is_dir());
}

#[test]
fn mkdir_rejects_duplicate() {
    let mut fs = fresh_fs();
    fs.mkdir("/d", 0o755, UID, GID).unwrap();
    let err = fs.mkdir("/d", 0o755, UID, GID).unwrap_err();
    assert!(matches!(err, FsError::AlreadyExists));
}

#[test]
fn nested_directories_resolve() {
    let mut fs = fresh_fs();
    fs.mkdir("/a", 0o755, UID, GID).unwrap();
    fs.mkdir("/a/b", 0o755, UID, GID).unwrap();
    fs.mkdir("/a/b/c", 0o755, UID, GID).unwrap();
    let node = fs.getattr("/a/b/c").unwrap();
    assert_eq!(node.path, "/a/b/c");
}

#[test]
fn create_under_a_file_is_not_a_directory() {
    let mut fs = fresh_fs();
    fs.create("/f", 0o644, UID, GID).unwrap();
    let err = fs.create("/f/x", 0o644, UID, GID).unwrap_err();
    assert!(matches!(err, FsError::NotADirectory));
}

#[test]
fn readdir_on_a_file_is_not_a_directory() {
    let mut fs = fresh_fs();
    fs.create("/f", 0o644, UID, GID).unwrap();
    let err = fs.readdir("/f").unwrap_err();
    assert!(matches!(err, FsError::NotADirectory));
}

#[test]
fn siblings_do_not_shadow_each_other() {
    let mut fs = fresh_fs();
    fs.mkdir("/a", 0o755, UID, GID).unwrap();
    fs.mkdir("/b", 0o755, UID, GID).unwrap();
    fs.create("/a/x", 0o644, UID, GID).unwrap();
    fs.create("/b/x", 0o644, UID, GID).unwrap();
    assert_eq!(fs.getattr("/a/x").unwrap().path, "/a/x");
    assert_eq!(fs.getattr("/b/x").unwrap().path, "/b/x");
}
