//! Projection from the on-store `Node` shape to POSIX/FUSE attribute types.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fuser::{FileAttr, FileType};

use crate::record::Node;

/// Seconds since the epoch, used for `mtime`/`ctime` fields.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Project a `SystemTime` (as handed to `setattr`'s `TimeOrNow::SpecificTime`)
/// down to the same seconds-since-epoch resolution the store uses.
pub fn now_secs_from(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn file_type_of(mode: u32) -> FileType {
    if mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32 {
        FileType::Directory
    } else {
        FileType::RegularFile
    }
}

/// Project a `Node` onto a `fuser::FileAttr`, given the kernel inode number
/// the dispatch layer has assigned it.
pub fn file_attr(node: &Node, ino: u64) -> FileAttr {
    let mtime = UNIX_EPOCH + Duration::from_secs(node.mtime);
    let ctime = UNIX_EPOCH + Duration::from_secs(node.ctime);
    FileAttr {
        ino,
        size: node.size,
        blocks: node.size.div_ceil(512),
        atime: mtime,
        mtime,
        ctime,
        crtime: ctime,
        kind: file_type_of(node.mode),
        perm: (node.mode & 0o7777) as u16,
        nlink: node.nlink(),
        uid: node.uid,
        gid: node.gid,
        rdev: 0,
        blksize: 512,
        flags: 0,
    }
}
