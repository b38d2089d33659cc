//! Bridge from the kernel-facing `fuser::Filesystem` trait to the path
//! addressed core engine in `fs`.
//!
//! This is the one module that talks to the kernel. It owns the mapping
//! between `fuser`'s `u64` inode numbers and the core's own paths, lazily
//! assigning an inode the first time a path is looked up and reusing it for
//! the lifetime of the mount (mirroring the ino-interning style of
//! `path_tag_fs` and `s5_fuse` in this codebase's reference pack).

use std::ffi::OsStr;
use std::os::raw::c_int;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use fuser::{
    Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use tracing::debug;

use crate::attrs::file_attr;
use crate::error::FsError;
use crate::fs::Fs;
use crate::path;

const TTL: Duration = Duration::from_secs(1);

/// Bidirectional inode <-> path table. `FUSE_ROOT_ID` (1) is always `"/"`.
struct InoTable {
    path_of: DashMap<u64, String>,
    ino_of: DashMap<String, u64>,
    next: AtomicU64,
}

impl InoTable {
    fn new() -> Self {
        let path_of = DashMap::new();
        let ino_of = DashMap::new();
        path_of.insert(fuser::FUSE_ROOT_ID, "/".to_string());
        ino_of.insert("/".to_string(), fuser::FUSE_ROOT_ID);
        InoTable {
            path_of,
            ino_of,
            next: AtomicU64::new(fuser::FUSE_ROOT_ID + 1),
        }
    }

    fn path(&self, ino: u64) -> Option<String> {
        self.path_of.get(&ino).map(|p| p.clone())
    }

    /// Look up the inode registered for `path`, assigning a fresh one if
    /// this is the first time it has been seen.
    fn ino_for(&self, path: &str) -> u64 {
        if let Some(ino) = self.ino_of.get(path) {
            return *ino;
        }
        let ino = self.next.fetch_add(1, Ordering::Relaxed);
        self.ino_of.insert(path.to_string(), ino);
        self.path_of.insert(ino, path.to_string());
        ino
    }

    fn forget(&self, path: &str) {
        if let Some((_, ino)) = self.ino_of.remove(path) {
            self.path_of.remove(&ino);
        }
    }
}

pub struct KvFs {
    core: Fs,
    inodes: InoTable,
}

impl KvFs {
    pub fn new(core: Fs) -> Self {
        KvFs {
            core,
            inodes: InoTable::new(),
        }
    }

    fn child_path(&self, parent: u64, name: &OsStr) -> Option<String> {
        let parent_path = self.inodes.path(parent)?;
        let name = name.to_str()?;
        Some(path::join(&parent_path, name))
    }
}

fn reply_err(e: FsError) -> i32 {
    e.to_errno()
}

impl Filesystem for KvFs {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
        Ok(())
    }

    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        debug!(path = %path, "lookup");
        match self.core.getattr(&path) {
            Ok(node) => {
                let ino = self.inodes.ino_for(&path);
                reply.entry(&TTL, &file_attr(&node, ino), 0);
            }
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.getattr(&path) {
            Ok(node) => reply.attr(&TTL, &file_attr(&node, ino)),
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<std::time::SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<std::time::SystemTime>,
        _chgtime: Option<std::time::SystemTime>,
        _bkuptime: Option<std::time::SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        if let Some(mode) = mode {
            if let Err(e) = self.core.chmod(&path, mode) {
                reply.error(reply_err(e));
                return;
            }
        }
        if uid.is_some() || gid.is_some() {
            if let Err(e) = self.core.chown(&path, uid, gid) {
                reply.error(reply_err(e));
                return;
            }
        }
        if let Some(size) = size {
            if let Err(e) = self.core.truncate(&path, size) {
                reply.error(reply_err(e));
                return;
            }
        }
        if let Some(mtime) = mtime {
            let secs = match mtime {
                TimeOrNow::SpecificTime(t) => crate::attrs::now_secs_from(t),
                TimeOrNow::Now => crate::attrs::now_secs(),
            };
            if let Err(e) = self.core.utime(&path, secs) {
                reply.error(reply_err(e));
                return;
            }
        }

        match self.core.getattr(&path) {
            Ok(node) => reply.attr(&TTL, &file_attr(&node, ino)),
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn mkdir(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.mkdir(&path, mode, req.uid(), req.gid()) {
            Ok(node) => {
                let ino = self.inodes.ino_for(&path);
                reply.entry(&TTL, &file_attr(&node, ino), 0);
            }
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn create(
        &mut self,
        req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.create(&path, mode, req.uid(), req.gid()) {
            Ok(node) => {
                let ino = self.inodes.ino_for(&path);
                reply.created(&TTL, &file_attr(&node, ino), 0, 0, 0);
            }
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn open(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.open(&path) {
            Ok(_) => reply.opened(0, 0),
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.read(&path, offset.max(0) as u64, size) {
            Ok(bytes) => reply.data(&bytes),
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.write(&path, data, offset.max(0) as u64) {
            Ok(written) => reply.written(written),
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.unlink(&path) {
            Ok(()) => {
                self.inodes.forget(&path);
                reply.ok();
            }
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(path) = self.child_path(parent, name) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.rmdir(&path) {
            Ok(()) => {
                self.inodes.forget(&path);
                reply.ok();
            }
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(dir_path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let entries = match self.core.readdir(&dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(reply_err(e));
                return;
            }
        };

        let mut all = vec![
            (ino, fuser::FileType::Directory, ".".to_string()),
            (ino, fuser::FileType::Directory, "..".to_string()),
        ];
        for entry in entries {
            let child_path = path::join(&dir_path, &entry.name);
            let child_ino = self.inodes.ino_for(&child_path);
            let kind = if entry.is_dir {
                fuser::FileType::Directory
            } else {
                fuser::FileType::RegularFile
            };
            all.push((child_ino, kind, entry.name));
        }

        for (i, (ino, kind, name)) in all.into_iter().enumerate().skip(offset as usize) {
            if reply.add(ino, (i + 1) as i64, kind, &name) {
                break;
            }
        }
        reply.ok();
    }

    fn flush(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.flush(&path) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(reply_err(e)),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        let Some(path) = self.inodes.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.core.release(&path) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(reply_err(e)),
        }
    }
}

