//! Error taxonomy and its projection onto POSIX errno values.

use thiserror::Error;

/// Every way a filesystem operation can fail, per the error handling design.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,
    #[error("file exists")]
    AlreadyExists,
    #[error("name too long")]
    NameTooLong,
    #[error("not a directory")]
    NotADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("file too large")]
    TooBig,
    #[error("no space left (child vector full)")]
    NoSpace,
    #[error("permission denied")]
    PermissionDenied,
    #[error("record corrupt: {0}")]
    Corrupt(String),
    #[error("store I/O error: {0}")]
    Io(String),
}

impl FsError {
    /// Negative POSIX errno, ready to hand to `reply.error(...)`.
    pub fn to_errno(&self) -> i32 {
        let code = match self {
            FsError::NotFound => libc::ENOENT,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NameTooLong => libc::ENAMETOOLONG,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::NotEmpty => libc::ENOTEMPTY,
            FsError::TooBig => libc::EFBIG,
            FsError::NoSpace => libc::ENOSPC,
            FsError::PermissionDenied => libc::EACCES,
            FsError::Corrupt(_) => libc::EIO,
            FsError::Io(_) => libc::EIO,
        };
        code
    }
}

impl From<sled::Error> for FsError {
    fn from(e: sled::Error) -> Self {
        FsError::Io(e.to_string())
    }
}

pub type FsResult<T> = Result<T, FsError>;
