use kvfs::fs::Fs;
use kvfs::store::memory::MemoryStore;

pub const UID: u32 = 1000;
pub const GID: u32 = 1000;

pub fn fresh_fs() -> Fs {
    Fs::bootstrap(Box::new(MemoryStore::new()), UID, GID, 0o755).expect("bootstrap")
}
