//! The core filesystem engine: bootstrap, path resolution, and the mutation
//! operations (create, write, truncate, chmod, chown, utime, unlink, rmdir).
//!
//! This is addressed entirely by path; the `dispatch` module is responsible
//! for translating kernel inode numbers into the paths this module expects.

use tracing::{debug, info, instrument, warn};

use crate::cache::Cache;
use crate::codec;
use crate::error::{FsError, FsResult};
use crate::ident::Id;
use crate::path;
use crate::record::{Node, MAX_CHILDREN, MAX_FILE_SIZE, REST_POS};
use crate::store::Store;

fn now() -> u64 {
    crate::attrs::now_secs()
}

/// One directory entry as returned by `readdir`: its basename and id.
pub struct DirEntry {
    pub name: String,
    pub id: Id,
    pub is_dir: bool,
}

pub struct Fs {
    store: Box<dyn Store>,
    root: Node,
    cache: Cache,
}

impl Fs {
    /// Load the root node from the store, or materialize a fresh one if this
    /// is the first mount.
    #[instrument(skip(store))]
    pub fn bootstrap(store: Box<dyn Store>, uid: u32, gid: u32, mode: u32) -> FsResult<Fs> {
        let root = match store.get(&Id::ROOT_KEY)? {
            Some(bytes) => {
                let node = codec::decode(&bytes)?;
                info!(id = %node.meta_id, "loaded existing root");
                node
            }
            None => {
                let node = Node::new_root(
                    Id::ROOT_KEY,
                    Id::ZERO,
                    mode | libc::S_IFDIR as u32,
                    uid,
                    gid,
                    now(),
                );
                store.put(&Id::ROOT_KEY, &codec::encode(&node))?;
                info!(id = %node.meta_id, "materialized fresh root");
                node
            }
        };
        Ok(Fs {
            store,
            root,
            cache: Cache::default(),
        })
    }

    fn fetch(&self, id: &Id) -> FsResult<Node> {
        let bytes = self.store.get(id)?.ok_or(FsError::NotFound)?;
        codec::decode(&bytes)
    }

    fn persist(&self, node: &Node) -> FsResult<()> {
        self.store.put(&node.meta_id, &codec::encode(node))
    }

    /// Find the index in `parent.children` whose entry's stored path equals
    /// `child_path`, fetching each candidate child record to compare.
    fn find_child_index(&self, parent: &Node, child_path: &str) -> FsResult<Option<usize>> {
        for i in REST_POS..parent.number_children {
            let child = self.fetch(&parent.children[i])?;
            if child.path == child_path {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Resolve an absolute path to its node, walking from the root and
    /// consulting/filling the single-slot cache.
    #[instrument(skip(self))]
    pub fn resolve(&mut self, raw_path: &str) -> FsResult<Node> {
        path::check_len(raw_path)?;
        let target = path::normalize(raw_path);

        if target == "/" {
            // Refresh the in-memory root so it and the store cannot drift.
            self.root = self.fetch(&Id::ROOT_KEY)?;
            self.cache.fill(self.root.clone());
            return Ok(self.root.clone());
        }

        if let Some(hit) = self.cache.hit(target) {
            debug!(path = target, "cache hit");
            return Ok(hit.clone());
        }

        let components = path::split(target);
        let mut current = self.root.clone();
        let mut built = String::new();
        for component in components {
            built = path::join(&built_or_root(&built), component);
            match self.find_child_index(&current, &built)? {
                Some(idx) => current = self.fetch(&current.children[idx])?,
                None => {
                    self.cache.invalidate();
                    return Err(FsError::NotFound);
                }
            }
        }
        self.cache.fill(current.clone());
        Ok(current)
    }

    // --- read side -----------------------------------------------------

    pub fn getattr(&mut self, path: &str) -> FsResult<Node> {
        self.resolve(path)
    }

    pub fn readdir(&mut self, path: &str) -> FsResult<Vec<DirEntry>> {
        let node = self.resolve(path)?;
        if !node.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let mut entries = Vec::with_capacity(node.number_children);
        for &id in node.real_children() {
            let child = self.fetch(&id)?;
            entries.push(DirEntry {
                name: path::basename(&child.path).to_string(),
                id: child.meta_id,
                is_dir: child.is_dir(),
            });
        }
        Ok(entries)
    }

    pub fn open(&mut self, path: &str) -> FsResult<Node> {
        let node = self.resolve(path)?;
        if node.mode & libc::S_IRUSR as u32 == 0 {
            return Err(FsError::PermissionDenied);
        }
        Ok(node)
    }

    pub fn read(&mut self, path: &str, offset: u64, size: u32) -> FsResult<Vec<u8>> {
        let node = self.resolve(path)?;
        if node.data_id.is_zero() || offset >= node.size {
            return Ok(Vec::new());
        }
        let blob = self.fetch_blob(&node.data_id)?;
        let start = offset as usize;
        let end = (start + size as usize).min(blob.len()).min(node.size as usize);
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(blob[start..end].to_vec())
    }

    fn fetch_blob(&self, id: &Id) -> FsResult<Vec<u8>> {
        Ok(self.store.get(id)?.unwrap_or_default())
    }

    // --- create / mkdir --------------------------------------------------

    #[instrument(skip(self))]
    pub fn create(&mut self, raw_path: &str, mode: u32, uid: u32, gid: u32) -> FsResult<Node> {
        path::check_len(raw_path)?;
        let target = path::normalize(raw_path);
        let parent_path = path::parent_dir(target);

        let mut parent = self.resolve(&parent_path)?;
        if !parent.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if self.find_child_index(&parent, target)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        if parent.number_children >= MAX_CHILDREN {
            return Err(FsError::NoSpace);
        }

        let new_node = Node::new_child(
            target.to_string(),
            Id::fresh(),
            Id::fresh(),
            parent.meta_id,
            mode,
            uid,
            gid,
            now(),
        );

        parent.children[parent.number_children] = new_node.meta_id;
        parent.number_children += 1;
        parent.ctime = now();

        self.persist(&new_node)?;
        self.persist(&parent)?;
        self.store.put(&new_node.data_id, &[])?;

        if parent.path == "/" {
            self.root = parent.clone();
        }
        self.cache.fill(new_node.clone());
        Ok(new_node)
    }

    pub fn mkdir(&mut self, path: &str, mode: u32, uid: u32, gid: u32) -> FsResult<Node> {
        self.create(path, mode | libc::S_IFDIR as u32, uid, gid)
    }

    // --- write / truncate -------------------------------------------------

    /// `offset == 0` replaces the whole blob; `offset > 0` appends. This
    /// does not support an arbitrary-offset overwrite — an intentional
    /// simplification. Callers that need random-access writes must
    /// `truncate` then write sequentially.
    #[instrument(skip(self, data))]
    pub fn write(&mut self, path: &str, data: &[u8], offset: u64) -> FsResult<u32> {
        let mut node = self.resolve(path)?;
        if node.data_id.is_zero() {
            node.data_id = Id::fresh();
        }

        let new_size = if offset == 0 {
            data.len() as u64
        } else {
            node.size + data.len() as u64
        };
        if new_size > MAX_FILE_SIZE {
            return Err(FsError::TooBig);
        }

        if offset == 0 {
            self.store.put(&node.data_id, data)?;
        } else {
            self.store.append(&node.data_id, data)?;
        }

        node.size = new_size;
        node.mtime = now();
        node.ctime = node.mtime;
        self.persist(&node)?;
        self.cache.fill(node);
        Ok(data.len() as u32)
    }

    pub fn truncate(&mut self, path: &str, new_size: u64) -> FsResult<()> {
        if new_size >= MAX_FILE_SIZE {
            return Err(FsError::TooBig);
        }
        let mut node = self.resolve(path)?;
        node.size = new_size;
        node.mtime = now();
        node.ctime = node.mtime;
        self.persist(&node)?;
        self.cache.fill(node);
        Ok(())
    }

    // --- chmod / chown / utime -------------------------------------------

    pub fn chmod(&mut self, path: &str, mode: u32) -> FsResult<()> {
        let mut node = self.resolve(path)?;
        let file_type_bits = node.mode & libc::S_IFMT as u32;
        node.mode = file_type_bits | (mode & 0o7777);
        node.ctime = now();
        self.persist(&node)?;
        self.cache.fill(node);
        Ok(())
    }

    /// Returns `-EIO` (via `FsError::Io`) if the store write fails, rather
    /// than silently ignoring it.
    pub fn chown(&mut self, path: &str, uid: Option<u32>, gid: Option<u32>) -> FsResult<()> {
        let mut node = self.resolve(path)?;
        if let Some(uid) = uid {
            node.uid = uid;
        }
        if let Some(gid) = gid {
            node.gid = gid;
        }
        node.ctime = now();
        if let Err(e) = self.persist(&node) {
            warn!(path, error = %e, "chown failed to persist");
            return Err(e);
        }
        self.cache.fill(node);
        Ok(())
    }

    pub fn utime(&mut self, path: &str, mtime: u64) -> FsResult<()> {
        let mut node = self.resolve(path)?;
        node.mtime = mtime;
        node.ctime = now();
        self.persist(&node)?;
        self.cache.fill(node);
        Ok(())
    }

    // --- unlink / rmdir ----------------------------------------------------

    #[instrument(skip(self))]
    pub fn unlink(&mut self, path: &str) -> FsResult<()> {
        let node = self.resolve(path)?;
        let parent_id = node.parent_id();
        if parent_id.is_zero() {
            return Err(FsError::PermissionDenied);
        }
        let mut parent = self.fetch(&parent_id)?;
        let idx = self
            .find_child_index(&parent, &node.path)?
            .ok_or(FsError::NotFound)?;

        for i in idx..parent.number_children - 1 {
            parent.children[i] = parent.children[i + 1];
        }
        parent.children[parent.number_children - 1] = Id::ZERO;
        parent.number_children -= 1;
        parent.ctime = now();

        self.persist(&parent)?;
        self.store.delete(&node.meta_id)?;
        if !node.data_id.is_zero() {
            self.store.delete(&node.data_id)?;
        }

        if parent.path == "/" {
            self.root = parent.clone();
        }
        self.cache.fill(parent);
        Ok(())
    }

    pub fn rmdir(&mut self, path: &str) -> FsResult<()> {
        let node = self.resolve(path)?;
        if node.number_children > REST_POS {
            return Err(FsError::NotEmpty);
        }
        self.unlink(path)
    }

    pub fn flush(&mut self, _path: &str) -> FsResult<()> {
        Ok(())
    }

    pub fn release(&mut self, _path: &str) -> FsResult<()> {
        Ok(())
    }
}

/// `path::join` against an empty accumulator should behave as if the parent
/// were the root.
fn built_or_root(built: &str) -> String {
    if built.is_empty() {
        "/".to_string()
    } else {
        built.to_string()
    }
}
