//! Fixed-width big-endian encoding for `Node` records.
//!
//! Mirrors the field-by-field `byteorder` discipline used elsewhere in this
//! codebase's wire codecs, minus the 4-byte alignment padding those need —
//! these records are store values, not framed messages.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

use crate::error::FsError;
use crate::ident::Id;
use crate::record::{Node, MAX_CHILDREN, PATH_MAX_LEN};

/// Total encoded size of a `Node` record, in bytes.
pub const NODE_RECORD_LEN: usize =
    2 + PATH_MAX_LEN + 16 + 16 + 4 + 4 + 4 + 8 + 8 + 8 + 4 + MAX_CHILDREN * 16;

fn write_id<W: Write>(w: &mut W, id: &Id) -> std::io::Result<()> {
    w.write_all(&id.0)
}

fn read_id<R: Read>(r: &mut R) -> std::io::Result<Id> {
    let mut buf = [0u8; 16];
    r.read_exact(&mut buf)?;
    Ok(Id(buf))
}

pub fn encode(node: &Node) -> Vec<u8> {
    let mut buf = Vec::with_capacity(NODE_RECORD_LEN);
    let path_bytes = node.path.as_bytes();
    buf.write_u16::<BigEndian>(path_bytes.len() as u16).unwrap();
    let mut padded = vec![0u8; PATH_MAX_LEN];
    padded[..path_bytes.len()].copy_from_slice(path_bytes);
    buf.write_all(&padded).unwrap();

    write_id(&mut buf, &node.meta_id).unwrap();
    write_id(&mut buf, &node.data_id).unwrap();
    buf.write_u32::<BigEndian>(node.mode).unwrap();
    buf.write_u32::<BigEndian>(node.uid).unwrap();
    buf.write_u32::<BigEndian>(node.gid).unwrap();
    buf.write_u64::<BigEndian>(node.size).unwrap();
    buf.write_u64::<BigEndian>(node.mtime).unwrap();
    buf.write_u64::<BigEndian>(node.ctime).unwrap();
    buf.write_u32::<BigEndian>(node.number_children as u32).unwrap();
    for child in node.children.iter() {
        write_id(&mut buf, child).unwrap();
    }
    debug_assert_eq!(buf.len(), NODE_RECORD_LEN);
    buf
}

pub fn decode(bytes: &[u8]) -> Result<Node, FsError> {
    if bytes.len() != NODE_RECORD_LEN {
        return Err(FsError::Corrupt(format!(
            "node record has {} bytes, expected {}",
            bytes.len(),
            NODE_RECORD_LEN
        )));
    }
    let mut cur = Cursor::new(bytes);

    let path_len = cur
        .read_u16::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))? as usize;
    if path_len > PATH_MAX_LEN {
        return Err(FsError::Corrupt("path length prefix exceeds bound".into()));
    }
    let mut path_buf = vec![0u8; PATH_MAX_LEN];
    cur.read_exact(&mut path_buf)
        .map_err(|e| FsError::Corrupt(e.to_string()))?;
    let path = String::from_utf8(path_buf[..path_len].to_vec())
        .map_err(|e| FsError::Corrupt(e.to_string()))?;

    let meta_id = read_id(&mut cur).map_err(|e| FsError::Corrupt(e.to_string()))?;
    let data_id = read_id(&mut cur).map_err(|e| FsError::Corrupt(e.to_string()))?;
    let mode = cur
        .read_u32::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))?;
    let uid = cur
        .read_u32::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))?;
    let gid = cur
        .read_u32::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))?;
    let size = cur
        .read_u64::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))?;
    let mtime = cur
        .read_u64::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))?;
    let ctime = cur
        .read_u64::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))?;
    let number_children = cur
        .read_u32::<BigEndian>()
        .map_err(|e| FsError::Corrupt(e.to_string()))? as usize;
    if number_children > MAX_CHILDREN {
        return Err(FsError::Corrupt("number_children exceeds bound".into()));
    }

    let mut children = [Id::ZERO; MAX_CHILDREN];
    for slot in children.iter_mut() {
        *slot = read_id(&mut cur).map_err(|e| FsError::Corrupt(e.to_string()))?;
    }

    Ok(Node {
        path,
        meta_id,
        data_id,
        mode,
        uid,
        gid,
        size,
        mtime,
        ctime,
        number_children,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PARENT_POS, SELF_POS};

    #[test]
    fn round_trip_root() {
        let node = Node::new_root(Id::fresh(), Id::ZERO, 0o755, 0, 0, 1_000);
        let bytes = encode(&node);
        assert_eq!(bytes.len(), NODE_RECORD_LEN);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn round_trip_child_with_children() {
        let parent_id = Id::fresh();
        let mut node = Node::new_child(
            "/a/b".into(),
            Id::fresh(),
            Id::fresh(),
            parent_id,
            0o644,
            1000,
            1000,
            42,
        );
        node.children[2] = Id::fresh();
        node.number_children = 3;
        let decoded = decode(&encode(&node)).unwrap();
        assert_eq!(decoded, node);
        assert_eq!(decoded.children[SELF_POS], node.meta_id);
        assert_eq!(decoded.children[PARENT_POS], parent_id);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = decode(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, FsError::Corrupt(_)));
    }
}
