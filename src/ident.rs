//! 128-bit opaque record identifiers.

use uuid::Uuid;

/// A 128-bit key into the store. Used both as a node's `meta_id` and as a
/// data blob's `data_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub [u8; 16]);

impl Id {
    /// The all-zero sentinel: "no such record" in whatever context it appears
    /// (an unset `data_id`, or the root's `PARENT_POS`).
    pub const ZERO: Id = Id([0u8; 16]);

    /// The well-known key under which the root node's record is stored.
    /// Distinct from `ZERO`, which means "absent" rather than "the root".
    pub const ROOT_KEY: Id = Id([0xFFu8; 16]);

    /// Allocate a fresh identifier. Collisions are not checked for; at
    /// UUIDv4 entropy the probability is negligible for this filesystem's
    /// scale.
    pub fn fresh() -> Id {
        Id(*Uuid::new_v4().as_bytes())
    }

    pub fn is_zero(&self) -> bool {
        *self == Id::ZERO
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(Id::ZERO.is_zero());
        assert!(!Id::fresh().is_zero());
    }

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(Id::fresh(), Id::fresh());
    }

    #[test]
    fn root_key_is_not_zero() {
        assert_ne!(Id::ROOT_KEY, Id::ZERO);
    }
}
