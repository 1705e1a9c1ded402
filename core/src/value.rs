//! Value model: objects and the append-only integer vectors that encode
//! their write history.

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A version id: the integer one transaction contributes to an object's
/// value-vector. The workload generator hands these out from a monotonic
/// counter; the checker only ever requires them to be unique per object.
pub type Version = i64;

/// Numeric identity of a [`DbObject`], unique within a history.
pub type ObjectId = i64;

/// A transaction identifier. Transaction ids in a history form a contiguous
/// range `[first, last]`.
pub type TxnId = i64;

/// An object in the database: an id plus the logical table it lives in.
///
/// An object's state is the append-only vector built up by every committed
/// write to it; see [`crate::history::HistoryIndex::committed_versions`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbObject {
    pub id: ObjectId,
    pub table: String,
}

impl DbObject {
    pub fn new(id: ObjectId, table: impl Into<String>) -> Self {
        DbObject { id, table: table.into() }
    }
}

impl fmt::Display for DbObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.table, self.id)
    }
}

/// Full value-vector of an object: the ordered concatenation of every
/// version contributed to it so far. The last element is the "version id"
/// for write/read-tracking purposes.
pub type ValueVec = Vec<Version>;

/// `true` if `prefix` is a (not-necessarily-proper) prefix of `whole`.
pub fn is_prefix(prefix: &[Version], whole: &[Version]) -> bool {
    prefix.len() <= whole.len() && prefix.iter().zip(whole.iter()).all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vector_is_a_prefix_of_anything() {
        assert!(is_prefix(&[], &[1, 2, 3]));
        assert!(is_prefix(&[], &[]));
    }

    #[test]
    fn exact_match_and_mismatch() {
        assert!(is_prefix(&[0, 1, 2], &[0, 1, 2]));
        assert!(!is_prefix(&[0, 1, 2], &[0, 1]));
        assert!(!is_prefix(&[0, 2], &[0, 1, 2]));
    }
}
