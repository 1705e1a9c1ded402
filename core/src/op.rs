//! Operations and their results.
//!
//! Rust enums make constructor-time validation (e.g. "a WRITE requires an
//! object") unnecessary: invalid combinations of operation kind and payload
//! are simply unrepresentable.

use crate::value::{DbObject, ObjectId, Version};
use serde_derive::{Deserialize, Serialize};

/// A single operation invocation, as observed in the log.
///
/// `Write`'s `value` is the integer to append; the vector it actually
/// produces (`value_written`) is only known once the write executes, so it
/// lives on [`crate::log::HistoryElem`], not here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    SetIsolation { isolation_level: String },
    Begin,
    Commit,
    Rollback,
    Read { object: DbObject, for_update: bool },
    Write { object: DbObject, value: Version },
    PredicateRead { tables: Vec<String>, threshold: i64, for_update: bool },
}

impl OperationKind {
    /// The object this operation touches, if any.
    pub fn object(&self) -> Option<&DbObject> {
        match self {
            OperationKind::Read { object, .. } | OperationKind::Write { object, .. } => Some(object),
            _ => None,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, OperationKind::Write { .. })
    }

    pub fn is_read(&self) -> bool {
        matches!(self, OperationKind::Read { .. })
    }

    pub fn is_predicate_read(&self) -> bool {
        matches!(self, OperationKind::PredicateRead { .. })
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, OperationKind::Commit)
    }

    pub fn is_rollback(&self) -> bool {
        matches!(self, OperationKind::Rollback)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::SetIsolation { isolation_level } => {
                write!(f, "set transaction isolation level {isolation_level}")
            }
            OperationKind::Begin => write!(f, "begin"),
            OperationKind::Commit => write!(f, "commit"),
            OperationKind::Rollback => write!(f, "rollback"),
            OperationKind::Read { object, .. } => write!(f, "r({})", object.id),
            OperationKind::Write { object, value } => write!(f, "w({}, {})", object.id, value),
            OperationKind::PredicateRead { threshold, .. } => write!(f, "pr(len > {threshold})"),
        }
    }
}

/// Result of executing an [`OperationKind`].
///
/// An opaque error is rendered to a string at record time: the checker
/// never needs to inspect the original error type, only whether an error
/// occurred.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpResult {
    Empty,
    Value(Vec<Version>),
    Values(Vec<(ObjectId, Vec<Version>)>),
    Err(String),
}

impl OpResult {
    pub fn is_ok(&self) -> bool {
        !matches!(self, OpResult::Err(_))
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// The item-read value-vector, if this is a successful [`OpResult::Value`].
    pub fn value(&self) -> Option<&[Version]> {
        match self {
            OpResult::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The predicate-read rows, if this is a successful [`OpResult::Values`].
    pub fn values(&self) -> Option<&[(ObjectId, Vec<Version>)]> {
        match self {
            OpResult::Values(v) => Some(v),
            _ => None,
        }
    }
}
