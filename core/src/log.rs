//! Operation Log: the flat, time-ordered record that is the sole input to
//! the core.

use crate::op::{OpResult, OperationKind};
use crate::value::{TxnId, Version};
use serde_derive::{Deserialize, Serialize};

/// One recorded invocation: the operation, its result, the connection and
/// transaction it ran under, and its invocation/response timestamps.
///
/// `value_written` is only meaningful for `Write` operations, and is set at
/// execution time (the full vector actually appended), not at operation
/// construction — the operation alone only knows the integer to append.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryElem {
    pub op: OperationKind,
    pub result: OpResult,
    pub conn_id: i64,
    pub txn_id: TxnId,
    pub invoc: f64,
    pub resp: f64,
    pub value_written: Option<Vec<Version>>,
}

impl HistoryElem {
    pub fn new(
        op: OperationKind,
        result: OpResult,
        conn_id: i64,
        txn_id: TxnId,
        invoc: f64,
        resp: f64,
    ) -> Self {
        HistoryElem { op, result, conn_id, txn_id, invoc, resp, value_written: None }
    }

    /// Builder used by the generator once a write's contributed vector is
    /// known.
    pub fn with_value_written(mut self, value_written: Vec<Version>) -> Self {
        self.value_written = Some(value_written);
        self
    }
}

impl std::fmt::Display for HistoryElem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[conn {}, T{}]: @{}--{}: {} => {:?}",
            self.conn_id, self.txn_id, self.invoc, self.resp, self.op, self.result
        )
    }
}

/// A complete recorded history: a flat, time-ordered sequence of
/// [`HistoryElem`]s. The only input [`crate::history::HistoryIndex`] consumes.
pub type OperationLog = Vec<HistoryElem>;

/// A transaction viewed as its observed sub-sequence of history elements.
#[derive(Clone, Debug)]
pub struct ObservedTransaction {
    elems: Vec<HistoryElem>,
}

impl ObservedTransaction {
    /// Builds an observed transaction from a (non-empty) slice of elements,
    /// all of which must share a transaction id.
    pub fn new(elems: Vec<HistoryElem>) -> Self {
        debug_assert!(!elems.is_empty(), "an observed transaction needs at least one element");
        debug_assert!(
            elems.iter().all(|e| e.txn_id == elems[0].txn_id),
            "observed transaction has elements from multiple transactions"
        );
        ObservedTransaction { elems }
    }

    pub fn id(&self) -> TxnId {
        self.elems[0].txn_id
    }

    pub fn elems(&self) -> &[HistoryElem] {
        &self.elems
    }
}

impl std::fmt::Display for ObservedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ops: Vec<String> = self
            .elems
            .iter()
            .filter(|e| !matches!(e.op, crate::op::OperationKind::SetIsolation { .. }))
            .map(|e| format!("{} -> {:?}", e.op, e.result))
            .collect();
        write!(f, "T{}: {}", self.id(), ops.join(", "))
    }
}
