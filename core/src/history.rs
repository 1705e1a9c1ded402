//! [`HistoryIndex`]: a history plus memoized queries over it.

use crate::error::{CResult, Error};
use crate::log::{HistoryElem, ObservedTransaction, OperationLog};
use crate::op::OperationKind;
use crate::value::{ObjectId, TxnId, Version};
use std::cell::RefCell;
use std::collections::HashMap;

/// Guaranteed commit/abort status of a transaction, or the lack of one.
///
/// `Indeterminate` collapses to `Aborted` wherever a caller needs a binary
/// answer (DSG membership, version classification) but is kept distinct here
/// since an indeterminate transaction is not the same claim as an aborted one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Committed,
    Aborted,
    Indeterminate,
}

impl TransactionState {
    pub fn is_committed(self) -> bool {
        matches!(self, TransactionState::Committed)
    }
}

/// A history plus memoized queries over it.
///
/// Built once from a complete [`OperationLog`]; every query below is pure in
/// terms of that log, so results are cached in `RefCell`-guarded maps rather
/// than recomputed.
pub struct HistoryIndex {
    hist: OperationLog,
    txn_range: (TxnId, TxnId),

    txn_state: RefCell<HashMap<TxnId, TransactionState>>,
    who_wrote: RefCell<HashMap<(ObjectId, Version), usize>>,
    who_read: RefCell<HashMap<(ObjectId, Version), Vec<usize>>>,
    trace: RefCell<HashMap<ObjectId, Vec<usize>>>,
}

impl HistoryIndex {
    pub fn new(hist: OperationLog) -> CResult<Self> {
        if hist.is_empty() {
            return Err(Error::MalformedHistory("empty history".into()));
        }
        let txn_range = (hist[0].txn_id, hist[hist.len() - 1].txn_id);
        if txn_range.1 < txn_range.0 {
            return Err(Error::MalformedHistory(
                "last transaction has a smaller id than the first".into(),
            ));
        }

        Ok(HistoryIndex {
            hist,
            txn_range,
            txn_state: RefCell::new(HashMap::new()),
            who_wrote: RefCell::new(HashMap::new()),
            who_read: RefCell::new(HashMap::new()),
            trace: RefCell::new(HashMap::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.hist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hist.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryElem> {
        self.hist.iter()
    }

    pub fn get(&self, idx: usize) -> &HistoryElem {
        &self.hist[idx]
    }

    pub fn txn_range(&self) -> (TxnId, TxnId) {
        self.txn_range
    }

    /// Object ids present in this history, in the order the opening
    /// transaction touched them.
    pub fn get_objs(&self) -> Vec<ObjectId> {
        self.hist
            .iter()
            .filter(|e| e.txn_id == self.txn_range.0 && (e.op.is_write() || e.op.is_read()))
            .filter_map(|e| e.op.object().map(|o| o.id))
            .collect()
    }

    pub fn get_observed_txn(&self, txn_id: TxnId) -> CResult<ObservedTransaction> {
        let elems: Vec<HistoryElem> =
            self.hist.iter().filter(|e| e.txn_id == txn_id).cloned().collect();
        if elems.is_empty() {
            return Err(Error::NotFound(format!("T{txn_id} never appears in this history")));
        }
        Ok(ObservedTransaction::new(elems))
    }

    /// Guaranteed commit/abort status of a transaction.
    pub fn txn_state(&self, txn_id: TxnId) -> CResult<TransactionState> {
        if let Some(state) = self.txn_state.borrow().get(&txn_id) {
            return Ok(*state);
        }

        if txn_id < self.txn_range.0 || txn_id > self.txn_range.1 {
            return Err(Error::NotFound(format!(
                "T{txn_id} outside of accepted range {:?}",
                self.txn_range
            )));
        }

        let elem = self
            .hist
            .iter()
            .rev()
            .find(|e| e.txn_id == txn_id)
            .ok_or_else(|| Error::NotFound(format!("T{txn_id} never wrote to history")))?;

        let state = if elem.op.is_commit() && elem.result.is_ok() {
            TransactionState::Committed
        } else if elem.op.is_rollback() && elem.result.is_ok() {
            TransactionState::Aborted
        } else {
            TransactionState::Indeterminate
        };

        self.txn_state.borrow_mut().insert(txn_id, state);
        Ok(state)
    }

    /// The last value read for an object, standing in for its current state.
    /// Relies on the opening transaction having read every object before
    /// concurrent work started.
    pub fn final_version(&self, obj_id: ObjectId) -> CResult<Vec<Version>> {
        let elem = self
            .hist
            .iter()
            .rev()
            .find(|e| matches!(&e.op, OperationKind::Read { object, .. } if object.id == obj_id))
            .ok_or_else(|| Error::NotFound(format!("object {obj_id} does not exist")))?;

        if elem.result.is_err() {
            return Err(Error::MalformedHistory(format!(
                "last read of object {obj_id} returned an error: {:?}",
                elem.result
            )));
        }

        Ok(elem.result.value().expect("successful read carries a value").to_vec())
    }

    /// Every version committed to an object, one vector per writing
    /// transaction (the writer's last successful write, if it wrote several).
    pub fn committed_versions(&self, obj_id: ObjectId) -> CResult<Vec<Vec<Version>>> {
        let mut by_txn: HashMap<TxnId, &HistoryElem> = HashMap::new();
        for el in &self.hist {
            let matches_obj =
                matches!(&el.op, OperationKind::Write { object, .. } if object.id == obj_id);
            if matches_obj && el.result.is_ok() && self.txn_state(el.txn_id)?.is_committed() {
                by_txn.insert(el.txn_id, el);
            }
        }
        if by_txn.is_empty() {
            return Err(Error::NotFound(format!(
                "object {obj_id} was never written (probably doesn't exist)"
            )));
        }

        Ok(by_txn
            .values()
            .map(|el| el.value_written.clone().expect("committed write has a value_written"))
            .collect())
    }

    /// The history element which wrote a version of an object, identified by
    /// the integer that write appended. Does not imply the version was ever
    /// installed.
    pub fn who_wrote(&self, obj_id: ObjectId, version: Version) -> CResult<usize> {
        if let Some(idx) = self.who_wrote.borrow().get(&(obj_id, version)) {
            return Ok(*idx);
        }
        if let Some(trace) = self.trace.borrow().get(&obj_id) {
            if let Some(idx) = trace.iter().find(|&&i| {
                matches!(&self.hist[i].op, OperationKind::Write { value, .. } if *value == version)
            }) {
                return Ok(*idx);
            }
        }

        let idx = self
            .hist
            .iter()
            .position(|e| {
                matches!(&e.op, OperationKind::Write { object, value } if object.id == obj_id && *value == version)
            })
            .ok_or_else(|| {
                Error::NotFound(format!("version {version} was never written for object {obj_id}"))
            })?;

        self.who_wrote.borrow_mut().insert((obj_id, version), idx);
        Ok(idx)
    }

    /// Every history element which read a version of an object, identified
    /// by the trailing element of the vector it observed.
    pub fn who_read(&self, obj_id: ObjectId, version: Version) -> CResult<Vec<usize>> {
        if let Some(idxs) = self.who_read.borrow().get(&(obj_id, version)) {
            return Ok(idxs.clone());
        }
        if !self.get_objs().contains(&obj_id) {
            return Err(Error::NotFound(format!("object {obj_id} does not exist")));
        }

        let idxs: Vec<usize> = self
            .reads_from(obj_id)?
            .into_iter()
            .filter(|&i| {
                self.hist[i].result.value().map(|v| v.last() == Some(&version)).unwrap_or(false)
            })
            .collect();

        self.who_read.borrow_mut().insert((obj_id, version), idxs.clone());
        Ok(idxs)
    }

    /// Every version an object went through, in the order it was written,
    /// restricted to versions that ended up committed.
    pub fn trace(&self, obj_id: ObjectId) -> CResult<Vec<usize>> {
        if let Some(trace) = self.trace.borrow().get(&obj_id) {
            return Ok(trace.clone());
        }

        let committed = self.committed_versions(obj_id)?;

        let mut checked = std::collections::HashSet::new();
        let mut trace = Vec::new();
        for ver in &committed {
            for &v in ver {
                if checked.insert(v) {
                    trace.push(self.who_wrote(obj_id, v)?);
                }
            }
        }

        self.trace.borrow_mut().insert(obj_id, trace.clone());
        Ok(trace)
    }

    /// Indices of every successful read of an object.
    pub fn reads_from(&self, obj_id: ObjectId) -> CResult<Vec<usize>> {
        Ok(self
            .hist
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                matches!(&e.op, OperationKind::Read { object, .. } if object.id == obj_id)
                    && e.result.is_ok()
            })
            .map(|(i, _)| i)
            .collect())
    }

    /// Indeterminate transactions collapse into "aborted" here (§3): a
    /// version left behind by a transaction that never definitely
    /// committed is not a value any other transaction should be able to
    /// see as installed.
    pub fn is_aborted_ver(&self, obj_id: ObjectId, version: Version) -> CResult<bool> {
        let idx = self.who_wrote(obj_id, version)?;
        Ok(self.txn_state(self.hist[idx].txn_id)? != TransactionState::Committed)
    }

    /// `true` if this version is the last value a committed transaction left
    /// behind for this object (as opposed to an intermediate value
    /// overwritten by the same transaction before it committed).
    pub fn is_installed_ver(&self, obj_id: ObjectId, version: Version) -> CResult<bool> {
        if self.is_aborted_ver(obj_id, version)? {
            return Ok(false);
        }

        let trace = self.trace(obj_id)?;
        for (idx, &elem_idx) in trace.iter().enumerate() {
            let elem = &self.hist[elem_idx];
            if matches!(&elem.op, OperationKind::Write { value, .. } if *value == version) {
                let no_later_same_txn =
                    trace[idx + 1..].iter().all(|&later| self.hist[later].txn_id != elem.txn_id);
                return Ok(no_later_same_txn
                    && self.txn_state(elem.txn_id)? == TransactionState::Committed);
            }
        }

        Ok(false)
    }

    pub fn is_intermediate_ver(&self, obj_id: ObjectId, version: Version) -> CResult<bool> {
        let idx = self.who_wrote(obj_id, version)?;
        Ok(!self.is_aborted_ver(obj_id, version)?
            && !self.is_installed_ver(obj_id, version)?
            && self.txn_state(self.hist[idx].txn_id)? == TransactionState::Committed)
    }
}
