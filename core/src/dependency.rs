//! Dependency extraction: read the four Adya dependency edge types out of a
//! [`HistoryIndex`].

use crate::error::{CResult, Error};
use crate::history::{HistoryIndex, TransactionState};
use crate::op::OperationKind;
use crate::value::{is_prefix, ObjectId, TxnId, Version};

/// The four dependency edge types of Adya's Direct Serialization Graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeType {
    Ww,
    Wr,
    Rw,
    Prw,
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EdgeType::Ww => "ww",
            EdgeType::Wr => "wr",
            EdgeType::Rw => "rw",
            EdgeType::Prw => "prw",
        };
        write!(f, "{s}")
    }
}

/// One dependency edge found by [`find_dependencies`].
#[derive(Clone, Debug)]
pub struct Dependency {
    pub edge_type: EdgeType,
    pub target_txn: TxnId,
    pub object: ObjectId,
    pub version: Vec<Version>,
}

/// Find the longest committed version vector of `obj_id` containing `val`.
fn longest_ver_containing(vers: &[Vec<Version>], val: Version) -> CResult<Vec<Version>> {
    vers.iter()
        .filter(|v| v.contains(&val))
        .max_by_key(|v| v.len())
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("could not find any committed version containing {val}")))
}

/// Every dependency originating from a committed transaction's operations.
///
/// Targets that did not commit are dropped at the end: an edge to a
/// transaction whose fate is aborted or indeterminate carries no ordering
/// constraint on the committed graph.
pub fn find_dependencies(hist: &HistoryIndex, txn_id: TxnId) -> CResult<Vec<Dependency>> {
    let txn = hist.get_observed_txn(txn_id)?;
    let mut deps = Vec::new();

    for el in txn.elems() {
        match &el.op {
            OperationKind::Write { object, value } => {
                let committed = hist.committed_versions(object.id)?;
                let ver = longest_ver_containing(&committed, *value)?;
                let idx = ver.iter().position(|v| v == value).expect("value is in ver by construction");

                if idx + 1 < ver.len() {
                    let next_writer = hist.get(hist.who_wrote(object.id, ver[idx + 1])?).txn_id;
                    deps.push(Dependency {
                        edge_type: EdgeType::Ww,
                        target_txn: next_writer,
                        object: object.id,
                        version: ver[..idx + 2].to_vec(),
                    });
                }

                for reader_idx in hist.who_read(object.id, *value)? {
                    deps.push(Dependency {
                        edge_type: EdgeType::Wr,
                        target_txn: hist.get(reader_idx).txn_id,
                        object: object.id,
                        version: ver[..idx + 1].to_vec(),
                    });
                }
            }
            OperationKind::Read { object, .. } => {
                let committed = hist.committed_versions(object.id)?;
                let read_ver = el.result.value().expect("committed read has a value")
                    [el.result.value().unwrap().len() - 1];
                let ver = longest_ver_containing(&committed, read_ver)?;
                let idx = ver.iter().position(|v| *v == read_ver).expect("value is in ver by construction");

                if idx + 1 < ver.len() {
                    let next_writer = hist.get(hist.who_wrote(object.id, ver[idx + 1])?).txn_id;
                    deps.push(Dependency {
                        edge_type: EdgeType::Rw,
                        target_txn: next_writer,
                        object: object.id,
                        version: ver[..idx + 2].to_vec(),
                    });
                }
            }
            OperationKind::PredicateRead { tables, threshold, .. } => {
                let boundary_len = *threshold;
                let matched_prefixes: Vec<&[Version]> =
                    el.result.values().map(|rows| rows.iter().map(|(_, v)| v.as_slice()).collect()).unwrap_or_default();

                for dep in hist.iter() {
                    let OperationKind::Write { object, .. } = &dep.op else { continue };
                    let matches_shape = tables.contains(&object.table)
                        && dep.value_written.as_ref().map(|v| v.len() as i64 == boundary_len + 1).unwrap_or(false);
                    if !matches_shape {
                        continue;
                    }
                    let written = dep.value_written.as_ref().unwrap();
                    let already_seen = matched_prefixes.iter().any(|v| is_prefix(written, v));
                    if already_seen {
                        continue;
                    }
                    deps.push(Dependency {
                        edge_type: EdgeType::Prw,
                        target_txn: dep.txn_id,
                        object: object.id,
                        version: written.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    let mut result = Vec::with_capacity(deps.len());
    for dep in deps {
        let is_self_loop = dep.target_txn == txn_id;
        if !is_self_loop && hist.txn_state(dep.target_txn)? == TransactionState::Committed {
            result.push(dep);
        }
    }
    Ok(result)
}
