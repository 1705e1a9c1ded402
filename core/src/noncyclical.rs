//! Non-cyclical anomalies: G1a (aborted reads) and G1b (intermediate reads).
//! Neither needs the DSG — both are local properties of a single read.

use crate::error::CResult;
use crate::history::HistoryIndex;
use crate::taxonomy::AnomalyKind;
use crate::witness::Anomaly;

/// Shared shape of G1a/G1b: a read observed a version written by a
/// transaction whose fate (aborted, or committed-but-superseded-by-itself)
/// disqualifies that version from ever being visible.
fn find_dirty_reads(
    hist: &HistoryIndex,
    kind: AnomalyKind,
    disqualified: impl Fn(&HistoryIndex, i64, i64) -> CResult<bool>,
) -> CResult<Vec<Anomaly>> {
    let mut anomalies = Vec::new();

    for obj_id in hist.get_objs() {
        for reader_idx in hist.reads_from(obj_id)? {
            let reader = hist.get(reader_idx);
            let ver = *reader.result.value().expect("successful read carries a value").last().unwrap();

            if !disqualified(hist, obj_id, ver)? {
                continue;
            }

            let writer_idx = hist.who_wrote(obj_id, ver)?;
            let writer = hist.get(writer_idx);
            if writer.txn_id == reader.txn_id {
                continue;
            }

            let reader_txn = hist.get_observed_txn(reader.txn_id)?;
            let writer_txn = hist.get_observed_txn(writer.txn_id)?;

            let explanation = vec![
                format!(
                    "T{} reads r({}) -> {:?}",
                    reader.txn_id,
                    obj_id,
                    reader.result.value().unwrap()
                ),
                format!(
                    "{} -> {:?} was written by T{} which {}",
                    obj_id,
                    writer.value_written,
                    writer.txn_id,
                    if kind == AnomalyKind::G1a { "aborted" } else { "is an intermediate value" }
                ),
            ];

            anomalies.push(Anomaly { kind, txns: vec![reader_txn, writer_txn], explanation });
        }
    }

    Ok(anomalies)
}

pub fn find_g1a(hist: &HistoryIndex) -> CResult<Vec<Anomaly>> {
    find_dirty_reads(hist, AnomalyKind::G1a, |h, obj, ver| h.is_aborted_ver(obj, ver))
}

pub fn find_g1b(hist: &HistoryIndex) -> CResult<Vec<Anomaly>> {
    find_dirty_reads(hist, AnomalyKind::G1b, |h, obj, ver| h.is_intermediate_ver(obj, ver))
}
