//! Top-level entry point: verify a history against an isolation level.

use crate::dsg::Dsg;
use crate::error::CResult;
use crate::history::HistoryIndex;
use crate::noncyclical::{find_g1a, find_g1b};
use crate::policy::{proscribed_anomalies, IsolationLevel};
use crate::taxonomy::{self, AnomalyKind};
use crate::witness::Anomaly;

/// Verifies that a history is valid under the given isolation level.
///
/// Finds every anomaly that level proscribes, stopping once `limit`
/// anomalies have been collected (histories with a genuine isolation bug
/// can have an enormous number of overlapping witnesses; a limit keeps
/// output readable).
pub fn check_history(
    hist: &HistoryIndex,
    level: IsolationLevel,
    limit: Option<usize>,
) -> CResult<Vec<Anomaly>> {
    let anomaly_types = proscribed_anomalies(level);
    let cyclical_types = taxonomy::cyclical_closure_preimage(anomaly_types);

    let dsg = Dsg::build(hist)?;
    let mut anomalies = Vec::new();

    if anomaly_types.contains(&AnomalyKind::G1) {
        anomalies.extend(find_g1a(hist)?);
        anomalies.extend(find_g1b(hist)?);
    }

    for anomaly in dsg.find_anomalies(&cyclical_types)? {
        anomalies.push(anomaly);
        if let Some(limit) = limit {
            if anomalies.len() >= limit {
                break;
            }
        }
    }

    Ok(anomalies)
}

/// Builds the [`Dsg`] for a history, for callers (e.g. the CLI's `--graph`
/// flag) that need it alongside the anomaly list.
pub fn build_dsg(hist: &HistoryIndex) -> CResult<Dsg> {
    Dsg::build(hist)
}
