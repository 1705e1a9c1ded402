//! Adya's anomaly taxonomy: what a cycle's edge types mean, and how
//! anomalies imply one another.
//!
//! Nine variants (`GCursor` through `GUpdate`) are declared per Adya's
//! thesis but have no known decision procedure from edge types alone; they
//! are kept as real enum members (so `implies`/`closure` stay total) whose
//! `identify_cycle` always returns `false`.

use crate::dependency::EdgeType;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnomalyKind {
    G0,
    G1c,
    G1,
    G1a,
    G1b,
    G2Item,
    GSingle,
    GSingleItem,
    G2,
    GCursor,
    GMsrA,
    GMsrB,
    GMsr,
    GMonotonic,
    GSiA,
    GSiB,
    GSi,
    GUpdate,
}

impl AnomalyKind {
    /// Every cyclical kind this taxonomy knows, ordered so that a kind never
    /// precedes something it is implied by — used by `minimal_type`.
    const CYCLICAL: &'static [AnomalyKind] = &[
        AnomalyKind::G0,
        AnomalyKind::G1c,
        AnomalyKind::GMonotonic,
        AnomalyKind::GCursor,
        AnomalyKind::GMsrA,
        AnomalyKind::GMsrB,
        AnomalyKind::GSiA,
        AnomalyKind::GSiB,
        AnomalyKind::GUpdate,
        AnomalyKind::GMsr,
        AnomalyKind::GSi,
        AnomalyKind::GSingleItem,
        AnomalyKind::GSingle,
        AnomalyKind::G2Item,
        AnomalyKind::G2,
    ];
}

pub fn description(kind: AnomalyKind) -> &'static str {
    match kind {
        AnomalyKind::G0 => "G0: write cycles",
        AnomalyKind::G1c => "G1c: circular information flow",
        AnomalyKind::G1 => "G1: dirty reads",
        AnomalyKind::G1a => "G1a: read aborted write",
        AnomalyKind::G1b => "G1b: read intermediate write",
        AnomalyKind::G2Item => "G2-item: item anti dependency cycle",
        AnomalyKind::GSingle => "G-single: single anti dependency cycle",
        AnomalyKind::GSingleItem => "G-single-item: single item anti dependency cycle",
        AnomalyKind::G2 => "G2: anti dependency cycle",
        AnomalyKind::GCursor => "G-cursor: labeled single anti dependency cycle",
        AnomalyKind::GMsrA => "G-MSRa: action interference",
        AnomalyKind::GMsrB => "G-MSRb: action missed",
        AnomalyKind::GMsr => "G-MSR: monotonic snapshot read violation",
        AnomalyKind::GMonotonic => "G-monotonic: monotonic reads",
        AnomalyKind::GSiA => "G-SIa: interference",
        AnomalyKind::GSiB => "G-SIb: missed effects",
        AnomalyKind::GSi => "G-SI: snapshot isolation violation",
        AnomalyKind::GUpdate => "G-update: single anti dependency cycle with update transmission",
    }
}

/// The edge types a cycle of this kind is restricted to, used to project
/// the DSG down to a subgraph before cycle enumeration. Empty for the
/// unimplemented stubs, which never match any cycle anyway.
pub fn edge_types(kind: AnomalyKind) -> &'static [EdgeType] {
    use EdgeType::*;
    match kind {
        AnomalyKind::G0 => &[Ww],
        AnomalyKind::G1c => &[Ww, Wr],
        AnomalyKind::G2Item => &[Ww, Wr, Rw],
        AnomalyKind::GSingle => &[Ww, Wr, Rw, Prw],
        AnomalyKind::GSingleItem => &[Ww, Wr, Rw],
        AnomalyKind::G2 => &[Ww, Wr, Rw, Prw],
        AnomalyKind::G1 | AnomalyKind::G1a | AnomalyKind::G1b => &[],
        _ => &[],
    }
}

/// Does this cycle's sequence of edge types match this anomaly kind?
///
/// Takes only the edge-type sequence (not node identity) since no kind in
/// this taxonomy inspects which transactions the cycle passes through, only
/// the multiset of dependency types between them.
pub fn identify_cycle(kind: AnomalyKind, edge_cycle: &[EdgeType]) -> bool {
    match kind {
        AnomalyKind::G0 => edge_cycle.iter().all(|e| edge_types(kind).contains(e)),
        AnomalyKind::G1c => edge_cycle.iter().all(|e| edge_types(kind).contains(e)),
        AnomalyKind::G2Item => {
            edge_cycle.iter().all(|e| edge_types(kind).contains(e))
                && edge_cycle.iter().any(|e| *e == EdgeType::Rw)
        }
        AnomalyKind::GSingle => {
            edge_cycle.iter().all(|e| edge_types(kind).contains(e))
                && edge_cycle.iter().filter(|e| matches!(e, EdgeType::Rw | EdgeType::Prw)).count() == 1
        }
        AnomalyKind::GSingleItem => {
            edge_cycle.iter().all(|e| edge_types(kind).contains(e))
                && edge_cycle.iter().filter(|e| **e == EdgeType::Rw).count() == 1
        }
        AnomalyKind::G2 => {
            edge_cycle.iter().all(|e| edge_types(kind).contains(e))
                && edge_cycle.iter().any(|e| matches!(e, EdgeType::Rw | EdgeType::Prw))
        }
        // G-cursor, G-MSRa/b, G-MSR, G-monotonic, G-SIa/b, G-SI, G-update: no decision procedure implemented.
        AnomalyKind::GCursor
        | AnomalyKind::GMsrA
        | AnomalyKind::GMsrB
        | AnomalyKind::GMsr
        | AnomalyKind::GMonotonic
        | AnomalyKind::GSiA
        | AnomalyKind::GSiB
        | AnomalyKind::GSi
        | AnomalyKind::GUpdate => false,
        AnomalyKind::G1 | AnomalyKind::G1a | AnomalyKind::G1b => false,
    }
}

/// Direct implications: kinds this kind's presence necessarily also
/// satisfies (a weaker anomaly whose conditions a stronger one subsumes).
pub fn implies(kind: AnomalyKind) -> &'static [AnomalyKind] {
    use AnomalyKind::*;
    match kind {
        G0 => &[G1c],
        G1c => &[G1],
        GMonotonic => &[G2Item],
        GCursor => &[G2Item, GSingle],
        GMsrA => &[GMsr],
        GMsrB => &[GMsr],
        GSiA => &[GSi],
        GSiB => &[GSi],
        GUpdate => &[G2],
        GMsr => &[G2],
        GSi => &[G2],
        GSingleItem => &[GSingle, G2Item],
        GSingle => &[G2],
        G2Item => &[G2],
        G2 => &[],
        G1a => &[G1],
        G1b => &[G1],
        G1 => &[],
    }
}

/// Transitive closure of [`implies`], including `kind` itself.
pub fn closure(kind: AnomalyKind) -> Vec<AnomalyKind> {
    let mut found = Vec::new();
    let mut frontier = vec![kind];
    while !frontier.is_empty() {
        let next: Vec<AnomalyKind> = frontier.iter().flat_map(|k| implies(*k).iter().copied()).collect();
        found.extend(frontier);
        frontier = next;
    }
    found
}

/// The cyclical kinds to enumerate against the DSG so that a proscribed set
/// is fully covered: every cyclical kind whose closure reaches one of
/// `anomaly_types` (the closure-preimage), not just the cyclical kinds that
/// literally appear in `anomaly_types`.
///
/// A level like PL-2 proscribes only `G1`, a non-cyclical kind; without this
/// preimage a caller that filtered `anomaly_types` down to its literal
/// cyclical members would enumerate nothing and miss the G0/G1c cycles that
/// imply `G1`. Shared by [`crate::checker::check_history`] and any caller
/// (e.g. the CLI's `--graph`) that needs the same cyclical set.
pub fn cyclical_closure_preimage(anomaly_types: &[AnomalyKind]) -> Vec<AnomalyKind> {
    AnomalyKind::CYCLICAL
        .iter()
        .copied()
        .filter(|k| closure(*k).iter().any(|c| anomaly_types.contains(c)))
        .collect()
}

/// Classify a cycle's edge-type sequence into its single minimal anomaly
/// kind: the most specific kind it matches, out of every kind that matches.
///
/// Returns `None` if no kind matches, or if more than one matched kind is
/// minimal (neither implied by any other match) — both indicate a bug in
/// this taxonomy or in DSG construction, not bad input.
pub fn minimal_type(edge_cycle: &[EdgeType]) -> Option<AnomalyKind> {
    let matched: Vec<AnomalyKind> =
        AnomalyKind::CYCLICAL.iter().copied().filter(|k| identify_cycle(*k, edge_cycle)).collect();
    if matched.is_empty() {
        return None;
    }

    let minimal: Vec<AnomalyKind> = matched
        .iter()
        .copied()
        .filter(|&kind| {
            matched.iter().copied().filter(|&other| other != kind).all(|other| !closure(other).contains(&kind))
        })
        .collect();

    if minimal.len() == 1 {
        Some(minimal[0])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::EdgeType::*;

    #[test]
    fn all_ww_cycle_is_g0() {
        assert_eq!(minimal_type(&[Ww, Ww]), Some(AnomalyKind::G0));
    }

    #[test]
    fn mixed_ww_wr_cycle_is_g1c_not_g0() {
        assert_eq!(minimal_type(&[Ww, Wr]), Some(AnomalyKind::G1c));
    }

    #[test]
    fn single_rw_among_ww_is_g_single_item() {
        assert_eq!(minimal_type(&[Ww, Ww, Rw]), Some(AnomalyKind::GSingleItem));
    }

    #[test]
    fn rw_and_prw_together_is_plain_g2() {
        assert_eq!(minimal_type(&[Rw, Prw]), Some(AnomalyKind::G2));
    }

    #[test]
    fn closure_is_reflexive() {
        assert!(closure(AnomalyKind::G2).contains(&AnomalyKind::G2));
    }

    #[test]
    fn unimplemented_kinds_never_match() {
        assert!(!identify_cycle(AnomalyKind::GMonotonic, &[Ww, Wr, Rw]));
        assert!(!identify_cycle(AnomalyKind::GSi, &[Ww, Wr, Rw, Prw]));
    }
}
