//! Isolation levels and which anomalies they proscribe.

use crate::taxonomy::AnomalyKind;

/// Isolation levels as defined in Adya's PhD thesis, plus the vernacular
/// names used elsewhere in the literature (Jepsen, ANSI SQL).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    Pl0,
    Pl1,
    Pl2,
    PlCs,
    Pl2L,
    PlMsr,
    Pl2Plus,
    PlFcv,
    PlSi,
    Pl299,
    Pl3U,
    Pl3,
    /// Strict serializability. No Real-time Serialization Graph (the edges
    /// that would additionally forbid real-time-order violations) is
    /// implemented, so this proscribes the same anomalies as `Pl3`.
    PlSs,
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IsolationLevel::Pl0 => "PL-0",
            IsolationLevel::Pl1 => "PL-1",
            IsolationLevel::Pl2 => "PL-2",
            IsolationLevel::PlCs => "PL-CS - Cursor Stability",
            IsolationLevel::Pl2L => "PL-2L - Monotonic View",
            IsolationLevel::PlMsr => "PL-MSR - Monotonic Snapshot Reads",
            IsolationLevel::Pl2Plus => "PL-2+ - Consistent View",
            IsolationLevel::PlFcv => "PL-FCV - Forward Consistent View",
            IsolationLevel::PlSi => "PL-SI - Snapshot Isolation",
            IsolationLevel::Pl299 => "PL-2.99 - Repeatable Read",
            IsolationLevel::Pl3U => "PL-3U - Update Serializability",
            IsolationLevel::Pl3 => "PL-3 - Full Serializability",
            IsolationLevel::PlSs => "PL-SS - Strict Serializability",
        };
        write!(f, "{s}")
    }
}

/// Parses a free-form isolation level name, accepting both Adya's `PL-n`
/// notation and common vernacular names.
///
/// `"monotonic snapshot reads"` and `"monotonic view"` are matched as the
/// separate concepts they are: a naive parser that returns as soon as it
/// sees "MONOTONIC" and "VIEW" would misroute a string like "monotonic
/// view snapshot reads" regardless of which concept was meant. Each
/// branch below checks its own full phrase before falling through.
pub fn parse_isolation_level(isolation_lvl: Option<&str>) -> Result<IsolationLevel, String> {
    let Some(raw) = isolation_lvl else {
        return Ok(IsolationLevel::Pl0);
    };
    if raw.len() < 2 {
        return Ok(IsolationLevel::Pl0);
    }

    let upper = raw.trim().to_uppercase();

    if let Some(suffix) = upper.strip_prefix("PL") {
        return if suffix.contains("SS") {
            Ok(IsolationLevel::PlSs)
        } else if suffix.contains("3U") {
            Ok(IsolationLevel::Pl3U)
        } else if suffix.contains("99") {
            Ok(IsolationLevel::Pl299)
        } else if suffix.contains("SI") {
            Ok(IsolationLevel::PlSi)
        } else if suffix.contains("FCV") {
            Ok(IsolationLevel::PlFcv)
        } else if suffix.contains('+') || suffix.contains("PLUS") {
            Ok(IsolationLevel::Pl2Plus)
        } else if suffix.contains("MSR") {
            Ok(IsolationLevel::PlMsr)
        } else if suffix.contains("2L") {
            Ok(IsolationLevel::Pl2L)
        } else if suffix.ends_with('3') {
            Ok(IsolationLevel::Pl3)
        } else if suffix.ends_with('2') {
            Ok(IsolationLevel::Pl2)
        } else if suffix.ends_with('1') {
            Ok(IsolationLevel::Pl1)
        } else if suffix.ends_with('0') {
            Ok(IsolationLevel::Pl0)
        } else {
            Err(format!("unknown PL isolation level: {raw}"))
        };
    }

    if upper.contains("CURSOR") && upper.contains("STABILITY") {
        return Ok(IsolationLevel::PlCs);
    }
    if upper.contains("MONOTONIC") && upper.contains("SNAPSHOT") && upper.contains("READS") {
        return Ok(IsolationLevel::PlMsr);
    }
    if upper.contains("MONOTONIC") && upper.contains("VIEW") {
        return Ok(IsolationLevel::Pl2L);
    }
    if upper.contains("CONSISTENT") && upper.contains("VIEW") {
        return Ok(if upper.contains("FORWARD") { IsolationLevel::PlFcv } else { IsolationLevel::Pl2Plus });
    }
    if upper.contains("SNAPSHOT") && upper.contains("ISOLATION") {
        return Ok(IsolationLevel::PlSi);
    }
    if upper.contains("REPEATABLE") && upper.contains("READ") {
        return Ok(IsolationLevel::Pl299);
    }
    if upper.contains("SERIALIZABILITY") || upper.contains("SERIALIZABLE") {
        return Ok(if upper.contains("UPDATE") {
            IsolationLevel::Pl3U
        } else if upper.contains("STRICT") {
            IsolationLevel::PlSs
        } else {
            IsolationLevel::Pl3
        });
    }
    if upper.contains("READ") {
        if upper.contains("UNCOMMITTED") {
            return Ok(IsolationLevel::Pl1);
        }
        if upper.contains("COMMITTED") {
            return Ok(IsolationLevel::Pl2);
        }
    }

    Err(format!("unknown isolation level: {raw}"))
}

/// The anomalies an isolation level proscribes. A history satisfies a level
/// if none of these anomalies are found in it.
pub fn proscribed_anomalies(level: IsolationLevel) -> &'static [AnomalyKind] {
    use AnomalyKind::*;
    match level {
        IsolationLevel::Pl0 => &[],
        IsolationLevel::Pl1 => &[G0],
        IsolationLevel::Pl2 => &[G1],
        IsolationLevel::PlCs => &[G1, GCursor],
        IsolationLevel::Pl2L => &[G1, GMonotonic],
        IsolationLevel::PlMsr => &[G1, GMsr],
        IsolationLevel::Pl2Plus => &[G1, GSingle],
        IsolationLevel::PlFcv => &[G1, GSiB],
        IsolationLevel::PlSi => &[G1, GSi],
        IsolationLevel::Pl299 => &[G1, G2Item],
        IsolationLevel::Pl3U => &[G1, GUpdate],
        IsolationLevel::Pl3 => &[G1, G2],
        IsolationLevel::PlSs => &[G1, G2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_level_given_defaults_to_pl0() {
        assert_eq!(parse_isolation_level(None).unwrap(), IsolationLevel::Pl0);
    }

    #[test]
    fn adya_notation_is_case_insensitive() {
        assert_eq!(parse_isolation_level(Some("pl-3")).unwrap(), IsolationLevel::Pl3);
        assert_eq!(parse_isolation_level(Some("PL-2")).unwrap(), IsolationLevel::Pl2);
    }

    #[test]
    fn monotonic_view_and_monotonic_snapshot_reads_are_distinct() {
        assert_eq!(
            parse_isolation_level(Some("monotonic snapshot reads")).unwrap(),
            IsolationLevel::PlMsr
        );
        assert_eq!(parse_isolation_level(Some("monotonic view")).unwrap(), IsolationLevel::Pl2L);
    }

    #[test]
    fn vernacular_names_resolve() {
        assert_eq!(parse_isolation_level(Some("read committed")).unwrap(), IsolationLevel::Pl2);
        assert_eq!(parse_isolation_level(Some("serializable")).unwrap(), IsolationLevel::Pl3);
        assert_eq!(
            parse_isolation_level(Some("strict serializable")).unwrap(),
            IsolationLevel::PlSs
        );
    }

    #[test]
    fn unknown_level_is_an_error() {
        assert!(parse_isolation_level(Some("quantum consistency")).is_err());
    }
}
