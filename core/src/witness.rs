//! [`Anomaly`]: the witness a checker hands back to a caller.

use crate::log::ObservedTransaction;
use crate::taxonomy::{description, AnomalyKind};

/// A found isolation anomaly: its kind, the transactions involved, and a
/// step-by-step explanation of why they form an anomaly.
#[derive(Debug)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub txns: Vec<ObservedTransaction>,
    pub explanation: Vec<String>,
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let txns: String = self.txns.iter().map(|t| format!("\n|\t {t}")).collect();
        let explanation: String = self
            .explanation
            .iter()
            .enumerate()
            .map(|(idx, m)| format!("\n|\t {}: {}", idx + 1, m))
            .collect();

        write!(
            f,
            "+--------------------------\n\
             | Anomaly type: {}\n\
             |\n\
             | Let:{}\n\
             |\n\
             | Then:{}\n\
             +--------------------------",
            description(self.kind),
            txns,
            explanation,
        )
    }
}
