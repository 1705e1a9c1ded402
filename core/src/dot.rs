//! Graphviz DOT rendering of a [`Dsg`].
//!
//! WW and WR edges (item and write dependencies) render as solid arrows;
//! RW and PRW (anti-dependencies) render dashed, following Adya's own
//! convention for distinguishing them in his thesis diagrams.

use crate::dependency::EdgeType;
use crate::dsg::Dsg;
use std::collections::HashSet;
use std::fmt::Write as _;

struct Stmt {
    from: i64,
    to: i64,
    kind: EdgeType,
}

fn render(stmts: &[Stmt]) -> String {
    let mut solid = String::new();
    let mut dashed = String::new();

    for stmt in stmts {
        let line = format!("\tT{} -> T{} [label={}];\n", stmt.from, stmt.to, stmt.kind);
        match stmt.kind {
            EdgeType::Ww | EdgeType::Wr => solid.push_str(&line),
            EdgeType::Rw | EdgeType::Prw => dashed.push_str(&line),
        }
    }

    let mut out = String::new();
    writeln!(out, "digraph DSG {{").ok();
    out.push_str(&solid);
    out.push_str("edge [style=dashed]\n");
    out.push_str(&dashed);
    writeln!(out, "}}").ok();
    out
}

/// Renders a DSG to DOT. With `full`, every committed transaction and
/// dependency is included; otherwise only the transactions that appear in
/// at least one cycle matching `anomaly_kinds`.
pub fn to_dot(dsg: &Dsg, anomaly_kinds: &[crate::taxonomy::AnomalyKind], full: bool) -> String {
    let mut stmts = Vec::new();

    if full {
        for idx in 0..dsg.node_count() {
            let node = dsg.node(idx);
            for edge in &node.edges {
                stmts.push(Stmt {
                    from: node.txn.id(),
                    to: dsg.node(edge.target).txn.id(),
                    kind: edge.kind,
                });
            }
        }
    } else {
        let cycle_nodes: HashSet<usize> = dsg.find_cycles(anomaly_kinds).into_iter().flatten().collect();
        for &idx in &cycle_nodes {
            let node = dsg.node(idx);
            for edge in &node.edges {
                if cycle_nodes.contains(&edge.target) {
                    stmts.push(Stmt {
                        from: node.txn.id(),
                        to: dsg.node(edge.target).txn.id(),
                        kind: edge.kind,
                    });
                }
            }
        }
    }

    render(&stmts)
}

/// Renders one DOT graph per cycle found for `anomaly_kinds`.
pub fn cycles_to_dot(dsg: &Dsg, anomaly_kinds: &[crate::taxonomy::AnomalyKind]) -> Vec<String> {
    dsg.find_cycles(anomaly_kinds)
        .into_iter()
        .map(|cycle| {
            let cycle_set: HashSet<usize> = cycle.iter().copied().collect();
            let mut stmts = Vec::new();
            for &idx in &cycle {
                let node = dsg.node(idx);
                for edge in &node.edges {
                    if cycle_set.contains(&edge.target) {
                        stmts.push(Stmt {
                            from: node.txn.id(),
                            to: dsg.node(edge.target).txn.id(),
                            kind: edge.kind,
                        });
                    }
                }
            }
            render(&stmts)
        })
        .collect()
}
