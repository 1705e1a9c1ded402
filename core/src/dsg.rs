//! The Direct Serialization Graph: transactions as nodes, dependencies as
//! edges, cycles as anomalies.

use crate::dependency::{find_dependencies, EdgeType};
use crate::error::CResult;
use crate::history::{HistoryIndex, TransactionState};
use crate::log::ObservedTransaction;
use crate::taxonomy::{self, AnomalyKind};
use crate::value::{ObjectId, TxnId, Version};
use crate::witness::Anomaly;
use petgraph::graph::DiGraph;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

/// One dependency edge in the graph, fully resolved to an arena index.
#[derive(Clone, Debug)]
pub struct Edge {
    pub kind: EdgeType,
    pub target: usize,
    pub object: ObjectId,
    pub version: Vec<Version>,
}

/// A committed transaction and the dependencies it carries to other
/// committed transactions.
pub struct Node {
    pub txn: ObservedTransaction,
    pub edges: Vec<Edge>,
}

impl Node {
    /// Adds an edge unless one of the same type to the same target already
    /// exists (parallel same-type edges collapse; different types don't).
    fn add_edge(&mut self, kind: EdgeType, target: usize, object: ObjectId, version: Vec<Version>) {
        let duplicate = self.edges.iter().any(|e| e.kind == kind && e.target == target);
        if !duplicate {
            self.edges.push(Edge { kind, target, object, version });
        }
    }
}

/// Arena-encoded Direct Serialization Graph over every committed
/// transaction in a history.
pub struct Dsg {
    nodes: Vec<Node>,
    index: HashMap<TxnId, usize>,
    final_txn: ObservedTransaction,
    cycles: RefCell<HashMap<BTreeSet<EdgeType>, Vec<Vec<usize>>>>,
}

impl Dsg {
    pub fn build(hist: &HistoryIndex) -> CResult<Self> {
        let (lo, hi) = hist.txn_range();
        let mut nodes = Vec::new();
        let mut index = HashMap::new();

        for txn_id in lo..=hi {
            if hist.txn_state(txn_id)? == TransactionState::Committed {
                let txn = hist.get_observed_txn(txn_id)?;
                index.insert(txn_id, nodes.len());
                nodes.push(Node { txn, edges: Vec::new() });
            }
        }

        for idx in 0..nodes.len() {
            let txn_id = nodes[idx].txn.id();
            let deps = find_dependencies(hist, txn_id)?;
            for dep in deps {
                if let Some(&target) = index.get(&dep.target_txn) {
                    if target != idx {
                        nodes[idx].add_edge(dep.edge_type, target, dep.object, dep.version);
                    }
                }
            }
        }

        let final_txn = hist.get_observed_txn(hi)?;

        Ok(Dsg { nodes, index, final_txn, cycles: RefCell::new(HashMap::new()) })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn get_node_index(&self, txn_id: TxnId) -> Option<usize> {
        self.index.get(&txn_id).copied()
    }

    /// Every node cycle whose edges are drawn from the union of edge types
    /// these anomaly kinds can appear in, found and cached per requested
    /// edge-type mask.
    pub fn find_cycles(&self, anomaly_types: &[AnomalyKind]) -> Vec<Vec<usize>> {
        let mask: BTreeSet<EdgeType> =
            anomaly_types.iter().flat_map(|k| taxonomy::edge_types(*k).iter().copied()).collect();

        if let Some(cached) = self.cycles.borrow().get(&mask) {
            return cached.clone();
        }

        let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        let node_indices: Vec<_> = (0..self.nodes.len()).map(|_| graph.add_node(())).collect();
        for (u, node) in self.nodes.iter().enumerate() {
            for edge in &node.edges {
                if mask.contains(&edge.kind) {
                    graph.add_edge(node_indices[u], node_indices[edge.target], ());
                }
            }
        }

        let adj: HashMap<usize, Vec<usize>> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(u, node)| {
                let mut targets: Vec<usize> =
                    node.edges.iter().filter(|e| mask.contains(&e.kind)).map(|e| e.target).collect();
                targets.sort_unstable();
                targets.dedup();
                (u, targets)
            })
            .collect();

        let sccs = petgraph::algo::tarjan_scc(&graph);

        let mut cycles = Vec::new();
        for scc in sccs {
            if scc.len() < 2 {
                continue;
            }
            let scc_nodes: Vec<usize> = scc.iter().map(|n| n.index()).collect();
            cycles.extend(johnson_cycles(&scc_nodes, &adj));
        }

        self.cycles.borrow_mut().insert(mask, cycles.clone());
        cycles
    }

    /// Classify every node cycle into its anomaly witnesses, filtered to
    /// the requested kinds (through their implication closure).
    pub fn find_anomalies(&self, anomaly_types: &[AnomalyKind]) -> CResult<Vec<Anomaly>> {
        let mut out = Vec::new();
        for node_cycle in self.find_cycles(anomaly_types) {
            for edge_cycle in self.classify_cycle(&node_cycle) {
                let kinds: Vec<EdgeType> = edge_cycle.iter().map(|e| e.kind).collect();
                let Some(kind) = taxonomy::minimal_type(&kinds) else {
                    return Err(crate::error::Error::InternalInvariantViolation(format!(
                        "cycle with edge types {kinds:?} matched zero or more than one minimal anomaly kind"
                    )));
                };

                if taxonomy::closure(kind).iter().any(|k| anomaly_types.contains(k)) {
                    out.push(self.build_anomaly(kind, &node_cycle, &edge_cycle));
                }
            }
        }
        Ok(out)
    }

    fn classify_cycle(&self, node_cycle: &[usize]) -> Vec<Vec<Edge>> {
        let n = node_cycle.len();
        let mut edge_cycles: Vec<Vec<Edge>> = vec![Vec::new()];

        for i in 0..n {
            let u = node_cycle[i];
            let v = node_cycle[(i + 1) % n];
            let edges: Vec<Edge> =
                self.nodes[u].edges.iter().filter(|e| e.target == v).cloned().collect();
            if edges.is_empty() {
                continue;
            }

            let mut idx = 0;
            while idx < edge_cycles.len() {
                if edge_cycles[idx].last().map(|e| e.target) == Some(v) {
                    idx += 1;
                    continue;
                }
                edge_cycles[idx].push(edges[0].clone());
                for e in &edges[1..] {
                    let mut clone = edge_cycles[idx][..edge_cycles[idx].len() - 1].to_vec();
                    clone.push(e.clone());
                    edge_cycles.push(clone);
                }
                idx += 1;
            }
        }

        edge_cycles
    }

    fn build_anomaly(&self, kind: AnomalyKind, node_cycle: &[usize], edge_cycle: &[Edge]) -> Anomaly {
        let mut txns: Vec<ObservedTransaction> =
            node_cycle.iter().map(|&idx| self.nodes[idx].txn.clone()).collect();
        if !node_cycle.iter().any(|&idx| self.nodes[idx].txn.id() == self.final_txn.id()) {
            txns.push(self.final_txn.clone());
        }

        let n = node_cycle.len();
        let mut explanation: Vec<String> = (0..n)
            .map(|i| {
                let orig = node_cycle[i];
                let edge = &edge_cycle[i];
                let target_txn = self.nodes[edge.target].txn.id();
                explain_dependency(&self.nodes[orig].txn, edge, target_txn)
            })
            .collect();
        if let Some(last) = explanation.last_mut() {
            *last = format!("But {last}");
        }
        explanation.push("This means we have a cycle (and an anomaly)".to_string());

        Anomaly { kind, txns, explanation }
    }
}

fn explain_dependency(orig: &ObservedTransaction, edge: &Edge, target_txn: TxnId) -> String {
    let obj_id = edge.object;
    let ver = &edge.version;
    let dep_msg = match edge.kind {
        EdgeType::Ww => format!(
            "T{} wrote version {:?} and T{} wrote version {:?} [object {}] (Write dependency)",
            orig.id(),
            &ver[..ver.len().saturating_sub(1)],
            target_txn,
            ver,
            obj_id
        ),
        EdgeType::Wr => format!(
            "T{} wrote version {:?} and T{} read version {:?} [object {}] (Read dependency)",
            orig.id(),
            ver,
            target_txn,
            ver,
            obj_id
        ),
        EdgeType::Rw => format!(
            "T{} read version {:?} and T{} wrote version {:?} [object {}] (Item Anti dependency)",
            orig.id(),
            &ver[..ver.len().saturating_sub(1)],
            target_txn,
            ver,
            obj_id
        ),
        EdgeType::Prw => format!(
            "T{} didn't read the object because it was too small (required len > {}), and T{} wrote the first version which matched: {:?} [object {}] (Predicate Anti dependency)",
            orig.id(),
            ver.len().saturating_sub(1),
            target_txn,
            ver,
            obj_id
        ),
    };
    format!("T{} < T{}, because {}", orig.id(), target_txn, dep_msg)
}

fn unblock(node: usize, blocked: &mut HashMap<usize, bool>, block_map: &mut HashMap<usize, HashSet<usize>>) {
    blocked.insert(node, false);
    if let Some(dependents) = block_map.get_mut(&node) {
        let deps: Vec<usize> = dependents.drain().collect();
        for w in deps {
            if *blocked.get(&w).unwrap_or(&false) {
                unblock(w, blocked, block_map);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn circuit(
    v: usize,
    start: usize,
    adj: &HashMap<usize, Vec<usize>>,
    sub_nodes: &HashSet<usize>,
    blocked: &mut HashMap<usize, bool>,
    block_map: &mut HashMap<usize, HashSet<usize>>,
    stack: &mut Vec<usize>,
    cycles: &mut Vec<Vec<usize>>,
) -> bool {
    let mut found = false;
    stack.push(v);
    blocked.insert(v, true);

    if let Some(neighbors) = adj.get(&v) {
        for &w in neighbors {
            if !sub_nodes.contains(&w) {
                continue;
            }
            if w == start {
                cycles.push(stack.clone());
                found = true;
            } else if !*blocked.get(&w).unwrap_or(&true) && circuit(w, start, adj, sub_nodes, blocked, block_map, stack, cycles) {
                found = true;
            }
        }
    }

    if found {
        unblock(v, blocked, block_map);
    } else if let Some(neighbors) = adj.get(&v) {
        for &w in neighbors {
            if sub_nodes.contains(&w) {
                block_map.entry(w).or_default().insert(v);
            }
        }
    }

    stack.pop();
    found
}

/// Johnson's algorithm for enumerating every simple cycle in the subgraph
/// induced by `scc_nodes`, restricted to the edges in `adj`.
fn johnson_cycles(scc_nodes: &[usize], adj: &HashMap<usize, Vec<usize>>) -> Vec<Vec<usize>> {
    let mut all_cycles = Vec::new();
    let mut sorted_nodes = scc_nodes.to_vec();
    sorted_nodes.sort_unstable();

    for i in 0..sorted_nodes.len() {
        let start = sorted_nodes[i];
        let sub_nodes: HashSet<usize> = sorted_nodes[i..].iter().copied().collect();
        let mut blocked: HashMap<usize, bool> = sub_nodes.iter().map(|&n| (n, false)).collect();
        let mut block_map: HashMap<usize, HashSet<usize>> =
            sub_nodes.iter().map(|&n| (n, HashSet::new())).collect();
        let mut stack = Vec::new();

        circuit(start, start, adj, &sub_nodes, &mut blocked, &mut block_map, &mut stack, &mut all_cycles);
    }

    all_cycles
}
