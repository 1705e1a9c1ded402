//! The workload generator: drives `--connections` workers against a
//! [`crate::db::DbConn`] to produce an [`adya_core::log::OperationLog`].
//!
//! Out of scope for the hard core; this module is the external collaborator
//! that produces histories against a live database. Here it drives
//! [`crate::db::SimConn`] so `generate` and `test-isolation` are runnable
//! without one.

use crate::db::{new_store, ColumnValue, DbConn, SimConn, Statement};
use crate::nemesis::Nemesis;
use adya_core::log::HistoryElem;
use adya_core::op::{OpResult, OperationKind};
use adya_core::value::DbObject;
use anyhow::Result;
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub const TABLE: &str = "tab";

#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    pub abort_rate: f64,
    pub write_rate: f64,
    pub predicate_read_rate: f64,
    pub connections: usize,
    pub objects: usize,
    pub transactions: usize,
    pub for_update: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            abort_rate: 0.1,
            write_rate: 0.5,
            predicate_read_rate: 0.05,
            connections: 4,
            objects: 5,
            transactions: 50,
            for_update: false,
        }
    }
}

/// Owns the generation-wide monotonic version counter and transaction id
/// counter, kept here rather than at process scope — the checker never sees
/// either counter, only the resulting integers.
pub struct Generator {
    opts: GeneratorOptions,
    version_counter: Arc<AtomicI64>,
    txn_counter: Arc<AtomicI64>,
    start: Instant,
}

impl Generator {
    pub fn new(opts: GeneratorOptions) -> Self {
        Generator {
            opts,
            version_counter: Arc::new(AtomicI64::new(1)),
            txn_counter: Arc::new(AtomicI64::new(1)),
            start: Instant::now(),
        }
    }

    fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn next_txn_id(&self) -> i64 {
        self.txn_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Runs the opening transaction: writes `0` to every object, so every
    /// object's committed history starts from `[0]`. Executes alone, before
    /// any worker starts, so it is trivially isolated.
    fn run_init_txn(&self, conn: &mut dyn DbConn, conn_id: i64) -> Result<Vec<HistoryElem>> {
        let txn_id = self.next_txn_id();
        conn.execute(&Statement::Begin)?;
        let mut elems = Vec::new();
        elems.push(self.record(OperationKind::Begin, OpResult::Empty, conn, conn_id, txn_id));

        for obj_id in 0..self.opts.objects as i64 {
            let object = DbObject::new(obj_id, TABLE);
            let value = 0;
            conn.execute(&Statement::Write { table: TABLE.to_string(), object: obj_id, value })?;
            let mut elem = self.record(
                OperationKind::Write { object, value },
                OpResult::Empty,
                conn,
                conn_id,
                txn_id,
            );
            elem.value_written = Some(vec![0]);
            elems.push(elem);
        }

        conn.execute(&Statement::Commit)?;
        elems.push(self.record(OperationKind::Commit, OpResult::Empty, conn, conn_id, txn_id));
        Ok(elems)
    }

    /// Runs the closing transaction: reads every object, per invariant 2's
    /// "the last reads every object". Like the opening transaction, it runs
    /// alone after every worker and the nemesis have finished/healed.
    fn run_final_txn(
        &self,
        conn: &mut dyn DbConn,
        conn_id: i64,
        store: &Arc<Mutex<std::collections::BTreeMap<(String, i64), Vec<i64>>>>,
    ) -> Result<Vec<HistoryElem>> {
        let txn_id = self.next_txn_id();
        conn.execute(&Statement::Begin)?;
        let mut elems = Vec::new();
        elems.push(self.record(OperationKind::Begin, OpResult::Empty, conn, conn_id, txn_id));

        for obj_id in 0..self.opts.objects as i64 {
            let object = DbObject::new(obj_id, TABLE);
            let vector = store.lock().unwrap().get(&(TABLE.to_string(), obj_id)).cloned().unwrap_or_default();
            let result = conn
                .execute(&Statement::Read { table: TABLE.to_string(), object: obj_id })
                .map(|_| OpResult::Value(vector))
                .unwrap_or_else(|e| OpResult::Err(e.to_string()));
            elems.push(self.record(OperationKind::Read { object, for_update: false }, result, conn, conn_id, txn_id));
        }

        conn.execute(&Statement::Commit)?;
        elems.push(self.record(OperationKind::Commit, OpResult::Empty, conn, conn_id, txn_id));
        Ok(elems)
    }

    fn record(
        &self,
        op: OperationKind,
        result: OpResult,
        _conn: &mut dyn DbConn,
        conn_id: i64,
        txn_id: i64,
    ) -> HistoryElem {
        let invoc = self.elapsed();
        HistoryElem::new(op, result, conn_id, txn_id, invoc, self.elapsed())
    }

    /// One worker's transaction: begin, a random number of reads/writes/
    /// predicate-reads weighted by the configured rates, then commit or
    /// (with probability `abort_rate`) rollback.
    fn run_worker_txn(&self, conn: &mut dyn DbConn, conn_id: i64, rng: &mut impl Rng) -> Vec<HistoryElem> {
        let txn_id = self.next_txn_id();
        let _ = conn.execute(&Statement::Begin);
        let mut elems = vec![self.record(OperationKind::Begin, OpResult::Empty, conn, conn_id, txn_id)];
        let mut errored = false;

        let op_count = rng.gen_range(1..=4);
        for _ in 0..op_count {
            let roll: f64 = rng.gen();
            if roll < self.opts.predicate_read_rate {
                let threshold = rng.gen_range(0..3);
                let stmt = Statement::PredicateRead { tables: vec![TABLE.to_string()], threshold };
                let result = match conn.execute(&stmt) {
                    Ok(Some(rows)) => OpResult::Values(
                        rows.into_iter()
                            .filter_map(|row| match (&row[0], &row[1]) {
                                (ColumnValue::Int(id), ColumnValue::Text(v)) => {
                                    Some((*id, crate::db::parse_value_column(v)))
                                }
                                _ => None,
                            })
                            .collect(),
                    ),
                    Ok(None) => OpResult::Empty,
                    Err(e) => {
                        errored = true;
                        conn.process_exception(&e);
                        OpResult::Err(e.to_string())
                    }
                };
                elems.push(self.record(
                    OperationKind::PredicateRead { tables: vec![TABLE.to_string()], threshold, for_update: self.opts.for_update },
                    result,
                    conn,
                    conn_id,
                    txn_id,
                ));
            } else if roll < self.opts.predicate_read_rate + self.opts.write_rate {
                let obj_id = rng.gen_range(0..self.opts.objects as i64);
                let value = self.version_counter.fetch_add(1, Ordering::SeqCst);
                let object = DbObject::new(obj_id, TABLE);
                let stmt = Statement::Write { table: TABLE.to_string(), object: obj_id, value };
                let (result, written) = match conn.execute(&stmt) {
                    Ok(_) => (OpResult::Empty, Some(vec![value])),
                    Err(e) => {
                        errored = true;
                        conn.process_exception(&e);
                        (OpResult::Err(e.to_string()), None)
                    }
                };
                let mut elem =
                    self.record(OperationKind::Write { object, value }, result, conn, conn_id, txn_id);
                elem.value_written = written;
                elems.push(elem);
            } else {
                let obj_id = rng.gen_range(0..self.opts.objects as i64);
                let object = DbObject::new(obj_id, TABLE);
                let stmt = Statement::Read { table: TABLE.to_string(), object: obj_id };
                let result = match conn.execute(&stmt) {
                    Ok(Some(rows)) => match &rows[0][1] {
                        ColumnValue::Text(v) => OpResult::Value(crate::db::parse_value_column(v)),
                        _ => OpResult::Empty,
                    },
                    Ok(None) => OpResult::Empty,
                    Err(e) => {
                        errored = true;
                        conn.process_exception(&e);
                        OpResult::Err(e.to_string())
                    }
                };
                elems.push(self.record(
                    OperationKind::Read { object, for_update: self.opts.for_update },
                    result,
                    conn,
                    conn_id,
                    txn_id,
                ));
            }

            if errored {
                break;
            }
        }

        let should_abort = !errored && rng.gen::<f64>() < self.opts.abort_rate;
        if errored || should_abort {
            let _ = conn.execute(&Statement::Rollback);
            elems.push(self.record(OperationKind::Rollback, OpResult::Empty, conn, conn_id, txn_id));
        } else {
            let _ = conn.execute(&Statement::Commit);
            elems.push(self.record(OperationKind::Commit, OpResult::Empty, conn, conn_id, txn_id));
        }

        elems
    }
}

/// Produces a complete history: the isolated opening transaction, then
/// `--transactions` worker transactions spread across `--connections`
/// threads (with an optional nemesis injected partway through), then the
/// isolated closing transaction.
pub fn gen_history(
    opts: GeneratorOptions,
    nemesis: &mut dyn Nemesis,
) -> Result<Vec<HistoryElem>> {
    let generator = Generator::new(opts.clone());
    let store = new_store();

    let mut init_conn = SimConn::new(store.clone());
    let mut all_elems = generator.run_init_txn(&mut init_conn, 0)?;

    let per_conn = (opts.transactions / opts.connections.max(1)).max(1);
    let results: Vec<Vec<HistoryElem>> = std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for conn_id in 1..=opts.connections as i64 {
            let generator = &generator;
            let store = store.clone();
            handles.push(scope.spawn(move || {
                let mut conn = SimConn::new(store);
                let mut rng = rand::thread_rng();
                let mut elems = Vec::new();
                for _ in 0..per_conn {
                    elems.extend(generator.run_worker_txn(&mut conn, conn_id, &mut rng));
                }
                elems
            }));
        }
        handles.into_iter().map(|h| h.join().unwrap_or_default()).collect()
    });
    for elems in results {
        all_elems.extend(elems);
    }

    nemesis.inject()?;
    nemesis.heal()?;

    let mut final_conn = SimConn::new(store.clone());
    all_elems.extend(generator.run_final_txn(&mut final_conn, 0, &store)?);

    all_elems.sort_by(|a, b| a.invoc.partial_cmp(&b.invoc).unwrap_or(std::cmp::Ordering::Equal));
    renumber_txn_ids(&mut all_elems);
    Ok(all_elems)
}

/// Reassigns transaction ids densely in commit/sort order, so the resulting
/// log's txn ids form a contiguous range even though concurrent workers
/// assigned ids out of timestamp order.
fn renumber_txn_ids(elems: &mut [HistoryElem]) {
    let mut seen = Vec::new();
    for id in elems.iter().map(|e| e.txn_id) {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    let mapping: std::collections::HashMap<i64, i64> =
        seen.iter().enumerate().map(|(i, &old)| (old, i as i64 + 1)).collect();
    for e in elems.iter_mut() {
        e.txn_id = mapping[&e.txn_id];
    }
}
