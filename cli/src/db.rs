//! The DB collaborator: the connection abstraction the generator drives to
//! produce a history, and an in-process reference implementation that needs
//! no live database.
//!
//! `adya-core` never calls anything in this module — the core's only input
//! is the [`adya_core::log::OperationLog`] a [`crate::generator::Generator`]
//! eventually hands it.

use adya_core::value::{ObjectId, Version};
use anyhow::Result;
use std::collections::BTreeMap;

/// A single column value as it would come back from a real SQL driver.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    Int(i64),
    Text(String),
}

/// A result row: one per matched record, columns in select order.
pub type Row = Vec<ColumnValue>;

/// The connection abstraction a real SQL driver would implement.
///
/// `execute` returns `None` for statements with no result set (writes,
/// begin/commit/rollback) and `Some(rows)` for reads. Errors surface as
/// `Err` and are handed to `process_exception` by the caller, which decides
/// whether the connection is still usable.
pub trait DbConn: Send {
    fn execute(&mut self, stmt: &Statement) -> Result<Option<Vec<Row>>>;
    fn reset(&mut self) -> Result<()>;
    fn is_connected(&self) -> bool;
    fn process_exception(&mut self, err: &anyhow::Error);
}

/// A pre-parsed statement, standing in for the SQL text a real driver would
/// receive. `SimConn` matches on this directly rather than parsing strings,
/// since the generator already knows exactly which operation it is issuing.
#[derive(Clone, Debug)]
pub enum Statement {
    Begin,
    Commit,
    Rollback,
    Read { table: String, object: ObjectId },
    Write { table: String, object: ObjectId, value: Version },
    PredicateRead { tables: Vec<String>, threshold: i64 },
}

/// In-process reference `DbConn`: tables are `BTreeMap<(table, id),
/// Vec<Version>>`, mutated directly rather than through real SQL. Exists so
/// `generate`/`test-isolation` run end-to-end with no external dependency.
pub struct SimConn {
    store: std::sync::Arc<std::sync::Mutex<BTreeMap<(String, ObjectId), Vec<Version>>>>,
    connected: bool,
}

impl SimConn {
    pub fn new(store: std::sync::Arc<std::sync::Mutex<BTreeMap<(String, ObjectId), Vec<Version>>>>) -> Self {
        SimConn { store, connected: true }
    }
}

impl DbConn for SimConn {
    fn execute(&mut self, stmt: &Statement) -> Result<Option<Vec<Row>>> {
        if !self.connected {
            anyhow::bail!("connection is not usable after a prior error");
        }

        match stmt {
            Statement::Begin | Statement::Commit | Statement::Rollback => Ok(None),
            Statement::Read { table, object } => {
                let store = self.store.lock().unwrap();
                let row = store
                    .get(&(table.clone(), *object))
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("no such object {table}#{object}"))?;
                Ok(Some(vec![vec![ColumnValue::Int(*object), ColumnValue::Text(join_vec(&row))]]))
            }
            Statement::Write { table, object, value } => {
                let mut store = self.store.lock().unwrap();
                let entry = store.entry((table.clone(), *object)).or_default();
                entry.push(*value);
                Ok(None)
            }
            Statement::PredicateRead { tables, threshold } => {
                let store = self.store.lock().unwrap();
                let rows: Vec<Row> = store
                    .iter()
                    .filter(|((table, _), v)| tables.contains(table) && v.len() as i64 > *threshold)
                    .map(|((_, id), v)| vec![ColumnValue::Int(*id), ColumnValue::Text(join_vec(v))])
                    .collect();
                Ok(Some(rows))
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn process_exception(&mut self, _err: &anyhow::Error) {
        self.connected = false;
    }
}

/// Renders a version vector the way the equivalent SQL predicate read would
/// see it as a comma-joined text column; `SimConn` computes the threshold
/// comparison directly on the in-memory vector, which is the same quantity.
fn join_vec(v: &[Version]) -> String {
    v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",")
}

/// Parses a comma-joined value column back into a version vector, the
/// inverse of `join_vec`, for a `DbConn` that only ever hands back text.
pub fn parse_value_column(s: &str) -> Vec<Version> {
    s.split(',').filter(|s| !s.is_empty()).filter_map(|s| s.parse().ok()).collect()
}

/// Fresh shared backing store for a batch of `SimConn`s that must observe
/// each other's writes (i.e. all connections in one generation run).
pub fn new_store() -> std::sync::Arc<std::sync::Mutex<BTreeMap<(String, ObjectId), Vec<Version>>>> {
    std::sync::Arc::new(std::sync::Mutex::new(BTreeMap::new()))
}
