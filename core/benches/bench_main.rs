use adya_core::checker::check_history;
use adya_core::history::HistoryIndex;
use adya_core::log::{HistoryElem, OperationLog};
use adya_core::op::{OpResult, OperationKind};
use adya_core::policy::IsolationLevel;
use adya_core::value::DbObject;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A write-write chain of `n` transactions against one shared object:
/// `T1 -> T2 -> ... -> Tn` by WW dependency, which exercises cycle
/// enumeration's traversal cost even though this particular chain is
/// acyclic.
fn ww_chain(n: i64) -> OperationLog {
    let obj = DbObject::new(0, "t");
    let mut log = Vec::new();
    let mut t = 0.0;

    for txn_id in 1..=n {
        log.push(HistoryElem::new(OperationKind::Begin, OpResult::Empty, txn_id, txn_id, t, t + 0.1));
        t += 0.1;
        log.push(
            HistoryElem::new(
                OperationKind::Write { object: obj.clone(), value: txn_id },
                OpResult::Empty,
                txn_id,
                txn_id,
                t,
                t + 0.1,
            )
            .with_value_written((1..=txn_id).collect()),
        );
        t += 0.1;
        log.push(HistoryElem::new(OperationKind::Commit, OpResult::Empty, txn_id, txn_id, t, t + 0.1));
        t += 0.1;
    }

    log
}

fn dsg_construction(c: &mut Criterion) {
    c.bench_function("dsg build + check, 20 txn ww chain", |b| {
        b.iter(|| {
            let hist = HistoryIndex::new(black_box(ww_chain(20))).unwrap();
            check_history(&hist, IsolationLevel::Pl3, None).unwrap()
        })
    });
}

criterion_group!(benches, dsg_construction);
criterion_main!(benches);
