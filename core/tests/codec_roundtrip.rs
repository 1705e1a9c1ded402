//! Streaming (de)serialization round-trips through an actual file, the
//! way `adya generate`/`adya check` read and write history files.

use adya_core::codec;
use adya_core::log::HistoryElem;
use adya_core::op::{OpResult, OperationKind};
use adya_core::value::DbObject;
use std::fs::File;
use std::io::{BufReader, BufWriter};

fn sample_elems() -> Vec<HistoryElem> {
    vec![
        HistoryElem::new(OperationKind::Begin, OpResult::Empty, 0, 0, 0.0, 0.0),
        HistoryElem::new(
            OperationKind::Write { object: DbObject::new(0, "tab"), value: 0 },
            OpResult::Empty,
            0,
            0,
            0.1,
            0.1,
        )
        .with_value_written(vec![0]),
        HistoryElem::new(
            OperationKind::Read { object: DbObject::new(0, "tab"), for_update: false },
            OpResult::Value(vec![0]),
            0,
            0,
            0.2,
            0.2,
        ),
        HistoryElem::new(OperationKind::Commit, OpResult::Empty, 0, 0, 0.3, 0.3),
    ]
}

#[test]
fn streaming_roundtrip_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.bin");
    let elems = sample_elems();

    {
        let file = File::create(&path).unwrap();
        let mut writer = BufWriter::new(file);
        codec::encode_stream(&mut writer, &elems).unwrap();
    }

    let file = File::open(&path).unwrap();
    let decoded = codec::iter_decode(BufReader::new(file)).unwrap();
    assert_eq!(decoded, elems);
}

#[test]
fn single_record_roundtrip() {
    let elem = sample_elems().remove(1);
    let mut buf = Vec::new();
    codec::encode_to(&mut buf, &elem).unwrap();
    let decoded: HistoryElem = codec::decode_from(&mut &buf[..]).unwrap();
    assert_eq!(decoded, elem);
}
