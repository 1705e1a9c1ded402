//! Binary (de)serialization of histories, via `bincode`.
//!
//! Records are length-prefixed so a history can be streamed element by
//! element rather than buffered whole, matching how the CLI's `generate`
//! subcommand writes output as a workload runs.

use crate::error::CResult;
use crate::log::HistoryElem;
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};

/// Encodes a single value with a 4-byte little-endian length prefix.
pub fn encode_to<W: Write, T: Serialize>(writer: &mut W, value: &T) -> CResult<()> {
    let bytes = bincode::serialize(value)?;
    writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Decodes a single length-prefixed value.
pub fn decode_from<R: Read, T: DeserializeOwned>(reader: &mut R) -> CResult<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

/// Encodes a full operation log as a stream of length-prefixed records, one
/// per [`HistoryElem`], rather than a single buffered blob.
pub fn encode_stream<W: Write>(writer: &mut W, elems: &[HistoryElem]) -> CResult<()> {
    for elem in elems {
        encode_to(writer, elem)?;
    }
    Ok(())
}

/// Decodes a stream of length-prefixed [`HistoryElem`] records until the
/// reader is exhausted.
pub fn iter_decode<R: Read>(mut reader: R) -> CResult<Vec<HistoryElem>> {
    let mut elems = Vec::new();
    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        elems.push(bincode::deserialize(&buf)?);
    }
    Ok(elems)
}
