// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Row codec: marshals a typed row to bytes in declared column order and
//! back.
//!
//! Per column: INT is 4 bytes little-endian signed, TEXT is a 2-byte
//! little-endian length followed by the payload (no terminator persisted),
//! BOOLEAN is one `0`/`1` byte.

use crate::store::BLOCK_SZ;
use crate::value::{DataType, Identifier, Row, Value};
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

/// Encodes `row` over the declared column lists.
///
/// # Errors
///
/// Fails with `MissingColumn` if the row lacks a declared column, with
/// `TooBig` if a TEXT field exceeds 65535 bytes or the encoded form
/// exceeds [`BLOCK_SZ`], and with `CorruptRow` if a value's tag does not
/// match its column's declared type.
pub fn marshal(row: &Row, names: &[Identifier], types: &[DataType]) -> Result<Vec<u8>> {
    debug_assert_eq!(names.len(), types.len());

    let mut out = Vec::new();
    for (name, data_type) in names.iter().zip(types) {
        let value = row.get(name.as_str()).ok_or_else(|| {
            Error::MissingColumn(format!("row is missing declared column '{name}'"))
        })?;

        match (data_type, value) {
            (DataType::Int, Value::Int(n)) => {
                out.write_i32::<LittleEndian>(*n).expect("cannot fail");
            }
            (DataType::Text, Value::Text(s)) => {
                let Ok(len) = u16::try_from(s.len()) else {
                    return Err(Error::TooBig(format!(
                        "text field '{name}' of {} bytes is too long to marshal",
                        s.len()
                    )));
                };
                out.write_u16::<LittleEndian>(len).expect("cannot fail");
                out.extend_from_slice(s.as_bytes());
            }
            (DataType::Boolean, Value::Boolean(b)) => {
                out.write_u8(u8::from(*b)).expect("cannot fail");
            }
            (declared, value) => {
                return Err(Error::CorruptRow(format!(
                    "column '{name}' is declared {declared} but holds a {} value",
                    value.data_type()
                )));
            }
        }
    }

    if out.len() > BLOCK_SZ {
        return Err(Error::TooBig(format!(
            "row of {} bytes is too big to marshal",
            out.len()
        )));
    }
    Ok(out)
}

/// Decodes bytes produced by [`marshal`] over the same column lists.
///
/// # Errors
///
/// Fails with `CorruptRow` when a read would run past the buffer or a
/// field holds bytes the declared type cannot take.
pub fn unmarshal(bytes: &[u8], names: &[Identifier], types: &[DataType]) -> Result<Row> {
    debug_assert_eq!(names.len(), types.len());

    let mut reader = bytes;
    let mut row = Row::new();
    for (name, data_type) in names.iter().zip(types) {
        let value = match data_type {
            DataType::Int => Value::Int(
                reader
                    .read_i32::<LittleEndian>()
                    .map_err(|_| truncated(name))?,
            ),
            DataType::Text => {
                let len = reader
                    .read_u16::<LittleEndian>()
                    .map_err(|_| truncated(name))?;
                let mut payload = vec![0u8; usize::from(len)];
                reader.read_exact(&mut payload).map_err(|_| truncated(name))?;
                Value::Text(String::from_utf8(payload).map_err(|_| {
                    Error::CorruptRow(format!("column '{name}' holds invalid text"))
                })?)
            }
            DataType::Boolean => match reader.read_u8().map_err(|_| truncated(name))? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                byte => {
                    return Err(Error::CorruptRow(format!(
                        "column '{name}' holds boolean byte {byte:#04x}"
                    )))
                }
            },
        };
        row.set(name.clone(), value);
    }
    Ok(row)
}

fn truncated(name: &Identifier) -> Error {
    Error::CorruptRow(format!("row ends before column '{name}'"))
}
