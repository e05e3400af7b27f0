//! Encoding of [connection tables](ConnectionTable).
//!
//! A table is stored as its dimensions plus either the dense row-major cells or the sentinel
//! `"all"`, which is always chosen when every cell is connected.

use core::fmt;

use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::narrow::{to_serial, to_size, SerialSize};
use super::value::cautious_capacity;
use super::ArchiveError;
use crate::nn::ConnectionTable;

const ALL: &str = "all";

/// Payload of an archived connection table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    /// Every cell is connected.
    All,
    /// Row-major cells.
    Dense(Vec<bool>),
}

/// A [connection table](ConnectionTable) as stored in an archive.
#[derive(new, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTableRecord {
    /// Number of rows (input channels).
    pub rows: SerialSize,
    /// Number of columns (output channels).
    pub cols: SerialSize,
    /// The cells, or the sentinel.
    pub connection: Connection,
}

/// Encode a table, choosing the sentinel whenever every cell is connected.
pub fn encode(table: &ConnectionTable) -> Result<ConnectionTableRecord, ArchiveError> {
    let connection = match table.cells() {
        None => Connection::All,
        Some(cells) => Connection::Dense(cells.to_vec()),
    };

    Ok(ConnectionTableRecord {
        rows: to_serial(table.rows())?,
        cols: to_serial(table.cols())?,
        connection,
    })
}

/// Decode a table; a dense payload must hold exactly `rows * cols` cells.
///
/// The sentinel is not expanded, so its dimensions are only checked by the layer constructor.
pub fn decode(record: ConnectionTableRecord) -> Result<ConnectionTable, ArchiveError> {
    let rows = to_size(record.rows);
    let cols = to_size(record.cols);

    match record.connection {
        Connection::All => Ok(ConnectionTable::full(rows, cols)),
        Connection::Dense(cells) => {
            let len = cells.len();
            ConnectionTable::from_cells(rows, cols, cells).ok_or_else(|| {
                ArchiveError::schema(format!(
                    "connection table is {rows}x{cols} but holds {len} cells"
                ))
            })
        }
    }
}

/// Binary layout of [Connection]: a plain tagged enum.
#[derive(Serialize, Deserialize)]
#[serde(rename = "Connection", rename_all = "snake_case")]
enum TaggedConnection {
    All,
    Dense(Vec<bool>),
}

impl Serialize for Connection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match (self, serializer.is_human_readable()) {
            (Connection::All, true) => serializer.serialize_str(ALL),
            (Connection::Dense(cells), true) => cells.serialize(serializer),
            (Connection::All, false) => serializer.serialize_unit_variant("Connection", 0, ALL),
            (Connection::Dense(cells), false) => {
                serializer.serialize_newtype_variant("Connection", 1, "dense", cells)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Connection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if !deserializer.is_human_readable() {
            return Ok(match TaggedConnection::deserialize(deserializer)? {
                TaggedConnection::All => Connection::All,
                TaggedConnection::Dense(cells) => Connection::Dense(cells),
            });
        }

        struct ConnectionVisitor;

        impl<'de> Visitor<'de> for ConnectionVisitor {
            type Value = Connection;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("the string \"all\" or a sequence of booleans")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value == ALL {
                    Ok(Connection::All)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(value), &self))
                }
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut cells = Vec::with_capacity(cautious_capacity(seq.size_hint()));
                while let Some(cell) = seq.next_element()? {
                    cells.push(cell);
                }

                Ok(Connection::Dense(cells))
            }
        }

        deserializer.deserialize_any(ConnectionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_table_uses_sentinel() {
        let record = encode(&ConnectionTable::full(1, 6)).unwrap();

        assert_eq!(record, ConnectionTableRecord::new(1, 6, Connection::All));
        assert_eq!(decode(record).unwrap(), ConnectionTable::full(1, 6));
    }

    #[test]
    fn sparse_table_is_dense() {
        let table = ConnectionTable::from_fn(3, 4, |row, col| (row + col) % 2 == 0);
        let record = encode(&table).unwrap();

        assert_eq!(
            record.connection,
            Connection::Dense(table.cells().unwrap().to_vec())
        );
        assert_eq!(decode(record).unwrap(), table);
    }

    #[test]
    fn dense_payload_length_is_checked() {
        let record = ConnectionTableRecord::new(2, 2, Connection::Dense(vec![true, false, true]));

        assert!(matches!(decode(record), Err(ArchiveError::Schema(_))));
    }

    #[test]
    fn sentinel_is_not_expanded() {
        let record = ConnectionTableRecord::new(u32::MAX, u32::MAX, Connection::All);
        let table = decode(record).unwrap();

        assert_eq!(table.rows(), u32::MAX as usize);
        assert!(table.cells().is_none());
    }

    #[test]
    fn json_uses_plain_payloads() {
        let all = ConnectionTableRecord::new(1, 2, Connection::All);
        let dense = ConnectionTableRecord::new(1, 2, Connection::Dense(vec![true, false]));

        let all_json = serde_json::to_string(&all).unwrap();
        let dense_json = serde_json::to_string(&dense).unwrap();

        assert_eq!(all_json, r#"{"rows":1,"cols":2,"connection":"all"}"#);
        assert_eq!(dense_json, r#"{"rows":1,"cols":2,"connection":[true,false]}"#);
        assert_eq!(
            serde_json::from_str::<ConnectionTableRecord>(&all_json).unwrap(),
            all
        );
        assert_eq!(
            serde_json::from_str::<ConnectionTableRecord>(&dense_json).unwrap(),
            dense
        );
    }

    #[test]
    fn json_rejects_other_strings() {
        let json = r#"{"rows":1,"cols":2,"connection":"some"}"#;
        let result = serde_json::from_str::<ConnectionTableRecord>(json);

        assert!(result.is_err());
    }
}
