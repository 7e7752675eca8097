//! Input line parsing.
//!
//! Lines are comma-separated with no escaping; the first field names the
//! command.

use negentropy_harness_core::{Id, MAX_TIMESTAMP};

use crate::error::{HarnessError, Result};

/// One harness command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `item,<created>,<id>`
    Item { created: u64, id: Id },
    /// `seal`
    Seal,
    /// `initiate`
    Initiate,
    /// `msg,<payload>`; the payload may be empty or absent.
    Msg(Vec<u8>),
}

impl Command {
    /// Parse a non-blank input line.
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').collect();

        match fields[0] {
            "item" => {
                expect_fields("item", "3", fields.len() == 3, fields.len())?;
                Ok(Command::Item {
                    created: parse_timestamp(fields[1])?,
                    id: parse_id(fields[2])?,
                })
            }
            "seal" => {
                expect_fields("seal", "1", fields.len() == 1, fields.len())?;
                Ok(Command::Seal)
            }
            "initiate" => {
                expect_fields("initiate", "1", fields.len() == 1, fields.len())?;
                Ok(Command::Initiate)
            }
            "msg" => {
                expect_fields("msg", "1 or 2", fields.len() <= 2, fields.len())?;
                let payload = fields.get(1).copied().unwrap_or("");
                let bytes = hex::decode(payload).map_err(HarnessError::InvalidPayload)?;
                Ok(Command::Msg(bytes))
            }
            other => Err(HarnessError::UnknownCommand(other.to_string())),
        }
    }

    /// Command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Item { .. } => "item",
            Command::Seal => "seal",
            Command::Initiate => "initiate",
            Command::Msg(_) => "msg",
        }
    }
}

fn expect_fields(command: &'static str, expected: &'static str, ok: bool, got: usize) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(HarnessError::WrongFieldCount {
            command,
            expected,
            got,
        })
    }
}

/// Parse a decimal u64 creation timestamp.
///
/// `u64::MAX` is reserved for the infinity bound and rejected.
pub fn parse_timestamp(field: &str) -> Result<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HarnessError::InvalidTimestamp(field.to_string()));
    }
    match field.parse() {
        Ok(created) if created != MAX_TIMESTAMP => Ok(created),
        _ => Err(HarnessError::InvalidTimestamp(field.to_string())),
    }
}

/// Parse a hex id.
pub fn parse_id(field: &str) -> Result<Id> {
    Id::from_hex(field).map_err(|source| HarnessError::InvalidId {
        value: field.to_string(),
        source,
    })
}
