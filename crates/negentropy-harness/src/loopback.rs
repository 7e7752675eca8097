//! Single-process reconciliation between a client and a server store.
//!
//! Input lines are `<side>,<created>,<id>` where side `1` adds the record
//! to the client, `2` to the server and `3` to both. Once input ends both
//! stores are sealed and the exchange runs to convergence in memory. The
//! client's `have` and `need` lines are written followed by `done`.

use negentropy_harness_core::Id;
use negentropy_harness_sync::{CollectedIds, Outcome, Session, SyncError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::command::{parse_id, parse_timestamp};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};

/// Which store a loopback record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
    Both,
}

/// One loopback input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackRecord {
    pub side: Side,
    pub created: u64,
    pub id: Id,
}

impl LoopbackRecord {
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            return Err(HarnessError::WrongFieldCount {
                command: "loopback record",
                expected: "3",
                got: fields.len(),
            });
        }

        let side = match fields[0] {
            "1" => Side::Client,
            "2" => Side::Server,
            "3" => Side::Both,
            other => return Err(HarnessError::InvalidMode(other.to_string())),
        };

        Ok(Self {
            side,
            created: parse_timestamp(fields[1])?,
            id: parse_id(fields[2])?,
        })
    }
}

/// Read records from `input`, reconcile in memory, report to `out`.
pub async fn run_loopback<R, W>(config: &HarnessConfig, input: R, mut out: W) -> Result<CollectedIds>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    config.validate()?;
    let mut client_store = config.new_store()?;
    let mut server_store = config.new_store()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let record = LoopbackRecord::parse(line)?;
        if matches!(record.side, Side::Client | Side::Both) {
            client_store.insert(record.created, record.id)?;
        }
        if matches!(record.side, Side::Server | Side::Both) {
            server_store.insert(record.created, record.id)?;
        }
    }

    client_store.seal()?;
    server_store.seal()?;
    tracing::info!(
        client = client_store.len(),
        server = server_store.len(),
        "loopback stores sealed"
    );

    let mut client = Session::new(config.engine(client_store)?, config.guard());
    let mut server = Session::new(config.engine(server_store)?, config.guard());

    let mut query = client.initiate()?;
    let ids = loop {
        let reply = match server.receive(&query).await? {
            Outcome::Message(reply) => reply,
            Outcome::Converged(_) => {
                return Err(SyncError::WrongRole("responder reported convergence").into());
            }
        };

        match client.receive(&reply).await? {
            Outcome::Message(next) => query = next,
            Outcome::Converged(ids) => break ids,
        }
    };
    server.finish().await?;

    for id in &ids.have {
        out.write_all(format!("have,{id}\n").as_bytes()).await?;
    }
    for id in &ids.need {
        out.write_all(format!("need,{id}\n").as_bytes()).await?;
    }
    out.write_all(b"done\n").await?;
    out.flush().await?;

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let rec = LoopbackRecord::parse("3,100,aa").unwrap();
        assert_eq!(rec.side, Side::Both);
        assert_eq!(rec.created, 100);
        assert_eq!(rec.id.to_hex(), "aa");

        assert!(matches!(
            LoopbackRecord::parse("4,100,aa"),
            Err(HarnessError::InvalidMode(_))
        ));
        assert!(matches!(
            LoopbackRecord::parse("1,100"),
            Err(HarnessError::WrongFieldCount { .. })
        ));
    }

    #[tokio::test]
    async fn test_loopback_scenario() {
        let input = "3,100,aa\n2,200,bb\n1,300,cc\n";
        let mut out = Vec::new();
        let ids = run_loopback(&HarnessConfig::default(), input.as_bytes(), &mut out)
            .await
            .unwrap();

        assert_eq!(ids.have.len(), 1);
        assert_eq!(ids.need.len(), 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "have,cc\nneed,bb\ndone\n"
        );
    }

    #[tokio::test]
    async fn test_loopback_empty_input() {
        let mut out = Vec::new();
        let ids = run_loopback(&HarnessConfig::default(), &b""[..], &mut out)
            .await
            .unwrap();
        assert!(ids.is_empty());
        assert_eq!(out, b"done\n");
    }
}
