//! Two-party fixtures.
//!
//! [`TwoPartyFixture`] plays the orchestrator: it runs a client and a server
//! interpreter in one process and pipes every `msg` line from one into the
//! other until the client prints `done`.

use negentropy_harness::{Command, HarnessConfig, HarnessError, Interpreter, Result};
use negentropy_harness_core::Id;
use negentropy_harness_store::VectorStore;
use negentropy_harness_sync::{Negentropy, Reconciler, VecSink};

use crate::generators::SetPair;

/// Give up after this many client messages.
pub const MAX_ROUNDS: usize = 10_000;

/// What the client printed over one exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// Every `msg` payload the client sent, in order, hex-encoded.
    pub client_messages: Vec<String>,
    /// Every `msg` payload the server sent, in order, hex-encoded.
    pub server_messages: Vec<String>,
    /// `have` ids in output order.
    pub have: Vec<String>,
    /// `need` ids in output order.
    pub need: Vec<String>,
    /// Whether the client printed `done`.
    pub done: bool,
}

impl Transcript {
    /// `have` ids, sorted.
    pub fn sorted_have(&self) -> Vec<String> {
        let mut ids = self.have.clone();
        ids.sort();
        ids
    }

    /// `need` ids, sorted.
    pub fn sorted_need(&self) -> Vec<String> {
        let mut ids = self.need.clone();
        ids.sort();
        ids
    }

    /// Number of client messages, i.e. round trips.
    pub fn rounds(&self) -> usize {
        self.client_messages.len()
    }
}

/// A client and a server record set plus the configuration both run with.
#[derive(Debug, Clone, Default)]
pub struct TwoPartyFixture {
    pub config: HarnessConfig,
    pub client: Vec<(u64, Id)>,
    pub server: Vec<(u64, Id)>,
}

impl TwoPartyFixture {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            client: Vec::new(),
            server: Vec::new(),
        }
    }

    /// Build from a generated set pair.
    pub fn from_pair(config: HarnessConfig, pair: &SetPair) -> Self {
        Self {
            config,
            client: pair.client.clone(),
            server: pair.server.clone(),
        }
    }

    pub fn client_item(mut self, created: u64, id: Id) -> Self {
        self.client.push((created, id));
        self
    }

    pub fn server_item(mut self, created: u64, id: Id) -> Self {
        self.server.push((created, id));
        self
    }

    /// Add a record to both sides.
    pub fn shared_item(self, created: u64, id: Id) -> Self {
        self.client_item(created, id).server_item(created, id)
    }

    /// Run the exchange through two interpreters. Must be awaited within a
    /// tokio runtime.
    pub async fn run(&self) -> Result<Transcript> {
        let mut client = load(&self.config, &self.client).await?;
        let mut server = load(&self.config, &self.server).await?;
        let mut transcript = Transcript::default();

        client.execute(Command::Initiate).await?;

        while !transcript.done {
            if transcript.client_messages.len() >= MAX_ROUNDS {
                return Err(HarnessError::Config(format!(
                    "no convergence after {MAX_ROUNDS} rounds"
                )));
            }

            let mut forwarded = false;
            for line in drain_lines(&mut client) {
                if let Some(payload) = line.strip_prefix("msg,") {
                    transcript.client_messages.push(payload.to_string());
                    server.execute(Command::parse(&line)?).await?;
                    forwarded = true;
                } else if let Some(id) = line.strip_prefix("have,") {
                    transcript.have.push(id.to_string());
                } else if let Some(id) = line.strip_prefix("need,") {
                    transcript.need.push(id.to_string());
                } else if line == "done" {
                    transcript.done = true;
                } else {
                    return Err(HarnessError::UnknownCommand(line));
                }
            }

            if transcript.done {
                break;
            }
            if !forwarded {
                return Err(HarnessError::Config("client stalled without a message".into()));
            }

            for line in drain_lines(&mut server) {
                if let Some(payload) = line.strip_prefix("msg,") {
                    transcript.server_messages.push(payload.to_string());
                }
                // a server only ever writes msg lines
                client.execute(Command::parse(&line)?).await?;
            }
        }

        client.finish().await?;
        server.finish().await?;
        Ok(transcript)
    }
}

async fn load(config: &HarnessConfig, records: &[(u64, Id)]) -> Result<Interpreter<Vec<u8>>> {
    let mut interpreter = Interpreter::new(config.clone(), Vec::new())?;
    for (created, id) in records {
        interpreter
            .execute(Command::Item {
                created: *created,
                id: *id,
            })
            .await?;
    }
    interpreter.execute(Command::Seal).await?;
    Ok(interpreter)
}

fn drain_lines(interpreter: &mut Interpreter<Vec<u8>>) -> Vec<String> {
    let buf = std::mem::take(interpreter.writer_mut());
    String::from_utf8_lossy(&buf)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Reconcile two record sets directly against the engine, without the line
/// protocol or the collector. Returns the initiator's ids and the number of
/// initiator messages.
pub fn reconcile_direct(
    client: &[(u64, Id)],
    server: &[(u64, Id)],
    frame_size_limit: u64,
) -> negentropy_harness_sync::Result<(VecSink, usize)> {
    let mut initiator = Negentropy::new(sealed_store(client)?, frame_size_limit)?;
    let mut responder = Negentropy::new(sealed_store(server)?, frame_size_limit)?;
    let mut sink = VecSink::default();

    let mut query = initiator.initiate()?;
    let mut rounds = 1;
    loop {
        let reply = responder.respond(&query)?;
        match initiator.reconcile(&reply, &mut sink)? {
            Some(next) => {
                query = next;
                rounds += 1;
            }
            None => return Ok((sink, rounds)),
        }
    }
}

fn sealed_store(records: &[(u64, Id)]) -> negentropy_harness_sync::Result<VectorStore> {
    let mut store = VectorStore::new();
    for (created, id) in records {
        store.insert(*created, *id)?;
    }
    store.seal()?;
    Ok(store)
}
