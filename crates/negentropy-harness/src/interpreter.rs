//! The line-protocol command loop.
//!
//! ```text
//! Loading ──seal──▶ Sealed ──(end of input)──▶ joined
//!   item              initiate / msg
//! ```
//!
//! Output lines are flushed as soon as a command completes so an
//! orchestrator piping two harnesses together never waits on a buffer.

use negentropy_harness_store::VectorStore;
use negentropy_harness_sync::{CollectedIds, Negentropy, Outcome, Session, SessionState};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::command::Command;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};

type HarnessSession = Session<Negentropy<VectorStore>>;

enum Phase {
    Loading(VectorStore),
    Sealed(HarnessSession),
    Closed,
}

/// Executes commands against one store and one session, writing protocol
/// lines to `out`.
pub struct Interpreter<W> {
    config: HarnessConfig,
    phase: Phase,
    out: W,
}

impl<W: AsyncWrite + Unpin> Interpreter<W> {
    pub fn new(config: HarnessConfig, out: W) -> Result<Self> {
        config.validate()?;
        let store = config.new_store()?;
        Ok(Self {
            config,
            phase: Phase::Loading(store),
            out,
        })
    }

    /// Session state, or `None` before `seal`.
    pub fn session_state(&self) -> Option<SessionState> {
        match &self.phase {
            Phase::Sealed(session) => Some(session.state()),
            _ => None,
        }
    }

    /// Mutable access to the output sink, e.g. to drain a buffer between
    /// commands.
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Process every line of `input`, then wind down.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<W> {
        let mut lines = input.lines();
        let mut line_no = 0u64;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            tracing::trace!(line = line_no, input = line, "command");

            let command = Command::parse(line)?;
            self.execute(command).await?;
        }

        self.finish().await
    }

    /// Execute a single command.
    pub async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Item { created, id } => match &mut self.phase {
                Phase::Loading(store) => Ok(store.insert(created, id)?),
                _ => Err(after_seal("item")),
            },

            Command::Seal => self.seal(),

            Command::Initiate => {
                let session = self.session("initiate")?;
                let msg = session.initiate()?;
                self.write_msg(&msg).await
            }

            Command::Msg(payload) => {
                let session = self.session("msg")?;
                let outcome = session.receive(&payload).await?;
                match outcome {
                    Outcome::Message(reply) => self.write_msg(&reply).await,
                    Outcome::Converged(ids) => self.write_report(&ids).await,
                }
            }
        }
    }

    /// Join the collector and flush output. Called at end of input.
    pub async fn finish(mut self) -> Result<W> {
        if let Phase::Sealed(session) = std::mem::replace(&mut self.phase, Phase::Closed) {
            match session.state() {
                SessionState::Initiator => {
                    tracing::warn!("input ended before reconciliation converged");
                }
                SessionState::Uninitialized => {
                    tracing::debug!("input ended before any exchange");
                }
                SessionState::Responder | SessionState::Done => {}
            }
            session.finish().await?;
        }

        self.out.flush().await?;
        Ok(self.out)
    }

    fn seal(&mut self) -> Result<()> {
        let mut store = match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Loading(store) => store,
            _ => return Err(after_seal("seal")),
        };

        store.seal()?;
        tracing::info!(records = store.len(), "sealed");

        let engine = self.config.engine(store)?;
        self.phase = Phase::Sealed(Session::new(engine, self.config.guard()));
        Ok(())
    }

    fn session(&mut self, command: &'static str) -> Result<&mut HarnessSession> {
        match &mut self.phase {
            Phase::Sealed(session) => Ok(session),
            Phase::Loading(_) => Err(HarnessError::InvalidPhase {
                command,
                phase: "before seal",
            }),
            Phase::Closed => Err(after_seal(command)),
        }
    }

    async fn write_msg(&mut self, msg: &[u8]) -> Result<()> {
        let line = format!("msg,{}\n", hex::encode(msg));
        self.out.write_all(line.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn write_report(&mut self, ids: &CollectedIds) -> Result<()> {
        let mut report = String::new();
        for id in &ids.have {
            report.push_str("have,");
            report.push_str(&id.to_hex());
            report.push('\n');
        }
        for id in &ids.need {
            report.push_str("need,");
            report.push_str(&id.to_hex());
            report.push('\n');
        }
        report.push_str("done\n");

        self.out.write_all(report.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }
}

fn after_seal(command: &'static str) -> HarnessError {
    HarnessError::InvalidPhase {
        command,
        phase: "after seal",
    }
}
