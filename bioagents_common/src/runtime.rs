//! Facilitator session runtime.
//!
//! Drives one [`Bioagent`] against a facilitator connection: registers the
//! agent, subscribes to its request patterns, announces readiness, then
//! loops receiving performatives and dispatching `request` messages to the
//! agent's task handlers.
//!
//! The connection is behind the [`Transport`] trait so integration tests
//! can run the exact dispatch path over an in-memory transport and inspect
//! everything the agent sent.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, error, info, warn};

use bioagents_kqml::{KqmlError, KqmlList, KqmlValue, Performative, read_performative};

use crate::agent::{
    Bioagent, REASON_INVALID_REQUEST, REASON_UNKNOWN_TASK, ReplyContext, TaskError, make_failure,
};

/// Runtime error for a facilitator session.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Codec or transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] KqmlError),

    /// TCP connect failure.
    #[error("could not reach facilitator at {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
}

// ─── Transport ──────────────────────────────────────────────────────

/// Bidirectional performative stream.
#[async_trait]
pub trait Transport: Send {
    /// Send one performative.
    async fn send(&mut self, perf: &Performative) -> Result<(), KqmlError>;

    /// Receive the next performative; `None` on orderly close.
    async fn recv(&mut self) -> Result<Option<Performative>, KqmlError>;
}

/// TCP transport to a live facilitator.
pub struct TcpTransport {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TcpTransport {
    /// Connect to the facilitator at `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, AgentError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| AgentError::Connect { addr, source })?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, perf: &Performative) -> Result<(), KqmlError> {
        let mut wire = perf.to_string();
        wire.push('\n');
        self.writer.write_all(wire.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Performative>, KqmlError> {
        read_performative(&mut self.reader).await
    }
}

/// Everything an agent sent over a [`ChannelTransport`], in send order.
pub type OutputLog = Arc<Mutex<Vec<Performative>>>;

/// In-memory transport for tests.
///
/// Inbound messages are scripted up front; outbound messages are appended
/// to a shared log the test can inspect after the session ends.
pub struct ChannelTransport {
    inbound: VecDeque<Performative>,
    log: OutputLog,
}

impl ChannelTransport {
    /// Transport that will deliver `inbound` then signal a clean close.
    pub fn scripted(inbound: impl IntoIterator<Item = Performative>) -> (Self, OutputLog) {
        let log: OutputLog = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inbound: inbound.into_iter().collect(),
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, perf: &Performative) -> Result<(), KqmlError> {
        self.log.lock().push(perf.clone());
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Performative>, KqmlError> {
        Ok(self.inbound.pop_front())
    }
}

// ─── AgentRuntime ───────────────────────────────────────────────────

/// Session driver binding one agent to one transport.
pub struct AgentRuntime<A, T> {
    agent: A,
    transport: T,
}

impl<A: Bioagent, T: Transport> AgentRuntime<A, T> {
    pub fn new(agent: A, transport: T) -> Self {
        Self { agent, transport }
    }

    /// Register, subscribe to each task, and announce readiness.
    pub async fn start(&mut self) -> Result<(), AgentError> {
        let mut register = Performative::new("register");
        register.set("name", KqmlValue::token(self.agent.name().to_string()));
        self.transport.send(&register).await?;

        // One (subscribe :content (request &key :content (TASK . *))) per task.
        for task in self.agent.tasks() {
            let mut pattern = KqmlList::of("request");
            pattern.push(KqmlValue::token("&key"));
            let wildcard: KqmlList = vec![
                KqmlValue::token(task.to_string()),
                KqmlValue::token("."),
                KqmlValue::token("*"),
            ]
            .into();
            pattern.set("content", wildcard);
            let mut subscribe = Performative::new("subscribe");
            subscribe.set("content", pattern);
            self.transport.send(&subscribe).await?;
        }

        let mut status = KqmlList::of("module-status");
        status.push(KqmlValue::token("ready"));
        let mut ready = Performative::new("tell");
        ready.set("content", status);
        self.transport.send(&ready).await?;

        info!("{} is registered and ready", self.agent.name());
        Ok(())
    }

    /// Run the full session: [`start`](Self::start) then the receive loop.
    ///
    /// Returns when the transport closes or an `exit` performative arrives.
    pub async fn run(&mut self) -> Result<(), AgentError> {
        self.start().await?;
        while let Some(msg) = self.transport.recv().await? {
            if !self.handle_message(msg).await? {
                break;
            }
        }
        info!("{} session ended", self.agent.name());
        Ok(())
    }

    /// Handle one incoming performative. Returns `false` when the session
    /// should end.
    async fn handle_message(&mut self, msg: Performative) -> Result<bool, AgentError> {
        match msg.verb().to_ascii_lowercase().as_str() {
            "request" => self.receive_request(&msg).await?,
            "tell" => debug!("{} received tell: {}", self.agent.name(), msg),
            "error" => warn!("{} received error: {}", self.agent.name(), msg),
            "exit" => {
                info!("{} received exit", self.agent.name());
                return Ok(false);
            }
            other => debug!("{} ignoring '{other}' performative", self.agent.name()),
        }
        Ok(true)
    }

    /// Decode a request, dispatch it, and reply.
    async fn receive_request(&mut self, msg: &Performative) -> Result<(), AgentError> {
        let content = msg.get_list("content");
        let task = content.and_then(KqmlList::head).map(str::to_uppercase);

        let (task, content) = match (task, content) {
            (Some(task), Some(content)) => (task, content.clone()),
            _ => {
                error!("could not get task string from request");
                let failure = make_failure(REASON_INVALID_REQUEST, None);
                return self.reply_with_content(msg, failure).await;
            }
        };

        if !self.agent.accepts_task(&task) {
            error!(
                "task {task} not found in {:?} for {}",
                self.agent.tasks(),
                self.agent.name()
            );
            let failure = make_failure(REASON_UNKNOWN_TASK, None);
            return self.reply_with_content(msg, failure).await;
        }

        let mut cx = ReplyContext::new();
        let reply_content = match self.agent.handle_task(&task, &content, &mut cx) {
            Ok(content) => content,
            Err(TaskError::Internal(detail)) => {
                error!("could not perform response to {task}: {detail}");
                TaskError::Internal(detail).into_content()
            }
            Err(err) => err.into_content(),
        };

        for tell_content in cx.take_tells() {
            self.tell(tell_content).await?;
        }
        self.reply_with_content(msg, reply_content).await
    }

    /// Send `(reply :receiver S :in-reply-to R :content ...)` derived from
    /// the incoming message's `:sender` and `:reply-with`.
    async fn reply_with_content(
        &mut self,
        msg: &Performative,
        content: KqmlList,
    ) -> Result<(), AgentError> {
        let mut reply = Performative::new("reply");
        if let Some(sender) = msg.gets("sender") {
            reply.set("receiver", KqmlValue::token(sender.to_string()));
        }
        if let Some(reply_with) = msg.gets("reply-with") {
            reply.set("in-reply-to", KqmlValue::token(reply_with.to_string()));
        }
        reply.set("content", content);
        self.transport.send(&reply).await?;
        Ok(())
    }

    /// Send a `(tell :content ...)` performative.
    pub async fn tell(&mut self, content: KqmlList) -> Result<(), AgentError> {
        let mut tell = Performative::new("tell");
        tell.set("content", content);
        self.transport.send(&tell).await?;
        Ok(())
    }
}
