//! ConversationStore - actor that owns the chat sessions
//!
//! Processes commands via channels so that every write to a conversation is
//! serialized in the order it was sent.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::messages::{StoreCommand, StoreError, StoreResponse};
use super::persistence::{SessionFiles, validate_id};
use crate::domain::{ChatSession, Message};

/// Handle to send commands to the conversation store
#[derive(Clone)]
pub struct ConversationStore {
    tx: mpsc::Sender<StoreCommand>,
}

impl ConversationStore {
    /// Spawn a store actor, persisting to `dir` when given
    pub fn spawn(dir: Option<PathBuf>) -> eyre::Result<Self> {
        debug!(?dir, "spawn: called");
        let state = match dir {
            Some(dir) => {
                let files = SessionFiles::open(&dir)?;
                let sessions = files.load_all()?;
                info!(count = sessions.len(), dir = %dir.display(), "Loaded chat sessions");
                Sessions {
                    sessions,
                    files: Some(files),
                }
            }
            None => Sessions::default(),
        };
        Ok(Self::start(state))
    }

    /// Spawn a store actor that keeps sessions in memory only
    pub fn in_memory() -> Self {
        debug!("in_memory: called");
        Self::start(Sessions::default())
    }

    fn start(state: Sessions) -> Self {
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(state, rx));
        info!("ConversationStore spawned");
        Self { tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StoreResponse<T>>) -> StoreCommand,
    ) -> StoreResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    /// Create a new empty session with a fresh id
    pub async fn create_session(&self) -> StoreResponse<ChatSession> {
        debug!("create_session: called");
        self.request(|reply| StoreCommand::CreateSession { reply }).await
    }

    /// Get the session with this id, creating it empty if missing
    pub async fn ensure_session(&self, id: &str) -> StoreResponse<ChatSession> {
        debug!(%id, "ensure_session: called");
        self.request(|reply| StoreCommand::EnsureSession {
            id: id.to_string(),
            reply,
        })
        .await
    }

    pub async fn get_session(&self, id: &str) -> StoreResponse<Option<ChatSession>> {
        debug!(%id, "get_session: called");
        self.request(|reply| StoreCommand::GetSession {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Get a session, returning error if not found
    pub async fn get_session_required(&self, id: &str) -> StoreResponse<ChatSession> {
        debug!(%id, "get_session_required: called");
        self.get_session(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// All sessions, most recently updated first
    pub async fn list_sessions(&self) -> StoreResponse<Vec<ChatSession>> {
        debug!("list_sessions: called");
        self.request(|reply| StoreCommand::ListSessions { reply }).await
    }

    /// Messages of a session in commit order. Unknown sessions are empty.
    pub async fn messages(&self, id: &str) -> StoreResponse<Vec<Message>> {
        debug!(%id, "messages: called");
        self.request(|reply| StoreCommand::Messages {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Append messages as one update and wait for it to be applied
    ///
    /// Returns the session's message count afterwards.
    pub async fn append(&self, id: &str, messages: Vec<Message>) -> StoreResponse<usize> {
        debug!(%id, count = messages.len(), "append: called");
        self.request(|reply| StoreCommand::Append {
            id: id.to_string(),
            messages,
            reply,
        })
        .await
    }

    /// Queue an append without waiting for it to be applied
    ///
    /// The command is enqueued before this returns, so any later append on
    /// this store lands after it. Failures are logged, not returned.
    pub async fn append_detached(&self, id: &str, messages: Vec<Message>) -> StoreResponse<()> {
        debug!(%id, count = messages.len(), "append_detached: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Append {
                id: id.to_string(),
                messages,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::ChannelError)?;

        let id = id.to_string();
        tokio::spawn(async move {
            match reply_rx.await {
                Ok(Ok(count)) => debug!(%id, count, "append_detached: applied"),
                Ok(Err(e)) => warn!(%id, error = %e, "append_detached: store rejected append"),
                Err(_) => warn!(%id, "append_detached: store went away before replying"),
            }
        });
        Ok(())
    }

    /// Delete a session. Returns whether it existed.
    pub async fn delete_session(&self, id: &str) -> StoreResponse<bool> {
        debug!(%id, "delete_session: called");
        self.request(|reply| StoreCommand::DeleteSession {
            id: id.to_string(),
            reply,
        })
        .await
    }

    /// Shutdown the ConversationStore
    pub async fn shutdown(&self) -> StoreResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StoreCommand::Shutdown)
            .await
            .map_err(|_| StoreError::ChannelError)
    }
}

/// State owned by the actor task
#[derive(Default)]
struct Sessions {
    sessions: HashMap<String, ChatSession>,
    files: Option<SessionFiles>,
}

impl Sessions {
    fn persist(&self, session: &ChatSession) -> StoreResponse<()> {
        match &self.files {
            Some(files) => files.save(session),
            None => Ok(()),
        }
    }

    fn ensure(&mut self, id: &str) -> StoreResponse<ChatSession> {
        validate_id(id)?;
        if let Some(session) = self.sessions.get(id) {
            return Ok(session.clone());
        }
        let session = ChatSession::with_id(id);
        self.persist(&session)?;
        self.sessions.insert(id.to_string(), session.clone());
        Ok(session)
    }

    fn append(&mut self, id: &str, messages: Vec<Message>) -> StoreResponse<usize> {
        validate_id(id)?;
        let session = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| ChatSession::with_id(id));
        session.append(messages);
        let count = session.messages.len();

        let snapshot = session.clone();
        self.persist(&snapshot)?;
        Ok(count)
    }

    fn list(&self) -> Vec<ChatSession> {
        let mut sessions: Vec<ChatSession> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        sessions
    }

    fn delete(&mut self, id: &str) -> StoreResponse<bool> {
        let existed = self.sessions.remove(id).is_some();
        if existed && let Some(files) = &self.files {
            files.remove(id)?;
        }
        Ok(existed)
    }
}

/// The actor loop that processes commands
async fn actor_loop(mut state: Sessions, mut rx: mpsc::Receiver<StoreCommand>) {
    debug!("actor_loop: called");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::CreateSession { reply } => {
                debug!("actor_loop: CreateSession command");
                let session = ChatSession::new();
                let result = state.persist(&session).map(|()| {
                    state.sessions.insert(session.id.clone(), session.clone());
                    session
                });
                let _ = reply.send(result);
            }

            StoreCommand::EnsureSession { id, reply } => {
                debug!(%id, "actor_loop: EnsureSession command");
                let _ = reply.send(state.ensure(&id));
            }

            StoreCommand::GetSession { id, reply } => {
                debug!(%id, "actor_loop: GetSession command");
                let _ = reply.send(Ok(state.sessions.get(&id).cloned()));
            }

            StoreCommand::ListSessions { reply } => {
                debug!("actor_loop: ListSessions command");
                let _ = reply.send(Ok(state.list()));
            }

            StoreCommand::Messages { id, reply } => {
                debug!(%id, "actor_loop: Messages command");
                let messages = state.sessions.get(&id).map(|s| s.messages.clone()).unwrap_or_default();
                let _ = reply.send(Ok(messages));
            }

            StoreCommand::Append { id, messages, reply } => {
                debug!(%id, count = messages.len(), "actor_loop: Append command");
                let _ = reply.send(state.append(&id, messages));
            }

            StoreCommand::DeleteSession { id, reply } => {
                debug!(%id, "actor_loop: DeleteSession command");
                let _ = reply.send(state.delete(&id));
            }

            StoreCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("ConversationStore shutting down");
                break;
            }
        }
    }

    debug!("ConversationStore actor stopped");
}
