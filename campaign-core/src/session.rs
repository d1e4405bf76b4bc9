use std::time::Duration;

use thiserror::Error;

use crate::models::{AgentThread, MessageRole, SortOrder, ThreadMessage, ThreadRun};
use crate::orchestrator::{Orchestrator, OrchestratorError, DEFAULT_AGENT_ID};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("No active thread. Call create_thread() first.")]
    NoThread,

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Result of one conversational turn.
#[derive(Debug, Clone)]
pub struct SessionReply {
    pub run: ThreadRun,
    /// The newest message, when the agent authored it.
    pub reply: Option<ThreadMessage>,
}

/// A single conversation over the orchestrator: the current thread, a local
/// copy of its messages, and the state of the last turn.
pub struct ConversationSession {
    orchestrator: Orchestrator,
    agent_id: String,
    poll_interval: Duration,
    thread: Option<AgentThread>,
    messages: Vec<ThreadMessage>,
    is_processing: bool,
    last_error: Option<SessionError>,
}

impl ConversationSession {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            agent_id: DEFAULT_AGENT_ID.to_string(),
            poll_interval: Duration::from_millis(500),
            thread: None,
            messages: Vec::new(),
            is_processing: false,
            last_error: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn thread(&self) -> Option<&AgentThread> {
        self.thread.as_ref()
    }

    pub fn messages(&self) -> &[ThreadMessage] {
        &self.messages
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub async fn create_thread(&mut self, metadata: Option<serde_json::Value>) -> AgentThread {
        let thread = self.orchestrator.create_thread(metadata).await;
        self.thread = Some(thread.clone());
        self.messages.clear();
        self.last_error = None;
        thread
    }

    /// Post a user message, run the agent and wait for the reply.
    pub async fn send_message(&mut self, content: &str) -> Result<SessionReply, SessionError> {
        let Some(thread_id) = self.thread.as_ref().map(|t| t.id.clone()) else {
            self.last_error = Some(SessionError::NoThread);
            return Err(SessionError::NoThread);
        };

        self.is_processing = true;
        self.last_error = None;
        let result = self.run_turn(&thread_id, content).await;
        self.is_processing = false;

        if let Err(e) = &result {
            tracing::warn!(thread_id = %thread_id, error = %e, "Conversation turn failed");
            self.last_error = Some(e.clone());
        }
        result
    }

    async fn run_turn(&mut self, thread_id: &str, content: &str) -> Result<SessionReply, SessionError> {
        let user_message = self
            .orchestrator
            .create_message(thread_id, MessageRole::User, content)
            .await?;
        self.messages.push(user_message);

        let run = self.orchestrator.create_run(thread_id, &self.agent_id).await?;
        let run = self
            .orchestrator
            .wait_for_run(thread_id, &run.id, self.poll_interval)
            .await?;

        self.messages = self
            .orchestrator
            .list_messages(thread_id, SortOrder::Ascending)
            .await;
        let reply = self
            .messages
            .last()
            .filter(|m| m.role == MessageRole::Assistant)
            .cloned();

        Ok(SessionReply { run, reply })
    }

    /// Switch to an existing thread. Returns `None` (leaving the session
    /// untouched) when the thread does not exist.
    pub async fn load_thread(&mut self, thread_id: &str) -> Option<AgentThread> {
        let thread = self.orchestrator.get_thread(thread_id).await?;
        self.messages = self
            .orchestrator
            .list_messages(thread_id, SortOrder::Ascending)
            .await;
        self.thread = Some(thread.clone());
        Some(thread)
    }

    /// Drop the current thread here and in the orchestrator.
    pub async fn clear_thread(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.orchestrator.delete_thread(&thread.id).await;
        }
        self.messages.clear();
        self.last_error = None;
    }

    pub fn reset_error(&mut self) {
        self.last_error = None;
    }
}
