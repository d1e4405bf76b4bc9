//! In-memory thread / message / run runtime over a single text generator.
//!
//! A run is created `queued` and processed on a spawned task: `in_progress`,
//! one generator call with the agent instructions plus the conversation so
//! far, then `completed` (assistant message appended) or `failed`. Nothing is
//! persisted; past `max_threads` the oldest threads are evicted with their
//! messages and runs.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::generator::TextGenerator;
use crate::models::{
    Agent, AgentThread, MessageRole, RunError, RunStatus, SortOrder, ThreadMessage, ThreadRun,
};

pub const DEFAULT_AGENT_ID: &str = "asst_marketing_orchestrator";

pub const DEFAULT_MAX_THREADS: usize = 1000;

const DEFAULT_AGENT_INSTRUCTIONS: &str = "Eres un asistente experto en marketing estratégico y gestión de campañas digitales.

Tu rol es ayudar a los usuarios a:
1. Planificar campañas de marketing completas
2. Definir estrategias de contenido
3. Crear mensajes persuasivos alineados con la marca
4. Estructurar funnels de conversión
5. Optimizar presupuestos y KPIs

Siempre responde de forma estratégica, ejecutable y específica. No uses generalidades.
Si falta información crítica, pregunta antes de proponer soluciones.
Mantén coherencia con las directrices de marca del usuario si las proporciona.";

const RUN_ERROR_CODE: &str = "execution_error";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("Thread {0} not found")]
    ThreadNotFound(String),

    #[error("Run {0} not found")]
    RunNotFound(String),

    /// Carries the run's last error message.
    #[error("{0}")]
    RunFailed(String),

    #[error("{0}")]
    RunCancelled(String),
}

pub fn default_agent() -> Agent {
    Agent {
        id: DEFAULT_AGENT_ID.to_string(),
        name: "Marketing Orchestrator".to_string(),
        instructions: DEFAULT_AGENT_INSTRUCTIONS.to_string(),
        model: "gpt-4o".to_string(),
        tools: Vec::new(),
    }
}

fn new_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), &suffix[..9])
}

fn build_run_prompt(agent: &Agent, history: &[ThreadMessage]) -> String {
    let conversation = history
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\nHistorial de conversación:\n{}\n\nPor favor, genera una respuesta como asistente que continúe esta conversación de forma natural y útil.",
        agent.instructions, conversation
    )
}

#[derive(Default)]
struct State {
    agents: HashMap<String, Agent>,
    threads: HashMap<String, AgentThread>,
    messages: HashMap<String, Vec<ThreadMessage>>,
    runs: HashMap<String, ThreadRun>,
    /// Thread ids, oldest first.
    order: VecDeque<String>,
}

impl State {
    fn remove_thread(&mut self, thread_id: &str) -> bool {
        let existed = self.threads.remove(thread_id).is_some();
        self.messages.remove(thread_id);
        self.runs.retain(|_, run| run.thread_id != thread_id);
        existed
    }
}

struct Inner {
    state: RwLock<State>,
    generator: Arc<dyn TextGenerator>,
    max_threads: usize,
}

/// Cheap to clone; clones share the same threads and runs.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_max_threads(generator, DEFAULT_MAX_THREADS)
    }

    /// Keep at most `max_threads` threads (at least one).
    pub fn with_max_threads(generator: Arc<dyn TextGenerator>, max_threads: usize) -> Self {
        let mut state = State::default();
        let agent = default_agent();
        state.agents.insert(agent.id.clone(), agent);

        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                generator,
                max_threads: max_threads.max(1),
            }),
        }
    }

    pub fn generator_name(&self) -> &str {
        self.inner.generator.name()
    }

    // ========================================================================
    // Agents
    // ========================================================================

    pub async fn register_agent(&self, agent: Agent) {
        tracing::debug!(agent_id = %agent.id, "Registering agent");
        self.inner.state.write().await.agents.insert(agent.id.clone(), agent);
    }

    pub async fn get_agent(&self, agent_id: &str) -> Option<Agent> {
        self.inner.state.read().await.agents.get(agent_id).cloned()
    }

    // ========================================================================
    // Threads
    // ========================================================================

    pub async fn create_thread(&self, metadata: Option<serde_json::Value>) -> AgentThread {
        let thread = AgentThread {
            id: new_id("thread"),
            created_at: Utc::now(),
            metadata,
        };

        let mut state = self.inner.state.write().await;
        state.threads.insert(thread.id.clone(), thread.clone());
        state.messages.insert(thread.id.clone(), Vec::new());
        state.order.push_back(thread.id.clone());

        while state.threads.len() > self.inner.max_threads {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            if state.remove_thread(&oldest) {
                tracing::debug!(thread_id = %oldest, "Thread evicted");
            }
        }

        tracing::debug!(thread_id = %thread.id, "Thread created");
        thread
    }

    pub async fn get_thread(&self, thread_id: &str) -> Option<AgentThread> {
        self.inner.state.read().await.threads.get(thread_id).cloned()
    }

    /// Remove a thread with its messages and runs. Returns whether it existed.
    pub async fn delete_thread(&self, thread_id: &str) -> bool {
        let mut state = self.inner.state.write().await;
        state.order.retain(|id| id != thread_id);
        state.remove_thread(thread_id)
    }

    pub async fn clear_all_threads(&self) {
        let mut state = self.inner.state.write().await;
        state.threads.clear();
        state.messages.clear();
        state.runs.clear();
        state.order.clear();
        let agent = default_agent();
        state.agents.insert(agent.id.clone(), agent);
        tracing::info!("All threads cleared");
    }

    // ========================================================================
    // Messages
    // ========================================================================

    pub async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, OrchestratorError> {
        let mut state = self.inner.state.write().await;
        if !state.threads.contains_key(thread_id) {
            return Err(OrchestratorError::ThreadNotFound(thread_id.to_string()));
        }

        let message = ThreadMessage {
            id: new_id("msg"),
            thread_id: thread_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        state
            .messages
            .entry(thread_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    /// Messages of a thread; empty for an unknown thread.
    pub async fn list_messages(&self, thread_id: &str, order: SortOrder) -> Vec<ThreadMessage> {
        let state = self.inner.state.read().await;
        let mut messages = state.messages.get(thread_id).cloned().unwrap_or_default();
        if order == SortOrder::Descending {
            messages.reverse();
        }
        messages
    }

    // ========================================================================
    // Runs
    // ========================================================================

    /// Queue a run and start processing it in the background.
    pub async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<ThreadRun, OrchestratorError> {
        let run = ThreadRun {
            id: new_id("run"),
            thread_id: thread_id.to_string(),
            agent_id: agent_id.to_string(),
            status: RunStatus::Queued,
            created_at: Utc::now(),
            completed_at: None,
            last_error: None,
        };

        {
            let mut state = self.inner.state.write().await;
            if !state.threads.contains_key(thread_id) {
                return Err(OrchestratorError::ThreadNotFound(thread_id.to_string()));
            }
            state.runs.insert(run.id.clone(), run.clone());
        }

        tracing::debug!(run_id = %run.id, thread_id, agent_id, "Run queued");
        tokio::spawn(process_run(self.inner.clone(), run.id.clone()));
        Ok(run)
    }

    /// The run, only if it belongs to `thread_id`.
    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Option<ThreadRun> {
        let state = self.inner.state.read().await;
        state
            .runs
            .get(run_id)
            .filter(|run| run.thread_id == thread_id)
            .cloned()
    }

    /// Cancel a queued or in-progress run. Terminal runs are returned unchanged.
    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<ThreadRun, OrchestratorError> {
        let mut state = self.inner.state.write().await;
        let run = state
            .runs
            .get_mut(run_id)
            .filter(|run| run.thread_id == thread_id)
            .ok_or_else(|| OrchestratorError::RunNotFound(run_id.to_string()))?;

        if !run.status.is_terminal() {
            run.status = RunStatus::Cancelled;
            run.completed_at = Some(Utc::now());
            tracing::info!(run_id, "Run cancelled");
        }
        Ok(run.clone())
    }

    /// Poll until the run leaves its non-terminal states.
    pub async fn wait_for_run(
        &self,
        thread_id: &str,
        run_id: &str,
        poll_interval: Duration,
    ) -> Result<ThreadRun, OrchestratorError> {
        loop {
            let run = self
                .get_run(thread_id, run_id)
                .await
                .ok_or_else(|| OrchestratorError::RunNotFound(run_id.to_string()))?;

            match run.status {
                RunStatus::Completed => return Ok(run),
                RunStatus::Failed => {
                    return Err(OrchestratorError::RunFailed(
                        run.last_error.map(|e| e.message).unwrap_or_else(|| "Run failed".to_string()),
                    ))
                }
                RunStatus::Cancelled => {
                    return Err(OrchestratorError::RunCancelled(
                        run.last_error.map(|e| e.message).unwrap_or_else(|| "Run cancelled".to_string()),
                    ))
                }
                _ => tokio::time::sleep(poll_interval).await,
            }
        }
    }
}

async fn process_run(inner: Arc<Inner>, run_id: String) {
    let prepared = {
        let mut guard = inner.state.write().await;
        let state = &mut *guard;
        let Some(run) = state.runs.get_mut(&run_id) else {
            return;
        };
        if run.status != RunStatus::Queued {
            return;
        }
        run.status = RunStatus::InProgress;

        match state.agents.get(&run.agent_id) {
            Some(agent) => {
                let history = state.messages.get(&run.thread_id).map(Vec::as_slice).unwrap_or(&[]);
                Ok((build_run_prompt(agent, history), agent.model.clone()))
            }
            None => Err(format!("Agent {} not found", run.agent_id)),
        }
    };

    let result = match prepared {
        Ok((prompt, model)) => inner
            .generator
            .generate(&prompt, &model)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e),
    };

    let mut guard = inner.state.write().await;
    let state = &mut *guard;
    let Some(run) = state.runs.get_mut(&run_id) else {
        tracing::debug!(run_id = %run_id, "Run removed while processing");
        return;
    };
    if run.status != RunStatus::InProgress {
        tracing::debug!(run_id = %run_id, status = run.status.as_str(), "Discarding result of finished run");
        return;
    }

    match result {
        Ok(text) => {
            let message = ThreadMessage {
                id: new_id("msg"),
                thread_id: run.thread_id.clone(),
                role: MessageRole::Assistant,
                content: text,
                created_at: Utc::now(),
            };
            state
                .messages
                .entry(run.thread_id.clone())
                .or_default()
                .push(message);
            run.status = RunStatus::Completed;
            run.completed_at = Some(Utc::now());
            tracing::info!(run_id = %run_id, "Run completed");
        }
        Err(message) => {
            tracing::warn!(run_id = %run_id, error = %message, "Run failed");
            run.status = RunStatus::Failed;
            run.last_error = Some(RunError {
                message,
                code: Some(RUN_ERROR_CODE.to_string()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GenerationError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const POLL: Duration = Duration::from_millis(5);

    /// Replies with a fixed text and records every prompt.
    struct CannedGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str, _model: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str, _model: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Unavailable("backend down".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Blocks until released.
    struct GatedGenerator {
        gate: Notify,
    }

    #[async_trait]
    impl TextGenerator for GatedGenerator {
        async fn generate(&self, _prompt: &str, _model: &str) -> Result<String, GenerationError> {
            self.gate.notified().await;
            Ok("late".to_string())
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_default_agent_registered() {
        let orch = Orchestrator::new(CannedGenerator::new("x"));
        let agent = orch.get_agent(DEFAULT_AGENT_ID).await.unwrap();
        assert_eq!(agent.name, "Marketing Orchestrator");
        assert_eq!(agent.model, "gpt-4o");
        assert_eq!(orch.generator_name(), "canned");
    }

    #[tokio::test]
    async fn test_ids_carry_prefixes() {
        let orch = Orchestrator::new(CannedGenerator::new("x"));
        let thread = orch.create_thread(None).await;
        assert!(thread.id.starts_with("thread_"));
        let msg = orch.create_message(&thread.id, MessageRole::User, "hola").await.unwrap();
        assert!(msg.id.starts_with("msg_"));
        let run = orch.create_run(&thread.id, DEFAULT_AGENT_ID).await.unwrap();
        assert!(run.id.starts_with("run_"));
        assert_eq!(run.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_run_completes_with_assistant_message() {
        let generator = CannedGenerator::new("Propuesta de campaña");
        let orch = Orchestrator::new(generator.clone());
        let thread = orch.create_thread(Some(serde_json::json!({ "source": "test" }))).await;
        orch.create_message(&thread.id, MessageRole::User, "Necesito un plan").await.unwrap();

        let run = orch.create_run(&thread.id, DEFAULT_AGENT_ID).await.unwrap();
        let done = orch.wait_for_run(&thread.id, &run.id, POLL).await.unwrap();
        assert_eq!(done.status, RunStatus::Completed);
        assert!(done.completed_at.is_some());

        let messages = orch.list_messages(&thread.id, SortOrder::Ascending).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "Propuesta de campaña");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Eres un asistente experto"));
        assert!(prompts[0].contains("Historial de conversación:\nuser: Necesito un plan"));
    }

    #[tokio::test]
    async fn test_list_messages_descending() {
        let orch = Orchestrator::new(CannedGenerator::new("x"));
        let thread = orch.create_thread(None).await;
        orch.create_message(&thread.id, MessageRole::User, "uno").await.unwrap();
        orch.create_message(&thread.id, MessageRole::User, "dos").await.unwrap();

        let desc = orch.list_messages(&thread.id, SortOrder::Descending).await;
        assert_eq!(desc[0].content, "dos");
        assert!(orch.list_messages("thread_missing", SortOrder::Ascending).await.is_empty());
    }

    #[tokio::test]
    async fn test_generator_error_fails_run() {
        let orch = Orchestrator::new(Arc::new(FailingGenerator));
        let thread = orch.create_thread(None).await;
        let run = orch.create_run(&thread.id, DEFAULT_AGENT_ID).await.unwrap();

        let err = orch.wait_for_run(&thread.id, &run.id, POLL).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::RunFailed(ref m) if m.contains("backend down")));

        let failed = orch.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(failed.status, RunStatus::Failed);
        assert_eq!(failed.last_error.unwrap().code.as_deref(), Some("execution_error"));
    }

    #[tokio::test]
    async fn test_unknown_agent_fails_run() {
        let orch = Orchestrator::new(CannedGenerator::new("x"));
        let thread = orch.create_thread(None).await;
        let run = orch.create_run(&thread.id, "asst_nobody").await.unwrap();
        let err = orch.wait_for_run(&thread.id, &run.id, POLL).await.unwrap_err();
        assert_eq!(err, OrchestratorError::RunFailed("Agent asst_nobody not found".to_string()));
    }

    #[tokio::test]
    async fn test_run_on_unknown_thread_rejected() {
        let orch = Orchestrator::new(CannedGenerator::new("x"));
        assert_eq!(
            orch.create_run("thread_missing", DEFAULT_AGENT_ID).await.unwrap_err(),
            OrchestratorError::ThreadNotFound("thread_missing".to_string())
        );
        assert!(orch
            .create_message("thread_missing", MessageRole::User, "x")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_get_run_scoped_to_thread() {
        let orch = Orchestrator::new(CannedGenerator::new("x"));
        let a = orch.create_thread(None).await;
        let b = orch.create_thread(None).await;
        let run = orch.create_run(&a.id, DEFAULT_AGENT_ID).await.unwrap();

        assert!(orch.get_run(&a.id, &run.id).await.is_some());
        assert!(orch.get_run(&b.id, &run.id).await.is_none());
        assert_eq!(
            orch.wait_for_run(&b.id, &run.id, POLL).await.unwrap_err(),
            OrchestratorError::RunNotFound(run.id.clone())
        );
    }

    #[tokio::test]
    async fn test_cancel_discards_late_result() {
        let generator = Arc::new(GatedGenerator { gate: Notify::new() });
        let orch = Orchestrator::new(generator.clone());
        let thread = orch.create_thread(None).await;
        let run = orch.create_run(&thread.id, DEFAULT_AGENT_ID).await.unwrap();

        let cancelled = orch.cancel_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(cancelled.status, RunStatus::Cancelled);

        generator.gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = orch.wait_for_run(&thread.id, &run.id, POLL).await.unwrap_err();
        assert_eq!(err, OrchestratorError::RunCancelled("Run cancelled".to_string()));
        assert!(orch.list_messages(&thread.id, SortOrder::Ascending).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let orch = Orchestrator::new(CannedGenerator::new("x"));
        let thread = orch.create_thread(None).await;
        let run = orch.create_run(&thread.id, DEFAULT_AGENT_ID).await.unwrap();
        orch.wait_for_run(&thread.id, &run.id, POLL).await.unwrap();

        assert!(orch.delete_thread(&thread.id).await);
        assert!(orch.get_thread(&thread.id).await.is_none());
        assert!(orch.get_run(&thread.id, &run.id).await.is_none());
        assert!(!orch.delete_thread(&thread.id).await);

        orch.register_agent(Agent {
            id: "asst_custom".to_string(),
            name: "Custom".to_string(),
            instructions: "Be brief".to_string(),
            model: "gpt-4o-mini".to_string(),
            tools: Vec::new(),
        })
        .await;
        orch.create_thread(None).await;
        orch.clear_all_threads().await;
        assert!(orch.get_agent(DEFAULT_AGENT_ID).await.is_some());
        assert!(orch.get_agent("asst_custom").await.is_some());
    }

    #[tokio::test]
    async fn test_oldest_threads_evicted_past_limit() {
        let orch = Orchestrator::with_max_threads(CannedGenerator::new("x"), 3);
        let mut ids = Vec::new();
        for _ in 0..5 {
            let thread = orch.create_thread(None).await;
            let run = orch.create_run(&thread.id, DEFAULT_AGENT_ID).await.unwrap();
            orch.wait_for_run(&thread.id, &run.id, POLL).await.unwrap();
            ids.push((thread.id, run.id));
        }

        for (thread_id, run_id) in &ids[..2] {
            assert!(orch.get_thread(thread_id).await.is_none());
            assert!(orch.get_run(thread_id, run_id).await.is_none());
            assert!(orch.list_messages(thread_id, SortOrder::Ascending).await.is_empty());
        }
        for (thread_id, _) in &ids[2..] {
            assert!(orch.get_thread(thread_id).await.is_some());
        }

        // A deleted thread frees its slot without evicting another.
        assert!(orch.delete_thread(&ids[2].0).await);
        orch.create_thread(None).await;
        assert!(orch.get_thread(&ids[3].0).await.is_some());
        assert_eq!(orch.inner.state.read().await.threads.len(), 3);
    }
}
