#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use omni_chat::{
    AgentBindingRequest, AgentError, AgentFactory, AgentReply, ChatMessage, ConversationState,
    ConversationalAgent, CreateOutcome, Credentials, HistoryStore, MemoryHistoryStore,
    PersistedSession, RecordKey, SessionManager, SessionManagerConfig,
};

/// Replies `echo: {input}`; appends the user input and the reply to the conversation.
pub struct EchoAgent {
    delay: Option<Duration>,
    fail_on: Option<(String, AgentError)>,
    calls: AtomicUsize,
}

impl EchoAgent {
    pub fn new() -> Self {
        Self {
            delay: None,
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Fail with `error` whenever the input equals `input`.
    pub fn failing_on(input: &str, error: AgentError) -> Self {
        Self {
            fail_on: Some((input.to_string(), error)),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationalAgent for EchoAgent {
    fn label(&self) -> &str {
        "echo"
    }

    async fn respond(
        &self,
        mut state: ConversationState,
        input: &str,
    ) -> Result<AgentReply, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((trigger, error)) = &self.fail_on
            && trigger == input
        {
            return Err(error.clone());
        }
        let reply = format!("echo: {input}");
        state.push(ChatMessage::user(input));
        state.push(ChatMessage::assistant(reply.clone()));
        Ok(AgentReply { reply, state })
    }
}

/// Always fails with the configured error.
pub struct FailingAgent(pub AgentError);

#[async_trait]
impl ConversationalAgent for FailingAgent {
    fn label(&self) -> &str {
        "failing"
    }

    async fn respond(
        &self,
        _state: ConversationState,
        _input: &str,
    ) -> Result<AgentReply, AgentError> {
        Err(self.0.clone())
    }
}

/// Hands out one shared agent and records every binding request.
pub struct StubFactory {
    agent: Arc<dyn ConversationalAgent>,
    builds: AtomicUsize,
    system_prompts: Mutex<Vec<String>>,
    search_keys: Mutex<Vec<Option<String>>>,
}

impl StubFactory {
    pub fn new(agent: Arc<dyn ConversationalAgent>) -> Self {
        Self {
            agent,
            builds: AtomicUsize::new(0),
            system_prompts: Mutex::new(Vec::new()),
            search_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.system_prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    pub fn search_keys(&self) -> Vec<Option<String>> {
        self.search_keys
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }
}

impl AgentFactory for StubFactory {
    fn build(
        &self,
        request: &AgentBindingRequest<'_>,
    ) -> anyhow::Result<Arc<dyn ConversationalAgent>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.system_prompts.lock() {
            prompts.push(request.system_prompt.to_string());
        }
        if let Ok(mut keys) = self.search_keys.lock() {
            keys.push(request.search_api_key.map(ToString::to_string));
        }
        Ok(Arc::clone(&self.agent))
    }
}

/// Binding construction always fails.
pub struct BrokenFactory;

impl AgentFactory for BrokenFactory {
    fn build(
        &self,
        _request: &AgentBindingRequest<'_>,
    ) -> anyhow::Result<Arc<dyn ConversationalAgent>> {
        anyhow::bail!("model client could not be built")
    }
}

/// Every operation errors, as an unreachable backend would.
pub struct UnreachableHistoryStore;

#[async_trait]
impl HistoryStore for UnreachableHistoryStore {
    fn backend_name(&self) -> &'static str {
        "unreachable"
    }

    async fn create(&self, _session_id: &str, _history_json: &str) -> anyhow::Result<CreateOutcome> {
        anyhow::bail!("connection refused")
    }

    async fn find(&self, _session_id: &str) -> anyhow::Result<Option<RecordKey>> {
        anyhow::bail!("connection refused")
    }

    async fn update(&self, _key: &RecordKey, _history_json: &str) -> anyhow::Result<bool> {
        anyhow::bail!("connection refused")
    }

    async fn get(&self, _session_id: &str) -> anyhow::Result<Option<PersistedSession>> {
        anyhow::bail!("connection refused")
    }
}

pub fn test_credentials() -> Credentials {
    Credentials::new("sk-test")
}

pub fn manager_with_agent(agent: Arc<dyn ConversationalAgent>) -> SessionManager {
    SessionManager::new(
        Arc::new(StubFactory::new(agent)),
        test_credentials(),
        None,
        SessionManagerConfig::default(),
    )
}

/// Manager backed by an in-memory history store the test can inspect.
pub fn manager_with_memory_store(
    agent: Arc<dyn ConversationalAgent>,
) -> (SessionManager, Arc<MemoryHistoryStore>) {
    let records = Arc::new(MemoryHistoryStore::new());
    let manager = SessionManager::new(
        Arc::new(StubFactory::new(agent)),
        test_credentials(),
        Some(Arc::clone(&records) as Arc<dyn HistoryStore>),
        SessionManagerConfig::default(),
    );
    (manager, records)
}

pub async fn wait_for_persistence(manager: &SessionManager) {
    assert!(
        manager
            .orchestrator()
            .bridge()
            .drain(Duration::from_secs(5))
            .await,
        "persistence writes did not finish"
    );
}
