//! Session creation: credential check, id minting, agent binding, registration.

use std::sync::Arc;

use super::record::SessionRecord;
use super::store::SessionStore;
use crate::agent::{AgentBindingRequest, AgentFactory};
use crate::error::{ChatError, StoreError};
use crate::observability::SessionEvent;

/// Environment variable holding the model provider key.
pub const MODEL_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the search provider key.
pub const SEARCH_API_KEY_ENV: &str = "SERPAPI_API_KEY";

const PERSONA_PLACEHOLDER: &str = "{persona}";
const INITIAL_PROMPT_TEMPLATE: &str = "system: Your name is {persona}, you are playing a human character who is witty, snarky and very smart.
Directions:
  Always respond in character.
  If something is not clear, ask for clarification.
  If you are stuck, ask for help.
  Ask questions to learn more about the topic and conversation.";

/// Substitute the persona name into the seed prompt.
pub fn format_initial_prompt(persona_name: &str) -> String {
    INITIAL_PROMPT_TEMPLATE.replace(PERSONA_PLACEHOLDER, persona_name)
}

/// Provider credentials passed explicitly into session creation.
#[derive(Clone, Default)]
pub struct Credentials {
    pub model_api_key: Option<String>,
    pub search_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("model_api_key", &self.model_api_key.as_ref().map(|_| "<set>"))
            .field(
                "search_api_key",
                &self.search_api_key.as_ref().map(|_| "<set>"),
            )
            .finish()
    }
}

impl Credentials {
    pub fn new(model_api_key: impl Into<String>) -> Self {
        Self {
            model_api_key: Some(model_api_key.into()),
            search_api_key: None,
        }
    }

    #[must_use]
    pub fn with_search_api_key(mut self, key: impl Into<String>) -> Self {
        self.search_api_key = Some(key.into());
        self
    }

    /// Read `OPENAI_API_KEY` and `SERPAPI_API_KEY`; blank values count as absent.
    pub fn from_env() -> Self {
        Self {
            model_api_key: env_non_empty(MODEL_API_KEY_ENV),
            search_api_key: env_non_empty(SEARCH_API_KEY_ENV),
        }
    }

    pub fn has_model_api_key(&self) -> bool {
        non_blank(self.model_api_key.as_deref()).is_some()
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

type IdMinter = Arc<dyn Fn() -> String + Send + Sync>;

/// Builds and registers new session records.
#[derive(Clone)]
pub struct SessionFactory {
    store: SessionStore,
    agents: Arc<dyn AgentFactory>,
    persona_name: String,
    mint_id: IdMinter,
}

impl SessionFactory {
    pub fn new(
        store: SessionStore,
        agents: Arc<dyn AgentFactory>,
        persona_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            agents,
            persona_name: persona_name.into(),
            mint_id: Arc::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Replace the identifier source (random v4 UUIDs by default).
    #[must_use]
    pub fn with_id_minter(mut self, mint_id: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.mint_id = Arc::new(mint_id);
        self
    }

    pub fn persona_name(&self) -> &str {
        &self.persona_name
    }

    /// Create and register a new session.
    ///
    /// A missing model key fails with [`ChatError::MissingCredential`]. An identifier
    /// collision is retried once with a fresh id before failing with
    /// [`ChatError::SessionCreationFailed`].
    pub async fn create(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<SessionRecord>, ChatError> {
        let Some(model_api_key) = non_blank(credentials.model_api_key.as_deref()) else {
            return Err(ChatError::MissingCredential(MODEL_API_KEY_ENV.to_string()));
        };
        let initial_prompt = format_initial_prompt(&self.persona_name);
        let agent = self
            .agents
            .build(&AgentBindingRequest {
                model_api_key,
                search_api_key: non_blank(credentials.search_api_key.as_deref()),
                system_prompt: &initial_prompt,
            })
            .map_err(|error| {
                tracing::error!(
                    event = SessionEvent::SessionCreateFailed.as_str(),
                    error = %format!("{error:#}"),
                    "agent binding construction failed"
                );
                ChatError::SessionCreationFailed(format!("agent binding failed: {error:#}"))
            })?;

        let mut collided: Option<String> = None;
        for attempt in 1..=2_u8 {
            let session_id = (self.mint_id)();
            let record = Arc::new(SessionRecord::new(
                session_id.clone(),
                Arc::clone(&agent),
                initial_prompt.clone(),
            ));
            match self.store.insert(Arc::clone(&record)).await {
                Ok(()) => {
                    tracing::info!(
                        event = SessionEvent::SessionCreated.as_str(),
                        session_id = %session_id,
                        agent = agent.label(),
                        persona = %self.persona_name,
                        attempt,
                        "session created"
                    );
                    return Ok(record);
                }
                Err(StoreError::AlreadyExists(id)) => {
                    tracing::warn!(
                        event = SessionEvent::SessionCreateRetried.as_str(),
                        session_id = %id,
                        attempt,
                        "session id collision; minting a new id"
                    );
                    collided = Some(id);
                }
            }
        }
        let id = collided.unwrap_or_default();
        tracing::error!(
            event = SessionEvent::SessionCreateFailed.as_str(),
            session_id = %id,
            "session id collided twice"
        );
        Err(ChatError::SessionCreationFailed(format!(
            "session id collision persisted after retry (last id {id})"
        )))
    }
}
