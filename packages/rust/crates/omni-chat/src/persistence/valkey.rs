//! Valkey-backed history records: one hash per session with `sessionId` and `history`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::FromRedisValue;
use tokio::sync::Mutex;

use super::{CreateOutcome, HistoryStore, PersistedSession, RecordKey};
use crate::observability::SessionEvent;

pub const DEFAULT_VALKEY_KEY_PREFIX: &str = "omni-chat";

const CREATE_SCRIPT: &str = r#"
if redis.call("HSETNX", KEYS[1], "sessionId", ARGV[1]) == 0 then
  return 0
end
redis.call("HSET", KEYS[1], "history", ARGV[2])
return 1
"#;

const UPDATE_SCRIPT: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 0 then
  return 0
end
redis.call("HSET", KEYS[1], "history", ARGV[1])
return 1
"#;

#[derive(Debug)]
pub struct ValkeyHistoryStore {
    client: redis::Client,
    key_prefix: String,
    connection: Arc<Mutex<Option<redis::aio::MultiplexedConnection>>>,
}

impl ValkeyHistoryStore {
    pub fn new(url: &str, key_prefix: Option<String>) -> Result<Self> {
        let client = redis::Client::open(url)
            .with_context(|| format!("invalid valkey url for history store: {url}"))?;
        let key_prefix = key_prefix
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_VALKEY_KEY_PREFIX.to_string());
        Ok(Self {
            client,
            key_prefix,
            connection: Arc::new(Mutex::new(None)),
        })
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn record_key(&self, session_id: &str) -> String {
        format!("{}:chat:{}", self.key_prefix, session_id)
    }

    async fn ensure_connection(
        &self,
        connection: &mut Option<redis::aio::MultiplexedConnection>,
    ) -> Result<()> {
        if connection.is_some() {
            return Ok(());
        }
        *connection = Some(
            self.client
                .get_multiplexed_async_connection()
                .await
                .context("failed to open valkey connection for history store")?,
        );
        tracing::debug!(
            event = SessionEvent::PersistenceValkeyConnected.as_str(),
            key_prefix = %self.key_prefix,
            "valkey history store connected"
        );
        Ok(())
    }

    /// Run one command, reconnecting and retrying once on failure.
    async fn run_command<T, F>(&self, operation: &'static str, build: F) -> Result<T>
    where
        T: FromRedisValue + Send,
        F: Fn() -> redis::Cmd,
    {
        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..2 {
            let mut conn_guard = self.connection.lock().await;
            self.ensure_connection(&mut conn_guard).await?;
            let conn = conn_guard
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("valkey history store connection unavailable"))?;
            let result: redis::RedisResult<T> = build().query_async(conn).await;
            match result {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(
                            event = SessionEvent::PersistenceValkeyCommandRetrySucceeded.as_str(),
                            operation,
                            attempt = attempt + 1,
                            "valkey command succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    tracing::warn!(
                        event = SessionEvent::PersistenceValkeyCommandRetryFailed.as_str(),
                        operation,
                        attempt = attempt + 1,
                        error = %err,
                        "valkey command attempt failed; reconnecting"
                    );
                    *conn_guard = None;
                    last_err =
                        Some(anyhow::anyhow!(err).context("valkey command failed for history store"));
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("valkey command failed for unknown reason")))
    }
}

#[async_trait]
impl HistoryStore for ValkeyHistoryStore {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn create(&self, session_id: &str, history_json: &str) -> Result<CreateOutcome> {
        let key = self.record_key(session_id);
        let created = self
            .run_command::<i64, _>("create_record", || {
                let mut cmd = redis::cmd("EVAL");
                cmd.arg(CREATE_SCRIPT)
                    .arg(1)
                    .arg(&key)
                    .arg(session_id)
                    .arg(history_json);
                cmd
            })
            .await?;
        Ok(if created == 1 {
            CreateOutcome::Created
        } else {
            CreateOutcome::AlreadyExists
        })
    }

    async fn find(&self, session_id: &str) -> Result<Option<RecordKey>> {
        let key = self.record_key(session_id);
        let exists = self
            .run_command::<i64, _>("find_record", || {
                let mut cmd = redis::cmd("EXISTS");
                cmd.arg(&key);
                cmd
            })
            .await?;
        Ok((exists > 0).then(|| RecordKey(key)))
    }

    async fn update(&self, key: &RecordKey, history_json: &str) -> Result<bool> {
        let updated = self
            .run_command::<i64, _>("update_record", || {
                let mut cmd = redis::cmd("EVAL");
                cmd.arg(UPDATE_SCRIPT).arg(1).arg(&key.0).arg(history_json);
                cmd
            })
            .await?;
        Ok(updated == 1)
    }

    async fn get(&self, session_id: &str) -> Result<Option<PersistedSession>> {
        let key = self.record_key(session_id);
        let fields = self
            .run_command::<HashMap<String, String>, _>("get_record", || {
                let mut cmd = redis::cmd("HGETALL");
                cmd.arg(&key);
                cmd
            })
            .await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(PersistedSession {
            session_id: fields
                .get("sessionId")
                .cloned()
                .unwrap_or_else(|| session_id.to_string()),
            history: fields.get("history").cloned().unwrap_or_default(),
        }))
    }
}
