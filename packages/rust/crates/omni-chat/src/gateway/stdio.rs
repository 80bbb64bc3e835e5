//! Stdio gateway: greeting turn, then one turn per input line.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::ChatError;
use crate::session::SessionManager;

/// Run one session over stdin/stdout until EOF.
pub async fn run_stdio(manager: SessionManager) -> Result<()> {
    run_stdio_with(
        &manager,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
    .map(|_| ())
}

/// Stdio loop over arbitrary streams; returns the session id used.
///
/// Empty lines trigger no turn. A failed turn is reported on the output and the loop
/// continues; configuration errors (missing credential) end it.
pub async fn run_stdio_with<R, W>(manager: &SessionManager, reader: R, mut writer: W) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let greeting = manager.chat(None, None).await?;
    let session_id = greeting.session_id;
    writer
        .write_all(format!("{}\n", greeting.reply).as_bytes())
        .await?;
    writer.flush().await?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let out = match manager.chat(Some(&session_id), Some(line)).await {
            Ok(reply) => reply.reply,
            Err(error @ ChatError::AgentInvocationFailed { .. }) => {
                tracing::warn!(session_id = %session_id, error = %error, "stdio turn failed");
                format!("[error] {error}")
            }
            Err(error) => return Err(error.into()),
        };
        writer.write_all(format!("{out}\n").as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(session_id)
}
