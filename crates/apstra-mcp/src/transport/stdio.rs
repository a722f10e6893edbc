//! Stdio Transport
//!
//! Standard MCP transport over stdin/stdout: one JSON-RPC message per line.
//! Logs must go to stderr.

use super::{McpHandler, Transport};
use crate::{JsonRpcError, McpRequest, McpResponse};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

/// Stdio transport - reads JSON-RPC from stdin, writes to stdout
pub struct StdioTransport;

impl StdioTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    async fn serve<H: McpHandler + 'static>(self, handler: Arc<H>) -> Result<()> {
        info!("Starting MCP stdio transport");

        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        serve_lines(stdin, stdout, handler.as_ref()).await?;

        info!("Stdio transport shutting down");
        Ok(())
    }
}

/// Serve line-delimited JSON-RPC until the reader hits EOF
pub async fn serve_lines<R, W, H>(mut reader: R, mut writer: W, handler: &H) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: McpHandler + ?Sized,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        // A line that is not UTF-8 gets a parse error, the session goes on
        let decoded = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Undecodable line");
                let parse_error = JsonRpcError::parse_error(format!("invalid UTF-8: {}", e));
                let response = McpResponse::error(None, parse_error);
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        let line = decoded.trim();
        if line.is_empty() {
            continue;
        }

        debug!(request = %line, "Received request");

        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) if request.is_notification() => {
                handler.handle_request(request).await;
                continue;
            }
            Ok(request) => handler.handle_request(request).await,
            Err(e) => {
                error!(error = %e, "Parse error");
                McpResponse::error(None, JsonRpcError::parse_error(e.to_string()))
            }
        };

        write_response(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &McpResponse) -> Result<()> {
    let response_json = serde_json::to_string(response)?;
    debug!(response = %response_json, "Sending response");

    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
