//! Stdio server - newline-delimited JSON-RPC over a byte stream
//!
//! Provides:
//! - Line reader that parses requests and filters notifications
//! - One task per request so slow calls never block others
//! - A single writer task that serializes responses

use std::future::Future;
use std::sync::Arc;

use log::{debug, error, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::messages::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::error::{Result, ViewerError};

/// Channel capacity for queued responses
const RESPONSE_CHANNEL_CAPACITY: usize = 64;

/// Handler trait for processing requests
pub trait RequestHandler: Send + Sync {
    /// Handle a request and return a response
    fn handle(&self, request: JsonRpcRequest) -> impl Future<Output = JsonRpcResponse> + Send;

    /// Observe a notification. No response is sent.
    fn notify(&self, request: &JsonRpcRequest) {
        debug!("Ignoring notification: {}", request.method);
    }
}

/// Serve requests from `reader`, writing responses to `writer`.
///
/// Returns after EOF once every in-flight request has been answered.
pub async fn serve<R, W, H>(reader: R, writer: W, handler: Arc<H>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    H: RequestHandler + 'static,
{
    let (tx, rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_CHANNEL_CAPACITY);
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut in_flight = JoinSet::new();
    let mut read_error = None;

    loop {
        line.clear();
        let read = match reader.read_until(b'\n', &mut line).await {
            Ok(read) => read,
            Err(e) => {
                error!("Failed to read input: {}", e);
                read_error = Some(e);
                break;
            }
        };
        if read == 0 {
            debug!("EOF on input, waiting for {} in-flight requests", in_flight.len());
            break;
        }

        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let request = match parse_request(trimmed) {
            Ok(request) => request,
            Err(response) => {
                warn!("Rejected malformed message: {}", String::from_utf8_lossy(trimmed));
                if tx.send(*response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        if request.is_notification() {
            handler.notify(&request);
            continue;
        }

        let handler = Arc::clone(&handler);
        let tx = tx.clone();
        in_flight.spawn(async move {
            let response = handler.handle(request).await;
            let _ = tx.send(response).await;
        });

        // Reap finished tasks so the set does not grow unbounded
        while in_flight.try_join_next().is_some() {}
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
    }

    drop(tx);
    writer_task
        .await
        .map_err(|e| ViewerError::Protocol(format!("Writer task failed: {}", e)))??;

    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Parse a line into a request, or the error response to send instead
fn parse_request(line: &[u8]) -> std::result::Result<JsonRpcRequest, Box<JsonRpcResponse>> {
    let value: Value = serde_json::from_slice(line).map_err(|e| {
        Box::new(JsonRpcResponse::error(
            None,
            JsonRpcError::parse_error(format!("Parse error: {}", e)),
        ))
    })?;

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    serde_json::from_value::<JsonRpcRequest>(value).map_err(|e| {
        Box::new(JsonRpcResponse::error(
            id,
            JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
        ))
    })
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::Receiver<JsonRpcResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
