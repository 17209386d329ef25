//! HTTP streaming transport.

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    EVENT_CHANNEL_CAPACITY, GenerationRequest, Transport, TransportEvent, TransportHandle,
    Utf8Decoder, classify_chunk,
};
use crate::config::TransportConfig;
use crate::error::{GenerationError, Result};

/// Transport posting a form-encoded request and streaming the response body.
///
/// The request carries two fields, the identity token and the input text,
/// named by [`TransportConfig::identity_field`] and
/// [`TransportConfig::content_field`].
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: Arc<TransportConfig>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.config.endpoint)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for the configured endpoint.
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| GenerationError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: reqwest::Client, config: TransportConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn start(&self, request: GenerationRequest) -> Result<TransportHandle> {
        let identity = request.require_identity()?.to_string();

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let worker = StreamWorker {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            identity,
            content: request.content,
            events: tx,
            cancel: cancel.clone(),
            id_sent: false,
        };

        let task = tokio::spawn(worker.run());
        Ok(TransportHandle::new(rx, cancel).with_task(task))
    }
}

/// Drives one request from first attempt to terminal event.
struct StreamWorker {
    client: reqwest::Client,
    config: Arc<TransportConfig>,
    identity: String,
    content: String,
    events: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
    id_sent: bool,
}

impl StreamWorker {
    async fn run(mut self) {
        let cancel = self.cancel.clone();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(endpoint = %self.config.endpoint, "Generation request cancelled");
                return;
            }
            outcome = self.stream() => outcome,
        };

        let terminal = match outcome {
            Ok(()) => TransportEvent::Finished,
            // Consumer went away; nobody left to tell.
            Err(GenerationError::Cancelled) => return,
            Err(err) => {
                warn!(
                    endpoint = %self.config.endpoint,
                    error = %err,
                    "Generation request failed"
                );
                TransportEvent::Failed(err)
            }
        };
        let _ = self.emit(terminal).await;
    }

    async fn stream(&mut self) -> Result<()> {
        let response = self.open_with_retry().await?;
        self.read_body(response).await
    }

    async fn open_with_retry(&self) -> Result<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            match self.open().await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = self.config.retry_delay_ms,
                        error = %err,
                        "Retrying generation request"
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Sends the request and waits for the response head.
    async fn open(&self) -> Result<reqwest::Response> {
        let timeout_ms = self.config.request_timeout_ms;
        let form = [
            (self.config.identity_field.as_str(), self.identity.as_str()),
            (self.config.content_field.as_str(), self.content.as_str()),
        ];

        debug!(endpoint = %self.config.endpoint, "Opening generation stream");
        let send = self.client.post(&self.config.endpoint).form(&form).send();

        let response = match tokio::time::timeout(self.config.request_timeout(), send).await {
            Err(_) => return Err(GenerationError::Timeout { timeout_ms }),
            Ok(Err(err)) => return Err(GenerationError::from_reqwest(&err, timeout_ms)),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
            ));
        }
        if status == StatusCode::NO_CONTENT {
            return Err(GenerationError::connection("response has no readable body"));
        }
        Ok(response)
    }

    async fn read_body(&mut self, response: reqwest::Response) -> Result<()> {
        let mut body = response.bytes_stream();
        let mut decoder = Utf8Decoder::new();

        while let Some(next) = body.next().await {
            let bytes: Bytes = next.map_err(|e| GenerationError::StreamRead(e.to_string()))?;
            let text = decoder.decode(&bytes);
            self.dispatch(&text).await?;
        }

        let tail = decoder.finish();
        self.dispatch(&tail).await
    }

    async fn dispatch(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        for fragment in classify_chunk(text) {
            if !self.id_sent {
                if let Some(id) = fragment.id() {
                    self.id_sent = true;
                    self.emit(TransportEvent::Id(id.to_string())).await?;
                }
            }
            if let Some(delta) = fragment.delta() {
                self.emit(TransportEvent::Chunk(delta.to_string())).await?;
            }
        }
        Ok(())
    }

    async fn emit(&self, event: TransportEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| GenerationError::Cancelled)
    }
}
