//! Chat endpoint client struct and builder.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use questro_stream::{AssemblerConfig, DEFAULT_IDLE_TIMEOUT, assemble, stream_handle};
use questro_types::{
    AssemblyOutcome, ChatBackend, ChatError, ChatRequest, StreamFailure, StreamHandle,
};
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::error::{map_http_status, map_reqwest_error};

/// Default wait for response headers.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the chat endpoint URL.
pub const ENDPOINT_ENV: &str = "QUESTRO_ENDPOINT";

/// Environment variable holding the bearer credential.
pub const API_KEY_ENV: &str = "QUESTRO_API_KEY";

/// Settings for building a [`ChatClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Full URL of the chat function.
    pub endpoint: String,
    /// Bearer credential sent with every request.
    pub credential: String,
    /// Wait for response headers before giving up.
    pub request_timeout: Duration,
    /// Wait between two body chunks. `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            credential: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

/// Client for the streaming chat endpoint.
///
/// Implements [`ChatBackend`] for use by a chat session.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use questro_client::ChatClient;
///
/// let client = ChatClient::new("https://example.supabase.co/functions/v1/chat", "anon-key")
///     .timeout(Duration::from_secs(20));
/// ```
pub struct ChatClient {
    pub(crate) endpoint: String,
    pub(crate) credential: String,
    pub(crate) request_timeout: Duration,
    pub(crate) idle_timeout: Option<Duration>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl ChatClient {
    /// Create a client for `endpoint`, authenticating with `credential`.
    ///
    /// Default request timeout: 60 s. Default idle timeout: 30 s.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: credential.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from a [`ClientConfig`].
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.endpoint.clone(), config.credential.clone())
            .timeout(config.request_timeout)
            .idle_timeout(config.idle_timeout)
    }

    /// Build a client from `QUESTRO_ENDPOINT` and `QUESTRO_API_KEY`.
    pub fn from_env() -> Result<Self, ChatError> {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .map_err(|_| ChatError::Config(format!("{ENDPOINT_ENV} is not set")))?;
        let credential = std::env::var(API_KEY_ENV)
            .map_err(|_| ChatError::Config(format!("{API_KEY_ENV} is not set")))?;
        Ok(Self::new(endpoint, credential))
    }

    /// Override the wait for response headers.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the wait between two body chunks.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Use a preconfigured [`reqwest::Client`] (proxies, custom TLS roots).
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Assembler settings for one exchange.
    pub fn assembler_config(&self, cancel: CancellationToken) -> AssemblerConfig {
        AssemblerConfig::default()
            .idle_timeout(self.idle_timeout)
            .cancellation(cancel)
    }

    /// POST the request and classify the response status.
    ///
    /// The request timeout bounds the wait for headers and, on a rejected
    /// request, the read of the error body.
    ///
    /// Returns the response with its body unread on 2xx. Rate limiting (429)
    /// and quota exhaustion (402) map to their own [`ChatError`] variants.
    pub async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, ChatError> {
        if self.endpoint.is_empty() {
            return Err(ChatError::Config("chat endpoint is not set".into()));
        }

        tracing::debug!(
            url = %self.endpoint,
            messages = request.messages.len(),
            attachment = request.file_base64.is_some(),
            "sending chat request"
        );

        let pending = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.credential)
            .json(request)
            .send();

        let response = tokio::time::timeout(self.request_timeout, pending)
            .await
            .map_err(|_| ChatError::Timeout(self.request_timeout))?
            .map_err(|e| map_reqwest_error(e, self.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = tokio::time::timeout(self.request_timeout, response.text())
                .await
                .map_err(|_| ChatError::Timeout(self.request_timeout))?
                .map_err(|e| map_reqwest_error(e, self.request_timeout))?;
            tracing::debug!(status = status.as_u16(), "chat endpoint rejected request");
            return Err(map_http_status(status, &body));
        }

        Ok(response)
    }

    /// Send the request and assemble the streamed reply.
    ///
    /// `on_delta` receives the cumulative text after every delta. Returns the
    /// final text.
    pub async fn stream<F>(
        &self,
        request: &ChatRequest,
        config: &AssemblerConfig,
        on_delta: F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(&str),
    {
        let response = self.send(request).await?;
        let outcome = assemble(response.bytes_stream(), config, on_delta).await?;
        Ok(outcome.text)
    }

    /// Send the request and return the reply as a stream of events.
    ///
    /// Status errors are returned here; body failures arrive as a final
    /// `StreamEvent::Error`.
    pub async fn events(
        &self,
        request: &ChatRequest,
        config: AssemblerConfig,
    ) -> Result<StreamHandle, ChatError> {
        let response = self.send(request).await?;
        Ok(stream_handle(response.bytes_stream(), config))
    }
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl ChatBackend for ChatClient {
    fn stream_chat<'a>(
        &'a self,
        request: &'a ChatRequest,
        cancel: CancellationToken,
        on_delta: &'a mut (dyn FnMut(&str) + Send),
    ) -> impl Future<Output = Result<AssemblyOutcome, ChatError>> + Send + 'a {
        async move {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamFailure::Cancelled.into()),
                response = self.send(request) => response?,
            };
            let config = self.assembler_config(cancel);
            let outcome = assemble(response.bytes_stream(), &config, on_delta).await?;
            Ok(outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_set() {
        let client = ChatClient::new("http://localhost/chat", "key");
        assert_eq!(client.endpoint, "http://localhost/chat");
        assert_eq!(client.credential, "key");
        assert_eq!(client.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(client.idle_timeout, Some(DEFAULT_IDLE_TIMEOUT));
    }

    #[test]
    fn builder_overrides_timeouts() {
        let client = ChatClient::new("http://x", "k")
            .timeout(Duration::from_secs(5))
            .idle_timeout(None);
        assert_eq!(client.request_timeout, Duration::from_secs(5));
        assert_eq!(client.idle_timeout, None);
    }

    #[test]
    fn from_config_copies_fields() {
        let config = ClientConfig {
            endpoint: "http://h/chat".into(),
            credential: "c".into(),
            request_timeout: Duration::from_secs(9),
            idle_timeout: Some(Duration::from_secs(3)),
        };
        let client = ChatClient::from_config(&config);
        assert_eq!(client.endpoint(), "http://h/chat");
        assert_eq!(client.request_timeout, Duration::from_secs(9));
        assert_eq!(client.idle_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn assembler_config_uses_client_idle_timeout() {
        let client = ChatClient::new("http://x", "k").idle_timeout(Some(Duration::from_secs(7)));
        let token = CancellationToken::new();
        let config = client.assembler_config(token.clone());
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(7)));
        assert!(!config.require_sentinel);
        token.cancel();
        assert!(config.cancellation.is_cancelled());
    }

    #[test]
    fn debug_redacts_credential() {
        let client = ChatClient::new("http://x", "super-secret");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));

        let config = ClientConfig {
            credential: "super-secret".into(),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[tokio::test]
    async fn empty_endpoint_is_a_config_error() {
        let client = ChatClient::new("", "k");
        let err = client.send(&ChatRequest::default()).await.unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }
}
