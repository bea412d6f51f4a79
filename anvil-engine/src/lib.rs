//! Anvil Build Engine Client
//!
//! HTTP client for the remote container build engine. Covers the three
//! engine interactions the deployment pipeline needs:
//! - readiness ping, with a bounded startup poll
//! - image build from an in-memory build context
//! - image push to a registry with encoded credentials
//!
//! Build and push responses are JSON-lines event streams. Engines emit
//! terminal failures as late stream events rather than HTTP errors, so both
//! operations drain their stream to the end and inspect every line before
//! declaring success.

pub mod auth;
pub mod error;
pub mod events;

pub use auth::RegistryAuth;
pub use error::{EngineError, Result};

use std::time::Duration;

use anvil_core::domain::image::ImageReference;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::events::{BuildOutcome, LineScanner, PushOutcome, StreamEvent};

/// Default ceiling for the startup readiness poll
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between readiness attempts
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(2);

/// HTTP client for the build engine API
///
/// Constructed once at startup and shared read-only for the process
/// lifetime; nothing mutates its configuration after construction.
#[derive(Debug, Clone)]
pub struct EngineClient {
    /// Base URL of the engine (e.g. "http://localhost:2375")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl EngineClient {
    /// Create a new engine client
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new engine client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the engine
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks whether the engine answers its ping endpoint
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/_ping", self.base_url);
        let response = self.client.get(&url).send().await?;
        response.error_for_status()?;
        Ok(())
    }

    /// Polls the engine until it is reachable or the deadline passes.
    ///
    /// This is a named startup precondition: it runs once at process start,
    /// never per request.
    pub async fn wait_ready(&self, timeout: Duration, interval: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.ping().await {
                Ok(()) => {
                    info!("Build engine is ready at {}", self.base_url);
                    return Ok(());
                }
                Err(e) => {
                    if Instant::now() >= deadline {
                        return Err(EngineError::NotReady(timeout));
                    }
                    warn!(
                        "Build engine not ready, retrying in {:?}: {}",
                        interval, e
                    );
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    /// Builds an image from an in-memory build context.
    ///
    /// Intermediate build containers are removed on success and on failure.
    /// The engine's log stream is forwarded to the operational log; the
    /// stream is drained to its end, and an error event anywhere in it fails
    /// the build.
    pub async fn build_image(&self, context: Vec<u8>, image: &ImageReference) -> Result<()> {
        let url = format!("{}/build", self.base_url);
        let tag = image.to_string();

        info!("Building image {}", tag);

        let response = self
            .client
            .post(&url)
            .query(&[("t", tag.as_str()), ("rm", "1"), ("forcerm", "1")])
            .header(CONTENT_TYPE, "application/x-tar")
            .body(context)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EngineError::Build(message));
        }

        let mut outcome = BuildOutcome::new();
        self.drain_stream(response, |event| {
            if let Some(line) = &event.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    info!(target: "anvil_engine::build_log", "{}", line);
                }
            }
            outcome.observe(&event);
        })
        .await?;

        outcome.into_result()
    }

    /// Pushes a tagged image to the registry.
    ///
    /// Success must be confirmed positively: the push response carries
    /// progress and error events interleaved, and a denial can arrive after
    /// lines that looked healthy. Every line is parsed until end-of-stream;
    /// an access-denied message maps to [`EngineError::AuthorizationDenied`],
    /// any other error event to [`EngineError::Publish`].
    pub async fn push_image(&self, image: &ImageReference, auth: &RegistryAuth) -> Result<()> {
        let url = format!("{}/images/{}/push", self.base_url, image.repository());

        info!("Pushing image {}", image);

        let response = self
            .client
            .post(&url)
            .query(&[("tag", image.tag_or_default())])
            .header("X-Registry-Auth", auth.encode()?)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EngineError::Publish(message));
        }

        let mut outcome = PushOutcome::new();
        self.drain_stream(response, |event| {
            if let Some(status) = &event.status {
                debug!(target: "anvil_engine::push_log", "{}", status);
            }
            outcome.observe(&event);
        })
        .await?;

        outcome.into_result()?;

        info!("Pushed image {}", image);
        Ok(())
    }

    /// Drains a JSON-lines response to its end, handing each parsed event to
    /// the callback
    async fn drain_stream<F>(&self, mut response: reqwest::Response, mut on_event: F) -> Result<()>
    where
        F: FnMut(StreamEvent),
    {
        let mut scanner = LineScanner::new();

        while let Some(chunk) = response.chunk().await? {
            for line in scanner.push(&chunk) {
                if let Some(event) = StreamEvent::parse(&line) {
                    on_event(event);
                }
            }
        }
        if let Some(line) = scanner.finish() {
            if let Some(event) = StreamEvent::parse(&line) {
                on_event(event);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = EngineClient::new("http://localhost:2375/");
        assert_eq!(client.base_url(), "http://localhost:2375");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = EngineClient::with_client("http://localhost:2375", http_client);
        assert_eq!(client.base_url(), "http://localhost:2375");
    }
}
