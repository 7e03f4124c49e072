//! Best-effort webhook delivery of sync events
//!
//! One HTTP request per event, no retry, no persistence. Failures are logged
//! and the dispatcher moves on to the next event.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE as CONTENT_TYPE_HEADER;
use reqwest::{Client, Method, StatusCode, Url};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, warn};

use crate::{Error, Event, EventReceiver, PayloadTemplate, Result};

/// Content type sent with every payload, whatever the template produces.
pub const CONTENT_TYPE: &str = "application/json";

/// Per-request timeout of the webhook client.
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_WEBHOOK_METHOD: &str = "POST";

/// Where and how events are delivered.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    url: Url,
    method: Method,
    template: PayloadTemplate,
    timeout: Duration,
}

impl WebhookConfig {
    /// Validate `url` and `method`. The method is case-insensitive.
    pub fn new(url: &str, method: &str, template: PayloadTemplate) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::InvalidWebhook(format!("URL {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidWebhook(format!(
                "URL {url:?}: unsupported scheme {:?}",
                parsed.scheme()
            )));
        }

        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidWebhook(format!("method {method:?}")))?;

        Ok(Self {
            url: parsed,
            method,
            template,
            timeout: DEFAULT_WEBHOOK_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &PayloadTemplate {
        &self.template
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Drains the event queue and turns each event into one HTTP request.
#[derive(Debug)]
pub struct WebhookDispatcher {
    config: WebhookConfig,
    client: Client,
    span: Span,
}

impl WebhookDispatcher {
    /// Build the HTTP client and check the payload template.
    ///
    /// A template that does not parse is reported but accepted; every
    /// delivery will then fail with [`Error::Template`].
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidWebhook(format!("HTTP client: {e}")))?;

        let span = tracing::info_span!("webhook", url = %config.url, method = %config.method);
        if let Err(e) = config.template.check() {
            span.in_scope(|| {
                warn!(error = %e, "Webhook payload template is invalid; deliveries will fail")
            });
        }

        Ok(Self {
            config,
            client,
            span,
        })
    }

    /// Run inside `span` instead of the default `webhook` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Send one event. Returns the sink's status on a 2xx answer.
    pub async fn deliver(&self, event: &Event) -> Result<StatusCode> {
        let body = self.config.template.render(event)?;
        let url = self.config.url.to_string();

        debug!(bytes = body.len(), "Sending webhook payload");
        let response = self
            .client
            .request(self.config.method.clone(), self.config.url.clone())
            .header(CONTENT_TYPE_HEADER, CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|source| Error::Webhook {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(Error::WebhookStatus { url, status })
        }
    }

    /// Deliver events until the queue closes or `shutdown` fires.
    ///
    /// Delivery errors are logged and never end the loop. An in-flight
    /// request is abandoned on shutdown.
    pub async fn run(self, mut events: EventReceiver, shutdown: CancellationToken) {
        let span = self.span.clone();
        async move {
            info!("Webhook dispatcher started");
            loop {
                let event = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    next = events.recv() => match next {
                        Some(event) => event,
                        None => break,
                    },
                };

                let action = event.action();
                info!(%action, "Event received");
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    outcome = self.deliver(&event) => match outcome {
                        Ok(status) => info!(%action, %status, "Webhook delivered"),
                        Err(e) => error!(%action, error = %e, "Webhook delivery failed"),
                    },
                }
            }
            info!("Webhook dispatcher stopped");
        }
        .instrument(span)
        .await
    }
}
