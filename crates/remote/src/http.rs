//! Reqwest-backed webhook client.

use crate::error::{RemoteError, RemoteResult};
use crate::transport::Transport;
use crate::webhook::Webhook;
use async_trait::async_trait;
use bytes::Bytes;
use loft_core::config::RemoteConfig;
use loft_core::{ContainerId, FilePart, Message, MessagePayload};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use std::time::Duration;
use tracing::instrument;

/// Webhook client over HTTP.
///
/// Every call is wrapped in the rate-limited [`Transport`], so rate limits
/// and transient timeouts are retried internally and never surface.
pub struct HttpWebhook {
    http: reqwest::Client,
    transport: Transport,
    endpoint: String,
}

impl HttpWebhook {
    /// Create a client for the configured webhook endpoint.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let endpoint = format!(
            "{}/{}/{}",
            config.api_base.trim_end_matches('/'),
            config.webhook_id,
            config.token
        );
        Ok(Self {
            http,
            transport: Transport::new(),
            endpoint,
        })
    }

    /// Replace the transport, sharing its gate with other clients.
    #[must_use]
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    fn message_url(&self, id: ContainerId) -> String {
        format!("{}/messages/{}", self.endpoint, id)
    }

    /// Attach the payload and file parts to a request builder.
    ///
    /// With file parts the request is multipart (`payload_json` plus one
    /// `files[n]` part per file); without, a plain JSON body.
    fn compose(
        &self,
        builder: reqwest::RequestBuilder,
        payload: Option<&MessagePayload>,
        parts: &[FilePart],
    ) -> RemoteResult<reqwest::RequestBuilder> {
        if parts.is_empty() {
            return Ok(builder.json(&payload.cloned().unwrap_or_default()));
        }

        let mut form = Form::new();
        if let Some(payload) = payload {
            form = form.text("payload_json", serde_json::to_string(payload)?);
        }
        for (i, part) in parts.iter().enumerate() {
            let file = Part::stream_with_length(
                Body::from(part.bytes.clone()),
                part.bytes.len() as u64,
            )
            .file_name(part.filename.clone());
            form = form.part(format!("files[{i}]"), file);
        }
        Ok(builder.multipart(form))
    }

    async fn read_message(response: reqwest::Response) -> RemoteResult<Message> {
        let response = check(response).await?;
        Ok(response.json::<Message>().await?)
    }
}

/// Classify a response, consuming the body of failures.
async fn check(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RemoteError::RateLimited {
            retry_after: parse_retry_after(&body),
        });
    }
    Err(RemoteError::Status { status, body })
}

/// Parse the wait suggested by a rate-limit response body.
///
/// The remote reports `retry_after` in seconds, as a number or a decimal
/// string depending on the endpoint.
fn parse_retry_after(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let secs = match value.get("retry_after")? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.parse::<f64>().ok()?,
        _ => return None,
    };
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

#[async_trait]
impl Webhook for HttpWebhook {
    #[instrument(skip_all, fields(parts = parts.len()))]
    async fn execute(
        &self,
        payload: Option<MessagePayload>,
        parts: Vec<FilePart>,
    ) -> RemoteResult<Message> {
        let url = format!("{}?wait=true", self.endpoint);
        self.transport
            .execute(|| {
                let request = self.compose(self.http.post(&url), payload.as_ref(), &parts);
                async move { Self::read_message(request?.send().await?).await }
            })
            .await
    }

    #[instrument(skip(self))]
    async fn message(&self, id: ContainerId) -> RemoteResult<Message> {
        let url = self.message_url(id);
        self.transport
            .execute(|| {
                let request = self.http.get(&url);
                async move { Self::read_message(request.send().await?).await }
            })
            .await
    }

    #[instrument(skip_all, fields(%id, parts = parts.len()))]
    async fn edit(
        &self,
        id: ContainerId,
        payload: Option<MessagePayload>,
        parts: Vec<FilePart>,
    ) -> RemoteResult<Message> {
        let url = self.message_url(id);
        self.transport
            .execute(|| {
                let request = self.compose(self.http.patch(&url), payload.as_ref(), &parts);
                async move { Self::read_message(request?.send().await?).await }
            })
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ContainerId) -> RemoteResult<()> {
        let url = self.message_url(id);
        self.transport
            .execute(|| {
                let request = self.http.delete(&url);
                async move {
                    let response = request.send().await?;
                    // Already gone counts as deleted.
                    if response.status() == StatusCode::NOT_FOUND {
                        return Ok(());
                    }
                    check(response).await?;
                    Ok(())
                }
            })
            .await
    }

    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> RemoteResult<Bytes> {
        self.transport
            .execute(|| {
                let request = self.http.get(url);
                async move {
                    let response = check(request.send().await?).await?;
                    Ok(response.bytes().await?)
                }
            })
            .await
    }
}
