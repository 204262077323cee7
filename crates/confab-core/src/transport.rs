//! Thin HTTP wrapper over the chat service.
//!
//! Resolves with parsed JSON on 2xx, fails with `TransportError` otherwise.
//! No retries: a failure is handed back to the caller as-is. Timeouts are
//! left to the underlying `reqwest` client.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::TransportError;

/// Standard User-Agent header for confab requests.
pub const USER_AGENT: &str = concat!("confab/", env!("CARGO_PKG_VERSION"));

/// A fixed endpoint template with its dynamic segments filled in.
///
/// Segments are percent-encoded individually when the URL is built, so ids
/// containing `/` or spaces stay inside their segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    #[must_use]
    pub fn join(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
}

impl Transport {
    /// Creates a transport rooted at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Base URL cannot have paths appended: {base_url}");
        }

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    /// Issues `GET` and decodes the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, TransportError> {
        let path = endpoint.to_string();
        debug!(method = "GET", %path, "request");
        let request = self.http.get(self.url_for(endpoint));
        let response = self.send(&path, request).await?;
        Self::read_json(&path, response).await
    }

    /// Issues `POST` with a JSON body and decodes the JSON reply.
    pub async fn post_json<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = endpoint.to_string();
        debug!(method = "POST", %path, "request");
        let request = self.http.post(self.url_for(endpoint)).json(body);
        let response = self.send(&path, request).await?;
        Self::read_json(&path, response).await
    }

    /// Issues a multipart `POST` and decodes the JSON reply.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        form: Form,
    ) -> Result<T, TransportError> {
        let path = endpoint.to_string();
        debug!(method = "POST", %path, multipart = true, "request");
        let request = self.http.post(self.url_for(endpoint)).multipart(form);
        let response = self.send(&path, request).await?;
        Self::read_json(&path, response).await
    }

    /// Issues `DELETE`; the response body is ignored.
    pub async fn delete(&self, endpoint: &Endpoint) -> Result<(), TransportError> {
        let path = endpoint.to_string();
        debug!(method = "DELETE", %path, "request");
        let request = self.http.delete(self.url_for(endpoint));
        self.send(&path, request).await.map(|_| ())
    }

    fn url_for(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(&endpoint.segments);
        }
        url
    }

    /// Sends the request and maps non-2xx statuses to errors.
    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        let response = request.send().await.map_err(|err| {
            warn!(%path, error = %err, "request failed");
            TransportError::network(path, network_message(&err))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = TransportError::http_status(path, status.as_u16(), &body);
        warn!(%path, status = status.as_u16(), "request returned error status");
        Err(err)
    }

    async fn read_json<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TransportError::network(path, network_message(&err)))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| TransportError::decode(path, format!("Invalid response body: {err}")))
    }
}

fn network_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        "Could not connect to server".to_string()
    } else {
        format!("Request failed: {err}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let endpoint = Endpoint::new("history").join("abc");
        assert_eq!(endpoint.to_string(), "/history/abc");
    }

    #[test]
    fn test_url_for_keeps_base_path() {
        let transport = Transport::new("http://localhost:8000/api/", None).unwrap();
        let url = transport.url_for(&Endpoint::new("sessions"));
        assert_eq!(url.as_str(), "http://localhost:8000/api/sessions");
    }

    #[test]
    fn test_url_for_encodes_segments() {
        let transport = Transport::new("http://localhost:8000", None).unwrap();
        let url = transport.url_for(&Endpoint::new("delete").join("a/b c"));
        assert_eq!(url.as_str(), "http://localhost:8000/delete/a%2Fb%20c");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(Transport::new("not a url", None).is_err());
        assert!(Transport::new("mailto:someone@example.com", None).is_err());
    }
}
