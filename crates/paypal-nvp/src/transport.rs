//! The HTTP seam shared by the NVP client and the IPN verifier.
//!
//! Both flows only ever POST a form and read back a status and a body, so
//! that is all [`HttpTransport`] asks for. The body arrives already encoded:
//! the NVP client encodes its [`Values`](crate::form::Values), the IPN
//! verifier forwards the delivery's bytes untouched. `reqwest::Client`
//! implements it; tests plug in recording doubles.

use bytes::Bytes;
use thiserror::Error;

/// Failures below the PayPal protocol level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),
}

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Sends a form-encoded POST.
///
/// Timeouts, proxies and TLS are the implementor's concern; nothing here
/// retries.
pub trait HttpTransport: Send + Sync {
    /// POST `body` to `url` as `application/x-www-form-urlencoded`.
    ///
    /// `body` must be sent byte for byte.
    fn post_form(
        &self,
        url: &str,
        body: Bytes,
    ) -> impl std::future::Future<Output = Result<TransportResponse, TransportError>> + Send;
}

impl HttpTransport for reqwest::Client {
    async fn post_form(
        &self,
        url: &str,
        body: Bytes,
    ) -> Result<TransportResponse, TransportError> {
        let resp = self
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

impl<T: HttpTransport> HttpTransport for &T {
    fn post_form(
        &self,
        url: &str,
        body: Bytes,
    ) -> impl std::future::Future<Output = Result<TransportResponse, TransportError>> + Send {
        (**self).post_form(url, body)
    }
}

impl<T: HttpTransport> HttpTransport for std::sync::Arc<T> {
    fn post_form(
        &self,
        url: &str,
        body: Bytes,
    ) -> impl std::future::Future<Output = Result<TransportResponse, TransportError>> + Send {
        (**self).post_form(url, body)
    }
}
