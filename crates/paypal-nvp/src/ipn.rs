//! Instant Payment Notification verification.
//!
//! PayPal POSTs notifications to a merchant-owned endpoint. Nothing in such a
//! delivery may be trusted until the same fields are echoed back to PayPal
//! with `cmd=_notify-validate` and PayPal answers with exactly `VERIFIED`.
//! [`IpnMessage`] can only be obtained through that round trip.
//!
//! Cross-checking amounts, currency or receiver against the merchant's own
//! records remains the caller's job.

use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::constants::{CMD_NOTIFY_VALIDATE, IPN_VERIFIED};
use crate::environment::{Endpoints, Environment};
use crate::error::PaypalError;
use crate::form::{FormError, Values};
use crate::transport::HttpTransport;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The raw parts of a notification as received by the merchant's webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundNotification {
    body: Bytes,
    query: Option<String>,
    content_type: Option<String>,
}

impl InboundNotification {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            query: None,
            content_type: None,
        }
    }

    /// Query string of the delivery URL, without the leading `?`.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// `Content-Type` header of the delivery. When absent the body is assumed
    /// to be form-encoded.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Validate the delivery and decode its fields: body fields first, then
    /// any query-string fields.
    fn parse(&self) -> Result<Values, FormError> {
        if let Some(content_type) = &self.content_type {
            let mime = content_type.split(';').next().unwrap_or_default().trim();
            if !mime.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
                return Err(FormError::UnsupportedContentType(content_type.clone()));
            }
        }

        let mut fields = Values::parse_bytes(&self.body)?;
        if let Some(query) = &self.query {
            fields.extend(&Values::parse(query)?);
        }
        Ok(fields)
    }
}

/// A notification PayPal has confirmed as genuine.
///
/// Only [`IpnVerifier::verify`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpnMessage {
    txn_id: Option<String>,
    payment_status: Option<String>,
    values: Values,
    #[serde(skip)]
    raw_body: Bytes,
}

impl IpnMessage {
    fn from_verified(values: Values, raw_body: Bytes) -> Self {
        Self {
            txn_id: values.get("txn_id").map(str::to_string),
            payment_status: values.get("payment_status").map(str::to_string),
            values,
            raw_body,
        }
    }

    /// First `txn_id` value. Some notification types (e.g. profile events)
    /// carry none.
    pub fn txn_id(&self) -> Option<&str> {
        self.txn_id.as_deref()
    }

    /// First `payment_status` value, e.g. `Completed`, `Pending`, `Refunded`.
    pub fn payment_status(&self) -> Option<&str> {
        self.payment_status.as_deref()
    }

    /// Every verified field, decoded for reading.
    ///
    /// Bytes that are not UTF-8 (the `charset` field names the real
    /// encoding) show up as U+FFFD; [`IpnMessage::raw_body`] keeps them.
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// The delivery body exactly as PayPal sent and confirmed it.
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    pub fn into_values(self) -> Values {
        self.values
    }
}

/// Verifies notifications against one PayPal validation endpoint.
#[derive(Debug, Clone)]
pub struct IpnVerifier<T = reqwest::Client> {
    transport: T,
    endpoint: String,
}

impl IpnVerifier<reqwest::Client> {
    /// Verifier backed by a fresh `reqwest::Client`.
    pub fn new_default(environment: Environment) -> Self {
        Self::new(reqwest::Client::new(), environment)
    }
}

impl<T: HttpTransport> IpnVerifier<T> {
    pub fn new(transport: T, environment: Environment) -> Self {
        Self::with_endpoint(transport, Endpoints::for_environment(environment).webscr_url)
    }

    /// Validate against a custom endpoint, e.g. a local test double.
    pub fn with_endpoint(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Echo `inbound` to PayPal and return the message only if PayPal
    /// answers `VERIFIED`.
    ///
    /// The body is validated, then forwarded byte for byte.
    ///
    /// Fails with [`PaypalError::MalformedForm`] on an unparsable delivery,
    /// [`PaypalError::Transport`] when PayPal cannot be reached,
    /// [`PaypalError::InvalidStatus`] on a non-2xx reply and
    /// [`PaypalError::InvalidIpn`] on any reply body other than `VERIFIED`.
    pub async fn verify(&self, inbound: &InboundNotification) -> Result<IpnMessage, PaypalError> {
        let fields = inbound.parse()?;

        let url = Url::parse_with_params(&self.endpoint, &[("cmd", CMD_NOTIFY_VALIDATE)])?;

        tracing::debug!(
            endpoint = %self.endpoint,
            txn_id = fields.get_or_empty("txn_id"),
            "echoing IPN for validation"
        );

        let resp = self
            .transport
            .post_form(url.as_str(), inbound.body.clone())
            .await?;

        if !resp.is_success() {
            tracing::warn!(status = resp.status, "IPN validation endpoint returned non-2xx status");
            return Err(PaypalError::InvalidStatus(resp.status));
        }

        // Exact byte comparison: no trimming, no case folding.
        if resp.body.as_ref() != IPN_VERIFIED.as_bytes() {
            tracing::warn!(
                txn_id = fields.get_or_empty("txn_id"),
                reply = %String::from_utf8_lossy(&resp.body),
                "IPN rejected by PayPal"
            );
            return Err(PaypalError::InvalidIpn);
        }

        let message = IpnMessage::from_verified(fields, inbound.body.clone());
        tracing::info!(
            txn_id = message.txn_id().unwrap_or_default(),
            payment_status = message.payment_status().unwrap_or_default(),
            "IPN verified"
        );
        Ok(message)
    }
}

/// Verify one notification against the sandbox or production endpoint.
pub async fn verify_notification<T: HttpTransport>(
    transport: &T,
    inbound: &InboundNotification,
    sandbox: bool,
) -> Result<IpnMessage, PaypalError> {
    IpnVerifier::new(transport, Environment::from_sandbox_flag(sandbox))
        .verify(inbound)
        .await
}
