//! NVP response classification.
//!
//! Every NVP reply is a flat form. [`classify`] turns it into exactly one of
//! [`GatewayResponse`] or [`GatewayError`].

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::constants::{CMD_EXPRESS_CHECKOUT, MAINTENANCE_MESSAGE};
use crate::environment::Environment;
use crate::error::PaypalError;
use crate::form::Values;

/// Where a response came from. Needed to build the checkout redirect URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOrigin {
    pub environment: Environment,
    /// Base of the buyer-facing checkout redirect for that environment.
    pub checkout_url: String,
}

/// A successful NVP reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub ack: String,
    pub correlation_id: String,
    pub timestamp: String,
    pub version: String,
    pub build: String,
    /// Every field of the reply, including the promoted ones above.
    pub values: Values,
    pub origin: ResponseOrigin,
}

impl GatewayResponse {
    pub fn environment(&self) -> Environment {
        self.origin.environment
    }

    /// The `TOKEN` field, when present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.values.get("TOKEN").filter(|t| !t.is_empty())
    }

    /// URL the buyer is redirected to after `SetExpressCheckout`.
    ///
    /// Uses the checkout base of the environment that produced this response.
    pub fn checkout_url(&self) -> Result<Url, PaypalError> {
        let token = self.token().ok_or(PaypalError::MissingToken)?;
        let url = Url::parse_with_params(
            &self.origin.checkout_url,
            &[("cmd", CMD_EXPRESS_CHECKOUT), ("token", token)],
        )?;
        Ok(url)
    }
}

/// One entry of the gateway's indexed error list (`L_ERRORCODEn` ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub short_message: String,
    pub long_message: String,
    pub severity_code: String,
}

impl ErrorDetail {
    fn at_index(values: &Values, index: usize) -> Self {
        Self {
            code: values.get_or_empty(&format!("L_ERRORCODE{index}")).to_string(),
            short_message: values
                .get_or_empty(&format!("L_SHORTMESSAGE{index}"))
                .to_string(),
            long_message: values
                .get_or_empty(&format!("L_LONGMESSAGE{index}"))
                .to_string(),
            severity_code: values
                .get_or_empty(&format!("L_SEVERITYCODE{index}"))
                .to_string(),
        }
    }

    fn is_present(values: &Values, index: usize) -> bool {
        ["L_ERRORCODE", "L_SHORTMESSAGE", "L_LONGMESSAGE", "L_SEVERITYCODE"]
            .iter()
            .any(|prefix| values.contains_key(&format!("{prefix}{index}")))
    }
}

/// A business-level failure reported by PayPal.
///
/// Only the first indexed error (`L_*0`) is promoted. The raw reply is kept
/// in [`GatewayError::values`]; [`GatewayError::suppressed_errors`] reads the
/// rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayError {
    pub ack: String,
    pub error_code: String,
    pub short_message: String,
    pub long_message: String,
    pub severity_code: String,
    pub correlation_id: String,
    pub values: Values,
}

impl GatewayError {
    /// Human-readable summary of the failure.
    pub fn message(&self) -> String {
        if !self.error_code.is_empty() && !self.short_message.is_empty() {
            format!("PayPal Error {}: {}", self.error_code, self.short_message)
        } else if !self.ack.is_empty() {
            self.ack.clone()
        } else {
            MAINTENANCE_MESSAGE.to_string()
        }
    }

    /// Errors at index 1 and above, in index order.
    pub fn suppressed_errors(&self) -> Vec<ErrorDetail> {
        (1..)
            .take_while(|&i| ErrorDetail::is_present(&self.values, i))
            .map(|i| ErrorDetail::at_index(&self.values, i))
            .collect()
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for GatewayError {}

/// True when the reply must be treated as a failure.
pub fn is_failure(values: &Values) -> bool {
    let ack = values.get_or_empty("ACK");
    !values.get_or_empty("L_ERRORCODE0").is_empty()
        || ack.eq_ignore_ascii_case("failure")
        || ack.eq_ignore_ascii_case("failurewithwarning")
}

/// Split a parsed NVP reply into success or failure.
pub fn classify(values: Values, origin: ResponseOrigin) -> Result<GatewayResponse, GatewayError> {
    if is_failure(&values) {
        let first = ErrorDetail::at_index(&values, 0);
        return Err(GatewayError {
            ack: values.get_or_empty("ACK").to_string(),
            error_code: first.code,
            short_message: first.short_message,
            long_message: first.long_message,
            severity_code: first.severity_code,
            correlation_id: values.get_or_empty("CORRELATIONID").to_string(),
            values,
        });
    }

    Ok(GatewayResponse {
        ack: values.get_or_empty("ACK").to_string(),
        correlation_id: values.get_or_empty("CORRELATIONID").to_string(),
        timestamp: values.get_or_empty("TIMESTAMP").to_string(),
        version: values.get_or_empty("VERSION").to_string(),
        build: values.get_or_empty("BUILD").to_string(),
        values,
        origin,
    })
}
