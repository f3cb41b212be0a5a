use thiserror::Error;

use crate::form::FormError;
use crate::response::GatewayError;
use crate::transport::TransportError;

/// Errors returned by NVP calls and IPN verification.
#[derive(Debug, Error)]
pub enum PaypalError {
    /// The HTTP round trip failed or the body could not be read or decoded.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// PayPal answered and reported a business-level failure.
    #[error(transparent)]
    Gateway(#[from] Box<GatewayError>),

    /// The IPN validation endpoint returned a non-2xx status.
    #[error("paypal (ipn): invalid status returned from paypal {0}")]
    InvalidStatus(u16),

    /// The IPN validation endpoint answered, but not with `VERIFIED`.
    #[error("paypal (ipn): invalid IPN")]
    InvalidIpn,

    /// An inbound notification body could not be parsed as a form.
    #[error("malformed form data: {0}")]
    MalformedForm(#[from] FormError),

    /// The response has no `TOKEN`, so no checkout URL can be built.
    #[error("response carries no TOKEN field")]
    MissingToken,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl PaypalError {
    /// The gateway failure, if this is one.
    pub fn as_gateway(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<GatewayError> for PaypalError {
    fn from(e: GatewayError) -> Self {
        Self::Gateway(Box::new(e))
    }
}
