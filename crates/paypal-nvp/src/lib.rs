//! Client for PayPal's NVP API and IPN notifications.
//!
//! Two independent flows share nothing but credentials and an HTTP transport:
//!
//! - **NVP** ([`PaypalClient`]): Express Checkout (`SetExpressCheckout`,
//!   `GetExpressCheckoutDetails`, `DoExpressCheckoutPayment`) and recurring
//!   payments profiles. Each call is one form POST whose reply is classified
//!   into a [`GatewayResponse`] or a [`GatewayError`].
//! - **IPN** ([`IpnVerifier`]): echo an inbound notification back to PayPal
//!   and trust it only when PayPal answers `VERIFIED`.
//!
//! Nothing retries. Timeouts belong to the transport passed in.
//!
//! # Quick example
//!
//! ```no_run
//! use paypal_nvp::{
//!     Amount, BillingAgreement, BillingType, Credentials, CurrencyCode, Environment,
//!     ExpressCheckoutRequest, PaypalClient,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), paypal_nvp::PaypalError> {
//! let client = PaypalClient::new_default(
//!     Credentials::new("merchant_api1.example.com", "PASSWORD", "SIGNATURE"),
//!     Environment::Sandbox,
//! );
//!
//! let resp = client
//!     .initiate_express_checkout(&ExpressCheckoutRequest {
//!         amount: Amount::from_units(5)?,
//!         currency_code: CurrencyCode::Usd,
//!         return_url: "https://shop.example.com/paypal/return".into(),
//!         cancel_url: "https://shop.example.com/paypal/cancel".into(),
//!         billing_agreement: BillingAgreement {
//!             billing_type: BillingType::RecurringPayments,
//!             description: "Monthly subscription".into(),
//!         },
//!     })
//!     .await?;
//!
//! println!("redirect buyer to {}", resp.checkout_url()?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod constants;
pub mod environment;
pub mod error;
pub mod form;
pub mod ipn;
pub mod response;
pub mod transport;
pub mod types;

pub use client::{Credentials, PaypalClient};
pub use constants::*;
pub use environment::{Endpoints, Environment};
pub use error::PaypalError;
pub use form::{FormError, Values};
pub use ipn::{verify_notification, InboundNotification, IpnMessage, IpnVerifier};
pub use response::{ErrorDetail, GatewayError, GatewayResponse, ResponseOrigin};
pub use transport::{HttpTransport, TransportError, TransportResponse};
pub use types::*;
