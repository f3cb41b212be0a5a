//! NVP API client.
//!
//! [`PaypalClient`] holds credentials, the environment and a transport. It
//! carries no per-request state, so one client can serve any number of
//! concurrent calls; each call builds its own parameter set.

use std::fmt;

use bytes::Bytes;

use crate::constants::{
    METHOD_CREATE_RECURRING_PAYMENTS_PROFILE, METHOD_DO_EXPRESS_CHECKOUT_PAYMENT,
    METHOD_GET_EXPRESS_CHECKOUT_DETAILS, METHOD_SET_EXPRESS_CHECKOUT, NVP_VERSION,
};
use crate::environment::{Endpoints, Environment};
use crate::error::PaypalError;
use crate::form::Values;
use crate::response::{classify, GatewayResponse, ResponseOrigin};
use crate::transport::{HttpTransport, TransportError};
use crate::types::{
    format_profile_start_date, Amount, CurrencyCode, ExpressCheckoutRequest, PaymentAction,
    RecurringPaymentRequest,
};

/// API credentials of a merchant account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub signature: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            signature: signature.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

/// Client for the NVP API.
///
/// Generic over the transport so tests can substitute a double; the default
/// is `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct PaypalClient<T = reqwest::Client> {
    credentials: Credentials,
    environment: Environment,
    endpoints: Endpoints,
    transport: T,
}

impl PaypalClient<reqwest::Client> {
    /// Create a client backed by a fresh `reqwest::Client` with default settings.
    ///
    /// Use [`PaypalClient::with_transport`] to supply a configured client
    /// (timeouts, proxies) instead.
    pub fn new_default(credentials: Credentials, environment: Environment) -> Self {
        Self::with_transport(credentials, environment, reqwest::Client::new())
    }
}

impl<T: HttpTransport> PaypalClient<T> {
    pub fn with_transport(credentials: Credentials, environment: Environment, transport: T) -> Self {
        Self {
            credentials,
            environment,
            endpoints: Endpoints::for_environment(environment),
            transport,
        }
    }

    /// Override the base URLs, e.g. to target a local test double.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send an arbitrary NVP request.
    ///
    /// Credentials and `VERSION` are appended to `values`; the reply is
    /// classified into a [`GatewayResponse`] or a gateway error.
    pub async fn perform_request(&self, mut values: Values) -> Result<GatewayResponse, PaypalError> {
        let method = values.get_or_empty("METHOD").to_string();

        values.add("USER", self.credentials.username.as_str());
        values.add("PWD", self.credentials.password.as_str());
        values.add("SIGNATURE", self.credentials.signature.as_str());
        values.add("VERSION", NVP_VERSION);

        tracing::debug!(
            method = %method,
            environment = %self.environment,
            endpoint = %self.endpoints.nvp_url,
            "sending NVP request"
        );

        let resp = self
            .transport
            .post_form(&self.endpoints.nvp_url, Bytes::from(values.encode()))
            .await?;

        if !resp.is_success() {
            tracing::warn!(method = %method, status = resp.status, "NVP endpoint returned non-2xx status");
        }

        let body = std::str::from_utf8(&resp.body)
            .map_err(|e| TransportError::Decode(format!("response is not UTF-8: {e}")))?;
        let reply = Values::parse(body).map_err(|e| TransportError::Decode(e.to_string()))?;

        let origin = ResponseOrigin {
            environment: self.environment,
            checkout_url: self.endpoints.webscr_url.clone(),
        };

        match classify(reply, origin) {
            Ok(response) => {
                tracing::debug!(
                    method = %method,
                    ack = %response.ack,
                    correlation_id = %response.correlation_id,
                    "NVP request succeeded"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    method = %method,
                    ack = %e.ack,
                    error_code = %e.error_code,
                    severity = %e.severity_code,
                    correlation_id = %e.correlation_id,
                    "NVP request rejected by gateway"
                );
                Err(e.into())
            }
        }
    }

    /// `SetExpressCheckout`: start a checkout and obtain a `TOKEN`.
    ///
    /// Redirect the buyer to [`GatewayResponse::checkout_url`] afterwards.
    pub async fn initiate_express_checkout(
        &self,
        request: &ExpressCheckoutRequest,
    ) -> Result<GatewayResponse, PaypalError> {
        let mut values = Values::new();
        values.set("METHOD", METHOD_SET_EXPRESS_CHECKOUT);
        values.add("PAYMENTREQUEST_0_AMT", request.amount.to_string());
        values.add("PAYMENTREQUEST_0_CURRENCYCODE", request.currency_code.as_str());
        values.add("RETURNURL", request.return_url.as_str());
        values.add("CANCELURL", request.cancel_url.as_str());
        values.add("REQCONFIRMSHIPPING", "0");
        values.add("NOSHIPPING", "1");
        values.add("SOLUTIONTYPE", "Sole");

        let agreement = &request.billing_agreement;
        values.add("L_BILLINGTYPE0", agreement.billing_type.as_str());
        values.add(
            "L_BILLINGAGREEMENTDESCRIPTION0",
            agreement.description.as_str(),
        );

        self.perform_request(values).await
    }

    /// `GetExpressCheckoutDetails`: payer and line-item data for a token.
    pub async fn express_checkout_details(
        &self,
        token: &str,
    ) -> Result<GatewayResponse, PaypalError> {
        let mut values = Values::new();
        values.set("METHOD", METHOD_GET_EXPRESS_CHECKOUT_DETAILS);
        values.add("TOKEN", token);
        self.perform_request(values).await
    }

    /// `DoExpressCheckoutPayment`: complete an approved checkout.
    pub async fn complete_express_checkout(
        &self,
        token: &str,
        payer_id: &str,
        action: PaymentAction,
        currency_code: CurrencyCode,
        amount: Amount,
    ) -> Result<GatewayResponse, PaypalError> {
        let mut values = Values::new();
        values.set("METHOD", METHOD_DO_EXPRESS_CHECKOUT_PAYMENT);
        values.add("TOKEN", token);
        values.add("PAYERID", payer_id);
        values.add("PAYMENTREQUEST_0_PAYMENTACTION", action.as_str());
        values.add("PAYMENTREQUEST_0_CURRENCYCODE", currency_code.as_str());
        values.add("PAYMENTREQUEST_0_AMT", amount.to_string());
        self.perform_request(values).await
    }

    /// [`complete_express_checkout`](Self::complete_express_checkout) with
    /// [`PaymentAction::Sale`].
    pub async fn complete_express_checkout_sale(
        &self,
        token: &str,
        payer_id: &str,
        currency_code: CurrencyCode,
        amount: Amount,
    ) -> Result<GatewayResponse, PaypalError> {
        self.complete_express_checkout(token, payer_id, PaymentAction::Sale, currency_code, amount)
            .await
    }

    /// `CreateRecurringPaymentsProfile`.
    ///
    /// `token` must come from a successful
    /// [`initiate_express_checkout`](Self::initiate_express_checkout) that
    /// carried a billing agreement.
    pub async fn create_recurring_payment_profile(
        &self,
        token: &str,
        request: &RecurringPaymentRequest,
    ) -> Result<GatewayResponse, PaypalError> {
        let billing = &request.billing;

        let mut values = Values::new();
        values.set("METHOD", METHOD_CREATE_RECURRING_PAYMENTS_PROFILE);
        values.set("TOKEN", token);
        values.set("PAYERID", request.payer_id.as_str());
        values.set("EMAIL", request.email.as_str());
        values.set(
            "PROFILESTARTDATE",
            format_profile_start_date(&request.start_date),
        );
        values.set("DESC", request.description.as_str());
        values.set("CURRENCYCODE", request.currency_code.as_str());
        values.set("BILLINGPERIOD", billing.period.as_str());
        values.set("BILLINGFREQUENCY", billing.frequency.to_string());
        values.set("AMT", billing.amount.to_string());
        if billing.auto_bill {
            values.set("AUTOBILLOUTAMT", "AddToNextBilling");
        }
        self.perform_request(values).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let credentials = Credentials::new("merchant_api1.example.com", "hunter2", "A1b2C3");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("merchant_api1.example.com"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("A1b2C3"));
    }

    #[test]
    fn test_client_uses_environment_endpoints() {
        let credentials = Credentials::new("u", "p", "s");
        let sandbox = PaypalClient::new_default(credentials.clone(), Environment::Sandbox);
        assert_eq!(sandbox.endpoints().nvp_url, "https://api-3t.sandbox.paypal.com/nvp");

        let production = PaypalClient::new_default(credentials, Environment::Production);
        assert_eq!(production.endpoints().nvp_url, "https://api-3t.paypal.com/nvp");
        assert_eq!(production.environment(), Environment::Production);
    }
}
