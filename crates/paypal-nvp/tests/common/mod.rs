#![allow(dead_code)]

use std::sync::Mutex;

use bytes::Bytes;
use paypal_nvp::{HttpTransport, TransportError, TransportResponse, Values};

/// A request captured by [`StubTransport`].
#[derive(Debug, Clone)]
pub struct Captured {
    pub url: String,
    /// Body exactly as handed to the transport.
    pub body: Bytes,
    /// `body` decoded, for field assertions.
    pub form: Values,
}

/// Transport double: records every POST and answers with a canned reply.
pub struct StubTransport {
    status: u16,
    body: Bytes,
    fail: bool,
    requests: Mutex<Vec<Captured>>,
}

impl StubTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            status,
            body: Bytes::copy_from_slice(body.as_bytes()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_body_bytes(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            body: Bytes::copy_from_slice(body),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the connection was refused.
    pub fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::replying(200, "")
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.requests()
            .pop()
            .expect("no request was sent through the stub")
    }
}

impl HttpTransport for StubTransport {
    async fn post_form(&self, url: &str, body: Bytes) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(Captured {
            url: url.to_string(),
            form: Values::parse_bytes(&body).expect("transport was handed a malformed form"),
            body,
        });
        if self.fail {
            return Err(TransportError::Request("connection refused".to_string()));
        }
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Body of a sample `web_accept` notification.
pub const IPN_EXAMPLE: &str = "mc_gross=19.95&protection_eligibility=Eligible&address_status=confirmed\
&payer_id=LPLWNMTBWMFAY&tax=0.00&address_street=1+Main+St&payment_date=20%3A12%3A59+Jan+13%2C+2009+PST\
&payment_status=Completed&charset=windows-1252&address_zip=95131&first_name=Test&mc_fee=0.88\
&address_country_code=US&address_name=Test+User&notify_version=2.6&custom=&payer_status=verified\
&address_country=United+States&address_city=San+Jose&quantity=1\
&verify_sign=AtkOfCXbDm2hu0ZELryHFjY-Vb7PAUvS6nMXgysbElEn9v-1XcmSoGtf\
&payer_email=gpmac_1231902590_per%40paypal.com&txn_id=61E67681CH3238416&payment_type=instant\
&last_name=User&address_state=CA&receiver_email=gpmac_1231902686_biz%40paypal.com&payment_fee=0.88\
&receiver_id=S8XGHLYDW9T3S&txn_type=express_checkout&item_name=&mc_currency=USD&item_number=\
&residence_country=US&test_ipn=1&handling_amount=0.00&transaction_subject=&payment_gross=19.95&shipping=0.00";
