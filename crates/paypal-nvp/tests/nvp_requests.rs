//! Wire-level behavior of the NVP operations, checked through a recording
//! transport and over HTTP against a local actix-web stand-in for PayPal.

mod common;

use std::sync::Mutex;

use actix_web::http::header;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::{TimeZone, Utc};
use common::StubTransport;
use paypal_nvp::{
    Amount, BillingAgreement, BillingPeriod, BillingType, Credentials, CurrencyCode, Endpoints,
    Environment, ExpressCheckoutRequest, PaymentAction, PaypalClient, PaypalError,
    RecurringBilling, RecurringPaymentRequest, TransportError, Values,
};

const SUCCESS_BODY: &str = "TOKEN=EC%2d8BP31436MB473862U&TIMESTAMP=2024%2d03%2d01T12%3a00%3a00Z\
&CORRELATIONID=4f1c2d3e5a6b7&ACK=Success&VERSION=84&BUILD=2975009";

const FAILURE_BODY: &str = "TIMESTAMP=2024%2d03%2d01T12%3a00%3a00Z&CORRELATIONID=9a8b7c6d&ACK=Failure\
&VERSION=84&BUILD=2975009&L_ERRORCODE0=10410&L_SHORTMESSAGE0=Invalid%20token\
&L_LONGMESSAGE0=Invalid%20token%2e&L_SEVERITYCODE0=Error";

fn credentials() -> Credentials {
    Credentials::new("merchant_api1.example.com", "S3CR3T", "AbCdEf.sig")
}

fn client(environment: Environment, stub: &StubTransport) -> PaypalClient<&StubTransport> {
    PaypalClient::with_transport(credentials(), environment, stub)
}

fn checkout_request(amount: Amount) -> ExpressCheckoutRequest {
    ExpressCheckoutRequest {
        amount,
        currency_code: CurrencyCode::Usd,
        return_url: "http://localhost/RETURN-URL".to_string(),
        cancel_url: "http://localhost/CANCEL-URL".to_string(),
        billing_agreement: BillingAgreement {
            billing_type: BillingType::RecurringPayments,
            description: "Subscription Test".to_string(),
        },
    }
}

fn recurring_request(auto_bill: bool) -> RecurringPaymentRequest {
    RecurringPaymentRequest {
        email: "buyer@example.com".to_string(),
        payer_id: "4TNRANZSBUFWC".to_string(),
        start_date: Utc.with_ymd_and_hms(2026, 11, 1, 8, 30, 0).unwrap(),
        description: "Subscription Test".to_string(),
        currency_code: CurrencyCode::Usd,
        billing: RecurringBilling {
            period: BillingPeriod::Month,
            frequency: 12,
            amount: Amount::from_units(2).unwrap(),
            auto_bill,
        },
    }
}

#[tokio::test]
async fn test_every_request_carries_credentials_and_version() {
    let stub = StubTransport::replying(200, SUCCESS_BODY);
    let client = client(Environment::Sandbox, &stub);

    client.express_checkout_details("EC-1").await.unwrap();

    let form = stub.last().form;
    assert_eq!(form.get("USER"), Some("merchant_api1.example.com"));
    assert_eq!(form.get("PWD"), Some("S3CR3T"));
    assert_eq!(form.get("SIGNATURE"), Some("AbCdEf.sig"));
    assert_eq!(form.get("VERSION"), Some("84"));
    assert_eq!(form.get("METHOD"), Some("GetExpressCheckoutDetails"));
    assert_eq!(form.get("TOKEN"), Some("EC-1"));
}

#[tokio::test]
async fn test_environment_selects_nvp_endpoint() {
    let stub = StubTransport::replying(200, SUCCESS_BODY);

    client(Environment::Sandbox, &stub)
        .express_checkout_details("EC-1")
        .await
        .unwrap();
    client(Environment::Production, &stub)
        .express_checkout_details("EC-1")
        .await
        .unwrap();

    let urls: Vec<String> = stub.requests().into_iter().map(|c| c.url).collect();
    assert_eq!(
        urls,
        [
            "https://api-3t.sandbox.paypal.com/nvp",
            "https://api-3t.paypal.com/nvp"
        ]
    );
}

#[tokio::test]
async fn test_initiate_express_checkout_fields() {
    let stub = StubTransport::replying(200, SUCCESS_BODY);
    let client = client(Environment::Sandbox, &stub);

    client
        .initiate_express_checkout(&checkout_request(Amount::from_units(5).unwrap()))
        .await
        .unwrap();

    let form = stub.last().form;
    assert_eq!(form.get("METHOD"), Some("SetExpressCheckout"));
    assert_eq!(form.get("PAYMENTREQUEST_0_AMT"), Some("5.00"));
    assert_eq!(form.get("PAYMENTREQUEST_0_CURRENCYCODE"), Some("USD"));
    assert_eq!(form.get("RETURNURL"), Some("http://localhost/RETURN-URL"));
    assert_eq!(form.get("CANCELURL"), Some("http://localhost/CANCEL-URL"));
    assert_eq!(form.get("REQCONFIRMSHIPPING"), Some("0"));
    assert_eq!(form.get("NOSHIPPING"), Some("1"));
    assert_eq!(form.get("SOLUTIONTYPE"), Some("Sole"));
    assert_eq!(form.get("L_BILLINGTYPE0"), Some("RecurringPayments"));
    assert_eq!(
        form.get("L_BILLINGAGREEMENTDESCRIPTION0"),
        Some("Subscription Test")
    );
}

#[tokio::test]
async fn test_amounts_serialize_with_two_decimals() {
    let stub = StubTransport::replying(200, SUCCESS_BODY);
    let client = client(Environment::Sandbox, &stub);

    client
        .complete_express_checkout_sale("EC-1", "PAYER", CurrencyCode::Usd, Amount::from_units(1000).unwrap())
        .await
        .unwrap();
    assert_eq!(stub.last().form.get("PAYMENTREQUEST_0_AMT"), Some("1000.00"));

    client
        .initiate_express_checkout(&checkout_request("19.9".parse().unwrap()))
        .await
        .unwrap();
    assert_eq!(stub.last().form.get("PAYMENTREQUEST_0_AMT"), Some("19.90"));
}

#[tokio::test]
async fn test_checkout_url_carries_token_for_each_environment() {
    for (environment, base) in [
        (Environment::Sandbox, "https://www.sandbox.paypal.com/cgi-bin/webscr"),
        (Environment::Production, "https://www.paypal.com/cgi-bin/webscr"),
    ] {
        let stub = StubTransport::replying(200, SUCCESS_BODY);
        let resp = client(environment, &stub)
            .initiate_express_checkout(&checkout_request(Amount::from_units(5).unwrap()))
            .await
            .unwrap();

        assert_eq!(resp.ack, "Success");
        assert_eq!(resp.environment(), environment);

        let url = resp.checkout_url().unwrap();
        assert!(url.as_str().starts_with(base), "{url} should start with {base}");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            [
                ("cmd".to_string(), "_express-checkout".to_string()),
                ("token".to_string(), "EC-8BP31436MB473862U".to_string()),
            ]
        );
    }
}

#[tokio::test]
async fn test_complete_express_checkout_fields() {
    let stub = StubTransport::replying(200, SUCCESS_BODY);
    let client = client(Environment::Sandbox, &stub);

    client
        .complete_express_checkout(
            "EC-1",
            "PAYER-9",
            PaymentAction::Order,
            CurrencyCode::Usd,
            Amount::from_cents(1050),
        )
        .await
        .unwrap();

    let form = stub.last().form;
    assert_eq!(form.get("METHOD"), Some("DoExpressCheckoutPayment"));
    assert_eq!(form.get("TOKEN"), Some("EC-1"));
    assert_eq!(form.get("PAYERID"), Some("PAYER-9"));
    assert_eq!(form.get("PAYMENTREQUEST_0_PAYMENTACTION"), Some("Order"));
    assert_eq!(form.get("PAYMENTREQUEST_0_CURRENCYCODE"), Some("USD"));
    assert_eq!(form.get("PAYMENTREQUEST_0_AMT"), Some("10.50"));
}

#[tokio::test]
async fn test_recurring_profile_fields() {
    let stub = StubTransport::replying(200, "PROFILEID=I%2dWJ5AHLGF6XR8&PROFILESTATUS=ActiveProfile&ACK=Success");
    let client = client(Environment::Sandbox, &stub);

    let resp = client
        .create_recurring_payment_profile("EC-146658863Y631972K", &recurring_request(true))
        .await
        .unwrap();
    assert_eq!(resp.values.get("PROFILEID"), Some("I-WJ5AHLGF6XR8"));

    let form = stub.last().form;
    assert_eq!(form.get("METHOD"), Some("CreateRecurringPaymentsProfile"));
    assert_eq!(form.get("TOKEN"), Some("EC-146658863Y631972K"));
    assert_eq!(form.get("PAYERID"), Some("4TNRANZSBUFWC"));
    assert_eq!(form.get("EMAIL"), Some("buyer@example.com"));
    assert_eq!(form.get("PROFILESTARTDATE"), Some("2026-11-01T08:30:00Z"));
    assert_eq!(form.get("DESC"), Some("Subscription Test"));
    assert_eq!(form.get("CURRENCYCODE"), Some("USD"));
    assert_eq!(form.get("BILLINGPERIOD"), Some("Month"));
    assert_eq!(form.get("BILLINGFREQUENCY"), Some("12"));
    assert_eq!(form.get("AMT"), Some("2.00"));
    assert_eq!(form.get("AUTOBILLOUTAMT"), Some("AddToNextBilling"));
}

#[tokio::test]
async fn test_recurring_profile_without_auto_bill_omits_flag() {
    let stub = StubTransport::replying(200, "ACK=Success");
    let client = client(Environment::Sandbox, &stub);

    client
        .create_recurring_payment_profile("EC-1", &recurring_request(false))
        .await
        .unwrap();

    assert!(!stub.last().form.contains_key("AUTOBILLOUTAMT"));
}

#[tokio::test]
async fn test_gateway_failure_is_an_error_not_a_response() {
    let stub = StubTransport::replying(200, FAILURE_BODY);
    let client = client(Environment::Sandbox, &stub);

    let err = client
        .complete_express_checkout_sale("Fake_Token", "Fake_PayerId", CurrencyCode::Usd, Amount::from_units(1000).unwrap())
        .await
        .unwrap_err();

    let gateway = err.as_gateway().expect("expected a gateway error");
    assert_eq!(gateway.ack, "Failure");
    assert_eq!(gateway.error_code, "10410");
    assert_eq!(gateway.short_message, "Invalid token");
    assert_eq!(gateway.long_message, "Invalid token.");
    assert_eq!(gateway.severity_code, "Error");
    assert_eq!(gateway.correlation_id, "9a8b7c6d");
    assert_eq!(err.to_string(), "PayPal Error 10410: Invalid token");
}

#[tokio::test]
async fn test_error_code_fails_even_with_success_ack() {
    let stub = StubTransport::replying(200, "ACK=Success&L_ERRORCODE0=10486&L_SHORTMESSAGE0=Declined");
    let client = client(Environment::Sandbox, &stub);

    let err = client.express_checkout_details("EC-1").await.unwrap_err();
    assert_eq!(err.as_gateway().map(|g| g.error_code.as_str()), Some("10486"));
}

#[tokio::test]
async fn test_transport_failure_is_not_a_gateway_error() {
    let stub = StubTransport::unreachable();
    let client = client(Environment::Sandbox, &stub);

    let err = client.express_checkout_details("EC-1").await.unwrap_err();
    assert!(matches!(err, PaypalError::Transport(TransportError::Request(_))));
    assert!(err.as_gateway().is_none());
}

#[tokio::test]
async fn test_undecodable_body_is_a_transport_error() {
    for stub in [
        StubTransport::with_body_bytes(200, &[b'A', b'C', b'K', b'=', 0xff]),
        StubTransport::replying(200, "ACK=%ZZ"),
    ] {
        let client = client(Environment::Sandbox, &stub);
        let err = client.express_checkout_details("EC-1").await.unwrap_err();
        assert!(
            matches!(err, PaypalError::Transport(TransportError::Decode(_))),
            "unexpected error: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_perform_request_exposes_raw_fields() {
    let stub = StubTransport::replying(
        200,
        "ACK=Success&EMAIL=buyer%40example.com&PAYERID=4TNRANZSBUFWC&L_NAME0=Widget&L_NAME1=Gadget",
    );
    let client = client(Environment::Sandbox, &stub);

    let mut values = Values::new();
    values.set("METHOD", "GetExpressCheckoutDetails");
    values.set("TOKEN", "EC-1");
    let resp = client.perform_request(values).await.unwrap();

    assert_eq!(resp.values.get("EMAIL"), Some("buyer@example.com"));
    assert_eq!(resp.values.get("L_NAME1"), Some("Gadget"));
    assert!(matches!(resp.checkout_url(), Err(PaypalError::MissingToken)));
}

/// What the local NVP endpoint received.
#[derive(Default)]
struct Received {
    content_type: Mutex<Option<String>>,
    body: Mutex<Option<web::Bytes>>,
}

struct NvpDouble {
    reply: &'static str,
    received: web::Data<Received>,
}

async fn nvp(req: HttpRequest, body: web::Bytes, double: web::Data<NvpDouble>) -> HttpResponse {
    *double.received.content_type.lock().unwrap() = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *double.received.body.lock().unwrap() = Some(body);
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(double.reply)
}

/// Start a local NVP endpoint and return its URL.
fn spawn_nvp_double(reply: &'static str) -> (String, web::Data<Received>) {
    let received = web::Data::new(Received::default());
    let double = web::Data::new(NvpDouble {
        reply,
        received: received.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(double.clone())
            .route("/nvp", web::post().to(nvp))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());

    (format!("http://{addr}/nvp"), received)
}

fn http_client(nvp_url: &str) -> PaypalClient {
    PaypalClient::with_transport(credentials(), Environment::Sandbox, reqwest::Client::new())
        .with_endpoints(Endpoints::custom(
            nvp_url,
            "https://www.sandbox.paypal.com/cgi-bin/webscr",
        ))
}

#[actix_rt::test]
async fn test_checkout_round_trip_over_http() {
    let (nvp_url, received) = spawn_nvp_double(SUCCESS_BODY);

    let resp = http_client(&nvp_url)
        .initiate_express_checkout(&checkout_request(Amount::from_units(5).unwrap()))
        .await
        .unwrap();

    assert_eq!(resp.ack, "Success");
    assert_eq!(resp.token(), Some("EC-8BP31436MB473862U"));
    assert_eq!(resp.correlation_id, "4f1c2d3e5a6b7");
    assert_eq!(
        resp.checkout_url().unwrap().as_str(),
        "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=EC-8BP31436MB473862U"
    );

    assert_eq!(
        received.content_type.lock().unwrap().as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    let body = received.body.lock().unwrap().clone().unwrap();
    let form = Values::parse_bytes(&body).unwrap();
    assert_eq!(form.get("METHOD"), Some("SetExpressCheckout"));
    assert_eq!(form.get("USER"), Some("merchant_api1.example.com"));
    assert_eq!(form.get("PWD"), Some("S3CR3T"));
    assert_eq!(form.get("SIGNATURE"), Some("AbCdEf.sig"));
    assert_eq!(form.get("VERSION"), Some("84"));
    assert_eq!(form.get("PAYMENTREQUEST_0_AMT"), Some("5.00"));
    assert_eq!(form.get("RETURNURL"), Some("http://localhost/RETURN-URL"));
}

#[actix_rt::test]
async fn test_gateway_failure_over_http() {
    let (nvp_url, _) = spawn_nvp_double(FAILURE_BODY);

    let err = http_client(&nvp_url)
        .express_checkout_details("Fake_Token")
        .await
        .unwrap_err();

    let gateway = err.as_gateway().expect("expected a gateway error");
    assert_eq!(gateway.ack, "Failure");
    assert_eq!(gateway.error_code, "10410");
    assert_eq!(gateway.correlation_id, "9a8b7c6d");
}
