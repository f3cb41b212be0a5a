//! `paypal-nvp`: drive Express Checkout, recurring profiles and IPN
//! verification from the command line.
//!
//! Credentials come from `PAYPAL_USERNAME`, `PAYPAL_PASSWORD` and
//! `PAYPAL_SIGNATURE` (a `.env` file is honored). Results are printed as
//! JSON on stdout; logs go to stderr (`RUST_LOG` controls the filter).

mod config;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paypal_nvp::{
    Amount, BillingAgreement, BillingPeriod, BillingType, CurrencyCode, Environment,
    ExpressCheckoutRequest, InboundNotification, IpnVerifier, PaymentAction, PaypalClient,
    PaypalError, RecurringBilling, RecurringPaymentRequest,
};

use crate::config::{CliConfig, ConfigError};

#[derive(Debug, Parser)]
#[command(name = "paypal-nvp", version, about = "PayPal NVP and IPN client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// SetExpressCheckout: start a checkout and print the buyer redirect URL.
    Checkout {
        #[arg(long)]
        amount: Amount,
        #[arg(long, default_value = "USD")]
        currency: CurrencyCode,
        #[arg(long)]
        return_url: String,
        #[arg(long)]
        cancel_url: String,
        #[arg(long, default_value = "RecurringPayments")]
        billing_type: BillingType,
        #[arg(long)]
        description: String,
    },
    /// GetExpressCheckoutDetails for a token.
    Details { token: String },
    /// DoExpressCheckoutPayment: complete an approved checkout.
    Complete {
        token: String,
        payer_id: String,
        #[arg(long)]
        amount: Amount,
        #[arg(long, default_value = "Sale")]
        action: PaymentAction,
        #[arg(long, default_value = "USD")]
        currency: CurrencyCode,
    },
    /// CreateRecurringPaymentsProfile from an approved checkout token.
    Subscribe {
        token: String,
        #[arg(long)]
        payer_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        amount: Amount,
        #[arg(long, default_value = "Month")]
        period: BillingPeriod,
        #[arg(long, default_value_t = 1)]
        frequency: u32,
        /// RFC 3339 start date (default: now).
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long, default_value = "USD")]
        currency: CurrencyCode,
        /// Add failed installments to the next billing cycle.
        #[arg(long)]
        auto_bill: bool,
    },
    /// Verify a captured IPN body (from a file, or stdin when omitted).
    VerifyIpn {
        #[arg(long)]
        body_file: Option<PathBuf>,
        #[arg(long, env = "PAYPAL_ENVIRONMENT", default_value = "sandbox")]
        environment: Environment,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Paypal(#[from] PaypalError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(CliError::Paypal(PaypalError::Gateway(e))) => {
            tracing::error!(
                error_code = %e.error_code,
                severity = %e.severity_code,
                correlation_id = %e.correlation_id,
                "{e}"
            );
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{json}");
            }
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, CliError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn nvp_client() -> Result<PaypalClient, CliError> {
    let config = CliConfig::from_env()?;
    tracing::debug!(?config, "loaded configuration");
    let http = http_client(config.timeout)?;
    Ok(PaypalClient::with_transport(
        config.credentials(),
        config.environment,
        http,
    ))
}

async fn run(command: Command) -> Result<String, CliError> {
    let output = match command {
        Command::Checkout {
            amount,
            currency,
            return_url,
            cancel_url,
            billing_type,
            description,
        } => {
            let client = nvp_client()?;
            let resp = client
                .initiate_express_checkout(&ExpressCheckoutRequest {
                    amount,
                    currency_code: currency,
                    return_url,
                    cancel_url,
                    billing_agreement: BillingAgreement {
                        billing_type,
                        description,
                    },
                })
                .await?;
            let checkout_url = resp.checkout_url()?;
            serde_json::json!({
                "checkoutUrl": checkout_url.as_str(),
                "response": resp,
            })
        }
        Command::Details { token } => {
            let resp = nvp_client()?.express_checkout_details(&token).await?;
            serde_json::to_value(&resp)?
        }
        Command::Complete {
            token,
            payer_id,
            amount,
            action,
            currency,
        } => {
            let resp = nvp_client()?
                .complete_express_checkout(&token, &payer_id, action, currency, amount)
                .await?;
            serde_json::to_value(&resp)?
        }
        Command::Subscribe {
            token,
            payer_id,
            email,
            description,
            amount,
            period,
            frequency,
            start,
            currency,
            auto_bill,
        } => {
            let request = RecurringPaymentRequest {
                email,
                payer_id,
                start_date: start.unwrap_or_else(Utc::now),
                description,
                currency_code: currency,
                billing: RecurringBilling {
                    period,
                    frequency,
                    amount,
                    auto_bill,
                },
            };
            let resp = nvp_client()?
                .create_recurring_payment_profile(&token, &request)
                .await?;
            serde_json::to_value(&resp)?
        }
        Command::VerifyIpn {
            body_file,
            environment,
        } => {
            let body = match body_file {
                Some(path) => std::fs::read(path)?,
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin().read_to_end(&mut buf)?;
                    buf
                }
            };
            let http = http_client(CliConfig::timeout_from_env()?)?;
            let verifier = IpnVerifier::new(http, environment);
            let message = verifier.verify(&InboundNotification::new(body)).await?;
            serde_json::to_value(&message)?
        }
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
