//! Typed request values for the NVP operations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PaypalError;

/// A money amount held in minor units (cents).
///
/// The wire format requires exactly two decimal digits, so the value is
/// fixed-point end to end: no `f64` anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    cents: u64,
}

impl Amount {
    pub const ZERO: Amount = Amount { cents: 0 };

    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Whole currency units, e.g. `Amount::from_units(5)` is `5.00`.
    ///
    /// Fails when the amount in cents does not fit a `u64`.
    pub fn from_units(units: u64) -> Result<Self, PaypalError> {
        units
            .checked_mul(100)
            .map(Self::from_cents)
            .ok_or_else(|| PaypalError::InvalidAmount(format!("{units} units: amount too large")))
    }

    pub const fn cents(&self) -> u64 {
        self.cents
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl FromStr for Amount {
    type Err = PaypalError;

    /// Parses `"5"`, `"5.5"` or `"5.50"`. More than two fractional digits
    /// is rejected rather than rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PaypalError::InvalidAmount(format!("'{s}': {reason}"));

        let trimmed = s.trim();
        let (integer_part, fractional_part) = match trimmed.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (trimmed, ""),
        };

        if integer_part.is_empty() && fractional_part.is_empty() {
            return Err(invalid("no numeric content"));
        }
        if !integer_part.bytes().all(|b| b.is_ascii_digit())
            || !fractional_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("only digits and a single '.' are allowed"));
        }
        if fractional_part.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }

        let units: u64 = if integer_part.is_empty() {
            0
        } else {
            integer_part
                .parse()
                .map_err(|e| invalid(&format!("integer part: {e}")))?
        };

        let fraction: u64 = match fractional_part.len() {
            0 => 0,
            1 => fractional_part.parse::<u64>().unwrap_or_default() * 10,
            _ => fractional_part.parse::<u64>().unwrap_or_default(),
        };

        units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Self::from_cents)
            .ok_or_else(|| invalid("amount too large"))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Implements `as_str`, `Display` and `FromStr` for a wire enum.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// Spelling used on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($wire) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("unknown {} '{s}'", stringify!($name)))
            }
        }
    };
}

/// ISO 4217 currency codes accepted by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurrencyCode {
    #[default]
    #[serde(rename = "USD")]
    Usd,
}

wire_enum!(CurrencyCode { Usd => "USD" });

/// What `DoExpressCheckoutPayment` does with the approved funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentAction {
    /// Capture immediately.
    Sale,
    /// Authorize now, capture later.
    Authorization,
    /// Open an order to authorize and capture against later (ship later).
    Order,
}

wire_enum!(PaymentAction {
    Sale => "Sale",
    Authorization => "Authorization",
    Order => "Order",
});

/// Unit of a recurring billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingPeriod {
    Day,
    Week,
    SemiMonth,
    Month,
    Year,
}

wire_enum!(BillingPeriod {
    Day => "Day",
    Week => "Week",
    SemiMonth => "SemiMonth",
    Month => "Month",
    Year => "Year",
});

/// `L_BILLINGTYPE0` of a billing agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingType {
    RecurringPayments,
    MerchantInitiatedBilling,
    MerchantInitiatedBillingSingleAgreement,
}

wire_enum!(BillingType {
    RecurringPayments => "RecurringPayments",
    MerchantInitiatedBilling => "MerchantInitiatedBilling",
    MerchantInitiatedBillingSingleAgreement => "MerchantInitiatedBillingSingleAgreement",
});

/// Billing agreement attached to a checkout that precedes a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAgreement {
    pub billing_type: BillingType,
    pub description: String,
}

/// Input to `SetExpressCheckout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressCheckoutRequest {
    pub amount: Amount,
    pub currency_code: CurrencyCode,
    pub return_url: String,
    pub cancel_url: String,
    pub billing_agreement: BillingAgreement,
}

/// Billing cycle of a recurring payments profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringBilling {
    pub period: BillingPeriod,
    /// Number of periods per billing cycle.
    pub frequency: u32,
    pub amount: Amount,
    /// Roll failed installments into the next cycle instead of failing the profile.
    pub auto_bill: bool,
}

/// Input to `CreateRecurringPaymentsProfile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPaymentRequest {
    pub email: String,
    /// `PAYERID` returned by `GetExpressCheckoutDetails`.
    pub payer_id: String,
    pub start_date: DateTime<Utc>,
    pub description: String,
    pub currency_code: CurrencyCode,
    pub billing: RecurringBilling,
}

/// Render a profile start date as RFC 3339 in UTC, e.g. `2026-10-18T09:30:00Z`.
pub fn format_profile_start_date(start: &DateTime<Utc>) -> String {
    start.to_rfc3339_opts(SecondsFormat::Secs, true)
}
