/// NVP endpoint for the sandbox environment.
pub const NVP_SANDBOX_URL: &str = "https://api-3t.sandbox.paypal.com/nvp";

/// NVP endpoint for the production environment.
pub const NVP_PRODUCTION_URL: &str = "https://api-3t.paypal.com/nvp";

/// Sandbox `webscr` endpoint. Serves both the checkout redirect and IPN validation.
pub const CHECKOUT_SANDBOX_URL: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr";

/// Production `webscr` endpoint. Serves both the checkout redirect and IPN validation.
pub const CHECKOUT_PRODUCTION_URL: &str = "https://www.paypal.com/cgi-bin/webscr";

/// NVP protocol version sent with every request.
pub const NVP_VERSION: &str = "84";

/// The only IPN validation reply that may be trusted. Compared byte for byte.
pub const IPN_VERIFIED: &str = "VERIFIED";

/// `cmd` value appended when echoing a notification back for validation.
pub const CMD_NOTIFY_VALIDATE: &str = "_notify-validate";

/// `cmd` value of the buyer-facing checkout redirect.
pub const CMD_EXPRESS_CHECKOUT: &str = "_express-checkout";

/// Shown when a failed response carries neither a usable error code nor an ACK.
pub const MAINTENANCE_MESSAGE: &str = "PayPal is undergoing maintenance.\nPlease try again later.";

pub const METHOD_SET_EXPRESS_CHECKOUT: &str = "SetExpressCheckout";
pub const METHOD_GET_EXPRESS_CHECKOUT_DETAILS: &str = "GetExpressCheckoutDetails";
pub const METHOD_DO_EXPRESS_CHECKOUT_PAYMENT: &str = "DoExpressCheckoutPayment";
pub const METHOD_CREATE_RECURRING_PAYMENTS_PROFILE: &str = "CreateRecurringPaymentsProfile";
