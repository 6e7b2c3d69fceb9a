//! Request document builders
//!
//! Every builder is pure: the current time and generated references are
//! passed in, and a fresh body is built on every call.

use chrono::NaiveDateTime;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use crate::error::{PaylineError, PaylineResult};
use crate::money::Currency;
use crate::types::{
    Action, Buyer, Card, Empty, ImmediateWalletPaymentRequest, Mode, Order, Owner, Payment,
    ScheduledWalletPaymentRequest, SelectedContract, Wallet, WebPaymentRequest, WebWalletRequest,
};
use crate::Document;

/// API version sent in `version` fields.
pub const API_VERSION: u32 = 20;

/// Stand-in for a missing buyer first or last name.
pub const NAME_PLACEHOLDER: &str = "N/A";

/// Country sent on orders.
pub const DEFAULT_COUNTRY: &str = "FR";

/// Delivery mode sent on orders (electronic ticketing).
pub const DEFAULT_DELIVERY_MODE: &str = "5";

/// Security mode of hosted payment pages.
pub const SECURITY_MODE: &str = "SSL";

/// Comment attached to the reset that follows a card check.
pub const CARD_VALIDATION_COMMENT: &str = "Card validation cleanup";

const SCHEDULED_REFERENCE_SUFFIX_LEN: usize = 13;

// ============================================================================
// Dates and references
// ============================================================================

/// `DD/MM/YYYY HH:mm`, the format of every order date.
pub fn format_date(date: &NaiveDateTime) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

/// `DD/MM/YY`, the format of deferred action dates.
pub fn format_short_date(date: &NaiveDateTime) -> String {
    date.format("%d/%m/%y").to_string()
}

/// `DD/MM/YYYY`, the format of scheduled payment dates.
pub fn format_day(date: &NaiveDateTime) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Local wall-clock time, as order dates are expressed.
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// `order_<n>` with `n` in `1..=100000`.
pub fn order_reference() -> String {
    format!("order_{}", rand::rng().random_range(1..=100_000u32))
}

/// `<walletId>-<13 random alphanumerics>`.
pub fn scheduled_reference(wallet_id: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SCHEDULED_REFERENCE_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{wallet_id}-{suffix}")
}

/// `<walletId>-<epoch milliseconds>`.
pub fn web_reference(wallet_id: &str, epoch_millis: i64) -> String {
    format!("{wallet_id}-{epoch_millis}")
}

/// Serialize a request body into a document.
pub fn to_document<T: Serialize>(body: &T) -> PaylineResult<Document> {
    Ok(serde_json::to_value(body)?)
}

fn name_or_placeholder(name: &Option<String>) -> Option<String> {
    Some(
        name.as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(NAME_PLACEHOLDER)
            .to_string(),
    )
}

fn wallet_buyer(
    wallet_id: &str,
    first_name: &Option<String>,
    last_name: &Option<String>,
    email: &Option<String>,
) -> Buyer {
    Buyer {
        first_name: name_or_placeholder(first_name),
        last_name: name_or_placeholder(last_name),
        email: email.clone(),
        wallet_id: Some(wallet_id.to_string()),
        ..Buyer::default()
    }
}

fn payment(contract_number: &str, amount: u64, currency: Currency, action: Action) -> Payment {
    Payment {
        amount,
        currency,
        action,
        mode: Mode::Full,
        contract_number: contract_number.to_string(),
        differed_action_date: None,
    }
}

/// Order with only the fields the direct API needs.
fn short_order(reference: String, amount: u64, currency: Currency, date: &NaiveDateTime) -> Order {
    Order {
        reference,
        country: None,
        amount,
        currency,
        date: format_date(date),
        details: None,
        delivery_mode: None,
    }
}

/// Order as the wallet and web APIs expect it.
fn full_order(reference: String, amount: u64, date: &NaiveDateTime) -> Order {
    Order {
        reference,
        country: Some(DEFAULT_COUNTRY.to_string()),
        amount,
        currency: Currency::EUR,
        date: format_date(date),
        details: Some(Empty {}),
        delivery_mode: Some(DEFAULT_DELIVERY_MODE.to_string()),
    }
}

// ============================================================================
// Shared skeleton
// ============================================================================

/// Default skeleton of web API requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebBody {
    pub version: u32,
    pub selected_contract_list: Vec<SelectedContract>,
    pub update_personal_details: u8,
    pub buyer: Buyer,
    pub owner: Owner,
}

/// Build a fresh default skeleton.
pub fn default_web_body() -> WebBody {
    WebBody {
        version: API_VERSION,
        selected_contract_list: Vec::new(),
        update_personal_details: 0,
        buyer: Buyer::default(),
        owner: Owner::default(),
    }
}

// ============================================================================
// Wallets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBody {
    pub contract_number: String,
    pub wallet: Wallet,
}

/// `createWallet` / `updateWallet`
pub fn wallet_body(contract_number: &str, wallet_id: &str, card: &Card) -> WalletBody {
    WalletBody {
        contract_number: contract_number.to_string(),
        wallet: Wallet {
            wallet_id: wallet_id.to_string(),
            last_name: None,
            first_name: None,
            email: None,
            card: card.clone(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWalletBody {
    pub contract_number: String,
    pub wallet_id: String,
}

/// `getWallet`
pub fn get_wallet_body(contract_number: &str, wallet_id: &str) -> GetWalletBody {
    GetWalletBody {
        contract_number: contract_number.to_string(),
        wallet_id: wallet_id.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebWalletBody {
    pub version: u32,
    pub contract_number: String,
    pub selected_contract_list: Vec<SelectedContract>,
    pub update_personal_details: u8,
    pub buyer: Buyer,
    pub owner: Owner,
    #[serde(rename = "returnURL")]
    pub return_url: String,
    #[serde(rename = "cancelURL")]
    pub cancel_url: String,
}

/// `manageWebWallet`
pub fn web_wallet_body(contract_number: &str, request: &WebWalletRequest) -> WebWalletBody {
    let defaults = default_web_body();
    WebWalletBody {
        version: defaults.version,
        contract_number: contract_number.to_string(),
        selected_contract_list: vec![SelectedContract {
            selected_contract: contract_number.to_string(),
        }],
        update_personal_details: defaults.update_personal_details,
        buyer: wallet_buyer(
            &request.wallet_id,
            &request.first_name,
            &request.last_name,
            &request.email,
        ),
        owner: defaults.owner,
        return_url: request.url.clone(),
        cancel_url: request.url.clone(),
    }
}

// ============================================================================
// Wallet payments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmediateWalletPaymentBody {
    pub version: u32,
    pub payment: Payment,
    pub order: Order,
    pub buyer: Buyer,
    pub wallet_id: String,
    pub private_data_list: Empty,
    #[serde(rename = "authentication3DSecure")]
    pub authentication_3d_secure: Empty,
    pub sub_merchant: Empty,
}

/// `doImmediateWalletPayment`; the order reference is the wallet id.
///
/// Deferred mode requires a differed action date.
pub fn immediate_wallet_payment_body(
    contract_number: &str,
    request: &ImmediateWalletPaymentRequest,
    now: &NaiveDateTime,
) -> PaylineResult<ImmediateWalletPaymentBody> {
    let mode = request.mode.unwrap_or_default();
    let differed_action_date = match (mode, &request.differed_action_date) {
        (Mode::Deferred, Some(date)) => Some(format_short_date(date)),
        (Mode::Deferred, None) => {
            return Err(PaylineError::Validation(
                "deferred payment requires a differed action date".to_string(),
            ));
        }
        (Mode::Full, _) => None,
    };

    Ok(ImmediateWalletPaymentBody {
        version: API_VERSION,
        payment: Payment {
            mode,
            differed_action_date,
            ..payment(
                contract_number,
                request.amount,
                Currency::EUR,
                request.action.unwrap_or_default(),
            )
        },
        order: full_order(request.wallet_id.clone(), request.amount, now),
        buyer: wallet_buyer(
            &request.wallet_id,
            &request.first_name,
            &request.last_name,
            &request.email,
        ),
        wallet_id: request.wallet_id.clone(),
        private_data_list: Empty {},
        authentication_3d_secure: Empty {},
        sub_merchant: Empty {},
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWalletPaymentBody {
    pub version: u32,
    pub payment: Payment,
    pub order: Order,
    pub wallet_id: String,
    /// `DD/MM/YYYY`
    pub scheduled_date: String,
    pub private_data_list: Empty,
    #[serde(rename = "authentication3DSecure")]
    pub authentication_3d_secure: Empty,
    pub sub_merchant: Empty,
}

/// `doScheduledWalletPayment`
pub fn scheduled_wallet_payment_body(
    contract_number: &str,
    request: &ScheduledWalletPaymentRequest,
    now: &NaiveDateTime,
    reference: String,
) -> ScheduledWalletPaymentBody {
    ScheduledWalletPaymentBody {
        version: API_VERSION,
        payment: Payment {
            mode: request.mode.unwrap_or_default(),
            ..payment(
                contract_number,
                request.amount,
                Currency::EUR,
                request.action.unwrap_or_default(),
            )
        },
        order: full_order(reference, request.amount, now),
        wallet_id: request.wallet_id.clone(),
        scheduled_date: format_day(&request.scheduled_date),
        private_data_list: Empty {},
        authentication_3d_secure: Empty {},
        sub_merchant: Empty {},
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPaymentBody {
    pub payment: Payment,
    pub order: Order,
    pub wallet_id: String,
}

/// `doImmediateWalletPayment` as a one-step payment.
pub fn wallet_payment_body(
    contract_number: &str,
    wallet_id: &str,
    amount: u64,
    currency: Currency,
    now: &NaiveDateTime,
    reference: String,
) -> WalletPaymentBody {
    WalletPaymentBody {
        payment: payment(contract_number, amount, currency, Action::Payment),
        order: short_order(reference, amount, currency, now),
        wallet_id: wallet_id.to_string(),
    }
}

// ============================================================================
// Payment records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecordBody {
    pub contract_number: String,
    pub payment_record_id: String,
}

/// `getPaymentRecord` / `disablePaymentRecord`
pub fn payment_record_body(contract_number: &str, payment_record_id: &str) -> PaymentRecordBody {
    PaymentRecordBody {
        contract_number: contract_number.to_string(),
        payment_record_id: payment_record_id.to_string(),
    }
}

// ============================================================================
// Direct payments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationBody {
    pub payment: Payment,
    pub order: Order,
    pub card: Card,
}

/// `doAuthorization`
pub fn authorization_body(
    contract_number: &str,
    reference: String,
    card: &Card,
    amount: u64,
    currency: Currency,
    now: &NaiveDateTime,
) -> AuthorizationBody {
    AuthorizationBody {
        payment: payment(contract_number, amount, currency, Action::Authorization),
        order: short_order(reference, amount, currency, now),
        card: card.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPaymentBody {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    pub payment: Payment,
}

/// `doCapture`
pub fn capture_body(
    contract_number: &str,
    transaction_id: &str,
    amount: u64,
    currency: Currency,
) -> TransactionPaymentBody {
    TransactionPaymentBody {
        transaction_id: transaction_id.to_string(),
        payment: payment(contract_number, amount, currency, Action::Validation),
    }
}

/// `doRefund`; sent with the capture action code.
pub fn refund_body(
    contract_number: &str,
    transaction_id: &str,
    amount: u64,
    currency: Currency,
) -> TransactionPaymentBody {
    capture_body(contract_number, transaction_id, amount, currency)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetBody {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// `doReset`
pub fn reset_body(transaction_id: &str, comment: Option<&str>) -> ResetBody {
    ResetBody {
        transaction_id: transaction_id.to_string(),
        comment: comment.map(str::to_string),
    }
}

// ============================================================================
// Web payments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPaymentBody {
    pub version: u32,
    pub payment: Payment,
    #[serde(rename = "returnURL")]
    pub return_url: String,
    #[serde(rename = "cancelURL")]
    pub cancel_url: String,
    pub order: Order,
    #[serde(rename = "notificationURL", skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    pub selected_contract_list: Vec<SelectedContract>,
    pub update_personal_details: u8,
    pub buyer: Buyer,
    pub owner: Owner,
    pub security_mode: String,
}

/// `doWebPayment`; a missing amount is 100.
pub fn web_payment_body(
    contract_number: &str,
    request: &WebPaymentRequest,
    now: &NaiveDateTime,
    reference: String,
) -> WebPaymentBody {
    let defaults = default_web_body();
    let amount = request
        .amount
        .unwrap_or(crate::money::DEFAULT_WEB_PAYMENT_AMOUNT);

    WebPaymentBody {
        version: defaults.version,
        payment: payment(contract_number, amount, Currency::EUR, Action::Authorization),
        return_url: request.redirect_url.clone(),
        cancel_url: request.redirect_url.clone(),
        order: full_order(reference, amount, now),
        notification_url: request.notification_url.clone(),
        selected_contract_list: vec![SelectedContract {
            selected_contract: contract_number.to_string(),
        }],
        update_personal_details: defaults.update_personal_details,
        buyer: wallet_buyer(
            &request.wallet_id,
            &request.first_name,
            &request.last_name,
            &request.email,
        ),
        owner: defaults.owner,
        security_mode: SECURITY_MODE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebPaymentDetailsBody {
    pub version: u32,
    pub token: String,
}

/// `getWebPaymentDetails`
pub fn web_payment_details_body(token: &str) -> WebPaymentDetailsBody {
    WebPaymentDetailsBody {
        version: API_VERSION,
        token: token.to_string(),
    }
}
