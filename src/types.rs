//! Request and response data structures
//!
//! Field order follows the gateway schema; `None` fields are left out of
//! the request document. Nested address blocks are always present, even
//! empty, because the gateway rejects requests where they are missing.

use chrono::NaiveDateTime;
use secrecy::SecretString;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PaylineError, PaylineResult};
use crate::money::Currency;
use crate::result::GatewayResult;

/// Message for an incomplete credential triple.
pub const MISSING_CREDENTIALS: &str = "All of user / pass / contractNumber should be defined";

/// Merchant credentials
///
/// The access key is never printed by `Debug`.
#[derive(Debug)]
pub struct Credentials {
    merchant_id: String,
    access_key: SecretString,
    contract_number: String,
}

impl Credentials {
    /// Build a credential triple. Every part must be non-empty.
    pub fn new(
        merchant_id: impl Into<String>,
        access_key: impl Into<String>,
        contract_number: impl Into<String>,
    ) -> PaylineResult<Self> {
        let merchant_id = merchant_id.into();
        let access_key = access_key.into();
        let contract_number = contract_number.into();

        if merchant_id.is_empty() || access_key.is_empty() || contract_number.is_empty() {
            return Err(PaylineError::Config(MISSING_CREDENTIALS.to_string()));
        }

        Ok(Self {
            merchant_id,
            access_key: SecretString::new(access_key.into_boxed_str()),
            contract_number,
        })
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn access_key(&self) -> &SecretString {
        &self.access_key
    }

    pub fn contract_number(&self) -> &str {
        &self.contract_number
    }
}

/// Placeholder for nested blocks the schema requires but we leave empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// Payment action codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Hold the amount without capturing it
    #[default]
    Authorization,
    /// Authorization and capture in one step
    Payment,
    /// Capture of a prior authorization
    Validation,
}

impl Action {
    pub fn code(&self) -> u16 {
        match self {
            Self::Authorization => 100,
            Self::Payment => 101,
            Self::Validation => 201,
        }
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

/// Payment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Full payment
    #[default]
    #[serde(rename = "CPT")]
    Full,
    /// Deferred payment
    #[serde(rename = "DIF")]
    Deferred,
}

/// Card details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub number: String,
    /// Card brand as the gateway names it (`CB`, `VISA`, `MASTERCARD`, ...)
    #[serde(rename = "type")]
    pub card_type: String,
    /// `MMYY`
    pub expiration_date: String,
    pub cvx: String,
}

impl Card {
    pub fn new(
        number: impl Into<String>,
        card_type: impl Into<String>,
        expiration_date: impl Into<String>,
        cvx: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            card_type: card_type.into(),
            expiration_date: expiration_date.into(),
            cvx: cvx.into(),
        }
    }
}

/// Postal address of a buyer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Buyer block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// Billing address of a card owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Card owner block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub billing_address: OwnerAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_card_date: Option<String>,
}

/// Payment block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Minor units
    pub amount: u64,
    pub currency: Currency,
    pub action: Action,
    pub mode: Mode,
    pub contract_number: String,
    /// `DD/MM/YY`, deferred payments only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differed_action_date: Option<String>,
}

/// Order block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Minor units
    pub amount: u64,
    pub currency: Currency,
    /// `DD/MM/YYYY HH:mm`
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_mode: Option<String>,
}

/// Wallet block sent on wallet creation and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub wallet_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub card: Card,
}

/// Entry of `selectedContractList`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedContract {
    pub selected_contract: String,
}

// ============================================================================
// Operation inputs
// ============================================================================

/// Input of the hosted wallet management page
#[derive(Debug, Clone, Default)]
pub struct WebWalletRequest {
    pub wallet_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Return and cancel URL
    pub url: String,
}

impl WebWalletRequest {
    pub fn new(wallet_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn buyer(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self.email = Some(email.into());
        self
    }
}

/// Input of an immediate wallet payment
#[derive(Debug, Clone, Default)]
pub struct ImmediateWalletPaymentRequest {
    pub wallet_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Minor units
    pub amount: u64,
    /// Defaults to full payment
    pub mode: Option<Mode>,
    /// Required for deferred payments
    pub differed_action_date: Option<NaiveDateTime>,
    /// Defaults to authorization
    pub action: Option<Action>,
}

impl ImmediateWalletPaymentRequest {
    pub fn new(wallet_id: impl Into<String>, amount: u64) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            amount,
            ..Default::default()
        }
    }

    pub fn buyer(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self.email = Some(email.into());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Defer the action to the given date
    pub fn deferred(mut self, date: NaiveDateTime) -> Self {
        self.mode = Some(Mode::Deferred);
        self.differed_action_date = Some(date);
        self
    }
}

/// Input of a scheduled wallet payment
#[derive(Debug, Clone)]
pub struct ScheduledWalletPaymentRequest {
    pub wallet_id: String,
    /// Minor units
    pub amount: u64,
    /// Day the payment is scheduled for
    pub scheduled_date: NaiveDateTime,
    pub action: Option<Action>,
    pub mode: Option<Mode>,
}

impl ScheduledWalletPaymentRequest {
    pub fn new(wallet_id: impl Into<String>, amount: u64, scheduled_date: NaiveDateTime) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            amount,
            scheduled_date,
            action: None,
            mode: None,
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
}

/// Input of a hosted web payment
#[derive(Debug, Clone, Default)]
pub struct WebPaymentRequest {
    /// Minor units, defaults to 100 when absent
    pub amount: Option<u64>,
    pub wallet_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Return and cancel URL
    pub redirect_url: String,
    pub notification_url: Option<String>,
}

impl WebPaymentRequest {
    pub fn new(wallet_id: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            redirect_url: redirect_url.into(),
            ..Default::default()
        }
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the amount from caller text; unparsable text means 100.
    pub fn amount_text(mut self, text: &str) -> Self {
        self.amount = Some(crate::money::parse_amount(text));
        self
    }

    pub fn buyer(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self.email = Some(email.into());
        self
    }

    pub fn notification_url(mut self, url: impl Into<String>) -> Self {
        self.notification_url = Some(url.into());
        self
    }
}

// ============================================================================
// Operation outputs
// ============================================================================

/// Wallet created or updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRef {
    pub wallet_id: String,
}

/// Transaction created by an authorization, capture or payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRef {
    pub transaction_id: String,
}

/// Transaction block of a response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub id: String,
    pub date: Option<String>,
    pub is_duplicated: Option<String>,
    pub is_possible_fraud: Option<String>,
}

/// Empty elements decode to `""`; treat them like absent ones.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(value) => T::deserialize(value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Response of authorization, capture and payment operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransactionResponse {
    pub result: GatewayResult,
    #[serde(deserialize_with = "empty_as_none")]
    pub transaction: Option<Transaction>,
}

/// Card as the gateway returns it, number masked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardDetails {
    pub number: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
    pub expiration_date: Option<String>,
}

/// Wallet as the gateway returns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletDetails {
    pub wallet_id: String,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub card: Option<CardDetails>,
}

/// Response of `getWallet`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GetWalletResponse {
    pub result: GatewayResult,
    #[serde(deserialize_with = "empty_as_none")]
    pub wallet: Option<WalletDetails>,
}
