//! Gateway client

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::config::PaylineConfig;
use crate::connection::{Connector, SoapConnector, Transport};
use crate::error::{PaylineError, PaylineResult};
use crate::money::{clamp_to_minimum, Currency, CURRENCIES};
use crate::request::{self, CARD_VALIDATION_COMMENT};
use crate::result::{classify, classify_as, GatewayResponse, GatewayResult};
use crate::types::{
    Card, Credentials, GetWalletResponse, ImmediateWalletPaymentRequest,
    ScheduledWalletPaymentRequest, TransactionRef, TransactionResponse, WalletRef,
    WebPaymentRequest, WebWalletRequest,
};
use crate::Document;

/// Payline gateway client.
///
/// The connection is opened on first use and shared by every later call,
/// concurrent callers included. Callers waiting on a handshake share its
/// outcome, failure included; a call made after a failure tries again.
pub struct PaylineClient<C: Connector = SoapConnector> {
    credentials: Credentials,
    connector: C,
    connection: OnceCell<C::Connection>,
    /// Held for the length of a handshake.
    last_failure: Mutex<Option<PaylineError>>,
    failed_handshakes: AtomicU64,
}

impl PaylineClient<SoapConnector> {
    /// Create a client on the bundled service description.
    ///
    /// Fails when any of the three parts is empty.
    pub fn new(
        merchant_id: impl Into<String>,
        access_key: impl Into<String>,
        contract_number: impl Into<String>,
    ) -> PaylineResult<Self> {
        let credentials = Credentials::new(merchant_id, access_key, contract_number)?;
        Ok(Self::with_connector(credentials, SoapConnector::default()))
    }

    /// Create a client from a configuration.
    pub fn with_config(config: PaylineConfig) -> Self {
        let connector = config.connector();
        Self::with_connector(config.credentials, connector)
    }
}

impl<C: Connector> PaylineClient<C> {
    /// Currency table, alphabetic code to ISO 4217 numeric code.
    pub const CURRENCIES: [(&'static str, u16); 3] = CURRENCIES;

    /// Create a client over any connector.
    pub fn with_connector(credentials: Credentials, connector: C) -> Self {
        Self {
            credentials,
            connector,
            connection: OnceCell::new(),
            last_failure: Mutex::new(None),
            failed_handshakes: AtomicU64::new(0),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn contract_number(&self) -> &str {
        self.credentials.contract_number()
    }

    /// Get the shared connection, opening it on first use.
    ///
    /// At most one handshake runs at a time. Callers that arrive while it
    /// runs get its connection or its error.
    pub async fn initialize(&self) -> PaylineResult<&C::Connection> {
        if let Some(connection) = self.connection.get() {
            return Ok(connection);
        }

        let seen = self.failed_handshakes.load(Ordering::Acquire);
        let mut last_failure = self.last_failure.lock().await;

        if let Some(connection) = self.connection.get() {
            return Ok(connection);
        }
        if self.failed_handshakes.load(Ordering::Acquire) != seen
            && let Some(err) = last_failure.as_ref()
        {
            return Err(err.clone());
        }

        debug!(merchant_id = self.credentials.merchant_id(), "Opening gateway connection");
        match self.connector.connect(&self.credentials).await {
            Ok(connection) => {
                *last_failure = None;
                Ok(self.connection.get_or_init(|| async { connection }).await)
            }
            Err(err) => {
                debug!(error = %err, "Gateway handshake failed");
                *last_failure = Some(err.clone());
                self.failed_handshakes.fetch_add(1, Ordering::Release);
                Err(err)
            }
        }
    }

    async fn invoke<T: Serialize>(&self, operation: &str, body: &T) -> PaylineResult<Document> {
        let document = request::to_document(body)?;
        let connection = self.initialize().await?;
        debug!(operation, "Invoking gateway operation");
        connection.invoke(operation, document).await.map_err(|err| {
            debug!(operation, error = %err, "Gateway call failed");
            PaylineError::from(err)
        })
    }

    // ========================================================================
    // Wallets
    // ========================================================================

    /// Register a card under a wallet id.
    pub async fn create_wallet(&self, wallet_id: &str, card: &Card) -> PaylineResult<WalletRef> {
        self.create_or_update_wallet(wallet_id, card, false).await
    }

    /// Replace the card of an existing wallet.
    pub async fn update_wallet(&self, wallet_id: &str, card: &Card) -> PaylineResult<WalletRef> {
        self.create_or_update_wallet(wallet_id, card, true).await
    }

    /// `updateWallet` when `update` is set, `createWallet` otherwise.
    pub async fn create_or_update_wallet(
        &self,
        wallet_id: &str,
        card: &Card,
        update: bool,
    ) -> PaylineResult<WalletRef> {
        let operation = if update { "updateWallet" } else { "createWallet" };
        let body = request::wallet_body(self.contract_number(), wallet_id, card);

        classify(self.invoke(operation, &body).await?)?;
        Ok(WalletRef {
            wallet_id: wallet_id.to_string(),
        })
    }

    /// Fetch a wallet.
    pub async fn get_wallet(&self, wallet_id: &str) -> PaylineResult<GetWalletResponse> {
        let body = request::get_wallet_body(self.contract_number(), wallet_id);
        classify_as(self.invoke("getWallet", &body).await?)
    }

    /// Open the hosted wallet page; returns the URL to redirect the buyer to.
    pub async fn create_web_wallet(&self, request: &WebWalletRequest) -> PaylineResult<String> {
        self.manage_web_wallet(request).await
    }

    /// Open the hosted wallet page; returns the URL to redirect the buyer to.
    pub async fn manage_web_wallet(&self, request: &WebWalletRequest) -> PaylineResult<String> {
        let body = request::web_wallet_body(self.contract_number(), request);
        let response = classify(self.invoke("manageWebWallet", &body).await?)?;

        response
            .redirect_url()
            .map(str::to_string)
            .ok_or_else(|| PaylineError::Serialization("response has no redirectURL".to_string()))
    }

    // ========================================================================
    // Wallet payments
    // ========================================================================

    pub async fn do_immediate_wallet_payment(
        &self,
        request: &ImmediateWalletPaymentRequest,
    ) -> PaylineResult<GatewayResponse> {
        let body =
            request::immediate_wallet_payment_body(self.contract_number(), request, &request::now())?;
        classify(self.invoke("doImmediateWalletPayment", &body).await?)
    }

    pub async fn do_scheduled_wallet_payment(
        &self,
        request: &ScheduledWalletPaymentRequest,
    ) -> PaylineResult<GatewayResponse> {
        let body = request::scheduled_wallet_payment_body(
            self.contract_number(),
            request,
            &request::now(),
            request::scheduled_reference(&request.wallet_id),
        );
        classify(self.invoke("doScheduledWalletPayment", &body).await?)
    }

    /// Charge a wallet in one step (authorization and capture).
    pub async fn make_wallet_payment(
        &self,
        wallet_id: &str,
        amount: u64,
        currency: Currency,
    ) -> PaylineResult<TransactionRef> {
        let body = request::wallet_payment_body(
            self.contract_number(),
            wallet_id,
            amount,
            currency,
            &request::now(),
            request::order_reference(),
        );
        transaction_ref(self.invoke("doImmediateWalletPayment", &body).await?)
    }

    // ========================================================================
    // Payment records
    // ========================================================================

    /// Look up a payment record. The result code is not checked.
    pub async fn get_payment_record(&self, payment_record_id: &str) -> PaylineResult<GatewayResponse> {
        let body = request::payment_record_body(self.contract_number(), payment_record_id);
        Ok(GatewayResponse::new(self.invoke("getPaymentRecord", &body).await?))
    }

    /// Disable a payment record. The result code is not checked.
    pub async fn disable_payment_record(
        &self,
        payment_record_id: &str,
    ) -> PaylineResult<GatewayResponse> {
        let body = request::payment_record_body(self.contract_number(), payment_record_id);
        Ok(GatewayResponse::new(self.invoke("disablePaymentRecord", &body).await?))
    }

    // ========================================================================
    // Direct payments
    // ========================================================================

    /// Check that a card can be charged.
    ///
    /// Authorizes at least 100 minor units, then resets the authorization.
    /// A declined authorization yields `false` and nothing is reset. The
    /// reset outcome is logged, never returned.
    pub async fn validate_card(
        &self,
        card: &Card,
        try_amount: u64,
        currency: Currency,
    ) -> PaylineResult<bool> {
        let amount = clamp_to_minimum(try_amount);
        let body = request::authorization_body(
            self.contract_number(),
            request::order_reference(),
            card,
            amount,
            currency,
            &request::now(),
        );
        let response = GatewayResponse::new(self.invoke("doAuthorization", &body).await?);

        if !response.is_successful() {
            debug!(code = %response.result.code, "Card validation declined");
            return Ok(false);
        }

        let Some(transaction_id) = response.transaction_id() else {
            warn!("Card validation authorized without a transaction id, nothing to reset");
            return Ok(true);
        };

        match self.reset(transaction_id, Some(CARD_VALIDATION_COMMENT)).await {
            Ok(result) if !result.is_successful() => {
                warn!(transaction_id, code = %result.code, "Card validation reset declined");
            }
            Err(err) => warn!(transaction_id, error = %err, "Card validation reset failed"),
            Ok(_) => {}
        }
        Ok(true)
    }

    /// Hold an amount on a card.
    pub async fn do_authorization(
        &self,
        reference: &str,
        card: &Card,
        amount: u64,
        currency: Currency,
    ) -> PaylineResult<TransactionRef> {
        let body = request::authorization_body(
            self.contract_number(),
            reference.to_string(),
            card,
            amount,
            currency,
            &request::now(),
        );
        transaction_ref(self.invoke("doAuthorization", &body).await?)
    }

    /// Capture an authorization.
    pub async fn do_capture(
        &self,
        transaction_id: &str,
        amount: u64,
        currency: Currency,
    ) -> PaylineResult<TransactionRef> {
        let body = request::capture_body(self.contract_number(), transaction_id, amount, currency);
        transaction_ref(self.invoke("doCapture", &body).await?)
    }

    /// Cancel an uncaptured authorization. The result code is not checked.
    pub async fn do_reset(&self, transaction_id: &str) -> PaylineResult<GatewayResult> {
        self.reset(transaction_id, None).await
    }

    async fn reset(&self, transaction_id: &str, comment: Option<&str>) -> PaylineResult<GatewayResult> {
        let body = request::reset_body(transaction_id, comment);
        let response = self.invoke("doReset", &body).await?;
        Ok(GatewayResult::from_response(&response))
    }

    /// Refund a captured transaction. The result code is not checked.
    pub async fn do_refund(
        &self,
        transaction_id: &str,
        amount: u64,
        currency: Currency,
    ) -> PaylineResult<GatewayResult> {
        let body = request::refund_body(self.contract_number(), transaction_id, amount, currency);
        let response = self.invoke("doRefund", &body).await?;
        Ok(GatewayResult::from_response(&response))
    }

    // ========================================================================
    // Web payments
    // ========================================================================

    /// Start a hosted payment; the response carries `token` and `redirectURL`.
    pub async fn do_web_payment(&self, request: &WebPaymentRequest) -> PaylineResult<GatewayResponse> {
        let now = request::now();
        let reference =
            request::web_reference(&request.wallet_id, chrono::Utc::now().timestamp_millis());
        let body = request::web_payment_body(self.contract_number(), request, &now, reference);
        classify(self.invoke("doWebPayment", &body).await?)
    }

    /// Get the outcome of a hosted payment.
    pub async fn get_web_payment_details(&self, token: &str) -> PaylineResult<GatewayResponse> {
        let body = request::web_payment_details_body(token);
        classify(self.invoke("getWebPaymentDetails", &body).await?)
    }
}

fn transaction_ref(response: Document) -> PaylineResult<TransactionRef> {
    let response: TransactionResponse = classify_as(response)?;
    response
        .transaction
        .map(|transaction| TransactionRef {
            transaction_id: transaction.id,
        })
        .ok_or_else(|| PaylineError::Serialization("response has no transaction".to_string()))
}

impl<C: Connector> std::fmt::Debug for PaylineClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaylineClient")
            .field("credentials", &self.credentials)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}
