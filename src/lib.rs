//! Payline payment gateway client
//!
//! Wallets, authorizations, captures, resets, refunds, hosted web payments
//! and payment records over the Payline SOAP API.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        PaylineClient                          │
//! │  create_wallet | validate_card | do_capture | do_web_payment  │
//! └──────────────────────────────────────────────────────────────┘
//!        │ request builders              ▲ classification
//!        ▼                               │ (result.code)
//! ┌──────────────────────────────────────────────────────────────┐
//! │          Connector ──(once)──▶ Transport::invoke              │
//! └──────────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │        payline-soap: WSDL, envelopes, basic auth, hooks       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use payline::{Card, Currency, PaylineClient};
//!
//! # tokio_test::block_on(async {
//! let client = PaylineClient::new("merchant", "access-key", "1234567")?;
//!
//! let card = Card::new("4970100000000000", "CB", "1230", "123");
//! client.create_wallet("wallet-42", &card).await?;
//!
//! let payment = client
//!     .make_wallet_payment("wallet-42", 2999, Currency::EUR)
//!     .await?;
//! println!("transaction {}", payment.transaction_id);
//! # Ok::<(), payline::PaylineError>(())
//! # });
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod money;
pub mod request;
pub mod result;
pub mod types;

pub use client::PaylineClient;
pub use config::{PaylineConfig, PaylineConfigBuilder};
pub use connection::{Connector, SoapConnector, Transport, TransportError};
pub use error::*;
pub use money::{Currency, CURRENCIES};
pub use result::{GatewayResponse, GatewayResult};
pub use types::*;

pub use payline_soap::{Document, WsdlSource};

/// Prelude for common imports
pub mod prelude {
    pub use crate::client::PaylineClient;
    pub use crate::config::PaylineConfig;
    pub use crate::error::{PaylineError, PaylineResult};
    pub use crate::money::Currency;
    pub use crate::result::{GatewayResponse, GatewayResult};
    pub use crate::types::{
        Action, Card, ImmediateWalletPaymentRequest, Mode, ScheduledWalletPaymentRequest,
        WebPaymentRequest, WebWalletRequest,
    };
}
