//! Integration tests for gateway client workflows.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{client, credentials, MockGateway};
use payline::*;
use serde_json::json;
use tokio::sync::Barrier;
use tokio::task::JoinSet;

fn card() -> Card {
    Card::new("4970100000000000", "CB", "1230", "123")
}

// =============================================================================
// Construction and connection
// =============================================================================

#[test]
fn test_construction_requires_every_credential() {
    for (user, pass, contract) in [
        ("", "key", "1234567"),
        ("merchant", "", "1234567"),
        ("merchant", "key", ""),
    ] {
        let err = PaylineClient::new(user, pass, contract).unwrap_err();
        assert!(matches!(err, PaylineError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: All of user / pass / contractNumber should be defined"
        );
    }

    assert!(PaylineClient::new("merchant", "key", "1234567").is_ok());
}

#[test]
fn test_currency_table_on_client() {
    assert_eq!(
        PaylineClient::<SoapConnector>::CURRENCIES,
        [("EUR", 978), ("USD", 840), ("GBP", 826)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_initialize_performs_one_handshake() {
    let gateway = MockGateway::new();
    gateway.delay_connect(Duration::from_millis(50));
    let client = Arc::new(PaylineClient::with_connector(credentials(), gateway.clone()));

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let client = Arc::clone(&client);
        tasks.spawn(async move { client.initialize().await.map(|connection| connection.id) });
    }

    let mut ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        ids.push(joined.unwrap().unwrap());
    }

    assert_eq!(gateway.connects(), 1);
    assert_eq!(ids.len(), 16);
    assert!(ids.iter().all(|id| *id == 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_failed_handshake() {
    let gateway = MockGateway::new();
    gateway.fail_connects(100);
    gateway.delay_connect(Duration::from_millis(50));
    let client = Arc::new(PaylineClient::with_connector(credentials(), gateway.clone()));
    let barrier = Arc::new(Barrier::new(8));

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let client = Arc::clone(&client);
        let barrier = Arc::clone(&barrier);
        tasks.spawn(async move {
            barrier.wait().await;
            client.initialize().await.map(|connection| connection.id)
        });
    }

    let mut errors = 0;
    while let Some(joined) = tasks.join_next().await {
        let err = joined.unwrap().unwrap_err();
        assert!(matches!(err, PaylineError::Connection(ref message) if message == "description unavailable"));
        errors += 1;
    }

    assert_eq!(errors, 8);
    assert_eq!(gateway.connects(), 1);

    // A call made after the failure starts a fresh handshake.
    assert!(client.initialize().await.is_err());
    assert_eq!(gateway.connects(), 2);
}

#[tokio::test]
async fn test_sequential_calls_reuse_connection() {
    let (client, gateway) = client();

    client.do_reset("T1").await.unwrap();
    client.do_reset("T2").await.unwrap();
    let connection = client.initialize().await.unwrap();

    assert_eq!(connection.id, 1);
    assert_eq!(gateway.connects(), 1);
}

#[tokio::test]
async fn test_failed_handshake_is_retried_by_next_call() {
    let (client, gateway) = client();
    gateway.fail_connects(1);

    let err = client.do_reset("T1").await.unwrap_err();
    assert!(matches!(err, PaylineError::Connection(_)));
    assert!(gateway.calls().is_empty());

    client.do_reset("T1").await.unwrap();
    assert_eq!(gateway.connects(), 2);
    assert_eq!(gateway.operations(), ["doReset"]);
}

// =============================================================================
// Classification and error mapping
// =============================================================================

#[tokio::test]
async fn test_success_codes_are_accepted() {
    let (client, gateway) = client();
    gateway.respond("createWallet", "00000", json!({}));
    gateway.respond("createWallet", "02500", json!({}));

    assert_eq!(client.create_wallet("W1", &card()).await.unwrap().wallet_id, "W1");
    assert_eq!(client.create_wallet("W2", &card()).await.unwrap().wallet_id, "W2");
}

#[tokio::test]
async fn test_other_codes_are_declined_with_full_response() {
    let (client, gateway) = client();
    gateway.respond(
        "doImmediateWalletPayment",
        "99999",
        json!({ "transaction": { "id": "T9" } }),
    );

    let err = client
        .do_immediate_wallet_payment(&ImmediateWalletPaymentRequest::new("W1", 1000))
        .await
        .unwrap_err();

    let declined = err.declined().unwrap();
    assert_eq!(declined.result.code, "99999");
    assert_eq!(
        declined.response,
        json!({
            "result": { "code": "99999", "shortMessage": "REFUSED" },
            "transaction": { "id": "T9" }
        })
    );
    assert_eq!(err.short_message(), "REFUSED");
}

#[tokio::test]
async fn test_unauthorized_status_is_credentials_error() {
    let (client, gateway) = client();
    gateway.fail("getWallet", 401);

    let err = client.get_wallet("W1").await.unwrap_err();

    assert!(matches!(err, PaylineError::Credentials));
    assert_eq!(err.short_message(), "Wrong API credentials");
}

#[tokio::test]
async fn test_other_status_is_call_error() {
    let (client, gateway) = client();
    for status in [400, 403, 404, 500, 502] {
        gateway.fail("getWallet", status);

        let err = client.get_wallet("W1").await.unwrap_err();

        assert!(matches!(err, PaylineError::Call));
        assert_eq!(err.short_message(), "Wrong API call");
    }
}

#[tokio::test]
async fn test_fault_is_call_error() {
    let (client, gateway) = client();
    gateway.reply(
        "doCapture",
        Err(TransportError::Fault {
            code: "soap:Client".into(),
            message: "Unmarshalling Error".into(),
        }),
    );

    let err = client.do_capture("T1", 500, Currency::EUR).await.unwrap_err();
    assert_eq!(err.short_message(), "Wrong API call");
}

// =============================================================================
// Card validation
// =============================================================================

#[tokio::test]
async fn test_validate_card_clamps_amount_to_floor() {
    let (client, gateway) = client();

    for try_amount in [0, 1, 99] {
        gateway.respond("doAuthorization", "99999", json!({}));
        assert!(!client.validate_card(&card(), try_amount, Currency::EUR).await.unwrap());
    }

    assert_eq!(gateway.calls().len(), 3);
    for (_, request) in gateway.calls() {
        assert_eq!(request["payment"]["amount"], 100);
        assert_eq!(request["order"]["amount"], 100);
    }
}

#[tokio::test]
async fn test_validate_card_keeps_larger_amount() {
    let (client, gateway) = client();
    gateway.respond("doAuthorization", "99999", json!({}));

    client.validate_card(&card(), 250, Currency::GBP).await.unwrap();

    let request = gateway.request(0);
    assert_eq!(request["payment"]["amount"], 250);
    assert_eq!(request["payment"]["currency"], 826);
    assert_eq!(request["payment"]["action"], 100);
}

#[tokio::test]
async fn test_validate_card_resets_authorization() {
    let (client, gateway) = client();
    gateway.respond("doAuthorization", "00000", json!({ "transaction": { "id": "T1" } }));

    assert!(client.validate_card(&card(), 100, Currency::EUR).await.unwrap());

    assert_eq!(gateway.operations(), ["doAuthorization", "doReset"]);
    assert_eq!(
        gateway.request(1),
        json!({ "transactionID": "T1", "comment": "Card validation cleanup" })
    );
}

#[tokio::test]
async fn test_validate_card_ignores_reset_outcome() {
    let (client, gateway) = client();
    gateway.respond("doAuthorization", "00000", json!({ "transaction": { "id": "T1" } }));
    gateway.fail("doReset", 500);

    assert!(client.validate_card(&card(), 100, Currency::EUR).await.unwrap());

    gateway.respond("doAuthorization", "02500", json!({ "transaction": { "id": "T2" } }));
    gateway.respond("doReset", "99999", json!({}));

    assert!(client.validate_card(&card(), 100, Currency::EUR).await.unwrap());
    assert_eq!(
        gateway.operations(),
        ["doAuthorization", "doReset", "doAuthorization", "doReset"]
    );
}

#[tokio::test]
async fn test_validate_card_decline_skips_reset() {
    let (client, gateway) = client();
    gateway.respond("doAuthorization", "01116", json!({}));

    assert!(!client.validate_card(&card(), 100, Currency::EUR).await.unwrap());
    assert_eq!(gateway.operations(), ["doAuthorization"]);
}

#[tokio::test]
async fn test_validate_card_transport_failure_propagates() {
    let (client, gateway) = client();
    gateway.fail("doAuthorization", 401);

    let err = client.validate_card(&card(), 100, Currency::EUR).await.unwrap_err();
    assert!(matches!(err, PaylineError::Credentials));
}

// =============================================================================
// Wallets
// =============================================================================

#[tokio::test]
async fn test_create_and_update_wallet_operations() {
    let (client, gateway) = client();

    client.create_wallet("W1", &card()).await.unwrap();
    client.update_wallet("W1", &card()).await.unwrap();
    client.create_or_update_wallet("W1", &card(), true).await.unwrap();

    assert_eq!(gateway.operations(), ["createWallet", "updateWallet", "updateWallet"]);
    assert_eq!(
        gateway.request(0),
        json!({
            "contractNumber": "1234567",
            "wallet": {
                "walletId": "W1",
                "card": { "number": "4970100000000000", "type": "CB", "expirationDate": "1230", "cvx": "123" }
            }
        })
    );
}

#[tokio::test]
async fn test_get_wallet_returns_wallet() {
    let (client, gateway) = client();
    gateway.respond(
        "getWallet",
        "02500",
        json!({
            "wallet": {
                "walletId": "W1",
                "lastName": "Lovelace",
                "card": { "number": "497010XXXXXX0000", "type": "CB", "expirationDate": "1230" }
            }
        }),
    );

    let response = client.get_wallet("W1").await.unwrap();

    assert!(response.result.is_successful());
    let wallet = response.wallet.unwrap();
    assert_eq!(wallet.wallet_id, "W1");
    assert_eq!(wallet.last_name.as_deref(), Some("Lovelace"));
    assert_eq!(wallet.card.unwrap().card_type.as_deref(), Some("CB"));
    assert_eq!(gateway.request(0), json!({ "contractNumber": "1234567", "walletId": "W1" }));
}

#[tokio::test]
async fn test_manage_web_wallet_returns_redirect_url() {
    let (client, gateway) = client();
    gateway.respond(
        "manageWebWallet",
        "00000",
        json!({ "token": "tok", "redirectURL": "https://pay.example/wallet/tok" }),
    );

    let request = WebWalletRequest::new("W1", "https://shop.example/account")
        .buyer("Ada", "Lovelace", "ada@example.com");
    let url = client.create_web_wallet(&request).await.unwrap();

    assert_eq!(url, "https://pay.example/wallet/tok");
    let body = gateway.request(0);
    assert_eq!(body["contractNumber"], "1234567");
    assert_eq!(body["selectedContractList"], json!([{ "selectedContract": "1234567" }]));
    assert_eq!(body["buyer"]["walletId"], "W1");
    assert_eq!(body["buyer"]["email"], "ada@example.com");
    assert_eq!(body["returnURL"], "https://shop.example/account");
}

#[tokio::test]
async fn test_manage_web_wallet_decline_carries_gateway_result() {
    let (client, gateway) = client();
    gateway.respond("manageWebWallet", "02303", json!({}));

    let err = client
        .manage_web_wallet(&WebWalletRequest::new("W1", "https://shop.example"))
        .await
        .unwrap_err();

    assert_eq!(err.declined().unwrap().result.code, "02303");
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn test_make_wallet_payment() {
    let (client, gateway) = client();
    gateway.respond(
        "doImmediateWalletPayment",
        "00000",
        json!({ "transaction": { "id": "T42" } }),
    );

    let payment = client.make_wallet_payment("W1", 2999, Currency::USD).await.unwrap();

    assert_eq!(payment.transaction_id, "T42");
    let body = gateway.request(0);
    assert_eq!(body["payment"]["action"], 101);
    assert_eq!(body["payment"]["currency"], 840);
    assert_eq!(body["walletId"], "W1");
    assert!(body["order"]["ref"].as_str().unwrap().starts_with("order_"));
}

#[tokio::test]
async fn test_successful_payment_without_transaction() {
    let (client, gateway) = client();
    gateway.respond("doAuthorization", "00000", json!({}));

    let err = client
        .do_authorization("REF-1", &card(), 1000, Currency::EUR)
        .await
        .unwrap_err();

    assert!(matches!(err, PaylineError::Serialization(_)));
}

#[tokio::test]
async fn test_do_authorization_and_capture() {
    let (client, gateway) = client();
    gateway.respond("doAuthorization", "00000", json!({ "transaction": { "id": "T1" } }));
    gateway.respond("doCapture", "00000", json!({ "transaction": { "id": "T2" } }));

    let authorization = client
        .do_authorization("REF-1", &card(), 1000, Currency::EUR)
        .await
        .unwrap();
    let capture = client
        .do_capture(&authorization.transaction_id, 1000, Currency::EUR)
        .await
        .unwrap();

    assert_eq!(authorization.transaction_id, "T1");
    assert_eq!(capture.transaction_id, "T2");
    assert_eq!(gateway.request(0)["order"]["ref"], "REF-1");
    assert_eq!(gateway.request(1)["transactionID"], "T1");
    assert_eq!(gateway.request(1)["payment"]["action"], 201);
}

#[tokio::test]
async fn test_reset_and_refund_are_unclassified() {
    let (client, gateway) = client();
    gateway.respond("doReset", "99999", json!({}));
    gateway.respond("doRefund", "02501", json!({}));

    let reset = client.do_reset("T1").await.unwrap();
    let refund = client.do_refund("T1", 500, Currency::EUR).await.unwrap();

    assert_eq!(reset.code, "99999");
    assert!(!reset.is_successful());
    assert_eq!(refund.code, "02501");
    assert_eq!(gateway.request(0), json!({ "transactionID": "T1" }));
    assert_eq!(gateway.request(1)["payment"]["action"], 201);
}

#[tokio::test]
async fn test_scheduled_wallet_payment() {
    let (client, gateway) = client();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let response = client
        .do_scheduled_wallet_payment(&ScheduledWalletPaymentRequest::new("W1", 1200, date))
        .await
        .unwrap();

    assert!(response.is_successful());
    let body = gateway.request(0);
    assert_eq!(body["scheduledDate"], "29/02/2024");
    assert_eq!(body["version"], 20);
    assert!(body["order"]["ref"].as_str().unwrap().starts_with("W1-"));
}

#[tokio::test]
async fn test_payment_records_are_unclassified() {
    let (client, gateway) = client();
    gateway.respond("getPaymentRecord", "02551", json!({ "recurring": { "amount": "1000" } }));

    let record = client.get_payment_record("PR1").await.unwrap();
    client.disable_payment_record("PR1").await.unwrap();

    assert_eq!(record.result.code, "02551");
    assert_eq!(record.get("recurring").unwrap()["amount"], "1000");
    assert_eq!(gateway.operations(), ["getPaymentRecord", "disablePaymentRecord"]);
    assert_eq!(
        gateway.request(1),
        json!({ "contractNumber": "1234567", "paymentRecordId": "PR1" })
    );
}

#[tokio::test]
async fn test_empty_transaction_element_reads_as_missing() {
    let (client, gateway) = client();
    gateway.respond("doAuthorization", "00000", json!({ "transaction": "" }));
    gateway.respond("doAuthorization", "00000", json!({}));

    let empty = client
        .do_authorization("R1", &card(), 1000, Currency::EUR)
        .await
        .unwrap_err();
    let missing = client
        .do_authorization("R2", &card(), 1000, Currency::EUR)
        .await
        .unwrap_err();

    for err in [empty, missing] {
        assert!(matches!(err, PaylineError::Serialization(ref m) if m == "response has no transaction"));
    }

    gateway.respond("doAuthorization", "00000", json!({ "transaction": "" }));
    assert!(client.validate_card(&card(), 100, Currency::EUR).await.unwrap());
    assert_eq!(gateway.operations(), ["doAuthorization"; 3]);
}

#[tokio::test]
async fn test_get_wallet_with_empty_wallet_element() {
    let (client, gateway) = client();
    gateway.respond("getWallet", "02500", json!({ "wallet": "" }));

    let response = client.get_wallet("W1").await.unwrap();
    assert!(response.result.is_successful());
    assert_eq!(response.wallet, None);
}

// =============================================================================
// Web payments
// =============================================================================

#[tokio::test]
async fn test_do_web_payment() {
    let (client, gateway) = client();
    gateway.respond(
        "doWebPayment",
        "00000",
        json!({ "token": "tok", "redirectURL": "https://pay.example/t/tok" }),
    );

    let request = WebPaymentRequest::new("W1", "https://shop.example/done")
        .amount_text("4200")
        .buyer("Ada", "Lovelace", "ada@example.com");
    let response = client.do_web_payment(&request).await.unwrap();

    assert_eq!(response.token(), Some("tok"));
    assert_eq!(response.redirect_url(), Some("https://pay.example/t/tok"));

    let body = gateway.request(0);
    assert_eq!(body["payment"]["amount"], 4200);
    assert_eq!(body["securityMode"], "SSL");
    assert!(body["order"]["ref"].as_str().unwrap().starts_with("W1-"));
}

#[tokio::test]
async fn test_get_web_payment_details() {
    let (client, gateway) = client();
    gateway.respond("getWebPaymentDetails", "02306", json!({}));

    let err = client.get_web_payment_details("tok").await.unwrap_err();

    assert_eq!(err.declined().unwrap().result.code, "02306");
    assert_eq!(gateway.request(0), json!({ "version": 20, "token": "tok" }));
}
