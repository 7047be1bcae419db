use mockito::Matcher;
use mypts_core::domain::{PaymentMethod, TransactionStatus, TransactionType};
use mypts_core::{ClientError, Config, MyPtsClient};
use serde_json::{json, Map, Value};

fn transaction_json(id: &str, profile_id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "profileId": profile_id,
        "type": "SELL_MYPTS",
        "status": status,
        "amount": -500,
        "balance": 1500,
        "metadata": {"paymentMethod": "mobile_money"},
        "createdAt": "2024-05-01T12:00:00Z",
        "updatedAt": "2024-05-01T12:00:00Z"
    })
}

fn mobile_money_details() -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("provider".to_string(), json!("MTN"));
    details.insert("phoneNumber".to_string(), json!("+237600000000"));
    details
}

#[tokio::test]
async fn pagination_echo_is_preserved() {
    let mut api = mockito::Server::new_async().await;

    let body = json!({
        "success": true,
        "data": {
            "transactions": [transaction_json("tx-1", "p-1", "COMPLETED")],
            "total": 42,
            "limit": 2,
            "offset": 4,
            "hasMore": true
        }
    });

    let _list = api
        .mock("GET", "/my-pts/transactions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "2".into()),
            Matcher::UrlEncoded("offset".into(), "4".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = MyPtsClient::new(Config::new(api.url()));
    let page = client.list_transactions(2, 4).await.expect("page");

    assert_eq!(page.total, 42);
    assert_eq!(page.limit, 2);
    assert_eq!(page.offset, 4);
    assert!(page.has_more);
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].status, TransactionStatus::Completed);
}

#[tokio::test]
async fn listing_by_type_uses_the_wire_literal() {
    let mut api = mockito::Server::new_async().await;

    let body = json!({
        "success": true,
        "data": {
            "transactions": [],
            "total": 0,
            "limit": 10,
            "offset": 0,
            "hasMore": false
        }
    });

    let list = api
        .mock("GET", "/my-pts/transactions/type/BUY_MYPTS")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = MyPtsClient::new(Config::new(api.url()));
    let page = client
        .list_transactions_by_type(&TransactionType::BuyMyPts, 10, 0)
        .await
        .expect("page");

    assert!(page.transactions.is_empty());
    list.assert_async().await;
}

#[tokio::test]
async fn fetches_single_records_by_id_and_reference() {
    let mut api = mockito::Server::new_async().await;

    let by_id = json!({"success": true, "data": transaction_json("tx-9", "p-1", "RESERVED")});
    let _get = api
        .mock("GET", "/my-pts/transactions/tx-9")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(by_id.to_string())
        .create_async()
        .await;

    let by_ref = json!({
        "success": true,
        "data": {"transaction": transaction_json("tx-10", "p-1", "PENDING")}
    });
    let _get_ref = api
        .mock("GET", "/my-pts/transactions/reference/ref-77")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(by_ref.to_string())
        .create_async()
        .await;

    let client = MyPtsClient::new(Config::new(api.url()));

    let tx = client.get_transaction("tx-9").await.expect("by id");
    assert_eq!(tx.id, "tx-9");
    assert!(tx.is_admin_actionable());

    let tx = client
        .get_transaction_by_reference("ref-77")
        .await
        .expect("by reference");
    assert_eq!(tx.id, "tx-10");
    assert_eq!(tx.status, TransactionStatus::Pending);
}

#[tokio::test]
async fn buy_merges_profile_scope_into_the_body() {
    let mut api = mockito::Server::new_async().await;

    let buy = api
        .mock("POST", "/my-pts/buy")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "amount": 500,
            "paymentMethod": "card",
            "profileId": "p-1"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"success": true, "data": transaction_json("tx-2", "p-1", "PENDING")})
                .to_string(),
        )
        .create_async()
        .await;

    let mut config = Config::new(api.url());
    config.active_profile_id = Some("p-1".to_string());
    let client = MyPtsClient::new(config);

    let tx = client.buy(500, &PaymentMethod::Card).await.expect("buy");
    assert_eq!(tx.status, TransactionStatus::Pending);
    buy.assert_async().await;
}

#[tokio::test]
async fn sell_with_insufficient_balance_never_reaches_the_network() {
    let mut api = mockito::Server::new_async().await;

    let sell = api
        .mock("POST", "/my-pts/sell")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = MyPtsClient::new(Config::new(api.url()));
    let err = client
        .sell(2000, &PaymentMethod::MobileMoney, &mobile_money_details(), 1000)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::InsufficientBalance {
            requested: 2000,
            available: 1000
        }
    ));
    sell.assert_async().await;
}

#[tokio::test]
async fn sell_with_incomplete_account_details_fails_locally() {
    let mut api = mockito::Server::new_async().await;

    let sell = api
        .mock("POST", "/my-pts/sell")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = MyPtsClient::new(Config::new(api.url()));
    let err = client
        .sell(100, &PaymentMethod::MobileMoney, &Map::new(), 1000)
        .await
        .unwrap_err();

    let ClientError::ValidationFailure(errors) = err else {
        panic!("expected ValidationFailure");
    };
    assert_eq!(errors.len(), 2);
    sell.assert_async().await;
}

#[tokio::test]
async fn sell_submits_account_details_when_valid() {
    let mut api = mockito::Server::new_async().await;

    let sell = api
        .mock("POST", "/my-pts/sell")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "amount": 500,
            "paymentMethod": "mobile_money",
            "accountDetails": {"provider": "MTN", "phoneNumber": "+237600000000"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"success": true, "data": transaction_json("tx-3", "p-1", "RESERVED")})
                .to_string(),
        )
        .create_async()
        .await;

    let client = MyPtsClient::new(Config::new(api.url()));
    let tx = client
        .sell(500, &PaymentMethod::MobileMoney, &mobile_money_details(), 1000)
        .await
        .expect("sell");

    assert_eq!(tx.status, TransactionStatus::Reserved);
    sell.assert_async().await;
}

#[tokio::test]
async fn backend_field_errors_map_to_validation_failure() {
    let mut api = mockito::Server::new_async().await;

    let _sell = api
        .mock("POST", "/my-pts/sell")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": false,
                "message": "validation failed",
                "errors": {"phoneNumber": ["is not a valid MSISDN"]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = MyPtsClient::new(Config::new(api.url()));
    let err = client
        .sell(500, &PaymentMethod::MobileMoney, &mobile_money_details(), 1000)
        .await
        .unwrap_err();

    let ClientError::ValidationFailure(errors) = err else {
        panic!("expected ValidationFailure");
    };
    assert_eq!(errors[0].field, "phoneNumber");
    assert_eq!(errors[0].message, "is not a valid MSISDN");
}
