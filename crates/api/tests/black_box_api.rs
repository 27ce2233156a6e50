use std::time::Duration;

use axum::{Router, routing::get};
use reqwest::StatusCode;
use serde_json::{Value, json};

use skumargin_api::app::{AdmissionLimit, build_app, services::AppServices, with_admission};
use skumargin_pricing::MarginPolicy;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(MarginPolicy::default()).await
    }

    async fn spawn_with(policy: MarginPolicy) -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let limit = AdmissionLimit::new(10, Duration::from_secs(10));
        Self::serve(build_app(AppServices::in_memory(policy, 2), limit)).await
    }

    async fn serve(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Ingest SKUs and return their ids in ingestion order.
async fn seed_skus(client: &reqwest::Client, srv: &TestServer, skus: Value) -> Vec<i64> {
    let res = client.post(srv.url("/sku")).json(&skus).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let mut ids = Vec::new();
    let mut page = 1;
    loop {
        let res = client
            .get(srv.url(&format!("/sku?page={page}")))
            .send()
            .await
            .unwrap();
        let body: Vec<Value> = res.json().await.unwrap();
        if body.is_empty() {
            break;
        }
        ids.extend(body.iter().map(|r| r["id"].as_i64().unwrap()));
        page += 1;
    }
    ids
}

fn decimal(v: &Value) -> String {
    v.as_str().expect("decimals are serialized as strings").to_string()
}

#[tokio::test]
async fn ping_answers_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/ping")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn sku_ingestion_skips_duplicates() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/sku"))
        .json(&json!([
            { "sku": "A-1", "planned_orders_per_sku": 10, "actual_orders": 5, "stock": 3 },
            { "sku": "A-2", "stock": 1, "current_price": "199.90" },
            { "sku": "A-1", "stock": 9 }
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inserted"], 2);

    let res = client
        .post(srv.url("/sku"))
        .json(&json!([{ "sku": "A-2" }, { "sku": "A-3" }]))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inserted"], 1);

    let res = client.get(srv.url("/sku?page=1")).send().await.unwrap();
    let first: Vec<Value> = res.json().await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["sku"], "A-1");
    assert_eq!(first[0]["stock"], 3);

    let id = first[1]["id"].as_i64().unwrap();
    let res = client
        .get(srv.url(&format!("/sku?id={id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let record: Value = res.json().await.unwrap();
    assert_eq!(record["sku"], "A-2");
    assert_eq!(decimal(&record["current_price"]), "199.90");
}

#[tokio::test]
async fn sku_batch_with_blank_code_is_rejected_whole() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/sku"))
        .json(&json!([{ "sku": "B-1" }, { "sku": "" }]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client.get(srv.url("/sku?page=1")).send().await.unwrap();
    let listed: Vec<Value> = res.json().await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn unknown_sku_returns_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/sku?id=4242")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(srv.url("/margin"))
        .json(&json!({ "sku_id": 4242, "mode": "manual", "base_margin_percent": "0.10" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "sku_not_found");
}

#[tokio::test]
async fn manual_calculation_is_stored_and_queryable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let ids = seed_skus(
        &client,
        &srv,
        json!([{ "sku": "M-1", "planned_orders_per_sku": 10, "actual_orders": 3, "stock": 5 }]),
    )
    .await;

    let res = client
        .post(srv.url("/margin"))
        .json(&json!({
            "sku_id": ids[0],
            "mode": "manual",
            "base_margin_percent": "0.05",
            "date": "2024-01-10"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(decimal(&body["margin_percent"]), "-0.02");
    assert_eq!(body["target_date"], "2024-01-10");
    assert_eq!(body["rule"], "adjusted");

    let res = client
        .get(srv.url(&format!("/margin?sku_id={}&date=2024-01-10", ids[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let entry: Value = res.json().await.unwrap();
    assert_eq!(entry["id"], body["id"]);

    let res = client
        .get(srv.url(&format!("/margin?sku_id={}&date=2024-01-11", ids[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manual_mode_requires_a_base() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let ids = seed_skus(&client, &srv, json!([{ "sku": "M-2", "stock": 5 }])).await;

    let res = client
        .post(srv.url("/margin"))
        .json(&json!({ "sku_id": ids[0], "mode": "manual" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auto_mode_without_history_or_seed_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let ids = seed_skus(&client, &srv, json!([{ "sku": "N-1", "stock": 5 }])).await;

    let res = client
        .post(srv.url("/margin"))
        .json(&json!({ "sku_id": ids[0], "mode": "auto" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no_history_no_seed");

    let res = client
        .get(srv.url(&format!("/margin?sku_id={}", ids[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_date_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let ids = seed_skus(&client, &srv, json!([{ "sku": "D-1", "stock": 5 }])).await;

    let res = client
        .post(srv.url("/margin"))
        .json(&json!({
            "sku_id": ids[0],
            "mode": "manual",
            "base_margin_percent": "0.10",
            "date": "10/01/2024"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_date");
}

#[tokio::test]
async fn auto_mode_feeds_back_and_latest_follows_target_date() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let ids = seed_skus(
        &client,
        &srv,
        json!([{ "sku": "F-1", "planned_orders_per_sku": 10, "actual_orders": 12, "stock": 5 }]),
    )
    .await;
    let sku_id = ids[0];

    for (date, expected) in [("2024-02-02", "0.12"), ("2024-02-01", "0.14")] {
        let res = client
            .post(srv.url("/margin"))
            .json(&json!({
                "sku_id": sku_id,
                "mode": "auto",
                "base_margin_percent": "0.10",
                "date": date
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(decimal(&body["margin_percent"]), expected);
    }

    // The backfilled 02-01 entry is newer but not later.
    let res = client
        .get(srv.url(&format!("/margin?sku_id={sku_id}&latest=true")))
        .send()
        .await
        .unwrap();
    let latest: Value = res.json().await.unwrap();
    assert_eq!(latest["target_date"], "2024-02-02");
    assert_eq!(decimal(&latest["margin_percent"]), "0.12");

    let res = client
        .get(srv.url(&format!("/margin?sku_id={sku_id}")))
        .send()
        .await
        .unwrap();
    let all: Vec<Value> = res.json().await.unwrap();
    let dates: Vec<&str> = all.iter().map(|e| e["target_date"].as_str().unwrap()).collect();
    assert_eq!(dates, vec!["2024-02-01", "2024-02-02"]);
}

#[tokio::test]
async fn date_pages_are_ordered_by_sku() {
    let srv = TestServer::spawn_with(MarginPolicy {
        fixation_flag: true,
        ..MarginPolicy::default()
    })
    .await;
    let client = reqwest::Client::new();
    let ids = seed_skus(
        &client,
        &srv,
        json!([
            { "sku": "P-1", "stock": 5 },
            { "sku": "P-2", "stock": 5 },
            { "sku": "P-3", "stock": 5 }
        ]),
    )
    .await;

    for id in ids.iter().rev() {
        let res = client
            .post(srv.url("/margin"))
            .json(&json!({
                "sku_id": id,
                "mode": "manual",
                "base_margin_percent": "0.30",
                "date": "2024-03-01"
            }))
            .send()
            .await
            .unwrap();
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["rule"], "fixation");
        assert_eq!(decimal(&body["margin_percent"]), "0.15");
    }

    // Page size is 2 for the test server; page 0 clamps to 1.
    let res = client
        .get(srv.url("/margin?date=2024-03-01&page=0"))
        .send()
        .await
        .unwrap();
    let first: Vec<Value> = res.json().await.unwrap();
    let listed: Vec<i64> = first.iter().map(|e| e["sku_id"].as_i64().unwrap()).collect();
    assert_eq!(listed, ids[..2].to_vec());

    let res = client
        .get(srv.url("/margin?date=2024-03-01&page=2"))
        .send()
        .await
        .unwrap();
    let second: Vec<Value> = res.json().await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0]["sku_id"].as_i64().unwrap(), ids[2]);

    let res = client.get(srv.url("/margin?page=1")).send().await.unwrap();
    let all: Vec<Value> = res.json().await.unwrap();
    assert_eq!(all.len(), 2);

    let res = client
        .get(srv.url("/margin?date=2024-03-02"))
        .send()
        .await
        .unwrap();
    let empty: Vec<Value> = res.json().await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn malformed_queries_and_bodies_get_json_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/margin?sku_id=abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client.get(srv.url("/sku?page=two")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(srv.url("/margin"))
        .json(&json!({ "sku_id": 1, "mode": "bogus" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());

    let res = client
        .post(srv.url("/sku"))
        .header("content-type", "application/json")
        .body("[{")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(800)).await;
    "done"
}

#[tokio::test]
async fn saturated_server_rejects_after_the_wait_limit() {
    let router = Router::new().route("/slow", get(slow));
    let srv = TestServer::serve(with_admission(
        router,
        AdmissionLimit::new(1, Duration::from_millis(100)),
    ))
    .await;
    let client = reqwest::Client::new();

    let busy = {
        let client = client.clone();
        let url = srv.url("/slow");
        tokio::spawn(async move { client.get(url).send().await.unwrap().status() })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client.get(srv.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "too_many_requests");

    assert_eq!(busy.await.unwrap(), StatusCode::OK);

    // The slot is free again.
    let res = client.get(srv.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn waiting_requests_are_admitted_when_a_slot_frees_in_time() {
    let router = Router::new().route("/slow", get(slow));
    let srv = TestServer::serve(with_admission(
        router,
        AdmissionLimit::new(1, Duration::from_secs(5)),
    ))
    .await;
    let client = reqwest::Client::new();

    let first = {
        let client = client.clone();
        let url = srv.url("/slow");
        tokio::spawn(async move { client.get(url).send().await.unwrap().status() })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(srv.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(first.await.unwrap(), StatusCode::OK);
}
