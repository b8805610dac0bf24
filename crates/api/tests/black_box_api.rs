use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use rickshaw_bom::{load_requirements, BomTableLayout};
use rickshaw_core::PartKey;
use rickshaw_infra::{InMemoryStockStore, LedgerService, StockStore};
use rickshaw_inventory::{BandThresholds, StockSnapshot};

const BOM: &str = "S No,Parts,Unit,ModelA\n1,Motor,pcs,1\n2,Wheels,pcs,4\n";

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStockStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(stock: &[(&str, u64)]) -> Self {
        let registry = load_requirements(BOM.as_bytes(), &BomTableLayout::default()).unwrap();
        let snapshot = StockSnapshot::from_rows(
            stock
                .iter()
                .map(|(name, qty)| (PartKey::new(*name), *qty)),
        )
        .unwrap();
        let store = Arc::new(InMemoryStockStore::with_snapshot(snapshot));
        let service = LedgerService::open(
            Arc::new(registry),
            store.clone() as Arc<dyn StockStore>,
            BandThresholds::default(),
            || unreachable!("store is pre-populated"),
        )
        .unwrap();

        // Same router as prod, bound to an ephemeral port.
        let app = rickshaw_api::app::build_app(Arc::new(service));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
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

fn stock_of(snapshot: &Value, part: &str) -> u64 {
    snapshot["parts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["part"]["name"] == part)
        .and_then(|row| row["stock"].as_u64())
        .unwrap()
}

async fn snapshot(client: &reqwest::Client, server: &TestServer) -> Value {
    let res = client.get(server.url("/snapshot")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn(&[("Motor", 10), ("Wheels", 40)]).await;
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn build_consumes_stock_and_lowers_producibility() {
    let server = TestServer::spawn(&[("Motor", 10), ("Wheels", 40)]).await;
    let client = reqwest::Client::new();

    let before = snapshot(&client, &server).await;
    assert_eq!(before["producibility"][0]["model"], "ModelA");
    assert_eq!(before["producibility"][0]["producible"], json!({ "kind": "units", "units": 10 }));

    let res = client
        .post(server.url("/builds"))
        .json(&json!({ "model": "ModelA", "count": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let receipt: Value = res.json().await.unwrap();
    assert_eq!(receipt["version"], 1);
    assert_eq!(receipt["producibility"][0]["producible"]["units"], 7);
    assert_eq!(receipt["producibility"][0]["band"], "critical");
    assert!(receipt["operation_id"].is_string());

    let after = snapshot(&client, &server).await;
    assert_eq!(stock_of(&after, "Motor"), 7);
    assert_eq!(stock_of(&after, "Wheels"), 28);
    assert_eq!(server.store.save_count(), 1);
}

#[tokio::test]
async fn insufficient_build_is_rejected_with_shortfalls() {
    let server = TestServer::spawn(&[("Motor", 10), ("Wheels", 40)]).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/builds"))
        .json(&json!({ "model": "ModelA", "count": 11 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    let first = &body["shortfalls"][0];
    assert_eq!(first["part"]["name"], "Motor");
    assert_eq!(first["required"], 11);
    assert_eq!(first["available"], 10);

    let after = snapshot(&client, &server).await;
    assert_eq!(stock_of(&after, "Motor"), 10);
    assert_eq!(after["version"], 0);
}

#[tokio::test]
async fn increment_then_oversized_decrement() {
    let server = TestServer::spawn(&[("Motor", 10), ("Wheels", 40)]).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/stock/increment"))
        .json(&json!({ "parts": ["Motor"], "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/stock/decrement"))
        .json(&json!({ "parts": ["Motor"], "quantity": 20 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let after = snapshot(&client, &server).await;
    assert_eq!(stock_of(&after, "Motor"), 15);
}

#[tokio::test]
async fn decrement_all_is_all_or_nothing() {
    let server = TestServer::spawn(&[("Motor", 2), ("Wheels", 40)]).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/stock/decrement"))
        .json(&json!({ "all": true, "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let after = snapshot(&client, &server).await;
    assert_eq!(stock_of(&after, "Motor"), 2);
    assert_eq!(stock_of(&after, "Wheels"), 40);
}

#[tokio::test]
async fn invalid_input_is_a_validation_error() {
    let server = TestServer::spawn(&[("Motor", 10), ("Wheels", 40)]).await;
    let client = reqwest::Client::new();

    for (path, body) in [
        ("/builds", json!({ "model": "ModelA", "count": 0 })),
        ("/builds", json!({ "model": "Tuk", "count": 1 })),
        ("/stock/increment", json!({ "parts": ["Horn"], "quantity": 1 })),
        ("/stock/increment", json!({ "parts": ["Motor"], "quantity": -1 })),
        ("/stock/decrement", json!({ "all": true, "parts": ["Motor"], "quantity": 1 })),
    ] {
        let res = client.post(server.url(path)).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path} {body}");
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], "validation_error");
    }

    let res = client.get(server.url("/snapshot?band=amber")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replenishment_advisory() {
    let server = TestServer::spawn(&[("Motor", 7), ("Wheels", 28)]).await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/replenishment?threshold=100"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["needs"],
        json!([
            { "model": "ModelA", "part": { "name": "Motor" }, "quantity": 93 },
            { "model": "ModelA", "part": { "name": "Wheels" }, "quantity": 372 },
        ])
    );

    let res = client
        .get(server.url("/replenishment?threshold=-5"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/replenishment")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn coverage_and_models() {
    let server = TestServer::spawn(&[("Motor", 7), ("Wheels", 30)]).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/models"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["models"], json!(["ModelA"]));

    let res = client
        .get(server.url("/models/ModelA/coverage"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["coverage"][1]["units"], 7);
    assert_eq!(body["coverage"][1]["per_unit"], 4);
    assert_eq!(body["coverage"][1]["band"], "critical");

    let res = client
        .get(server.url("/models/ModelA/coverage?band=healthy"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["coverage"], json!([]));

    let res = client
        .get(server.url("/models/Tuk/coverage"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_failure_maps_to_503_and_rolls_back() {
    let server = TestServer::spawn(&[("Motor", 10), ("Wheels", 40)]).await;
    let client = reqwest::Client::new();
    server.store.set_fail_writes(true);

    let res = client
        .post(server.url("/stock/increment"))
        .json(&json!({ "all": true, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "storage_unavailable");

    let after = snapshot(&client, &server).await;
    assert_eq!(stock_of(&after, "Motor"), 10);
}
