use invoicer_infra::SqliteStore;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a private in-memory database, on an ephemeral port.
        let store = SqliteStore::in_memory().await.expect("failed to open in-memory store");
        let app = invoicer_api::build_app(store);
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
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, body).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, body).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn create_invoice(&self, body: Value) -> Value {
        let (status, invoice) = self.post("/api/invoices", body).await;
        assert_eq!(status, StatusCode::CREATED, "{invoice}");
        invoice
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn simple_invoice() -> Value {
    json!({
        "date": "2024-02-01",
        "due_date": "2024-03-01",
        "items": [{"description": "Hours", "quantity": 1, "unit_price": 10}]
    })
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_routes_get_json_404() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn acme_widget_invoice_end_to_end() {
    let srv = TestServer::spawn().await;

    let (status, acme) = srv.post("/api/clients", json!({"name": "Acme"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let client_id = acme["id"].as_i64().unwrap();

    let invoice = srv
        .create_invoice(json!({
            "client_id": client_id,
            "date": "2024-01-01",
            "due_date": "2024-01-31",
            "tax_rate": 10,
            "items": [{"description": "Widget", "quantity": 2, "unit_price": 50}]
        }))
        .await;

    assert_eq!(invoice["invoice_number"], "INV-0001");
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["client_name"], "Acme");
    assert_eq!(invoice["subtotal"].as_f64(), Some(100.0));
    assert_eq!(invoice["tax_amount"].as_f64(), Some(10.0));
    assert_eq!(invoice["total"].as_f64(), Some(110.0));
    assert_eq!(invoice["items"].as_array().unwrap().len(), 1);

    let id = invoice["id"].as_i64().unwrap();
    let (status, fetched) = srv.get(&format!("/api/invoices/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, invoice);

    let (status, list) = srv.get("/api/invoices").await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["client_name"], "Acme");
    assert_eq!(list[0]["total"].as_f64(), Some(110.0));
}

#[tokio::test]
async fn client_crud() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/api/clients", json!({"email": "a@b.test"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (_, zeta) = srv.post("/api/clients", json!({"name": "Zeta"})).await;
    let (_, alpha) = srv
        .post("/api/clients", json!({"name": "Alpha", "email": "hi@alpha.test"}))
        .await;
    assert_eq!(alpha["email"], "hi@alpha.test");

    let (_, list) = srv.get("/api/clients").await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);

    let id = zeta["id"].as_i64().unwrap();
    let (status, updated) = srv
        .put(&format!("/api/clients/{id}"), json!({"name": "Zeta Corp", "phone": "555"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Zeta Corp");
    assert_eq!(updated["phone"], "555");

    let (status, body) = srv.delete(&format!("/api/clients/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Client deleted");

    let (status, body) = srv.get(&format!("/api/clients/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Client not found");
}

#[tokio::test]
async fn bad_ids_and_missing_records() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/api/invoices/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, _) = srv.get("/api/invoices/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.put("/api/invoices/999", simple_invoice()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.delete("/api/invoices/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.put("/api/clients/999", json!({"name": "Ghost"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoice_validation_failures_are_400() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/api/invoices", json!({"date": "2024-01-01"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let mut bad_status = simple_invoice();
    bad_status["status"] = json!("void");
    let (status, _) = srv.post("/api/invoices", bad_status).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unknown_client = simple_invoice();
    unknown_client["client_id"] = json!(77);
    let (status, _) = srv.post("/api/invoices", unknown_client).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = srv.get("/api/invoices?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = srv.get("/api/invoices").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn numbering_is_sequential() {
    let srv = TestServer::spawn().await;

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let invoice = srv.create_invoice(simple_invoice()).await;
        numbers.push(invoice["invoice_number"].as_str().unwrap().to_string());
    }

    assert_eq!(numbers, vec!["INV-0001", "INV-0002", "INV-0003"]);
}

#[tokio::test]
async fn put_replaces_items_and_keeps_omitted_fields() {
    let srv = TestServer::spawn().await;

    let mut body = simple_invoice();
    body["tax_rate"] = json!(20);
    body["notes"] = json!("thanks");
    body["items"] = json!([
        {"description": "A", "quantity": 1, "unit_price": 10},
        {"description": "B", "quantity": 2, "unit_price": 10}
    ]);
    let invoice = srv.create_invoice(body).await;
    let id = invoice["id"].as_i64().unwrap();

    let (status, updated) = srv
        .put(
            &format!("/api/invoices/{id}"),
            json!({"items": [{"description": "C", "quantity": 5, "unit_price": 4}]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");

    let items = updated["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"], "C");
    assert_eq!(updated["subtotal"].as_f64(), Some(20.0));
    assert_eq!(updated["tax_amount"].as_f64(), Some(4.0));
    assert_eq!(updated["total"].as_f64(), Some(24.0));
    assert_eq!(updated["date"], "2024-02-01");
    assert_eq!(updated["notes"], "thanks");
    assert_eq!(updated["invoice_number"], invoice["invoice_number"]);
}

#[tokio::test]
async fn patch_status_and_filter_listing() {
    let srv = TestServer::spawn().await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(srv.create_invoice(simple_invoice()).await["id"].as_i64().unwrap());
    }

    for id in [ids[0], ids[2]] {
        let (status, invoice) = srv
            .send(
                reqwest::Method::PATCH,
                &format!("/api/invoices/{id}/status"),
                json!({"status": "sent"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(invoice["status"], "sent");
    }

    let (status, _) = srv
        .send(
            reqwest::Method::PATCH,
            &format!("/api/invoices/{}/status", ids[1]),
            json!({"status": "lost"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, sent) = srv.get("/api/invoices?status=sent").await;
    let sent_ids: Vec<i64> = sent
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(sent_ids, vec![ids[2], ids[0]]);

    let (_, drafts) = srv.get("/api/invoices?status=draft").await;
    let drafts = drafts.as_array().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0]["id"].as_i64(), Some(ids[1]));
}

#[tokio::test]
async fn deleting_invoice_then_client() {
    let srv = TestServer::spawn().await;

    let (_, acme) = srv.post("/api/clients", json!({"name": "Acme"})).await;
    let client_id = acme["id"].as_i64().unwrap();
    let mut body = simple_invoice();
    body["client_id"] = json!(client_id);
    let invoice = srv.create_invoice(body).await;
    let id = invoice["id"].as_i64().unwrap();

    let (status, body) = srv.delete(&format!("/api/clients/{client_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv.delete(&format!("/api/invoices/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invoice deleted");

    let (status, _) = srv.get(&format!("/api/invoices/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.delete(&format!("/api/clients/{client_id}")).await;
    assert_eq!(status, StatusCode::OK);
}
