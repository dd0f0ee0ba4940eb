use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use catalog::{LookupOption, MultiSelect, OptionLink, ProtestRow, StateOption, SubmissionPayload};
use reqwest::{StatusCode, header::CONTENT_TYPE, redirect::Policy};
use serde_json::{Value, json};
use server::{
    analytics::EventQueue,
    config::Config,
    database::{ProtestStore, StoreError},
    router,
    search::SearchHit,
    state::State,
    turnstile::{BotCheck, Verdict},
};
use tokio::net::TcpListener;

const ID: &str = "0b6d1c8e-3f7a-4b8e-9a51-2f0c7d9e4a10";

const VALID_FORM: &str = "date_of_event=2024-01-20&locality=Seattle&state_code=WA\
    &count_method=visual+estimate&crowd_size_low=250&crowd_size_high=350\
    &sources=https%3A%2F%2Fx.com&event_types=0&event_types=3&event_types_other=Flash+mob\
    &turnstile_token=tok-123";

#[derive(Default)]
struct FakeStore {
    calls: AtomicUsize,
    submit_id: Option<String>,
    protest: Option<ProtestRow>,
    failing_links: Vec<MultiSelect>,
    rpc_missing: bool,
    panics: bool,
    submitted: Mutex<Vec<SubmissionPayload>>,
    searches: Mutex<Vec<(String, u32, u32)>>,
}

impl FakeStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self, title: Option<&str>) -> SearchHit {
        SearchHit {
            id: ID.to_string(),
            title: title.map(str::to_string),
            date_of_event: Some("2024-01-20".to_string()),
            locality: Some("Seattle".to_string()),
            state_code: Some("WA".to_string()),
            claims_summary: None,
            organization_name: None,
            rank: None,
            submission_date: None,
        }
    }
}

#[async_trait]
impl ProtestStore for FakeStore {
    async fn submit_protest(&self, payload: &SubmissionPayload) -> Result<String, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(payload.clone());

        self.submit_id.clone().ok_or(StoreError::MissingId)
    }

    async fn fetch_protest(&self, _id: &str) -> Result<Option<ProtestRow>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.protest.clone())
    }

    async fn fetch_links(&self, _id: &str, field: MultiSelect) -> Result<Vec<OptionLink>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_links.contains(&field) {
            return Err(StoreError::MissingId);
        }

        Ok(vec![OptionLink {
            option_id: 3,
            other_value: None,
        }])
    }

    async fn fetch_states(&self) -> Result<Vec<StateOption>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.panics {
            panic!("states lookup blew up");
        }
        Ok(vec![StateOption {
            code: "WA".to_string(),
            name: "Washington".to_string(),
        }])
    }

    async fn fetch_options(&self, field: MultiSelect) -> Result<Vec<LookupOption>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if field == MultiSelect::Notes {
            return Err(StoreError::MissingId);
        }

        Ok(vec![LookupOption {
            id: 1,
            name: format!("{} option", field.name()),
        }])
    }

    async fn search_rpc(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), limit, offset));

        if self.rpc_missing {
            return Err(StoreError::Api {
                status: StatusCode::NOT_FOUND,
                code: "42883".to_string(),
                message: "function search_protests_for_reference does not exist".to_string(),
                details: None,
            });
        }

        Ok(vec![self.hit(Some("March for Transit"))])
    }

    async fn search_columns(
        &self,
        _query: &str,
        _limit: u32,
        _offset: u32,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.hit(None)])
    }
}

struct FakeBotCheck {
    success: bool,
    calls: AtomicUsize,
}

impl FakeBotCheck {
    fn new(success: bool) -> Self {
        Self {
            success,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotCheck for FakeBotCheck {
    async fn verify(&self, _token: &str) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.success {
            Verdict {
                success: true,
                error: None,
            }
        } else {
            Verdict::failed("invalid-input-response")
        }
    }
}

async fn spawn(store: Arc<FakeStore>, bot_check: Arc<FakeBotCheck>) -> String {
    let state = State::with_parts(
        Config::default(),
        store,
        bot_check,
        Arc::new(EventQueue::disabled()),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    format!("http://{address}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

async fn post_form(base: &str, body: &str) -> reqwest::Response {
    client()
        .post(format!("{base}/form"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}

fn stored_store() -> FakeStore {
    FakeStore {
        submit_id: Some(ID.to_string()),
        protest: Some(ProtestRow {
            id: Some(ID.to_string()),
            title: Some("March for Transit".to_string()),
            locality: Some("Seattle".to_string()),
            ..ProtestRow::default()
        }),
        ..FakeStore::default()
    }
}

#[tokio::test]
async fn test_submit_redirects_with_id() {
    let store = Arc::new(stored_store());
    let bot_check = Arc::new(FakeBotCheck::new(true));
    let base = spawn(store.clone(), bot_check.clone()).await;

    let response = post_form(&base, VALID_FORM).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"],
        format!("/success?id={ID}").as_str()
    );
    assert_eq!(bot_check.calls(), 1);

    let submitted = store.submitted.lock().unwrap();
    let payload = serde_json::to_value(&submitted[0]).unwrap();
    assert_eq!(payload["protest_data"]["crowd_size_low"], 250);
    assert_eq!(payload["protest_data"]["crowd_size_high"], 350);
    assert_eq!(
        payload["event_types_data"],
        json!([{ "id": 0, "other": "Flash mob" }, { "id": 3, "other": null }])
    );
}

#[tokio::test]
async fn test_invalid_form_skips_bot_check() {
    let store = Arc::new(stored_store());
    let bot_check = Arc::new(FakeBotCheck::new(true));
    let base = spawn(store.clone(), bot_check.clone()).await;

    let response = post_form(&base, "locality=Seattle&is_online=false&turnstile_token=tok").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["errors"]["date_of_event"].is_array());
    assert!(body["errors"]["count_method"].is_array());
    assert!(body["errors"].get("locality").is_none());
    assert_eq!(body["values"]["locality"], "Seattle");

    assert_eq!(bot_check.calls(), 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_invalid_form_echoes_other_text() {
    let store = Arc::new(stored_store());
    let bot_check = Arc::new(FakeBotCheck::new(true));
    let base = spawn(store.clone(), bot_check.clone()).await;

    let body = VALID_FORM.replace("count_method=visual+estimate", "count_method=");
    let response = post_form(&base, &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["errors"]["count_method"].is_array());
    assert_eq!(body["values"]["event_types"], json!(["0", "3"]));
    assert_eq!(body["others"]["event_types"], "Flash mob");
    assert_eq!(body["others"]["notes"], "");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_failed_bot_check_skips_store() {
    let store = Arc::new(stored_store());
    let bot_check = Arc::new(FakeBotCheck::new(false));
    let base = spawn(store.clone(), bot_check.clone()).await;

    let response = post_form(&base, VALID_FORM).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["values"]["locality"], "Seattle");
    assert_eq!(body["others"]["event_types"], "Flash mob");
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_missing_token_fails_bot_check() {
    let store = Arc::new(stored_store());
    let bot_check = Arc::new(FakeBotCheck::new(true));
    let base = spawn(store.clone(), bot_check.clone()).await;

    let body = VALID_FORM.replace("&turnstile_token=tok-123", "");
    let response = post_form(&base, &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(bot_check.calls(), 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_store_without_id_is_generic_error() {
    let store = Arc::new(FakeStore::default());
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let response = post_form(&base, VALID_FORM).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "There was an error submitting your form. Please try again."
    );
    assert_eq!(body["values"]["state_code"], "WA");
    assert_eq!(body["others"]["event_types"], "Flash mob");
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_fetch_rejects_malformed_id_before_store() {
    let store = Arc::new(stored_store());
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let response = client()
        .get(format!("{base}/api/protests/not-a-uuid"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid protest ID format" }));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_fetch_missing_protest() {
    let store = Arc::new(FakeStore::default());
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let response = client()
        .get(format!("{base}/api/protests/{ID}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Protest not found" }));
}

#[tokio::test]
async fn test_fetch_tolerates_failed_junction() {
    let store = Arc::new(FakeStore {
        failing_links: vec![MultiSelect::Notes],
        ..stored_store()
    });
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let response = client()
        .get(format!("{base}/api/protests/{ID}"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["protest"]["title"], "March for Transit");
    assert_eq!(body["protest"]["event_types"].as_array().unwrap().len(), 1);
    assert_eq!(body["protest"]["notes"], json!([]));
    assert_eq!(store.calls(), 6);
}

#[tokio::test]
async fn test_form_options_tolerate_failed_list() {
    let store = Arc::new(FakeStore::default());
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let body: Value = client()
        .get(format!("{base}/api/form-options"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["states"][0]["code"], "WA");
    assert_eq!(body["eventTypes"][0]["id"], 1);
    assert_eq!(body["notesOptions"], json!([]));
    assert_eq!(store.calls(), 6);
}

#[tokio::test]
async fn test_handler_panic_is_generic_error() {
    let store = Arc::new(FakeStore {
        panics: true,
        ..FakeStore::default()
    });
    let base = spawn(store, Arc::new(FakeBotCheck::new(true))).await;

    let response = client()
        .get(format!("{base}/api/form-options"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "An unexpected error occurred" }));

    let response = client().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_short_query_skips_store() {
    let store = Arc::new(stored_store());
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let body: Value = client()
        .get(format!("{base}/api/protests/search?q=ab"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        body,
        json!({ "results": [], "query": "ab", "total": 0, "hasMore": false })
    );
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_search_caps_limit() {
    let store = Arc::new(stored_store());
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let body: Value = client()
        .get(format!("{base}/api/protests/search?q=march&limit=500&offset=20"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["total"], 1);
    assert_eq!(body["hasMore"], false);
    assert_eq!(body["results"][0]["title"], "March for Transit");
    assert_eq!(
        store.searches.lock().unwrap()[0],
        ("march".to_string(), 50, 20)
    );
}

#[tokio::test]
async fn test_search_falls_back_without_procedure() {
    let store = Arc::new(FakeStore {
        rpc_missing: true,
        ..stored_store()
    });
    let base = spawn(store.clone(), Arc::new(FakeBotCheck::new(true))).await;

    let body: Value = client()
        .get(format!("{base}/api/protests/search?q=seattle"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["results"][0]["title"], "Untitled Event");
    assert_eq!(body["results"][0]["rank"], 1.0);
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_validate_turnstile() {
    let bot_check = Arc::new(FakeBotCheck::new(true));
    let base = spawn(Arc::new(FakeStore::default()), bot_check.clone()).await;
    let url = format!("{base}/api/validate-turnstile");

    let response = client()
        .post(&url)
        .json(&json!({ "token": "tok-123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap()["success"], true);

    let response = client().post(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "success": false, "error": "No token provided" })
    );

    let response = client().post(&url).body("not json").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(bot_check.calls(), 1);
}

#[tokio::test]
async fn test_health() {
    let base = spawn(
        Arc::new(FakeStore::default()),
        Arc::new(FakeBotCheck::new(true)),
    )
    .await;

    let response = client().get(format!("{base}/health")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}
