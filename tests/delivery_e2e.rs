// tests/delivery_e2e.rs
//
// Log + lead delivery against an in-process capture server, both directly via
// the Dispatcher and end-to-end through POST /quiz with origin routing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt as _;

use quiz_antibot::classifier::DisabledClassifier;
use quiz_antibot::config::{AppConfig, ClassifierCredentials, FrontendEndpoints, FrontendRouting};
use quiz_antibot::decision::{Action, Decision};
use quiz_antibot::delivery::{DeliveryRecord, Dispatcher};
use quiz_antibot::submission::{ClientMeta, Submission};
use quiz_antibot::{router, AppState};

type Captured = Arc<Mutex<Vec<(String, Value)>>>;

async fn capture(
    State(seen): State<Captured>,
    Path(sink): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    seen.lock().unwrap().push((sink.clone(), body));
    if sink == "broken" {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn spawn_capture() -> (String, Captured) {
    let seen: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/{sink}", post(capture))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn endpoints(base: &str) -> FrontendEndpoints {
    FrontendEndpoints {
        lead_url: Some(format!("{base}/lead")),
        logs_url: Some(format!("{base}/logs")),
        crm_lead_url: Some(format!("{base}/crm")),
    }
}

fn submission() -> Submission {
    serde_json::from_value(json!({
        "userId": "u-9",
        "answers": { "area": "40m2", "name": "Olga" },
        "phone": "+79991234567"
    }))
    .unwrap()
}

fn meta() -> ClientMeta {
    ClientMeta {
        ip: "1.2.3.4".into(),
        user_agent: "Mozilla/5.0".into(),
        origin: None,
    }
}

fn decision(action: Action) -> Decision {
    Decision {
        score: 60.0,
        action,
        reason: "invalid phone".into(),
        source: quiz_antibot::decision::DecisionSource::Heuristic,
    }
}

fn sinks(seen: &Captured) -> Vec<String> {
    let mut v: Vec<String> = seen.lock().unwrap().iter().map(|(s, _)| s.clone()).collect();
    v.sort();
    v
}

fn body_for(seen: &Captured, sink: &str) -> Value {
    seen.lock()
        .unwrap()
        .iter()
        .find(|(s, _)| s == sink)
        .map(|(_, b)| b.clone())
        .expect("sink body captured")
}

#[tokio::test]
async fn challenge_goes_to_log_sheet_and_crm() {
    let (base, seen) = spawn_capture().await;
    let d = Dispatcher::new(reqwest::Client::new());
    let rec = DeliveryRecord::new(&submission(), &meta(), decision(Action::Challenge));

    d.dispatch(&endpoints(&base), rec).await.unwrap();

    assert_eq!(sinks(&seen), vec!["crm", "lead", "logs"]);

    let log = body_for(&seen, "logs");
    assert_eq!(log["type"], "quiz");
    assert_eq!(log["userId"], "u-9");
    assert_eq!(log["action"], "challenge");
    assert_eq!(log["ip"], "1.2.3.4");
    assert_eq!(log["answers"], "area: 40m2; name: Olga");

    let lead = body_for(&seen, "lead");
    assert_eq!(
        lead,
        json!({
            "name": "Olga",
            "phone": "+79991234567",
            "userId": "u-9",
            "comment": "Antibot status: CHALLENGE (invalid phone)",
            "source": "quiz"
        })
    );

    let crm = body_for(&seen, "crm");
    assert_eq!(crm["fields"]["NAME"], "Olga");
    assert_eq!(crm["fields"]["PHONE"][0]["VALUE"], "+79991234567");
}

#[tokio::test]
async fn deny_is_logged_but_not_forwarded() {
    let (base, seen) = spawn_capture().await;
    let d = Dispatcher::new(reqwest::Client::new());
    let rec = DeliveryRecord::new(&submission(), &meta(), decision(Action::Deny));

    d.dispatch(&endpoints(&base), rec).await.unwrap();
    assert_eq!(sinks(&seen), vec!["logs"]);
}

#[tokio::test]
async fn failing_sinks_do_not_stop_the_others() {
    let (base, seen) = spawn_capture().await;
    let d = Dispatcher::new(reqwest::Client::new());
    let ep = FrontendEndpoints {
        logs_url: Some(format!("{base}/broken")),
        lead_url: Some("http://127.0.0.1:1/unreachable".into()),
        crm_lead_url: Some(format!("{base}/crm")),
    };
    let rec = DeliveryRecord::new(&submission(), &meta(), decision(Action::Allow));

    d.dispatch(&ep, rec).await.expect("delivery task must not panic");
    assert_eq!(sinks(&seen), vec!["broken", "crm"]);
}

#[tokio::test]
async fn quiz_routes_delivery_by_origin_without_waiting() {
    let (base, seen) = spawn_capture().await;
    let (other_base, other_seen) = spawn_capture().await;

    let mut cfg = AppConfig::new(ClassifierCredentials {
        client_id: "id".into(),
        client_secret: "secret".into(),
    });
    cfg.frontends = FrontendRouting::new(endpoints(&other_base))
        .with_origin("https://quiz.example", endpoints(&base));
    let app = router(AppState::new(
        cfg,
        Arc::new(DisabledClassifier),
        reqwest::Client::new(),
    ));

    let body = json!({
        "userId": "u-1",
        "events": [{ "type": "click", "label": "q1", "intervalMs": 600 }],
        "answers": { "name": "Ivan" },
        "phone": "+79991234567",
        "durationMs": 15000
    });
    let req = Request::builder()
        .method("POST")
        .uri("/quiz")
        .header("content-type", "application/json")
        .header("origin", "https://quiz.example")
        .header("user-agent", "Mozilla/5.0")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Delivery runs after the response; poll for it.
    for _ in 0..100 {
        if seen.lock().unwrap().len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(sinks(&seen), vec!["crm", "lead", "logs"]);
    assert_eq!(body_for(&seen, "lead")["comment"], "Antibot status: ALLOW ()");
    assert!(other_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn short_circuit_denials_are_not_delivered() {
    let (base, seen) = spawn_capture().await;
    let mut cfg = AppConfig::new(ClassifierCredentials {
        client_id: "id".into(),
        client_secret: "secret".into(),
    });
    cfg.frontends = FrontendRouting::new(endpoints(&base));
    let app = router(AppState::new(
        cfg,
        Arc::new(DisabledClassifier),
        reqwest::Client::new(),
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/quiz")
        .header("content-type", "application/json")
        .header("user-agent", "HeadlessChrome/120")
        .body(Body::from(r#"{"phone": "+79991234567"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(seen.lock().unwrap().is_empty());
}
