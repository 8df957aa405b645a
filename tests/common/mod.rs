// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::response::Response;
use fitbuddy_sync::config::Config;
use fitbuddy_sync::db::{FirestoreDb, MemoryStore, WellnessStore};
use fitbuddy_sync::middleware::auth::create_jwt;
use fitbuddy_sync::models::{CredentialRecord, UserProfile};
use fitbuddy_sync::routes::create_router;
use fitbuddy_sync::AppState;
use std::sync::Arc;

/// Base URL nothing listens on; tests that must not reach Fitbit use it.
#[allow(dead_code)]
pub const UNREACHABLE_FITBIT: &str = "http://127.0.0.1:9";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test config pointing Fitbit calls at `fitbit_api_base`.
#[allow(dead_code)]
pub fn test_config(fitbit_api_base: &str) -> Config {
    let mut config = Config::test_default();
    config.fitbit_api_base = fitbit_api_base.to_string();
    config
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store.
#[allow(dead_code)]
pub fn create_test_app_with_config(
    config: Config,
) -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(
        config,
        store.clone() as Arc<dyn WellnessStore>,
    ));
    (create_router(state.clone()), state, store)
}

/// Create a test app whose Fitbit calls go to `fitbit_api_base`.
#[allow(dead_code)]
pub fn create_test_app_with_fitbit(
    fitbit_api_base: &str,
) -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    create_test_app_with_config(test_config(fitbit_api_base))
}

/// Create a test app that must never reach Fitbit.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    create_test_app_with_fitbit(UNREACHABLE_FITBIT)
}

/// Session token for `user_id` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    create_jwt(user_id, &Config::test_default().jwt_signing_key).unwrap()
}

/// Store a connected Fitbit credential pair for `user_id`.
#[allow(dead_code)]
pub async fn seed_connection(store: &dyn WellnessStore, user_id: &str, access_token: &str) {
    store
        .set_credentials(
            user_id,
            &CredentialRecord {
                access_token: access_token.to_string(),
                refresh_token: format!("{}-refresh", access_token),
                expires_in: 28800,
                user_id: Some("FB123".to_string()),
                scope: Some("activity heartrate sleep".to_string()),
                updated_at: "2024-05-01T00:00:00Z".to_string(),
            },
        )
        .await
        .unwrap();

    let mut profile = UserProfile::new(user_id);
    profile.fitbit_connected = true;
    store.set_profile(&profile).await.unwrap();
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ─── Fake Fitbit ─────────────────────────────────────────────

/// Activity summary response.
#[allow(dead_code)]
pub fn activity_body(steps: u32, calories: u32, active_minutes: u32) -> serde_json::Value {
    serde_json::json!({
        "activities": [],
        "summary": {
            "steps": steps,
            "caloriesOut": calories,
            "fairlyActiveMinutes": active_minutes / 2,
            "veryActiveMinutes": active_minutes - active_minutes / 2,
            "floors": 10,
            "distances": [{"activity": "total", "distance": 8.4}]
        }
    })
}

/// Sleep response with one night's summary.
#[allow(dead_code)]
pub fn sleep_body(minutes_asleep: u32) -> serde_json::Value {
    serde_json::json!({
        "sleep": [],
        "summary": {
            "totalMinutesAsleep": minutes_asleep,
            "stages": {"deep": 80, "light": 250, "rem": 90, "wake": 30}
        }
    })
}

/// Heart rate response with a resting value.
#[allow(dead_code)]
pub fn heart_body(resting: u32) -> serde_json::Value {
    serde_json::json!({
        "activities-heart": [{"dateTime": "2024-05-01", "value": {"restingHeartRate": resting}}]
    })
}

/// Serve all three daily resources for `date` to callers presenting `token`.
#[allow(dead_code)]
pub async fn mount_day(
    server: &wiremock::MockServer,
    date: &str,
    token: &str,
    steps: u32,
    calories: u32,
    active_minutes: u32,
) {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    let bearer = format!("Bearer {}", token);
    let resources = [
        (
            format!("/1/user/-/activities/date/{}.json", date),
            activity_body(steps, calories, active_minutes),
        ),
        (
            format!("/1.2/user/-/sleep/date/{}.json", date),
            sleep_body(450),
        ),
        (
            format!("/1/user/-/activities/heart/date/{}/1d.json", date),
            heart_body(58),
        ),
    ];

    for (resource_path, body) in resources {
        Mock::given(method("GET"))
            .and(path(resource_path))
            .and(header("Authorization", bearer.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}
