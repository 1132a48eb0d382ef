//! Shared fixtures for catalog integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tempfile::TempDir;
use uhcsdb_catalog::bridge::ExplorerClient;
use uhcsdb_catalog::similarity::{FeatureIndex, NeighborIndex};
use uhcsdb_catalog::supervisor::{ExplorerSupervisor, LaunchArgs};
use uhcsdb_catalog::{build_router, AppState};
use uhcsdb_common::api::{CreateSessionRequest, CreateSessionResponse, HealthResponse};
use uhcsdb_common::db::{connect_readonly, init_database};
use uhcsdb_common::Settings;
use uuid::Uuid;

/// Explorer address nothing listens on
pub const DEAD_EXPLORER: &str = "http://127.0.0.1:9";

pub const CLASSES: [&str; 3] = ["pearlite", "martensite", "spheroidite"];

/// Temporary data folder holding a seeded store, a feature file and thumbnails
pub struct Fixture {
    pub dir: TempDir,
    pub settings: Settings,
}

/// Seed `count` micrographs with ids 1..=count
///
/// Odd ids use sample 1 (2 hours at 800 C), even ids sample 2 (90 minutes at 970 C).
/// Feature vectors place entry `id` at x = id, plus one vector for id 10_000
/// that has no store record.
pub async fn fixture(count: i64) -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let mut settings = Settings {
        data_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    settings.explorer.public_url = DEAD_EXPLORER.to_string();
    settings.explorer.managed = false;
    settings.explorer.request_timeout_ms = 500;

    let pool = init_database(&settings.database_path()).await.unwrap();
    sqlx::query(
        "INSERT INTO user (id, username, givenname, familyname) VALUES (1, 'bdecost', 'Brian', 'DeCost')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO sample (id, label, anneal_time, anneal_time_unit, anneal_temperature) \
         VALUES (1, 'S1', 2, 'H', 800), (2, 'S2', 90, 'M', 970)",
    )
    .execute(&pool)
    .await
    .unwrap();
    for id in 1..=count {
        sqlx::query(
            "INSERT INTO micrograph (id, path, mstructure_class, micron_bar, micron_bar_px, sample_id, user_id) \
             VALUES (?, ?, ?, 10, 100, ?, 1)",
        )
        .bind(id)
        .bind(format!("micrograph{}.tif", id))
        .bind(CLASSES[(id as usize) % CLASSES.len()])
        .bind(if id % 2 == 1 { 1 } else { 2 })
        .execute(&pool)
        .await
        .unwrap();
    }
    pool.close().await;

    let mut features = serde_json::Map::new();
    for id in 1..=count {
        features.insert(id.to_string(), serde_json::json!([id as f32, 0.0]));
    }
    features.insert("10000".to_string(), serde_json::json!([10.25, 0.0]));
    let features_path = settings.features_path();
    std::fs::create_dir_all(features_path.parent().unwrap()).unwrap();
    std::fs::write(&features_path, serde_json::Value::Object(features).to_string()).unwrap();

    let thumbs = settings.static_dir().join("thumbs");
    std::fs::create_dir_all(&thumbs).unwrap();
    std::fs::write(thumbs.join("micrograph1.png"), b"\x89PNG fake").unwrap();
    std::fs::write(thumbs.join("notes.txt"), b"not an image").unwrap();

    Fixture { dir, settings }
}

/// Build the catalog router over a fixture
pub async fn app(fixture: &Fixture) -> Router {
    app_with(fixture.settings.clone()).await
}

pub async fn app_with(settings: Settings) -> Router {
    let pool = connect_readonly(&settings.database_path()).await.unwrap();
    let index: Option<Arc<dyn NeighborIndex>> = FeatureIndex::load(&settings.features_path())
        .await
        .ok()
        .map(|index| Arc::new(index) as Arc<dyn NeighborIndex>);

    let client = ExplorerClient::new(
        &settings.explorer.public_url,
        Duration::from_millis(settings.explorer.request_timeout_ms),
    )
    .unwrap();
    let supervisor = ExplorerSupervisor::new(settings.explorer.clone(), LaunchArgs::default(), client);

    build_router(AppState::new(pool, settings, index, supervisor))
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
}

/// Number of thumbnail cards on a rendered page
pub fn card_count(html: &str) -> usize {
    html.matches(r#"class="card""#).count()
}

/// Serve a stand-in explorer on an ephemeral port
///
/// It answers health checks and creates sessions only for the views listed.
pub async fn spawn_fake_explorer(views: &'static [&'static str]) -> String {
    let app = Router::new()
        .route(
            "/health",
            get(|| async {
                Json(HealthResponse {
                    status: "ok".to_string(),
                    module: "uhcsdb-explorer".to_string(),
                    version: "test".to_string(),
                    uptime_seconds: 0,
                })
            }),
        )
        .route(
            "/sessions",
            post(move |Json(req): Json<CreateSessionRequest>| async move {
                if views.contains(&req.app_path.as_str()) {
                    let created = CreateSessionResponse {
                        session_id: Uuid::new_v4(),
                        app_path: req.app_path,
                    };
                    (StatusCode::CREATED, Json(created)).into_response()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

pub fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/html"))
        .unwrap_or(false)
}
