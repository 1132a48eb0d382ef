//! Integration tests for uhcsdb-catalog routes
//!
//! Each test builds a temporary data folder with a seeded store and drives
//! the router directly with `oneshot`.

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use tower::util::ServiceExt;

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn test_index_routes_show_first_page() {
    let fx = fixture(100).await;

    for uri in ["/", "/index", "/entries/"] {
        let response = app(&fx).await.oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert!(is_html(&response));

        let html = body_text(response).await;
        assert_eq!(card_count(&html), 24, "{}", uri);
        assert!(html.contains(r#"href="/entries/2""#), "{} should link to page 2", uri);
        assert!(!html.contains(r#"href="/entries/0""#), "{} should not link back", uri);
    }
}

#[tokio::test]
async fn test_last_and_past_last_pages() {
    let fx = fixture(100).await;

    let response = app(&fx).await.oneshot(get_request("/entries/5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert_eq!(card_count(&html), 4);
    assert!(html.contains(r#"href="/entries/4""#));
    assert!(!html.contains(r#"href="/entries/6""#));
    assert!(html.contains(r#"href="/micrograph/100""#));

    let response = app(&fx).await.oneshot(get_request("/entries/6")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(card_count(&body_text(response).await), 0);

    let response = app(&fx).await.oneshot(get_request("/entries/0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(card_count(&body_text(response).await), 0);
}

#[tokio::test]
async fn test_all_entries_unpaginated() {
    let fx = fixture(100).await;

    let response = app(&fx).await.oneshot(get_request("/all/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert_eq!(card_count(&html), 100);
    assert!(!html.contains(r#"class="pager""#));
}

#[tokio::test]
async fn test_favorites_uses_configured_ids() {
    let fx = fixture(100).await;

    // Default favorites: only 73 exists in a 100-entry store
    let response = app(&fx).await.oneshot(get_request("/favorites/")).await.unwrap();
    let html = body_text(response).await;
    assert_eq!(card_count(&html), 1);
    assert!(html.contains(r#"href="/micrograph/73""#));

    let mut settings = fx.settings.clone();
    settings.favorites = vec![5, 3, 999];
    let response = app_with(settings).await.oneshot(get_request("/favorites/")).await.unwrap();
    let html = body_text(response).await;
    assert_eq!(card_count(&html), 2);
}

// =============================================================================
// Detail pages
// =============================================================================

#[tokio::test]
async fn test_micrograph_detail_with_owner() {
    let fx = fixture(10).await;

    let response = app(&fx).await.oneshot(get_request("/micrograph/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    // Sample 1 is annealed for 2 hours
    assert!(html.contains("120 minutes"));
    assert!(html.contains("800 C"));
    assert!(html.contains("Brian DeCost"));
    assert!(html.contains("/static/micrographs/micrograph1.tif"));
    assert!(html.contains(r#"href="/visual_query/1""#));
}

#[tokio::test]
async fn test_micrograph_not_found() {
    let fx = fixture(10).await;

    let response = app(&fx).await.oneshot(get_request("/micrograph/1000")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("No micrograph with id 1000"));
}

// =============================================================================
// Visual query
// =============================================================================

#[tokio::test]
async fn test_visual_query_ordered_by_distance() {
    let fx = fixture(30).await;

    let response = app(&fx).await.oneshot(get_request("/visual_query/10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    // Entry 10_000 is the nearest vector but has no record, so it is dropped
    // and the page shows the query card plus one fewer neighbor than requested
    assert_eq!(card_count(&html), fx.settings.neighbors);
    assert!(!html.contains("/micrograph/10000"));

    let pos = |id: i64| {
        html.find(&format!(r#"href="/micrograph/{}""#, id))
            .unwrap_or_else(|| panic!("neighbor {} missing", id))
    };
    assert!(pos(10) < pos(9), "query card first");
    assert!(pos(9) < pos(11), "ties ordered by id");
    assert!(pos(11) < pos(8));
    assert!(pos(8) < pos(12));
    assert!(html.contains("distance 1.000"));
    assert!(html.contains("distance 2.000"));
}

#[tokio::test]
async fn test_visual_query_unknown_entry() {
    let fx = fixture(10).await;

    let response = app(&fx).await.oneshot(get_request("/visual_query/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_visual_query_without_index() {
    let fx = fixture(10).await;
    std::fs::remove_file(fx.settings.features_path()).unwrap();

    let response = app(&fx).await.oneshot(get_request("/visual_query/3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Explorer bridge
// =============================================================================

#[tokio::test]
async fn test_visualize_explorer_down_is_bad_gateway() {
    let fx = fixture(5).await;

    let response = app(&fx).await.oneshot(get_request("/visualize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("Explorer unreachable"));
    assert!(!html.contains("autoload.js"));
}

#[tokio::test]
async fn test_visualize_embeds_explorer_session() {
    let fx = fixture(5).await;
    let explorer = spawn_fake_explorer(&["/visualize"]).await;

    let mut settings = fx.settings.clone();
    settings.explorer.public_url = explorer.clone();
    let response = app_with(settings).await.oneshot(get_request("/visualize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(&format!("{}/visualize/autoload.js?session_id=", explorer)));
    assert!(html.contains(r#"class="explorer-root""#));
}

#[tokio::test]
async fn test_visualize_missing_view_is_bad_gateway() {
    let fx = fixture(5).await;
    let explorer = spawn_fake_explorer(&["/other"]).await;

    let mut settings = fx.settings.clone();
    settings.explorer.public_url = explorer;
    let response = app_with(settings).await.oneshot(get_request("/visualize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("no view named /visualize"));
}

// =============================================================================
// Static files and health
// =============================================================================

#[tokio::test]
async fn test_static_files_limited_to_allowed_extensions() {
    let fx = fixture(1).await;

    let response = app(&fx)
        .await
        .oneshot(get_request("/static/thumbs/micrograph1.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&fx)
        .await
        .oneshot(get_request("/static/thumbs/notes.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let fx = fixture(1).await;

    let response = app(&fx).await.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "uhcsdb-catalog");
}
