//! End-to-end tests for the dashboard controller against a mock backend.
//!
//! Each test starts its own wiremock server, so tests run in isolation.
//! They drive the public library API the way the binary's subcommands do:
//! fetch, render, mutate, resync.

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use vidboard::age::AgeBucket;
use vidboard::api::{ApiClient, ApiSettings};
use vidboard::dashboard::{Dashboard, ViewState};
use vidboard::model::DurationSetting;
use vidboard::view::{CategoryTags, DashboardView, ManagerView, SectionBody};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dashboard_for(server: &MockServer) -> Dashboard {
    let settings = ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    };
    Dashboard::new(ApiClient::new(&settings).unwrap())
}

fn video(title: &str, channel: &str, hours_ago: i64) -> Value {
    json!({
        "title": title,
        "url": format!("https://www.youtube.com/watch?v={}", title),
        "channel": channel,
        "publishedAt": (Utc::now() - TimeDelta::hours(hours_ago)).to_rfc3339(),
    })
}

fn sample_feed() -> Value {
    json!({
        "Music": [video("song", "@band", 3), video("live", "@band", 50)],
        "Science": [],
        "Maths": [video("proof", "@numberphile", 24 * 40)],
    })
}

async fn mount_feed(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/videos.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// Feed
// ============================================================================

#[tokio::test]
async fn test_load_feed_renders_sections_in_backend_order() {
    let server = MockServer::start().await;
    mount_feed(&server, sample_feed()).await;

    let mut dashboard = dashboard_for(&server);
    dashboard.load_feed().await.unwrap();
    assert_eq!(dashboard.feed_state(), &ViewState::Rendered);

    let view = dashboard.view(Utc::now()).unwrap();
    let titles: Vec<&str> = view.sections().iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Music", "Science", "Maths"]);

    let ages: Vec<AgeBucket> = view.sections()[0].cards().iter().map(|c| c.age).collect();
    assert_eq!(ages, vec![AgeBucket::Hours(3), AgeBucket::Days(2)]);
    assert_eq!(view.sections()[1].body, SectionBody::NoVideos);
    assert_eq!(view.sections()[2].cards()[0].age, AgeBucket::Months(1));
}

#[tokio::test]
async fn test_empty_feed_renders_no_content() {
    let server = MockServer::start().await;
    mount_feed(&server, json!({})).await;

    let mut dashboard = dashboard_for(&server);
    dashboard.load_feed().await.unwrap();
    assert_eq!(dashboard.view(Utc::now()), Some(DashboardView::NoContent));
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_feed()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos.json"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": "Failed to retrieve videos data"})),
        )
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    dashboard.load_feed().await.unwrap();
    let err = dashboard.load_feed().await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "Failed to load videos: Failed to retrieve videos data"
    );
    assert!(dashboard.feed_state().error().is_some());
    assert_eq!(dashboard.view(Utc::now()).unwrap().card_count(), 3);
}

#[tokio::test]
async fn test_refresh_summary_is_followed_by_feed_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 4})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_feed()))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    dashboard.refresh_feed().await.unwrap();
    assert_eq!(dashboard.feed().unwrap().video_count(), 3);
}

// ============================================================================
// Preferences
// ============================================================================

#[tokio::test]
async fn test_add_channel_resyncs_preferences_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/channels"))
        .and(body_json(json!({"channel": "@numberphile", "category": "Maths"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Maths": ["@numberphile", "@numberphile", "@3b1b"],
            "Music": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    let message = dashboard
        .add_channel(" @numberphile ", "Maths")
        .await
        .unwrap();
    assert_eq!(message, "Added '@numberphile' to 'Maths'");

    assert_eq!(
        dashboard.manager_view(),
        Some(ManagerView::Categories(vec![
            CategoryTags {
                name: "Maths".to_string(),
                channels: vec!["@numberphile".to_string(), "@3b1b".to_string()],
            },
            CategoryTags {
                name: "Music".to_string(),
                channels: vec![],
            },
        ]))
    );
}

#[tokio::test]
async fn test_rejected_mutation_skips_resync() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/categories/Old%20Stuff"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Category not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    let err = dashboard.delete_category("Old Stuff").await.unwrap_err();
    assert_eq!(
        err.user_message(),
        "Failed to delete category: Category not found"
    );
}

#[tokio::test]
async fn test_blank_name_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    let err = dashboard.add_category("   ").await.unwrap_err();
    assert_eq!(err.user_message(), "Category name must not be empty");
}

#[tokio::test]
async fn test_remove_channel_sends_category_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/channels/@band"))
        .and(body_json(json!({"category": "Music"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Music": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    let message = dashboard.remove_channel("@band", Some("Music")).await.unwrap();
    assert_eq!(message, "Removed '@band' from 'Music'");
}

// ============================================================================
// Duration
// ============================================================================

#[tokio::test]
async fn test_duration_save_reloads_feed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/settings/duration"))
        .and(body_json(json!({"days": 14, "months": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_feed()))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    let setting = dashboard
        .save_duration_from_inputs(Some("14"), Some(""))
        .await
        .unwrap();
    assert_eq!(setting, DurationSetting { days: 14, months: 0 });
    assert_eq!(dashboard.duration(), Some(setting));
    assert_eq!(dashboard.feed_state(), &ViewState::Rendered);
}

#[tokio::test]
async fn test_duration_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/settings/duration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"days": 3, "months": 1})))
        .mount(&server)
        .await;

    let mut dashboard = dashboard_for(&server);
    let setting = dashboard.load_duration_setting().await.unwrap();
    assert_eq!(setting, DurationSetting { days: 3, months: 1 });
}
