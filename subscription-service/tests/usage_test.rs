//! Usage logging integration tests.

mod common;

use common::{subscription_body, TestApp};
use serde_json::Value;
use subscription_service::services::UsageLedger;
use uuid::Uuid;

#[tokio::test]
async fn logging_usage_updates_score_and_last_usage() {
    let app = TestApp::spawn().await;
    let created = app
        .create_subscription(subscription_body("Netflix", 15.99))
        .await;
    let id = created["id"].as_str().unwrap();

    let before: Vec<Value> = app.get("/api/subscriptions").await.json().await.unwrap();
    assert_eq!(before[0]["usageCount"], 0);

    let response = app
        .post_empty(&format!("/api/subscriptions/{}/usage", id))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let entry: Value = response.json().await.unwrap();
    assert_eq!(entry["subscriptionId"], id);
    assert!(entry["timestamp"].is_string());

    let fetched: Value = app
        .get(&format!("/api/subscriptions/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["lastUsageDate"], entry["timestamp"]);

    let after: Vec<Value> = app.get("/api/subscriptions").await.json().await.unwrap();
    assert_eq!(after[0]["usageCount"], 1);
    assert_eq!(after[0]["valueScore"], "Average");
    assert_eq!(after[0]["costPerUse"], "15.99");
    assert_eq!(after[0]["daysUntilRenewal"], before[0]["daysUntilRenewal"]);
}

#[tokio::test]
async fn usage_history_is_newest_first() {
    let app = TestApp::spawn().await;
    let created = app
        .create_subscription(subscription_body("Gym Membership", 50.0))
        .await;
    let path = format!("/api/subscriptions/{}/usage", created["id"].as_str().unwrap());

    for _ in 0..3 {
        let response = app.post_empty(&path).await;
        assert_eq!(response.status().as_u16(), 201);
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    let entries: Vec<Value> = app.get(&path).await.json().await.unwrap();
    assert_eq!(entries.len(), 3);
    let first = entries[0]["timestamp"].as_str().unwrap();
    let last = entries[2]["timestamp"].as_str().unwrap();
    assert!(
        chrono::DateTime::parse_from_rfc3339(first).unwrap()
            >= chrono::DateTime::parse_from_rfc3339(last).unwrap()
    );
}

#[tokio::test]
async fn logging_usage_for_unknown_subscription_returns_404() {
    let app = TestApp::spawn().await;

    let response = app
        .post_empty(&format!("/api/subscriptions/{}/usage", Uuid::new_v4()))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn deleting_subscription_drops_usage() {
    let app = TestApp::spawn().await;
    let created = app
        .create_subscription(subscription_body("Netflix", 15.99))
        .await;
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

    app.post_empty(&format!("/api/subscriptions/{}/usage", id))
        .await;
    app.delete(&format!("/api/subscriptions/{}", id)).await;

    let remaining = app.store.list_usage(id).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn logging_usage_leaves_other_subscriptions_untouched() {
    let app = TestApp::spawn().await;
    let used = app
        .create_subscription(subscription_body("Netflix", 15.99))
        .await;
    let idle = app
        .create_subscription(subscription_body("Adobe Cloud", 54.99))
        .await;
    let idle_id = idle["id"].as_str().unwrap();

    let response = app
        .post_empty(&format!("/api/subscriptions/{}/usage", used["id"].as_str().unwrap()))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let views: Vec<Value> = app.get("/api/subscriptions").await.json().await.unwrap();
    let idle_view = views
        .iter()
        .find(|v| v["id"] == idle_id)
        .expect("idle subscription missing from list");
    assert_eq!(idle_view["usageCount"], 0);
    assert_eq!(idle_view["valueScore"], "Waste");
    assert_eq!(idle_view["costPerUse"], "54.99");
    assert!(idle_view["lastUsageDate"].is_null());

    let used_view = views.iter().find(|v| v["id"] == used["id"]).unwrap();
    assert_eq!(used_view["usageCount"], 1);

    let history: Vec<Value> = app
        .get(&format!("/api/subscriptions/{}/usage", idle_id))
        .await
        .json()
        .await
        .unwrap();
    assert!(history.is_empty());
}
