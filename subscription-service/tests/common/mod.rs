//! Test helper module for subscription-service integration tests.
//!
//! Boots the real router on a random port over the in-memory store.

#![allow(dead_code)]

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use subscription_service::config::SubscriptionConfig;
use subscription_service::middleware::USER_ID_HEADER;
use subscription_service::services::{Store, UserStore};
use subscription_service::startup::Application;
use uuid::Uuid;

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub http_address: String,
    pub http_port: u16,
    pub store: Arc<dyn Store>,
    pub client: Client,
    /// Caller identity sent with every API request made through the helpers.
    pub user_id: Uuid,
}

fn test_config(seed_demo_data: bool) -> SubscriptionConfig {
    SubscriptionConfig {
        common: CoreConfig { port: 0 },
        service_name: "subscription-service-test".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "warn".to_string(),
        otlp_endpoint: None,
        database: None,
        seed_demo_data,
    }
}

impl TestApp {
    /// Spawn an empty application on a random port.
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    /// Spawn with the demo data seeded. Requests run as the demo user.
    pub async fn spawn_seeded() -> Self {
        let mut app = Self::spawn_with(true).await;
        let demo = app
            .store
            .find_user_by_username("demo")
            .await
            .expect("Failed to look up demo user")
            .expect("Demo user was not seeded");
        app.user_id = demo.user_id;
        app
    }

    async fn spawn_with(seed_demo_data: bool) -> Self {
        let app = Application::build(test_config(seed_demo_data))
            .await
            .expect("Failed to build test application");

        let http_port = app.http_port();
        let store = app.store();
        let http_address = format!("http://127.0.0.1:{}", http_port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            http_address,
            http_port,
            store,
            client,
            user_id: Uuid::new_v4(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.http_address, path)
    }

    fn as_user(&self, builder: RequestBuilder, user_id: Uuid) -> RequestBuilder {
        builder.header(USER_ID_HEADER, user_id.to_string())
    }

    pub async fn get(&self, path: &str) -> Response {
        self.get_as(path, self.user_id).await
    }

    pub async fn get_as(&self, path: &str, user_id: Uuid) -> Response {
        self.as_user(self.client.get(self.url(path)), user_id)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.as_user(self.client.post(self.url(path)), self.user_id)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_empty(&self, path: &str) -> Response {
        self.as_user(self.client.post(self.url(path)), self.user_id)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.as_user(self.client.put(self.url(path)), self.user_id)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.as_user(self.client.delete(self.url(path)), self.user_id)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a subscription and return its JSON representation.
    pub async fn create_subscription(&self, body: Value) -> Value {
        let response = self.post("/api/subscriptions", &body).await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse JSON")
    }
}

/// A valid create body with the given name and cost.
pub fn subscription_body(name: &str, cost: f64) -> Value {
    serde_json::json!({
        "name": name,
        "cost": cost,
        "billingCycle": "monthly",
        "startDate": "2024-01-01T00:00:00Z"
    })
}
