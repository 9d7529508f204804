//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the router against a fresh in-memory database, so each
//! test starts from an empty `mortality_records` table.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mortality_insight::config::Config;
use mortality_insight::db::{create_in_memory_pool, migrations};
use mortality_insight::handlers;
use mortality_insight::state::AppState;
use std::path::Path;
use tower::ServiceExt;

/// Observations spanning two months, two areas and three loss causes.
pub const SAMPLE_CSV: &str = "\
date,area_name,generation,level1_name,category_code,category_short_name,count,rate,avg_weight_grams
2024-01-10,Nord,G23,Sykdom,101,Sår,10,0.10,1000
2024-01-20,Nord,G23,Håndtering,201,Tap,30,0.30,1500
2024-01-25,Vest,G24,Sykdom,101,Sår,20,0.20,500
2024-02-05,Nord,G23,Sykdom,101,Sår,5,0.05,1000
2024-02-12,Vest,G24,Miljø,301,Alger,2,0.02,2000
";

pub struct TestClient {
    pub state: AppState,
}

impl TestClient {
    pub fn new() -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let mut conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&mut conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        Self {
            state: AppState::new(pool, Config::default()),
        }
    }

    /// A client whose database already holds [`SAMPLE_CSV`].
    pub async fn with_sample_data() -> Self {
        let client = Self::new();
        let (status, _) = client.post_csv("/api/records/import", SAMPLE_CSV).await;
        assert_eq!(status, StatusCode::OK, "Sample import failed");
        client
    }

    pub fn router(&self) -> Router {
        handlers::routes().with_state(self.state.clone())
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    /// Make a GET request and return status, content type and body.
    pub async fn get_with_content_type(&self, uri: &str) -> (StatusCode, String, String) {
        let response = self
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (
            status,
            content_type,
            String::from_utf8_lossy(&body).to_string(),
        )
    }

    /// POST a CSV body and return status and body.
    pub async fn post_csv(&self, uri: &str, csv: &str) -> (StatusCode, String) {
        let response = self
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "text/csv")
                    .body(Body::from(csv.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    /// Get JSON from an endpoint and parse it.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        uri: &str,
    ) -> (StatusCode, Option<T>) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).ok();
        (status, parsed)
    }
}
