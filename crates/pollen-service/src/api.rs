//! REST API endpoints for the pollen service.
//!
//! Handlers are thin wrappers over [`ReportStore`] queries. The store is
//! safe to call concurrently, so no handler takes a lock.
//!
//! ## Error Handling
//!
//! Errors are returned as `{"message": "..."}`. Unknown areas and
//! sub-areas return 404, every other store failure returns 500.
//!
//! [`ReportStore`]: pollen_store::ReportStore

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use pollen_types::Report;

use crate::state::{AppState, SyncSnapshot};

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(ping))
        .route("/status", get(get_status))
        .route("/regions", get(list_regions))
        .route("/subregions", get(list_subregions))
        .route("/pollen", get(list_reports))
        .route("/pollen/subregion/{subregion}", get(get_subregion))
        .route("/pollen/region/{region}", get(get_region))
}

/// Plain message body, used for liveness and errors.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".to_string(),
    })
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub storage: StorageHealth,
    pub sync: SyncSnapshot,
}

/// Storage health information.
#[derive(Debug, Serialize)]
pub struct StorageHealth {
    /// Whether the store answered.
    pub ok: bool,
    /// Number of known areas.
    pub region_count: usize,
    /// Error message if the store is not ok.
    pub error: Option<String>,
}

/// Report store reachability and sync statistics.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let storage = match state.store.health_check().await {
        Ok(region_count) => StorageHealth {
            ok: true,
            region_count,
            error: None,
        },
        Err(e) => StorageHealth {
            ok: false,
            region_count: 0,
            error: Some(e.to_string()),
        },
    };

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        storage,
        sync: state.sync.snapshot().await,
    })
}

async fn list_regions(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.all_regions().await?))
}

async fn list_subregions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.all_subregions().await?))
}

async fn list_reports(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Report>>, AppError> {
    Ok(Json(state.store.all_reports().await?))
}

async fn get_subregion(
    State(state): State<Arc<AppState>>,
    Path(subregion): Path<String>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(state.store.get_by_subregion(&subregion).await?))
}

async fn get_region(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
) -> Result<Json<Vec<Report>>, AppError> {
    Ok(Json(state.store.get_by_region(&region).await?))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    Store(pollen_store::Error),
}

impl From<pollen_store::Error> for AppError {
    fn from(e: pollen_store::Error) -> Self {
        if e.is_not_found() {
            AppError::NotFound
        } else {
            AppError::Store(e)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "No data found".to_string()),
            AppError::Store(e) => {
                warn!("Store error while serving request: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use pollen_store::{IndexedStore, MemoryBackend, ReportStore};
    use pollen_types::{DayReading, Substance};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::state::SyncStats;

    fn create_report(area: &str, sub_area: &str) -> Report {
        Report {
            area: area.to_string(),
            sub_area: sub_area.to_string(),
            items: vec![Substance {
                name: "Roggen".to_string(),
                today: DayReading::from_code("2"),
                ..Default::default()
            }],
        }
    }

    fn create_state(store: Arc<dyn ReportStore>) -> Arc<AppState> {
        AppState::new(store, Config::default(), Arc::new(SyncStats::new()))
    }

    async fn create_test_state() -> Arc<AppState> {
        let store = IndexedStore::new(MemoryBackend::new());
        for report in [
            create_report("region-a", "subregion-aa"),
            create_report("region-a", "subregion-ab"),
            create_report("region-c", ""),
        ] {
            store.save(&report).await.unwrap();
        }
        create_state(Arc::new(store))
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router()
            .with_state(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn sorted_strings(json: &serde_json::Value) -> Vec<String> {
        let mut values: Vec<String> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        values.sort();
        values
    }

    #[tokio::test]
    async fn test_ping_endpoint() {
        let state = create_state(Arc::new(IndexedStore::new(MemoryBackend::new())));

        let (status, json) = get_json(state, "/ping").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"message": "pong"}));
    }

    #[tokio::test]
    async fn test_list_regions() {
        let (status, json) = get_json(create_test_state().await, "/regions").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(sorted_strings(&json), vec!["region_a", "region_c"]);
    }

    #[tokio::test]
    async fn test_list_subregions() {
        let (status, json) = get_json(create_test_state().await, "/subregions").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            sorted_strings(&json),
            vec!["region_c", "subregion_aa", "subregion_ab"]
        );
    }

    #[tokio::test]
    async fn test_list_reports() {
        let (status, json) = get_json(create_test_state().await, "/pollen").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_reports_empty() {
        let state = create_state(Arc::new(IndexedStore::new(MemoryBackend::new())));

        let (status, json) = get_json(state, "/pollen").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_subregion() {
        let (status, json) =
            get_json(create_test_state().await, "/pollen/subregion/subregion_aa").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["region"], "region-a");
        assert_eq!(json["sub_region"], "subregion-aa");
        assert_eq!(json["pollen"][0]["today"]["description"], "mittlere Belastung");
    }

    #[tokio::test]
    async fn test_get_subregion_not_found() {
        let (status, json) =
            get_json(create_test_state().await, "/pollen/subregion/nowhere").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "No data found");
    }

    #[tokio::test]
    async fn test_get_region() {
        let (status, json) = get_json(create_test_state().await, "/pollen/region/region-a").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_region_without_sub_areas() {
        let (status, json) = get_json(create_test_state().await, "/pollen/region/region_c").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["region"], "region-c");
        assert_eq!(json[0]["sub_region"], "");
    }

    #[tokio::test]
    async fn test_get_region_not_found() {
        let (status, _) = get_json(create_test_state().await, "/pollen/region/region-x").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (status, json) = get_json(create_test_state().await, "/status").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["version"].is_string());
        assert!(json["timestamp"].is_string());
        assert_eq!(json["storage"]["ok"], true);
        assert_eq!(json["storage"]["region_count"], 2);
        assert_eq!(json["sync"]["success_count"], 0);
    }

    /// Store that cannot reach its backend.
    struct DownStore;

    fn down() -> pollen_store::Error {
        pollen_store::Error::Unreachable {
            url: "redis://localhost:6379/0".to_string(),
            reason: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl ReportStore for DownStore {
        async fn save(&self, _report: &Report) -> pollen_store::Result<()> {
            Err(down())
        }

        async fn get_by_subregion(&self, _sub_area: &str) -> pollen_store::Result<Report> {
            Err(down())
        }

        async fn get_by_region(&self, _area: &str) -> pollen_store::Result<Vec<Report>> {
            Err(down())
        }

        async fn all_reports(&self) -> pollen_store::Result<Vec<Report>> {
            Err(down())
        }

        async fn all_regions(&self) -> pollen_store::Result<Vec<String>> {
            Err(down())
        }

        async fn all_subregions(&self) -> pollen_store::Result<Vec<String>> {
            Err(down())
        }

        async fn health_check(&self) -> pollen_store::Result<usize> {
            Err(down())
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        for uri in ["/regions", "/subregions", "/pollen", "/pollen/subregion/a", "/pollen/region/a"] {
            let (status, json) = get_json(create_state(Arc::new(DownStore)), uri).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert!(json["message"].as_str().unwrap().contains("connection refused"));
        }
    }

    #[tokio::test]
    async fn test_status_reports_store_failure() {
        let (status, json) = get_json(create_state(Arc::new(DownStore)), "/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["storage"]["ok"], false);
        assert!(json["storage"]["error"].is_string());
    }

    #[test]
    fn test_app_error_from_not_found() {
        let err: AppError = pollen_store::Error::NotFound("x".to_string()).into();
        assert!(matches!(err, AppError::NotFound));
    }
}
