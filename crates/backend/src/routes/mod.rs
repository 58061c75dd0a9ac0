use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use cimes_shared::geo::BoundingBox;
use cimes_shared::models::{
    Report, ReportCreation, ReportEdit, ReportStatus, ReportType, StatusChange,
};
use cimes_shared::wkt;
use serde::Deserialize;
use uuid::Uuid;

use crate::storage::Storage;

pub type AppState = Arc<Storage>;

/// Error body shape: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    fn not_found() -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            detail: "Report not found".to_string(),
        }
    }

    fn unprocessable(detail: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<String> for ApiError {
    fn from(e: String) -> Self {
        tracing::error!(error = %e, "Storage failure");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: "Internal storage error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

/// Validate a creation body and build the report to store.
pub fn new_report(creation: ReportCreation) -> Result<Report, ApiError> {
    if creation.title.trim().is_empty() {
        return Err(ApiError::unprocessable("title is required"));
    }
    let coord = wkt::decode_point(&creation.location)
        .map_err(|e| ApiError::unprocessable(format!("invalid location: {}", e)))?;

    Ok(Report {
        id: Uuid::new_v4(),
        title: creation.title,
        description: creation.description,
        report_type: creation.report_type,
        status: ReportStatus::Active,
        latitude: coord.latitude,
        longitude: coord.longitude,
        creation_time: chrono::Utc::now().to_rfc3339(),
        last_updated_time: None,
    })
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::unprocessable(format!("invalid report id: {}", raw)))
}

fn load(storage: &Storage, raw_id: &str) -> Result<Report, ApiError> {
    let id = parse_id(raw_id)?;
    storage.get_report(&id)?.ok_or_else(ApiError::not_found)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub bbox: Option<String>,
}

async fn report_types() -> Json<Vec<ReportType>> {
    Json(ReportType::ALL.to_vec())
}

async fn report_statuses() -> Json<Vec<ReportStatus>> {
    Json(ReportStatus::ALL.to_vec())
}

async fn list_reports(
    State(storage): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let area = query
        .bbox
        .as_deref()
        .map(BoundingBox::parse)
        .transpose()
        .map_err(|e| ApiError::bad_request(e))?;
    Ok(Json(storage.list_reports(area.as_ref())?))
}

async fn get_report(
    State(storage): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    load(&storage, &id).map(Json)
}

async fn create_report(
    State(storage): State<AppState>,
    Json(creation): Json<ReportCreation>,
) -> Result<Json<Report>, ApiError> {
    let report = new_report(creation)?;
    storage.save_report(&report)?;
    tracing::info!(id = %report.id, report_type = %report.report_type, "Report created");
    Ok(Json(report))
}

async fn edit_report(
    State(storage): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<ReportEdit>,
) -> Result<StatusCode, ApiError> {
    let mut report = load(&storage, &id)?;

    if let Some(title) = edit.title {
        if title.trim().is_empty() {
            return Err(ApiError::unprocessable("title is required"));
        }
        report.title = title;
    }
    if let Some(report_type) = edit.report_type {
        report.report_type = report_type;
    }
    if let Some(description) = edit.description {
        report.description = description;
    }
    if let Some(location) = edit.location {
        let coord = wkt::decode_point(&location)
            .map_err(|e| ApiError::unprocessable(format!("invalid location: {}", e)))?;
        report.latitude = coord.latitude;
        report.longitude = coord.longitude;
    }
    report.last_updated_time = Some(chrono::Utc::now().to_rfc3339());

    storage.save_report(&report)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    State(storage): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<StatusCode, ApiError> {
    let mut report = load(&storage, &id)?;
    report.status = change.status;
    report.last_updated_time = Some(chrono::Utc::now().to_rfc3339());
    storage.save_report(&report)?;
    tracing::info!(id = %report.id, status = %report.status, "Report status changed");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_report(
    State(storage): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if storage.delete_report(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found())
    }
}

pub fn router(storage: AppState) -> Router {
    Router::new()
        .route("/reports", get(list_reports).post(create_report))
        .route("/reports/types", get(report_types))
        .route("/reports/statuses", get(report_statuses))
        .route(
            "/reports/{id}",
            get(get_report).patch(edit_report).delete(delete_report),
        )
        .route("/reports/{id}/status", patch(change_status))
        .with_state(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn test_app() -> (tempfile::TempDir, AppState, Router) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("reports.redb")).unwrap();
        let app = router(storage.clone());
        (dir, storage, app)
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn creation_body(location: &str) -> serde_json::Value {
        serde_json::json!({
            "title": "Trail Hazard!",
            "report_type": "danger",
            "description": "Fallen tree blocking path.",
            "location": location
        })
    }

    #[tokio::test]
    async fn test_create_report_decodes_location() {
        let (_dir, storage, app) = test_app();

        let resp = app
            .oneshot(json_request(
                Method::POST,
                "/reports",
                creation_body("POINT(6.86600 45.83200)"),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["latitude"], 45.832);
        assert_eq!(json["longitude"], 6.866);
        assert_eq!(json["status"], "active");
        assert_eq!(json["report_type"], "danger");
        assert_eq!(storage.count_reports().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_report_accepts_legacy_comma_location() {
        let (_dir, _storage, app) = test_app();
        let resp = app
            .oneshot(json_request(
                Method::POST,
                "/reports",
                creation_body("POINT(6.86600, 45.83200)"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_report_rejects_bad_location() {
        let (_dir, storage, app) = test_app();
        let resp = app
            .oneshot(json_request(Method::POST, "/reports", creation_body("")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert!(json["detail"].as_str().unwrap().starts_with("invalid location"));
        assert_eq!(storage.count_reports().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_report_rejects_empty_title() {
        let (_dir, _storage, app) = test_app();
        let mut body = creation_body("POINT(6.866 45.832)");
        body["title"] = serde_json::json!("  ");
        let resp = app
            .oneshot(json_request(Method::POST, "/reports", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_get_report_roundtrip() {
        let (_dir, storage, app) = test_app();
        let report = new_report(
            serde_json::from_value(creation_body("POINT(6.866 45.832)")).unwrap(),
        )
        .unwrap();
        storage.save_report(&report).unwrap();

        let resp = app
            .oneshot(get_request(&format!("/reports/{}", report.id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let fetched: Report = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(fetched, report);
    }

    #[tokio::test]
    async fn test_get_missing_report_returns_404_detail() {
        let (_dir, _storage, app) = test_app();
        let resp = app
            .oneshot(get_request(&format!("/reports/{}", Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["detail"], "Report not found");
    }

    #[tokio::test]
    async fn test_get_report_with_malformed_id() {
        let (_dir, _storage, app) = test_app();
        let resp = app.oneshot(get_request("/reports/not-a-uuid")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_list_reports_with_bbox() {
        let (_dir, storage, app) = test_app();
        for location in ["POINT(6.866 45.832)", "POINT(7.75 46.02)"] {
            let report =
                new_report(serde_json::from_value(creation_body(location)).unwrap()).unwrap();
            storage.save_report(&report).unwrap();
        }

        let all = app.clone().oneshot(get_request("/reports")).await.unwrap();
        assert_eq!(body_json(all).await.as_array().unwrap().len(), 2);

        let inside = app
            .oneshot(get_request("/reports?bbox=6.8,45.8,6.95,45.95"))
            .await
            .unwrap();
        let json = body_json(inside).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["longitude"], 6.866);
    }

    #[tokio::test]
    async fn test_list_reports_rejects_bad_bbox() {
        let (_dir, _storage, app) = test_app();
        let resp = app
            .oneshot(get_request("/reports?bbox=1,2,3"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_edit_report_updates_fields() {
        let (_dir, storage, app) = test_app();
        let report = new_report(
            serde_json::from_value(creation_body("POINT(6.866 45.832)")).unwrap(),
        )
        .unwrap();
        storage.save_report(&report).unwrap();

        let resp = app
            .oneshot(json_request(
                Method::PATCH,
                &format!("/reports/{}", report.id),
                serde_json::json!({ "title": "Tree cleared", "location": "POINT(6.9 45.9)" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let stored = storage.get_report(&report.id).unwrap().unwrap();
        assert_eq!(stored.title, "Tree cleared");
        assert_eq!(stored.description, report.description);
        assert_eq!(stored.latitude, 45.9);
        assert!(stored.last_updated_time.is_some());
    }

    #[tokio::test]
    async fn test_change_status() {
        let (_dir, storage, app) = test_app();
        let report = new_report(
            serde_json::from_value(creation_body("POINT(6.866 45.832)")).unwrap(),
        )
        .unwrap();
        storage.save_report(&report).unwrap();

        let resp = app
            .oneshot(json_request(
                Method::PATCH,
                &format!("/reports/{}/status", report.id),
                serde_json::json!({ "status": "resolved" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            storage.get_report(&report.id).unwrap().unwrap().status,
            ReportStatus::Resolved
        );
    }

    #[tokio::test]
    async fn test_delete_report_then_404() {
        let (_dir, storage, app) = test_app();
        let report = new_report(
            serde_json::from_value(creation_body("POINT(6.866 45.832)")).unwrap(),
        )
        .unwrap();
        storage.save_report(&report).unwrap();

        let delete = || {
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/reports/{}", report.id))
                .body(Body::empty())
                .unwrap()
        };
        let resp = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = app.oneshot(delete()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_enum_listings() {
        let (_dir, _storage, app) = test_app();
        let resp = app.clone().oneshot(get_request("/reports/types")).await.unwrap();
        assert_eq!(
            body_json(resp).await,
            serde_json::json!(["highlight", "danger", "problem"])
        );
        let resp = app.oneshot(get_request("/reports/statuses")).await.unwrap();
        assert_eq!(body_json(resp).await.as_array().unwrap().len(), 5);
    }
}
