use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};

use super::{endpoints, State};
use crate::api::contract;
use crate::store::AlertStore;

pub fn router<S: AlertStore>(state: State<S>) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    axum::Router::new()
        .route(contract::CREATE_ALERT.path, post(endpoints::create::<S>))
        .route(contract::LIST_ACTIVE.path, get(endpoints::list_active::<S>))
        .route(
            contract::UPDATE_LOCATION.path,
            patch(endpoints::update_location::<S>),
        )
        .route(
            contract::UPDATE_STATUS.path,
            patch(endpoints::update_status::<S>),
        )
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::api::types::Alert;
    use crate::store::{ActivePolicy, MemoryStore};

    fn app(store: &MemoryStore) -> axum::Router {
        router(State::new(store.clone()))
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(store: &MemoryStore, req: Request<Body>) -> (StatusCode, Value) {
        let response = app(store).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn alert_body() -> Value {
        json!({
            "ambulanceId": "A1",
            "currentLat": 12.9,
            "currentLng": 77.6,
            "destinationName": "City Hospital",
            "destinationLat": 12.93,
            "destinationLng": 77.62,
            "routePolyline": "[]",
            "eta": 10,
            "distance": 3.5,
            "status": "active"
        })
    }

    #[tokio::test]
    async fn alert_lifecycle_over_http() {
        let store = MemoryStore::default();

        let (status, created) = send(
            &store,
            request(Method::POST, "/api/alerts", Some(alert_body())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Alert = serde_json::from_value(created).unwrap();
        assert_eq!(created.ambulance_id, "A1");

        let (status, active) = send(&store, request(Method::GET, "/api/alerts/active", None)).await;
        assert_eq!(status, StatusCode::OK);
        let active: Vec<Alert> = serde_json::from_value(active).unwrap();
        assert!(active.iter().any(|a| a.id == created.id));

        let uri = format!("/api/alerts/{}/status", created.id);
        let (status, cleared) = send(
            &store,
            request(Method::PATCH, &uri, Some(json!({ "status": "completed" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["status"], "completed");

        let (_, active) = send(&store, request(Method::GET, "/api/alerts/active", None)).await;
        let active: Vec<Alert> = serde_json::from_value(active).unwrap();
        assert!(active.iter().all(|a| a.id != created.id));
    }

    #[tokio::test]
    async fn create_without_status_defaults_to_active() {
        let store = MemoryStore::default();
        let mut body = alert_body();
        body.as_object_mut().unwrap().remove("status");

        let (status, created) =
            send(&store, request(Method::POST, "/api/alerts", Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "active");
        assert!(created["id"].is_i64());
    }

    #[tokio::test]
    async fn create_with_missing_field_is_rejected_without_insert() {
        let store = MemoryStore::default();
        let mut body = alert_body();
        body.as_object_mut().unwrap().remove("eta");

        let (status, error) = send(&store, request(Method::POST, "/api/alerts", Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, json!({ "message": "Required", "field": "eta" }));
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn create_with_malformed_json_is_a_validation_error() {
        let store = MemoryStore::default();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/alerts")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, error) = send(&store, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["message"].is_string());
        assert!(error.get("field").is_none());
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn status_update_on_missing_id_is_not_found() {
        let store = MemoryStore::default();
        send(&store, request(Method::POST, "/api/alerts", Some(alert_body()))).await;
        let snapshot = store.all();

        let (status, error) = send(
            &store,
            request(
                Method::PATCH,
                "/api/alerts/999/status",
                Some(json!({ "status": "completed" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error, json!({ "message": "Alert not found" }));
        assert_eq!(store.all(), snapshot);
    }

    #[tokio::test]
    async fn status_update_rejects_unknown_status() {
        let store = MemoryStore::default();
        let (_, created) = send(&store, create_request()).await;

        let uri = format!("/api/alerts/{}/status", created["id"]);
        let (status, error) = send(
            &store,
            request(Method::PATCH, &uri, Some(json!({ "status": "paused" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["field"], "status");
    }

    #[tokio::test]
    async fn location_update_changes_only_position() {
        let store = MemoryStore::default();
        let (_, created) = send(&store, create_request()).await;

        let uri = format!("/api/alerts/{}/location", created["id"]);
        let (status, moved) = send(
            &store,
            request(Method::PATCH, &uri, Some(json!({ "lat": 12.91, "lng": 77.61 }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["currentLat"], 12.91);
        assert_eq!(moved["currentLng"], 77.61);

        for field in [
            "id",
            "ambulanceId",
            "destinationName",
            "destinationLat",
            "destinationLng",
            "routePolyline",
            "eta",
            "distance",
            "status",
        ] {
            assert_eq!(moved[field], created[field], "{field} changed");
        }
    }

    #[tokio::test]
    async fn location_update_validates_body_and_id() {
        let store = MemoryStore::default();

        let (status, error) = send(
            &store,
            request(
                Method::PATCH,
                "/api/alerts/abc/location",
                Some(json!({ "lat": 1.0, "lng": 2.0 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["field"], "id");

        let (status, error) = send(
            &store,
            request(Method::PATCH, "/api/alerts/1/location", Some(json!({ "lat": 1.0 }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, json!({ "message": "Required", "field": "lng" }));

        let (status, _) = send(
            &store,
            request(
                Method::PATCH,
                "/api/alerts/1/location",
                Some(json!({ "lat": 1.0, "lng": 2.0 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    fn create_request() -> Request<Body> {
        request(Method::POST, "/api/alerts", Some(alert_body()))
    }

    fn status_request(id: i32, status: &str) -> Request<Body> {
        request(
            Method::PATCH,
            &format!("/api/alerts/{id}/status"),
            Some(json!({ "status": status })),
        )
    }

    #[tokio::test]
    async fn one_per_ambulance_conflicts() {
        let store = MemoryStore::new(ActivePolicy::OnePerAmbulance);
        let (status, _) = send(&store, create_request()).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, error) = send(&store, create_request()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(error["message"].as_str().unwrap().contains("A1"));
    }

    #[tokio::test]
    async fn one_per_ambulance_blocks_reactivating_an_old_alert() {
        let store = MemoryStore::new(ActivePolicy::OnePerAmbulance);
        let (_, old) = send(&store, create_request()).await;
        let old_id = old["id"].as_i64().unwrap() as i32;

        let (status, _) = send(&store, status_request(old_id, "completed")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&store, create_request()).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, error) = send(&store, status_request(old_id, "active")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(error["message"].as_str().unwrap().contains("A1"));

        let active: Vec<Alert> = serde_json::from_value(
            send(&store, request(Method::GET, "/api/alerts/active", None)).await.1,
        )
        .unwrap();
        assert_eq!(active.len(), 1);
        assert_ne!(active[0].id, old_id);
    }

    #[tokio::test]
    async fn whole_valued_float_eta_is_accepted() {
        let store = MemoryStore::default();
        let mut body = alert_body();
        body["eta"] = json!(10.0);

        let (status, created) =
            send(&store, request(Method::POST, "/api/alerts", Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["eta"], json!(10));
    }
}
