use std::sync::Arc;
use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value;
use shared::protocol::API_PREFIX;
use shared::types::ServiceRecord;
use crate::aggregate::Aggregator;
use crate::api::error::ApiError;
use crate::api::intake;
use crate::document::Document;
use crate::registry_manager::RegistryHandle;

#[derive(Clone)]
pub struct AppState {
    pub registry: RegistryHandle,
    pub aggregator: Arc<Aggregator>,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/microservice", put(register_service).delete(deregister_service))
        .route("/microservices", get(list_services))
        .route("/mix", post(mix));

    Router::new().nest(API_PREFIX, api).with_state(state)
}

async fn register_service(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<&'static str, ApiError> {
    let service = intake::parse_registration(&payload)?;
    let label = service.to_string();

    if state.registry.register(service).await? {
        tracing::info!("Re-registered {}", label);
    } else {
        tracing::info!("Registered {}", label);
    }
    Ok("Success")
}

async fn deregister_service(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<&'static str, ApiError> {
    let id = intake::parse_deregistration(&payload)?;

    if !state.registry.deregister(id.clone()).await? {
        return Err(ApiError::NotFound(id.to_string()));
    }

    tracing::info!("Deregistered IM at {}", id);
    Ok("Success")
}

async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<ServiceRecord>>, ApiError> {
    Ok(Json(state.registry.list().await?))
}

async fn mix(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let location = intake::parse_location(&payload)?;
    Ok(Json(state.aggregator.aggregate(location).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::json;
    use tower::ServiceExt;
    use crate::cache::TtlCache;
    use crate::registry::store::ServiceStore;
    use crate::transport::mock::ScriptedTransport;
    use crate::transport::Transport;

    fn app_with(transport: Arc<ScriptedTransport>) -> Router {
        let registry = RegistryHandle::spawn(ServiceStore::new());
        let aggregator = Aggregator::new(
            registry.clone(),
            Arc::new(TtlCache::new()),
            transport as Arc<dyn Transport>,
        );
        router(AppState {
            registry,
            aggregator: Arc::new(aggregator),
        })
    }

    fn app() -> Router {
        app_with(Arc::new(ScriptedTransport::new()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Value) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration(address: &str, name: &str) -> Value {
        json!({
            "address": address,
            "name": name,
            "creator": "tester",
            "tile": "sun",
            "dependencies": [{"address": "dep:80", "dependencies": []}]
        })
    }

    #[tokio::test]
    async fn test_register_then_list() {
        let app = app();

        let response = send(&app, "PUT", "/v1/microservice", registration("a:80", "A")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "PUT", "/v1/microservice", registration("a:80", "A2")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/v1/microservices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["name"], "A2");
        assert_eq!(listed[0]["dependencies"][0]["address"], "dep:80");
    }

    #[tokio::test]
    async fn test_register_missing_key() {
        let response = send(&app(), "PUT", "/v1/microservice", json!({"address": "a:80"})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Required key name not present in payload JSON."
        );
    }

    #[tokio::test]
    async fn test_deregister() {
        let app = app();
        send(&app, "PUT", "/v1/microservice", registration("a:80", "A")).await;

        let response = send(&app, "DELETE", "/v1/microservice", json!({"address": "a:80", "name": "other"})).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "DELETE", "/v1/microservice", json!({"address": "a:80"})).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, "DELETE", "/v1/microservice", json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mix_rejects_out_of_range() {
        let app = app();

        let response = send(&app, "POST", "/v1/mix", json!({"latitude": 91.0, "longitude": 0.0})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid latitude");

        let response = send(&app, "POST", "/v1/mix", json!({"latitude": 0.0, "longitude": 181.0})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid longitude");

        let response = send(&app, "POST", "/v1/mix", json!({"latitude": 91.0, "longitude": 181.0})).await;
        assert_eq!(body_json(response).await["error"], "Invalid latitude");
    }

    #[tokio::test]
    async fn test_mix_aggregates() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond("dep:80", json!({"wind": 3}), None);
        transport.respond("a:80", json!({"temp": 5}), Some("max-age=60"));
        let app = app_with(Arc::clone(&transport));
        send(&app, "PUT", "/v1/microservice", registration("a:80", "A")).await;

        let response = send(&app, "POST", "/v1/mix", json!({"latitude": 10.0, "longitude": 20.0})).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!([{
                "_metadata": {"name": "A", "creator": "tester", "tile": "sun"},
                "temp": 5
            }])
        );
        assert_eq!(transport.calls_to("a:80")[0]["wind"], 3);
    }
}
