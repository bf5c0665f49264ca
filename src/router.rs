use crate::handlers::{products, sync, ws};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/products", get(products::list_products))
        .route("/products/create", post(products::create_product))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/start_parser", get(sync::start_parser))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::notify::Notifier;
    use crate::registry::SubscriberRegistry;
    use crate::scheduler::SchedulerHandle;
    use crate::store::RecordStore;
    use crate::store::testing::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
        events: mpsc::Receiver<String>,
        triggers: mpsc::Receiver<()>,
    }

    fn test_app() -> TestApp {
        let store = Arc::new(MemoryStore::default());
        let registry = Arc::new(SubscriberRegistry::new());
        let (event_tx, events) = mpsc::channel(64);
        registry.register(event_tx);
        let (scheduler, triggers) = SchedulerHandle::for_tests();
        let state = AppState {
            store: Arc::clone(&store) as Arc<dyn RecordStore>,
            registry: Arc::clone(&registry),
            notifier: Notifier::new(registry),
            scheduler,
        };
        TestApp {
            router: create_router(state),
            store,
            events,
            triggers,
        }
    }

    fn sample_body() -> serde_json::Value {
        serde_json::json!({ "id": 1, "name": "A", "description": "d", "price": 10 })
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn next_event(events: &mut mpsc::Receiver<String>) -> serde_json::Value {
        serde_json::from_str(&events.try_recv().expect("expected a broadcast event")).unwrap()
    }

    #[tokio::test]
    async fn create_broadcasts_once_and_conflicts_silently() {
        let mut app = test_app();

        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/products/create", sample_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["name"], "A");

        let event = next_event(&mut app.events);
        assert_eq!(event["event"], "create");
        assert_eq!(event["product"]["id"], 1);
        assert!(app.events.try_recv().is_err());

        // Same id again: conflict, and nothing is broadcast.
        let response = app
            .router
            .oneshot(json_request("POST", "/products/create", sample_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err = body_json(response).await;
        assert_eq!(err["message"], "Product already exists");
        assert!(app.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn get_missing_product_is_404() {
        let app = test_app();
        let response = app.router.oneshot(get("/products/42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let err = body_json(response).await;
        assert_eq!(err["message"], "Product not found");
    }

    #[tokio::test]
    async fn put_merges_partial_fields_and_notifies() {
        let mut app = test_app();
        app.store
            .insert(Product {
                id: 1,
                name: "A".to_string(),
                description: "d".to_string(),
                price: 10,
            })
            .await
            .unwrap();

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "PUT",
                "/products/1",
                serde_json::json!({ "price": 25 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["name"], "A");
        assert_eq!(updated["price"], 25);

        let event = next_event(&mut app.events);
        assert_eq!(event["event"], "update");
        assert_eq!(event["product"]["price"], 25);

        // Missing id: 404, no notification.
        let response = app
            .router
            .oneshot(json_request(
                "PUT",
                "/products/9",
                serde_json::json!({ "price": 1 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(app.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn delete_notifies_with_the_product_id() {
        let mut app = test_app();
        app.store
            .insert(Product {
                id: 3,
                name: "B".to_string(),
                description: "d".to_string(),
                price: 5,
            })
            .await
            .unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/products/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");

        let event = next_event(&mut app.events);
        assert_eq!(event["event"], "delete");
        assert_eq!(event["details"]["product_id"], 3);

        // Already gone: 404, no notification.
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/products/3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(app.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn list_paginates_and_bounds_the_limit() {
        let app = test_app();
        for id in 1..=5 {
            app.store
                .insert(Product {
                    id,
                    name: format!("P{id}"),
                    description: String::new(),
                    price: id,
                })
                .await
                .unwrap();
        }

        let response = app
            .router
            .clone()
            .oneshot(get("/products?offset=1&limit=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listing = body_json(response).await;
        assert_eq!(listing[0]["id"], 2);
        assert_eq!(listing[1]["id"], 3);

        let response = app
            .router
            .oneshot(get("/products?limit=101"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn start_parser_enqueues_a_trigger_and_replies_ok() {
        let mut app = test_app();
        let response = app.router.oneshot(get("/start_parser")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
        assert!(app.triggers.try_recv().is_ok());
    }
}
