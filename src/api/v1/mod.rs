//! REST endpoints under `/api`

pub mod cache;
pub mod search;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::api::state::AppState;

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/search", post(search::search))
        .route("/search/subquery", post(search::search_subquery))
        .route("/cache/stats", get(cache::stats))
        .route("/cache/clear", delete(cache::clear))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;

    pub fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    pub async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}
