//! One-shot query endpoints

use axum::extract::State;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, SearchRequest};
use crate::domain::{SearchQuery, SearchResponse};

/// POST /api/search
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    info!(
        sub_query = request.options.sub_query,
        allow_web_search = request.options.allow_web_search,
        "Processing search request"
    );

    let query = SearchQuery::new(request.query, request.options)?;
    let response = state.search.search_quiet(&query).await?;

    Ok(Json(response))
}

/// POST /api/search/subquery: same body, decomposition forced on
pub async fn search_subquery(
    state: State<AppState>,
    Json(mut request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    request.options.sub_query = true;
    search(state, Json(request)).await
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::api::state::test_state;
    use crate::api::v1::create_api_router;
    use crate::api::v1::test_support::{post_json, read_json};
    use crate::infrastructure::services::fixtures::uber_llm;

    #[tokio::test]
    async fn test_search_then_cached() {
        let (state, pipeline) = test_state(uber_llm(), || Ok(true)).await;
        let app = create_api_router().with_state(state);
        let body = r#"{"query":"What was Uber's revenue in 2021?"}"#;

        let (status, first) = read_json(
            app.clone()
                .oneshot(post_json("/search", body))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["query_type"], "DOCUMENT_QUERY");
        assert_eq!(first["cache_metrics"]["hit"], false);
        assert_eq!(pipeline.cache.len(), 1);

        let (_, second) = read_json(app.oneshot(post_json("/search", body)).await.unwrap()).await;

        assert_eq!(second["cache_metrics"]["hit"], true);
        assert_eq!(second["answer"], first["answer"]);
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let (state, _) = test_state(uber_llm(), || Ok(true)).await;
        let app = create_api_router().with_state(state);

        let (status, body) =
            read_json(app.oneshot(post_json("/search", r#"{"query":"   "}"#)).await.unwrap()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "ValidationError");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let (state, _) = test_state(uber_llm(), || Ok(true)).await;
        let app = create_api_router().with_state(state);

        let (status, body) =
            read_json(app.oneshot(post_json("/search", "{not json")).await.unwrap()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_subquery_endpoint_forces_decomposition() {
        let llm = uber_llm().on(
            "Question to decompose:",
            r#"{"subQuestions":["What was Uber's revenue in 2021?","What was Lyft's revenue in 2021?"]}"#,
        );
        let (state, _) = test_state(llm, || Ok(true)).await;
        let app = create_api_router().with_state(state);

        let (status, body) = read_json(
            app.oneshot(post_json(
                "/search/subquery",
                r#"{"query":"Compare Uber and Lyft revenue in 2021"}"#,
            ))
            .await
            .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sub_queries"].as_array().unwrap().len(), 2);
    }
}
