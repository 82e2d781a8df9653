use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use server_api::{create_item, delete_item, get_item, list_catalog, ApiContext};
use shared::{
    domain::{CatalogItem, ItemId},
    error::{ApiError, ErrorCode},
    protocol::{CatalogQuery, NewCatalogItem, TUTORIALS_ROUTE},
};
use storage::Storage;
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let storage = Storage::new(&settings.database_url).await.map_err(|error| {
        error!(
            database_url = %settings.database_url,
            error = %format!("{error:#}"),
            "failed to open catalog database"
        );
        error
    })?;
    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(TUTORIALS_ROUTE, get(http_list_tutorials).post(http_create_tutorial))
        .route(
            &format!("{TUTORIALS_ROUTE}/:item_id"),
            get(http_get_tutorial).delete(http_delete_tutorial),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::map_response(payload_too_large_as_api_error))
        .with_state(state)
}

/// The body limit layer answers oversized requests with plain text before
/// any handler runs; rewrite those into the JSON error body.
async fn payload_too_large_as_api_error(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json {
        return response;
    }
    api_error(ApiError::new(
        ErrorCode::PayloadTooLarge,
        "request body exceeds the configured limit",
    ))
    .into_response()
}

async fn shutdown_signal() {
    if let Err(error) = signal::ctrl_c().await {
        warn!(%error, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

fn api_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiError::new(ErrorCode::Internal, e.to_string())),
            )
        })?;
    Ok("ok")
}

async fn http_list_tutorials(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<CatalogItem>>> {
    list_catalog(&state.api, &query)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn http_get_tutorial(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> ApiResult<Json<CatalogItem>> {
    get_item(&state.api, &ItemId(item_id))
        .await
        .map(Json)
        .map_err(api_error)
}

async fn http_create_tutorial(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewCatalogItem>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CatalogItem>)> {
    let Json(new_item) = payload.map_err(|rejection| {
        let code = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorCode::PayloadTooLarge
        } else {
            ErrorCode::Validation
        };
        api_error(ApiError::new(code, rejection.body_text()))
    })?;

    let created = create_item(&state.api, new_item)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_delete_tutorial(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_item(&state.api, &ItemId(item_id))
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
