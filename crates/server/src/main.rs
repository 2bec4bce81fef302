use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use shared::{
    domain::{Todo, TodoId},
    error::{ApiError, ErrorCode},
    protocol::{
        CreateTodoRequest, CreateTodoResponse, TodoDocument, UpdateTodoRequest, TODOS_ROUTE,
    },
};
use storage::Storage;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::{load_settings, prepare_database_url};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, %database_url, "todo store listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(TODOS_ROUTE, get(http_list_todos).post(http_create_todo))
        .route(
            &format!("{TODOS_ROUTE}/:id"),
            patch(http_update_todo).delete(http_delete_todo),
        )
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn http_list_todos(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<TodoDocument>>> {
    let todos = api::list_todos(&state.api).await.map_err(into_response)?;
    Ok(Json(todos))
}

async fn http_create_todo(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTodoRequest>,
) -> ApiResult<(StatusCode, Json<CreateTodoResponse>)> {
    let created = api::create_todo(&state.api, req.into())
        .await
        .map_err(into_response)?;
    info!(id = %created.id, "todo created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTodoRequest>,
) -> ApiResult<Json<Todo>> {
    let id = TodoId::new(id);
    let todo = api::update_todo(&state.api, &id, req)
        .await
        .map_err(into_response)?;
    info!(%id, "todo updated");
    Ok(Json(todo))
}

async fn http_delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = TodoId::new(id);
    api::delete_todo(&state.api, &id)
        .await
        .map_err(into_response)?;
    info!(%id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn into_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => {
            error!(message = %err.message, "todo store request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
