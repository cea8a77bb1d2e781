//! Server - HTTP transport adapter
//!
//! TigerStyle: every request gets an id, a span, a deadline and a
//! cancellation token. The token fires on timeout and when the client goes
//! away (the handler future is dropped).
//!
//! ```text
//! POST /graphql   {query, variables, operationName}  -> {data, errors}
//! GET  /graphql   ?query=&variables=&operationName=  -> queries only
//! GET  /schema    SDL
//! GET  /health    ok
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use weave_core::engine::{operation_kind, OperationKind};
use weave_core::{ErrorKind, GraphQLError, Request, RequestError, Response};

use crate::app::App;
use crate::config::AppConfig;

// =============================================================================
// State
// =============================================================================

/// Shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    app: App,
    sdl: Arc<str>,
    request_timeout: Duration,
}

impl AppState {
    /// State serving `app` with a per-request deadline.
    #[must_use]
    pub fn new(app: App, request_timeout: Duration) -> Self {
        assert!(!request_timeout.is_zero(), "request timeout must be positive");

        let sdl = Arc::from(app.schema().sdl());
        Self {
            app,
            sdl,
            request_timeout,
        }
    }

    /// The app behind the router.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    async fn handle(&self, request: Request) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::debug_span!(
            "graphql",
            request_id = %request_id,
            operation = request.operation_name.as_deref().unwrap_or("-"),
        );

        async move {
            tracing::debug!(bytes = request.query.len(), "GraphQL request");

            let cancel = CancellationToken::new();
            let _cancel_on_drop = cancel.clone().drop_guard();

            // Detached from the handler so a disconnect cancels instead of dropping it.
            let app = self.app.clone();
            let token = cancel.clone();
            let mut execution = tokio::spawn(
                async move { app.execute(&request, &request_id, token).await }
                    .in_current_span(),
            );

            let joined = tokio::select! {
                joined = &mut execution => joined,
                () = tokio::time::sleep(self.request_timeout) => {
                    tracing::warn!(
                        timeout_ms = self.request_timeout.as_millis() as u64,
                        "Request deadline exceeded, cancelling"
                    );
                    cancel.cancel();
                    execution.await
                }
            };

            let response = joined.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Execution task failed");
                Response {
                    data: None,
                    errors: vec![GraphQLError::new(ErrorKind::Internal, "execution failed")],
                }
            });

            tracing::debug!(errors = response.errors.len(), "GraphQL response");
            response
        }
        .instrument(span)
        .await
    }
}

// =============================================================================
// Router
// =============================================================================

/// Routes for the GraphQL endpoint, SDL and health check.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", get(graphql_get).post(graphql_post))
        .route("/schema", get(schema_sdl))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind, serve until Ctrl-C, then drain.
pub async fn serve(config: &AppConfig, app: App) -> anyhow::Result<()> {
    let state = AppState::new(app, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Server ready at http://{}/graphql", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetParams {
    query: String,
    variables: Option<String>,
    operation_name: Option<String>,
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    let error = RequestError::bad_request(message);
    tracing::debug!(error = %error, "Rejected request envelope");
    (
        StatusCode::BAD_REQUEST,
        Json(Response::from_request_error(&error)),
    )
        .into_response()
}

async fn graphql_post(
    State(state): State<AppState>,
    body: Result<Json<Request>, JsonRejection>,
) -> HttpResponse {
    match body {
        Ok(Json(request)) => Json(state.handle(request).await).into_response(),
        Err(rejection) => bad_request(rejection.body_text()),
    }
}

async fn graphql_get(
    State(state): State<AppState>,
    params: Result<Query<GetParams>, QueryRejection>,
) -> HttpResponse {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let mut request = Request::new(params.query);
    if let Some(raw) = params.variables.filter(|v| !v.is_empty()) {
        match serde_json::from_str(&raw) {
            Ok(variables) => request = request.with_variables(variables),
            Err(e) => return bad_request(format!("variables are not valid JSON: {e}")),
        }
    }
    if let Some(name) = params.operation_name.filter(|n| !n.is_empty()) {
        request = request.with_operation_name(name);
    }

    // Unparseable documents fall through and are reported by the engine.
    if let Ok(OperationKind::Mutation) = operation_kind(&request) {
        return bad_request("mutations are only accepted over POST");
    }

    Json(state.handle(request).await).into_response()
}

async fn schema_sdl(State(state): State<AppState>) -> String {
    state.sdl.to_string()
}

async fn health() -> &'static str {
    "ok"
}

// =============================================================================
// Tests
// =============================================================================
