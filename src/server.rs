// Cost of Living Dashboard - HTTP API
// JSON endpoints over the dashboard, one session per browser tab

use crate::config::{DashboardConfig, Variant};
use crate::dashboard::{ControlInput, ControlState, Dashboard, DashboardUpdate, SessionStore};
use crate::history::HistoryBatch;
use crate::indicators::{Indicator, IndicatorSpec};
use crate::selection::{PairOptions, YearBounds};
use crate::view::TableRow;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        AppState {
            dashboard: Arc::new(dashboard),
            sessions: Arc::new(Mutex::new(SessionStore::new())),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        })
        .into_response()
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

fn session_not_found(id: Uuid) -> Response {
    failure(StatusCode::NOT_FOUND, format!("session {} not found", id))
}

fn lock_sessions(state: &AppState) -> Result<MutexGuard<'_, SessionStore>, Response> {
    state.sessions.lock().map_err(|_| {
        error!("session store lock poisoned");
        failure(StatusCode::INTERNAL_SERVER_ERROR, "session store unavailable")
    })
}

#[derive(Serialize)]
struct IndicatorsResponse {
    variant: Variant,
    indicators: Vec<IndicatorSpec>,
    selectable: Vec<Indicator>,
    default_indicator: Option<Indicator>,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    controls: ControlState,
    update: DashboardUpdate,
}

#[derive(Serialize)]
struct HistoryResponse {
    session_id: Uuid,
    batch_count: usize,
    rows: Vec<TableRow>,
    batches: Vec<HistoryBatch>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/indicators - Display rules and selector contents
async fn get_indicators(State(state): State<AppState>) -> Response {
    let dashboard = &state.dashboard;
    let indicators = dashboard
        .table()
        .indicators()
        .iter()
        .map(|&i| dashboard.catalog().spec(i).clone())
        .collect();

    ApiResponse::ok(IndicatorsResponse {
        variant: dashboard.variant(),
        indicators,
        selectable: dashboard.model().selectable().to_vec(),
        default_indicator: dashboard.variant().default_indicator(),
    })
}

/// GET /api/bounds - First and last year with complete data
async fn get_bounds(State(state): State<AppState>) -> Response {
    ApiResponse::<YearBounds>::ok(state.dashboard.bounds())
}

/// GET /api/pair-options/:year - Second-year choices after `year`
async fn get_pair_options(State(state): State<AppState>, Path(year): Path<i32>) -> Response {
    ApiResponse::<PairOptions>::ok(state.dashboard.pair_options(year))
}

/// POST /api/sessions - Open a session and render the initial view
async fn create_session(State(state): State<AppState>) -> Response {
    let mut session = state.dashboard.new_session();
    let update = state.dashboard.start(&mut session);
    let response = SessionResponse {
        session_id: session.id,
        controls: session.controls.clone(),
        update,
    };

    let mut sessions = match lock_sessions(&state) {
        Ok(sessions) => sessions,
        Err(response) => return response,
    };
    sessions.insert(session);
    info!(session = %response.session_id, open_sessions = sessions.len(), "session created");

    (StatusCode::CREATED, Json(ApiResponse {
        success: true,
        data: Some(response),
        error: None,
    }))
        .into_response()
}

/// POST /api/sessions/:id/inputs - Apply one control change
async fn post_input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ControlInput>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let mut sessions = match lock_sessions(&state) {
        Ok(sessions) => sessions,
        Err(response) => return response,
    };

    match sessions.get_mut(&id) {
        Some(session) => ApiResponse::ok(state.dashboard.handle(session, input)),
        None => session_not_found(id),
    }
}

/// GET /api/sessions/:id/history - Every batch recorded in this session
async fn get_history(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let sessions = match lock_sessions(&state) {
        Ok(sessions) => sessions,
        Err(response) => return response,
    };

    match sessions.get(&id) {
        Some(session) => {
            let history = session.history();
            ApiResponse::ok(HistoryResponse {
                session_id: id,
                batch_count: history.batch_count(),
                rows: history.rows(),
                batches: history.batches().cloned().collect(),
            })
        }
        None => session_not_found(id),
    }
}

/// DELETE /api/sessions/:id - End a session and drop its history
async fn end_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let mut sessions = match lock_sessions(&state) {
        Ok(sessions) => sessions,
        Err(response) => return response,
    };

    match sessions.end(&id) {
        Some(ended) => {
            info!(
                session = %id,
                batches = ended.history().batch_count(),
                "session ended"
            );
            ApiResponse::ok(id)
        }
        None => session_not_found(id),
    }
}

/// GET / - Serve the dashboard page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router & Server
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/indicators", get(get_indicators))
        .route("/bounds", get(get_bounds))
        .route("/pair-options/:year", get(get_pair_options))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", axum::routing::delete(end_session))
        .route("/sessions/:id/inputs", post(post_input))
        .route("/sessions/:id/history", get(get_history))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl+C
pub async fn serve(config: &DashboardConfig, dashboard: Dashboard) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "dashboard server listening");

    axum::serve(listener, router(AppState::new(dashboard)))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_table;
    use crate::indicators::IndicatorCatalog;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let dashboard = Dashboard::new(
            Arc::new(sample_table()),
            IndicatorCatalog::standard(),
            Variant::Extended,
        );
        router(AppState::new(dashboard))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let (status, body) = send(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn bounds_and_indicators_describe_dataset() {
        let app = app();

        let (_, bounds) = send(&app, "GET", "/api/bounds", None).await;
        assert_eq!(bounds["data"]["min_year"], 2010);
        assert_eq!(bounds["data"]["max_year"], 2022);

        let (_, indicators) = send(&app, "GET", "/api/indicators", None).await;
        assert_eq!(indicators["data"]["selectable"].as_array().unwrap().len(), 3);
        assert_eq!(indicators["data"]["default_indicator"], "UnemploymentRate");
    }

    #[tokio::test]
    async fn session_renders_initial_full_range() {
        let app = app();
        let (_, body) = send(&app, "POST", "/api/sessions", None).await;

        let view = &body["data"]["update"]["view"];
        assert_eq!(view["kind"], "range");
        assert_eq!(view["charts"][0]["points"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn inputs_update_history_newest_first() {
        let app = app();
        let id = open_session(&app).await;
        let uri = format!("/api/sessions/{}/inputs", id);

        let (status, body) = send(
            &app,
            "POST",
            &uri,
            Some(json!({"control": "year_pair", "year_a": 2020, "year_b": 2019})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["view"]["kind"], "pair");
        assert_eq!(body["data"]["results"][0]["Year"], 2019);
        assert_eq!(body["data"]["pair_options"]["default"], 2021);

        let (_, history) = send(&app, "GET", &format!("/api/sessions/{}/history", id), None).await;
        assert_eq!(history["data"]["batch_count"], 2);
        assert_eq!(history["data"]["rows"].as_array().unwrap().len(), 2 + 13);
    }

    #[tokio::test]
    async fn non_consecutive_pair_is_placeholder_not_error() {
        let app = app();
        let id = open_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/inputs", id),
            Some(json!({"control": "year_pair", "year_a": 2017, "year_b": 2020})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["view"]["kind"], "placeholder");
        assert_eq!(body["data"]["view"]["reason"], "Please select two consecutive years.");
    }

    #[tokio::test]
    async fn malformed_input_is_bad_request() {
        let app = app();
        let id = open_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/inputs", id),
            Some(json!({"control": "year_range", "start": "soon"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn new_first_year_with_default_second_renders_pair() {
        let app = app();
        let id = open_session(&app).await;

        let (_, options) = send(&app, "GET", "/api/pair-options/2016", None).await;
        let year_b = options["data"]["default"].clone();
        assert_eq!(year_b, 2017);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/sessions/{}/inputs", id),
            Some(json!({"control": "year_pair", "year_a": 2016, "year_b": year_b})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["view"]["kind"], "pair");
        assert_eq!(body["data"]["pair_options"]["default"], 2017);
    }

    #[tokio::test]
    async fn pair_options_past_last_year_are_empty() {
        let (status, body) = send(&app(), "GET", "/api/pair-options/2147483647", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["options"], json!([]));
        assert_eq!(body["data"]["default"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = app();
        let uri = format!("/api/sessions/{}/history", Uuid::new_v4());

        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn ended_session_is_gone() {
        let app = app();
        let id = open_session(&app).await;

        let (status, _) = send(&app, "DELETE", &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", &format!("/api/sessions/{}/history", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
