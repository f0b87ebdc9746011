//! HTTP surface: the dashboard page and the two chart endpoints.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::chart::{ChartData, SummaryStats};
use crate::cli::{CheckArgs, ServeArgs};
use crate::filters::{self, FilterParams};
use crate::repository::ConflictRepository;
use crate::service::ChartDataService;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

#[derive(Clone)]
pub struct AppState {
    service: Arc<ChartDataService>,
}

impl AppState {
    pub fn new(service: ChartDataService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub async fn run(opts: ServeArgs) -> anyhow::Result<()> {
    let state = open_state(&opts.db_path, opts.query_timeout_secs)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr: SocketAddr = format!("{}:{}", opts.host, opts.port)
        .parse()
        .context("parse host:port")?;

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// `check` subcommand: probe the store once and exit nonzero if unreachable.
pub async fn check(opts: CheckArgs) -> anyhow::Result<()> {
    let state = open_state(&opts.db_path, opts.query_timeout_secs)?;
    if state.service.test_connection().await {
        tracing::info!("analytical store at {} is reachable", opts.db_path);
        Ok(())
    } else {
        Err(anyhow!("analytical store at {} is not reachable", opts.db_path))
    }
}

fn open_state(db_path: &str, query_timeout_secs: u64) -> anyhow::Result<AppState> {
    if !file_present_nonempty(Path::new(db_path)) {
        return Err(anyhow!(
            "DuckDB database not found at {db_path}. The conflicts table is provisioned by the warehouse pipeline."
        ));
    }
    let conn =
        Connection::open(db_path).with_context(|| format!("open duckdb at {db_path}"))?;
    let repository = ConflictRepository::new(
        Arc::new(Mutex::new(conn)),
        Duration::from_secs(query_timeout_secs),
    );
    Ok(AppState::new(ChartDataService::new(repository)))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chart/load-data", post(load_chart_data))
        .route("/chart/test-connection", get(test_connection))
        .with_state(state)
}

fn file_present_nonempty(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(m) => m.is_file() && m.len() > 0,
        Err(_) => false,
    }
}

pub async fn index(State(st): State<AppState>) -> Html<String> {
    let measures: Vec<serde_json::Value> = st
        .service
        .available_measures()
        .into_iter()
        .map(|(code, label)| serde_json::json!({ "code": code, "label": label }))
        .collect();
    let connected = st.service.test_connection().await;

    let page = INDEX_TEMPLATE
        .replace(
            "__MEASURES__",
            &serde_json::Value::Array(measures).to_string(),
        )
        .replace("__CONNECTED__", if connected { "true" } else { "false" });
    Html(page)
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartRequest {
    pub value_type: Option<String>,
    #[serde(flatten)]
    pub filters: FilterParams,
}

#[derive(Debug, Serialize)]
pub struct LoadDataResponse {
    pub success: bool,
    #[serde(rename = "chartData")]
    pub chart_data: ChartData,
    #[serde(rename = "summaryStats")]
    pub summary_stats: SummaryStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

pub async fn load_chart_data(
    State(st): State<AppState>,
    Json(req): Json<ChartRequest>,
) -> Response {
    let filters = match filters::validate(&req.filters) {
        Ok(filters) => filters,
        Err(error) => {
            tracing::warn!(field = error.field, message = %error, "rejected chart request");
            return error_response(StatusCode::BAD_REQUEST, error.to_string());
        }
    };
    let measure = st.service.resolve_measure(req.value_type.as_deref());

    let chart_data = match st.service.chart_data(measure, &filters).await {
        Ok(chart_data) => chart_data,
        Err(error) => {
            tracing::error!(error = %error, ?filters, "failed to load chart data");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error loading chart data");
        }
    };
    let summary_stats = match st.service.summary_stats(&filters).await {
        Ok(summary_stats) => summary_stats,
        Err(error) => {
            tracing::error!(error = %error, ?filters, "failed to load summary stats");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error loading chart data");
        }
    };

    Json(LoadDataResponse {
        success: true,
        chart_data,
        summary_stats,
    })
    .into_response()
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub connected: bool,
    pub message: String,
}

pub async fn test_connection(State(st): State<AppState>) -> Json<ConnectionResponse> {
    let connected = st.service.test_connection().await;
    Json(ConnectionResponse {
        success: true,
        connected,
        message: if connected {
            "Database connection successful".to_string()
        } else {
            "Database connection failed".to_string()
        },
    })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            message: message.into(),
        }),
    )
        .into_response()
}
