use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{GeoPoint, Substation},
    error::{InputError, SolverErrorBody},
    impact::ImpactLevel,
    protocol::{
        HealthReply, LayoutReply, LayoutRequest, NetworkAnalysisReply, SolverReply,
        MIN_ANALYSIS_HOUSES,
    },
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod analysis;
mod config;
mod mst;

use config::load_settings;
use mst::SolveError;

const VERSION: &str = "1.0";

struct AppState {
    compute_timeout: Duration,
}

type Rejection = (StatusCode, Json<SolverErrorBody>);

fn reject(status: StatusCode, message: impl Into<String>) -> Rejection {
    (status, Json(SolverErrorBody::new(message)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = load_settings();
    let state = AppState {
        compute_timeout: settings.compute_timeout(),
    };
    let app =
        build_router(Arc::new(state)).layer(RequestBodyLimitLayer::new(settings.max_body_bytes));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "solver listening");
    info!("routes: GET /health, POST /compute_mst, POST /simulate_failure, POST /network_analysis");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route(
            "/compute_mst",
            post(compute_mst).fallback(method_not_allowed),
        )
        .route(
            "/simulate_failure",
            post(simulate_failure).fallback(method_not_allowed),
        )
        .route(
            "/network_analysis",
            post(network_analysis).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

fn describe_input_error(err: &InputError) -> String {
    match err {
        InputError::TooFewHouses(_) => "At least 2 nodes required".to_string(),
        InputError::InvalidCostPerMeter => "Cost per meter must be positive".to_string(),
        InputError::InvalidCoordinate { index } => format!("Node {index} has invalid coordinates"),
        InputError::InvalidSubstation { index } => {
            format!("Substation {index} has invalid coordinates")
        }
        InputError::NoSubstations => "At least one substation is required".to_string(),
    }
}

fn parse_request(body: &Bytes) -> Result<LayoutRequest, Rejection> {
    if body.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "No JSON data provided"));
    }
    let request: LayoutRequest = serde_json::from_slice(body).map_err(|e| {
        reject(
            StatusCode::BAD_REQUEST,
            format!("Input validation failed: {e}"),
        )
    })?;
    request
        .validate()
        .map_err(|e| reject(StatusCode::BAD_REQUEST, describe_input_error(&e)))?;
    Ok(request)
}

/// Runs `job` on the blocking pool, bounded by the configured timeout.
async fn run_blocking<T, F>(state: &AppState, job: F) -> Result<T, Rejection>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(state.compute_timeout, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => {
            error!(%join_error, "computation task failed");
            Err(reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal computation error",
            ))
        }
        Err(_) => {
            error!(timeout = ?state.compute_timeout, "computation timed out");
            Err(reject(
                StatusCode::BAD_REQUEST,
                "Computation timeout - network too large",
            ))
        }
    }
}

async fn solve_timed(
    state: &AppState,
    request: LayoutRequest,
) -> Result<Result<LayoutReply, SolveError>, Rejection> {
    let started = Instant::now();
    let outcome = run_blocking(state, move || mst::solve(&request)).await?;
    let elapsed = started.elapsed().as_secs_f64();
    info!(elapsed_seconds = elapsed, "computation finished");
    Ok(outcome.map(|mut reply| {
        reply.computation_time = Some(elapsed);
        reply
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReply>) {
    let sample = LayoutRequest {
        nodes: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)],
        cost_per_meter: 5.0,
        substations: vec![Substation::new("Test", 0.5, 0.5)],
        fail: None,
    };
    let error = match solve_timed(&state, sample).await {
        Ok(Ok(_)) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err((_, Json(body))) => Some(body.error),
    };

    match error {
        None => (
            StatusCode::OK,
            Json(HealthReply {
                status: "healthy".to_string(),
                version: Some(VERSION.to_string()),
                error: None,
                timestamp: unix_timestamp(),
            }),
        ),
        Some(detail) => {
            warn!(%detail, "self test failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReply {
                    status: "unhealthy".to_string(),
                    version: None,
                    error: Some("MST computation test failed".to_string()),
                    timestamp: unix_timestamp(),
                }),
            )
        }
    }
}

async fn compute_mst(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LayoutReply>, Rejection> {
    let mut request = parse_request(&body)?;
    request.fail = None;
    info!(nodes = request.nodes.len(), "computing layout");

    match solve_timed(&state, request).await? {
        Ok(reply) => {
            info!(total_cost = reply.total_cost, "layout computed");
            Ok(Json(reply))
        }
        Err(err) => {
            warn!(%err, "layout computation failed");
            Err(reject(StatusCode::BAD_REQUEST, err.to_string()))
        }
    }
}

async fn simulate_failure(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SolverReply<LayoutReply>>, Rejection> {
    let request = parse_request(&body)?;
    let Some(fail) = request.fail else {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Missing 'fail' field for edge failure simulation",
        ));
    };
    if !fail.start.is_valid() || !fail.end.is_valid() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Invalid fail edge coordinate values",
        ));
    }
    info!(start = %fail.start, end = %fail.end, "simulating edge failure");

    match solve_timed(&state, request).await? {
        Ok(reply) => {
            info!(backup_cost = reply.total_cost, "backup layout computed");
            Ok(Json(SolverReply::Accepted(reply)))
        }
        Err(SolveError::Disconnected) => {
            warn!("edge failure disconnects the network");
            Ok(Json(SolverReply::Rejected(
                SolverErrorBody::new("Critical failure - Network becomes disconnected")
                    .with_impact(ImpactLevel::Critical)
                    .with_details(SolveError::Disconnected.to_string()),
            )))
        }
        Err(err) => {
            warn!(%err, "failure simulation failed");
            Err(reject(StatusCode::BAD_REQUEST, err.to_string()))
        }
    }
}

async fn network_analysis(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<NetworkAnalysisReply>, Rejection> {
    let request = parse_request(&body)?;
    if request.nodes.len() < MIN_ANALYSIS_HOUSES {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Need at least 3 nodes for network analysis",
        ));
    }
    info!(nodes = request.nodes.len(), "running network analysis");

    let started = Instant::now();
    let analysis = run_blocking(&state, move || analysis::analyze(&request))
        .await?
        .map_err(|err| {
            reject(
                StatusCode::BAD_REQUEST,
                format!("Original MST computation failed: {err}"),
            )
        })?;

    let mut original = analysis.original;
    original.computation_time = Some(started.elapsed().as_secs_f64());
    info!(
        reliability_score = analysis.metrics.reliability_score,
        "network analysis complete"
    );
    Ok(Json(NetworkAnalysisReply {
        original_network: original,
        edge_analysis: analysis.edges,
        network_metrics: analysis.metrics,
        timestamp: unix_timestamp(),
    }))
}

async fn not_found() -> Rejection {
    reject(StatusCode::NOT_FOUND, "Endpoint not found")
}

async fn method_not_allowed() -> Rejection {
    reject(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
