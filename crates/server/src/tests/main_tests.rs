use super::*;
use axum::{
    body::{self, Body},
    http::Request,
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    build_router(Arc::new(AppState {
        compute_timeout: Duration::from_secs(30),
    }))
}

fn chain_body() -> Value {
    json!({
        "nodes": [[30.10, 78.10], [30.11, 78.10], [30.12, 78.10]],
        "cost_per_meter": 500,
        "substations": [{ "name": "Dakpatti", "lat": 30.3572, "lng": 78.0789 }]
    })
}

async fn post_json(app: Router, uri: &str, payload: Value) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request");
    app.oneshot(request).await.expect("response")
}

async fn json_body(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn health_runs_the_self_test() {
    let request = Request::get("/health").body(Body::empty()).expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let reply: HealthReply = serde_json::from_value(json_body(response).await).expect("health");
    assert!(reply.is_healthy());
    assert_eq!(reply.version.as_deref(), Some(VERSION));
    assert!(reply.timestamp > 0.0);
}

#[tokio::test]
async fn compute_mst_returns_a_spanning_layout() {
    let response = post_json(test_app(), "/compute_mst", chain_body()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let reply: LayoutReply = serde_json::from_value(json_body(response).await).expect("layout");
    assert_eq!(reply.edges.len(), 2);
    assert_eq!(reply.algorithm.as_deref(), Some("Kruskal"));
    assert_eq!(reply.houses_count, Some(3));
    assert!(reply.computation_time.is_some());
    let connection = reply.substation_connection.expect("connection");
    assert_eq!(connection.substation_name.as_deref(), Some("Dakpatti"));
    assert!((reply.total_cost - reply.total_length * 500.0).abs() < 1e-6);
}

#[tokio::test]
async fn compute_mst_rejects_a_single_node() {
    let response = post_json(
        test_app(),
        "/compute_mst",
        json!({
            "nodes": [[30.10, 78.10]],
            "cost_per_meter": 500,
            "substations": [{ "name": "Dakpatti", "lat": 30.3572, "lng": 78.0789 }]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "At least 2 nodes required");
}

#[tokio::test]
async fn compute_mst_rejects_bad_cost_and_coordinates() {
    let mut zero_cost = chain_body();
    zero_cost["cost_per_meter"] = json!(0);
    let response = post_json(test_app(), "/compute_mst", zero_cost).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Cost per meter must be positive"
    );

    let mut off_map = chain_body();
    off_map["nodes"][1] = json!([95.0, 78.10]);
    let response = post_json(test_app(), "/compute_mst", off_map).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Node 1 has invalid coordinates"
    );
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let request = Request::post("/compute_mst")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.starts_with("Input validation failed")));
}

#[tokio::test]
async fn simulate_failure_requires_a_fail_edge() {
    let response = post_json(test_app(), "/simulate_failure", chain_body()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Missing 'fail' field for edge failure simulation"
    );
}

#[tokio::test]
async fn simulate_failure_routes_around_the_failed_edge() {
    let mut payload = chain_body();
    payload["fail"] = json!({ "start": [30.10, 78.10], "end": [30.11, 78.10] });
    let response = post_json(test_app(), "/simulate_failure", payload).await;
    assert_eq!(response.status(), StatusCode::OK);

    let reply: LayoutReply = serde_json::from_value(json_body(response).await).expect("layout");
    assert_eq!(reply.edges.len(), 2);
    assert_eq!(reply.failure_mode, Some(true));
    assert_eq!(reply.blocked_edges_count, Some(1));
    let failed_start = GeoPoint::new(30.10, 78.10);
    let failed_end = GeoPoint::new(30.11, 78.10);
    assert!(reply
        .edges
        .iter()
        .all(|edge| !edge.connects(&failed_start, &failed_end, 1e-9)));
}

#[tokio::test]
async fn disconnection_is_reported_with_critical_impact() {
    let payload = json!({
        "nodes": [[30.10, 78.10], [30.11, 78.10]],
        "cost_per_meter": 500,
        "substations": [{ "name": "Dakpatti", "lat": 30.3572, "lng": 78.0789 }],
        "fail": { "start": [30.11, 78.10], "end": [30.10, 78.10] }
    });
    let response = post_json(test_app(), "/simulate_failure", payload).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: SolverErrorBody =
        serde_json::from_value(json_body(response).await).expect("error body");
    assert_eq!(body.error, "Critical failure - Network becomes disconnected");
    assert_eq!(body.impact, Some(ImpactLevel::Critical));
    assert_eq!(body.details.as_deref(), Some("Edge failure disconnects MST"));
}

#[tokio::test]
async fn network_analysis_needs_three_nodes() {
    let payload = json!({
        "nodes": [[30.10, 78.10], [30.11, 78.10]],
        "cost_per_meter": 500,
        "substations": [{ "name": "Dakpatti", "lat": 30.3572, "lng": 78.0789 }]
    });
    let response = post_json(test_app(), "/network_analysis", payload).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Need at least 3 nodes for network analysis"
    );
}

#[tokio::test]
async fn network_analysis_reports_every_tree_edge() {
    let response = post_json(test_app(), "/network_analysis", chain_body()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let reply: NetworkAnalysisReply =
        serde_json::from_value(json_body(response).await).expect("analysis");
    assert_eq!(reply.edge_analysis.len(), 2);
    assert_eq!(reply.network_metrics.total_edges, 2);
    assert_eq!(reply.network_metrics.critical_edges, 0);
    assert_eq!(
        reply.network_metrics.reliability_score,
        100 - 10 * reply.network_metrics.high_impact_edges as u32
    );
    assert!(reply
        .edge_analysis
        .iter()
        .all(|edge| edge.backup_cost.is_some() && !edge.critical));
}

#[tokio::test]
async fn unknown_route_answers_json_404() {
    let request = Request::get("/nowhere").body(Body::empty()).expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Endpoint not found");
}

#[tokio::test]
async fn wrong_method_answers_json_405() {
    let request = Request::get("/compute_mst")
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(response).await["error"], "Method not allowed");

    let response = post_json(test_app(), "/health", json!({})).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(response).await["error"], "Method not allowed");
}
