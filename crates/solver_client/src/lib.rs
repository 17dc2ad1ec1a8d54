use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{BackupLayout, FailedEdge, House, PrimaryLayout, Substation},
    protocol::{
        HealthReply, LayoutReply, LayoutRequest, NetworkAnalysisReply, SolverReply,
        MIN_ANALYSIS_HOUSES, ROUTE_COMPUTE_MST, ROUTE_HEALTH, ROUTE_NETWORK_ANALYSIS,
        ROUTE_SIMULATE_FAILURE,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod error;
mod tracker;

pub use error::{classify_rejection, RejectionReason, SolverFailure};
pub use shared::error::InputError;
pub use tracker::{RequestKind, RequestTicket, RequestTracker};

const COST_TOLERANCE: f64 = 1e-6;

#[async_trait]
pub trait SolverBackend: Send + Sync {
    async fn compute_mst(&self, request: &LayoutRequest) -> Result<SolverReply<LayoutReply>>;
    async fn simulate_failure(&self, request: &LayoutRequest)
        -> Result<SolverReply<LayoutReply>>;
    async fn network_analysis(
        &self,
        request: &LayoutRequest,
    ) -> Result<SolverReply<NetworkAnalysisReply>>;
    async fn health(&self) -> Result<HealthReply>;
}

pub struct MissingSolverBackend;

#[async_trait]
impl SolverBackend for MissingSolverBackend {
    async fn compute_mst(&self, _request: &LayoutRequest) -> Result<SolverReply<LayoutReply>> {
        Err(anyhow!("solver backend is unavailable"))
    }

    async fn simulate_failure(
        &self,
        _request: &LayoutRequest,
    ) -> Result<SolverReply<LayoutReply>> {
        Err(anyhow!("solver backend is unavailable"))
    }

    async fn network_analysis(
        &self,
        _request: &LayoutRequest,
    ) -> Result<SolverReply<NetworkAnalysisReply>> {
        Err(anyhow!("solver backend is unavailable"))
    }

    async fn health(&self) -> Result<HealthReply> {
        Err(anyhow!("solver backend is unavailable"))
    }
}

pub struct HttpSolverBackend {
    http: Client,
    base_url: Url,
}

impl HttpSolverBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid solver url '{base_url}'"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build solver http client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn post_json<B, T>(&self, route: &str, body: &B) -> Result<SolverReply<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.base_url.join(route)?;
        let res = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to reach solver at {url}"))?;
        let status = res.status();
        if status.is_server_error() {
            bail!("solver answered HTTP {status} for {route}");
        }
        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("undecodable solver reply for {route} (HTTP {status})"))
    }
}

#[async_trait]
impl SolverBackend for HttpSolverBackend {
    async fn compute_mst(&self, request: &LayoutRequest) -> Result<SolverReply<LayoutReply>> {
        self.post_json(ROUTE_COMPUTE_MST, request).await
    }

    async fn simulate_failure(
        &self,
        request: &LayoutRequest,
    ) -> Result<SolverReply<LayoutReply>> {
        self.post_json(ROUTE_SIMULATE_FAILURE, request).await
    }

    async fn network_analysis(
        &self,
        request: &LayoutRequest,
    ) -> Result<SolverReply<NetworkAnalysisReply>> {
        self.post_json(ROUTE_NETWORK_ANALYSIS, request).await
    }

    async fn health(&self) -> Result<HealthReply> {
        let url = self.base_url.join(ROUTE_HEALTH)?;
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach solver at {url}"))?;
        // 503 still carries a health body.
        Ok(res.json().await?)
    }
}

pub type PendingCall<T> = BoxFuture<'static, std::result::Result<T, SolverFailure>>;

/// An issued request: the ticket identifies it, the call resolves it.
pub struct PendingRequest<T> {
    pub ticket: RequestTicket,
    pub call: PendingCall<T>,
}

pub struct SolverClient {
    backend: Arc<dyn SolverBackend>,
    tracker: RequestTracker,
}

impl SolverClient {
    pub fn new(backend: Arc<dyn SolverBackend>) -> Self {
        Self {
            backend,
            tracker: RequestTracker::new(),
        }
    }

    pub fn request_primary_layout(
        &mut self,
        houses: &[House],
        cost_per_meter: f64,
        substations: &[Substation],
    ) -> std::result::Result<PendingRequest<PrimaryLayout>, InputError> {
        let request = LayoutRequest::primary(houses, cost_per_meter, substations)?;
        let ticket = self.tracker.issue(RequestKind::Primary);
        let backend = Arc::clone(&self.backend);
        let house_count = houses.len();
        debug!(generation = ticket.generation, house_count, "issuing primary layout request");

        let call = async move {
            let reply = backend.compute_mst(&request).await;
            primary_from_reply(reply, house_count, cost_per_meter)
        }
        .boxed();
        Ok(PendingRequest { ticket, call })
    }

    pub fn request_contingency_layout(
        &mut self,
        houses: &[House],
        cost_per_meter: f64,
        substations: &[Substation],
        failed: FailedEdge,
    ) -> std::result::Result<PendingRequest<BackupLayout>, InputError> {
        let request =
            LayoutRequest::contingency(houses, cost_per_meter, substations, &failed.edge)?;
        let ticket = self.tracker.issue(RequestKind::Contingency);
        let backend = Arc::clone(&self.backend);
        let house_count = houses.len();
        debug!(
            generation = ticket.generation,
            failed_edge = failed.id.0,
            "issuing contingency layout request"
        );

        let call = async move {
            let reply = backend.simulate_failure(&request).await;
            backup_from_reply(reply, house_count, cost_per_meter, failed)
        }
        .boxed();
        Ok(PendingRequest { ticket, call })
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.tracker.is_current(ticket)
    }

    /// Accepts the reply for `ticket` if it is still the latest of its kind.
    pub fn complete(&mut self, ticket: &RequestTicket) -> bool {
        self.tracker.complete(ticket)
    }

    pub fn supersede(&mut self, kind: RequestKind) {
        self.tracker.supersede(kind);
    }

    pub fn supersede_all(&mut self) {
        self.tracker.supersede_all();
    }

    pub fn has_outstanding(&self, kind: RequestKind) -> bool {
        self.tracker.has_outstanding(kind)
    }

    pub async fn analyze_network(
        &self,
        houses: &[House],
        cost_per_meter: f64,
        substations: &[Substation],
    ) -> std::result::Result<NetworkAnalysisReply, SolverFailure> {
        let request = LayoutRequest::primary(houses, cost_per_meter, substations)?;
        if houses.len() < MIN_ANALYSIS_HOUSES {
            return Err(SolverFailure::Rejected {
                reason: RejectionReason::Other,
                message: format!("Need at least {MIN_ANALYSIS_HOUSES} nodes for network analysis"),
            });
        }
        match self.backend.network_analysis(&request).await {
            Ok(SolverReply::Accepted(analysis)) => Ok(analysis),
            Ok(SolverReply::Rejected(body)) => Err(SolverFailure::from_rejection(body)),
            Err(err) => Err(communication(err)),
        }
    }

    pub async fn health(&self) -> std::result::Result<HealthReply, SolverFailure> {
        self.backend.health().await.map_err(communication)
    }
}

fn communication(err: anyhow::Error) -> SolverFailure {
    warn!("solver communication failure: {err:#}");
    SolverFailure::Communication(format!("{err:#}"))
}

fn costs_agree(total_cost: f64, total_length: f64, cost_per_meter: f64) -> bool {
    let expected = total_length * cost_per_meter;
    (total_cost - expected).abs() <= COST_TOLERANCE * expected.abs().max(1.0)
}

fn primary_from_reply(
    reply: Result<SolverReply<LayoutReply>>,
    house_count: usize,
    cost_per_meter: f64,
) -> std::result::Result<PrimaryLayout, SolverFailure> {
    let layout = match reply {
        Ok(SolverReply::Accepted(layout)) => layout,
        Ok(SolverReply::Rejected(body)) => return Err(SolverFailure::from_rejection(body)),
        Err(err) => return Err(communication(err)),
    };

    let expected_edges = house_count.saturating_sub(1);
    if layout.edges.len() != expected_edges {
        return Err(SolverFailure::Communication(format!(
            "malformed layout: expected {expected_edges} edges, got {}",
            layout.edges.len()
        )));
    }
    let Some(substation_connection) = layout.substation_connection else {
        return Err(SolverFailure::Communication(
            "malformed layout: missing substation connection".to_string(),
        ));
    };
    if !costs_agree(layout.total_cost, layout.total_length, cost_per_meter) {
        return Err(SolverFailure::Communication(format!(
            "malformed layout: total cost {:.2} does not match length {:.2} at {cost_per_meter} per meter",
            layout.total_cost, layout.total_length
        )));
    }

    Ok(PrimaryLayout {
        edges: layout.edges,
        substation_connection,
        total_length: layout.total_length,
        total_cost: layout.total_cost,
        cost_per_meter,
        house_count,
    })
}

fn backup_from_reply(
    reply: Result<SolverReply<LayoutReply>>,
    house_count: usize,
    cost_per_meter: f64,
    failed: FailedEdge,
) -> std::result::Result<BackupLayout, SolverFailure> {
    let layout = match reply {
        Ok(SolverReply::Accepted(layout)) => layout,
        Ok(SolverReply::Rejected(body)) => return Err(SolverFailure::from_rejection(body)),
        Err(err) => return Err(communication(err)),
    };

    let expected_edges = house_count.saturating_sub(1);
    if layout.edges.len() < expected_edges {
        return Err(SolverFailure::disconnected(format!(
            "partial network: only {} of {expected_edges} links could be restored",
            layout.edges.len()
        )));
    }
    if layout.edges.len() > expected_edges {
        return Err(SolverFailure::Communication(format!(
            "malformed backup layout: expected {expected_edges} edges, got {}",
            layout.edges.len()
        )));
    }
    if !costs_agree(layout.total_cost, layout.total_length, cost_per_meter) {
        return Err(SolverFailure::Communication(format!(
            "malformed backup layout: total cost {:.2} does not match length {:.2}",
            layout.total_cost, layout.total_length
        )));
    }

    Ok(BackupLayout {
        edges: layout.edges,
        total_length: layout.total_length,
        total_cost: layout.total_cost,
        failed,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
