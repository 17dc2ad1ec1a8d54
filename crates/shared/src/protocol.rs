use serde::{Deserialize, Serialize};

use crate::{
    domain::{Edge, GeoPoint, House, Substation, SubstationConnection},
    error::{InputError, SolverErrorBody},
    impact::ImpactLevel,
};

pub const MIN_HOUSES: usize = 2;
pub const MIN_ANALYSIS_HOUSES: usize = 3;

pub const ROUTE_HEALTH: &str = "health";
pub const ROUTE_COMPUTE_MST: &str = "compute_mst";
pub const ROUTE_SIMULATE_FAILURE: &str = "simulate_failure";
pub const ROUTE_NETWORK_ANALYSIS: &str = "network_analysis";

pub fn validate_cost_per_meter(cost_per_meter: f64) -> Result<f64, InputError> {
    if cost_per_meter.is_finite() && cost_per_meter > 0.0 {
        Ok(cost_per_meter)
    } else {
        Err(InputError::InvalidCostPerMeter)
    }
}

/// Parses the free-text cost field the user types into.
pub fn parse_cost_per_meter(raw: &str) -> Result<f64, InputError> {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| InputError::InvalidCostPerMeter)?;
    validate_cost_per_meter(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailSpec {
    pub start: GeoPoint,
    pub end: GeoPoint,
}

impl From<&Edge> for FailSpec {
    fn from(edge: &Edge) -> Self {
        Self {
            start: edge.start,
            end: edge.end,
        }
    }
}

/// Body of every layout request. `fail` is present only for contingency runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub nodes: Vec<GeoPoint>,
    pub cost_per_meter: f64,
    #[serde(default)]
    pub substations: Vec<Substation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<FailSpec>,
}

impl LayoutRequest {
    pub fn primary(
        houses: &[House],
        cost_per_meter: f64,
        substations: &[Substation],
    ) -> Result<Self, InputError> {
        let request = Self {
            nodes: houses.iter().map(|house| house.location).collect(),
            cost_per_meter,
            substations: substations.to_vec(),
            fail: None,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn contingency(
        houses: &[House],
        cost_per_meter: f64,
        substations: &[Substation],
        failed: &Edge,
    ) -> Result<Self, InputError> {
        let mut request = Self::primary(houses, cost_per_meter, substations)?;
        request.fail = Some(FailSpec::from(failed));
        Ok(request)
    }

    pub fn is_failure_mode(&self) -> bool {
        self.fail.is_some()
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.nodes.len() < MIN_HOUSES {
            return Err(InputError::TooFewHouses(self.nodes.len()));
        }
        validate_cost_per_meter(self.cost_per_meter)?;
        if let Some(index) = self.nodes.iter().position(|node| !node.is_valid()) {
            return Err(InputError::InvalidCoordinate { index });
        }
        if self.substations.is_empty() {
            return Err(InputError::NoSubstations);
        }
        if let Some(index) = self
            .substations
            .iter()
            .position(|substation| !substation.location().is_valid())
        {
            return Err(InputError::InvalidSubstation { index });
        }
        Ok(())
    }
}

/// Solver answers are either a rejection body or the requested payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SolverReply<T> {
    Rejected(SolverErrorBody),
    Accepted(T),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutReply {
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substation_connection: Option<SubstationConnection>,
    pub total_length: f64,
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mst_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substation_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub houses_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_edges_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computation_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: f64,
}

impl HealthReply {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeImpact {
    pub edge_index: usize,
    pub edge: Edge,
    pub critical: bool,
    pub cost_impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_impact_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_cost: Option<f64>,
    pub impact_level: ImpactLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResilienceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub total_edges: usize,
    pub critical_edges: usize,
    pub high_impact_edges: usize,
    pub reliability_score: u32,
    pub resilience_level: ResilienceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkAnalysisReply {
    pub original_network: LayoutReply,
    pub edge_analysis: Vec<EdgeImpact>,
    pub network_metrics: NetworkMetrics,
    pub timestamp: f64,
}
