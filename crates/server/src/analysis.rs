//! Failure of every tree edge in turn, summarized into network metrics.

use shared::{
    impact::{cost_increase_pct, ImpactLevel},
    protocol::{
        EdgeImpact, FailSpec, LayoutReply, LayoutRequest, NetworkMetrics, ResilienceLevel,
    },
};
use tracing::debug;

use crate::mst::{solve, SolveError};

const CRITICAL_PENALTY: i64 = 30;
const HIGH_PENALTY: i64 = 10;

/// Backup outcome for one failed tree edge.
pub fn assess_edge(
    request: &LayoutRequest,
    original: &LayoutReply,
    edge_index: usize,
) -> Option<EdgeImpact> {
    let edge = *original.edges.get(edge_index)?;
    let mut failing = request.clone();
    failing.fail = Some(FailSpec::from(&edge));

    let impact = match solve(&failing) {
        Ok(backup) => {
            let increase_pct = cost_increase_pct(original.total_cost, backup.total_cost);
            EdgeImpact {
                edge_index,
                edge,
                critical: false,
                cost_impact: backup.total_cost - original.total_cost,
                cost_impact_percent: increase_pct,
                backup_cost: Some(backup.total_cost),
                impact_level: increase_pct
                    .map_or(ImpactLevel::Unknown, ImpactLevel::from_increase_pct),
            }
        }
        Err(err) => {
            debug!(edge_index, %err, "edge failure leaves no backup");
            EdgeImpact {
                edge_index,
                edge,
                critical: true,
                cost_impact: 0.0,
                cost_impact_percent: None,
                backup_cost: None,
                impact_level: ImpactLevel::Critical,
            }
        }
    };
    Some(impact)
}

pub fn network_metrics(edges: &[EdgeImpact]) -> NetworkMetrics {
    let critical = edges.iter().filter(|edge| edge.critical).count();
    let high = edges
        .iter()
        .filter(|edge| edge.impact_level == ImpactLevel::High)
        .count();

    let score = 100 - CRITICAL_PENALTY * critical as i64 - HIGH_PENALTY * high as i64;
    let resilience_level = if critical == 0 && high <= 1 {
        ResilienceLevel::High
    } else if critical <= 1 {
        ResilienceLevel::Medium
    } else {
        ResilienceLevel::Low
    };

    NetworkMetrics {
        total_edges: edges.len(),
        critical_edges: critical,
        high_impact_edges: high,
        reliability_score: score.max(0) as u32,
        resilience_level,
    }
}

pub struct Analysis {
    pub original: LayoutReply,
    pub edges: Vec<EdgeImpact>,
    pub metrics: NetworkMetrics,
}

pub fn analyze(request: &LayoutRequest) -> Result<Analysis, SolveError> {
    let mut base = request.clone();
    base.fail = None;
    let original = solve(&base)?;

    let edges: Vec<EdgeImpact> = (0..original.edges.len())
        .filter_map(|index| assess_edge(&base, &original, index))
        .collect();
    let metrics = network_metrics(&edges);

    Ok(Analysis {
        original,
        edges,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Edge, GeoPoint, Substation};

    fn impact(critical: bool, level: ImpactLevel) -> EdgeImpact {
        EdgeImpact {
            edge_index: 0,
            edge: Edge::between(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.1)),
            critical,
            cost_impact: 0.0,
            cost_impact_percent: None,
            backup_cost: None,
            impact_level: level,
        }
    }

    #[test]
    fn score_loses_thirty_per_critical_and_ten_per_high() {
        let metrics = network_metrics(&[
            impact(true, ImpactLevel::Critical),
            impact(false, ImpactLevel::High),
            impact(false, ImpactLevel::Low),
        ]);
        assert_eq!(metrics.reliability_score, 60);
        assert_eq!(metrics.critical_edges, 1);
        assert_eq!(metrics.high_impact_edges, 1);
        assert_eq!(metrics.resilience_level, ResilienceLevel::Medium);
    }

    #[test]
    fn score_never_goes_below_zero() {
        let edges: Vec<_> = (0..5)
            .map(|_| impact(true, ImpactLevel::Critical))
            .collect();
        let metrics = network_metrics(&edges);
        assert_eq!(metrics.reliability_score, 0);
        assert_eq!(metrics.resilience_level, ResilienceLevel::Low);
    }

    #[test]
    fn one_high_edge_is_still_high_resilience() {
        let metrics = network_metrics(&[
            impact(false, ImpactLevel::High),
            impact(false, ImpactLevel::Medium),
        ]);
        assert_eq!(metrics.resilience_level, ResilienceLevel::High);
        let metrics = network_metrics(&[
            impact(false, ImpactLevel::High),
            impact(false, ImpactLevel::High),
        ]);
        assert_eq!(metrics.resilience_level, ResilienceLevel::Medium);
    }

    #[test]
    fn every_tree_edge_is_assessed() {
        let request = LayoutRequest {
            nodes: vec![
                GeoPoint::new(30.10, 78.10),
                GeoPoint::new(30.11, 78.10),
                GeoPoint::new(30.12, 78.10),
                GeoPoint::new(30.13, 78.10),
            ],
            cost_per_meter: 500.0,
            substations: vec![Substation::new("Dakpatti", 30.3572, 78.0789)],
            fail: None,
        };
        let analysis = analyze(&request).expect("analysis");
        assert_eq!(analysis.edges.len(), 3);
        assert_eq!(analysis.metrics.critical_edges, 0);
        for (index, edge) in analysis.edges.iter().enumerate() {
            assert_eq!(edge.edge_index, index);
            assert!(edge.cost_impact > 0.0, "detour costs more");
            assert!(edge.backup_cost.is_some());
        }
    }
}
