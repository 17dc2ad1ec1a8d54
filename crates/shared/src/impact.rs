//! Reliability verdicts derived from the cost of a backup layout.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Increases above this percentage are at least MEDIUM.
pub const MEDIUM_IMPACT_ABOVE_PCT: f64 = 20.0;
/// Increases above this percentage are HIGH.
pub const HIGH_IMPACT_ABOVE_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl ImpactLevel {
    pub fn from_increase_pct(increase_pct: f64) -> Self {
        if increase_pct > HIGH_IMPACT_ABOVE_PCT {
            Self::High
        } else if increase_pct > MEDIUM_IMPACT_ABOVE_PCT {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn reliability(self) -> Option<Reliability> {
        match self {
            Self::Low => Some(Reliability::Good),
            Self::Medium => Some(Reliability::Moderate),
            Self::High => Some(Reliability::Poor),
            Self::Critical | Self::Unknown => None,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Medium => "orange",
            Self::High => "red",
            Self::Critical => "darkred",
            Self::Unknown => "gray",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reliability {
    Good,
    Moderate,
    Poor,
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "GOOD",
            Self::Moderate => "MODERATE",
            Self::Poor => "POOR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyAssessment {
    pub impact: ImpactLevel,
    /// Absent when the network cannot be reconnected or the solver was unreachable.
    pub increase_pct: Option<f64>,
    pub reliability: Option<Reliability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ContingencyAssessment {
    pub fn disconnected(detail: impl Into<String>) -> Self {
        Self {
            impact: ImpactLevel::Critical,
            increase_pct: None,
            reliability: None,
            detail: Some(detail.into()),
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self {
            impact: ImpactLevel::Unknown,
            increase_pct: None,
            reliability: None,
            detail: Some(detail.into()),
        }
    }
}

/// Percentage increase of `backup_cost` over `primary_cost`, `None` when the
/// primary cost gives no meaningful baseline.
pub fn cost_increase_pct(primary_cost: f64, backup_cost: f64) -> Option<f64> {
    if !primary_cost.is_finite() || !backup_cost.is_finite() || primary_cost <= 0.0 {
        return None;
    }
    Some((backup_cost - primary_cost) * 100.0 / primary_cost)
}

pub fn classify(primary_cost: f64, backup_cost: f64) -> ContingencyAssessment {
    let Some(increase_pct) = cost_increase_pct(primary_cost, backup_cost) else {
        return ContingencyAssessment::unknown(format!(
            "cannot compare backup cost {backup_cost:.2} against primary cost {primary_cost:.2}"
        ));
    };
    let impact = ImpactLevel::from_increase_pct(increase_pct);
    ContingencyAssessment {
        impact,
        increase_pct: Some(increase_pct),
        reliability: impact.reliability(),
        detail: None,
    }
}
