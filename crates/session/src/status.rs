//! Inline status text shown next to the map.

use shared::{
    domain::{BackupLayout, PrimaryLayout},
    impact::{ContingencyAssessment, ImpactLevel},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusPanel {
    Results,
    Backup,
    FailureAnalysis,
}

impl StatusPanel {
    pub const ALL: [StatusPanel; 3] = [Self::Results, Self::Backup, Self::FailureAnalysis];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Progress,
    Success,
    Error,
    Impact(ImpactLevel),
}

impl StatusTone {
    pub fn color(self) -> &'static str {
        match self {
            Self::Progress => "#666",
            Self::Success => "green",
            Self::Error => "red",
            Self::Impact(level) => level.color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub tone: StatusTone,
    pub title: String,
    pub lines: Vec<String>,
}

impl StatusMessage {
    fn new(tone: StatusTone, title: impl Into<String>) -> Self {
        Self {
            tone,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn computing() -> Self {
        Self::new(StatusTone::Progress, "Computing MST...")
    }

    pub fn layout_ready(layout: &PrimaryLayout) -> Self {
        let substation = match &layout.substation_connection.substation_name {
            Some(name) => format!(
                "Substation: {name} ({:.2} m)",
                layout.substation_connection.distance
            ),
            None => format!(
                "Substation link: {:.2} m",
                layout.substation_connection.distance
            ),
        };
        Self::new(StatusTone::Success, "MST Generated")
            .line(format!("Wiring Length: {:.2} m", layout.total_length))
            .line(format!("Total Cost: ₹{:.2}", layout.total_cost))
            .line(format!("Houses: {}", layout.house_count))
            .line(format!("MST Edges: {}", layout.edges.len()))
            .line(substation)
            .line("Click any blue edge to simulate failure")
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::new(StatusTone::Error, format!("Error: {message}"))
    }

    pub fn backup_active(primary: &PrimaryLayout, backup: &BackupLayout) -> Self {
        Self::new(StatusTone::Success, "Backup Network Active")
            .line(format!("Backup Length: {:.2} m", backup.total_length))
            .line(format!("Backup Cost: ₹{:.2}", backup.total_cost))
            .line(format!(
                "Cost Increase: ₹{:.2}",
                backup.total_cost - primary.total_cost
            ))
    }

    pub fn failure_analysis(
        assessment: &ContingencyAssessment,
        primary_cost: f64,
        backup_cost: Option<f64>,
    ) -> Self {
        let tone = StatusTone::Impact(assessment.impact);
        match (assessment.increase_pct, backup_cost) {
            (Some(increase_pct), Some(backup_cost)) => {
                let reliability = assessment
                    .reliability
                    .map(|reliability| reliability.to_string())
                    .unwrap_or_else(|| "n/a".to_string());
                Self::new(tone, "Failure Impact Analysis")
                    .line(format!("Impact Level: {}", assessment.impact))
                    .line(format!("Cost Increase: {increase_pct:.1}%"))
                    .line(format!(
                        "Original: ₹{primary_cost:.2} → Backup: ₹{backup_cost:.2}"
                    ))
                    .line(format!("Network Reliability: {reliability}"))
            }
            _ => {
                let detail = assessment
                    .detail
                    .clone()
                    .unwrap_or_else(|| "no backup layout".to_string());
                Self::new(tone, "Failure Analysis")
                    .line(format!("Error: {detail}"))
                    .line(format!("Impact Level: {}", assessment.impact))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::impact::classify;

    #[test]
    fn impact_tone_follows_level_color() {
        assert_eq!(StatusTone::Impact(ImpactLevel::Critical).color(), "darkred");
        assert_eq!(StatusTone::Impact(ImpactLevel::Unknown).color(), "gray");
    }

    #[test]
    fn analysis_lists_percentage_and_reliability() {
        let assessment = classify(1000.0, 1300.0);
        let message = StatusMessage::failure_analysis(&assessment, 1000.0, Some(1300.0));
        assert_eq!(message.tone, StatusTone::Impact(ImpactLevel::Medium));
        assert!(message.lines.contains(&"Cost Increase: 30.0%".to_string()));
        assert!(message
            .lines
            .contains(&"Network Reliability: MODERATE".to_string()));
    }

    #[test]
    fn disconnection_shows_error_and_impact() {
        let assessment = ContingencyAssessment::disconnected("Network becomes disconnected");
        let message = StatusMessage::failure_analysis(&assessment, 1000.0, None);
        assert_eq!(message.lines[0], "Error: Network becomes disconnected");
        assert_eq!(message.lines[1], "Impact Level: CRITICAL");
    }
}
