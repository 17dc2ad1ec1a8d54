use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::domain::{BackupLayout, GeoPoint, House, PrimaryLayout};

pub const PROJECT_NAME: &str = "Optimal Electricity Distribution";

/// Plain-data snapshot of a designed network, ready to be written out as
/// JSON. The primary layout fields sit at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    #[serde(flatten)]
    pub layout: PrimaryLayout,
    pub houses: Vec<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupLayout>,
    pub timestamp: DateTime<Utc>,
    pub project: String,
}

impl SessionExport {
    pub fn new(
        layout: PrimaryLayout,
        houses: &[House],
        backup: Option<BackupLayout>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            layout,
            houses: houses.iter().map(|house| house.location).collect(),
            backup,
            timestamp,
            project: PROJECT_NAME.to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        export_file_name(self.timestamp.date_naive())
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("electricity_network_{}.json", date.format("%Y-%m-%d"))
}
