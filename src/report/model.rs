use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Workflow status of a technical visit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Submitted,
    Reviewed,
    Approved,
}

impl ReportStatus {
    /// Tab order of the panel.
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::Submitted,
        ReportStatus::Reviewed,
        ReportStatus::Approved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Submitted => "submitted",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Approved => "approved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Submitted => "Submitted",
            ReportStatus::Reviewed => "Reviewed",
            ReportStatus::Approved => "Approved",
        }
    }

    /// The only stage a report may move to from this one.
    pub fn next(&self) -> Option<ReportStatus> {
        match self {
            ReportStatus::Submitted => Some(ReportStatus::Reviewed),
            ReportStatus::Reviewed => Some(ReportStatus::Approved),
            ReportStatus::Approved => None,
        }
    }

    pub fn can_advance_to(&self, target: ReportStatus) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown report status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ReportStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "submitted" => Ok(ReportStatus::Submitted),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "approved" => Ok(ReportStatus::Approved),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

/// A technician-submitted record of a site visit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[schema(example = "Xb3kPq9LmN2vR7tY")]
    #[serde(default)]
    pub id: String,
    #[schema(example = "Clinique Saint-Roch")]
    #[serde(default)]
    pub client_name: Option<String>,
    #[schema(example = "12 rue des Lilas, Lyon")]
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub technician_name: Option<String>,
    #[serde(default)]
    pub project_manager: Option<String>,
    pub status: ReportStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub floors: Vec<Floor>,
}

/// One floor of the surveyed building. Component records are forwarded as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub network_cabinets: Vec<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub perforations: Vec<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub access_traps: Vec<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub cable_paths: Vec<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub cable_trunkings: Vec<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub conduits: Vec<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub copper_cablings: Vec<Value>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub fiber_optic_cablings: Vec<Value>,
}

impl Floor {
    pub fn component_count(&self) -> usize {
        self.network_cabinets.len()
            + self.perforations.len()
            + self.access_traps.len()
            + self.cable_paths.len()
            + self.cable_trunkings.len()
            + self.conduits.len()
            + self.copper_cablings.len()
            + self.fiber_optic_cablings.len()
    }
}

impl Report {
    /// Client name as shown on cards.
    pub fn display_name(&self) -> &str {
        match self.client_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Unnamed Report",
        }
    }

    pub fn total_components(&self) -> usize {
        self.floors.iter().map(Floor::component_count).sum()
    }
}

/// Accepts RFC 3339, naive ISO date-times (read as UTC), plain dates and
/// epoch milliseconds. Anything else reads as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_timestamp_value))
}

pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
