use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Highlight,
    Danger,
    Problem,
}

impl ReportType {
    pub const ALL: [ReportType; 3] = [ReportType::Highlight, ReportType::Danger, ReportType::Problem];
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportType::Highlight => write!(f, "highlight"),
            ReportType::Danger => write!(f, "danger"),
            ReportType::Problem => write!(f, "problem"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    PendingReview,
    Active,
    Resolved,
    Archived,
    Rejected,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 5] = [
        ReportStatus::PendingReview,
        ReportStatus::Active,
        ReportStatus::Resolved,
        ReportStatus::Archived,
        ReportStatus::Rejected,
    ];
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::PendingReview => write!(f, "pending_review"),
            ReportStatus::Active => write!(f, "active"),
            ReportStatus::Resolved => write!(f, "resolved"),
            ReportStatus::Archived => write!(f, "archived"),
            ReportStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// Build from a `[lon, lat]` pair, the order map engines use for positions.
    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Coordinate {
            latitude: pair[1],
            longitude: pair[0],
        }
    }

    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Finite and within [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub creation_time: String,
    #[serde(default)]
    pub last_updated_time: Option<String>,
}

impl Report {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Body of `POST /reports`. `location` is an encoded `POINT(lon lat)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCreation {
    pub title: String,
    pub report_type: ReportType,
    #[serde(default)]
    pub description: String,
    pub location: String,
}

/// Body of `PATCH /reports/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_type: Option<ReportType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ReportEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.report_type.is_none()
            && self.description.is_none()
            && self.location.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ReportStatus,
}
