use std::time::Duration;

use cimes_shared::models::Coordinate;
use serde::Deserialize;

use crate::camera::CameraSettings;

/// Retry schedule for the mount-time report fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            max_attempts: 3,
            base_backoff_ms: 500,
        }
    }
}

impl FetchPolicy {
    /// Delay before retrying after failed attempt `attempt` (1-based): base, 2x base, 4x base...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub initial_center: Coordinate,
    pub initial_zoom: f64,
    pub initial_duration_ms: u64,
    pub recenter_zoom: f64,
    pub recenter_duration_ms: u64,
    pub visibility_threshold: f64,
    pub fetch: FetchPolicy,
    pub api_base_url: String,
    /// Half-width in degrees of the area fetched around the initial center. `None` fetches
    /// every report.
    pub report_area_half_span: Option<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            // Mont Blanc
            initial_center: Coordinate::new(45.832119, 6.865575),
            initial_zoom: 15.0,
            initial_duration_ms: 1000,
            recenter_zoom: 16.0,
            recenter_duration_ms: 1500,
            visibility_threshold: 1.0,
            fetch: FetchPolicy::default(),
            api_base_url: "http://localhost:3000".to_string(),
            report_area_half_span: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: SessionConfig = serde_json::from_str(json)?;
        if !config.initial_center.is_valid() {
            return Err(serde::de::Error::custom(format!(
                "initial_center out of range: {}, {}",
                config.initial_center.latitude, config.initial_center.longitude
            )));
        }
        Ok(config)
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            initial_duration_ms: self.initial_duration_ms,
            recenter_zoom: self.recenter_zoom,
            recenter_duration_ms: self.recenter_duration_ms,
        }
    }
}
