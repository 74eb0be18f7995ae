//! Scheduler modes and status.

use serde::{Deserialize, Serialize};

/// The two timer policies a scheduler can run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// One randomized firing per day inside the configured window.
    #[default]
    Production,
    /// Fixed-interval polling plus one bootstrap firing.
    #[serde(alias = "test")]
    Continuous,
}

impl std::fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleMode::Production => write!(f, "production"),
            ScheduleMode::Continuous => write!(f, "continuous"),
        }
    }
}

impl std::str::FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "continuous" | "test" => Ok(Self::Continuous),
            other => Err(format!("unknown schedule mode: {other}")),
        }
    }
}

/// Timer state of a scheduler. `Stopped` holds no timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Stopped,
    ProductionWindow,
    ContinuousPoll,
}

impl From<ScheduleMode> for SchedulerState {
    fn from(mode: ScheduleMode) -> Self {
        match mode {
            ScheduleMode::Production => SchedulerState::ProductionWindow,
            ScheduleMode::Continuous => SchedulerState::ContinuousPoll,
        }
    }
}

/// Snapshot returned by `Scheduler::status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    /// Last mode that was armed; survives `stop()`.
    pub mode: ScheduleMode,
    pub has_production_timer: bool,
    pub has_continuous_timer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("production".parse::<ScheduleMode>().unwrap(), ScheduleMode::Production);
        assert_eq!("TEST".parse::<ScheduleMode>().unwrap(), ScheduleMode::Continuous);
        assert_eq!("continuous".parse::<ScheduleMode>().unwrap(), ScheduleMode::Continuous);
        assert!("hourly".parse::<ScheduleMode>().is_err());
        assert_eq!(ScheduleMode::Continuous.to_string(), "continuous");
        let legacy: ScheduleMode = serde_json::from_str("\"test\"").unwrap();
        assert_eq!(legacy, ScheduleMode::Continuous);
    }

    #[test]
    fn test_status_json_shape() {
        let status = SchedulerStatus {
            running: true,
            mode: ScheduleMode::Production,
            has_production_timer: true,
            has_continuous_timer: false,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["running"], true);
        assert_eq!(json["mode"], "production");
        assert_eq!(json["hasProductionTimer"], true);
        assert_eq!(json["hasContinuousTimer"], false);
    }
}
