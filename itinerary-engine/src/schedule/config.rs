//! Scheduling policy for the consistency engine.

use chrono::Duration;

use crate::domain::TransferMode;

/// Tunable thresholds and defaults used by the validator, the gap filler,
/// and the cascade rescheduler.
#[derive(Debug, Clone)]
pub struct SchedulePolicy {
    /// Idle time between consecutive segments tolerated before the gap is
    /// flagged as a fill candidate (minutes).
    pub max_idle_gap_mins: i64,

    /// Two coordinates within this great-circle distance count as the same
    /// locality (kilometers).
    pub proximity_km: f64,

    /// Whether two custom segments may deliberately share time.
    /// Lodging always may; this flag only widens the rule.
    pub allow_custom_overlap: bool,

    /// Conveyance assumed for transfers the gap filler synthesizes.
    pub default_transfer_mode: TransferMode,
}

impl SchedulePolicy {
    /// Create a policy with the given parameters.
    pub fn new(
        max_idle_gap_mins: i64,
        proximity_km: f64,
        allow_custom_overlap: bool,
        default_transfer_mode: TransferMode,
    ) -> Self {
        Self {
            max_idle_gap_mins,
            proximity_km,
            allow_custom_overlap,
            default_transfer_mode,
        }
    }

    /// Returns the idle-gap threshold as a Duration.
    pub fn max_idle_gap(&self) -> Duration {
        Duration::minutes(self.max_idle_gap_mins)
    }
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            max_idle_gap_mins: 360, // 6 hours
            proximity_km: 50.0,
            allow_custom_overlap: true,
            default_transfer_mode: TransferMode::Ground,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = SchedulePolicy::default();

        assert_eq!(policy.max_idle_gap_mins, 360);
        assert_eq!(policy.proximity_km, 50.0);
        assert!(policy.allow_custom_overlap);
        assert_eq!(policy.default_transfer_mode, TransferMode::Ground);
    }

    #[test]
    fn duration_methods() {
        let policy = SchedulePolicy::default();

        assert_eq!(policy.max_idle_gap(), Duration::hours(6));
    }

    #[test]
    fn custom_policy() {
        let policy = SchedulePolicy::new(120, 25.0, false, TransferMode::Rail);

        assert_eq!(policy.max_idle_gap(), Duration::minutes(120));
        assert_eq!(policy.proximity_km, 25.0);
        assert!(!policy.allow_custom_overlap);
        assert_eq!(policy.default_transfer_mode, TransferMode::Rail);
    }
}
