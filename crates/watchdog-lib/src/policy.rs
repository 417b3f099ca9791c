//! Threshold selection per capacity class
//!
//! Base conditions are configured in per-unit terms and scaled by the
//! profile's unit count before analysis. The smallest tier of each class is
//! special-cased: a single-unit instance cannot exhibit the utilization
//! dilution of a multi-unit one, so scaling by unit count would under-detect
//! it. Those tiers get a single fixed low threshold instead. The override
//! constants are policy configuration, not derived values.

use crate::error::ScanError;
use crate::models::{CapacityProfile, Condition};
use serde::{Deserialize, Serialize};

/// Base accelerator tier generation; together with a unit count of one it
/// identifies the smallest accelerator instance
const BASE_ACCELERATOR_GENERATION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// Base conditions for accelerator-bound jobs, ordered by severity
    pub accelerator_conditions: Vec<Condition>,
    /// Base conditions for processing-bound jobs, ordered by severity
    pub processing_conditions: Vec<Condition>,
    /// Fixed processing threshold for the smallest tier of either class
    #[serde(default = "default_processing_override")]
    pub small_tier_processing_override: f64,
    /// Fixed memory threshold for the smallest tier of either class
    #[serde(default = "default_memory_override")]
    pub small_tier_memory_override: f64,
}

fn default_processing_override() -> f64 {
    1.0
}

fn default_memory_override() -> f64 {
    5.0
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            accelerator_conditions: vec![Condition::new(30.0, 30.0), Condition::new(5.0, 90.0)],
            processing_conditions: vec![Condition::new(20.0, 20.0)],
            small_tier_processing_override: default_processing_override(),
            small_tier_memory_override: default_memory_override(),
        }
    }
}

impl ThresholdPolicy {
    /// Reject structurally unusable policies before a scan starts
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.accelerator_conditions.is_empty() {
            return Err(ScanError::InvalidConfig(
                "accelerator condition list is empty".to_string(),
            ));
        }
        if self.processing_conditions.is_empty() {
            return Err(ScanError::InvalidConfig(
                "processing condition list is empty".to_string(),
            ));
        }
        Ok(())
    }

    fn conditions_for(&self, profile: &CapacityProfile) -> &[Condition] {
        if profile.is_accelerator_bound {
            &self.accelerator_conditions
        } else {
            &self.processing_conditions
        }
    }

    fn is_smallest_tier(profile: &CapacityProfile) -> bool {
        if profile.is_accelerator_bound {
            profile.accelerator_units == 1
                && profile.generation == Some(BASE_ACCELERATOR_GENERATION)
        } else {
            profile.base_tier
        }
    }

    fn scaled(&self, profile: &CapacityProfile, pick: impl Fn(&Condition) -> f64, override_value: f64) -> Vec<f64> {
        if Self::is_smallest_tier(profile) {
            return vec![override_value];
        }
        let units = f64::from(profile.unit_count());
        self.conditions_for(profile)
            .iter()
            .map(|condition| pick(condition) * units)
            .collect()
    }

    /// Concrete thresholds for the processing-utilization metric
    pub fn processing_thresholds(&self, profile: &CapacityProfile) -> Vec<f64> {
        self.scaled(profile, |c| c.threshold, self.small_tier_processing_override)
    }

    /// Concrete thresholds for the memory-utilization metric
    pub fn memory_thresholds(&self, profile: &CapacityProfile) -> Vec<f64> {
        self.scaled(profile, |c| c.mem_threshold, self.small_tier_memory_override)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::classify;

    fn policy() -> ThresholdPolicy {
        ThresholdPolicy::default()
    }

    #[test]
    fn accelerator_thresholds_scale_by_unit_count() {
        // p3.8xlarge: 4 accelerator units
        let profile = classify("ml.p3.8xlarge").unwrap();

        assert_eq!(policy().processing_thresholds(&profile), vec![120.0, 20.0]);
        assert_eq!(policy().memory_thresholds(&profile), vec![120.0, 360.0]);
    }

    #[test]
    fn smallest_accelerator_tier_takes_fixed_override() {
        // Exactly one unit on the base generation
        let profile = classify("ml.p2.xlarge").unwrap();

        assert_eq!(policy().processing_thresholds(&profile), vec![1.0]);
        assert_eq!(policy().memory_thresholds(&profile), vec![5.0]);
    }

    #[test]
    fn single_unit_on_later_generation_still_scales() {
        // One unit but not the base generation: the usual scaling applies
        let profile = classify("ml.p3.xlarge").unwrap();

        assert_eq!(policy().processing_thresholds(&profile), vec![30.0, 5.0]);
    }

    #[test]
    fn processing_thresholds_scale_by_core_count() {
        let profile = classify("ml.m5.2xlarge").unwrap();

        assert_eq!(policy().processing_thresholds(&profile), vec![160.0]);
        assert_eq!(policy().memory_thresholds(&profile), vec![160.0]);
    }

    #[test]
    fn base_processing_tier_takes_fixed_override() {
        let profile = classify("ml.t3.large").unwrap();

        assert_eq!(policy().processing_thresholds(&profile), vec![1.0]);
        assert_eq!(policy().memory_thresholds(&profile), vec![5.0]);
    }

    #[test]
    fn explicit_single_size_scales_instead_of_overriding() {
        // xlarge has the minimum unit count but is not the base tier
        let profile = classify("ml.m5.xlarge").unwrap();

        assert_eq!(policy().processing_thresholds(&profile), vec![80.0]);
    }

    #[test]
    fn override_constants_are_configurable() {
        let custom = ThresholdPolicy {
            small_tier_processing_override: 2.5,
            small_tier_memory_override: 7.5,
            ..ThresholdPolicy::default()
        };
        let profile = classify("ml.p2.xlarge").unwrap();

        assert_eq!(custom.processing_thresholds(&profile), vec![2.5]);
        assert_eq!(custom.memory_thresholds(&profile), vec![7.5]);
    }

    #[test]
    fn empty_condition_list_fails_validation() {
        let broken = ThresholdPolicy {
            processing_conditions: vec![],
            ..ThresholdPolicy::default()
        };

        assert!(matches!(
            broken.validate(),
            Err(ScanError::InvalidConfig(_))
        ));
    }
}
