//! Capacity classification from resource-class descriptors
//!
//! Descriptors have the shape `<family>.<tier>.<size>` where the size token
//! is `large` (the base single-unit tier), `xlarge`, or `<N>xlarge`. Tiers
//! matching an accelerator generation (`p2`, `p3`, ...) classify the job as
//! accelerator-bound; everything else is processing-bound. Parsing is
//! explicit token splitting so the two grammars stay independently testable.

use crate::error::CapacityError;
use crate::models::CapacityProfile;

/// Processing units granted per size step
const UNITS_PER_SIZE_STEP: u32 = 4;

/// Default processing units for the base tier
const MIN_PROCESSING_UNITS: u32 = 4;

/// Parsed size suffix of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SizeToken {
    /// Size multiplier; 1 when the token carries no explicit count
    multiplier: u32,
    /// True for the bare base tier with no multiplier suffix at all
    base: bool,
}

fn parse_size_token(token: &str) -> Option<SizeToken> {
    if token == "large" {
        return Some(SizeToken {
            multiplier: 1,
            base: true,
        });
    }
    let prefix = token.strip_suffix("xlarge")?;
    if prefix.is_empty() {
        return Some(SizeToken {
            multiplier: 1,
            base: false,
        });
    }
    let multiplier = prefix.parse::<u32>().ok()?;
    Some(SizeToken { multiplier, base: false })
}

/// Parse an accelerator tier token (`p<generation>`, generation >= 2)
fn parse_accelerator_generation(tier: &str) -> Option<u32> {
    let digit = tier.strip_prefix('p')?;
    if digit.len() != 1 {
        return None;
    }
    let generation = digit.parse::<u32>().ok()?;
    // Generation 1 would make the per-unit divisor zero; no such tier exists
    if generation < 2 {
        return None;
    }
    Some(generation)
}

fn accelerator_profile(generation: u32, size: SizeToken) -> CapacityProfile {
    CapacityProfile {
        accelerator_units: (size.multiplier / (generation - 1)).max(1),
        processing_units: (size.multiplier * UNITS_PER_SIZE_STEP).max(MIN_PROCESSING_UNITS),
        is_accelerator_bound: true,
        generation: Some(generation),
        base_tier: false,
    }
}

fn processing_profile(size: SizeToken) -> CapacityProfile {
    CapacityProfile {
        accelerator_units: 0,
        processing_units: (size.multiplier * UNITS_PER_SIZE_STEP).max(MIN_PROCESSING_UNITS),
        is_accelerator_bound: false,
        generation: None,
        base_tier: size.base,
    }
}

/// Derive a job's capacity profile from its resource-class descriptor
///
/// Pure and idempotent. The processing branch is the implicit fallback for
/// any descriptor lacking the accelerator pattern; only descriptors without
/// a recognizable size token are rejected.
pub fn classify(descriptor: &str) -> Result<CapacityProfile, CapacityError> {
    let invalid = || CapacityError::InvalidDescriptor(descriptor.to_string());

    let mut segments = descriptor.split('.');
    let (Some(family), Some(tier), Some(size_segment), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(invalid());
    };
    if family.is_empty() || tier.is_empty() {
        return Err(invalid());
    }
    let size = parse_size_token(size_segment).ok_or_else(invalid)?;

    // The accelerator grammar requires an xlarge-form size token; a base
    // tier on an accelerator family name is treated as processing-bound.
    match parse_accelerator_generation(tier) {
        Some(generation) if !size.base => Ok(accelerator_profile(generation, size)),
        _ => Ok(processing_profile(size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerator_units_scale_with_generation_divisor() {
        // generation 3, size 8: 8 / (3 - 1) = 4 units
        let profile = classify("ml.p3.8xlarge").unwrap();

        assert!(profile.is_accelerator_bound);
        assert_eq!(profile.accelerator_units, 4);
        assert_eq!(profile.generation, Some(3));
        assert_eq!(profile.unit_count(), 4);
    }

    #[test]
    fn smallest_accelerator_tier_has_one_unit() {
        let profile = classify("ml.p2.xlarge").unwrap();

        assert!(profile.is_accelerator_bound);
        assert_eq!(profile.accelerator_units, 1);
        assert_eq!(profile.generation, Some(2));
    }

    #[test]
    fn accelerator_units_floor_at_one() {
        // 1 / (3 - 1) floors to 0, clamped to 1
        let profile = classify("ml.p3.xlarge").unwrap();

        assert_eq!(profile.accelerator_units, 1);
    }

    #[test]
    fn processing_units_are_four_per_size_step() {
        let profile = classify("ml.m5.2xlarge").unwrap();

        assert!(!profile.is_accelerator_bound);
        assert_eq!(profile.processing_units, 8);
        assert_eq!(profile.accelerator_units, 0);
        assert!(!profile.base_tier);
    }

    #[test]
    fn base_tier_defaults_to_minimum_units() {
        let profile = classify("ml.t3.large").unwrap();

        assert!(!profile.is_accelerator_bound);
        assert_eq!(profile.processing_units, 4);
        assert!(profile.base_tier);
    }

    #[test]
    fn explicit_single_size_is_not_base_tier() {
        let profile = classify("ml.m5.xlarge").unwrap();

        assert_eq!(profile.processing_units, 4);
        assert!(!profile.base_tier);
    }

    #[test]
    fn accelerator_family_base_tier_falls_back_to_processing() {
        let profile = classify("ml.p2.large").unwrap();

        assert!(!profile.is_accelerator_bound);
        assert_eq!(profile.processing_units, 4);
    }

    #[test]
    fn classification_is_idempotent() {
        let first = classify("ml.p3.16xlarge").unwrap();
        let second = classify("ml.p3.16xlarge").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.accelerator_units, 8);
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        for descriptor in ["", "ml", "ml.m5", "ml.m5.medium", "ml..large", "ml.m5.large.extra"] {
            assert_eq!(
                classify(descriptor),
                Err(CapacityError::InvalidDescriptor(descriptor.to_string())),
                "descriptor {descriptor:?} should be rejected"
            );
        }
    }
}
