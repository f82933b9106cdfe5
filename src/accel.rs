//! Acceleration-throttle calibration.
//!
//! Repeated runs at the same nominal power and throttle differ only in the
//! measured distance, so any pair of such runs solves `ticks = S * measure +
//! L` for a side's ticks-per-measure `S` and slip offset `L`. A large slip
//! offset relative to `S` means the wheels broke traction during ramp-up; the
//! highest throttle whose repeats still pair up cleanly is the safe limit.

use log::{info, warn};

use crate::profile::CalibProfile;
use crate::validator::{self, ProfileFault};

/// A pair passes when both sides' slip ratios stay at or below this.
pub const SLIP_THRESHOLD: f64 = 0.25;

/// Two runs are repeats of the same operating point when their power and
/// throttle agree within this tolerance.
pub const OPERATING_POINT_TOLERANCE: f64 = 1e-6;

/// Scalars extracted from one valid profile.
#[derive(Clone, Copy, Debug)]
struct RunPoint {
    power: f64,
    throttle: f64,
    left_measure: f64,
    right_measure: f64,
    left_ticks: i32,
    right_ticks: i32,
}

/// Slip solution for one side of one profile pair.
#[derive(Clone, Copy, Debug)]
pub struct SideSlip {
    pub ticks_per_measure: f64,
    pub slip_offset: f64,
    pub slip_ratio: f64,
}

/// Solve `ticks = S * measure + L` for one side across a pair of repeats.
/// `None` when the measures coincide and the slope is undefined.
pub fn side_slip(
    ticks_a: i32,
    ticks_b: i32,
    measure_a: f64,
    measure_b: f64,
) -> Option<SideSlip> {
    if measure_a == measure_b {
        return None;
    }
    let ticks_per_measure =
        ((ticks_a - ticks_b) as f64 / (measure_a - measure_b)).abs();
    let slip_offset = ticks_a as f64 - ticks_per_measure * measure_a;
    let slip_ratio = slip_offset / ticks_per_measure;
    Some(SideSlip {
        ticks_per_measure,
        slip_offset,
        slip_ratio,
    })
}

/// Pass/fail throttle boundary for one direction.
///
/// `max_pass` starts at 0.0 (nothing proven safe) and `min_fail` at 1.0 (no
/// observed failure); the reported limit is `min(max_pass, min_fail)`, the
/// highest throttle known safe capped by the lowest known unsafe. With no
/// qualifying pairs at all this degenerates to `min(0.0, 1.0) = 0.0`, which is
/// the intended conservative fallback, not an error.
#[derive(Clone, Copy, Debug)]
pub struct ThrottleBounds {
    pub max_pass: f64,
    pub min_fail: f64,
}

impl Default for ThrottleBounds {
    fn default() -> Self {
        ThrottleBounds {
            max_pass: 0.0,
            min_fail: 1.0,
        }
    }
}

impl ThrottleBounds {
    fn record_pass(&mut self, throttle: f64) {
        if throttle > self.max_pass {
            self.max_pass = throttle;
        }
    }

    fn record_fail(&mut self, throttle: f64) {
        if throttle < self.min_fail {
            self.min_fail = throttle;
        }
    }

    pub fn limit(&self) -> f64 {
        self.max_pass.min(self.min_fail)
    }
}

/// Result of one acceleration calibration run.
#[derive(Clone, Debug)]
pub struct AccelCalibration {
    pub forward: ThrottleBounds,
    pub backward: ThrottleBounds,
    pub profiles_total: usize,
    pub profiles_valid: usize,
    pub pairs_evaluated: usize,
    pub degenerate_pairs: usize,
    pub all_profiles_valid: bool,
}

impl AccelCalibration {
    pub fn max_fwd_throttle(&self) -> f64 {
        self.forward.limit()
    }

    pub fn max_bck_throttle(&self) -> f64 {
        self.backward.limit()
    }
}

/// Run the full analysis: validate profiles, pair repeats, search the
/// pass/fail throttle boundary per direction.
pub fn calibrate(profiles: &[CalibProfile]) -> AccelCalibration {
    let mut points: Vec<RunPoint> = Vec::new();
    let mut all_valid = true;

    for (idx, profile) in profiles.iter().enumerate() {
        match extract_point(profile) {
            Ok(point) => points.push(point),
            Err(fault) => {
                validator::report_fault(idx, profile, &fault);
                all_valid = false;
            }
        }
    }

    let mut forward = ThrottleBounds::default();
    let mut backward = ThrottleBounds::default();
    let mut pairs_evaluated = 0usize;
    let mut degenerate_pairs = 0usize;

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let (a, b) = (&points[i], &points[j]);
            if (a.power - b.power).abs() >= OPERATING_POINT_TOLERANCE
                || (a.throttle - b.throttle).abs() >= OPERATING_POINT_TOLERANCE
            {
                continue;
            }

            let left = side_slip(a.left_ticks, b.left_ticks, a.left_measure, b.left_measure);
            let right = side_slip(
                a.right_ticks,
                b.right_ticks,
                a.right_measure,
                b.right_measure,
            );
            let (left, right) = match (left, right) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    // Identical measures carry no slope information; the pair
                    // is skipped rather than letting a division by zero leak
                    // NaN into the boundary search.
                    warn!(
                        "profiles at power {:.3} throttle {:.4}: identical measures, pair skipped",
                        a.power, a.throttle
                    );
                    degenerate_pairs += 1;
                    continue;
                }
            };

            pairs_evaluated += 1;
            let passed =
                left.slip_ratio <= SLIP_THRESHOLD && right.slip_ratio <= SLIP_THRESHOLD;
            info!(
                "power {:.3} throttle {:.4}: S(Lt)={:.2} L={:.2} S(Rt)={:.2} L={:.2} -> Lt {:.4} Rt {:.4} {}",
                a.power,
                a.throttle,
                left.ticks_per_measure,
                left.slip_offset,
                right.ticks_per_measure,
                right.slip_offset,
                left.slip_ratio,
                right.slip_ratio,
                if passed { "PASS" } else { "FAIL" }
            );

            let bounds = if a.power > 0.0 {
                &mut forward
            } else {
                &mut backward
            };
            if passed {
                bounds.record_pass(a.throttle);
            } else {
                bounds.record_fail(a.throttle);
            }
        }
    }

    AccelCalibration {
        forward,
        backward,
        profiles_total: profiles.len(),
        profiles_valid: points.len(),
        pairs_evaluated,
        degenerate_pairs,
        all_profiles_valid: all_valid,
    }
}

fn extract_point(profile: &CalibProfile) -> Result<RunPoint, ProfileFault> {
    validator::validate_series(profile)?;
    let (left_ticks, right_ticks) = profile.final_ticks().ok_or(ProfileFault::Empty)?;
    Ok(RunPoint {
        power: profile.nominal_power,
        throttle: profile.acceleration_throttle,
        left_measure: profile.left_measure,
        right_measure: profile.right_measure,
        left_ticks,
        right_ticks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CalibSample;
    use approx::assert_relative_eq;

    fn run(
        power: f64,
        throttle: f64,
        measure: f64,
        ticks: i32,
    ) -> CalibProfile {
        // Symmetric left/right run: both sides share measure and final ticks.
        let samples = vec![
            CalibSample {
                timestamp: 0.0,
                left_encoder: 0,
                right_encoder: 0,
                left_velocity: 0.0,
                right_velocity: 0.0,
            },
            CalibSample {
                timestamp: 100.0,
                left_encoder: ticks,
                right_encoder: ticks,
                left_velocity: 0.5,
                right_velocity: 0.5,
            },
        ];
        CalibProfile {
            samples,
            nominal_power: power,
            acceleration_throttle: throttle,
            battery_voltage: 12.6,
            sequence: "LR".to_string(),
            left_measure: measure,
            right_measure: measure,
            left_measure2: 0.0,
            right_measure2: 0.0,
        }
    }

    #[test]
    fn test_side_slip_clean_pair() {
        let slip = side_slip(100, 200, 1.0, 2.0).unwrap();
        assert_relative_eq!(slip.ticks_per_measure, 100.0);
        assert_relative_eq!(slip.slip_offset, 0.0);
        assert_relative_eq!(slip.slip_ratio, 0.0);
    }

    #[test]
    fn test_side_slip_heavy_slip() {
        // Extra 100 ticks at the shorter measure: ratio 1.0, well past 0.25.
        let slip = side_slip(200, 100, 1.0, 2.0).unwrap();
        assert_relative_eq!(slip.ticks_per_measure, 100.0);
        assert_relative_eq!(slip.slip_offset, 100.0);
        assert_relative_eq!(slip.slip_ratio, 1.0);
    }

    #[test]
    fn test_side_slip_degenerate_measures() {
        assert!(side_slip(100, 200, 1.5, 1.5).is_none());
    }

    #[test]
    fn test_passing_pair_sets_forward_limit() {
        let profiles = vec![run(0.4, 0.3, 1.0, 100), run(0.4, 0.3, 2.0, 200)];
        let cal = calibrate(&profiles);
        assert_eq!(cal.pairs_evaluated, 1);
        assert_relative_eq!(cal.max_fwd_throttle(), 0.3);
        // No backward pairs: conservative fallback.
        assert_relative_eq!(cal.max_bck_throttle(), 0.0);
        assert!(cal.all_profiles_valid);
    }

    #[test]
    fn test_failing_pair_caps_limit() {
        let profiles = vec![
            // Passing repeats at throttle 0.2
            run(0.4, 0.2, 1.0, 100),
            run(0.4, 0.2, 2.0, 200),
            // Slipping repeats at throttle 0.6
            run(0.4, 0.6, 1.0, 200),
            run(0.4, 0.6, 2.0, 100),
        ];
        let cal = calibrate(&profiles);
        assert_eq!(cal.pairs_evaluated, 2);
        assert_relative_eq!(cal.forward.max_pass, 0.2);
        assert_relative_eq!(cal.forward.min_fail, 0.6);
        assert_relative_eq!(cal.max_fwd_throttle(), 0.2);
    }

    #[test]
    fn test_failure_below_pass_wins() {
        let profiles = vec![
            run(0.4, 0.6, 1.0, 100),
            run(0.4, 0.6, 2.0, 200),
            run(0.4, 0.3, 1.0, 200),
            run(0.4, 0.3, 2.0, 100),
        ];
        let cal = calibrate(&profiles);
        // Passed at 0.6 but failed at 0.3: the lower failure caps the limit.
        assert_relative_eq!(cal.max_fwd_throttle(), 0.3);
    }

    #[test]
    fn test_backward_pairs_use_backward_bounds() {
        let profiles = vec![run(-0.4, 0.5, 1.0, 100), run(-0.4, 0.5, 2.0, 200)];
        let cal = calibrate(&profiles);
        assert_relative_eq!(cal.max_bck_throttle(), 0.5);
        assert_relative_eq!(cal.max_fwd_throttle(), 0.0);
    }

    #[test]
    fn test_no_matching_pairs_falls_back_to_zero() {
        let profiles = vec![run(0.4, 0.1, 1.0, 100), run(0.4, 0.2, 2.0, 200)];
        let cal = calibrate(&profiles);
        assert_eq!(cal.pairs_evaluated, 0);
        assert_relative_eq!(cal.max_fwd_throttle(), 0.0);
        assert_relative_eq!(cal.max_bck_throttle(), 0.0);
    }

    #[test]
    fn test_degenerate_pair_skipped() {
        let profiles = vec![run(0.4, 0.3, 1.5, 100), run(0.4, 0.3, 1.5, 200)];
        let cal = calibrate(&profiles);
        assert_eq!(cal.pairs_evaluated, 0);
        assert_eq!(cal.degenerate_pairs, 1);
        // The skip updates neither bound.
        assert_relative_eq!(cal.forward.min_fail, 1.0);
        assert_relative_eq!(cal.max_fwd_throttle(), 0.0);
    }

    #[test]
    fn test_invalid_profile_excluded() {
        let mut bad = run(0.4, 0.3, 1.0, 100);
        bad.samples[1].timestamp = -5.0;
        let profiles = vec![bad, run(0.4, 0.3, 2.0, 200), run(0.4, 0.3, 3.0, 300)];
        let cal = calibrate(&profiles);
        assert!(!cal.all_profiles_valid);
        assert_eq!(cal.profiles_valid, 2);
        // The two surviving repeats still pair up.
        assert_eq!(cal.pairs_evaluated, 1);
        assert_relative_eq!(cal.max_fwd_throttle(), 0.3);
    }
}
