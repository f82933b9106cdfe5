//! Output-power (lead-wheel) calibration.
//!
//! During a turn one wheel is commanded to lead; which physical side actually
//! leads shows up as a transient where the trailing wheel's velocity lags the
//! leading wheel's. Integrating the velocity ratio over that transient gives a
//! per-run scalar: the larger the integral, the longer the lag. Comparing the
//! average integral of left-led runs against right-led runs per direction
//! tells the control stack which side to command first.

use log::{info, warn};

use crate::profile::CalibProfile;
use crate::stats;
use crate::validator;

/// The transient is over once the trailing/leading velocity ratio reaches
/// this close to 1:1.
pub const CONVERGENCE_RATIO: f64 = 0.97;

/// Velocity-ratio integral for one profile.
#[derive(Clone, Copy, Debug)]
pub struct RatioIntegral {
    pub value: f64,
    /// False when the ratio never reached [`CONVERGENCE_RATIO`] and the whole
    /// profile was integrated instead.
    pub converged: bool,
}

/// Trapezoidal time-integral of the velocity ratio from the first sample up to
/// and including the sample where the ratio first reaches the convergence
/// threshold.
///
/// The ratio is trailing over leading: `rv/lv` when the left side leads,
/// `lv/rv` otherwise. Samples where both velocities are exactly zero pin the
/// ratio to 1.0 without counting as convergence (the robot has not started
/// moving yet). The scan is bounded by the sample count; pathological data
/// that never converges yields the whole-profile integral and is flagged.
pub fn ratio_integral(profile: &CalibProfile, left_leads: bool) -> RatioIntegral {
    let mut integral = 0.0;
    let mut last_ratio = 1.0;
    let mut last_ts = 0.0;
    let mut converged = false;

    for (idx, sample) in profile.samples.iter().enumerate() {
        let ratio = if sample.left_velocity == 0.0 && sample.right_velocity == 0.0 {
            1.0
        } else {
            let r = if left_leads {
                sample.right_velocity / sample.left_velocity
            } else {
                sample.left_velocity / sample.right_velocity
            };
            if r >= CONVERGENCE_RATIO {
                converged = true;
            }
            r
        };

        if idx > 0 {
            integral += (sample.timestamp - last_ts) * (ratio + last_ratio) / 2.0;
        }
        last_ratio = ratio;
        last_ts = sample.timestamp;

        if converged {
            break;
        }
    }

    RatioIntegral {
        value: integral,
        converged,
    }
}

/// Per-run integrals bucketed by (direction, sequence).
#[derive(Clone, Debug, Default)]
pub struct RatioBuckets {
    pub fwd_lr: Vec<f64>,
    pub fwd_rl: Vec<f64>,
    pub bck_lr: Vec<f64>,
    pub bck_rl: Vec<f64>,
}

/// Result of one output-power calibration run.
///
/// The lead-side decisions are `None` when either bucket of a comparison is
/// empty: with no runs observed for a (direction, sequence) combination there
/// is no mean to compare, and inventing one would silently pick a side.
#[derive(Clone, Debug)]
pub struct OpCalibration {
    pub left_is_fwd_op: Option<bool>,
    pub left_is_bck_op: Option<bool>,
    pub buckets: RatioBuckets,
    pub profiles_total: usize,
    pub profiles_valid: usize,
    pub unconverged_profiles: usize,
    pub all_profiles_valid: bool,
}

/// Run the full analysis: validate profiles (series plus sequence tag),
/// integrate each run's velocity ratio, bucket by direction and sequence, and
/// compare bucket means.
pub fn calibrate(profiles: &[CalibProfile]) -> OpCalibration {
    let mut buckets = RatioBuckets::default();
    let mut all_valid = true;
    let mut profiles_valid = 0usize;
    let mut unconverged = 0usize;

    for (idx, profile) in profiles.iter().enumerate() {
        let checked = validator::validate_series(profile)
            .and_then(|_| validator::validate_sequence_tag(profile));
        if let Err(fault) = checked {
            validator::report_fault(idx, profile, &fault);
            all_valid = false;
            continue;
        }
        profiles_valid += 1;

        let left_leads = profile.sequence == "LR";
        let result = ratio_integral(profile, left_leads);
        if !result.converged {
            warn!(
                "profile {} (power {:.3}) velocity ratio never reached {:.2}, using whole-profile integral",
                idx, profile.nominal_power, CONVERGENCE_RATIO
            );
            unconverged += 1;
        }
        info!(
            "{} {:5.2} {:.6}",
            profile.sequence, profile.nominal_power, result.value
        );

        match (profile.is_forward(), left_leads) {
            (true, true) => buckets.fwd_lr.push(result.value),
            (true, false) => buckets.fwd_rl.push(result.value),
            (false, true) => buckets.bck_lr.push(result.value),
            (false, false) => buckets.bck_rl.push(result.value),
        }
    }

    let left_is_fwd_op = lead_decision("forward", &buckets.fwd_lr, &buckets.fwd_rl);
    let left_is_bck_op = lead_decision("backward", &buckets.bck_lr, &buckets.bck_rl);

    OpCalibration {
        left_is_fwd_op,
        left_is_bck_op,
        buckets,
        profiles_total: profiles.len(),
        profiles_valid,
        unconverged_profiles: unconverged,
        all_profiles_valid: all_valid,
    }
}

fn lead_decision(direction: &str, lr: &[f64], rl: &[f64]) -> Option<bool> {
    match (stats::mean(lr), stats::mean(rl)) {
        (Some(lr_avg), Some(rl_avg)) => {
            info!(
                "{direction}: LR avg {:.6} ({} runs) vs RL avg {:.6} ({} runs)",
                lr_avg,
                lr.len(),
                rl_avg,
                rl.len()
            );
            Some(lr_avg >= rl_avg)
        }
        _ => {
            warn!(
                "{direction}: insufficient data (LR {} runs, RL {} runs), no lead-side decision",
                lr.len(),
                rl.len()
            );
            None
        }
    }
}
