use serde::{Deserialize, Serialize};

/// One timestamped drivetrain telemetry reading.
///
/// Timestamps are in the robot's monotonic clock units (milliseconds in
/// practice); encoder counts are cumulative ticks since power-on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibSample {
    pub timestamp: f64,
    pub left_encoder: i32,
    pub right_encoder: i32,
    pub left_velocity: f64,
    pub right_velocity: f64,
}

/// One recorded test run: an ordered series of samples plus the run-level
/// metadata captured from the log.
///
/// Sample order is insertion order and equals temporal order; a profile is
/// read-only once assembled. `sequence` is the raw tag from the log ("LR" or
/// "RL" when well-formed); the validator rejects anything else for the
/// output-power pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibProfile {
    pub samples: Vec<CalibSample>,
    pub nominal_power: f64,
    pub acceleration_throttle: f64,
    pub battery_voltage: f64,
    pub sequence: String,
    pub left_measure: f64,
    pub right_measure: f64,
    /// Reserved secondary measures, always zero in current logs.
    pub left_measure2: f64,
    pub right_measure2: f64,
}

impl CalibProfile {
    /// Final encoder readings of the run. Profiles are validated monotonic,
    /// so the last sample holds the maximum tick counts.
    pub fn final_ticks(&self) -> Option<(i32, i32)> {
        self.samples
            .last()
            .map(|s| (s.left_encoder, s.right_encoder))
    }

    /// Forward runs carry positive nominal power.
    pub fn is_forward(&self) -> bool {
        self.nominal_power > 0.0
    }
}
