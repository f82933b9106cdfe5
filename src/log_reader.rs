//! Calibration log ingestion.
//!
//! The robot writes a semi-structured text log: timestamped status lines mixed
//! with tab-separated telemetry rows. Ingestion is split into a stateless line
//! classifier producing [`LogEvent`]s and a [`ProfileAssembler`] state machine
//! that folds events into [`CalibProfile`]s. The assembler is the contract the
//! analysis engines depend on; the classifier is the only piece that knows the
//! log syntax.
//!
//! Line shapes recognized (first tab-separated chunk carries the metadata):
//!
//! ```text
//! 005.123 : Robot battery voltage = 12.687
//! 005.123 : Nominal power: 0.40
//! 005.123 : Acceleration throttle: 0.001
//! 005.123 : Sequence: LR
//! 005.123 : Left Measure : 0.4
//! 005.123 : IMU heading at Begin: -0.000000
//! 005.123 : \t  50.000\t  20\t   20\t 0.520\t 0.440
//! 005.123 : Stopped
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::profile::{CalibProfile, CalibSample};

/// One structured event recognized from a log line.
#[derive(Clone, Debug, PartialEq)]
pub enum LogEvent {
    BatteryVoltage(f64),
    NominalPower(f64),
    AccelThrottle(f64),
    Sequence(String),
    LeftMeasure(f64),
    RightMeasure(f64),
    LeftMeasure2(f64),
    RightMeasure2(f64),
    ProfileStart,
    ProfileEnd,
    Sample(CalibSample),
}

/// Classify one log line. Lines that match nothing (chatter, malformed
/// telemetry rows) yield `None` and are dropped.
pub fn classify_line(line: &str) -> Option<LogEvent> {
    let chunks: Vec<&str> = line.split('\t').collect();
    let head = chunks[0];

    if head.contains("battery voltage") {
        let value = head.split('=').nth(1)?.trim().parse().ok()?;
        return Some(LogEvent::BatteryVoltage(value));
    }
    if head.contains("power:") {
        return parse_colon_field(head).map(LogEvent::NominalPower);
    }
    if head.contains("IMU") && head.contains("Begin") {
        return Some(LogEvent::ProfileStart);
    }
    if head.contains("Stopped") {
        return Some(LogEvent::ProfileEnd);
    }
    if head.contains("Left Measure :") {
        return parse_colon_field(head).map(LogEvent::LeftMeasure);
    }
    if head.contains("Right Measure :") {
        return parse_colon_field(head).map(LogEvent::RightMeasure);
    }
    if head.contains("Left Measure2 :") {
        return parse_colon_field(head).map(LogEvent::LeftMeasure2);
    }
    if head.contains("Right Measure2 :") {
        return parse_colon_field(head).map(LogEvent::RightMeasure2);
    }
    if head.contains("Sequence:") {
        let parts: Vec<&str> = head.split(':').collect();
        if parts.len() == 3 {
            return Some(LogEvent::Sequence(parts[2].trim().to_string()));
        }
        return None;
    }
    if head.contains("Acceleration throttle:") {
        return parse_colon_field(head).map(LogEvent::AccelThrottle);
    }

    // Telemetry row: timestamp, left/right encoder, left/right velocity after
    // the leading wall-clock chunk. Any field that fails to parse drops the
    // whole row.
    if chunks.len() == 6 {
        let timestamp = chunks[1].trim().parse().ok()?;
        let left_encoder = chunks[2].trim().parse().ok()?;
        let right_encoder = chunks[3].trim().parse().ok()?;
        let left_velocity = chunks[4].trim().parse().ok()?;
        let right_velocity = chunks[5].trim().parse().ok()?;
        return Some(LogEvent::Sample(CalibSample {
            timestamp,
            left_encoder,
            right_encoder,
            left_velocity,
            right_velocity,
        }));
    }

    None
}

/// Metadata lines look like `005.123 : Key: value`; the value is the third
/// colon-separated field.
fn parse_colon_field(head: &str) -> Option<f64> {
    let parts: Vec<&str> = head.split(':').collect();
    if parts.len() == 3 {
        parts[2].trim().parse().ok()
    } else {
        None
    }
}

/// Folds classified events into complete profiles.
///
/// Metadata values are rolling state: a profile closed by [`LogEvent::ProfileEnd`]
/// snapshots whatever was last announced, and values persist across profiles
/// until overwritten (the robot only re-announces what changed). Samples are
/// only collected between `ProfileStart` and `ProfileEnd`.
#[derive(Debug)]
pub struct ProfileAssembler {
    profiles: Vec<CalibProfile>,
    points: Vec<CalibSample>,
    acquiring: bool,
    battery_voltage: f64,
    nominal_power: f64,
    acceleration_throttle: f64,
    sequence: String,
    left_measure: f64,
    right_measure: f64,
    left_measure2: f64,
    right_measure2: f64,
}

impl Default for ProfileAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileAssembler {
    pub fn new() -> Self {
        ProfileAssembler {
            profiles: Vec::new(),
            points: Vec::new(),
            acquiring: false,
            battery_voltage: 0.0,
            nominal_power: 0.0,
            // Runs recorded before the throttle limiter existed carry none.
            acceleration_throttle: 1.0,
            sequence: String::new(),
            left_measure: 0.0,
            right_measure: 0.0,
            left_measure2: 0.0,
            right_measure2: 0.0,
        }
    }

    pub fn push(&mut self, event: LogEvent) {
        match event {
            LogEvent::BatteryVoltage(v) => self.battery_voltage = v,
            LogEvent::NominalPower(v) => self.nominal_power = v,
            LogEvent::AccelThrottle(v) => self.acceleration_throttle = v,
            LogEvent::Sequence(tag) => self.sequence = tag,
            LogEvent::LeftMeasure(v) => self.left_measure = v,
            LogEvent::RightMeasure(v) => self.right_measure = v,
            LogEvent::LeftMeasure2(v) => self.left_measure2 = v,
            LogEvent::RightMeasure2(v) => self.right_measure2 = v,
            LogEvent::ProfileStart => {
                self.points.clear();
                self.acquiring = true;
            }
            LogEvent::ProfileEnd => {
                self.profiles.push(CalibProfile {
                    samples: self.points.clone(),
                    nominal_power: self.nominal_power,
                    acceleration_throttle: self.acceleration_throttle,
                    battery_voltage: self.battery_voltage,
                    sequence: self.sequence.clone(),
                    left_measure: self.left_measure,
                    right_measure: self.right_measure,
                    left_measure2: self.left_measure2,
                    right_measure2: self.right_measure2,
                });
                self.acquiring = false;
            }
            LogEvent::Sample(sample) => {
                if self.acquiring {
                    self.points.push(sample);
                }
            }
        }
    }

    pub fn finish(self) -> Vec<CalibProfile> {
        self.profiles
    }
}

/// Parse a whole log from any buffered reader.
pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<CalibProfile>> {
    let mut assembler = ProfileAssembler::new();
    for line in reader.lines() {
        let line = line.context("failed reading calibration log line")?;
        if let Some(event) = classify_line(&line) {
            assembler.push(event);
        }
    }
    Ok(assembler.finish())
}

/// Open and parse a calibration log file.
pub fn read_log_file(path: &Path) -> Result<Vec<CalibProfile>> {
    info!("reading calibration data file {}", path.display());
    let file = File::open(path)
        .with_context(|| format!("cannot open calibration data file {}", path.display()))?;
    parse_log(BufReader::new(file))
}
