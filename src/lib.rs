//! Offline analysis of recorded drivetrain test maneuvers.
//!
//! The robot logs timestamped encoder/velocity samples while repeating small
//! test runs; this crate turns those logs into the calibration constants the
//! motion-control stack loads at startup: the maximum safe acceleration
//! throttle per direction (`calibrate_accel`) and which wheel leads during
//! forward/backward turns (`calibrate_op`).

pub mod accel;
pub mod log_reader;
pub mod output_power;
pub mod profile;
pub mod regression;
pub mod report;
pub mod stats;
pub mod validator;
