//! End-to-end pipeline tests: literal log text through the reader, an engine,
//! and the parameter writer.

use std::io::Cursor;
use std::path::PathBuf;

use drive_calib_rs::{accel, log_reader, output_power, report};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("drive_calib_{}_{}", std::process::id(), name));
    path
}

/// One recorded run in log syntax. Both sides share the measure and final
/// tick count so slip behavior is easy to dial in.
fn accel_run(power: f64, throttle: f64, measure: f64, ticks: i32) -> String {
    format!(
        "001.000 : Nominal power: {power}\n\
         001.000 : Acceleration throttle: {throttle}\n\
         001.000 : Left Measure : {measure}\n\
         001.000 : Right Measure : {measure}\n\
         001.100 : IMU heading at Begin: -0.000000\n\
         001.200 : \t 0.000\t 0\t 0\t 0.000\t 0.000\n\
         001.300 : \t 100.000\t {ticks}\t {ticks}\t 0.500\t 0.500\n\
         001.400 : Stopped\n"
    )
}

#[test]
fn accel_pipeline_passing_pair_sets_constant() {
    let mut log = String::from("000.500 : Robot battery voltage = 12.6\n");
    log.push_str(&accel_run(0.40, 0.5, 1.0, 100));
    log.push_str(&accel_run(0.40, 0.5, 2.0, 200));

    let profiles = log_reader::parse_log(Cursor::new(log)).unwrap();
    assert_eq!(profiles.len(), 2);

    let cal = accel::calibrate(&profiles);
    assert!(cal.all_profiles_valid);
    assert_eq!(cal.pairs_evaluated, 1);

    let params = [
        ("MAX_FWD_PWR_ACCEL", report::format_sig3(cal.max_fwd_throttle())),
        ("MAX_BCK_PWR_ACCEL", report::format_sig3(cal.max_bck_throttle())),
    ];
    let out = temp_path("params_accel.txt");
    report::write_parameters(&out, &params).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    std::fs::remove_file(&out).ok();

    assert_eq!(written, "MAX_FWD_PWR_ACCEL = 0.5\nMAX_BCK_PWR_ACCEL = 0.0\n");
}

#[test]
fn accel_pipeline_failure_caps_boundary() {
    let mut log = String::new();
    // Clean repeats at throttle 0.5
    log.push_str(&accel_run(0.40, 0.5, 1.0, 100));
    log.push_str(&accel_run(0.40, 0.5, 2.0, 200));
    // Slipping repeats at throttle 0.8 (extra ticks at the shorter measure)
    log.push_str(&accel_run(0.40, 0.8, 1.0, 200));
    log.push_str(&accel_run(0.40, 0.8, 2.0, 100));

    let profiles = log_reader::parse_log(Cursor::new(log)).unwrap();
    let cal = accel::calibrate(&profiles);

    assert_eq!(cal.pairs_evaluated, 2);
    assert_eq!(report::format_sig3(cal.forward.min_fail), "0.8");
    // min(max passing 0.5, min failing 0.8)
    assert_eq!(report::format_sig3(cal.max_fwd_throttle()), "0.5");
}

#[test]
fn op_pipeline_decides_lead_side() {
    let log = "\
000.500 : Robot battery voltage = 12.6
001.000 : Nominal power: 0.40
001.000 : Sequence: LR
001.100 : IMU heading at Begin: 0.0
001.200 : \t 0.000\t 0\t 0\t 1.000\t 0.500
001.300 : \t 10.000\t 10\t 10\t 1.000\t 1.000
001.400 : Stopped
002.000 : Sequence: RL
002.100 : IMU heading at Begin: 0.0
002.200 : \t 0.000\t 20\t 20\t 1.000\t 1.000
002.300 : \t 10.000\t 30\t 30\t 1.000\t 1.000
002.400 : Stopped
";
    let profiles = log_reader::parse_log(Cursor::new(log)).unwrap();
    assert_eq!(profiles.len(), 2);

    let cal = output_power::calibrate(&profiles);
    assert!(cal.all_profiles_valid);
    // LR transient integral 7.5 vs RL immediate convergence: left leads.
    assert_eq!(cal.left_is_fwd_op, Some(true));
    assert_eq!(cal.left_is_bck_op, None);

    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(v) = cal.left_is_fwd_op {
        params.push(("LEFT_IS_FWD_OP", v.to_string()));
    }
    if let Some(v) = cal.left_is_bck_op {
        params.push(("LEFT_IS_BCK_OP", v.to_string()));
    }
    let out = temp_path("params_op.txt");
    report::write_parameters(&out, &params).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    std::fs::remove_file(&out).ok();

    assert_eq!(written, "LEFT_IS_FWD_OP = true\n");
}

#[test]
fn invalid_profile_reported_but_run_continues() {
    let mut log = String::new();
    log.push_str(&accel_run(0.40, 0.5, 1.0, 100));
    // Encoder runs backwards mid-profile: whole profile rejected.
    log.push_str(
        "003.000 : Left Measure : 3.0\n\
         003.000 : Right Measure : 3.0\n\
         003.100 : IMU heading at Begin: 0.0\n\
         003.200 : \t 0.000\t 500\t 500\t 0.500\t 0.500\n\
         003.300 : \t 100.000\t 400\t 400\t 0.500\t 0.500\n\
         003.400 : Stopped\n",
    );
    log.push_str(&accel_run(0.40, 0.5, 2.0, 200));

    let profiles = log_reader::parse_log(Cursor::new(log)).unwrap();
    assert_eq!(profiles.len(), 3);

    let cal = accel::calibrate(&profiles);
    assert!(!cal.all_profiles_valid);
    assert_eq!(cal.profiles_valid, 2);
    assert_eq!(cal.pairs_evaluated, 1);
    assert_eq!(report::format_sig3(cal.max_fwd_throttle()), "0.5");
}
