use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use serde_json::json;

use drive_calib_rs::{accel, log_reader, report};

#[derive(Parser, Debug)]
#[command(name = "calibrate_accel")]
#[command(about = "Derive max safe acceleration throttle from drivetrain calibration logs", long_about = None)]
struct Args {
    /// Calibration data file to analyze
    #[arg(value_name = "DATA_FILE", default_value = "CalibAccel.txt")]
    data_file: PathBuf,

    /// Parameter file to write
    #[arg(short = 'o', long = "output", default_value = "ParametersAccel.txt")]
    out_file: PathBuf,

    /// Also write a JSON run summary
    #[arg(long)]
    json_report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let profiles = log_reader::read_log_file(&args.data_file)?;
    println!(
        "Read {} profiles from {}",
        profiles.len(),
        args.data_file.display()
    );

    let cal = accel::calibrate(&profiles);

    let params = [
        (
            "MAX_FWD_PWR_ACCEL",
            report::format_sig3(cal.max_fwd_throttle()),
        ),
        (
            "MAX_BCK_PWR_ACCEL",
            report::format_sig3(cal.max_bck_throttle()),
        ),
    ];
    for (name, value) in &params {
        println!("{name} = {value}");
    }
    report::write_parameters(&args.out_file, &params)?;

    if let Some(path) = args.json_report.as_ref() {
        let summary = json!({
            "generated_at": Utc::now().to_rfc3339(),
            "data_file": args.data_file.display().to_string(),
            "profiles_total": cal.profiles_total,
            "profiles_valid": cal.profiles_valid,
            "all_profiles_valid": cal.all_profiles_valid,
            "pairs_evaluated": cal.pairs_evaluated,
            "degenerate_pairs": cal.degenerate_pairs,
            "forward": { "max_pass": cal.forward.max_pass, "min_fail": cal.forward.min_fail },
            "backward": { "max_pass": cal.backward.max_pass, "min_fail": cal.backward.min_fail },
            "constants": {
                "MAX_FWD_PWR_ACCEL": cal.max_fwd_throttle(),
                "MAX_BCK_PWR_ACCEL": cal.max_bck_throttle(),
            },
        });
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
    }

    if cal.all_profiles_valid {
        println!("Success");
    } else {
        println!("Calibration data file has problems; constants derived from the remaining valid profiles.");
    }
    Ok(())
}
