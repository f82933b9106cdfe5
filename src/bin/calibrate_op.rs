use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use serde_json::json;

use drive_calib_rs::{log_reader, output_power, report};

#[derive(Parser, Debug)]
#[command(name = "calibrate_op")]
#[command(about = "Derive lead-wheel (output power) direction constants from drivetrain calibration logs", long_about = None)]
struct Args {
    /// Calibration data file to analyze
    #[arg(value_name = "DATA_FILE", default_value = "CalibOP.txt")]
    data_file: PathBuf,

    /// Parameter file to write
    #[arg(short = 'o', long = "output", default_value = "ParametersOP.txt")]
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

    let cal = output_power::calibrate(&profiles);

    // A direction with no data on one side of the comparison gets no line;
    // the control stack keeps its previous constant and the operator is told.
    let mut params: Vec<(&str, String)> = Vec::new();
    match cal.left_is_fwd_op {
        Some(v) => params.push(("LEFT_IS_FWD_OP", v.to_string())),
        None => println!("LEFT_IS_FWD_OP: insufficient data, not written"),
    }
    match cal.left_is_bck_op {
        Some(v) => params.push(("LEFT_IS_BCK_OP", v.to_string())),
        None => println!("LEFT_IS_BCK_OP: insufficient data, not written"),
    }
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
            "unconverged_profiles": cal.unconverged_profiles,
            "bucket_sizes": {
                "fwd_lr": cal.buckets.fwd_lr.len(),
                "fwd_rl": cal.buckets.fwd_rl.len(),
                "bck_lr": cal.buckets.bck_lr.len(),
                "bck_rl": cal.buckets.bck_rl.len(),
            },
            "constants": {
                "LEFT_IS_FWD_OP": cal.left_is_fwd_op,
                "LEFT_IS_BCK_OP": cal.left_is_bck_op,
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
