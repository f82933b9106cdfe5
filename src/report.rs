//! Rendering and persistence of calibration constants.
//!
//! The parameter file is consumed by the motion-control stack's key=value
//! loader: one `NAME = value` line per constant, numbers rounded to three
//! significant figures, booleans as literal `true`/`false`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Round to 3 significant figures, half away from zero.
fn round_sig3(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let exponent = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(2 - exponent);
    (value * scale).round() / scale
}

/// Render a number to 3 significant figures with trailing zeros stripped,
/// keeping a single `.0` on integral values (`1.0`, never `1` or `0.8230`).
pub fn format_sig3(value: f64) -> String {
    let rounded = round_sig3(value);
    let mut rendered = format!("{rounded}");
    if !rendered.contains('.') && !rendered.contains('e') && rounded.is_finite() {
        rendered.push_str(".0");
    }
    rendered
}

/// Format the parameter file body from already-rendered values.
pub fn parameter_lines(params: &[(&str, String)]) -> String {
    let mut body = String::new();
    for (name, value) in params {
        body.push_str(name);
        body.push_str(" = ");
        body.push_str(value);
        body.push('\n');
    }
    body
}

/// Write the parameter file. An unopenable output path is an input-fatal
/// error for the run; nothing partial is left behind beyond what the OS
/// already created.
pub fn write_parameters(path: &Path, params: &[(&str, String)]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("cannot open parameter file {}", path.display()))?;
    file.write_all(parameter_lines(params).as_bytes())
        .with_context(|| format!("failed to write parameter file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sig3_rounds_down() {
        assert_eq!(format_sig3(0.82345), "0.823");
    }

    #[test]
    fn test_format_sig3_integral_keeps_point_zero() {
        assert_eq!(format_sig3(1.0), "1.0");
        assert_eq!(format_sig3(0.0), "0.0");
        assert_eq!(format_sig3(250.0), "250.0");
    }

    #[test]
    fn test_format_sig3_no_trailing_padding() {
        assert_eq!(format_sig3(0.4), "0.4");
        assert_eq!(format_sig3(0.25), "0.25");
    }

    #[test]
    fn test_format_sig3_half_away_from_zero() {
        assert_eq!(format_sig3(0.12345), "0.123");
        assert_eq!(format_sig3(0.12364), "0.124");
        assert_eq!(format_sig3(-0.4567), "-0.457");
    }

    #[test]
    fn test_format_sig3_carries_into_next_magnitude() {
        assert_eq!(format_sig3(0.9996), "1.0");
    }

    #[test]
    fn test_parameter_lines_layout() {
        let body = parameter_lines(&[
            ("MAX_FWD_PWR_ACCEL", "0.823".to_string()),
            ("LEFT_IS_FWD_OP", "true".to_string()),
        ]);
        assert_eq!(body, "MAX_FWD_PWR_ACCEL = 0.823\nLEFT_IS_FWD_OP = true\n");
    }
}
