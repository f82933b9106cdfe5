//! Closed-form least-squares fits used by the calibration analysis.
//!
//! Both fits are pure functions over paired slices. They return `None` when
//! the slices disagree in length or hold fewer than two points; callers treat
//! that as "insufficient data", never as a panic.

/// Result of an ordinary least-squares line fit `y = intercept + slope * x`.
///
/// `r2` here is the regression sum of squares over the total sum of squares
/// (fitted-value variance / observed variance). That is NOT the usual
/// `1 - SSres/SStot` form; the existing calibration corpus was thresholded
/// against this ratio, so it is preserved as-is. For a plain line fit the two
/// coincide anyway.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub r2: f64,
    pub intercept: f64,
    pub slope: f64,
}

/// Result of a least-squares quadratic fit `y = c0 + c1*x + c2*x^2`.
///
/// `r2` uses the conventional `1 - SSres/SStot` form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadraticFit {
    pub r2: f64,
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Ordinary least-squares line fit.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;

    let xbar = xs.iter().sum::<f64>() / n;
    let ybar = ys.iter().sum::<f64>() / n;

    let mut xxbar = 0.0;
    let mut yybar = 0.0;
    let mut xybar = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        xxbar += (x - xbar) * (x - xbar);
        yybar += (y - ybar) * (y - ybar);
        xybar += (x - xbar) * (y - ybar);
    }

    let slope = xybar / xxbar;
    let intercept = ybar - slope * xbar;

    // Regression sum of squares against the observed variance.
    let mut ssr = 0.0;
    for &x in xs {
        let fit = slope * x + intercept;
        ssr += (fit - ybar) * (fit - ybar);
    }
    let r2 = ssr / yybar;

    Some(LinearFit {
        r2,
        intercept,
        slope,
    })
}

/// Least-squares quadratic fit via Cramer's rule on the 3x3 normal equations,
/// built from power-sum moments up to order 4.
pub fn quadratic_fit(xs: &[f64], ys: &[f64]) -> Option<QuadraticFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len();

    let s00 = n as f64;
    let s10: f64 = xs.iter().sum();
    let s20: f64 = xs.iter().map(|x| x * x).sum();
    let s30: f64 = xs.iter().map(|x| x * x * x).sum();
    let s40: f64 = xs.iter().map(|x| x * x * x * x).sum();
    let s01: f64 = ys.iter().sum();
    let s11: f64 = xs.iter().zip(ys.iter()).map(|(x, y)| x * y).sum();
    let s21: f64 = xs.iter().zip(ys.iter()).map(|(x, y)| x * x * y).sum();

    let det = s40 * (s20 * s00 - s10 * s10) - s30 * (s30 * s00 - s10 * s20)
        + s20 * (s30 * s10 - s20 * s20);
    let det_a = s21 * (s20 * s00 - s10 * s10) - s11 * (s30 * s00 - s10 * s20)
        + s01 * (s30 * s10 - s20 * s20);
    let det_b = s40 * (s11 * s00 - s01 * s10) - s30 * (s21 * s00 - s01 * s20)
        + s20 * (s21 * s10 - s11 * s20);
    let det_c = s40 * (s20 * s01 - s10 * s11) - s30 * (s30 * s01 - s10 * s21)
        + s20 * (s30 * s11 - s20 * s21);

    let c2 = det_a / det;
    let c1 = det_b / det;
    let c0 = det_c / det;

    let ymean = s01 / n as f64;
    let mut total_ss = 0.0;
    let mut residual_ss = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        total_ss += (y - ymean) * (y - ymean);
        let fit = c0 + c1 * x + c2 * x * x;
        residual_ss += (y - fit) * (y - fit);
    }
    let r2 = 1.0 - residual_ss / total_ss;

    Some(QuadraticFit { r2, c0, c1, c2 })
}
