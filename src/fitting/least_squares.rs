use crate::fitting::error::FittingError;
use statrs::distribution::{ContinuousCDF, StudentsT};

type Result<T> = std::result::Result<T, FittingError>;

/// Keeps the t statistic finite for a perfect correlation
const TINY: f64 = 1.0e-20;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LeastSquaresValues {
    pub num_points: usize,
    pub mean_x: f64,
    pub mean_y: f64,
    pub sum_xx: f64,
    pub sum_yy: f64,
    pub sum_xy: f64,
    pub intercept: f64,
    pub slope: f64,
    pub r_value: f64,
    pub p_value: f64,
    pub std_err: f64,
}

/// Ordinary (unweighted) two-parameter least squares of `y = slope * x + intercept`.
///
/// Sums are taken about the means so that large abscissae, such as frequencies in Hz, keep
/// their precision. The significance values follow the usual two-sided t-test on the slope.
pub struct LeastSquares;
impl LeastSquares {
    pub fn two_parameter_line_fit(
        x_vals: &[f64],
        y_vals: &[f64],
    ) -> Result<LeastSquaresValues> {
        if x_vals.len() != y_vals.len() {
            Err(FittingError::InsufficientData(format!(
                "{} abscissae but {} ordinates",
                x_vals.len(),
                y_vals.len()
            )))?
        }
        let mut lsq = LeastSquaresValues::default();
        Self::find_sums(&mut lsq, x_vals, y_vals);
        if lsq.num_points < 2 || lsq.sum_xx == 0.0 {
            Err(FittingError::InsufficientData(format!(
                "a line needs at least 2 distinct abscissae, got {} points",
                lsq.num_points
            )))?
        }

        lsq.slope = lsq.sum_xy / lsq.sum_xx;
        lsq.intercept = lsq.mean_y - lsq.slope * lsq.mean_x;

        let r_denominator = (lsq.sum_xx * lsq.sum_yy).sqrt();
        lsq.r_value = if r_denominator == 0.0 {
            0.0
        } else {
            (lsq.sum_xy / r_denominator).clamp(-1.0, 1.0)
        };

        if lsq.num_points == 2 {
            lsq.p_value = if y_vals[0] == y_vals[1] { 1.0 } else { 0.0 };
            lsq.std_err = 0.0;
        } else {
            let df = (lsq.num_points - 2) as f64;
            let r = lsq.r_value;
            let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
            let students_t = StudentsT::new(0.0, 1.0, df)
                .map_err(|e| FittingError::Statistics(e.to_string()))?;
            lsq.p_value = 2.0 * (1.0 - students_t.cdf(t.abs()));
            lsq.std_err = ((1.0 - r * r) * lsq.sum_yy / lsq.sum_xx / df).max(0.0).sqrt();
        }
        Ok(lsq)
    }

    fn find_sums(least_squares: &mut LeastSquaresValues, x_vals: &[f64], y_vals: &[f64]) {
        let n = x_vals.len();
        least_squares.num_points = n;
        if n == 0 {
            return;
        }
        let mean_x = x_vals.iter().sum::<f64>() / n as f64;
        let mean_y = y_vals.iter().sum::<f64>() / n as f64;

        let mut sum_xx: f64 = 0.0;
        let mut sum_yy: f64 = 0.0;
        let mut sum_xy: f64 = 0.0;
        for (&x, &y) in x_vals.iter().zip(y_vals.iter()) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sum_xx += dx * dx;
            sum_yy += dy * dy;
            sum_xy += dx * dy;
        }
        least_squares.mean_x = mean_x;
        least_squares.mean_y = mean_y;
        least_squares.sum_xx = sum_xx;
        least_squares.sum_yy = sum_yy;
        least_squares.sum_xy = sum_xy;
    }
}
