//! Wilson score lower bound
//!
//! Conservative estimate of the true success rate from a small binomial
//! sample: 1/1 scores well below 50/50.

/// z for a ~95% confidence interval
pub const DEFAULT_Z: f64 = 1.96;

/// Lower bound of the Wilson score interval, in [0, 1]
///
/// Returns 0.0 when there are no attempts.
pub fn wilson_lower_bound(successes: u64, attempts: u64, z: f64) -> f64 {
    if attempts == 0 {
        return 0.0;
    }

    let n = attempts as f64;
    let p = successes.min(attempts) as f64 / n;
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let centre = p + z2 / (2.0 * n);
    let margin = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt();

    ((centre - margin) / denominator).clamp(0.0, 1.0)
}
