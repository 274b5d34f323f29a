//! Pearson and Spearman correlation between paired series.

use crate::error::{AnalyticsError, Result};

fn check_lengths(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(AnalyticsError::LengthMismatch { left: x.len(), right: y.len() });
    }
    Ok(())
}

/// Product-moment correlation coefficient.
///
/// Returns 0 when either series is constant or empty.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    check_lengths(x, y)?;
    let n = x.len() as f64;

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx, mut sum_yy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        sum_x += a;
        sum_y += b;
        sum_xy += a * b;
        sum_xx += a * a;
        sum_yy += b * b;
    }

    let numerator = n * sum_xy - sum_x * sum_y;
    let spread_x = n * sum_xx - sum_x * sum_x;
    let spread_y = n * sum_yy - sum_y * sum_y;
    if spread_x <= 0.0 || spread_y <= 0.0 {
        tracing::debug!(len = x.len(), "constant series, correlation is 0");
        return Ok(0.0);
    }

    Ok(numerator / (spread_x * spread_y).sqrt())
}

/// Rank correlation: Pearson over the ranks of each series.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<f64> {
    check_lengths(x, y)?;
    pearson(&rank(x), &rank(y))
}

/// 1-based ranks in input order.
///
/// Tied values all take the rank of the first of them in sorted order, so
/// `[10, 20, 20, 30]` ranks as `[1, 2, 2, 4]`. Averaged ranks are not used.
pub fn rank(s: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..s.len()).collect();
    order.sort_by(|&a, &b| s[a].total_cmp(&s[b]));

    let mut ranks = vec![0.0; s.len()];
    let mut first = 0;
    for (pos, &idx) in order.iter().enumerate() {
        if s[order[first]] != s[idx] {
            first = pos;
        }
        ranks[idx] = (first + 1) as f64;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pearson_self_and_inverse() {
        let x = [1.0, 4.0, 2.0, 8.0, 5.0];
        assert!(approx(pearson(&x, &x).unwrap(), 1.0));

        let neg: Vec<f64> = x.iter().map(|v| -2.0 * v).collect();
        assert!(approx(pearson(&x, &neg).unwrap(), -1.0));
    }

    #[test]
    fn test_pearson_constant_and_empty() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0, 4.0], &[3.0, 3.0, 3.0, 3.0]).unwrap(), 0.0);
        assert_eq!(pearson(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            pearson(&[1.0, 2.0], &[1.0]),
            Err(AnalyticsError::LengthMismatch { left: 2, right: 1 })
        );
        assert!(spearman(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_rank_ties_take_first_position() {
        assert_eq!(rank(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.0, 2.0, 4.0]);
        assert_eq!(rank(&[30.0, 10.0, 20.0]), vec![3.0, 1.0, 2.0]);
        assert_eq!(rank(&[5.0, 5.0, 5.0]), vec![1.0, 1.0, 1.0]);
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn test_spearman_monotonic() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 8.0, 27.0, 64.0, 125.0];
        assert!(approx(spearman(&x, &y).unwrap(), 1.0));

        let rev = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!(approx(spearman(&x, &rev).unwrap(), -1.0));
    }
}
