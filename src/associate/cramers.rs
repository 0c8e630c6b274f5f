use super::contingency::ContingencyTable;

/// Floor for the denominator of the corrected coefficient.
pub const EPSILON: f64 = 1e-12;

/// Bias-corrected Cramér's V (Bergsma 2013) of a contingency table, in `[0, 1]`.
///
/// With fewer than two complete observations there is nothing to measure and
/// the result is 0.
pub fn cramers_v(table: &ContingencyTable) -> f64 {
    let n = table.total() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let (r, k) = table.shape();
    let (r, k) = (r as f64, k as f64);

    let phi2 = table.chi_square() / n;
    let phi2_corr = (phi2 - (k - 1.0) * (r - 1.0) / (n - 1.0)).max(0.0);
    let r_corr = r - (r - 1.0).powi(2) / (n - 1.0);
    let k_corr = k - (k - 1.0).powi(2) / (n - 1.0);
    let denom = (k_corr - 1.0).min(r_corr - 1.0).max(EPSILON);

    let v = (phi2_corr / denom).sqrt();
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn bijection_is_one() {
        let t = ContingencyTable::from_counts(vec![
            vec![7, 0, 0],
            vec![0, 3, 0],
            vec![0, 0, 11],
        ]);
        assert!(close(cramers_v(&t), 1.0));
    }

    #[test]
    fn independence_is_zero() {
        let t = ContingencyTable::from_counts(vec![vec![10, 20], vec![30, 60]]);
        assert_eq!(cramers_v(&t), 0.0);
    }

    #[test]
    fn single_category_is_zero() {
        let t = ContingencyTable::from_counts(vec![vec![4, 6]]);
        assert_eq!(cramers_v(&t), 0.0);
    }

    #[test]
    fn tiny_samples_are_zero() {
        assert_eq!(cramers_v(&ContingencyTable::from_counts(vec![vec![1]])), 0.0);
        assert_eq!(cramers_v(&ContingencyTable::from_counts(vec![])), 0.0);
    }

    #[test]
    fn correction_shrinks_the_raw_coefficient() {
        // raw V = sqrt(chi2 / (n * 1)) = sqrt((20/3) / 60) = 1/3
        let t = ContingencyTable::from_counts(vec![vec![20, 10], vec![10, 20]]);
        let v = cramers_v(&t);
        assert!(v > 0.0);
        assert!(v < 1.0 / 3.0);
        // phi2 = 1/9, phi2_corr = 1/9 - 1/59, denom = 2 - 1/59 - 1
        let phi2_corr: f64 = 1.0 / 9.0 - 1.0 / 59.0;
        let expected = (phi2_corr / (1.0 - 1.0 / 59.0)).sqrt();
        assert!(close(v, expected));
    }
}
