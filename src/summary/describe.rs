use serde::Serialize;
use tracing::instrument;

use super::numeric_column;
use crate::error::Result;
use crate::process::ProcessedDataset;

/// `count / mean / std / min / quartiles / max` of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    pub fn from_values(column: &str, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let mut v: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|x| !x.is_nan())
            .collect();
        v.sort_by(f64::total_cmp);

        let count = v.len();
        let mean = (count > 0).then(|| v.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = v.iter().map(|x| (x - m) * (x - m)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            column: column.to_string(),
            count,
            mean,
            std,
            min: v.first().copied(),
            q25: quantile(&v, 0.25),
            median: quantile(&v, 0.5),
            q75: quantile(&v, 0.75),
            max: v.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Summaries of the selected numeric columns; an empty selection means every
/// numeric column of the dataset.
#[instrument(level = "debug", skip_all, fields(columns = columns.len()))]
pub fn describe<S: AsRef<str>>(dataset: &ProcessedDataset, columns: &[S]) -> Result<Vec<NumericSummary>> {
    let names: Vec<String> = if columns.is_empty() {
        super::numeric_columns(dataset)
    } else {
        columns.iter().map(|c| c.as_ref().to_string()).collect()
    };
    names
        .iter()
        .map(|name| {
            let values = numeric_column(dataset, name)?;
            Ok(NumericSummary::from_values(name, values))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AihError;
    use crate::test_util::{admissions, reference};

    #[test]
    fn summary_of_small_sample() {
        let s = NumericSummary::from_values(
            "x",
            [Some(1.0), Some(2.0), None, Some(3.0), Some(4.0), Some(f64::NAN)],
        );
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.median, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        assert_eq!(s.max, Some(4.0));
        let std = s.std.unwrap();
        assert!((std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_and_single_samples() {
        let empty = NumericSummary::from_values("x", Vec::<Option<f64>>::new());
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.median, None);

        let one = NumericSummary::from_values("x", [Some(7.0)]);
        assert_eq!(one.std, None);
        assert_eq!(one.median, Some(7.0));
    }

    #[test]
    fn describes_selected_and_all_columns() -> anyhow::Result<()> {
        let ds = crate::process::process(&admissions(), &reference())?;
        let picked = describe(&ds, &["vl_total"])?;
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].max, Some(40.0));
        assert_eq!(picked[0].mean, Some(25.0));

        let all = describe::<&str>(&ds, &[])?;
        let names: Vec<&str> = all.iter().map(|s| s.column.as_str()).collect();
        assert!(names.contains(&"value_scaled"));
        assert!(names.contains(&"latitude"));
        assert!(!names.contains(&"uf"));
        Ok(())
    }

    #[test]
    fn rejects_text_and_unknown_columns() -> anyhow::Result<()> {
        let ds = crate::process::process(&admissions(), &reference())?;
        assert!(matches!(describe(&ds, &["uf"]).unwrap_err(), AihError::NotNumeric(_)));
        assert!(matches!(describe(&ds, &["nope"]).unwrap_err(), AihError::UnknownColumn(_)));
        Ok(())
    }
}
