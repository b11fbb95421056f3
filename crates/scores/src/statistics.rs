//! Per-table statistics over row totals.

use serde::{Deserialize, Serialize};

/// Column names, in the order they follow `total`.
pub const STATISTIC_COLUMNS: [&str; 6] = ["rank", "mean", "2std_abv", "2std_blw", "q1", "q3"];

/// Rank of each row plus table-wide summary values of `total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatistics {
    /// 1 = largest total; ties keep row order. Aligned with the rows.
    pub rank: Vec<usize>,
    pub mean: f64,
    /// `mean + 2 * sample std`; `None` with fewer than two rows.
    pub two_std_above: Option<f64>,
    /// `mean - 2 * sample std`; `None` with fewer than two rows.
    pub two_std_below: Option<f64>,
    pub q1: f64,
    pub q3: f64,
}

impl TableStatistics {
    /// `None` for an empty table.
    pub fn compute(totals: &[f64]) -> Option<Self> {
        if totals.is_empty() {
            return None;
        }
        let n = totals.len();
        let mean = totals.iter().sum::<f64>() / n as f64;

        let std = (n > 1).then(|| {
            let var = totals.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        });

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| totals[b].total_cmp(&totals[a]));
        let mut rank = vec![0; n];
        for (position, &row) in order.iter().enumerate() {
            rank[row] = position + 1;
        }

        let mut sorted = totals.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            rank,
            mean,
            two_std_above: std.map(|s| mean + 2.0 * s),
            two_std_below: std.map(|s| mean - 2.0 * s),
            q1: quantile(&sorted, 0.25),
            q3: quantile(&sorted, 0.75),
        })
    }

    /// Table-wide value of a statistic column; `rank` is per row and yields `None`.
    pub fn summary(&self, column: &str) -> Option<f64> {
        match column {
            "mean" => Some(self.mean),
            "2std_abv" => self.two_std_above,
            "2std_blw" => self.two_std_below,
            "q1" => Some(self.q1),
            "q3" => Some(self.q3),
            _ => None,
        }
    }
}

/// Linear-interpolated quantile of ascending `sorted` values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_mean_and_quartiles() {
        let s = TableStatistics::compute(&[1.0, 4.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.rank, [4, 1, 3, 2]);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.q1, 1.75);
        assert_eq!(s.q3, 3.25);

        let std = (5.0f64 / 3.0).sqrt();
        assert!((s.two_std_above.unwrap() - (2.5 + 2.0 * std)).abs() < 1e-12);
        assert!((s.two_std_below.unwrap() - (2.5 - 2.0 * std)).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_row_order() {
        let s = TableStatistics::compute(&[5.0, 7.0, 5.0]).unwrap();
        assert_eq!(s.rank, [2, 1, 3]);
    }

    #[test]
    fn single_row_has_no_std() {
        let s = TableStatistics::compute(&[3.0]).unwrap();
        assert_eq!(s.rank, [1]);
        assert_eq!(s.q1, 3.0);
        assert_eq!(s.summary("2std_abv"), None);
        assert_eq!(s.summary("mean"), Some(3.0));
        assert_eq!(s.summary("rank"), None);
    }

    #[test]
    fn empty_has_none() {
        assert!(TableStatistics::compute(&[]).is_none());
    }
}
