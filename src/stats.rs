use std::cmp::Ordering;

use serde::Serialize;

use crate::record::Record;

/// 1-decimal rounding used for every reported average: `floor(10*x + 0.5) / 10`.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
    }
}

/// Every value sharing the highest frequency, ascending. Empty input gives an empty mode.
pub fn mode(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut best = 0usize;
    let mut out: Vec<f64> = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let run = j - i;
        if run > best {
            best = run;
            out.clear();
            out.push(sorted[i]);
        } else if run == best {
            out.push(sorted[i]);
        }
        i = j.max(i + 1);
    }
    out
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values.
pub fn standard_deviation(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Weighted running mean/variance, updated in O(1) per sample (West's
/// weighted variant of Welford's algorithm).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningStats {
    pub count: usize,
    pub total_weight: f64,
    pub mean: f64,
    #[serde(skip)]
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples with a non-positive or non-finite weight are ignored.
    pub fn push(&mut self, value: f64, weight: f64) {
        if !(weight.is_finite() && weight > 0.0) || !value.is_finite() {
            return;
        }
        self.count += 1;
        self.total_weight += weight;
        let delta = value - self.mean;
        self.mean += (weight / self.total_weight) * delta;
        self.m2 += weight * delta * (value - self.mean);
    }

    /// Weighted variance with Bessel's correction on the sample count.
    /// Matches the plain sample variance when every weight is 1.
    pub fn variance(&self) -> f64 {
        if self.count <= 1 || self.total_weight <= 0.0 {
            return 0.0;
        }
        let n = self.count as f64;
        (self.m2 / self.total_weight) * n / (n - 1.0)
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAverage {
    pub student_id: String,
    pub average: f64,
    pub count: usize,
}

/// Highest averages first; ties keep their incoming order.
pub fn top_performers(mut averages: Vec<StudentAverage>, limit: usize) -> Vec<StudentAverage> {
    averages.sort_by(|a, b| b.average.partial_cmp(&a.average).unwrap_or(Ordering::Equal));
    averages.truncate(limit);
    averages
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPrediction {
    /// Predicted score as a percentage, always within 0-100.
    pub predicted_percent: f64,
    /// Change in normalized score per second.
    pub slope: f64,
    pub next_timestamp: i64,
    pub points: usize,
}

pub const MIN_TREND_POINTS: usize = 3;

/// Least-squares fit of `value / max_value` against timestamp, extrapolated
/// one average sample interval past the latest point.
///
/// Records without a positive `max_value` or with a non-finite normalized
/// score are skipped. Returns `None` when fewer than [`MIN_TREND_POINTS`]
/// usable records remain or the fit itself is not finite.
pub fn predict_trend<C>(series: &[Record<C>]) -> Option<TrendPrediction> {
    let mut points: Vec<(i64, f64)> = series
        .iter()
        .filter(|r| r.max_value > 0.0)
        .map(|r| (r.timestamp, r.value / r.max_value))
        .filter(|(_, y)| y.is_finite())
        .collect();
    if points.len() < MIN_TREND_POINTS {
        return None;
    }
    points.sort_by_key(|(t, _)| *t);

    let n = points.len() as f64;
    let first = points[0].0;
    let last = points[points.len() - 1].0;
    // Fit against offsets from the first sample to keep epoch-sized x values well conditioned.
    let offset = |t: i64| (i128::from(t) - i128::from(first)) as f64;
    let xs: Vec<f64> = points.iter().map(|(t, _)| offset(*t)).collect();
    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let x_mean = mean(&xs);
    let y_mean = mean(&ys);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        sxy += (x - x_mean) * (y - y_mean);
        sxx += (x - x_mean) * (x - x_mean);
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    let span = offset(last);
    let interval = span / (n - 1.0);
    let raw = intercept + slope * (span + interval);
    if !raw.is_finite() || !slope.is_finite() {
        return None;
    }
    let predicted = raw.clamp(0.0, 1.0);

    Some(TrendPrediction {
        predicted_percent: predicted * 100.0,
        slope,
        // float -> int casts saturate
        next_timestamp: last.saturating_add(interval.round() as i64),
        points: points.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AssessmentKind;
    use proptest::prelude::*;

    fn score(ts: i64, value: f64, max: f64) -> Record<AssessmentKind> {
        Record {
            id: format!("r{ts}"),
            timestamp: ts,
            value,
            max_value: max,
            weight: 1.0,
            category: AssessmentKind::Quiz,
        }
    }

    fn avg(student_id: &str, average: f64, count: usize) -> StudentAverage {
        StudentAverage {
            student_id: student_id.to_string(),
            average,
            count,
        }
    }

    #[test]
    fn round_off_half_up() {
        assert_eq!(round_off_1_decimal(0.0), 0.0);
        assert_eq!(round_off_1_decimal(3.54), 3.5);
        assert_eq!(round_off_1_decimal(3.55), 3.6);
        assert_eq!(round_off_1_decimal(35.6818), 35.7);
    }

    #[test]
    fn empty_inputs_have_defined_results() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert!(mode(&[]).is_empty());
        assert_eq!(standard_deviation(&[]), 0.0);
        assert_eq!(standard_deviation(&[42.0]), 0.0);
    }

    #[test]
    fn basic_statistics() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), 5.0);
        assert_eq!(median(&v), 4.5);
        assert_eq!(mode(&v), vec![4.0]);
        assert!((standard_deviation(&v) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn mode_returns_all_ties_ascending() {
        assert_eq!(mode(&[3.0, 1.0, 3.0, 1.0, 2.0]), vec![1.0, 3.0]);
        assert_eq!(mode(&[5.0, 6.0]), vec![5.0, 6.0]);
    }

    #[test]
    fn top_performers_is_stable_on_ties() {
        let avgs = vec![
            avg("S1", 80.0, 2),
            avg("S2", 90.0, 1),
            avg("S3", 80.0, 3),
            avg("S4", 70.0, 1),
        ];
        let top: Vec<String> = top_performers(avgs, 3)
            .into_iter()
            .map(|a| a.student_id)
            .collect();
        assert_eq!(top, vec!["S2", "S1", "S3"]);
    }

    #[test]
    fn trend_needs_three_points() {
        assert!(predict_trend(&[score(0, 1e9, 1.0), score(10, -1e9, 1.0)]).is_none());
        // zero max values do not count as points
        let series = [
            score(0, 5.0, 10.0),
            score(1, 5.0, 10.0),
            score(2, 5.0, 0.0),
        ];
        assert!(predict_trend(&series).is_none());
    }

    #[test]
    fn trend_extrapolates_one_interval() {
        let series = [
            score(0, 5.0, 10.0),
            score(100, 6.0, 10.0),
            score(200, 7.0, 10.0),
        ];
        let p = predict_trend(&series).expect("prediction");
        assert_eq!(p.next_timestamp, 300);
        assert!((p.predicted_percent - 80.0).abs() < 1e-9);
        assert_eq!(p.points, 3);
    }

    #[test]
    fn trend_is_clamped() {
        let rising = [
            score(0, 8.0, 10.0),
            score(10, 9.0, 10.0),
            score(20, 10.0, 10.0),
        ];
        assert_eq!(predict_trend(&rising).map(|p| p.predicted_percent), Some(100.0));
        let falling = [
            score(0, 2.0, 10.0),
            score(10, 1.0, 10.0),
            score(20, 0.0, 10.0),
        ];
        assert_eq!(predict_trend(&falling).map(|p| p.predicted_percent), Some(0.0));
    }

    #[test]
    fn trend_with_identical_timestamps_is_flat() {
        let series = [
            score(50, 4.0, 10.0),
            score(50, 6.0, 10.0),
            score(50, 8.0, 10.0),
        ];
        let p = predict_trend(&series).expect("prediction");
        assert!((p.predicted_percent - 60.0).abs() < 1e-9);
        assert_eq!(p.next_timestamp, 50);
    }

    #[test]
    fn trend_survives_extreme_timestamps() {
        let top = [
            score(i64::MAX - 2, 5.0, 10.0),
            score(i64::MAX - 1, 6.0, 10.0),
            score(i64::MAX, 7.0, 10.0),
        ];
        let p = predict_trend(&top).expect("prediction");
        assert_eq!(p.next_timestamp, i64::MAX);
        assert!((0.0..=100.0).contains(&p.predicted_percent));

        let wide = [
            score(i64::MIN, 5.0, 10.0),
            score(0, 6.0, 10.0),
            score(i64::MAX, 7.0, 10.0),
        ];
        let p = predict_trend(&wide).expect("prediction");
        assert_eq!(p.next_timestamp, i64::MAX);
        assert!((0.0..=100.0).contains(&p.predicted_percent));
    }

    #[test]
    fn trend_skips_non_finite_scores() {
        let series = [
            score(0, 1e308, 1e-10),
            score(1, 5.0, 10.0),
            score(2, 7.0, 10.0),
        ];
        assert!(predict_trend(&series).is_none());

        let mut longer = series.to_vec();
        longer.push(score(3, 9.0, 10.0));
        let p = predict_trend(&longer).expect("prediction");
        assert!(p.predicted_percent.is_finite());
        assert!(p.slope.is_finite());
        assert_eq!(p.points, 3);
    }

    #[test]
    fn running_stats_ignores_non_positive_weights() {
        let mut s = RunningStats::new();
        s.push(100.0, 0.0);
        s.push(100.0, -1.0);
        assert_eq!(s.count, 0);
        s.push(60.0, 1.0);
        s.push(90.0, 2.0);
        assert!((s.mean - 80.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn running_stats_match_batch_for_unit_weights(
            values in proptest::collection::vec(0.0f64..100.0, 0..30)
        ) {
            let mut s = RunningStats::new();
            for v in &values {
                s.push(*v, 1.0);
            }
            prop_assert!((s.mean - mean(&values)).abs() < 1e-6);
            prop_assert!((s.standard_deviation() - standard_deviation(&values)).abs() < 1e-6);
        }

        #[test]
        fn short_series_never_predicts(values in proptest::collection::vec(-1e12f64..1e12, 0..3)) {
            let series: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(i, v)| score(i as i64, *v, 1.0))
                .collect();
            prop_assert!(predict_trend(&series).is_none());
        }
    }
}
