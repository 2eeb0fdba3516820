use super::model::{FactPack, Observation, ObservationSeries, RangeSummary, Trend, YearRange};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Fact pack over an inclusive year range
// ---------------------------------------------------------------------------

/// Compute the fact pack of `series` over `range` (both bounds inclusive).
///
/// * `start > end` → [`Error::InvalidRange`]
/// * nothing in range → [`Error::EmptyRange`]
/// * fewer than two distinct years → [`Error::DegenerateFit`], which still
///   carries the [`RangeSummary`] so callers can show partial facts.
pub fn compute_fact_pack(series: &ObservationSeries, range: YearRange) -> Result<FactPack> {
    if !range.is_valid() {
        return Err(Error::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }

    let rows = series.in_range(range);
    let summary = summarize(rows, range).ok_or(Error::EmptyRange {
        start: range.start,
        end: range.end,
    })?;
    let trend = fit_line(rows).ok_or(Error::DegenerateFit { summary })?;

    Ok(FactPack { summary, trend })
}

/// Scalar statistics over rows already sorted by year. `None` when empty.
fn summarize(rows: &[Observation], range: YearRange) -> Option<RangeSummary> {
    let first = rows.first()?;
    let last = rows.last()?;
    let peak = rows.iter().map(|o| o.value).fold(f64::NEG_INFINITY, f64::max);
    let trough = rows.iter().map(|o| o.value).fold(f64::INFINITY, f64::min);

    Some(RangeSummary {
        range,
        count: rows.len(),
        start_value: first.value,
        end_value: last.value,
        net_change: last.value - first.value,
        peak,
        trough,
    })
}

/// Ordinary least-squares fit of value on year.
///
/// Years are centred on their mean before accumulating so the sums stay
/// small for four-digit years. `None` when all years are equal.
pub fn fit_line(rows: &[Observation]) -> Option<Trend> {
    if rows.len() < 2 {
        return None;
    }
    let n = rows.len() as f64;
    let mean_x = rows.iter().map(|o| o.year as f64).sum::<f64>() / n;
    let mean_y = rows.iter().map(|o| o.value).sum::<f64>() / n;

    let (sxx, sxy) = rows.iter().fold((0.0, 0.0), |(sxx, sxy), o| {
        let dx = o.year as f64 - mean_x;
        (sxx + dx * dx, sxy + dx * (o.value - mean_y))
    });

    // Integer years: sxx is either 0 or at least 1/2.
    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(Trend {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i32, f64)]) -> ObservationSeries {
        ObservationSeries::new(
            points
                .iter()
                .map(|&(year, value)| Observation { year, value })
                .collect(),
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn three_point_reference_fit() {
        let s = series(&[(2000, 0.40), (2010, 0.70), (2020, 1.00)]);
        let fp = compute_fact_pack(&s, YearRange::new(2000, 2020)).unwrap();
        assert_eq!(fp.count(), 3);
        assert!(approx(fp.net_change(), 0.60));
        assert!(approx(fp.peak(), 1.00));
        assert!(approx(fp.trough(), 0.40));
        assert!(approx(fp.slope(), 0.03));
        assert!(approx(fp.intercept(), -59.6));
        assert!(approx(fp.trend_at(2010.0), 0.70));
    }

    #[test]
    fn matches_normal_equations() {
        let pts = [(1990, 0.31), (1991, 0.28), (1993, 0.19), (1996, 0.33), (1998, 0.61)];
        let fp = compute_fact_pack(&series(&pts), YearRange::new(1990, 1998)).unwrap();

        let n = pts.len() as f64;
        let sx: f64 = pts.iter().map(|p| p.0 as f64).sum();
        let sy: f64 = pts.iter().map(|p| p.1).sum();
        let sxx: f64 = pts.iter().map(|p| (p.0 as f64).powi(2)).sum();
        let sxy: f64 = pts.iter().map(|p| p.0 as f64 * p.1).sum();
        let slope = (n * sxy - sx * sy) / (n * sxx - sx * sx);
        let intercept = (sy - slope * sx) / n;

        assert!((fp.slope() - slope).abs() < 1e-6);
        assert!((fp.intercept() - intercept).abs() < 1e-3);
    }

    #[test]
    fn sub_range_only_uses_rows_inside() {
        let s = series(&[(1999, 9.0), (2000, 1.0), (2001, 2.0), (2002, 0.5), (2003, -9.0)]);
        let fp = compute_fact_pack(&s, YearRange::new(2000, 2002)).unwrap();
        assert_eq!(fp.count(), 3);
        assert_eq!(fp.start_value(), 1.0);
        assert_eq!(fp.end_value(), 0.5);
        assert_eq!(fp.peak(), 2.0);
        assert_eq!(fp.trough(), 0.5);
        assert_eq!(fp.range(), YearRange::new(2000, 2002));
    }

    #[test]
    fn single_observation_is_degenerate_with_summary() {
        let s = series(&[(2000, 0.4), (2010, 0.7)]);
        match compute_fact_pack(&s, YearRange::new(2005, 2015)) {
            Err(Error::DegenerateFit { summary }) => {
                assert_eq!(summary.count, 1);
                assert_eq!(summary.start_value, 0.7);
                assert_eq!(summary.end_value, 0.7);
                assert_eq!(summary.peak, 0.7);
                assert_eq!(summary.trough, 0.7);
                assert_eq!(summary.net_change, 0.0);
            }
            other => panic!("expected DegenerateFit, got {other:?}"),
        }
    }

    #[test]
    fn repeated_single_year_is_degenerate() {
        let s = series(&[(2000, 1.0), (2000, 3.0)]);
        match compute_fact_pack(&s, YearRange::new(2000, 2000)) {
            Err(Error::DegenerateFit { summary }) => {
                assert_eq!(summary.count, 2);
                // Tied years keep source order: last row wins the end value.
                assert_eq!(summary.start_value, 1.0);
                assert_eq!(summary.end_value, 3.0);
                assert_eq!(summary.net_change, 2.0);
            }
            other => panic!("expected DegenerateFit, got {other:?}"),
        }
    }

    #[test]
    fn empty_range() {
        let s = series(&[(2000, 1.0), (2001, 2.0)]);
        assert_eq!(
            compute_fact_pack(&s, YearRange::new(1900, 1950)).unwrap_err(),
            Error::EmptyRange {
                start: 1900,
                end: 1950
            }
        );
        assert_eq!(
            compute_fact_pack(&ObservationSeries::default(), YearRange::new(0, 1)).unwrap_err(),
            Error::EmptyRange { start: 0, end: 1 }
        );
    }

    #[test]
    fn inverted_range_is_rejected_regardless_of_content() {
        for s in [ObservationSeries::default(), series(&[(2000, 1.0), (2001, 2.0)])] {
            assert_eq!(
                compute_fact_pack(&s, YearRange::new(2001, 2000)).unwrap_err(),
                Error::InvalidRange {
                    start: 2001,
                    end: 2000
                }
            );
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let s = series(&[(1880, -0.17), (1950, -0.05), (2023, 1.17)]);
        let r = YearRange::new(1880, 2023);
        let a = compute_fact_pack(&s, r).unwrap();
        let b = compute_fact_pack(&s, r).unwrap();
        assert_eq!(a.slope().to_bits(), b.slope().to_bits());
        assert_eq!(a.intercept().to_bits(), b.intercept().to_bits());
        assert_eq!(a, b);
    }
}
