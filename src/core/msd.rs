//! Mean squared displacement over all lags.
//!
//! For a lag `w`, every pair of frames `(t - w, t)` of every row contributes
//! one squared displacement when both endpoints are measured. All
//! contributions of a lag are pooled into one sample, whose mean is the MSD
//! and whose standard deviation over `sqrt(n)` is the standard error.
//!
//! Missing cells break pairs individually, so prefix-sum shortcuts do not
//! apply; the cost is `O(N^2 * R)` for `N` frames and `R` rows. Lags are
//! independent and are computed in parallel.

use crate::error::Result;
use crate::table::FrameTable;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// MSD statistics at one lag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MsdPoint {
    /// Lag in frames
    pub lag: usize,
    /// Mean squared displacement; `None` when no pair was measured
    pub mean: Option<f64>,
    /// Standard error of the mean; `None` when no pair was measured
    pub std_error: Option<f64>,
    /// Number of pooled squared displacements
    pub samples: usize,
}

/// MSD curve for lags `1..=N/2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MsdCurve {
    pub points: Vec<MsdPoint>,
}

impl MsdCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point for lag `lag` (1-based), if computed.
    pub fn get(&self, lag: usize) -> Option<&MsdPoint> {
        lag.checked_sub(1).and_then(|i| self.points.get(i))
    }

    /// Lags without any measured pair.
    pub fn empty_lags(&self) -> Vec<usize> {
        self.points
            .iter()
            .filter(|p| p.mean.is_none())
            .map(|p| p.lag)
            .collect()
    }
}

/// Compute the MSD curve of a trajectory given as x and y tables.
pub fn mean_squared_displacement(x: &FrameTable, y: &FrameTable) -> Result<MsdCurve> {
    x.ensure_same_shape(y)?;

    let frames = x.frame_count();
    let max_lag = frames / 2;

    let points: Vec<MsdPoint> = (1..=max_lag)
        .into_par_iter()
        .map(|lag| msd_at_lag(x, y, lag))
        .collect();

    let curve = MsdCurve { points };
    let empty = curve.empty_lags();
    if !empty.is_empty() {
        tracing::warn!(
            table = x.name(),
            lags = empty.len(),
            "MSD lags without any measured frame pair"
        );
    }

    Ok(curve)
}

fn msd_at_lag(x: &FrameTable, y: &FrameTable, lag: usize) -> MsdPoint {
    let frames = x.frame_count();
    let mut samples = Vec::with_capacity(x.row_count() * (frames - lag));

    for t in lag..frames {
        for (rx, ry) in x.rows().iter().zip(y.rows()) {
            if let (Some(x0), Some(x1), Some(y0), Some(y1)) = (
                rx.values[t - lag],
                rx.values[t],
                ry.values[t - lag],
                ry.values[t],
            ) {
                let dx = x1 - x0;
                let dy = y1 - y0;
                samples.push(dx * dx + dy * dy);
            }
        }
    }

    if samples.is_empty() {
        return MsdPoint {
            lag,
            mean: None,
            std_error: None,
            samples: 0,
        };
    }

    let n = samples.len();
    let mean = samples.iter().mean();
    let std_error = samples.iter().population_std_dev() / (n as f64).sqrt();

    MsdPoint {
        lag,
        mean: Some(mean),
        std_error: Some(std_error),
        samples: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;
    use crate::table::Cell;

    fn table(name: &str, values: Vec<Vec<Cell>>) -> FrameTable {
        FrameTable::from_values(name, values).unwrap()
    }

    #[test]
    fn test_constant_velocity_is_quadratic() {
        let v = 3.0;
        let frames = 20;
        let x = table(
            "x",
            vec![(0..frames).map(|t| Some(v * t as f64)).collect(); 2],
        );
        let y = table("y", vec![vec![Some(5.0); frames]; 2]);

        let curve = mean_squared_displacement(&x, &y).unwrap();
        assert_eq!(curve.len(), frames / 2);
        for point in &curve.points {
            let expected = (v * point.lag as f64).powi(2);
            assert_eq!(point.mean, Some(expected));
            assert_eq!(point.std_error, Some(0.0));
            assert_eq!(point.samples, 2 * (frames - point.lag));
        }
    }

    #[test]
    fn test_pooled_statistics() {
        // lag 1 squared displacements: 1, 4 -> mean 2.5, population sd 1.5
        let x = table("x", vec![vec![Some(0.0), Some(1.0), Some(3.0), None]]);
        let y = table("y", vec![vec![Some(0.0); 4]]);

        let curve = mean_squared_displacement(&x, &y).unwrap();
        let lag1 = curve.get(1).unwrap();
        assert_eq!(lag1.samples, 2);
        assert!((lag1.mean.unwrap() - 2.5).abs() < 1e-12);
        assert!((lag1.std_error.unwrap() - 1.5 / 2f64.sqrt()).abs() < 1e-12);

        let lag2 = curve.get(2).unwrap();
        assert_eq!(lag2.samples, 1);
        assert_eq!(lag2.mean, Some(9.0));
    }

    #[test]
    fn test_lag_without_pairs_is_undefined() {
        let x = table("x", vec![vec![Some(0.0), None, Some(2.0), None]]);
        let y = table("y", vec![vec![Some(0.0), None, Some(0.0), None]]);

        let curve = mean_squared_displacement(&x, &y).unwrap();
        let lag1 = curve.get(1).unwrap();
        assert_eq!(lag1.mean, None);
        assert_eq!(lag1.std_error, None);
        assert_eq!(curve.get(2).unwrap().mean, Some(4.0));
        assert_eq!(curve.empty_lags(), vec![1]);
    }

    #[test]
    fn test_short_trajectory_has_no_lags() {
        let x = table("x", vec![vec![Some(1.0)]]);
        let curve = mean_squared_displacement(&x, &x).unwrap();
        assert!(curve.is_empty());
        assert!(curve.get(0).is_none());
    }

    #[test]
    fn test_shape_mismatch() {
        let x = table("x", vec![vec![Some(1.0); 4]]);
        let y = table("y", vec![vec![Some(1.0); 4]; 2]);
        assert!(matches!(
            mean_squared_displacement(&x, &y),
            Err(MetricsError::ShapeMismatch { .. })
        ));
    }
}
