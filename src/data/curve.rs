use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

use crate::data::axis::{is_strictly_increasing, TimeAxis};
use crate::error::CurveError;

/// Effect magnitudes sampled on a time axis
///
/// A [Curve] is created fresh by every composer and owned by the caller.
/// `times` and `values` always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCurve")]
pub struct Curve {
    times: Array1<f64>,
    values: Array1<f64>,
}

#[derive(Deserialize)]
struct RawCurve {
    times: Array1<f64>,
    values: Array1<f64>,
}

impl TryFrom<RawCurve> for Curve {
    type Error = CurveError;

    fn try_from(raw: RawCurve) -> Result<Self, Self::Error> {
        let RawCurve { times, values } = raw;
        if times.len() != values.len() {
            return Err(CurveError::AxisMismatch {
                description: format!("{} values for {} time points", values.len(), times.len()),
            });
        }
        if !is_strictly_increasing(&times) {
            return Err(CurveError::InvalidCurve {
                description: "time points must be finite and strictly increasing".to_string(),
            });
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(CurveError::InvalidCurve {
                description: format!("curve value {bad} is not a finite non-negative number"),
            });
        }
        Ok(Curve { times, values })
    }
}

impl Curve {
    /// Pair `values` with the sample points of `axis`
    ///
    /// # Errors
    ///
    /// [CurveError::AxisMismatch] when the lengths differ.
    pub fn new(axis: &TimeAxis, values: Array1<f64>) -> Result<Self, CurveError> {
        if values.len() != axis.len() {
            return Err(CurveError::AxisMismatch {
                description: format!("{} values for {} time points", values.len(), axis.len()),
            });
        }
        Ok(Curve {
            times: axis.times().clone(),
            values,
        })
    }

    /// A flat zero curve on `axis`
    pub fn zeros(axis: &TimeAxis) -> Self {
        Curve {
            times: axis.times().clone(),
            values: Array1::zeros(axis.len()),
        }
    }

    pub(crate) fn from_parts(times: Array1<f64>, values: Array1<f64>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Curve { times, values }
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sample spacing in hours, `None` for fewer than two samples
    pub fn step(&self) -> Option<f64> {
        if self.times.len() < 2 {
            None
        } else {
            Some(self.times[1] - self.times[0])
        }
    }

    /// Largest value, `0.0` for an empty curve
    pub fn peak(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Time of the first maximum
    pub fn peak_time(&self) -> Option<f64> {
        let peak = self.peak();
        self.values
            .iter()
            .position(|&v| v == peak)
            .map(|i| self.times[i])
    }

    /// Linearly interpolated value at `time`
    ///
    /// Times outside the axis are clamped to the first or last sample.
    pub fn value_at(&self, time: f64) -> f64 {
        match (self.times.as_slice(), self.values.as_slice()) {
            (Some(times), Some(values)) => interpolate_linear(times, values, time),
            _ => interpolate_linear(&self.times.to_vec(), &self.values.to_vec(), time),
        }
    }

    /// Whether `other` is sampled on exactly the same time points
    pub fn same_axis(&self, other: &Curve) -> bool {
        self.times.len() == other.times.len()
            && Zip::from(&self.times)
                .and(&other.times)
                .all(|a, b| a.to_bits() == b.to_bits())
    }

    /// Element-wise sum with another curve on the same axis
    pub fn try_add(&self, other: &Curve) -> Result<Curve, CurveError> {
        if !self.same_axis(other) {
            return Err(CurveError::AxisMismatch {
                description: format!(
                    "curves with {} and {} samples do not share a time axis",
                    self.len(),
                    other.len()
                ),
            });
        }
        Ok(Curve {
            times: self.times.clone(),
            values: &self.values + &other.values,
        })
    }

    /// Copy of this curve with every value multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Curve {
        Curve {
            times: self.times.clone(),
            values: self.values.mapv(|v| v * factor),
        }
    }

    /// Iterate over `(time, value)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

/// Linear interpolation between sample points, clamped at both ends
///
/// `times` must be sorted ascending and match `values` in length.
pub fn interpolate_linear(times: &[f64], values: &[f64], time: f64) -> f64 {
    debug_assert_eq!(times.len(), values.len());

    if times.is_empty() {
        return 0.0;
    }
    if time <= times[0] {
        return values[0];
    }
    let last = times.len() - 1;
    if time >= times[last] {
        return values[last];
    }

    let upper = times.partition_point(|&t| t < time);
    let lower = upper.saturating_sub(1);
    let (t1, t2) = (times[lower], times[upper]);
    let (v1, v2) = (values[lower], values[upper]);

    if (t2 - t1).abs() < 1e-10 {
        v1
    } else {
        v1 + (v2 - v1) * (time - t1) / (t2 - t1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn ramp() -> Curve {
        let axis = TimeAxis::linspace(0.0, 4.0, 5).unwrap();
        Curve::new(&axis, array![0.0, 10.0, 6.0, 4.0, 2.0]).unwrap()
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let axis = TimeAxis::linspace(0.0, 4.0, 5).unwrap();
        assert!(Curve::new(&axis, array![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_interpolation() {
        let curve = ramp();
        assert_relative_eq!(curve.value_at(0.5), 5.0, epsilon = 1e-12);
        assert_relative_eq!(curve.value_at(1.5), 8.0, epsilon = 1e-12);
        assert_relative_eq!(curve.value_at(2.0), 6.0, epsilon = 1e-12);
        assert_relative_eq!(curve.value_at(-3.0), 0.0);
        assert_relative_eq!(curve.value_at(99.0), 2.0);
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let json = serde_json::to_string(&ramp()).unwrap();
        assert_eq!(serde_json::from_str::<Curve>(&json).unwrap(), ramp());

        let short = r#"{
            "times": {"v": 1, "dim": [4], "data": [0.0, 1.0, 2.0, 3.0]},
            "values": {"v": 1, "dim": [1], "data": [1.0]}
        }"#;
        assert!(serde_json::from_str::<Curve>(short).is_err());

        let unordered = r#"{
            "times": {"v": 1, "dim": [2], "data": [1.0, 0.0]},
            "values": {"v": 1, "dim": [2], "data": [1.0, 2.0]}
        }"#;
        assert!(serde_json::from_str::<Curve>(unordered).is_err());

        let negative = r#"{
            "times": {"v": 1, "dim": [2], "data": [0.0, 1.0]},
            "values": {"v": 1, "dim": [2], "data": [1.0, -2.0]}
        }"#;
        assert!(serde_json::from_str::<Curve>(negative).is_err());
    }

    #[test]
    fn test_peak() {
        let curve = ramp();
        assert_eq!(curve.peak(), 10.0);
        assert_eq!(curve.peak_time(), Some(1.0));
    }

    #[test]
    fn test_add_requires_same_axis() {
        let a = ramp();
        let other_axis = TimeAxis::linspace(0.0, 8.0, 5).unwrap();
        let b = Curve::zeros(&other_axis);
        assert!(a.try_add(&b).is_err());

        let zero = Curve::zeros(&TimeAxis::linspace(0.0, 4.0, 5).unwrap());
        assert_eq!(a.try_add(&zero).unwrap(), a);
    }
}
