use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::data::dose::Schedule;
use crate::error::CurveError;

/// Evenly spaced, strictly increasing time points in hours
///
/// Every [Curve](crate::data::Curve) built on the same [TimeAxis] can be summed
/// element-wise. Two axes are considered equal when they have the same length
/// and identical sample points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAxis")]
pub struct TimeAxis {
    times: Array1<f64>,
}

#[derive(Deserialize)]
struct RawAxis {
    times: Array1<f64>,
}

impl TryFrom<RawAxis> for TimeAxis {
    type Error = CurveError;

    fn try_from(raw: RawAxis) -> Result<Self, Self::Error> {
        let times = raw.times;
        let n = times.len();
        let start = times.iter().next().copied().unwrap_or(f64::NAN);
        let end = times.iter().last().copied().unwrap_or(f64::NAN);
        if n < 2 || n > TimeAxis::MAX_SAMPLES || !is_strictly_increasing(&times) {
            return Err(CurveError::InvalidAxis {
                start,
                end,
                samples: n,
            });
        }
        Ok(TimeAxis { times })
    }
}

/// Finite and strictly increasing
pub(crate) fn is_strictly_increasing(times: &Array1<f64>) -> bool {
    times.iter().all(|t| t.is_finite())
        && times
            .iter()
            .zip(times.iter().skip(1))
            .all(|(a, b)| b > a)
}

impl TimeAxis {
    /// Upper bound on the number of samples of one axis
    pub const MAX_SAMPLES: usize = 1_000_000;

    /// Create an axis of `samples` points from `start` to `end`, both inclusive
    ///
    /// # Errors
    ///
    /// [CurveError::InvalidAxis] if `end <= start`, either bound is not finite,
    /// or fewer than two or more than [TimeAxis::MAX_SAMPLES] samples are
    /// requested.
    pub fn linspace(start: f64, end: f64, samples: usize) -> Result<Self, CurveError> {
        if !start.is_finite()
            || !end.is_finite()
            || end <= start
            || !(2..=Self::MAX_SAMPLES).contains(&samples)
        {
            return Err(CurveError::InvalidAxis {
                start,
                end,
                samples,
            });
        }
        let mut times = Array1::linspace(start, end, samples);
        // pin the endpoint against accumulated step error
        times[samples - 1] = end;
        Ok(TimeAxis { times })
    }

    /// Create an axis with roughly `minutes` per sample
    ///
    /// The number of intervals is `(end - start) * 60 / minutes` truncated to a
    /// whole number, so when the window is not a multiple of `minutes` the
    /// actual step is slightly longer than requested. Both ends stay included.
    pub fn with_resolution(start: f64, end: f64, minutes: f64) -> Result<Self, CurveError> {
        // tolerate rounding noise such as 1439.9999999 intervals
        let intervals = ((end - start) * 60.0 / minutes + 1e-9).floor();
        if !(minutes > 0.0)
            || !intervals.is_finite()
            || intervals < 1.0
            || intervals >= Self::MAX_SAMPLES as f64
        {
            return Err(CurveError::InvalidAxis {
                start,
                end,
                // saturating cast, NaN becomes 0
                samples: intervals as usize,
            });
        }
        Self::linspace(start, end, intervals as usize + 1)
    }

    /// A 24 hour window at one-minute resolution, starting at the whole hour of
    /// the earliest dose across `schedules`
    ///
    /// Falls back to `default_start` when no schedule contains a dose.
    pub fn day_window(schedules: &[&Schedule], default_start: f64) -> Result<Self, CurveError> {
        let (start, end) = day_bounds(schedules, default_start);
        Self::with_resolution(start, end, 1.0)
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Sample spacing in hours
    pub fn step(&self) -> f64 {
        self.times[1] - self.times[0]
    }
}

/// Start and end of the 24 hour observation window for a set of schedules
pub fn day_bounds(schedules: &[&Schedule], default_start: f64) -> (f64, f64) {
    let start = schedules
        .iter()
        .filter_map(|s| s.first_time())
        .reduce(f64::min)
        .map(f64::floor)
        .unwrap_or(default_start);
    (start, start + 24.0)
}
