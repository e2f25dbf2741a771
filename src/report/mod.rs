//! Plain-data reporting on top of computed curves: values at named target
//! times, clock labels and schedule-derived file names.

mod labels;

pub use labels::{format_number, format_time_12h, schedule_filename};

use serde::{Deserialize, Serialize};

use crate::data::Curve;

/// A named time of day at which a curve is reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTime {
    pub label: String,
    pub hour: f64,
}

impl TargetTime {
    pub fn new(label: impl Into<String>, hour: f64) -> Self {
        TargetTime {
            label: label.into(),
            hour,
        }
    }

    /// A target labelled with its 12-hour clock time
    pub fn at(hour: f64) -> Self {
        TargetTime::new(format_time_12h(hour), hour)
    }

    /// 10am, 12pm and 2pm
    pub fn defaults() -> Vec<TargetTime> {
        vec![
            TargetTime::at(10.0),
            TargetTime::at(12.0),
            TargetTime::at(14.0),
        ]
    }
}

/// Value of a curve at a [TargetTime]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSample {
    pub label: String,
    pub hour: f64,
    pub value: f64,
}

/// Linearly interpolated value of `curve` at every target
pub fn sample_targets(curve: &Curve, targets: &[TargetTime]) -> Vec<TargetSample> {
    targets
        .iter()
        .map(|target| TargetSample {
            label: target.label.clone(),
            hour: target.hour,
            value: curve.value_at(target.hour),
        })
        .collect()
}
