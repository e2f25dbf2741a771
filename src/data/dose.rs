use serde::{Deserialize, Serialize};

use crate::error::CurveError;

/// A single oral dose: an amount taken at a time offset in hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDose")]
pub struct DoseEvent {
    time: f64,
    amount: f64,
}

#[derive(Deserialize)]
struct RawDose {
    time: f64,
    amount: f64,
}

impl TryFrom<RawDose> for DoseEvent {
    type Error = CurveError;

    fn try_from(raw: RawDose) -> Result<Self, Self::Error> {
        DoseEvent::new(raw.time, raw.amount)
    }
}

impl DoseEvent {
    /// Create a new dose event
    ///
    /// # Arguments
    ///
    /// * `time` - Time of the dose in hours, must be `>= 0`
    /// * `amount` - Amount taken (mg or dex-equivalent mg), must be `> 0`
    pub fn new(time: f64, amount: f64) -> Result<Self, CurveError> {
        if !time.is_finite() || time < 0.0 || !amount.is_finite() || amount <= 0.0 {
            return Err(CurveError::InvalidDose { time, amount });
        }
        Ok(DoseEvent { time, amount })
    }

    /// Get the time of the dose
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Get the dose amount
    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// Ordered doses of one drug
///
/// Multiple doses at the same time are allowed and simply add up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    doses: Vec<DoseEvent>,
}

impl Schedule {
    pub fn new(doses: Vec<DoseEvent>) -> Self {
        Schedule { doses }
    }

    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Build a schedule from `(time, amount)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, CurveError> {
        let doses = pairs
            .iter()
            .map(|&(time, amount)| DoseEvent::new(time, amount))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Schedule { doses })
    }

    pub fn doses(&self) -> &[DoseEvent] {
        &self.doses
    }

    pub fn len(&self) -> usize {
        self.doses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doses.is_empty()
    }

    /// Earliest dose time, if any
    pub fn first_time(&self) -> Option<f64> {
        self.doses.iter().map(|d| d.time).reduce(f64::min)
    }

    /// Sum of all dose amounts
    pub fn total_amount(&self) -> f64 {
        self.doses.iter().map(|d| d.amount).sum()
    }

    pub fn push(&mut self, dose: DoseEvent) {
        self.doses.push(dose);
    }

    /// Append every dose of `other`
    pub fn extend(&mut self, other: &Schedule) {
        self.doses.extend_from_slice(&other.doses);
    }

    /// Doses sorted by time; equal times keep their original order
    pub fn sorted(&self) -> Schedule {
        let mut doses = self.doses.clone();
        doses.sort_by(|a, b| a.time.total_cmp(&b.time));
        Schedule { doses }
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a DoseEvent;
    type IntoIter = std::slice::Iter<'a, DoseEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.doses.iter()
    }
}

/// Builder for [Schedule]
///
/// Invalid doses are not checked here; use [Schedule::from_pairs] when the
/// values come from user input.
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    doses: Vec<DoseEvent>,
}

impl ScheduleBuilder {
    pub fn dose(mut self, time: f64, amount: f64) -> Self {
        self.doses.push(DoseEvent { time, amount });
        self
    }

    /// Repeat the last dose `n` more times, `delta` hours apart
    pub fn repeat(mut self, n: usize, delta: f64) -> Self {
        if let Some(last) = self.doses.last().copied() {
            for i in 1..=n {
                self.doses.push(DoseEvent {
                    time: last.time + delta * i as f64,
                    amount: last.amount,
                });
            }
        }
        self
    }

    /// Spread `amount` over `duration_min` minutes, see [split_dose]
    pub fn sipped(
        mut self,
        time: f64,
        amount: f64,
        duration_min: f64,
        parts: Option<usize>,
    ) -> Self {
        self.doses.extend(split_dose(time, amount, duration_min, parts));
        self
    }

    pub fn build(self) -> Schedule {
        Schedule { doses: self.doses }
    }
}

/// Split a dose taken over `duration_min` minutes into equal sub-doses
///
/// Without an explicit `parts`, one sub-dose is used per minute. A duration of
/// zero or less yields the original single dose. The sub-doses always sum to
/// `amount`.
pub fn split_dose(
    time: f64,
    amount: f64,
    duration_min: f64,
    parts: Option<usize>,
) -> Vec<DoseEvent> {
    if !(duration_min > 0.0) {
        return vec![DoseEvent { time, amount }];
    }
    let n = parts.unwrap_or(duration_min.round() as usize).max(1);
    let step_h = duration_min / n as f64 / 60.0;
    let each = amount / n as f64;
    (0..n)
        .map(|i| DoseEvent {
            time: time + i as f64 * step_h,
            amount: each,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dose_validation() {
        assert!(DoseEvent::new(8.0, 5.0).is_ok());
        assert!(DoseEvent::new(-1.0, 5.0).is_err());
        assert!(DoseEvent::new(8.0, 0.0).is_err());
        assert!(DoseEvent::new(f64::NAN, 5.0).is_err());
    }

    #[test]
    fn test_deserialize_validates_doses() {
        let schedule: Schedule =
            serde_json::from_str(r#"[{"time": 8.0, "amount": 5.0}, {"time": 11.0, "amount": 5.0}]"#)
                .unwrap();
        assert_eq!(schedule.len(), 2);

        assert!(serde_json::from_str::<DoseEvent>(r#"{"time": -4.0, "amount": -5.0}"#).is_err());
        assert!(serde_json::from_str::<Schedule>(r#"[{"time": 8.0, "amount": 0.0}]"#).is_err());
    }

    #[test]
    fn test_from_pairs_reports_first_bad_dose() {
        let err = Schedule::from_pairs(&[(8.0, 5.0), (9.0, -2.0)]).unwrap_err();
        assert_eq!(
            err,
            CurveError::InvalidDose {
                time: 9.0,
                amount: -2.0
            }
        );
    }

    #[test]
    fn test_builder_repeat() {
        let schedule = Schedule::builder().dose(8.0, 5.0).repeat(2, 3.0).build();
        let times: Vec<f64> = schedule.doses().iter().map(|d| d.time()).collect();
        assert_eq!(times, vec![8.0, 11.0, 14.0]);
        assert_relative_eq!(schedule.total_amount(), 15.0);
    }

    #[test]
    fn test_split_dose_preserves_amount() {
        let parts = split_dose(13.0, 156.0, 60.0, Some(4));
        assert_eq!(parts.len(), 4);
        assert_relative_eq!(parts.iter().map(|d| d.amount()).sum::<f64>(), 156.0);
        assert_relative_eq!(parts[1].time(), 13.25, epsilon = 1e-12);

        let per_minute = split_dose(9.0, 150.0, 20.0, None);
        assert_eq!(per_minute.len(), 20);

        let single = split_dose(9.0, 150.0, 0.0, Some(4));
        assert_eq!(single.len(), 1);
        assert_relative_eq!(single[0].amount(), 150.0);
    }

    #[test]
    fn test_sorted_and_first_time() {
        let schedule = Schedule::builder().dose(11.0, 5.0).dose(8.0, 5.0).build();
        assert_eq!(schedule.first_time(), Some(8.0));
        assert_eq!(schedule.sorted().doses()[0].time(), 8.0);
        assert_eq!(Schedule::default().first_time(), None);
    }
}
