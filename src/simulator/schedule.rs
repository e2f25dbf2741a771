//! Linear superposition of doses and drugs
//!
//! Each dose contributes an independent time-shifted [bateman] response; the
//! composers here only ever add curves that live on the same [TimeAxis].

use ndarray::Array1;
use tracing::debug;

use crate::data::{Curve, Schedule, TimeAxis};
use crate::error::CurveError;
use crate::simulator::bateman::bateman;
use crate::simulator::rates::RateConstants;

/// One response curve per dose, in schedule order
pub fn dose_curves(axis: &TimeAxis, schedule: &Schedule, rates: &RateConstants) -> Vec<Curve> {
    schedule
        .doses()
        .iter()
        .map(|dose| bateman(axis, dose, rates))
        .collect()
}

/// The combined curve of every dose in `schedule`
///
/// An empty schedule yields a flat zero curve.
pub fn schedule_curve(axis: &TimeAxis, schedule: &Schedule, rates: &RateConstants) -> Curve {
    let mut values: Array1<f64> = Array1::zeros(axis.len());
    for dose in schedule {
        values += bateman(axis, dose, rates).values();
    }
    debug!(doses = schedule.len(), "composed schedule curve");
    Curve::from_parts(axis.times().clone(), values)
}

/// Element-wise sum of curves sharing one time axis
///
/// # Errors
///
/// [CurveError::Empty] for no input, [CurveError::AxisMismatch] when any curve
/// is sampled on a different axis than the first one.
pub fn total<'a, I>(curves: I) -> Result<Curve, CurveError>
where
    I: IntoIterator<Item = &'a Curve>,
{
    let mut iter = curves.into_iter();
    let first = iter.next().ok_or(CurveError::Empty)?;
    iter.try_fold(first.clone(), |acc, curve| acc.try_add(curve))
}

/// What the total would look like if dosing stopped early
///
/// For every dose but the last, returns `(branch_time, curve)` where `curve`
/// is `base` plus the first `i + 1` components and `branch_time` is the time
/// of the dose that would be skipped. `times` holds the dose time of each
/// component.
pub fn stop_after_projections(
    base: &Curve,
    components: &[Curve],
    times: &[f64],
) -> Result<Vec<(f64, Curve)>, CurveError> {
    if components.len() != times.len() {
        return Err(CurveError::AxisMismatch {
            description: format!(
                "{} components for {} dose times",
                components.len(),
                times.len()
            ),
        });
    }
    let mut running = base.clone();
    let mut projections = Vec::with_capacity(components.len().saturating_sub(1));
    for (i, component) in components.iter().enumerate() {
        running = running.try_add(component)?;
        if let Some(&branch_time) = times.get(i + 1) {
            projections.push((branch_time, running.clone()));
        }
    }
    Ok(projections)
}
