use ndarray::Array1;
use tracing::debug;

use crate::data::{Curve, DoseEvent, TimeAxis};
use crate::simulator::rates::RateConstants;

/// Closed-form one-compartment response to a single oral dose
///
/// # Assumptions
/// - `elapsed` is the time since the dose in hours
/// - the response is `0` before the dose and scales linearly with `amount`
/// - `rates` has already been validated, so `ka != ke`
pub fn bateman_at(elapsed: f64, amount: f64, rates: &RateConstants) -> f64 {
    if elapsed < 0.0 {
        return 0.0;
    }
    let (ka, ke) = (rates.ka(), rates.ke());
    let value = amount * (ka / (ka - ke)) * ((-ke * elapsed).exp() - (-ka * elapsed).exp());
    value.max(0.0)
}

/// Evaluate the single-dose response of `dose` on every point of `axis`
///
/// Points before the dose time are exactly zero, as is the dose time itself.
pub fn bateman(axis: &TimeAxis, dose: &DoseEvent, rates: &RateConstants) -> Curve {
    let t0 = dose.time();
    let values: Array1<f64> = axis
        .times()
        .mapv(|t| bateman_at(t - t0, dose.amount(), rates));
    debug!(
        t0,
        amount = dose.amount(),
        ka = rates.ka(),
        ke = rates.ke(),
        "single-dose response"
    );
    Curve::from_parts(axis.times().clone(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dex_pk() -> RateConstants {
        RateConstants::from_half_life(1.0, 11.0).unwrap()
    }

    #[test]
    fn test_zero_before_and_at_dose() {
        let axis = TimeAxis::linspace(0.0, 24.0, 97).unwrap();
        let dose = DoseEvent::new(4.0, 50.0).unwrap();
        let curve = bateman(&axis, &dose, &dex_pk());
        for (t, v) in curve.points() {
            if t <= 4.0 {
                assert_eq!(v, 0.0, "expected zero at t = {t}");
            } else {
                assert!(v > 0.0);
            }
        }
    }

    #[test]
    fn test_matches_closed_form() {
        let rates = dex_pk();
        let (ka, ke) = (rates.ka(), rates.ke());
        let expected = 10.0 * ka / (ka - ke) * ((-ke * 2.0_f64).exp() - (-ka * 2.0_f64).exp());
        assert_relative_eq!(bateman_at(2.0, 10.0, &rates), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_decays_to_zero() {
        let rates = dex_pk();
        assert!(bateman_at(500.0, 50.0, &rates) < 1e-6);
        assert!(bateman_at(24.0, 50.0, &rates) < bateman_at(12.0, 50.0, &rates));
    }

    #[test]
    fn test_peak_at_tmax() {
        let rates = dex_pk();
        let tmax = rates.tmax();
        let peak = bateman_at(tmax, 1.0, &rates);
        assert!(peak >= bateman_at(tmax - 0.01, 1.0, &rates));
        assert!(peak >= bateman_at(tmax + 0.01, 1.0, &rates));
    }

    #[test]
    fn test_scales_with_amount() {
        let rates = dex_pk();
        assert_relative_eq!(
            bateman_at(3.0, 20.0, &rates),
            2.0 * bateman_at(3.0, 10.0, &rates),
            epsilon = 1e-12
        );
    }
}
