//! Perceived effect derived from a PK curve
//!
//! Plasma concentration is a poor proxy for how a stimulant feels: the
//! subjective effect tends to arrive later and wear off sooner. This module
//! turns a PK [Curve] into a perceived-effect curve by convolving it with a
//! biexponential [Kernel] and rescaling the result.
//!
//! # Pipeline
//!
//! | Step | Operation |
//! |------|-----------|
//! | 1 | Causal convolution of the PK samples with [Kernel::weights] |
//! | 2 | Negative values clamped to zero |
//! | 3 | Peak matching: perceived peak = `peak_scale` × PK peak |
//! | 4 | Optional cap at `clamp_scale` × PK peak |
//!
//! # Usage
//!
//! ```rust
//! use dosecurve::prelude::*;
//!
//! let axis = TimeAxis::with_resolution(8.0, 32.0, 1.0)?;
//! let dex = Schedule::builder().dose(8.0, 5.0).build();
//! let pk = schedule_curve(&axis, &dex, &DrugProfile::dex().pk);
//! let felt = perceive(&pk, &Kernel::dex(), &PerceivedOptions::default())?;
//! assert!((felt.peak() - pk.peak()).abs() < 1e-9);
//! # Ok::<(), dosecurve::CurveError>(())
//! ```
//!
//! The constants behind [Kernel::dex] and [Kernel::vyvanse] are hand-tuned
//! illustrations, not fitted values.

mod kernel;

pub use kernel::Kernel;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::{Curve, TimeAxis};
use crate::error::CurveError;
use crate::simulator::total;

/// Scaling and display options for perceived curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceivedOptions {
    /// Perceived values below this are hidden when charted
    pub floor: f64,
    /// Target perceived peak as a multiple of the PK peak
    pub peak_scale: f64,
    /// Upper bound on perceived values as a multiple of the PK peak
    pub clamp_scale: Option<f64>,
}

impl Default for PerceivedOptions {
    fn default() -> Self {
        Self {
            floor: 0.05,
            peak_scale: 1.0,
            clamp_scale: Some(1.1),
        }
    }
}

impl PerceivedOptions {
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_peak_scale(mut self, peak_scale: f64) -> Self {
        self.peak_scale = peak_scale;
        self
    }

    pub fn with_clamp_scale(mut self, clamp_scale: Option<f64>) -> Self {
        self.clamp_scale = clamp_scale;
        self
    }

    /// `floor` must be non-negative, `peak_scale` and `clamp_scale` positive
    pub fn validate(&self) -> Result<(), CurveError> {
        let invalid = |param: &str, value: f64| CurveError::InvalidOption {
            param: param.to_string(),
            value,
        };
        if !self.floor.is_finite() || self.floor < 0.0 {
            return Err(invalid("floor", self.floor));
        }
        if !self.peak_scale.is_finite() || self.peak_scale <= 0.0 {
            return Err(invalid("peak_scale", self.peak_scale));
        }
        match self.clamp_scale {
            Some(clamp) if !clamp.is_finite() || clamp <= 0.0 => Err(invalid("clamp_scale", clamp)),
            _ => Ok(()),
        }
    }
}

/// Derive a perceived-effect curve from `pk`
///
/// The output lives on the same axis as `pk`. The sample step is taken from
/// the first two time points, so `pk` must be evenly spaced.
///
/// # Errors
///
/// [CurveError::InvalidAxis] when `pk` has fewer than two samples,
/// [CurveError::InvalidKernel] or [CurveError::InvalidOption] for unusable
/// kernel constants or scaling options.
pub fn perceive(
    pk: &Curve,
    kernel: &Kernel,
    options: &PerceivedOptions,
) -> Result<Curve, CurveError> {
    kernel.validate()?;
    options.validate()?;
    let dt = match pk.step() {
        Some(dt) if dt > 0.0 => dt,
        _ => {
            return Err(CurveError::InvalidAxis {
                start: pk.times().iter().next().copied().unwrap_or(f64::NAN),
                end: pk.times().iter().last().copied().unwrap_or(f64::NAN),
                samples: pk.len(),
            })
        }
    };

    let weights = kernel.weights(dt);
    let mut shaped = convolve_causal(pk.values(), &weights);
    shaped.mapv_inplace(|v| v.max(0.0));

    let pk_peak = pk.peak();
    let shaped_peak = shaped.iter().copied().fold(0.0, f64::max);
    if shaped_peak > 1e-9 {
        let factor = options.peak_scale * pk_peak / shaped_peak;
        shaped.mapv_inplace(|v| v * factor);
    } else if pk_peak > 0.0 {
        warn!(pk_peak, "perceived curve vanished, skipping peak matching");
    }
    if let Some(clamp) = options.clamp_scale {
        if pk_peak > 0.0 {
            let cap = clamp * pk_peak;
            shaped.mapv_inplace(|v| v.min(cap));
        }
    }

    debug!(
        tau_rise = kernel.tau_rise,
        tau_decay = kernel.tau_decay,
        pk_peak,
        "derived perceived curve"
    );
    Ok(Curve::from_parts(pk.times().clone(), shaped))
}

/// Apply [perceive] to every component separately
pub fn perceive_each(
    components: &[Curve],
    kernel: &Kernel,
    options: &PerceivedOptions,
) -> Result<Vec<Curve>, CurveError> {
    components
        .iter()
        .map(|c| perceive(c, kernel, options))
        .collect()
}

/// Sum of the perceived components, or a zero curve on `axis` when there are none
///
/// Peak matching happens per component, so each dose keeps its own PK peak.
pub fn perceive_sum(
    axis: &TimeAxis,
    components: &[Curve],
    kernel: &Kernel,
    options: &PerceivedOptions,
) -> Result<Curve, CurveError> {
    let perceived = perceive_each(components, kernel, options)?;
    if perceived.is_empty() {
        return Ok(Curve::zeros(axis));
    }
    total(&perceived)
}

/// `y[i] = Σ_j x[i - j] · k[j]`, truncated to the length of `x`
fn convolve_causal(x: &Array1<f64>, k: &Array1<f64>) -> Array1<f64> {
    Array1::from_shape_fn(x.len(), |i| {
        let upto = i.min(k.len().saturating_sub(1));
        (0..=upto).map(|j| x[i - j] * k[j]).sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Schedule;
    use crate::simulator::{dose_curves, schedule_curve, DrugProfile};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn axis() -> TimeAxis {
        TimeAxis::with_resolution(8.0, 32.0, 1.0).unwrap()
    }

    fn dex_pk() -> Curve {
        let schedule = Schedule::builder().dose(8.0, 5.0).build();
        schedule_curve(&axis(), &schedule, &DrugProfile::dex().pk)
    }

    #[test]
    fn test_convolution_matches_manual() {
        let x = array![1.0, 2.0, 3.0];
        let k = array![1.0, 0.5];
        assert_eq!(convolve_causal(&x, &k), array![1.0, 2.5, 4.0]);
    }

    #[test]
    fn test_peak_matches_pk() {
        let pk = dex_pk();
        let felt = perceive(&pk, &Kernel::dex(), &PerceivedOptions::default()).unwrap();
        assert_relative_eq!(felt.peak(), pk.peak(), max_relative = 1e-12);
        assert!(felt.same_axis(&pk));
    }

    #[test]
    fn test_peak_scale_and_clamp() {
        let pk = dex_pk();
        let scaled = perceive(
            &pk,
            &Kernel::dex(),
            &PerceivedOptions::default()
                .with_peak_scale(0.8)
                .with_clamp_scale(None),
        )
        .unwrap();
        assert_relative_eq!(scaled.peak(), 0.8 * pk.peak(), max_relative = 1e-12);

        let clamped = perceive(
            &pk,
            &Kernel::dex(),
            &PerceivedOptions::default()
                .with_peak_scale(2.0)
                .with_clamp_scale(Some(1.2)),
        )
        .unwrap();
        assert_relative_eq!(clamped.peak(), 1.2 * pk.peak(), max_relative = 1e-12);
    }

    #[test]
    fn test_wears_off_sooner() {
        let pk = dex_pk();
        let felt = perceive(&pk, &Kernel::dex(), &PerceivedOptions::default()).unwrap();
        // twelve hours after the dose the plasma curve is still well above zero
        let late = 20.0;
        assert!(felt.value_at(late) / felt.peak() < pk.value_at(late) / pk.peak());
    }

    #[test]
    fn test_rejects_unusable_settings() {
        let pk = dex_pk();
        let zero_gain = Kernel {
            gain: 0.0,
            ..Kernel::dex()
        };
        assert!(matches!(
            perceive(&pk, &zero_gain, &PerceivedOptions::default()),
            Err(CurveError::InvalidKernel { .. })
        ));

        for options in [
            PerceivedOptions::default().with_peak_scale(0.0),
            PerceivedOptions::default().with_peak_scale(-1.0),
            PerceivedOptions::default().with_clamp_scale(Some(0.0)),
            PerceivedOptions::default().with_floor(f64::NAN),
        ] {
            assert!(matches!(
                perceive(&pk, &Kernel::dex(), &options),
                Err(CurveError::InvalidOption { .. })
            ));
        }
    }

    #[test]
    fn test_zero_input_stays_zero() {
        let flat = Curve::zeros(&axis());
        let felt = perceive(&flat, &Kernel::dex(), &PerceivedOptions::default()).unwrap();
        assert!(felt.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_sample_is_rejected() {
        let curve = Curve::from_parts(array![0.0], array![1.0]);
        assert!(perceive(&curve, &Kernel::dex(), &PerceivedOptions::default()).is_err());
    }

    #[test]
    fn test_sum_of_components() {
        let schedule = Schedule::builder().dose(8.0, 5.0).dose(11.0, 5.0).build();
        let parts = dose_curves(&axis(), &schedule, &DrugProfile::dex().pk);
        let options = PerceivedOptions::default();
        let summed = perceive_sum(&axis(), &parts, &Kernel::dex(), &options).unwrap();
        let each = perceive_each(&parts, &Kernel::dex(), &options).unwrap();
        for i in [0, 300, 900] {
            assert_relative_eq!(
                summed.values()[i],
                each[0].values()[i] + each[1].values()[i],
                epsilon = 1e-12
            );
        }

        let none = perceive_sum(&axis(), &[], &Kernel::dex(), &options).unwrap();
        assert_eq!(none, Curve::zeros(&axis()));
    }
}
