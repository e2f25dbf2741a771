use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CurveError;

/// Smallest rise time constant used when sampling a kernel (h)
const MIN_TAU: f64 = 1e-3;

/// Biexponential shaping kernel
///
/// `k(t) = e^(-t/tau_rise)/tau_rise - e^(-t/tau_decay)/tau_decay` for `t >= 0`.
/// Both exponentials integrate to one, so the kernel has zero DC gain and acts
/// as a band-pass: convolving a slowly decaying PK tail with it drives the
/// perceived curve down sooner than the plasma curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKernel")]
pub struct Kernel {
    /// Fast time constant in hours
    pub tau_rise: f64,
    /// Slow time constant in hours
    pub tau_decay: f64,
    /// Gain applied before peak matching
    #[serde(default = "default_gain")]
    pub gain: f64,
}

fn default_gain() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct RawKernel {
    tau_rise: f64,
    tau_decay: f64,
    #[serde(default = "default_gain")]
    gain: f64,
}

impl TryFrom<RawKernel> for Kernel {
    type Error = CurveError;

    fn try_from(raw: RawKernel) -> Result<Self, Self::Error> {
        Kernel::new(raw.tau_rise, raw.tau_decay, raw.gain)
    }
}

impl Kernel {
    pub fn new(tau_rise: f64, tau_decay: f64, gain: f64) -> Result<Self, CurveError> {
        for (param, value) in [
            ("tau_rise", tau_rise),
            ("tau_decay", tau_decay),
            ("gain", gain),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CurveError::InvalidKernel {
                    param: param.to_string(),
                    value,
                });
            }
        }
        Ok(Kernel {
            tau_rise,
            tau_decay,
            gain,
        })
    }

    /// Dex IR: perceived rise 0.5 h, decay 3 h
    pub fn dex() -> Self {
        Kernel {
            tau_rise: 0.5,
            tau_decay: 3.0,
            gain: 1.0,
        }
    }

    /// Vyvanse: perceived rise 1 h, decay 6 h
    pub fn vyvanse() -> Self {
        Kernel {
            tau_rise: 1.0,
            tau_decay: 6.0,
            gain: 1.0,
        }
    }

    /// Re-check the constructor constraints on a kernel built field by field
    pub fn validate(&self) -> Result<(), CurveError> {
        Kernel::new(self.tau_rise, self.tau_decay, self.gain).map(|_| ())
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Fast decay rate, `1 / tau_rise`
    pub fn fast_rate(&self) -> f64 {
        1.0 / self.tau_rise
    }

    /// Slow decay rate, `1 / tau_decay`
    pub fn slow_rate(&self) -> f64 {
        1.0 / self.tau_decay
    }

    /// Sample the kernel every `dt` hours over eight decay time constants
    ///
    /// The weights are scaled so the positive lobe has unit area, then
    /// multiplied by `gain`. `tau_rise` is raised to at least `1e-3` h and
    /// `tau_decay` to at least `tau_rise + 1e-3` h.
    pub fn weights(&self, dt: f64) -> Array1<f64> {
        let tau_r = self.tau_rise.max(MIN_TAU);
        let tau_d = self.tau_decay.max(tau_r + MIN_TAU);
        if tau_r != self.tau_rise || tau_d != self.tau_decay {
            warn!(
                tau_rise = self.tau_rise,
                tau_decay = self.tau_decay,
                "kernel time constants clamped to {tau_r} / {tau_d}"
            );
        }

        let n = (8.0 * tau_d / dt).ceil() as usize;
        let mut k = Array1::from_shape_fn(n + 1, |i| {
            let t = i as f64 * dt;
            (-t / tau_r).exp() / tau_r - (-t / tau_d).exp() / tau_d
        });

        let mut positive_area = k.iter().map(|&v| v.max(0.0)).sum::<f64>() * dt;
        if positive_area <= 1e-9 {
            positive_area = 1.0;
        }
        k.mapv_inplace(|v| v / positive_area * self.gain);
        k
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::dex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_positive_lobe_has_unit_area() {
        let dt = 1.0 / 60.0;
        let k = Kernel::dex().weights(dt);
        let area: f64 = k.iter().map(|&v| v.max(0.0)).sum::<f64>() * dt;
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
        assert!(k[0] > 0.0);
        assert!(k[k.len() - 1] < 0.0);
    }

    #[test]
    fn test_length_covers_eight_decay_constants() {
        let k = Kernel::vyvanse().weights(0.5);
        assert_eq!(k.len(), 97);
    }

    #[test]
    fn test_gain_scales_weights() {
        let dt = 0.1;
        let base = Kernel::dex().weights(dt);
        let doubled = Kernel::dex().with_gain(2.0).weights(dt);
        for (a, b) in base.iter().zip(doubled.iter()) {
            assert_relative_eq!(2.0 * a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inverted_constants_are_clamped() {
        let k = Kernel::new(3.0, 0.5, 1.0).unwrap().weights(0.1);
        assert!(k.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_deserialize_checks_parameters() {
        let kernel: Kernel =
            serde_json::from_str(r#"{"tau_rise": 0.5, "tau_decay": 3.0}"#).unwrap();
        assert_eq!(kernel, Kernel::dex());

        for bad in [
            r#"{"tau_rise": 0.5, "tau_decay": 3.0, "gain": 0.0}"#,
            r#"{"tau_rise": -1.0, "tau_decay": -3.0}"#,
            r#"{"tau_rise": 0.5, "tau_decay": 0.0}"#,
        ] {
            assert!(serde_json::from_str::<Kernel>(bad).is_err(), "{bad}");
        }

        let zero_gain = Kernel {
            gain: 0.0,
            ..Kernel::dex()
        };
        assert!(zero_gain.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(Kernel::new(0.0, 3.0, 1.0).is_err());
        assert!(Kernel::new(0.5, f64::NAN, 1.0).is_err());
        assert!(Kernel::new(0.5, 3.0, -1.0).is_err());
        assert_relative_eq!(Kernel::dex().fast_rate(), 2.0);
    }
}
