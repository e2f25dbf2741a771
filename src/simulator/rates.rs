use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CurveError;

/// Absorption and elimination rate constants (per hour) of a one-compartment
/// oral model
///
/// Both constants are finite and positive, and `ka != ke`. The closed-form
/// response divides by `ka - ke`, so equal constants are rejected here rather
/// than patched up at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateConstants {
    ka: f64,
    ke: f64,
}

impl RateConstants {
    /// Relative distance below which `ka` and `ke` count as equal
    pub const EQUALITY_TOLERANCE: f64 = 1e-9;

    pub fn new(ka: f64, ke: f64) -> Result<Self, CurveError> {
        let invalid = |reason: &str| CurveError::InvalidRates {
            ka,
            ke,
            reason: reason.to_string(),
        };
        if !ka.is_finite() || !ke.is_finite() {
            return Err(invalid("constants must be finite"));
        }
        if ka <= 0.0 || ke <= 0.0 {
            return Err(invalid("constants must be positive"));
        }
        if (ka - ke).abs() <= Self::EQUALITY_TOLERANCE * ka.max(ke) {
            return Err(invalid("ka and ke must differ"));
        }
        Ok(RateConstants { ka, ke })
    }

    /// Build from an absorption rate and an elimination half-life in hours
    pub fn from_half_life(ka: f64, half_life: f64) -> Result<Self, CurveError> {
        Self::new(ka, std::f64::consts::LN_2 / half_life)
    }

    pub fn ka(&self) -> f64 {
        self.ka
    }

    pub fn ke(&self) -> f64 {
        self.ke
    }

    /// Elimination half-life in hours
    pub fn half_life(&self) -> f64 {
        std::f64::consts::LN_2 / self.ke
    }

    /// Time after a dose at which the single-dose response peaks
    pub fn tmax(&self) -> f64 {
        (self.ka / self.ke).ln() / (self.ka - self.ke)
    }
}

impl<'de> Deserialize<'de> for RateConstants {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            ka: f64,
            ke: Option<f64>,
            half_life: Option<f64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let rates = match (raw.ke, raw.half_life) {
            (Some(ke), None) => RateConstants::new(raw.ka, ke),
            (None, Some(t_half)) => RateConstants::from_half_life(raw.ka, t_half),
            _ => {
                return Err(serde::de::Error::custom(
                    "exactly one of `ke` or `half_life` must be given",
                ))
            }
        };
        rates.map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for RateConstants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ka={:.2}, t1/2={:.1}h", self.ka, self.half_life())
    }
}

/// Which parameterization feeds the schedule composer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMode {
    /// Plasma concentration constants
    #[default]
    Pk,
    /// Faster onset and shorter effective half-life approximating subjective effect
    Perceived,
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectMode::Pk => write!(f, "pk"),
            EffectMode::Perceived => write!(f, "perceived"),
        }
    }
}

impl FromStr for EffectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pk" => Ok(EffectMode::Pk),
            "perceived" | "pd" => Ok(EffectMode::Perceived),
            other => Err(format!("unknown effect mode `{other}`, expected `pk` or `perceived`")),
        }
    }
}

/// A drug's PK constants together with its perceived-effect constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugProfile {
    pub name: String,
    pub pk: RateConstants,
    pub perceived: RateConstants,
}

impl DrugProfile {
    pub fn new(name: impl Into<String>, pk: RateConstants, perceived: RateConstants) -> Self {
        DrugProfile {
            name: name.into(),
            pk,
            perceived,
        }
    }

    /// The constants used in `mode`
    pub fn rates(&self, mode: EffectMode) -> RateConstants {
        match mode {
            EffectMode::Pk => self.pk,
            EffectMode::Perceived => self.perceived,
        }
    }

    /// Lisdexamfetamine as d-amphetamine, Tmax around 3.5 to 4 h, t1/2 11 h
    ///
    /// The prodrug has no separate perceived parameterization.
    pub fn vyvanse() -> Self {
        let pk = RateConstants {
            ka: 0.80,
            ke: std::f64::consts::LN_2 / 11.0,
        };
        DrugProfile::new("Vyvanse", pk, pk)
    }

    /// Immediate-release dextroamphetamine
    ///
    /// PK: ka 1.0, t1/2 11 h. Perceived: ka 1.4, effective t1/2 2.7 h.
    pub fn dex() -> Self {
        DrugProfile::new(
            "Dex",
            RateConstants {
                ka: 1.00,
                ke: std::f64::consts::LN_2 / 11.0,
            },
            RateConstants {
                ka: 1.40,
                ke: std::f64::consts::LN_2 / 2.7,
            },
        )
    }

    /// Caffeine, Tmax under an hour, t1/2 5 h
    pub fn caffeine() -> Self {
        let pk = RateConstants {
            ka: 3.0,
            ke: std::f64::consts::LN_2 / 5.0,
        };
        DrugProfile::new("Caffeine", pk, pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_invalid_constants() {
        assert!(RateConstants::new(1.0, 1.0).is_err());
        assert!(RateConstants::new(0.0, 0.1).is_err());
        assert!(RateConstants::new(1.0, -0.1).is_err());
        assert!(RateConstants::new(f64::INFINITY, 0.1).is_err());
        assert!(RateConstants::new(1.0, 0.1).is_ok());
    }

    #[test]
    fn test_half_life() {
        let rates = RateConstants::from_half_life(1.0, 11.0).unwrap();
        assert_relative_eq!(rates.ke(), std::f64::consts::LN_2 / 11.0);
        assert_relative_eq!(rates.half_life(), 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_presets_are_valid() {
        for profile in [DrugProfile::vyvanse(), DrugProfile::dex(), DrugProfile::caffeine()] {
            for mode in [EffectMode::Pk, EffectMode::Perceived] {
                let rates = profile.rates(mode);
                assert!(RateConstants::new(rates.ka(), rates.ke()).is_ok());
            }
        }
    }

    #[test]
    fn test_perceived_dex_is_faster() {
        let dex = DrugProfile::dex();
        let pk = dex.rates(EffectMode::Pk);
        let perceived = dex.rates(EffectMode::Perceived);
        assert!(perceived.ka() > pk.ka());
        assert!(perceived.ke() > pk.ke());
        assert!(perceived.tmax() < pk.tmax());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("PK".parse::<EffectMode>().unwrap(), EffectMode::Pk);
        assert_eq!("perceived".parse::<EffectMode>().unwrap(), EffectMode::Perceived);
        assert!("plasma".parse::<EffectMode>().is_err());
    }

    #[test]
    fn test_deserialize_from_half_life() {
        let rates: RateConstants =
            serde_json::from_str(r#"{"ka": 1.4, "half_life": 2.7}"#).unwrap();
        assert_relative_eq!(rates.half_life(), 2.7, epsilon = 1e-12);

        let equal = serde_json::from_str::<RateConstants>(r#"{"ka": 0.5, "ke": 0.5}"#);
        assert!(equal.is_err());
    }
}
