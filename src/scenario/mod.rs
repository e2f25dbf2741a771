//! Chart scenarios: who took what and when, and how it should be charted
//!
//! A [Scenario] replaces the hard-coded parameter blocks of a plotting script.
//! It can be one of the built-in presets or loaded from a TOML file:
//!
//! ```toml
//! chart = "pk-vs-perceived"
//! mode = "pk"
//!
//! # (time of day, capsule mg)
//! vyvanse = [[8.0, 30.0]]
//! # (time of day, mg)
//! dex = [[8.0, 5.0], [11.0, 5.0], [13.0, 5.0]]
//!
//! [[caffeine]]
//! time = 13.0
//! mg = 156.0
//! duration_min = 60.0
//! ```
//!
//! [Scenario::chart] turns it into a [Chart] that any renderer can draw.

mod build;
mod chart;

pub use chart::{Chart, DoseMarker, LineStyle, SampleSet, Series, SeriesColor};

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::conversions::vyvanse_cap_to_dex_eq;
use crate::data::{DoseEvent, Schedule, TimeAxis};
use crate::error::{CurveError, ScenarioError};
use crate::perceived::{Kernel, PerceivedOptions};
use crate::report::TargetTime;
use crate::simulator::{DrugProfile, EffectMode};

/// The three chart layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    /// Vyvanse plus Dex add-ons, with stop-after projections
    VyvanseWithDex,
    /// A Dex-only schedule compared against the Vyvanse + Dex reference
    DexOnly,
    /// PK curves overlaid with kernel-derived perceived curves
    PkVsPerceived,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::VyvanseWithDex,
        ChartKind::DexOnly,
        ChartKind::PkVsPerceived,
    ];

    /// Short name used on the command line and in file names
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::VyvanseWithDex => "vyvanse-with-dex",
            ChartKind::DexOnly => "dex-only",
            ChartKind::PkVsPerceived => "pk-vs-perceived",
        }
    }

    fn component(&self) -> &'static str {
        match self {
            ChartKind::VyvanseWithDex => "vyvanse-with-dex-curves",
            ChartKind::DexOnly => "dex-only-curves",
            ChartKind::PkVsPerceived => "pk-vs-perceived",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ScenarioError::UnknownChart(s.to_string()))
    }
}

/// Caffeine taken at once or sipped over a duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaffeineIntake {
    /// Start time (hour of day)
    pub time: f64,
    /// Total caffeine in mg
    pub mg: f64,
    /// Drinking duration in minutes
    #[serde(default)]
    pub duration_min: Option<f64>,
    /// Number of equal sips across the duration, one per minute if unset
    #[serde(default)]
    pub parts: Option<usize>,
}

/// Rate constants for every drug in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drugs {
    pub vyvanse: DrugProfile,
    pub dex: DrugProfile,
    pub caffeine: DrugProfile,
}

impl Default for Drugs {
    fn default() -> Self {
        Drugs {
            vyvanse: DrugProfile::vyvanse(),
            dex: DrugProfile::dex(),
            caffeine: DrugProfile::caffeine(),
        }
    }
}

/// Shaping kernels for the perceived curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kernels {
    pub vyvanse: Kernel,
    pub dex: Kernel,
}

impl Default for Kernels {
    fn default() -> Self {
        Kernels {
            vyvanse: Kernel::vyvanse(),
            dex: Kernel::dex(),
        }
    }
}

/// Everything needed to compute one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub chart: ChartKind,
    /// Which Dex constants feed the composer (ignored by `pk-vs-perceived`,
    /// which derives perceived curves with a kernel instead)
    #[serde(default)]
    pub mode: EffectMode,
    /// Vyvanse doses as `[time, capsule mg]`
    #[serde(default)]
    pub vyvanse: Vec<[f64; 2]>,
    /// Dex doses as `[time, mg]`, added on top of Vyvanse in the reference
    #[serde(default)]
    pub dex: Vec<[f64; 2]>,
    /// The alternative Dex-only schedule, `[time, mg]`
    #[serde(default)]
    pub dex_only: Vec<[f64; 2]>,
    #[serde(default)]
    pub caffeine: Vec<CaffeineIntake>,
    #[serde(default)]
    pub drugs: Drugs,
    #[serde(default)]
    pub kernels: Kernels,
    #[serde(default)]
    pub perceived: PerceivedOptions,
    #[serde(default = "TargetTime::defaults")]
    pub targets: Vec<TargetTime>,
    /// Minutes per sample
    #[serde(default = "default_resolution")]
    pub resolution_min: f64,
    /// Window start when no dose is scheduled
    #[serde(default = "default_start")]
    pub default_start: f64,
}

fn default_resolution() -> f64 {
    1.0
}

fn default_start() -> f64 {
    8.0
}

impl Scenario {
    fn empty(chart: ChartKind) -> Self {
        Scenario {
            chart,
            mode: EffectMode::default(),
            vyvanse: Vec::new(),
            dex: Vec::new(),
            dex_only: Vec::new(),
            caffeine: Vec::new(),
            drugs: Drugs::default(),
            kernels: Kernels::default(),
            perceived: PerceivedOptions::default(),
            targets: TargetTime::defaults(),
            resolution_min: default_resolution(),
            default_start: default_start(),
        }
    }

    /// Vyvanse 30 mg at 8am with Dex 5 mg at 8am, 11am and 1pm, Dex in
    /// perceived mode
    pub fn vyvanse_with_dex() -> Self {
        Scenario {
            mode: EffectMode::Perceived,
            vyvanse: vec![[8.0, 30.0]],
            dex: vec![[8.0, 5.0], [11.0, 5.0], [13.0, 5.0]],
            ..Scenario::empty(ChartKind::VyvanseWithDex)
        }
    }

    /// A five-dose Dex-only day against the Vyvanse + Dex reference
    pub fn dex_only() -> Self {
        Scenario {
            mode: EffectMode::Perceived,
            vyvanse: vec![[8.0, 30.0]],
            dex: vec![[8.0, 5.0], [11.0, 5.0], [13.0, 5.0]],
            dex_only: vec![
                [8.0, 15.0],
                [9.5, 5.0],
                [11.0, 7.5],
                [11.75, 2.5],
                [13.0, 7.5],
            ],
            ..Scenario::empty(ChartKind::DexOnly)
        }
    }

    /// Vyvanse + Dex PK with kernel-derived perceived curves and an AeroPress
    /// coffee sipped over an hour
    pub fn pk_vs_perceived() -> Self {
        Scenario {
            vyvanse: vec![[8.0, 30.0]],
            dex: vec![[8.0, 5.0], [11.0, 5.0], [13.0, 5.0]],
            caffeine: vec![CaffeineIntake {
                time: 13.0,
                mg: crate::data::conversions::aeropress_scoops_to_caffeine_mg(1.0),
                duration_min: Some(60.0),
                parts: None,
            }],
            ..Scenario::empty(ChartKind::PkVsPerceived)
        }
    }

    /// The built-in preset for `kind`
    pub fn preset(kind: ChartKind) -> Self {
        match kind {
            ChartKind::VyvanseWithDex => Scenario::vyvanse_with_dex(),
            ChartKind::DexOnly => Scenario::dex_only(),
            ChartKind::PkVsPerceived => Scenario::pk_vs_perceived(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(s)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let scenario = Self::from_toml_str(&text)?;
        info!(path = %path.display(), chart = %scenario.chart, "loaded scenario");
        Ok(scenario)
    }

    pub fn with_mode(mut self, mode: EffectMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check every dose, the kernels, the perceived options and the sampling
    /// resolution
    pub fn validate(&self) -> Result<(), CurveError> {
        self.vyvanse_schedule()?;
        self.dex_schedule()?;
        self.dex_only_schedule()?;
        self.caffeine_schedule()?;
        self.kernels.vyvanse.validate()?;
        self.kernels.dex.validate()?;
        self.perceived.validate()?;
        TimeAxis::with_resolution(
            self.default_start,
            self.default_start + 24.0,
            self.resolution_min,
        )?;
        Ok(())
    }

    /// Whether [Scenario::mode] affects the chart
    ///
    /// `pk-vs-perceived` always charts PK constants and derives the perceived
    /// curves with a kernel.
    pub fn uses_mode(&self) -> bool {
        self.chart != ChartKind::PkVsPerceived
    }

    /// Vyvanse doses converted to dex-equivalent mg
    pub fn vyvanse_schedule(&self) -> Result<Schedule, CurveError> {
        let pairs: Vec<(f64, f64)> = self
            .vyvanse
            .iter()
            .map(|&[time, capsule]| (time, vyvanse_cap_to_dex_eq(capsule)))
            .collect();
        Schedule::from_pairs(&pairs)
    }

    pub fn dex_schedule(&self) -> Result<Schedule, CurveError> {
        Schedule::from_pairs(&pairs(&self.dex))
    }

    pub fn dex_only_schedule(&self) -> Result<Schedule, CurveError> {
        Schedule::from_pairs(&pairs(&self.dex_only))
    }

    /// Caffeine intakes expanded into sub-doses
    pub fn caffeine_schedule(&self) -> Result<Schedule, CurveError> {
        let mut schedule = Schedule::default();
        for intake in &self.caffeine {
            DoseEvent::new(intake.time, intake.mg)?;
            let sips = Schedule::builder()
                .sipped(
                    intake.time,
                    intake.mg,
                    intake.duration_min.unwrap_or(0.0),
                    intake.parts,
                )
                .build();
            schedule.extend(&sips);
        }
        Ok(schedule)
    }

    /// Validate and compute the chart for this scenario
    pub fn chart(&self) -> Result<Chart, CurveError> {
        self.validate()?;
        match self.chart {
            ChartKind::VyvanseWithDex => build::vyvanse_with_dex(self),
            ChartKind::DexOnly => build::dex_only(self),
            ChartKind::PkVsPerceived => build::pk_vs_perceived(self),
        }
    }
}

fn pairs(raw: &[[f64; 2]]) -> Vec<(f64, f64)> {
    raw.iter().map(|&[time, amount]| (time, amount)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_presets_validate() {
        for kind in ChartKind::ALL {
            let scenario = Scenario::preset(kind);
            assert_eq!(scenario.chart, kind);
            assert!(scenario.validate().is_ok());
        }
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.name().parse::<ChartKind>().unwrap(), kind);
        }
        assert!(matches!(
            "bar-chart".parse::<ChartKind>(),
            Err(ScenarioError::UnknownChart(_))
        ));
    }

    #[test]
    fn test_vyvanse_is_converted() {
        let schedule = Scenario::vyvanse_with_dex().vyvanse_schedule().unwrap();
        assert_relative_eq!(schedule.doses()[0].amount(), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_caffeine_sips_sum_to_intake() {
        let scenario = Scenario::pk_vs_perceived();
        let caffeine = scenario.caffeine_schedule().unwrap();
        assert_eq!(caffeine.len(), 60);
        assert_relative_eq!(caffeine.total_amount(), 156.0, epsilon = 1e-9);
    }

    #[test]
    fn test_parse_toml() {
        let scenario = Scenario::from_toml_str(
            r#"
            chart = "dex-only"
            mode = "pk"
            dex_only = [[9.0, 10.0], [13.0, 5.0]]
            targets = [{ label = "noon", hour = 12.0 }]

            [drugs.dex]
            name = "Dex"
            pk = { ka = 1.2, half_life = 10.0 }
            perceived = { ka = 1.5, ke = 0.25 }

            [perceived]
            floor = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(scenario.chart, ChartKind::DexOnly);
        assert_eq!(scenario.mode, EffectMode::Pk);
        assert_eq!(scenario.dex_only_schedule().unwrap().len(), 2);
        assert_eq!(scenario.targets[0].label, "noon");
        assert_relative_eq!(scenario.drugs.dex.pk.half_life(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(scenario.perceived.floor, 0.1);
        assert_eq!(scenario.perceived.peak_scale, 1.0);
        assert_eq!(scenario.resolution_min, 1.0);
    }

    #[test]
    fn test_parse_rejects_bad_dose() {
        let result = Scenario::from_toml_str(
            r#"
            chart = "vyvanse-with-dex"
            dex = [[8.0, -5.0]]
            "#,
        );
        assert!(matches!(result, Err(ScenarioError::Curve(_))));
    }

    #[test]
    fn test_parse_rejects_bad_kernels() {
        for kernel in [
            "tau_rise = 0.5\ntau_decay = 3.0\ngain = 0.0",
            "tau_rise = -1.0\ntau_decay = -3.0",
        ] {
            let toml = format!("chart = \"pk-vs-perceived\"\n[kernels.dex]\n{kernel}\n");
            assert!(
                matches!(Scenario::from_toml_str(&toml), Err(ScenarioError::Parse(_))),
                "{kernel}"
            );
        }

        let mut scenario = Scenario::pk_vs_perceived();
        scenario.kernels.dex.gain = 0.0;
        assert!(matches!(
            scenario.chart(),
            Err(CurveError::InvalidKernel { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_scaling() {
        for options in ["peak_scale = 0.0", "peak_scale = -2.0", "clamp_scale = 0.0"] {
            let toml = format!("chart = \"pk-vs-perceived\"\n[perceived]\n{options}\n");
            assert!(
                matches!(
                    Scenario::from_toml_str(&toml),
                    Err(ScenarioError::Curve(CurveError::InvalidOption { .. }))
                ),
                "{options}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_tiny_resolution() {
        for resolution in ["1e-300", "1e-6", "0.0"] {
            let toml = format!("chart = \"dex-only\"\nresolution_min = {resolution}\n");
            assert!(
                matches!(
                    Scenario::from_toml_str(&toml),
                    Err(ScenarioError::Curve(CurveError::InvalidAxis { .. }))
                ),
                "{resolution}"
            );
        }

        let mut scenario = Scenario::dex_only();
        scenario.resolution_min = 1e-300;
        assert!(scenario.chart().is_err());
    }

    #[test]
    fn test_mode_only_applies_outside_pk_vs_perceived() {
        assert!(Scenario::vyvanse_with_dex().uses_mode());
        assert!(Scenario::dex_only().uses_mode());

        let pk = Scenario::pk_vs_perceived().with_mode(EffectMode::Pk);
        let perceived = Scenario::pk_vs_perceived().with_mode(EffectMode::Perceived);
        assert!(!perceived.uses_mode());
        assert_eq!(pk.chart().unwrap().series, perceived.chart().unwrap().series);
    }
}
