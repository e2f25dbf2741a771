//! Approximate one-compartment PK curves for stimulant dosing schedules.
//!
//! The crate is organised bottom-up:
//!
//! - [data]: time axes, dose schedules and sampled curves
//! - [simulator]: the Bateman single-dose response and schedule superposition
//! - [perceived]: perceived effect from PK via a biexponential kernel
//! - [report]: target-time sampling and labels
//! - [scenario]: named charts built from TOML-configurable scenarios
//! - [render]: SVG and CSV output
//!
//! Curves are plain data; every composer returns a fresh [Curve](data::Curve).

pub mod data;
pub mod error;
pub mod perceived;
pub mod render;
pub mod report;
pub mod scenario;
pub mod simulator;

pub use error::{CurveError, ScenarioError};
pub use render::RenderError;

pub mod prelude {
    pub use crate::data::conversions::{
        aeropress_scoops_to_caffeine_mg, grams_to_caffeine_mg, shots_to_caffeine_mg,
        vyvanse_cap_to_dex_eq, vyvanse_dex_eq_to_capsule_mg,
    };
    pub use crate::data::{split_dose, Curve, DoseEvent, Schedule, ScheduleBuilder, TimeAxis};
    pub use crate::perceived::{perceive, perceive_each, perceive_sum, Kernel, PerceivedOptions};
    pub use crate::render::{render_svg, save_svg, write_csv, RenderConfig, SaveOptions};
    pub use crate::report::{sample_targets, TargetSample, TargetTime};
    pub use crate::scenario::{Chart, ChartKind, Scenario, Series};
    pub use crate::simulator::{
        bateman, dose_curves, schedule_curve, stop_after_projections, total, DrugProfile,
        EffectMode, RateConstants,
    };
    pub use crate::{CurveError, RenderError, ScenarioError};
}
