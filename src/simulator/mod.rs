//! Curve generation: rate constants, the single-dose response and the
//! superposition composers built on top of it.

pub mod bateman;
pub mod rates;
pub mod schedule;

pub use bateman::{bateman, bateman_at};
pub use rates::{DrugProfile, EffectMode, RateConstants};
pub use schedule::{dose_curves, schedule_curve, stop_after_projections, total};
