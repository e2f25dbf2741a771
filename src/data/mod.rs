pub mod axis;
pub mod conversions;
pub mod curve;
pub mod dose;

pub use axis::TimeAxis;
pub use curve::Curve;
pub use dose::{split_dose, DoseEvent, Schedule, ScheduleBuilder};
