use thiserror::Error;

/// Errors raised while building axes, schedules and curves
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Rate constants must be finite, positive and distinct
    #[error("Invalid rate constants: ka = {ka}, ke = {ke} ({reason})")]
    InvalidRates { ka: f64, ke: f64, reason: String },

    /// Dose amount must be positive and the dose time non-negative
    #[error("Invalid dose: {amount} at t = {time}")]
    InvalidDose { time: f64, amount: f64 },

    /// Time axis needs end > start and at least two samples
    #[error("Invalid time axis: [{start}, {end}] with {samples} samples")]
    InvalidAxis { start: f64, end: f64, samples: usize },

    /// Curves were combined on different time axes
    #[error("Time axis mismatch: {description}")]
    AxisMismatch { description: String },

    /// Curve samples are unordered, non-finite or negative
    #[error("Invalid curve: {description}")]
    InvalidCurve { description: String },

    /// An operation needed at least one curve
    #[error("No curves to combine")]
    Empty,

    /// Kernel time constants or gain are unusable
    #[error("Invalid kernel parameter: {param} = {value}")]
    InvalidKernel { param: String, value: f64 },

    /// Perceived-effect scaling options are out of range
    #[error("Invalid perceived option: {param} = {value}")]
    InvalidOption { param: String, value: f64 },
}

/// Errors raised while loading a scenario file
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown chart `{0}`, expected one of vyvanse-with-dex, dex-only, pk-vs-perceived")]
    UnknownChart(String),

    #[error(transparent)]
    Curve(#[from] CurveError),
}
