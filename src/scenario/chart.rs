use serde::{Deserialize, Serialize};

use crate::data::Curve;
use crate::report::TargetSample;

/// Stroke pattern of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// Colour role of a series; the renderer maps roles onto a palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesColor {
    Total,
    Vyvanse,
    Caffeine,
    Neutral,
    /// The n-th dose of the per-dose palette
    Dose(usize),
}

/// One line on the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub curve: Curve,
    pub style: LineStyle,
    pub color: SeriesColor,
    pub width: f64,
    pub opacity: f64,
    /// Points before this time are not drawn
    pub visible_from: Option<f64>,
    /// Points below this value are not drawn
    pub floor: Option<f64>,
    /// Drawn against the secondary (caffeine) y axis
    pub secondary: bool,
}

impl Series {
    pub fn new(
        label: impl Into<String>,
        curve: Curve,
        style: LineStyle,
        color: SeriesColor,
    ) -> Self {
        Series {
            label: label.into(),
            curve,
            style,
            color,
            width: 1.5,
            opacity: 1.0,
            visible_from: None,
            floor: None,
            secondary: false,
        }
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn visible_from(mut self, time: Option<f64>) -> Self {
        self.visible_from = time;
        self
    }

    pub fn floor(mut self, floor: f64) -> Self {
        self.floor = (floor > 0.0).then_some(floor);
        self
    }

    pub fn secondary(mut self) -> Self {
        self.secondary = true;
        self
    }

    /// Whether the point `(time, value)` is drawn
    pub fn is_visible(&self, time: f64, value: f64) -> bool {
        self.visible_from.map_or(true, |from| time >= from)
            && self.floor.map_or(true, |floor| value >= floor)
            && value.is_finite()
    }

    /// Runs of consecutive visible points, one polyline each
    pub fn visible_segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (t, v) in self.curve.points() {
            if self.is_visible(t, v) {
                current.push((t, v));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Vertical marker at a dose time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseMarker {
    pub time: f64,
    pub color: SeriesColor,
}

/// Target samples of one curve, printed under a heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    pub title: String,
    pub samples: Vec<TargetSample>,
}

/// Computed chart data, ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_max: f64,
    /// Label and upper bound of the secondary axis, when any series uses it
    pub secondary_axis: Option<(String, f64)>,
    /// Drawn in order; legend follows `legend_order` when set
    pub series: Vec<Series>,
    /// Indices into `series` in legend order
    pub legend_order: Vec<usize>,
    pub markers: Vec<DoseMarker>,
    pub samples: Vec<SampleSet>,
    /// Suggested output file name
    pub file_name: String,
}

impl Chart {
    /// Series in legend order
    pub fn legend(&self) -> impl Iterator<Item = &Series> + '_ {
        self.legend_order.iter().filter_map(|&i| self.series.get(i))
    }

    /// Find a series by its label
    pub fn series_named(&self, label: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.label == label)
    }
}
