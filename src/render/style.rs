use crate::scenario::{LineStyle, SeriesColor};

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const TOTAL: Color = Color::rgb(0x1f, 0x77, 0xb4);
pub const VYVANSE: Color = Color::rgb(0xff, 0x7f, 0x0e);
pub const NEUTRAL: Color = Color::rgb(0x7f, 0x7f, 0x7f);
pub const CAFFEINE: Color = Color::rgb(0x55, 0x55, 0x55);
pub const GRID: Color = Color::rgb(0xcc, 0xcc, 0xcc);
pub const TEXT: Color = Color::rgb(0x22, 0x22, 0x22);

/// Per-dose palette; never reuses the total or Vyvanse colours
pub const DOSE_PALETTE: [Color; 10] = [
    Color::rgb(0x94, 0x67, 0xbd),
    Color::rgb(0x2c, 0xa0, 0x2c),
    Color::rgb(0xd6, 0x27, 0x28),
    Color::rgb(0x8c, 0x56, 0x4b),
    Color::rgb(0xe3, 0x77, 0xc2),
    Color::rgb(0xbc, 0xbd, 0x22),
    Color::rgb(0x17, 0xbe, 0xcf),
    Color::rgb(0x93, 0x70, 0xdb),
    Color::rgb(0x8f, 0xbc, 0x8f),
    Color::rgb(0xff, 0xa0, 0x7a),
];

pub fn color_of(role: SeriesColor) -> Color {
    match role {
        SeriesColor::Total => TOTAL,
        SeriesColor::Vyvanse => VYVANSE,
        SeriesColor::Caffeine => CAFFEINE,
        SeriesColor::Neutral => NEUTRAL,
        SeriesColor::Dose(i) => DOSE_PALETTE[i % DOSE_PALETTE.len()],
    }
}

/// SVG `stroke-dasharray` for a line style, scaled by stroke width
pub fn dash_of(style: LineStyle, width: f64) -> Option<String> {
    let w = width.max(1.0);
    match style {
        LineStyle::Solid => None,
        LineStyle::Dashed => Some(format!("{:.1} {:.1}", 3.7 * w, 1.6 * w)),
        LineStyle::Dotted => Some(format!("{:.1} {:.1}", w, 1.65 * w)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dose_colors_avoid_reserved() {
        for i in 0..25 {
            let c = color_of(SeriesColor::Dose(i));
            assert_ne!(c, TOTAL);
            assert_ne!(c, VYVANSE);
        }
        assert_eq!(TOTAL.to_hex(), "#1f77b4");
    }
}
