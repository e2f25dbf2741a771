use std::fmt::Write as FmtWrite;

use crate::render::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(&self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// Stroke settings for lines and polylines
#[derive(Debug, Clone)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub dash: Option<String>,
    pub opacity: f64,
}

impl Stroke {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
            opacity: 1.0,
        }
    }

    pub fn with_dash(mut self, dash: Option<String>) -> Self {
        self.dash = dash;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone)]
enum Element {
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Color,
        stroke: Option<Color>,
        opacity: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
        clip: Option<usize>,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        stroke: Stroke,
        clip: Option<usize>,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        size: f64,
        color: Color,
        anchor: Anchor,
        rotate: Option<f64>,
    },
}

/// Immediate-mode SVG canvas, coordinates in pixels from the top left
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    elements: Vec<Element>,
    clips: Vec<(f64, f64, f64, f64)>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
            clips: Vec::new(),
        }
    }

    /// Semi-transparent filled rectangle, used behind the legend
    pub fn panel(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Color, opacity: f64) {
        self.elements.push(Element::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke: Some(Color::rgb(0xcc, 0xcc, 0xcc)),
            opacity,
        });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &Stroke) {
        self.push_line((x1, y1), (x2, y2), stroke, None);
    }

    /// A line confined to the clip rectangle `clip`
    pub fn clipped_line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &Stroke, clip: usize) {
        self.push_line(from, to, stroke, Some(clip));
    }

    fn push_line(
        &mut self,
        from: (f64, f64),
        to: (f64, f64),
        stroke: &Stroke,
        clip: Option<usize>,
    ) {
        self.elements.push(Element::Line {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
            stroke: stroke.clone(),
            clip,
        });
    }

    /// Register a clip rectangle and return its id
    pub fn clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> usize {
        self.clips.push((x, y, w, h));
        self.clips.len() - 1
    }

    pub fn polyline(&mut self, points: Vec<(f64, f64)>, stroke: &Stroke, clip: Option<usize>) {
        if points.len() < 2 {
            return;
        }
        self.elements.push(Element::Polyline {
            points,
            stroke: stroke.clone(),
            clip,
        });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, size: f64, color: Color, anchor: Anchor) {
        self.elements.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            size,
            color,
            anchor,
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, size: f64, color: Color) {
        self.elements.push(Element::Text {
            x,
            y,
            content: content.to_string(),
            size,
            color,
            anchor: Anchor::Middle,
            rotate: Some(-90.0),
        });
    }

    /// Serialize the canvas as a standalone SVG document
    pub fn finish_svg(&self) -> String {
        let mut out = String::with_capacity(64 * 1024);
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        if !self.clips.is_empty() {
            out.push_str("<defs>\n");
            for (i, (x, y, w, h)) in self.clips.iter().enumerate() {
                let _ = writeln!(
                    out,
                    r#"<clipPath id="clip{i}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" /></clipPath>"#
                );
            }
            out.push_str("</defs>\n");
        }
        let _ = writeln!(
            out,
            r#"<rect width="{}" height="{}" fill="white" />"#,
            self.width, self.height
        );
        for element in &self.elements {
            render_element(&mut out, element);
        }
        out.push_str("</svg>\n");
        out
    }
}

fn render_element(out: &mut String, element: &Element) {
    match element {
        Element::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
            opacity,
        } => {
            let _ = write!(
                out,
                r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{}""#,
                fill.to_hex()
            );
            if let Some(stroke) = stroke {
                let _ = write!(out, r#" stroke="{}" stroke-width="1""#, stroke.to_hex());
            }
            if (opacity - 1.0).abs() > 1e-4 {
                let _ = write!(out, r#" fill-opacity="{opacity:.3}""#);
            }
            out.push_str(" />\n");
        }
        Element::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            clip,
        } => {
            let _ = write!(
                out,
                r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#
            );
            write_stroke(out, stroke);
            write_clip(out, *clip);
            out.push_str(" />\n");
        }
        Element::Polyline {
            points,
            stroke,
            clip,
        } => {
            out.push_str(r#"<polyline points=""#);
            for (i, (x, y)) in points.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{x:.2},{y:.2}");
            }
            out.push_str(r#"" fill="none" stroke-linejoin="round""#);
            write_stroke(out, stroke);
            write_clip(out, *clip);
            out.push_str(" />\n");
        }
        Element::Text {
            x,
            y,
            content,
            size,
            color,
            anchor,
            rotate,
        } => {
            let _ = write!(
                out,
                r#"<text x="{x:.2}" y="{y:.2}" font-family="DejaVu Sans, sans-serif" font-size="{size:.1}" fill="{}" text-anchor="{}""#,
                color.to_hex(),
                anchor.as_str()
            );
            if let Some(angle) = rotate {
                let _ = write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#);
            }
            out.push('>');
            out.push_str(&escape(content));
            out.push_str("</text>\n");
        }
    }
}

fn write_stroke(out: &mut String, stroke: &Stroke) {
    let _ = write!(
        out,
        r#" stroke="{}" stroke-width="{:.2}""#,
        stroke.color.to_hex(),
        stroke.width
    );
    if let Some(dash) = &stroke.dash {
        let _ = write!(out, r#" stroke-dasharray="{dash}""#);
    }
    if (stroke.opacity - 1.0).abs() > 1e-4 {
        let _ = write!(out, r#" stroke-opacity="{:.3}""#, stroke.opacity);
    }
}

fn write_clip(out: &mut String, clip: Option<usize>) {
    if let Some(id) = clip {
        let _ = write!(out, r#" clip-path="url(#clip{id})""#);
    }
}

fn escape(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for ch in content.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_canvas() {
        let svg = Canvas::new(100.0, 50.0).finish_svg();
        assert!(svg.contains("width=\"100\""));
        assert!(svg.contains("height=\"50\""));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut canvas = Canvas::new(200.0, 100.0);
        canvas.text(10.0, 20.0, "Dex <5mg> & more", 10.0, Color::rgb(0, 0, 0), Anchor::Start);
        let svg = canvas.finish_svg();
        assert!(svg.contains("Dex &lt;5mg&gt; &amp; more"));
    }

    #[test]
    fn test_short_polyline_is_dropped() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let stroke = Stroke::solid(Color::rgb(0, 0, 0), 1.0);
        canvas.polyline(vec![(1.0, 1.0)], &stroke, None);
        assert!(!canvas.finish_svg().contains("polyline"));
        canvas.polyline(vec![(1.0, 1.0), (2.0, 2.0)], &stroke.with_dash(Some("2 2".into())), None);
        let svg = canvas.finish_svg();
        assert!(svg.contains(r#"points="1.00,1.00 2.00,2.00""#));
        assert!(svg.contains(r#"stroke-dasharray="2 2""#));
    }
}
