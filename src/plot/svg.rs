//! Minimal SVG document builder.

use std::fmt::Write as _;

pub const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SvgDoc {
    width: f64,
    height: f64,
    body: String,
}

impl SvgDoc {
    pub fn new(width: f64, height: f64) -> Self {
        let mut doc = Self {
            width,
            height,
            body: String::new(),
        };
        doc.rect(0.0, 0.0, width, height, "white", None);
        doc
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: Option<&str>) {
        let _ = write!(
            self.body,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"",
            x,
            y,
            w,
            h,
            escape(fill)
        );
        if let Some(stroke) = stroke {
            let _ = write!(self.body, " stroke=\"{}\" stroke-width=\"1\"", escape(stroke));
        }
        self.body.push_str("/>\n");
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        let _ = writeln!(
            self.body,
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{}\" stroke-width=\"{width}\"/>",
            escape(stroke)
        );
    }

    pub fn dashed_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) {
        let _ = writeln!(
            self.body,
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"{}\" stroke-width=\"1\" stroke-dasharray=\"4 3\"/>",
            escape(stroke)
        );
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, width: f64) {
        if points.len() < 2 {
            return;
        }
        let coords = points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            self.body,
            "<polyline points=\"{coords}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\"/>",
            escape(stroke)
        );
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str, stroke: &str) {
        let _ = writeln!(
            self.body,
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            escape(fill),
            escape(stroke)
        );
    }

    /// Diamond marker centred at `(cx, cy)` with half-diagonal `r`.
    pub fn diamond(&mut self, cx: f64, cy: f64, r: f64, fill: &str, stroke: &str) {
        let _ = writeln!(
            self.body,
            "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            cx,
            cy - r,
            cx + r,
            cy,
            cx,
            cy + r,
            cx - r,
            cy,
            escape(fill),
            escape(stroke)
        );
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, size: f64, anchor: Anchor) {
        let _ = writeln!(
            self.body,
            "<text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"{FONT_FAMILY}\" font-size=\"{size}\" text-anchor=\"{}\" fill=\"black\">{}</text>",
            anchor.as_str(),
            escape(content)
        );
    }

    /// Text rotated 90 degrees counter-clockwise around its anchor point.
    pub fn vertical_text(&mut self, x: f64, y: f64, content: &str, size: f64) {
        let _ = writeln!(
            self.body,
            "<text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"{FONT_FAMILY}\" font-size=\"{size}\" text-anchor=\"middle\" fill=\"black\" transform=\"rotate(-90 {x:.2} {y:.2})\">{}</text>",
            escape(content)
        );
    }

    pub fn finish(self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{}</svg>\n",
            self.body,
            w = self.width,
            h = self.height
        )
    }
}

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
#[path = "../../tests/src_inline/plot/svg.rs"]
mod tests;
