use crate::plot::PlotError;
use crate::plot::axis::{LinearScale, nice_ticks, tick_label};
use crate::plot::svg::{Anchor, SvgDoc};

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN: f64 = 90.0;
const LINE_COLOR: &str = "#1f77b4";

/// Single-series line chart with circle markers.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
}

impl LinePlot {
    pub fn to_svg(&self) -> Result<String, PlotError> {
        if self.points.is_empty() || self.points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(PlotError::NoData(self.title.clone()));
        }
        let (x_lo, x_hi) = bounds(self.points.iter().map(|p| p.0));
        let (y_lo, y_hi) = bounds(self.points.iter().map(|p| p.1));
        let pad = ((y_hi - y_lo).abs() * 0.05).max(f64::EPSILON);

        let left = MARGIN;
        let right = WIDTH - 40.0;
        let top = 60.0;
        let bottom = HEIGHT - 70.0;
        let xs = LinearScale::new((x_lo - 0.5, x_hi + 0.5), (left, right));
        let ys = LinearScale::new((y_lo - pad, y_hi + pad), (bottom, top));

        let mut doc = SvgDoc::new(WIDTH, HEIGHT);
        let (d0, d1) = ys.domain();
        for t in nice_ticks(d0, d1, 6) {
            let y = ys.map(t);
            doc.dashed_line(left, y, right, y, "#dddddd");
            doc.text(left - 8.0, y + 4.0, &tick_label(t), 12.0, Anchor::End);
        }
        for &(x, _) in &self.points {
            let px = xs.map(x);
            doc.dashed_line(px, top, px, bottom, "#eeeeee");
            doc.text(px, bottom + 20.0, &tick_label(x), 12.0, Anchor::Middle);
        }
        doc.rect(left, top, right - left, bottom - top, "none", Some("black"));

        let pixels: Vec<(f64, f64)> = self.points.iter().map(|&(x, y)| (xs.map(x), ys.map(y))).collect();
        doc.polyline(&pixels, LINE_COLOR, 2.0);
        for &(px, py) in &pixels {
            doc.circle(px, py, 4.5, LINE_COLOR, LINE_COLOR);
        }

        doc.text(WIDTH / 2.0, 35.0, &self.title, 18.0, Anchor::Middle);
        doc.text((left + right) / 2.0, HEIGHT - 20.0, &self.x_label, 14.0, Anchor::Middle);
        doc.vertical_text(25.0, (top + bottom) / 2.0, &self.y_label, 14.0);
        Ok(doc.finish())
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
