//! Mean ± SD dot plot with stacked significance bars.

use crate::config::Settings;
use crate::model::dataset::Factor;
use crate::model::frame::MetricFrame;
use crate::model::results::{Annotation, GroupKey};
use crate::plot::PlotError;
use crate::plot::axis::{LinearScale, nice_ticks, tick_label};
use crate::plot::palette::{FALLBACK_COLOR, viridis};
use crate::plot::svg::{Anchor, SvgDoc};
use crate::stats::descriptive::{mean, std_dev};

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 700.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 190.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 80.0;
const DODGE: f64 = 0.6;

/// One plotted group: a diamond at the mean with an SD bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPoint {
    pub key: GroupKey,
    pub x: f64,
    pub mean: f64,
    pub sd: f64,
    pub color: String,
}

impl PlotPoint {
    fn upper(&self) -> Option<f64> {
        let u = self.mean + self.sd;
        u.is_finite().then_some(u)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SigBar {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
    pub height: f64,
    pub label: &'static str,
    pub label_y: f64,
}

/// Bar request: both ends with the mean+SD they must clear.
#[derive(Debug, Clone, PartialEq)]
pub struct BarAnchor {
    pub x1: f64,
    pub top1: Option<f64>,
    pub x2: f64,
    pub top2: Option<f64>,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct DotPlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub ticks: Vec<String>,
    pub points: Vec<PlotPoint>,
    pub legend_title: String,
    pub legend: Vec<(String, String)>,
    pub bars: Vec<SigBar>,
    /// Annotations with a side that has no plotted position.
    pub skipped: Vec<Annotation>,
    y_lo: f64,
    y_hi: f64,
}

/// File stem `<metric>_by_<primary>[_<secondary>]_mean_sd_plot`.
pub fn plot_stem(frame: &MetricFrame) -> String {
    let mut stem = format!("{}_by_{}", frame.metric, frame.primary.name());
    if let Some(s) = frame.secondary {
        stem.push('_');
        stem.push_str(s.name());
    }
    stem.push_str("_mean_sd_plot");
    stem.replace([' ', '/'], "_")
}

pub fn build_dot_plot(
    frame: &MetricFrame,
    annotations: &[Annotation],
    settings: &Settings,
) -> Result<DotPlot, PlotError> {
    if frame.is_empty() {
        return Err(PlotError::NoData(frame.metric.clone()));
    }
    let points = layout_points(frame, settings);

    let mut anchors = Vec::new();
    let mut skipped = Vec::new();
    for ann in annotations {
        match (resolve(frame, &points, &ann.a), resolve(frame, &points, &ann.b)) {
            (Some((x1, top1)), Some((x2, top2))) => anchors.push(BarAnchor {
                x1,
                top1,
                x2,
                top2,
                label: ann.label,
            }),
            _ => skipped.push(ann.clone()),
        }
    }

    let data_min = frame
        .observations
        .iter()
        .map(|o| o.value)
        .fold(f64::INFINITY, f64::min);
    let data_max = frame
        .observations
        .iter()
        .map(|o| o.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_max = points
        .iter()
        .filter_map(PlotPoint::upper)
        .reduce(f64::max)
        .unwrap_or(data_max);
    let (bars, bars_top) = stack_bars(anchors, y_max, data_min);

    let y_lo = points
        .iter()
        .map(|p| if p.sd.is_finite() { p.mean - p.sd } else { p.mean })
        .fold(f64::INFINITY, f64::min);
    let y_hi = bars_top.unwrap_or(y_max).max(y_max);

    let mut title = format!("{} by {}", frame.metric, frame.primary.name());
    let (legend_title, legend) = match frame.secondary {
        Some(s) => {
            title.push_str(&format!(" and {}", s.name()));
            let colors = hue_colors(s, &frame.secondary_levels, settings);
            (
                s.name().to_string(),
                frame.secondary_levels.iter().cloned().zip(colors).collect(),
            )
        }
        None => (
            "Legend".to_string(),
            vec![("Mean \u{b1} SD".to_string(), "black".to_string())],
        ),
    };

    Ok(DotPlot {
        title,
        x_label: frame.primary.name().to_string(),
        y_label: frame.metric.clone(),
        ticks: frame.primary_levels.clone(),
        points,
        legend_title,
        legend,
        bars,
        skipped,
        y_lo,
        y_hi,
    })
}

fn hue_colors(factor: Factor, levels: &[String], settings: &Settings) -> Vec<String> {
    match factor {
        Factor::Sex | Factor::Genotype => levels
            .iter()
            .map(|l| settings.color_for(factor, l).unwrap_or(FALLBACK_COLOR).to_string())
            .collect(),
        Factor::Timepoint => viridis(levels.len()),
    }
}

fn layout_points(frame: &MetricFrame, settings: &Settings) -> Vec<PlotPoint> {
    let mut points = Vec::new();
    match frame.secondary {
        None => {
            for (i, level) in frame.primary_levels.iter().enumerate() {
                let values = frame.values_at(frame.primary, level);
                if values.is_empty() {
                    continue;
                }
                points.push(PlotPoint {
                    key: GroupKey::level(frame.primary, level.as_str()),
                    x: i as f64,
                    mean: mean(&values),
                    sd: std_dev(&values),
                    color: "black".to_string(),
                });
            }
        }
        Some(secondary) => {
            let n = frame.secondary_levels.len();
            let colors = hue_colors(secondary, &frame.secondary_levels, settings);
            for (i, p) in frame.primary_levels.iter().enumerate() {
                for (j, s) in frame.secondary_levels.iter().enumerate() {
                    let values = frame.cell_values(p, s);
                    if values.is_empty() {
                        continue;
                    }
                    let offset = if n > 1 {
                        -DODGE / 2.0 + DODGE * j as f64 / (n - 1) as f64
                    } else {
                        0.0
                    };
                    points.push(PlotPoint {
                        key: GroupKey::cell(p.as_str(), s.as_str()),
                        x: i as f64 + offset,
                        mean: mean(&values),
                        sd: std_dev(&values),
                        color: colors[j].clone(),
                    });
                }
            }
        }
    }
    points
}

/// x position and mean+SD of an annotation side, if it is plotted.
fn resolve(frame: &MetricFrame, points: &[PlotPoint], key: &GroupKey) -> Option<(f64, Option<f64>)> {
    if let Some(point) = points.iter().find(|p| &p.key == key) {
        return Some((point.x, point.upper()));
    }
    match key {
        GroupKey::Level { factor, level } if frame.secondary.is_some() && *factor == frame.primary => {
            let i = frame.primary_levels.iter().position(|l| l == level)?;
            let values = frame.values_at(frame.primary, level);
            if values.is_empty() {
                return None;
            }
            let upper = mean(&values) + std_dev(&values);
            Some((i as f64, upper.is_finite().then_some(upper)))
        }
        _ => None,
    }
}

/// Stacks bars upward, shortest spans first. Returns the bars and the
/// highest y they need, if any.
pub fn stack_bars(mut anchors: Vec<BarAnchor>, y_max: f64, y_min: f64) -> (Vec<SigBar>, Option<f64>) {
    if anchors.is_empty() {
        return (Vec::new(), None);
    }
    let mut range = y_max - y_min;
    if !range.is_finite() || range == 0.0 {
        range = if y_max != 0.0 && y_max.is_finite() { y_max.abs() * 0.2 } else { 1.0 };
    }
    anchors.sort_by(|a, b| (a.x1 - a.x2).abs().total_cmp(&(b.x1 - b.x2).abs()));

    let mut current = y_max + range * 0.1;
    let mut bars = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        let y1 = anchor.top1.unwrap_or(y_max);
        let y2 = anchor.top2.unwrap_or(y_max);
        let potential = y1.max(y2) + range * 0.05;
        current = (current + range * 0.03).max(potential);
        bars.push(SigBar {
            x1: anchor.x1,
            x2: anchor.x2,
            y: current,
            height: range * 0.01,
            label: anchor.label,
            label_y: current + range * 0.015,
        });
    }
    (bars, Some(current + range * 0.05))
}

impl DotPlot {
    pub fn to_svg(&self) -> String {
        let mut doc = SvgDoc::new(WIDTH, HEIGHT);
        let left = MARGIN_LEFT;
        let right = WIDTH - MARGIN_RIGHT;
        let top = MARGIN_TOP;
        let bottom = HEIGHT - MARGIN_BOTTOM;

        let pad = ((self.y_hi - self.y_lo).abs() * 0.05).max(f64::EPSILON);
        let ys = LinearScale::new((self.y_lo - pad, self.y_hi + pad), (bottom, top));
        let xs = LinearScale::new(
            (-0.5, self.ticks.len().max(1) as f64 - 0.5),
            (left, right),
        );

        let (d0, d1) = ys.domain();
        for t in nice_ticks(d0, d1, 6) {
            let y = ys.map(t);
            doc.dashed_line(left, y, right, y, "#dddddd");
            doc.line(left - 5.0, y, left, y, "black", 1.0);
            doc.text(left - 8.0, y + 4.0, &tick_label(t), 12.0, Anchor::End);
        }
        for (i, label) in self.ticks.iter().enumerate() {
            let x = xs.map(i as f64);
            doc.line(x, bottom, x, bottom + 5.0, "black", 1.0);
            doc.text(x, bottom + 22.0, label, 12.0, Anchor::Middle);
        }
        doc.rect(left, top, right - left, bottom - top, "none", Some("black"));

        for p in &self.points {
            let x = xs.map(p.x);
            if p.sd.is_finite() && p.sd > 0.0 {
                let (lo, hi) = (ys.map(p.mean - p.sd), ys.map(p.mean + p.sd));
                doc.line(x, lo, x, hi, &p.color, 1.5);
                doc.line(x - 8.0, lo, x + 8.0, lo, &p.color, 1.5);
                doc.line(x - 8.0, hi, x + 8.0, hi, &p.color, 1.5);
            }
            doc.diamond(x, ys.map(p.mean), 7.0, &p.color, "black");
        }

        for bar in &self.bars {
            let (x1, x2) = (xs.map(bar.x1), xs.map(bar.x2));
            let (y0, y1) = (ys.map(bar.y), ys.map(bar.y + bar.height));
            doc.polyline(&[(x1, y0), (x1, y1), (x2, y1), (x2, y0)], "black", 1.5);
            doc.text((x1 + x2) / 2.0, ys.map(bar.label_y), bar.label, 14.0, Anchor::Middle);
        }

        doc.text(WIDTH / 2.0, top - 25.0, &self.title, 18.0, Anchor::Middle);
        doc.text((left + right) / 2.0, HEIGHT - 25.0, &self.x_label, 14.0, Anchor::Middle);
        doc.vertical_text(30.0, (top + bottom) / 2.0, &self.y_label, 14.0);

        let lx = right + 20.0;
        doc.text(lx, top + 10.0, &self.legend_title, 13.0, Anchor::Start);
        for (k, (label, color)) in self.legend.iter().enumerate() {
            let ly = top + 35.0 + k as f64 * 22.0;
            doc.diamond(lx + 8.0, ly - 4.0, 6.0, color, "black");
            doc.text(lx + 22.0, ly, label, 12.0, Anchor::Start);
        }
        doc.finish()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/plot/dotplot.rs"]
mod tests;
