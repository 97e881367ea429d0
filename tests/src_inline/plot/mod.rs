use super::*;
use crate::plot::line::LinePlot;
use crate::plot::svg::{Anchor, SvgDoc};
use tempfile::tempdir;

#[test]
fn writes_svg_and_png() {
    let dir = tempdir().expect("tempdir");
    let mut doc = SvgDoc::new(40.0, 20.0);
    doc.text(5.0, 15.0, "x", 10.0, Anchor::Start);
    doc.rect(2.0, 2.0, 10.0, 10.0, "blue", None);
    let files = write_plot(&doc.finish(), &dir.path().join("plots"), "demo").expect("plot");
    assert!(files.svg.ends_with("plots/demo.svg"));
    let png = std::fs::read(&files.png).expect("png");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn png_is_rendered_at_three_times_the_svg_size() {
    let svg = SvgDoc::new(40.0, 20.0).finish();
    let png = raster::svg_to_png(&svg, PNG_SCALE).expect("png");
    let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    assert_eq!((width, height), (120, 60));
}

#[test]
fn malformed_svg_is_reported() {
    assert!(matches!(
        raster::svg_to_png("<svg", PNG_SCALE),
        Err(PlotError::Svg(_))
    ));
}

#[test]
fn line_plot_needs_finite_points() {
    let plot = LinePlot {
        title: "Estimated Savings Over 10 Years".to_string(),
        x_label: "Year".to_string(),
        y_label: "Savings".to_string(),
        points: (1..=10).map(|y| (y as f64, 100.0 * y as f64)).collect(),
    };
    let svg = plot.to_svg().expect("svg");
    assert!(svg.contains("Estimated Savings Over 10 Years"));
    assert_eq!(svg.matches("<circle").count(), 10);

    let broken = LinePlot { points: vec![(1.0, f64::NAN)], ..plot };
    assert!(matches!(broken.to_svg(), Err(PlotError::NoData(_))));
}
