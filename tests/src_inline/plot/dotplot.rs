use super::*;
use crate::model::frame::Observation;

fn obs(id: &str, primary: &str, secondary: Option<&str>, value: f64) -> Observation {
    Observation {
        animal_id: id.to_string(),
        primary: primary.to_string(),
        secondary: secondary.map(str::to_string),
        value,
    }
}

fn frame(secondary: Option<Factor>, observations: Vec<Observation>) -> MetricFrame {
    let mut primary_levels: Vec<String> = observations.iter().map(|o| o.primary.clone()).collect();
    primary_levels.sort();
    primary_levels.dedup();
    let mut secondary_levels: Vec<String> = observations.iter().filter_map(|o| o.secondary.clone()).collect();
    secondary_levels.sort();
    secondary_levels.dedup();
    MetricFrame {
        metric: "Mean Freq/kHz".to_string(),
        primary: Factor::Sex,
        secondary,
        observations,
        primary_levels,
        secondary_levels,
        dropped: 0,
    }
}

fn by_sex() -> MetricFrame {
    frame(
        None,
        vec![
            obs("a1", "Females", None, 1.0),
            obs("a2", "Females", None, 3.0),
            obs("a3", "Males", None, 5.0),
            obs("a4", "Males", None, 7.0),
        ],
    )
}

fn by_sex_and_time() -> MetricFrame {
    frame(
        Some(Factor::Timepoint),
        vec![
            obs("a1", "Females", Some("P4"), 1.0),
            obs("a2", "Females", Some("P4"), 3.0),
            obs("a3", "Females", Some("P6"), 2.0),
            obs("a4", "Females", Some("P6"), 4.0),
            obs("a5", "Males", Some("P4"), 5.0),
            obs("a6", "Males", Some("P4"), 7.0),
            obs("a7", "Males", Some("P6"), 6.0),
            obs("a8", "Males", Some("P6"), 8.0),
        ],
    )
}

#[test]
fn stem_sanitises_metric_name() {
    assert_eq!(plot_stem(&by_sex()), "Mean_Freq_kHz_by_Sex_mean_sd_plot");
    assert_eq!(
        plot_stem(&by_sex_and_time()),
        "Mean_Freq_kHz_by_Sex_Timepoint_mean_sd_plot"
    );
}

#[test]
fn bars_stack_shortest_span_first() {
    let anchors = vec![
        BarAnchor { x1: 0.0, top1: Some(10.0), x2: 2.0, top2: Some(8.0), label: "**" },
        BarAnchor { x1: 0.0, top1: Some(10.0), x2: 1.0, top2: Some(10.0), label: "*" },
    ];
    let (bars, top) = stack_bars(anchors, 10.0, 0.0);
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].label, "*");
    assert!((bars[0].y - 11.3).abs() < 1e-9);
    assert!((bars[1].y - 11.6).abs() < 1e-9);
    assert!((bars[1].label_y - 11.75).abs() < 1e-9);
    assert!((top.expect("top") - 12.1).abs() < 1e-9);
}

#[test]
fn bar_clears_its_own_groups() {
    let anchors = vec![BarAnchor { x1: 0.0, top1: Some(20.0), x2: 1.0, top2: None, label: "***" }];
    let (bars, _) = stack_bars(anchors, 10.0, 0.0);
    assert!((bars[0].y - 20.5).abs() < 1e-9);
    assert_eq!(stack_bars(Vec::new(), 10.0, 0.0), (Vec::new(), None));
}

#[test]
fn single_factor_plot_is_black_and_skips_cells() {
    let settings = Settings::default();
    let annotations = vec![
        Annotation::new(
            GroupKey::level(Factor::Sex, "Females"),
            GroupKey::level(Factor::Sex, "Males"),
            0.01,
        ),
        Annotation::new(GroupKey::cell("Females", "P4"), GroupKey::cell("Males", "P4"), 0.01),
    ];
    let plot = build_dot_plot(&by_sex(), &annotations, &settings).expect("plot");
    assert_eq!(plot.title, "Mean Freq/kHz by Sex");
    assert_eq!(plot.points.len(), 2);
    assert!(plot.points.iter().all(|p| p.color == "black"));
    assert!((plot.points[1].mean - 6.0).abs() < 1e-12);
    assert_eq!(plot.bars.len(), 1);
    assert_eq!(plot.skipped.len(), 1);
    let svg = plot.to_svg();
    assert!(svg.contains("Mean Freq/kHz by Sex"));
    assert!(svg.contains("Mean \u{b1} SD"));
}

#[test]
fn two_factor_plot_dodges_hues_and_maps_primary_levels() {
    let settings = Settings::default();
    let annotations = vec![
        Annotation::new(
            GroupKey::level(Factor::Sex, "Females"),
            GroupKey::level(Factor::Sex, "Males"),
            0.0001,
        ),
        Annotation::new(
            GroupKey::level(Factor::Timepoint, "P4"),
            GroupKey::level(Factor::Timepoint, "P6"),
            0.001,
        ),
        Annotation::new(GroupKey::cell("Males", "P4"), GroupKey::cell("Males", "P6"), 0.04),
    ];
    let plot = build_dot_plot(&by_sex_and_time(), &annotations, &settings).expect("plot");
    assert_eq!(plot.title, "Mean Freq/kHz by Sex and Timepoint");
    assert_eq!(plot.points.len(), 4);
    assert!((plot.points[0].x + 0.3).abs() < 1e-12);
    assert!((plot.points[3].x - 1.3).abs() < 1e-12);
    assert_eq!(plot.legend_title, "Timepoint");
    assert_eq!(plot.legend.len(), 2);
    assert_eq!(plot.bars.len(), 2);
    assert_eq!(plot.skipped.len(), 1);
    let centre = plot.bars.iter().find(|b| b.label == "***").expect("main effect bar");
    assert_eq!((centre.x1, centre.x2), (0.0, 1.0));
}

#[test]
fn sex_hue_uses_configured_colours() {
    let settings = Settings::default();
    let mut f = by_sex_and_time();
    f.primary = Factor::Timepoint;
    f.secondary = Some(Factor::Sex);
    for o in &mut f.observations {
        let tp = o.secondary.take().expect("timepoint");
        o.secondary = Some(std::mem::replace(&mut o.primary, tp));
    }
    f.primary_levels = vec!["P4".to_string(), "P6".to_string()];
    f.secondary_levels = vec!["Females".to_string(), "Males".to_string()];
    let plot = build_dot_plot(&f, &[], &settings).expect("plot");
    assert_eq!(plot.legend[0], ("Females".to_string(), "pink".to_string()));
    assert_eq!(plot.legend[1], ("Males".to_string(), "blue".to_string()));
}

#[test]
fn empty_frame_is_an_error() {
    let settings = Settings::default();
    let empty = frame(None, Vec::new());
    assert!(matches!(
        build_dot_plot(&empty, &[], &settings),
        Err(PlotError::NoData(_))
    ));
}

#[test]
fn zero_sd_groups_draw_no_error_bars() {
    let settings = Settings::default();
    let flat = frame(
        None,
        vec![
            obs("a1", "Females", None, 0.0),
            obs("a2", "Females", None, 0.0),
            obs("a3", "Males", None, 0.0),
            obs("a4", "Males", None, 0.0),
        ],
    );
    let mut plot = build_dot_plot(&flat, &[], &settings).expect("plot");
    assert!(plot.points.iter().all(|p| p.sd == 0.0));
    let without = plot.to_svg().matches("<line").count();

    for p in &mut plot.points {
        p.sd = 1.0;
    }
    let with = plot.to_svg().matches("<line").count();
    assert_eq!(with - without, 3 * plot.points.len());
}
