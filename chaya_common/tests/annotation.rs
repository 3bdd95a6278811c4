use std::path::Path;

use chaya_common::annotator::{Annotator, TextSize};
use chaya_common::config::{AnalysisConfig, AnnotationConfig, DEFAULT_FONT_PATH};
use chaya_common::roi::centered_region;
use chaya_common::{Analyzer, ChannelOrder, Frame, FrameKind, Strength};

fn solid(width: u32, height: u32, px: [u8; 3], order: ChannelOrder) -> Frame {
    Frame::from_raw(width, height, px.repeat((width * height) as usize), order).unwrap()
}

/// Uses the system font when present so text rendering is exercised too.
fn annotator() -> Annotator {
    Annotator::from_font_file(Path::new(DEFAULT_FONT_PATH))
}

#[test]
fn annotation_leaves_the_input_untouched() {
    let frame = solid(320, 240, [30, 60, 90], ChannelOrder::Bgr);
    let snapshot = frame.pixels().as_raw().clone();
    let region = centered_region(320, 240, 100);

    let annotated =
        annotator().annotate(&frame, region, "Very strong", TextSize::Fixed { px: 32.0 });

    assert_eq!(frame.pixels().as_raw(), &snapshot);
    assert_ne!(annotated, frame);
    assert_eq!((annotated.width(), annotated.height()), (320, 240));
    assert_eq!(annotated.order(), ChannelOrder::Bgr);
}

#[test]
fn outline_is_drawn_in_green_on_region_bounds() {
    let frame = solid(200, 200, [0, 0, 0], ChannelOrder::Rgb);
    let region = centered_region(200, 200, 100);

    let annotated =
        Annotator::new(None).annotate(&frame, region, "Medium", TextSize::Fixed { px: 20.0 });
    let pixels = annotated.pixels();

    let corners = [
        (region.x1, region.y1),
        (region.x1 + 1, region.y1 + 1),
        (region.x2 - 1, region.y2 - 1),
    ];
    for (x, y) in corners {
        assert_eq!(pixels.get_pixel(x, y).0, [0, 255, 0], "({x}, {y})");
    }
    // Interior of the region stays as captured.
    assert_eq!(pixels.get_pixel(150, 150).0, [0, 0, 0]);
    assert_eq!(pixels.get_pixel(region.x1 + 2, region.y1 + 2).0, [0, 0, 0]);
}

#[test]
fn label_is_centered_and_caption_sits_above_the_region() {
    if !Path::new(DEFAULT_FONT_PATH).exists() {
        eprintln!("skipping: no font at {DEFAULT_FONT_PATH}");
        return;
    }
    let annotator = annotator();
    assert!(annotator.has_font());

    let (width, height) = (480, 360);
    let frame = solid(width, height, [0, 0, 0], ChannelOrder::Rgb);
    let region = centered_region(width, height, 100);
    let annotated = annotator.annotate(&frame, region, "Medium", TextSize::Fixed { px: 48.0 });

    // The label is the only grey ink; outline and caption are pure green.
    let (mut label_x, mut label_y) = ((u32::MAX, 0), (u32::MAX, 0));
    let mut caption_rows = (u32::MAX, 0);
    for (x, y, px) in annotated.pixels().enumerate_pixels() {
        let [r, g, b] = px.0;
        if r > 0 && r == g && g == b {
            label_x = (label_x.0.min(x), label_x.1.max(x));
            label_y = (label_y.0.min(y), label_y.1.max(y));
        } else if r == 0 && b == 0 && g > 0 && y < region.y1 {
            caption_rows = (caption_rows.0.min(y), caption_rows.1.max(y));
        }
    }

    assert!(label_x.0 < label_x.1, "no label drawn");
    let left = label_x.0 as i64;
    let right = (width - 1 - label_x.1) as i64;
    assert!((left - right).abs() <= 3, "label columns {label_x:?} not centered");

    assert!(caption_rows.0 <= caption_rows.1, "no caption drawn");
    // Outline rows start at y1, so green ink above them is all caption.
    assert!(caption_rows.1 + 2 < region.y1, "caption rows {caption_rows:?} touch the region");
    assert!(label_y.1 < caption_rows.0, "label rows {label_y:?} overlap the caption");
}

#[test]
fn outline_color_follows_channel_order() {
    // Green is its own BGR mirror; check a BGR frame still gets (0, 255, 0).
    let frame = solid(50, 50, [255, 0, 0], ChannelOrder::Bgr);
    let region = centered_region(50, 50, 20);
    let annotated =
        Annotator::new(None).annotate(&frame, region, "x", TextSize::Fixed { px: 12.0 });
    assert_eq!(annotated.pixels().get_pixel(region.x1, region.y1).0, [0, 255, 0]);
    assert_eq!(annotated.to_rgb_image().get_pixel(0, 0).0, [0, 0, 255]);
}

#[test]
fn analyzer_classifies_and_annotates_a_copy() {
    let annotation = AnnotationConfig {
        font_path: None,
        ..Default::default()
    };
    let analyzer = Analyzer::from_config(AnalysisConfig::default(), &annotation).unwrap();

    // RGB (110, 70, 30): brightness 210.
    let frame = solid(640, 480, [110, 70, 30], ChannelOrder::Rgb);
    let analysis = analyzer.analyze(&frame, FrameKind::Static);

    assert_eq!(analysis.strength, Strength::Medium);
    assert_eq!(analysis.brightness(), 210);
    assert_eq!(analysis.sample.rgb(), [110.0, 70.0, 30.0]);
    assert_eq!(analysis.region, centered_region(640, 480, 100));
    assert_eq!(frame, solid(640, 480, [110, 70, 30], ChannelOrder::Rgb));

    let summary = analysis.summary();
    assert_eq!(summary.label, "Medium");
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["strength"], "medium");
    assert_eq!(json["region"]["x1"], 270);
}

#[test]
fn bgr_and_rgb_views_of_the_same_cup_agree() {
    let annotation = AnnotationConfig {
        font_path: None,
        ..Default::default()
    };
    let analyzer = Analyzer::from_config(AnalysisConfig::default(), &annotation).unwrap();

    let rgb = solid(120, 120, [180, 120, 60], ChannelOrder::Rgb);
    let bgr = solid(120, 120, [60, 120, 180], ChannelOrder::Bgr);

    let a = analyzer.analyze(&rgb, FrameKind::Live);
    let b = analyzer.analyze(&bgr, FrameKind::Live);
    assert_eq!(a.sample.rgb(), b.sample.rgb());
    assert_eq!(a.strength, Strength::NotChai);
    assert_eq!(a.strength, b.strength);
    assert_eq!(a.annotated.to_rgb_image(), b.annotated.to_rgb_image());
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut config = AnalysisConfig::default();
    config.thresholds.medium_below = 100;
    assert!(Analyzer::from_config(config, &AnnotationConfig::default()).is_err());
}
