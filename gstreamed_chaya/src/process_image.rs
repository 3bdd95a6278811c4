use std::path::Path;

use anyhow::Context;
use chaya_common::{AnalysisSummary, Analyzer, DisplaySink, FrameKind, RatingResult};
use gemini_common::{Rater, VisionModel};
use serde::Serialize;

use crate::sink::SnapshotSink;
use crate::sources;
use crate::ModelMode;

/// Written next to the annotated image as `<stem>.out.json`.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub source: String,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub analysis: AnalysisSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<RatingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<String>,
}

/// Analyses one image (path or URL), optionally asks the model about it, and
/// writes `<stem>.out.jpg` and `<stem>.out.json` into `output_dir`.
pub fn process_image<M: VisionModel>(
    source: &str,
    analyzer: &Analyzer,
    model: Option<(&Rater<M>, ModelMode)>,
    output_dir: &Path,
) -> anyhow::Result<AnalysisReport> {
    let frame = sources::load_frame(source)?;
    let (width, height) = (frame.width(), frame.height());

    let stem = sources::output_stem(source);
    let img_output_path = output_dir.join(format!("{stem}.out.jpg"));
    let mut sink = SnapshotSink::new(&img_output_path);

    let analysis = analyzer.analyze(&frame, FrameKind::Static);
    sink.show_analysis(&analysis);
    let summary = analysis.summary();
    println!(
        "{source}: {} (brightness {}, region {}x{} at {},{})",
        summary.label,
        summary.brightness,
        analysis.region.width(),
        analysis.region.height(),
        analysis.region.x1,
        analysis.region.y1,
    );

    let mut report = AnalysisReport {
        source: source.to_string(),
        width,
        height,
        analysis: summary,
        rating: None,
        detection: None,
    };

    if let Some((rater, mode)) = model {
        match mode {
            ModelMode::Rate => {
                let rating = rater.rate_or_degrade(&frame);
                sink.show_rating(&rating);
                report.rating = Some(rating);
            }
            ModelMode::Detect => match rater.detect(&frame) {
                Ok(comment) => {
                    println!("Detection: {comment}");
                    report.detection = Some(comment);
                }
                Err(err) => sink.show_error(&format!("Detection failed: {err}")),
            },
            ModelMode::Off | ModelMode::Describe => {}
        }
    }

    let json_output_path = output_dir.join(format!("{stem}.out.json"));
    write_report(&json_output_path, &report)?;
    log::info!("Wrote {img_output_path:?} and {json_output_path:?}");

    Ok(report)
}

fn write_report(path: &Path, report: &AnalysisReport) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("cannot create {path:?}"))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chaya_common::annotator::Annotator;
    use chaya_common::{ChannelOrder, Frame, Strength};
    use gemini_common::RatingError;

    use super::*;

    struct FixedReply(&'static str);

    impl VisionModel for FixedReply {
        fn complete(&self, _prompt: &str, _image: &Frame) -> Result<String, RatingError> {
            Ok(self.0.to_string())
        }
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(Default::default(), &Default::default(), Annotator::new(None)).unwrap()
    }

    fn write_input(dir: &Path, value: u8) -> String {
        let path = dir.join("cup.png");
        Frame::from_raw(320, 240, vec![value; 320 * 240 * 3], ChannelOrder::Rgb)
            .unwrap()
            .save(&path)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn writes_annotated_image_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), 70);

        let report =
            process_image::<FixedReply>(&input, &analyzer(), None, dir.path()).unwrap();

        assert_eq!(report.analysis.brightness, 210);
        assert_eq!(report.analysis.strength, Strength::Medium);
        assert!(report.rating.is_none());
        assert!(dir.path().join("cup.out.jpg").exists());

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("cup.out.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["strength"], "medium");
        assert_eq!(json["label"], "Medium");
        assert_eq!(json["width"], 320);
        assert!(json.get("rating").is_none());
    }

    #[test]
    fn rate_mode_records_the_rating() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), 30);
        let rater = Rater::new(FixedReply("Rating: 5 | Comment: Kadak!"));

        let report =
            process_image(&input, &analyzer(), Some((&rater, ModelMode::Rate)), dir.path())
                .unwrap();

        assert_eq!(report.analysis.strength, Strength::VeryStrong);
        let rating = report.rating.unwrap();
        assert_eq!(rating.rating(), 5);
        assert_eq!(rating.comment(), "Kadak!");
    }

    #[test]
    fn unreadable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.jpg");
        std::fs::write(&input, b"not a jpeg").unwrap();

        let result =
            process_image::<FixedReply>(&input.to_string_lossy(), &analyzer(), None, dir.path());
        assert!(result.is_err());
        assert!(!dir.path().join("broken.out.json").exists());
    }
}
