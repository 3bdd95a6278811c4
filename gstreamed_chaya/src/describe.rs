use chaya_common::reply::{description_from_reply, Description};
use gemini_common::{Rater, VisionModel};
use serde::Serialize;

use crate::sources;

#[derive(Debug, Serialize)]
pub struct DescribeEntry {
    pub filename: String,
    #[serde(flatten)]
    pub description: Description,
}

/// Asks the model to describe every source. Sources that cannot be loaded
/// are reported and left out; failed model calls become `"Error"` entries
/// carrying the failure message.
pub fn describe_all<M: VisionModel>(sources: &[String], rater: &Rater<M>) -> Vec<DescribeEntry> {
    let mut entries = Vec::with_capacity(sources.len());

    for source in sources {
        let frame = match sources::load_frame(source) {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("Skipping {source}: {err:#}");
                continue;
            }
        };

        log::info!("Describing {source}");
        let description = rater
            .describe(&frame)
            .unwrap_or_else(|err| description_from_reply(&err.message()));
        entries.push(DescribeEntry {
            filename: source.clone(),
            description,
        });
    }

    entries
}

pub fn print_entries(entries: &[DescribeEntry]) -> anyhow::Result<()> {
    println!("\n--- Analysis Complete ---");
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}
