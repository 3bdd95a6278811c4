use std::path::Path;

use anyhow::Context;
use chaya_common::config::{AnalysisConfig, AnnotationConfig};
use config::{Config, Environment, File, FileFormat};
use gemini_common::GeminiConfig;
use serde::Deserialize;

/// Looked up in the working directory when no `--config` is given.
const DEFAULT_CONFIG_NAME: &str = "chaya";
const ENV_PREFIX: &str = "CHAYA";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub annotation: AnnotationConfig,
    pub gemini: GeminiConfig,
}

impl Settings {
    /// Defaults, then `chaya.toml` (or `path`), then `CHAYA_*` variables,
    /// e.g. `CHAYA_ANALYSIS__ROI_SIZE=120`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME)
                .format(FileFormat::Toml)
                .required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        settings.analysis.validate()?;
        log::debug!("{settings:?}");
        Ok(settings)
    }
}
