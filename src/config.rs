use crate::error::AppError;
use crate::pipeline::orchestration::DEFAULT_PROGRESS_INTERVAL;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read from the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "palette-recon.toml";
/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "PALETTE_RECON_CONFIG";
/// Prefix for per-field environment overrides, e.g. `PALETTE_RECON_COLOR_COLUMN`.
pub const ENV_PREFIX: &str = "PALETTE_RECON";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub image_path: PathBuf,
    pub table_path: PathBuf,
    pub color_column: String,
    pub name_column: String,
    pub output_path: PathBuf,
    /// Drop rows with undecodable color codes instead of failing the load.
    pub drop_invalid_rows: bool,
    /// Write a header-only report when nothing is missing.
    pub write_empty_report: bool,
    /// Extract the palette and load the table concurrently.
    pub parallel_load: bool,
    /// Single ASCII field delimiter for both input and output tables.
    pub delimiter: String,
    /// Rows (or pixel rows) between progress notifications.
    pub progress_interval: usize,
    /// Missing records shown in the console preview.
    pub preview_limit: usize,
    pub summary_path: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("Data_Regions.png"),
            table_path: PathBuf::from("DataRegions.csv"),
            color_column: "REGION_ID".to_string(),
            name_column: "name".to_string(),
            output_path: PathBuf::from("missing_regions.csv"),
            drop_invalid_rows: true,
            write_empty_report: false,
            parallel_load: false,
            delimiter: ",".to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            preview_limit: 10,
            summary_path: None,
        }
    }
}

impl Configuration {
    /// Loads from `$PALETTE_RECON_CONFIG` if set, otherwise from an optional
    /// `palette-recon.toml`, with `PALETTE_RECON_*` variables layered on top.
    pub fn load() -> Result<Self, AppError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Some(Path::new(&path))),
            None => Self::load_from(None),
        }
    }

    /// An explicit `path` must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, AppError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };
        let configuration: Configuration = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new(Self::default())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.color_column.trim().is_empty() {
            return Err(AppError::Configuration(
                "color_column must not be empty".to_string(),
            ));
        }

        if self.name_column.trim().is_empty() {
            return Err(AppError::Configuration(
                "name_column must not be empty".to_string(),
            ));
        }

        if self.name_column == self.color_column {
            return Err(AppError::Configuration(format!(
                "name_column and color_column are both '{}'",
                self.name_column
            )));
        }

        if self.progress_interval == 0 {
            return Err(AppError::Configuration(
                "progress_interval must be greater than 0".to_string(),
            ));
        }

        self.delimiter_byte()?;
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8, AppError> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(AppError::Configuration(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }
}

pub struct ConfigurationBuilder {
    configuration: Configuration,
}

impl ConfigurationBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }

    pub fn image_path(mut self, image_path: impl Into<PathBuf>) -> Self {
        self.configuration.image_path = image_path.into();
        self
    }

    pub fn table_path(mut self, table_path: impl Into<PathBuf>) -> Self {
        self.configuration.table_path = table_path.into();
        self
    }

    pub fn output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.configuration.output_path = output_path.into();
        self
    }

    pub fn color_column(mut self, color_column: impl Into<String>) -> Self {
        self.configuration.color_column = color_column.into();
        self
    }

    pub fn name_column(mut self, name_column: impl Into<String>) -> Self {
        self.configuration.name_column = name_column.into();
        self
    }

    pub fn drop_invalid_rows(mut self, drop_invalid_rows: bool) -> Self {
        self.configuration.drop_invalid_rows = drop_invalid_rows;
        self
    }

    pub fn write_empty_report(mut self, write_empty_report: bool) -> Self {
        self.configuration.write_empty_report = write_empty_report;
        self
    }

    pub fn parallel_load(mut self, parallel_load: bool) -> Self {
        self.configuration.parallel_load = parallel_load;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.configuration.delimiter = delimiter.to_string();
        self
    }

    pub fn progress_interval(mut self, progress_interval: usize) -> Self {
        self.configuration.progress_interval = progress_interval;
        self
    }

    pub fn preview_limit(mut self, preview_limit: usize) -> Self {
        self.configuration.preview_limit = preview_limit;
        self
    }

    pub fn summary_path(mut self, summary_path: impl Into<PathBuf>) -> Self {
        self.configuration.summary_path = Some(summary_path.into());
        self
    }

    pub fn build(self) -> Result<Configuration, AppError> {
        self.configuration.validate()?;
        Ok(self.configuration)
    }
}
