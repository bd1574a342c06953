use image::{DynamicImage, RgbaImage};
use std::collections::HashSet;
use std::path::Path;

use crate::error::AppError;
use crate::pipeline::orchestration::{PipelineStage, ProgressReporter};
use crate::pipeline::types::{Color, Palette};

const STAGE: PipelineStage = PipelineStage::PaletteExtraction;

/// Builds the set of distinct RGB colors of a raster image.
#[derive(Clone, Default)]
pub struct PaletteExtractor {
    progress: ProgressReporter,
}

impl PaletteExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Opens and decodes `path`, then extracts its palette.
    pub fn extract(&self, path: &Path) -> Result<Palette, AppError> {
        self.progress
            .started(STAGE, &format!("Analyzing image {}", path.display()));

        let image = image::open(path).map_err(|source| AppError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Decoded image"
        );

        let palette = self.extract_image(image);
        self.progress.finished(
            STAGE,
            &format!("Image analysis complete: found {} unique colors", palette.len()),
        );
        Ok(palette)
    }

    /// Consumes the decoded image; its buffer is released once the palette
    /// is built.
    pub fn extract_image(&self, image: DynamicImage) -> Palette {
        // RGBA8 replicates gray channels and fills in opaque alpha
        let rgba = image.into_rgba8();
        self.collect_colors(&rgba)
    }

    fn collect_colors(&self, image: &RgbaImage) -> Palette {
        let height = image.height() as usize;
        let mut colors: HashSet<Color> = HashSet::new();

        for (done, row) in image.rows().enumerate() {
            colors.extend(row.map(|px| Color::from(*px)));
            self.progress.tick(STAGE, done + 1, height, "pixel rows");
        }

        Palette::new(colors)
    }
}
