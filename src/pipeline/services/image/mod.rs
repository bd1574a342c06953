pub mod palette_extractor;

pub use palette_extractor::PaletteExtractor;
