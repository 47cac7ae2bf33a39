// imgbatch/src/processors/mod.rs
mod batch;
mod color;
mod compressor;
mod converter;
mod cropper;
mod loader;
mod metadata;
mod request;
mod resizer;
pub mod text;
mod thumbnail;
pub mod tone;
mod watermark;

pub use batch::{BatchItemOutcome, BatchOptions, BatchProcessor, BatchResult};
pub use color::ColorAdjuster;
pub use compressor::{CompressOperation, Compressor, MAX_PNG_LEVEL};
pub use converter::Converter;
pub use cropper::Cropper;
pub use loader::{LoadedImage, Loader};
pub use metadata::{MetadataProcessor, StripReport};
pub use request::{OperationRequest, ResizeParams, ThumbnailParams, WatermarkParams, OPERATION_NAMES};
pub use resizer::Resizer;
pub use text::{parse_hex_color, TextRenderer};
pub use thumbnail::{Thumbnailer, DEFAULT_THUMBNAIL_SIZE};
pub use tone::{apply_tone, ToneAdjustment};
pub use watermark::{WatermarkContent, Watermarker};

pub mod prelude {
    pub use super::{
        BatchProcessor, ColorAdjuster, CompressOperation, Compressor, Converter, Cropper, Loader,
        MetadataProcessor, Resizer, Thumbnailer, Watermarker,
    };
}
