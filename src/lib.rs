pub mod cli;
pub mod config;
pub mod core;
pub mod geometry;
pub mod http;
pub mod processors;
pub mod utils;

pub use crate::cli::{Cli, Commands, IoArgs};
pub use crate::config::{ServerSettings, Settings};
pub use crate::core::{
    EmptyBatchPolicy, ImageMetadata, ImageOperation, ImageToolError, OutputFormat, Quality,
    ResizeAlgorithm, Result,
};
pub use crate::geometry::{
    place, resolve_crop, resolve_size, AnchorPosition, CropIntent, CropRectangle, Dimensions,
    GeometryError, ResizeMode,
};
pub use crate::processors::{
    BatchOptions, BatchProcessor, BatchResult, ColorAdjuster, CompressOperation, Compressor,
    Converter, Cropper, Loader, MetadataProcessor, OperationRequest, Resizer, TextRenderer,
    Thumbnailer, ToneAdjustment, Watermarker,
};
pub use crate::utils::{format_file_size, generate_output_path, is_supported_format, single_output_path};

pub mod prelude {
    pub use crate::processors::prelude::*;
    pub use crate::{
        BatchOptions, ImageOperation, OperationRequest, Quality, ResizeAlgorithm, ResizeMode,
        Settings,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
