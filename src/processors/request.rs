// imgbatch/src/processors/request.rs
use crate::config::Settings;
use crate::core::{ImageOperation, ImageToolError, OutputFormat, ResizeAlgorithm, Result};
use crate::geometry::{AnchorPosition, CropIntent, ResizeMode};
use crate::processors::{
    parse_hex_color, ColorAdjuster, CompressOperation, Converter, Cropper, MetadataProcessor,
    Resizer, Thumbnailer, ToneAdjustment, Watermarker, DEFAULT_THUMBNAIL_SIZE,
};
use crate::utils::ensure_no_traversal;
use serde::Deserialize;
use std::path::PathBuf;

pub const OPERATION_NAMES: [&str; 8] = [
    "resize",
    "crop",
    "watermark",
    "adjust",
    "strip",
    "compress",
    "convert",
    "thumbnail",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ResizeParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub mode: ResizeMode,
    pub algorithm: Option<ResizeAlgorithm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailParams {
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
    #[serde(default)]
    pub square: bool,
    pub algorithm: Option<ResizeAlgorithm>,
}

/// Exactly one of `text` or `image` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkParams {
    pub text: Option<String>,
    pub image: Option<PathBuf>,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub position: AnchorPosition,
    pub margin: Option<u32>,
    /// Percent of the container width.
    pub scale: Option<f32>,
}

fn default_thumbnail_size() -> u32 {
    DEFAULT_THUMBNAIL_SIZE
}

fn default_font_size() -> u32 {
    24
}

fn default_color() -> String {
    "#ffffff".to_string()
}

fn default_opacity() -> f32 {
    1.0
}

fn default_png_level() -> u8 {
    2
}

/// Parameters of one operation, shared by the CLI and the HTTP API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum OperationRequest {
    Resize(ResizeParams),
    Crop(CropIntent),
    Watermark(WatermarkParams),
    Adjust(ToneAdjustment),
    Strip {
        #[serde(default)]
        keep_icc: bool,
    },
    Compress {
        #[serde(default = "default_png_level")]
        png_level: u8,
    },
    Convert {
        format: OutputFormat,
    },
    Thumbnail(ThumbnailParams),
}

impl OperationRequest {
    /// Parse the JSON parameters of operation `name`. Unknown keys are ignored.
    pub fn from_json(name: &str, body: serde_json::Value) -> Result<Self> {
        if !OPERATION_NAMES.contains(&name) {
            return Err(ImageToolError::InvalidParameter(format!(
                "Unknown operation: {}",
                name
            )));
        }
        let mut body = match body {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            _ => {
                return Err(ImageToolError::InvalidParameter(
                    "Request body must be a JSON object".to_string(),
                ))
            }
        };
        body.insert("operation".to_string(), serde_json::Value::from(name));

        serde_json::from_value(serde_json::Value::Object(body)).map_err(|e| {
            ImageToolError::InvalidParameter(format!("Invalid {} parameters: {}", name, e))
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationRequest::Resize(_) => "resize",
            OperationRequest::Crop(_) => "crop",
            OperationRequest::Watermark(_) => "watermark",
            OperationRequest::Adjust(_) => "adjust",
            OperationRequest::Strip { .. } => "strip",
            OperationRequest::Compress { .. } => "compress",
            OperationRequest::Convert { .. } => "convert",
            OperationRequest::Thumbnail(_) => "thumbnail",
        }
    }

    /// Validate parameters and construct the operation. No image is touched
    /// except a watermark image, which is loaded once here.
    pub fn build(&self, settings: &Settings) -> Result<Box<dyn ImageOperation + Send>> {
        let op: Box<dyn ImageOperation + Send> = match self {
            OperationRequest::Resize(p) => {
                let resizer = Resizer::new(p.width, p.height, p.mode)
                    .with_algorithm(p.algorithm.unwrap_or(settings.algorithm));
                resizer.validate()?;
                Box::new(resizer)
            }
            OperationRequest::Crop(intent) => Box::new(Cropper::new(*intent)),
            OperationRequest::Watermark(p) => Box::new(build_watermarker(p, settings)?),
            OperationRequest::Adjust(adjustment) => Box::new(ColorAdjuster::new(*adjustment)),
            OperationRequest::Strip { keep_icc } => {
                Box::new(MetadataProcessor::new().keep_icc_profile(*keep_icc))
            }
            OperationRequest::Compress { png_level } => Box::new(CompressOperation::new(*png_level)),
            OperationRequest::Convert { format } => Box::new(Converter::new(*format)),
            OperationRequest::Thumbnail(p) => {
                if p.size == 0 {
                    return Err(ImageToolError::InvalidParameter(
                        "Thumbnail size must be positive".to_string(),
                    ));
                }
                let mut thumb = Thumbnailer::new(p.size, p.square);
                if let Some(algorithm) = p.algorithm {
                    thumb = thumb.with_algorithm(algorithm);
                }
                Box::new(thumb)
            }
        };
        Ok(op)
    }
}

fn build_watermarker(p: &WatermarkParams, settings: &Settings) -> Result<Watermarker> {
    let marker = match (&p.text, &p.image) {
        (Some(text), None) => {
            Watermarker::text(text.clone(), p.font_size, parse_hex_color(&p.color)?)?
        }
        (None, Some(path)) => {
            ensure_no_traversal(path, "watermark image")?;
            Watermarker::image_file(path, p.scale)?
        }
        (Some(_), Some(_)) => {
            return Err(ImageToolError::InvalidParameter(
                "Use either watermark text or a watermark image, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(ImageToolError::InvalidParameter(
                "Watermark needs text or an image".to_string(),
            ))
        }
    };

    Ok(marker
        .with_anchor(p.position)
        .with_margin(p.margin.unwrap_or(settings.watermark_margin))
        .with_opacity(p.opacity))
}
