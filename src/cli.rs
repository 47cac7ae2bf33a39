// imgbatch/src/cli.rs
use crate::core::{ImageToolError, OutputFormat, ResizeAlgorithm, Result};
use crate::geometry::{AnchorPosition, CropIntent, ResizeMode};
use crate::processors::{
    OperationRequest, ResizeParams, ThumbnailParams, ToneAdjustment, WatermarkParams,
    DEFAULT_THUMBNAIL_SIZE,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgbatch", version, about = "Batch image processing: resize, crop, watermark and more")]
pub struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML settings file [default: ./imgbatch.toml if present]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input and output shared by every file operation. A directory input runs a batch.
#[derive(Args, Debug, Clone)]
pub struct IoArgs {
    /// Input file or directory
    pub input: PathBuf,

    /// Output file, or output directory for a batch
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Encoder quality 1-100 (clamped)
    #[arg(short, long)]
    pub quality: Option<u32>,

    /// Batch file pattern, `;`-separated wildcards
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Worker threads; 0 uses every core
    #[arg(short, long)]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resize to a width and/or height
    Resize {
        #[command(flatten)]
        io: IoArgs,
        #[arg(short = 'W', long)]
        width: Option<u32>,
        #[arg(short = 'H', long)]
        height: Option<u32>,
        /// keep-aspect-ratio, stretch or crop
        #[arg(short, long, default_value = "keep-aspect-ratio")]
        mode: ResizeMode,
        /// nearest, bilinear, bicubic or lanczos3
        #[arg(short, long)]
        algorithm: Option<ResizeAlgorithm>,
    },
    /// Crop by absolute box, percent box, or a centered box
    Crop {
        #[command(flatten)]
        io: IoArgs,
        #[arg(short, long, allow_hyphen_values = true)]
        x: Option<f64>,
        #[arg(short, long, allow_hyphen_values = true)]
        y: Option<f64>,
        #[arg(short = 'W', long, allow_hyphen_values = true)]
        width: Option<f64>,
        #[arg(short = 'H', long, allow_hyphen_values = true)]
        height: Option<f64>,
        /// Read x, y, width and height as percentages of the image size
        #[arg(long)]
        percent: bool,
    },
    /// Stamp text or an image
    Watermark {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, conflicts_with = "image")]
        text: Option<String>,
        /// Watermark image file
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, default_value_t = 24)]
        font_size: u32,
        /// Hex color, #rrggbb or #rrggbbaa
        #[arg(long, default_value = "#ffffff")]
        color: String,
        /// 0.0-1.0 (clamped)
        #[arg(long, default_value_t = 1.0)]
        opacity: f32,
        /// top-left, top-center, ..., bottom-right
        #[arg(long, default_value = "bottom-right")]
        position: AnchorPosition,
        #[arg(long)]
        margin: Option<u32>,
        /// Watermark image width as percent of the image width
        #[arg(long)]
        scale: Option<f32>,
    },
    /// Brightness, contrast, saturation, hue and gamma
    Adjust {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        brightness: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        contrast: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        saturation: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        hue: f32,
        #[arg(long, default_value_t = 1.0)]
        gamma: f32,
    },
    /// Remove EXIF and other embedded metadata
    Strip {
        #[command(flatten)]
        io: IoArgs,
        /// Keep the ICC color profile
        #[arg(long)]
        keep_icc: bool,
    },
    /// Re-encode smaller in the same format
    Compress {
        #[command(flatten)]
        io: IoArgs,
        /// oxipng level 0-6 (clamped)
        #[arg(long, default_value_t = 2)]
        png_level: u8,
    },
    /// Change the file format
    Convert {
        #[command(flatten)]
        io: IoArgs,
        /// jpeg, png, webp, bmp, gif or tiff
        #[arg(short, long)]
        format: OutputFormat,
    },
    /// Small previews
    Thumbnail {
        #[command(flatten)]
        io: IoArgs,
        #[arg(short, long, default_value_t = DEFAULT_THUMBNAIL_SIZE)]
        size: u32,
        /// Fill and crop to an exact square
        #[arg(long)]
        square: bool,
        #[arg(short, long)]
        algorithm: Option<ResizeAlgorithm>,
    },
    /// Show image information
    Info {
        input: PathBuf,
    },
    /// Run the HTTP API
    Serve {
        /// Overrides server.listen from the settings
        #[arg(short, long)]
        listen: Option<String>,
    },
}

impl Commands {
    /// The file operation this command runs, or `None` for `info` and `serve`.
    pub fn operation(&self) -> Result<Option<(&IoArgs, OperationRequest)>> {
        let pair = match self {
            Commands::Resize {
                io,
                width,
                height,
                mode,
                algorithm,
            } => (
                io,
                OperationRequest::Resize(ResizeParams {
                    width: *width,
                    height: *height,
                    mode: *mode,
                    algorithm: *algorithm,
                }),
            ),
            Commands::Crop {
                io,
                x,
                y,
                width,
                height,
                percent,
            } => (
                io,
                OperationRequest::Crop(crop_intent(*x, *y, *width, *height, *percent)?),
            ),
            Commands::Watermark {
                io,
                text,
                image,
                font_size,
                color,
                opacity,
                position,
                margin,
                scale,
            } => (
                io,
                OperationRequest::Watermark(WatermarkParams {
                    text: text.clone(),
                    image: image.clone(),
                    font_size: *font_size,
                    color: color.clone(),
                    opacity: *opacity,
                    position: *position,
                    margin: *margin,
                    scale: *scale,
                }),
            ),
            Commands::Adjust {
                io,
                brightness,
                contrast,
                saturation,
                hue,
                gamma,
            } => (
                io,
                OperationRequest::Adjust(ToneAdjustment {
                    brightness: *brightness,
                    contrast: *contrast,
                    saturation: *saturation,
                    hue: *hue,
                    gamma: *gamma,
                }),
            ),
            Commands::Strip { io, keep_icc } => (io, OperationRequest::Strip { keep_icc: *keep_icc }),
            Commands::Compress { io, png_level } => (
                io,
                OperationRequest::Compress {
                    png_level: *png_level,
                },
            ),
            Commands::Convert { io, format } => (io, OperationRequest::Convert { format: *format }),
            Commands::Thumbnail {
                io,
                size,
                square,
                algorithm,
            } => (
                io,
                OperationRequest::Thumbnail(ThumbnailParams {
                    size: *size,
                    square: *square,
                    algorithm: *algorithm,
                }),
            ),
            Commands::Info { .. } | Commands::Serve { .. } => return Ok(None),
        };
        Ok(Some(pair))
    }
}

/// A box with `x`/`y` is absolute, without is centered; `percent` reads
/// every value as a percentage of the source size.
fn crop_intent(
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    percent: bool,
) -> Result<CropIntent> {
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(ImageToolError::InvalidParameter(
                "Crop needs --width and --height".to_string(),
            ))
        }
    };

    if percent {
        return Ok(CropIntent::Percent {
            x: x.unwrap_or(0.0),
            y: y.unwrap_or(0.0),
            width,
            height,
        });
    }

    let pixels = |v: f64, name: &str| {
        if v.is_finite() && v.fract() == 0.0 {
            Ok(v as i64)
        } else {
            Err(ImageToolError::InvalidParameter(format!(
                "Crop {} must be a whole number of pixels, got {}",
                name, v
            )))
        }
    };

    if x.is_some() || y.is_some() {
        return Ok(CropIntent::Absolute {
            x: pixels(x.unwrap_or(0.0), "x")?,
            y: pixels(y.unwrap_or(0.0), "y")?,
            width: pixels(width, "width")?,
            height: pixels(height, "height")?,
        });
    }

    let positive = |v: f64, name: &str| {
        u32::try_from(pixels(v, name)?).ok().filter(|v| *v > 0).ok_or_else(|| {
            ImageToolError::InvalidParameter(format!("Centered crop {} must be positive", name))
        })
    };
    Ok(CropIntent::Centered {
        width: positive(width, "width")?,
        height: positive(height, "height")?,
    })
}
