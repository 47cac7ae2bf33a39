// imgbatch/src/utils/mod.rs
use crate::core::{ImageOperation, ImageToolError, Result};
use std::path::{Component, Path, PathBuf};

pub const SUPPORTED_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];

/// Default batch pattern: every supported extension.
pub const DEFAULT_PATTERN: &str = "*.jpg;*.jpeg;*.png;*.gif;*.bmp;*.tiff;*.tif;*.webp";

/// `dir/{stem}{_suffix}.{ext}`; `extension` overrides the source extension.
pub fn suffixed_path(source: &Path, dir: &Path, suffix: Option<&str>, extension: Option<&str>) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let extension = extension
        .or_else(|| source.extension().and_then(|ext| ext.to_str()))
        .unwrap_or("jpg");

    let name = match suffix {
        Some(suffix) => format!("{}_{}.{}", stem, suffix, extension),
        None => format!("{}.{}", stem, extension),
    };
    dir.join(name)
}

/// Output path for a single-file command: the explicit `output`, or a sibling
/// of `input` named `{stem}_{suffix}.{ext}`.
pub fn generate_output_path(input_path: &Path, output: Option<&Path>, suffix: Option<&str>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => {
            let dir = input_path.parent().unwrap_or_else(|| Path::new(""));
            suffixed_path(input_path, dir, suffix, None)
        }
    }
}

/// Where a single-file run of `operation` writes. Operations that keep the
/// file name get their own name as suffix so the input is never overwritten.
pub fn single_output_path(operation: &dyn ImageOperation, input: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let target = operation.target_path(input, dir);
    if target == input {
        generate_output_path(input, None, Some(operation.name()))
    } else {
        target
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Case-insensitive wildcard match of a file name against `pattern`.
///
/// `*` matches any run of characters, `?` exactly one. Several patterns can be
/// joined with `;`.
pub fn matches_pattern(file_name: &str, pattern: &str) -> bool {
    let name: Vec<char> = file_name.to_lowercase().chars().collect();
    pattern
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .any(|p| {
            let p: Vec<char> = p.to_lowercase().chars().collect();
            wildcard(&name, &p)
        })
}

fn wildcard(name: &[char], pattern: &[char]) -> bool {
    let (mut n, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            n += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            // Let the last `*` absorb one more character and retry.
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Reject paths that climb out of their base with `..`.
pub fn ensure_no_traversal(path: &Path, label: &str) -> Result<()> {
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ImageToolError::SecurityError(format!(
            "Path traversal detected in {} path: {}",
            label,
            path.display()
        )));
    }
    Ok(())
}

pub fn image_format_to_string(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG",
        image::ImageFormat::Png => "PNG",
        image::ImageFormat::Gif => "GIF",
        image::ImageFormat::WebP => "WebP",
        image::ImageFormat::Pnm => "PNM",
        image::ImageFormat::Tiff => "TIFF",
        image::ImageFormat::Tga => "TGA",
        image::ImageFormat::Dds => "DDS",
        image::ImageFormat::Bmp => "BMP",
        image::ImageFormat::Ico => "ICO",
        image::ImageFormat::Hdr => "HDR",
        image::ImageFormat::OpenExr => "OpenEXR",
        image::ImageFormat::Farbfeld => "Farbfeld",
        image::ImageFormat::Avif => "AVIF",
        image::ImageFormat::Qoi => "QOI",
        _ => "Unknown",
    }
    .to_string()
}
