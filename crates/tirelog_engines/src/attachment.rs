#![forbid(unsafe_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, GenericImageView, ImageEncoder, Rgb, RgbImage};
use tirelog_contracts::artifact::{ArtifactMediaType, ImageArtifact, StrokePoint};
use tirelog_contracts::{ContractViolation, Validate};

#[derive(Debug)]
pub enum AttachmentError {
    UndecodableImage,
    EmptySignature,
    Encode(image::ImageError),
    Contract(ContractViolation),
}

impl std::fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndecodableImage => write!(f, "input bytes are not a decodable image"),
            Self::EmptySignature => write!(f, "signature stroke must contain at least one point"),
            Self::Encode(err) => write!(f, "artifact encode failed: {err}"),
            Self::Contract(v) => write!(f, "artifact contract violation: {v}"),
        }
    }
}

impl std::error::Error for AttachmentError {}

impl From<ContractViolation> for AttachmentError {
    fn from(v: ContractViolation) -> Self {
        AttachmentError::Contract(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentConfig {
    pub max_photo_width: u32,
    pub max_photo_height: u32,
    pub jpeg_quality: u8,
    pub signature_width: u32,
    pub signature_height: u32,
    pub stroke_width: u32,
}

impl AttachmentConfig {
    pub fn default_v1() -> Self {
        Self {
            max_photo_width: 1280,
            max_photo_height: 1280,
            jpeg_quality: 85,
            signature_width: 320,
            signature_height: 160,
            stroke_width: 2,
        }
    }
}

/// Normalizes raw camera/signature input into bounded, inline-storable
/// artifacts.
#[derive(Debug, Clone)]
pub struct AttachmentRuntime {
    config: AttachmentConfig,
}

impl AttachmentRuntime {
    pub fn new(config: AttachmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> AttachmentConfig {
        self.config
    }

    /// Decodes `raw`, downscales by a uniform factor
    /// `min(1, max_w/w, max_h/h)` (never upscales) and re-encodes as JPEG
    /// at the fixed quality.
    pub fn capture_image(&self, raw: &[u8]) -> Result<ImageArtifact, AttachmentError> {
        let decoded =
            image::load_from_memory(raw).map_err(|_| AttachmentError::UndecodableImage)?;
        let (width, height) = decoded.dimensions();
        let scale = f64::min(
            1.0,
            f64::min(
                f64::from(self.config.max_photo_width) / f64::from(width),
                f64::from(self.config.max_photo_height) / f64::from(height),
            ),
        );
        let scaled = if scale < 1.0 {
            let target_w = ((f64::from(width) * scale).round() as u32).max(1);
            let target_h = ((f64::from(height) * scale).round() as u32).max(1);
            decoded.resize_exact(target_w, target_h, FilterType::Triangle)
        } else {
            decoded
        };

        let rgb = scaled.to_rgb8();
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.config.jpeg_quality)
            .encode_image(&rgb)
            .map_err(AttachmentError::Encode)?;
        let artifact = ImageArtifact::v1(
            ArtifactMediaType::Jpeg,
            rgb.width(),
            rgb.height(),
            BASE64.encode(&encoded),
        )?;
        Ok(artifact)
    }

    /// Renders an ordered stroke as a black polyline on a white canvas of
    /// fixed dimensions and encodes it as PNG. Requires at least one point.
    pub fn capture_signature(
        &self,
        points: &[StrokePoint],
    ) -> Result<ImageArtifact, AttachmentError> {
        if points.is_empty() {
            return Err(AttachmentError::EmptySignature);
        }
        for p in points {
            p.validate()?;
        }

        let width = self.config.signature_width;
        let height = self.config.signature_height;
        let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        let radius = (self.config.stroke_width / 2).max(1) as i64;

        let clamped: Vec<(i64, i64)> = points
            .iter()
            .map(|p| {
                (
                    (p.x.round() as i64).clamp(0, width as i64 - 1),
                    (p.y.round() as i64).clamp(0, height as i64 - 1),
                )
            })
            .collect();

        stamp_disc(&mut canvas, clamped[0], radius);
        for pair in clamped.windows(2) {
            draw_segment(&mut canvas, pair[0], pair[1], radius);
        }

        let mut encoded = Vec::new();
        PngEncoder::new(&mut encoded)
            .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(AttachmentError::Encode)?;
        let artifact = ImageArtifact::v1(
            ArtifactMediaType::Png,
            width,
            height,
            BASE64.encode(&encoded),
        )?;
        Ok(artifact)
    }
}

/// Straight segment between consecutive stroke points, stamped densely
/// enough to leave no gaps at the configured stroke width.
fn draw_segment(canvas: &mut RgbImage, from: (i64, i64), to: (i64, i64), radius: i64) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.abs().max(dy.abs()).max(1);
    for i in 0..=steps {
        let x = from.0 + dx * i / steps;
        let y = from.1 + dy * i / steps;
        stamp_disc(canvas, (x, y), radius);
    }
}

fn stamp_disc(canvas: &mut RgbImage, center: (i64, i64), radius: i64) {
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    for oy in -radius..=radius {
        for ox in -radius..=radius {
            if ox * ox + oy * oy > radius * radius {
                continue;
            }
            let x = center.0 + ox;
            let y = center.1 + oy;
            if x >= 0 && x < width && y >= 0 && y < height {
                canvas.put_pixel(x as u32, y as u32, Rgb([0, 0, 0]));
            }
        }
    }
}
