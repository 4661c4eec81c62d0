#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::{ContractViolation, SchemaVersion, Validate};

pub const ARTIFACT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactMediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

/// One point of a continuous pointer/touch stroke, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Validate for StrokePoint {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(ContractViolation::InvalidValue {
                field: "stroke_point",
                reason: "coordinates must be finite",
            });
        }
        Ok(())
    }
}

/// Self-contained inline image blob. Stored inside the owning record or
/// audit event; there is no external blob store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub schema_version: SchemaVersion,
    pub media_type: ArtifactMediaType,
    pub width: u32,
    pub height: u32,
    pub data_b64: String,
}

impl ImageArtifact {
    pub fn v1(
        media_type: ArtifactMediaType,
        width: u32,
        height: u32,
        data_b64: String,
    ) -> Result<Self, ContractViolation> {
        let a = Self {
            schema_version: ARTIFACT_CONTRACT_VERSION,
            media_type,
            width,
            height,
            data_b64,
        };
        a.validate()?;
        Ok(a)
    }
}

impl Validate for ImageArtifact {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != ARTIFACT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "image_artifact.schema_version",
                reason: "must match ARTIFACT_CONTRACT_VERSION",
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "image_artifact.dimensions",
                reason: "must be > 0",
            });
        }
        if self.data_b64.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "image_artifact.data_b64",
                reason: "must not be empty",
            });
        }
        if !self.data_b64.is_ascii() {
            return Err(ContractViolation::InvalidValue {
                field: "image_artifact.data_b64",
                reason: "must be ASCII base64",
            });
        }
        Ok(())
    }
}
