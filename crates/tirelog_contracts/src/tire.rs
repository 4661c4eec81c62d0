#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::artifact::ImageArtifact;
use crate::{ContractViolation, SchemaVersion, TimestampMs, Validate};

pub const TIRE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

const MAX_ID_LEN: usize = 64;
const MAX_FIELD_LEN: usize = 256;
const MAX_NOTE_LEN: usize = 256;

/// User-assigned primary key. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TireId(String);

impl TireId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "tire_id",
                reason: "must not be empty",
            });
        }
        if id.len() > MAX_ID_LEN {
            return Err(ContractViolation::InvalidValue {
                field: "tire_id",
                reason: "must be <= 64 chars",
            });
        }
        if id.trim() != id {
            return Err(ContractViolation::InvalidValue {
                field: "tire_id",
                reason: "must not have leading or trailing whitespace",
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TireId {
    type Error = ContractViolation;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<TireId> for String {
    fn from(id: TireId) -> Self {
        id.0
    }
}

impl Validate for TireId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "tire_id",
                reason: "must not be empty",
            });
        }
        if self.0.len() > MAX_ID_LEN {
            return Err(ContractViolation::InvalidValue {
                field: "tire_id",
                reason: "must be <= 64 chars",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TireCategory {
    #[default]
    Summer,
    Winter,
    AllSeason,
}

impl TireCategory {
    pub fn label(self) -> &'static str {
        match self {
            TireCategory::Summer => "summer",
            TireCategory::Winter => "winter",
            TireCategory::AllSeason => "all-season",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "summer" => Some(TireCategory::Summer),
            "winter" => Some(TireCategory::Winter),
            "all-season" => Some(TireCategory::AllSeason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TireCondition {
    #[default]
    New,
    InUse,
    Worn,
    Retired,
}

impl TireCondition {
    pub fn label(self) -> &'static str {
        match self {
            TireCondition::New => "new",
            TireCondition::InUse => "in-use",
            TireCondition::Worn => "worn",
            TireCondition::Retired => "retired",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "new" => Some(TireCondition::New),
            "in-use" => Some(TireCondition::InUse),
            "worn" => Some(TireCondition::Worn),
            "retired" => Some(TireCondition::Retired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditEventKind {
    Creation,
    Update,
    Relocation,
    PhotoAdded,
    SignatureAttached,
}

/// Immutable once appended. A record's history is append-only and its
/// insertion order is its chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    pub at: TimestampMs,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<ImageArtifact>,
}

impl AuditEvent {
    pub fn v1(
        kind: AuditEventKind,
        at: TimestampMs,
        note: String,
        signature: Option<ImageArtifact>,
    ) -> Result<Self, ContractViolation> {
        let e = Self {
            kind,
            at,
            note,
            signature,
        };
        e.validate()?;
        Ok(e)
    }
}

impl Validate for AuditEvent {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "audit_event.at",
                reason: "must be > 0",
            });
        }
        if self.note.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "audit_event.note",
                reason: "must not be empty",
            });
        }
        if self.note.len() > MAX_NOTE_LEN {
            return Err(ContractViolation::InvalidValue {
                field: "audit_event.note",
                reason: "must be <= 256 chars",
            });
        }
        match (self.kind, &self.signature) {
            (AuditEventKind::SignatureAttached, None) => {
                return Err(ContractViolation::InvalidValue {
                    field: "audit_event.signature",
                    reason: "must be present for signature-attached events",
                });
            }
            (AuditEventKind::SignatureAttached, Some(sig)) => sig.validate()?,
            (_, Some(_)) => {
                return Err(ContractViolation::InvalidValue {
                    field: "audit_event.signature",
                    reason: "must be absent unless kind is signature-attached",
                });
            }
            (_, None) => {}
        }
        Ok(())
    }
}

/// One physical asset. `photos` and `history` are append-only; `id` and
/// `created_at` are immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TireRecord {
    pub schema_version: SchemaVersion,
    pub id: TireId,
    #[serde(default)]
    pub dot: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub category: TireCategory,
    #[serde(default)]
    pub condition: TireCondition,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<ImageArtifact>,
    #[serde(default)]
    pub history: Vec<AuditEvent>,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

impl TireRecord {
    /// Assembles a freshly created record around its creation event.
    pub fn create_v1(
        id: TireId,
        fields: TireFields,
        now: TimestampMs,
        creation: AuditEvent,
    ) -> Result<Self, ContractViolation> {
        if creation.kind != AuditEventKind::Creation {
            return Err(ContractViolation::InvalidValue {
                field: "tire.history",
                reason: "first event must have kind creation",
            });
        }
        let mut record = Self {
            schema_version: TIRE_CONTRACT_VERSION,
            id,
            dot: String::new(),
            brand: String::new(),
            model: String::new(),
            size: String::new(),
            category: TireCategory::default(),
            condition: TireCondition::default(),
            location: String::new(),
            position: String::new(),
            notes: String::new(),
            photos: Vec::new(),
            history: vec![creation],
            created_at: now,
            updated_at: now,
        };
        record = fields.merge_into(&record);
        record.validate()?;
        Ok(record)
    }
}

fn validate_text(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    if value.len() > MAX_FIELD_LEN {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be <= 256 chars",
        });
    }
    Ok(())
}

impl Validate for TireRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != TIRE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "tire.schema_version",
                reason: "must match TIRE_CONTRACT_VERSION",
            });
        }
        self.id.validate()?;
        validate_text("tire.dot", &self.dot)?;
        validate_text("tire.brand", &self.brand)?;
        validate_text("tire.model", &self.model)?;
        validate_text("tire.size", &self.size)?;
        validate_text("tire.location", &self.location)?;
        validate_text("tire.position", &self.position)?;
        validate_text("tire.notes", &self.notes)?;
        if self.created_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "tire.created_at",
                reason: "must be > 0",
            });
        }
        if self.updated_at.0 < self.created_at.0 {
            return Err(ContractViolation::InvalidValue {
                field: "tire.updated_at",
                reason: "must be >= created_at",
            });
        }
        if self.history.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "tire.history",
                reason: "must not be empty once saved",
            });
        }
        if self.history[0].kind != AuditEventKind::Creation {
            return Err(ContractViolation::InvalidValue {
                field: "tire.history",
                reason: "first event must have kind creation",
            });
        }
        for event in &self.history {
            event.validate()?;
        }
        for photo in &self.photos {
            photo.validate()?;
        }
        Ok(())
    }
}

/// Merge payload for create/update. `None` fields are retained from the
/// existing record; `id`, `photos`, `history` and the timestamps are never
/// touched by a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TireFields {
    pub dot: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub category: Option<TireCategory>,
    pub condition: Option<TireCondition>,
    pub location: Option<String>,
    pub position: Option<String>,
    pub notes: Option<String>,
}

impl TireFields {
    /// Pure merge: returns a copy of `base` with the supplied fields
    /// overwritten.
    pub fn merge_into(&self, base: &TireRecord) -> TireRecord {
        let mut out = base.clone();
        if let Some(v) = &self.dot {
            out.dot = v.clone();
        }
        if let Some(v) = &self.brand {
            out.brand = v.clone();
        }
        if let Some(v) = &self.model {
            out.model = v.clone();
        }
        if let Some(v) = &self.size {
            out.size = v.clone();
        }
        if let Some(v) = self.category {
            out.category = v;
        }
        if let Some(v) = self.condition {
            out.condition = v;
        }
        if let Some(v) = &self.location {
            out.location = v.clone();
        }
        if let Some(v) = &self.position {
            out.position = v.clone();
        }
        if let Some(v) = &self.notes {
            out.notes = v.clone();
        }
        out
    }
}
