#![forbid(unsafe_code)]

use tirelog_contracts::artifact::ImageArtifact;
use tirelog_contracts::auth::{OperationClass, Session};
use tirelog_contracts::tire::{
    AuditEvent, AuditEventKind, TireCategory, TireCondition, TireFields, TireId, TireRecord,
};
use tirelog_contracts::TimestampMs;
use tirelog_storage::TireRepo;

use crate::authz;
use crate::error::OpError;

fn require(session: &Session, class: OperationClass) -> Result<(), OpError> {
    if authz::authorize(session, class) {
        Ok(())
    } else {
        Err(OpError::Permission {
            role: session.active_role,
            class,
        })
    }
}

/// Wall clocks may step backwards between operations; persisted
/// `updated_at` stays monotonic non-decreasing per record regardless.
fn effective_now(existing: &TireRecord, now: TimestampMs) -> TimestampMs {
    TimestampMs(now.0.max(existing.updated_at.0))
}

const PLACEMENT_NOTE_LIMIT: usize = 100;

/// Record fields may be longer than what fits in an audit note alongside
/// the fixed text; clip on a char boundary so notes stay within the cap.
fn clip(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Creates a record with an empty photo list and a single creation event.
/// Rejects ids that already exist; those must go through `update`.
pub fn create<S: TireRepo>(
    session: &Session,
    store: &mut S,
    id: TireId,
    fields: TireFields,
    now: TimestampMs,
) -> Result<TireRecord, OpError> {
    require(session, OperationClass::Create)?;
    if store.get_tire(&id).is_some() {
        return Err(OpError::Conflict(id.as_str().to_string()));
    }
    let creation = AuditEvent::v1(
        AuditEventKind::Creation,
        now,
        format!("record created by {}", session.active_role.label()),
        None,
    )?;
    let record = TireRecord::create_v1(id, fields, now, creation)?;
    store.put_tire(record.clone())?;
    Ok(record)
}

/// Merges the supplied fields into the stored record; unspecified fields
/// are retained.
pub fn update<S: TireRepo>(
    session: &Session,
    store: &mut S,
    id: &TireId,
    fields: TireFields,
    now: TimestampMs,
) -> Result<TireRecord, OpError> {
    require(session, OperationClass::Modify)?;
    let existing = store
        .get_tire(id)
        .ok_or_else(|| OpError::NotFound(id.as_str().to_string()))?;
    let at = effective_now(existing, now);
    let mut record = fields.merge_into(existing);
    record.updated_at = at;
    record.history.push(AuditEvent::v1(
        AuditEventKind::Update,
        at,
        format!("record updated by {}", session.active_role.label()),
        None,
    )?);
    store.put_tire(record.clone())?;
    Ok(record)
}

/// The only operation besides a full `update` that may change placement.
pub fn relocate<S: TireRepo>(
    session: &Session,
    store: &mut S,
    id: &TireId,
    new_location: &str,
    new_position: &str,
    now: TimestampMs,
) -> Result<TireRecord, OpError> {
    require(session, OperationClass::Relocate)?;
    let existing = store
        .get_tire(id)
        .ok_or_else(|| OpError::NotFound(id.as_str().to_string()))?;
    let at = effective_now(existing, now);
    let mut record = existing.clone();
    record.location = new_location.trim().to_string();
    record.position = new_position.trim().to_string();
    record.updated_at = at;
    let note = format!(
        "moved to {} {} by {}",
        clip(&record.location, PLACEMENT_NOTE_LIMIT),
        clip(&record.position, PLACEMENT_NOTE_LIMIT),
        session.active_role.label()
    );
    record
        .history
        .push(AuditEvent::v1(AuditEventKind::Relocation, at, note, None)?);
    store.put_tire(record.clone())?;
    Ok(record)
}

/// Destructive and irreversible: the record and its full history are
/// removed, no tombstone is kept.
pub fn delete<S: TireRepo>(session: &Session, store: &mut S, id: &TireId) -> Result<(), OpError> {
    require(session, OperationClass::Delete)?;
    if !store.delete_tire(id)? {
        return Err(OpError::NotFound(id.as_str().to_string()));
    }
    Ok(())
}

/// Appends a signature-attached event carrying the artifact. Leaves
/// `updated_at` untouched (preserved quirk of the observed design; every
/// other mutation bumps it).
pub fn attach_signature<S: TireRepo>(
    session: &Session,
    store: &mut S,
    id: &TireId,
    artifact: ImageArtifact,
    now: TimestampMs,
) -> Result<TireRecord, OpError> {
    require(session, OperationClass::AttachSignature)?;
    let existing = store
        .get_tire(id)
        .ok_or_else(|| OpError::NotFound(id.as_str().to_string()))?;
    let mut record = existing.clone();
    record.history.push(AuditEvent::v1(
        AuditEventKind::SignatureAttached,
        effective_now(existing, now),
        format!("signature attached by {}", session.active_role.label()),
        Some(artifact),
    )?);
    store.put_tire(record.clone())?;
    Ok(record)
}

/// Appends the artifact to the photo list (photos are never replaced or
/// removed) and records a photo-added event.
pub fn add_photo<S: TireRepo>(
    session: &Session,
    store: &mut S,
    id: &TireId,
    artifact: ImageArtifact,
    now: TimestampMs,
) -> Result<TireRecord, OpError> {
    if !authz::authorize(session, OperationClass::Create)
        && !authz::authorize(session, OperationClass::Modify)
    {
        return Err(OpError::Permission {
            role: session.active_role,
            class: OperationClass::Modify,
        });
    }
    let existing = store
        .get_tire(id)
        .ok_or_else(|| OpError::NotFound(id.as_str().to_string()))?;
    let at = effective_now(existing, now);
    let mut record = existing.clone();
    record.photos.push(artifact);
    record.updated_at = at;
    record.history.push(AuditEvent::v1(
        AuditEventKind::PhotoAdded,
        at,
        format!("photo added by {}", session.active_role.label()),
        None,
    )?);
    store.put_tire(record.clone())?;
    Ok(record)
}

/// Display listing: `updated_at` descending, insertion order on ties.
pub fn list<S: TireRepo>(store: &S) -> Vec<&TireRecord> {
    store.tires_by_updated_desc()
}

pub fn find<'a, S: TireRepo>(store: &'a S, id: &TireId) -> Option<&'a TireRecord> {
    store.get_tire(id)
}

/// Substring search over the descriptive fields plus exact condition and
/// category filters, in display order.
pub fn list_filtered<'a, S: TireRepo>(
    store: &'a S,
    query: Option<&str>,
    condition: Option<TireCondition>,
    category: Option<TireCategory>,
) -> Vec<&'a TireRecord> {
    let needle = query.map(str::to_lowercase).filter(|q| !q.is_empty());
    store
        .tires_by_updated_desc()
        .into_iter()
        .filter(|r| {
            let query_ok = needle.as_ref().map_or(true, |q| {
                let haystack = format!(
                    "{} {} {} {} {} {}",
                    r.id.as_str(),
                    r.brand,
                    r.model,
                    r.size,
                    r.location,
                    r.position
                )
                .to_lowercase();
                haystack.contains(q.as_str())
            });
            let condition_ok = condition.map_or(true, |c| r.condition == c);
            let category_ok = category.map_or(true, |c| r.category == c);
            query_ok && condition_ok && category_ok
        })
        .collect()
}
