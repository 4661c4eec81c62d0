#![forbid(unsafe_code)]

use tirelog_contracts::auth::{role_allows, OperationClass, PermissionSet, Role, Session};
use tirelog_engines::credential::pin_digest_hex;
use tirelog_storage::SettingsRepo;

use crate::error::{AuthError, OpError};

/// Settings key holding the administrator PIN digest.
pub const ADMIN_HASH_KEY: &str = "admin_hash";

/// Resolves a requested role against the stored credential. On success the
/// session's active role is updated and the resulting permission set is
/// returned; on failure the session is left untouched.
///
/// Edit elevation reuses the admin secret whenever one is configured; a
/// single shared secret covers both tiers. With no credential stored,
/// Edit elevation is unchecked.
pub fn request_role<S: SettingsRepo>(
    session: &mut Session,
    store: &S,
    wanted: Role,
    supplied_secret: &str,
) -> Result<PermissionSet, OpError> {
    let stored_hash = store.get_setting(ADMIN_HASH_KEY);
    match wanted {
        Role::Admin => {
            let Some(hash) = stored_hash else {
                return Err(OpError::Auth(AuthError::NoCredential));
            };
            if pin_digest_hex(supplied_secret) != hash {
                return Err(OpError::Auth(AuthError::Mismatch));
            }
        }
        Role::Edit => {
            if let Some(hash) = stored_hash {
                if pin_digest_hex(supplied_secret) != hash {
                    return Err(OpError::Auth(AuthError::Mismatch));
                }
            }
        }
        Role::Add | Role::View => {}
    }
    session.active_role = wanted;
    Ok(PermissionSet::for_role(wanted))
}

/// Digests and stores the new secret, unconditionally overwriting any
/// prior credential. No re-authentication is required to reset (accepted
/// single-device tradeoff).
pub fn set_credential<S: SettingsRepo>(store: &mut S, new_secret: &str) -> Result<(), OpError> {
    if new_secret.trim().is_empty() {
        return Err(OpError::Validation("credential must not be empty"));
    }
    store.put_setting(ADMIN_HASH_KEY, &pin_digest_hex(new_secret))?;
    Ok(())
}

/// Pure function of the active role and the permission table. No side
/// effects.
pub fn authorize(session: &Session, class: OperationClass) -> bool {
    role_allows(session.active_role, class)
}
