#![forbid(unsafe_code)]

use crate::tire::TireId;

/// Privilege tiers. The derived `Ord` is the privilege order:
/// View < Add < Edit < Admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    View,
    Add,
    Edit,
    Admin,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::View => "VIEW",
            Role::Add => "ADD",
            Role::Edit => "EDIT",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "view" => Some(Role::View),
            "add" => Some(Role::Add),
            "edit" => Some(Role::Edit),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The unit of permission checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    Read,
    Create,
    Modify,
    Relocate,
    Delete,
    AttachSignature,
}

impl OperationClass {
    pub const ALL: [OperationClass; 6] = [
        OperationClass::Read,
        OperationClass::Create,
        OperationClass::Modify,
        OperationClass::Relocate,
        OperationClass::Delete,
        OperationClass::AttachSignature,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OperationClass::Read => "read",
            OperationClass::Create => "create",
            OperationClass::Modify => "modify",
            OperationClass::Relocate => "relocate",
            OperationClass::Delete => "delete",
            OperationClass::AttachSignature => "attach-signature",
        }
    }
}

/// Pure permission table. Total over all role/class pairs.
pub fn role_allows(role: Role, class: OperationClass) -> bool {
    match class {
        OperationClass::Read => true,
        OperationClass::Create | OperationClass::AttachSignature => role >= Role::Add,
        OperationClass::Modify | OperationClass::Relocate => role >= Role::Edit,
        OperationClass::Delete => role == Role::Admin,
    }
}

/// The operation classes a role may perform, resolved once at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    pub role: Role,
    pub allowed: Vec<OperationClass>,
}

impl PermissionSet {
    pub fn for_role(role: Role) -> Self {
        Self {
            role,
            allowed: OperationClass::ALL
                .into_iter()
                .filter(|c| role_allows(role, *c))
                .collect(),
        }
    }

    pub fn allows(&self, class: OperationClass) -> bool {
        self.allowed.contains(&class)
    }
}

/// Process-wide session context. Never persisted. `selected_tire` is a
/// lookup key only; the store owns the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub active_role: Role,
    pub selected_tire: Option<TireId>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            active_role: Role::View,
            selected_tire: None,
        }
    }
}
