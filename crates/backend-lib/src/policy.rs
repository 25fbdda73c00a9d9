// ============================
// inventory-backend-lib/src/policy.rs
// ============================
//! Resource authorization policy.
//!
//! One pure decision function for every mutating handler. Existence is the
//! caller's problem and is checked before ownership, so a missing resource
//! is 404 for everyone and never leaks into a 403.
use inventory_common::Role;
use uuid::Uuid;

/// Operation the caller wants to perform on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// Policy verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Decide whether `caller` may perform `action` on a resource owned by
/// `resource_owner`. Reads are open; mutation requires ownership or the
/// admin role.
pub fn authorize(
    action: Action,
    resource_owner: Uuid,
    caller: Uuid,
    caller_role: Role,
) -> Decision {
    if action == Action::Read {
        return Decision::Allow;
    }
    if caller == resource_owner || caller_role == Role::Admin {
        return Decision::Allow;
    }
    Decision::Deny
}
