//! Access control layer.
//!
//! Pure permission derivations per (case, requesting user). An assistant may view a case but
//! never edit or delete it; an owner may always view and edit, and may delete only when the
//! lifecycle guard allows it.

use crate::case::SurgicalCase;
use crate::lifecycle;
use crate::{CaseError, CaseResult};
use medico_uuid::UserId;
use serde::Serialize;
use std::fmt;

/// Operations subject to a permission check, used in [`CaseError::PermissionDenied`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseAction {
    View,
    Edit,
    Delete,
    UpdateStatus,
    AcceptInvitation,
    RejectInvitation,
}

impl fmt::Display for CaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            CaseAction::View => "view this case",
            CaseAction::Edit => "edit this case",
            CaseAction::Delete => "delete this case",
            CaseAction::UpdateStatus => "change the status of this case",
            CaseAction::AcceptInvitation => "accept this invitation",
            CaseAction::RejectInvitation => "reject this invitation",
        };
        f.write_str(verb)
    }
}

pub fn can_view(case: &SurgicalCase, user: UserId) -> bool {
    case.is_owned_by(user) || case.is_assisted_by(user)
}

pub fn can_edit(case: &SurgicalCase, user: UserId) -> bool {
    case.is_owned_by(user)
}

pub fn can_delete(case: &SurgicalCase, user: UserId) -> bool {
    case.is_owned_by(user) && lifecycle::can_be_deleted(case)
}

/// Fails with `PermissionDenied` unless `user` may view `case`.
pub fn ensure_can_view(case: &SurgicalCase, user: UserId) -> CaseResult<()> {
    if can_view(case, user) {
        Ok(())
    } else {
        Err(CaseError::PermissionDenied {
            action: CaseAction::View,
            allowed: "the case owner or its registered assistant",
        })
    }
}

/// Fails with `PermissionDenied` unless `user` owns `case`.
///
/// `action` only shapes the error message; every owner-only mutation goes through here.
pub fn ensure_can_edit(case: &SurgicalCase, user: UserId, action: CaseAction) -> CaseResult<()> {
    if can_edit(case, user) {
        Ok(())
    } else {
        Err(CaseError::PermissionDenied {
            action,
            allowed: "the case owner",
        })
    }
}

/// Permission bundle attached to case views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CasePermissions {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub is_owner: bool,
}

impl CasePermissions {
    pub fn for_user(case: &SurgicalCase, user: UserId) -> Self {
        Self {
            can_view: can_view(case, user),
            can_edit: can_edit(case, user),
            can_delete: can_delete(case, user),
            is_owner: case.is_owned_by(user),
        }
    }
}
