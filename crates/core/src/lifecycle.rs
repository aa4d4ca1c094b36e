//! Case lifecycle engine.
//!
//! The three [`ProcessFlags`] are the only gating state for money movement: work must be
//! operated before it is billed and billed before it is paid. The descriptive [`CaseStatus`]
//! label is changed independently and never reconciled with the flags.

use crate::access::CaseAction;
use crate::case::{Assistant, AssistantConsent, CaseStatus, ProcessFlags, SurgicalCase};
use crate::{CaseError, CaseResult};
use medico_uuid::UserId;

/// Partial update of the process flags; `None` keeps the stored value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlagsPatch {
    pub is_operated: Option<bool>,
    pub is_billed: Option<bool>,
    pub is_paid: Option<bool>,
}

impl FlagsPatch {
    pub fn is_empty(&self) -> bool {
        self.is_operated.is_none() && self.is_billed.is_none() && self.is_paid.is_none()
    }

    /// Overlays the patch on the stored flags. The result still has to pass [`validate`].
    pub fn merge(&self, current: ProcessFlags) -> ProcessFlags {
        ProcessFlags {
            is_operated: self.is_operated.unwrap_or(current.is_operated),
            is_billed: self.is_billed.unwrap_or(current.is_billed),
            is_paid: self.is_paid.unwrap_or(current.is_paid),
        }
    }
}

/// Checks billing monotonicity.
///
/// # Errors
///
/// Returns `CaseError::InvalidTransition` if the case is billed but not operated, or paid but
/// not billed.
pub fn validate(flags: &ProcessFlags) -> CaseResult<()> {
    if flags.is_billed && !flags.is_operated {
        return Err(CaseError::InvalidTransition {
            field: "is_billed",
            rule: "a case must be operated before it is billed",
        });
    }
    if flags.is_paid && !flags.is_billed {
        return Err(CaseError::InvalidTransition {
            field: "is_paid",
            rule: "a case must be billed before it is paid",
        });
    }
    Ok(())
}

/// Sets the descriptive status label. The process flags are left alone.
///
/// # Errors
///
/// Returns `CaseError::InvalidStatus` if `new_status` is not one of the five known labels.
pub fn update_status(case: &mut SurgicalCase, new_status: &str) -> CaseResult<CaseStatus> {
    let status: CaseStatus = new_status.parse()?;
    case.status = status;
    Ok(status)
}

/// Whether the case may be deleted at all, regardless of who asks.
///
/// True when the case is paid, when no assistant is attached, or when the registered assistant
/// rejected the invitation. A pending or accepted collaboration blocks deletion, and so does a
/// free-text assistant since its consent is never recorded.
pub fn can_be_deleted(case: &SurgicalCase) -> bool {
    if case.flags.is_paid {
        return true;
    }
    match case.assistant {
        Assistant::None => true,
        Assistant::Registered(_) => case.assistant_consent == AssistantConsent::Rejected,
        Assistant::FreeText(_) => false,
    }
}

/// Checks that `user` may delete `case` now.
///
/// # Errors
///
/// Returns `CaseError::PermissionDenied` unless `user` owns the case, then
/// `CaseError::NotDeletable` unless [`can_be_deleted`] holds.
pub fn ensure_deletable(case: &SurgicalCase, user: UserId) -> CaseResult<()> {
    if !case.is_owned_by(user) {
        return Err(CaseError::PermissionDenied {
            action: CaseAction::Delete,
            allowed: "the case owner",
        });
    }
    if !can_be_deleted(case) {
        let reason = match case.assistant {
            Assistant::FreeText(_) => "the case has an assistant and is not paid yet",
            _ if case.assistant_consent == AssistantConsent::Accepted => {
                "the assistant accepted the invitation and the case is not paid yet"
            }
            _ => "the assistant has not answered the invitation and the case is not paid yet",
        };
        return Err(CaseError::NotDeletable { reason });
    }
    Ok(())
}
