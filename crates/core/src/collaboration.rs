//! Collaboration protocol.
//!
//! Manages the optional assistant-physician invitation attached to a case: assignment,
//! consent state, and the accept/reject responses of the invited physician.
//!
//! Consent only ever changes through [`accept_invitation`], [`reject_invitation`] or a reset
//! caused by reassignment in [`apply_assistant_change`]. Free-text assistants never take part
//! in the protocol.

use crate::access::CaseAction;
use crate::case::{Assistant, AssistantConsent, SurgicalCase};
use crate::constants::ASSISTANT_NAME_MAX_LEN;
use crate::validation::optional_text;
use crate::{CaseError, CaseResult};
use chrono::{DateTime, Utc};
use medico_uuid::UserId;

/// Consent bookkeeping after an assistant change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssistantTransition {
    pub consent: AssistantConsent,
    pub notified_at: Option<DateTime<Utc>>,
    /// A registered physician was newly invited and should be notified.
    pub invited: Option<UserId>,
}

/// Computes consent state when the assistant goes from `old` to `new`.
///
/// - Unchanged assistant: consent and notification time are kept.
/// - A different registered physician: consent resets to pending and `notified_at` is `now`.
/// - Any other change (cleared, or switched to a free-text name): consent resets to pending,
///   `notified_at` is kept.
pub fn apply_assistant_change(
    old: &Assistant,
    new: &Assistant,
    consent: AssistantConsent,
    notified_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AssistantTransition {
    if old == new {
        return AssistantTransition {
            consent,
            notified_at,
            invited: None,
        };
    }

    match new {
        Assistant::Registered(user) => AssistantTransition {
            consent: AssistantConsent::Pending,
            notified_at: Some(now),
            invited: Some(*user),
        },
        Assistant::None | Assistant::FreeText(_) => AssistantTransition {
            consent: AssistantConsent::Pending,
            notified_at,
            invited: None,
        },
    }
}

/// Assigns `new` to the case and applies the resulting consent transition.
pub fn assign_assistant(
    case: &mut SurgicalCase,
    new: Assistant,
    now: DateTime<Utc>,
) -> AssistantTransition {
    let transition = apply_assistant_change(
        &case.assistant,
        &new,
        case.assistant_consent,
        case.assistant_notified_at,
        now,
    );
    case.assistant = new;
    case.assistant_consent = transition.consent;
    case.assistant_notified_at = transition.notified_at;
    transition
}

/// Patch over the two wire-level assistant fields.
///
/// Outer `None` keeps the current value; `Some(None)` clears it; `Some(Some(_))` sets it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssistantPatch {
    pub doctor: Option<Option<UserId>>,
    pub name: Option<Option<String>>,
}

impl AssistantPatch {
    pub fn is_empty(&self) -> bool {
        self.doctor.is_none() && self.name.is_none()
    }

    /// Resolves the patch against the current assistant.
    ///
    /// Setting one kind replaces the other. Clearing a kind only clears it if that kind is the
    /// one currently stored. A blank name counts as clearing it.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::Validation` if both a registered physician and a non-blank name are
    /// supplied, or if the name is too long.
    pub fn resolve(&self, current: &Assistant) -> CaseResult<Assistant> {
        let name = match &self.name {
            Some(Some(raw)) => {
                optional_text("assistant_doctor_name", Some(raw.as_str()), ASSISTANT_NAME_MAX_LEN)?
            }
            _ => None,
        };
        let clears_name = matches!(self.name, Some(_)) && name.is_none();

        match (self.doctor, name) {
            (Some(Some(_)), Some(_)) => Err(CaseError::validation(
                "assistant_doctor",
                "set either a registered assistant or a free-text name, not both",
            )),
            (Some(Some(user)), None) => Ok(Assistant::Registered(user)),
            (_, Some(name)) => Ok(Assistant::FreeText(name)),
            (doctor, None) => {
                let clears_doctor = matches!(doctor, Some(None));
                let next = match current {
                    Assistant::Registered(_) if clears_doctor => Assistant::None,
                    Assistant::FreeText(_) if clears_name => Assistant::None,
                    other => other.clone(),
                };
                Ok(next)
            }
        }
    }
}

/// Builds the initial assistant from the two optional create fields.
///
/// # Errors
///
/// See [`AssistantPatch::resolve`].
pub fn assistant_from_fields(
    doctor: Option<UserId>,
    name: Option<String>,
) -> CaseResult<Assistant> {
    AssistantPatch {
        doctor: Some(doctor),
        name: Some(name),
    }
    .resolve(&Assistant::None)
}

/// Outcome of an invitation response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvitationResponse {
    Accepted,
    /// The invitation had already been accepted; nothing changed.
    AlreadyAccepted,
    Rejected,
}

impl InvitationResponse {
    pub fn message(&self) -> &'static str {
        match self {
            InvitationResponse::Accepted => "Invitation accepted",
            InvitationResponse::AlreadyAccepted => "Invitation already accepted",
            InvitationResponse::Rejected => "Invitation rejected",
        }
    }
}

/// Accepts the invitation on behalf of `user`. Idempotent.
///
/// # Errors
///
/// Returns `CaseError::PermissionDenied` unless `user` is the registered assistant.
pub fn accept_invitation(case: &mut SurgicalCase, user: UserId) -> CaseResult<InvitationResponse> {
    ensure_invited(case, user, CaseAction::AcceptInvitation)?;
    if case.assistant_consent == AssistantConsent::Accepted {
        return Ok(InvitationResponse::AlreadyAccepted);
    }
    case.assistant_consent = AssistantConsent::Accepted;
    Ok(InvitationResponse::Accepted)
}

/// Rejects the invitation on behalf of `user`, whatever its prior state.
///
/// # Errors
///
/// Returns `CaseError::PermissionDenied` unless `user` is the registered assistant.
pub fn reject_invitation(case: &mut SurgicalCase, user: UserId) -> CaseResult<InvitationResponse> {
    ensure_invited(case, user, CaseAction::RejectInvitation)?;
    case.assistant_consent = AssistantConsent::Rejected;
    Ok(InvitationResponse::Rejected)
}

fn ensure_invited(case: &SurgicalCase, user: UserId, action: CaseAction) -> CaseResult<()> {
    if case.is_assisted_by(user) {
        Ok(())
    } else {
        Err(CaseError::PermissionDenied {
            action,
            allowed: "the invited assistant",
        })
    }
}

/// Cases a physician was invited to, split by consent. Rejected invitations are left out.
#[derive(Clone, Debug)]
pub struct AssistedCases<T = SurgicalCase> {
    pub pending: Vec<T>,
    pub accepted: Vec<T>,
}

impl AssistedCases {
    pub fn collect(user: UserId, cases: impl IntoIterator<Item = SurgicalCase>) -> Self {
        let mut out = Self {
            pending: Vec::new(),
            accepted: Vec::new(),
        };
        for case in cases.into_iter().filter(|c| c.is_assisted_by(user)) {
            match case.assistant_consent {
                AssistantConsent::Pending => out.pending.push(case),
                AssistantConsent::Accepted => out.accepted.push(case),
                AssistantConsent::Rejected => {}
            }
        }
        out
    }
}

impl<T> AssistedCases<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> AssistedCases<U> {
        AssistedCases {
            pending: self.pending.into_iter().map(&mut f).collect(),
            accepted: self.accepted.into_iter().map(&mut f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::fixtures::case_owned_by;
    use chrono::Duration;
    use medico_types::NonEmptyText;

    fn free_text(name: &str) -> Assistant {
        Assistant::FreeText(NonEmptyText::new(name).unwrap())
    }

    #[test]
    fn new_registered_assistant_resets_consent_and_notifies() {
        let earlier = Utc::now() - Duration::days(1);
        let now = Utc::now();
        let x = UserId::new();
        let y = UserId::new();

        let t = apply_assistant_change(
            &Assistant::Registered(x),
            &Assistant::Registered(y),
            AssistantConsent::Accepted,
            Some(earlier),
            now,
        );
        assert_eq!(t.consent, AssistantConsent::Pending);
        assert_eq!(t.notified_at, Some(now));
        assert_eq!(t.invited, Some(y));
    }

    #[test]
    fn same_assistant_keeps_consent() {
        let earlier = Utc::now() - Duration::days(1);
        let x = Assistant::Registered(UserId::new());
        let t = apply_assistant_change(
            &x,
            &x,
            AssistantConsent::Accepted,
            Some(earlier),
            Utc::now(),
        );
        assert_eq!(t.consent, AssistantConsent::Accepted);
        assert_eq!(t.notified_at, Some(earlier));
        assert_eq!(t.invited, None);
    }

    #[test]
    fn clearing_assistant_resets_consent_but_keeps_notified_at() {
        let earlier = Utc::now() - Duration::days(1);
        let t = apply_assistant_change(
            &Assistant::Registered(UserId::new()),
            &Assistant::None,
            AssistantConsent::Rejected,
            Some(earlier),
            Utc::now(),
        );
        assert_eq!(t.consent, AssistantConsent::Pending);
        assert_eq!(t.notified_at, Some(earlier));
    }

    #[test]
    fn invite_accept_reassign_round() {
        let owner = UserId::new();
        let x = UserId::new();
        let y = UserId::new();
        let mut case = case_owned_by(owner);

        assign_assistant(&mut case, Assistant::Registered(x), Utc::now());
        assert_eq!(case.assistant_consent(), AssistantConsent::Pending);
        assert!(case.assistant_notified_at().is_some());

        assert_eq!(
            accept_invitation(&mut case, x).unwrap(),
            InvitationResponse::Accepted
        );
        assert_eq!(case.assistant_consent(), AssistantConsent::Accepted);
        assert_eq!(
            accept_invitation(&mut case, x).unwrap(),
            InvitationResponse::AlreadyAccepted
        );

        assign_assistant(&mut case, Assistant::Registered(y), Utc::now());
        assert_eq!(case.assistant_consent(), AssistantConsent::Pending);
    }

    #[test]
    fn only_the_invited_assistant_may_respond() {
        let owner = UserId::new();
        let mut case = case_owned_by(owner);
        case.assistant = Assistant::Registered(UserId::new());

        assert!(matches!(
            accept_invitation(&mut case, owner),
            Err(CaseError::PermissionDenied {
                action: CaseAction::AcceptInvitation,
                ..
            })
        ));

        case.assistant = free_text("Dr. Ruiz");
        assert!(reject_invitation(&mut case, owner).is_err());
    }

    #[test]
    fn reject_is_idempotent_and_overrides_acceptance() {
        let x = UserId::new();
        let mut case = case_owned_by(UserId::new());
        case.assistant = Assistant::Registered(x);
        case.assistant_consent = AssistantConsent::Accepted;

        reject_invitation(&mut case, x).unwrap();
        reject_invitation(&mut case, x).unwrap();
        assert_eq!(case.assistant_consent(), AssistantConsent::Rejected);
    }

    #[test]
    fn patch_rejects_both_assistant_kinds() {
        let patch = AssistantPatch {
            doctor: Some(Some(UserId::new())),
            name: Some(Some("Dr. Ruiz".into())),
        };
        assert!(matches!(
            patch.resolve(&Assistant::None),
            Err(CaseError::Validation { ref field, .. }) if field == "assistant_doctor"
        ));
    }

    #[test]
    fn patch_clears_only_the_matching_kind() {
        let x = UserId::new();
        let registered = Assistant::Registered(x);

        let clear_name = AssistantPatch {
            doctor: None,
            name: Some(None),
        };
        assert_eq!(clear_name.resolve(&registered).unwrap(), registered);

        let clear_doctor = AssistantPatch {
            doctor: Some(None),
            name: None,
        };
        assert_eq!(clear_doctor.resolve(&registered).unwrap(), Assistant::None);
        assert_eq!(
            clear_doctor.resolve(&free_text("Dr. Ruiz")).unwrap(),
            free_text("Dr. Ruiz")
        );

        let blank_name = AssistantPatch {
            doctor: None,
            name: Some(Some("   ".into())),
        };
        assert_eq!(blank_name.resolve(&free_text("Dr. Ruiz")).unwrap(), Assistant::None);

        assert_eq!(AssistantPatch::default().resolve(&registered).unwrap(), registered);
    }

    #[test]
    fn setting_a_name_replaces_a_registered_assistant() {
        let patch = AssistantPatch {
            doctor: None,
            name: Some(Some("Dr. Ruiz".into())),
        };
        assert_eq!(
            patch.resolve(&Assistant::Registered(UserId::new())).unwrap(),
            free_text("Dr. Ruiz")
        );
        assert_eq!(
            assistant_from_fields(None, Some(" ".into())).unwrap(),
            Assistant::None
        );
    }

    #[test]
    fn assisted_cases_hide_rejections() {
        let x = UserId::new();
        let mut pending = case_owned_by(UserId::new());
        pending.assistant = Assistant::Registered(x);
        let mut accepted = pending.clone();
        accepted.assistant_consent = AssistantConsent::Accepted;
        let mut rejected = pending.clone();
        rejected.assistant_consent = AssistantConsent::Rejected;
        let unrelated = case_owned_by(x);

        let view = AssistedCases::collect(x, vec![pending, accepted, rejected, unrelated]);
        assert_eq!(view.pending.len(), 1);
        assert_eq!(view.accepted.len(), 1);
    }
}
