//! Read models handed to transports.
//!
//! A [`CaseView`] joins a case with its hospital, its procedure totals and the permissions of
//! the user looking at it.

use crate::access::CasePermissions;
use crate::case::{Assistant, SurgicalCase};
use crate::constants::NO_ASSISTANT_LABEL;
use crate::directory::UserDirectory;
use crate::hospital::HospitalRegistry;
use crate::ledger::{ProcedureLedger, ProcedureTotals};
use medico_uuid::UserId;
use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct CaseView {
    pub case: SurgicalCase,
    /// `None` when the hospital is no longer in the registry.
    pub hospital_name: Option<String>,
    pub hospital_rate_multiplier: Option<Decimal>,
    pub totals: ProcedureTotals,
    pub primary_specialty: Option<String>,
    pub assistant_display_name: String,
    pub permissions: CasePermissions,
}

impl CaseView {
    pub fn build(
        case: SurgicalCase,
        hospitals: &HospitalRegistry,
        directory: &dyn UserDirectory,
        viewer: UserId,
    ) -> Self {
        let hospital = hospitals.get(case.hospital()).ok();
        let totals = ProcedureLedger::totals(case.procedures());
        let primary_specialty =
            ProcedureLedger::primary_specialty(case.procedures()).map(str::to_string);
        let assistant_display_name = assistant_display_name(case.assistant(), directory);
        let permissions = CasePermissions::for_user(&case, viewer);

        Self {
            hospital_name: hospital.as_ref().map(|h| h.name.as_str().to_string()),
            hospital_rate_multiplier: hospital.map(|h| h.rate_multiplier),
            totals,
            primary_specialty,
            assistant_display_name,
            permissions,
            case,
        }
    }
}

/// Name shown for the assistant: the directory name of a registered physician (their id when
/// unknown), the free-text name, or a fixed label when there is none.
pub fn assistant_display_name(assistant: &Assistant, directory: &dyn UserDirectory) -> String {
    match assistant {
        Assistant::None => NO_ASSISTANT_LABEL.to_string(),
        Assistant::FreeText(name) => name.as_str().to_string(),
        Assistant::Registered(user) => directory
            .display_name(*user)
            .unwrap_or_else(|| user.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::fixtures::case_owned_by;
    use crate::directory::StaticUserDirectory;
    use crate::hospital::HospitalSeed;
    use medico_types::NonEmptyText;

    #[test]
    fn display_name_covers_every_assistant_kind() {
        let colleague = UserId::new();
        let directory = StaticUserDirectory::new().with_user(colleague, "Dr. Paz");

        assert_eq!(assistant_display_name(&Assistant::None, &directory), "No assistant");
        assert_eq!(
            assistant_display_name(&Assistant::Registered(colleague), &directory),
            "Dr. Paz"
        );
        let stranger = UserId::new();
        assert_eq!(
            assistant_display_name(&Assistant::Registered(stranger), &directory),
            stranger.to_string()
        );
        assert_eq!(
            assistant_display_name(
                &Assistant::FreeText(NonEmptyText::new("Dr. Ruiz").unwrap()),
                &directory
            ),
            "Dr. Ruiz"
        );
    }

    #[test]
    fn build_joins_hospital_and_totals() {
        let registry = HospitalRegistry::in_memory();
        let hospital = registry
            .register(HospitalSeed {
                name: "Central".into(),
                ..HospitalSeed::default()
            })
            .unwrap();
        let owner = UserId::new();
        let mut case = case_owned_by(owner);
        case.schedule.hospital = hospital.id;

        let view = CaseView::build(case, &registry, &StaticUserDirectory::new(), owner);
        assert_eq!(view.hospital_name.as_deref(), Some("Central"));
        assert_eq!(view.totals.total_value.to_string(), "15.00");
        assert_eq!(view.primary_specialty.as_deref(), Some("General"));
        assert!(view.permissions.is_owner);
    }
}
