//! Case listing filters.

use crate::case::{CaseStatus, SurgicalCase};
use chrono::NaiveDate;
use medico_uuid::{HospitalId, UserId};

/// Filters applied to the cases a user can see (own plus assisted).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub hospital: Option<HospitalId>,
    /// Inclusive lower bound on `surgery_date`.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on `surgery_date`.
    pub date_to: Option<NaiveDate>,
    /// Case-insensitive substring of the patient name or patient id.
    pub search: Option<String>,
    /// Only cases where the user is the registered assistant.
    pub assisted_only: bool,
}

impl CaseFilter {
    pub fn matches(&self, case: &SurgicalCase, user: UserId) -> bool {
        let visible = if self.assisted_only {
            case.is_assisted_by(user)
        } else {
            case.is_owned_by(user) || case.is_assisted_by(user)
        };
        if !visible {
            return false;
        }

        if self.status.is_some_and(|s| s != case.status()) {
            return false;
        }
        if self.hospital.is_some_and(|h| h != case.hospital()) {
            return false;
        }
        let date = case.schedule().surgery_date;
        if self.date_from.is_some_and(|from| date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| date > to) {
            return false;
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                let patient = case.patient();
                patient.name.as_str().to_lowercase().contains(&needle)
                    || patient
                        .id
                        .as_ref()
                        .is_some_and(|id| id.as_str().to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Keeps matching cases, most recent surgery first, then most recently created.
    pub fn apply(&self, cases: Vec<SurgicalCase>, user: UserId) -> Vec<SurgicalCase> {
        let mut out: Vec<SurgicalCase> = cases
            .into_iter()
            .filter(|c| self.matches(c, user))
            .collect();
        sort_recent_first(&mut out);
        out
    }
}

/// Orders by `surgery_date` descending, then `created_at` descending.
pub fn sort_recent_first(cases: &mut [SurgicalCase]) {
    cases.sort_by(|a, b| {
        b.schedule()
            .surgery_date
            .cmp(&a.schedule().surgery_date)
            .then_with(|| b.created_at().cmp(&a.created_at()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::fixtures::case_owned_by;
    use crate::case::Assistant;
    use medico_types::NonEmptyText;

    fn on(date: (i32, u32, u32), owner: UserId) -> SurgicalCase {
        let mut case = case_owned_by(owner);
        case.schedule.surgery_date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        case
    }

    #[test]
    fn lists_own_and_assisted_cases_newest_first() {
        let me = UserId::new();
        let mine = on((2026, 1, 10), me);
        let mut assisted = on((2026, 2, 1), UserId::new());
        assisted.assistant = Assistant::Registered(me);
        let foreign = on((2026, 3, 1), UserId::new());

        let listed = CaseFilter::default().apply(vec![mine.clone(), assisted.clone(), foreign], me);
        let ids: Vec<_> = listed.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![assisted.id(), mine.id()]);

        let only_assisted = CaseFilter {
            assisted_only: true,
            ..CaseFilter::default()
        };
        assert_eq!(only_assisted.apply(vec![mine, assisted.clone()], me).len(), 1);
    }

    #[test]
    fn filters_by_date_range_and_status() {
        let me = UserId::new();
        let mut billed = on((2026, 4, 15), me);
        billed.status = CaseStatus::Billed;
        let early = on((2026, 1, 1), me);

        let filter = CaseFilter {
            date_from: NaiveDate::from_ymd_opt(2026, 4, 15),
            date_to: NaiveDate::from_ymd_opt(2026, 4, 30),
            status: Some(CaseStatus::Billed),
            ..CaseFilter::default()
        };
        assert!(filter.matches(&billed, me));
        assert!(!filter.matches(&early, me));
    }

    #[test]
    fn search_matches_name_or_patient_id() {
        let me = UserId::new();
        let mut case = on((2026, 4, 15), me);
        case.patient.id = Some(NonEmptyText::new("HC-4471").unwrap());

        let by_name = CaseFilter {
            search: Some("TORRES".into()),
            ..CaseFilter::default()
        };
        let by_id = CaseFilter {
            search: Some("hc-44".into()),
            ..CaseFilter::default()
        };
        let miss = CaseFilter {
            search: Some("gomez".into()),
            ..CaseFilter::default()
        };
        assert!(by_name.matches(&case, me));
        assert!(by_id.matches(&case, me));
        assert!(!miss.matches(&case, me));
    }
}
