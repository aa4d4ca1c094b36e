//! Case service.
//!
//! Pure case operations with no transport concerns. Every operation takes the requesting user,
//! checks access, and runs its mutation as one atomic store update.

use crate::access::{self, CaseAction};
use crate::collaboration::{self, AssistedCases, InvitationResponse};
use crate::command::{CaseUpdate, NewCase};
use crate::directory::UserDirectory;
use crate::hospital::HospitalRegistry;
use crate::ledger::{ProcedureInput, ProcedureLedger};
use crate::lifecycle;
use crate::money::line_value;
use crate::query::CaseFilter;
use crate::stats::CaseStats;
use crate::store::CaseStore;
use crate::validation::{check_amount, non_negative_money, positive_multiplier};
use crate::view::CaseView;
use crate::constants::{RVU_MAX_DIGITS, VALUE_MAX_DIGITS};
use crate::{CaseError, CaseResult, CoreConfig};
use chrono::Utc;
use medico_uuid::{CaseId, HospitalId, ProcedureId, UserId};
use rust_decimal::Decimal;
use std::sync::Arc;

/// A value quoted by the calculator without storing anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    pub rvu: Decimal,
    pub factor: Decimal,
    pub value: Decimal,
}

pub struct CaseService<S: CaseStore> {
    cfg: Arc<CoreConfig>,
    store: S,
    hospitals: Arc<HospitalRegistry>,
    directory: Arc<dyn UserDirectory>,
}

impl<S: CaseStore> CaseService<S> {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: S,
        hospitals: Arc<HospitalRegistry>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            cfg,
            store,
            hospitals,
            directory,
        }
    }

    pub fn hospitals(&self) -> &HospitalRegistry {
        &self.hospitals
    }

    /// Builds the read model of `case` as seen by `viewer`.
    pub fn view(&self, case: crate::case::SurgicalCase, viewer: UserId) -> CaseView {
        CaseView::build(case, &self.hospitals, self.directory.as_ref(), viewer)
    }

    /// Creates a case owned by `user`, pricing its procedures at the hospital's current
    /// multiplier.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::NotFound` for an unknown hospital, any validation error of
    /// [`NewCase::into_case`], or a storage error.
    pub fn create_case(&self, user: UserId, command: NewCase) -> CaseResult<CaseView> {
        let factor = self.hospitals.rate_multiplier(command.hospital)?;
        let case = command.into_case(user, factor, Utc::now())?;
        self.store.insert(case.clone())?;

        tracing::info!(
            case_id = %case.id(),
            owner = %user,
            procedures = case.procedures().len(),
            "created surgical case"
        );
        if let Some(assistant) = case.assistant().registered_user() {
            tracing::info!(case_id = %case.id(), %assistant, "assistant invited");
        }
        Ok(self.view(case, user))
    }

    /// # Errors
    ///
    /// Returns `CaseError::NotFound` for an unknown case and `CaseError::PermissionDenied`
    /// unless `user` owns or assists the case.
    pub fn get_case(&self, id: CaseId, user: UserId) -> CaseResult<CaseView> {
        let case = self.store.load(id)?;
        access::ensure_can_view(&case, user)?;
        Ok(self.view(case, user))
    }

    /// Applies a partial update. Only the owner may edit.
    ///
    /// When the update replaces the procedure set, new lines are priced at the multiplier of
    /// the hospital the case will reference afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` for non-owners, `CaseError::NotFound` for an
    /// unknown case or hospital, and any validation error of [`CaseUpdate::apply`]. Nothing is
    /// written on error.
    pub fn update_case(
        &self,
        id: CaseId,
        user: UserId,
        update: CaseUpdate,
    ) -> CaseResult<CaseView> {
        let (outcome, case) = self.store.update(id, |case| {
            access::ensure_can_edit(case, user, CaseAction::Edit)?;
            let target = update.target_hospital(case);
            let factor = if update.hospital.is_some() || update.procedures.is_some() {
                self.hospitals.rate_multiplier(target)?
            } else {
                self.cfg.default_rate_multiplier()
            };
            let now = Utc::now();
            let outcome = update.apply(case, factor, now)?;
            case.updated_at = now;
            Ok(outcome)
        })?;

        tracing::info!(
            case_id = %id,
            procedures_replaced = outcome.procedures_replaced,
            "updated surgical case"
        );
        if let Some(assistant) = outcome.assistant.invited {
            tracing::info!(case_id = %id, %assistant, "assistant invited");
        }
        Ok(self.view(case, user))
    }

    /// Replaces the whole procedure set, priced at the case hospital's current multiplier.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` for non-owners and `CaseError::Validation` for an
    /// empty or invalid list.
    pub fn replace_procedures(
        &self,
        id: CaseId,
        user: UserId,
        items: Vec<ProcedureInput>,
    ) -> CaseResult<CaseView> {
        let (_, case) = self.store.update(id, |case| {
            access::ensure_can_edit(case, user, CaseAction::Edit)?;
            let factor = self.hospitals.rate_multiplier(case.hospital())?;
            let now = Utc::now();
            ProcedureLedger::replace_procedures(case, items, factor, now)?;
            case.updated_at = now;
            Ok(())
        })?;
        Ok(self.view(case, user))
    }

    /// Appends one procedure line to an existing case.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` for non-owners and `CaseError::Validation` for an
    /// invalid line.
    pub fn add_procedure(
        &self,
        id: CaseId,
        user: UserId,
        item: ProcedureInput,
    ) -> CaseResult<(ProcedureId, CaseView)> {
        let (procedure_id, case) = self.store.update(id, |case| {
            access::ensure_can_edit(case, user, CaseAction::Edit)?;
            let factor = self.hospitals.rate_multiplier(case.hospital())?;
            let now = Utc::now();
            let procedure_id = ProcedureLedger::append_procedure(case, item, factor, now)?;
            case.updated_at = now;
            Ok(procedure_id)
        })?;
        tracing::debug!(case_id = %id, %procedure_id, "added procedure");
        Ok((procedure_id, self.view(case, user)))
    }

    /// Removes one procedure line; the last line of a case cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` for non-owners, `CaseError::NotFound` for an
    /// unknown line, and `CaseError::Validation` when removing the last line.
    pub fn remove_procedure(
        &self,
        id: CaseId,
        user: UserId,
        procedure_id: ProcedureId,
    ) -> CaseResult<CaseView> {
        let (_, case) = self.store.update(id, |case| {
            access::ensure_can_edit(case, user, CaseAction::Edit)?;
            ProcedureLedger::remove_procedure(case, procedure_id)?;
            case.updated_at = Utc::now();
            Ok(())
        })?;
        tracing::debug!(case_id = %id, %procedure_id, "removed procedure");
        Ok(self.view(case, user))
    }

    /// Changes the descriptive status label. The process flags are not touched.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` for non-owners and `CaseError::InvalidStatus` for
    /// an unknown label.
    pub fn update_status(
        &self,
        id: CaseId,
        user: UserId,
        new_status: &str,
    ) -> CaseResult<CaseView> {
        let (status, case) = self.store.update(id, |case| {
            access::ensure_can_edit(case, user, CaseAction::UpdateStatus)?;
            let status = lifecycle::update_status(case, new_status)?;
            case.updated_at = Utc::now();
            Ok(status)
        })?;
        tracing::info!(case_id = %id, %status, "changed case status");
        Ok(self.view(case, user))
    }

    /// Deletes a case together with its procedures.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` unless `user` owns the case, and
    /// `CaseError::NotDeletable` while a collaboration blocks deletion.
    pub fn delete_case(&self, id: CaseId, user: UserId) -> CaseResult<()> {
        let removed = self
            .store
            .remove(id, |case| lifecycle::ensure_deletable(case, user))?;
        tracing::info!(
            case_id = %id,
            procedures = removed.procedures().len(),
            "deleted surgical case"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` unless `user` is the registered assistant.
    pub fn accept_invitation(
        &self,
        id: CaseId,
        user: UserId,
    ) -> CaseResult<(InvitationResponse, CaseView)> {
        let (response, case) = self.store.update(id, |case| {
            let response = collaboration::accept_invitation(case, user)?;
            if response == InvitationResponse::Accepted {
                case.updated_at = Utc::now();
            }
            Ok(response)
        })?;
        tracing::info!(case_id = %id, assistant = %user, ?response, "invitation answered");
        Ok((response, self.view(case, user)))
    }

    /// # Errors
    ///
    /// Returns `CaseError::PermissionDenied` unless `user` is the registered assistant.
    pub fn reject_invitation(
        &self,
        id: CaseId,
        user: UserId,
    ) -> CaseResult<(InvitationResponse, CaseView)> {
        let (response, case) = self.store.update(id, |case| {
            let response = collaboration::reject_invitation(case, user)?;
            case.updated_at = Utc::now();
            Ok(response)
        })?;
        tracing::info!(case_id = %id, assistant = %user, ?response, "invitation answered");
        Ok((response, self.view(case, user)))
    }

    /// Cases owned or assisted by `user` that match `filter`, newest surgery first.
    pub fn list_cases(&self, user: UserId, filter: &CaseFilter) -> CaseResult<Vec<CaseView>> {
        let cases = filter.apply(self.store.list()?, user);
        Ok(cases.into_iter().map(|c| self.view(c, user)).collect())
    }

    /// Pending and accepted invitations of `user`, newest surgery first.
    pub fn assisted_cases(&self, user: UserId) -> CaseResult<AssistedCases<CaseView>> {
        let filter = CaseFilter {
            assisted_only: true,
            ..CaseFilter::default()
        };
        let cases = filter.apply(self.store.list()?, user);
        Ok(AssistedCases::collect(user, cases).map(|c| self.view(c, user)))
    }

    /// Statistics over the cases `user` owns.
    pub fn stats(&self, user: UserId) -> CaseResult<CaseStats> {
        let own = self
            .store
            .list()?
            .into_iter()
            .filter(|c| c.is_owned_by(user))
            .collect();
        Ok(CaseStats::compute(own))
    }

    /// Prices `rvu` without storing anything.
    ///
    /// The factor is `factor` if given, else the hospital's multiplier, else the configured
    /// default.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::Validation` for a negative or out-of-range `rvu`, a non-positive or
    /// out-of-range `factor`, or a product that does not fit a line value, and
    /// `CaseError::NotFound` for an unknown hospital.
    pub fn quote(
        &self,
        rvu: Decimal,
        hospital: Option<HospitalId>,
        factor: Option<Decimal>,
    ) -> CaseResult<Quote> {
        let rvu = non_negative_money("rvu", rvu, RVU_MAX_DIGITS)?;
        let factor = match (factor, hospital) {
            (Some(factor), _) => positive_multiplier("factor", factor)?,
            (None, Some(hospital)) => self.hospitals.rate_multiplier(hospital)?,
            (None, None) => self.cfg.default_rate_multiplier(),
        };
        let value = line_value(rvu, factor)
            .ok_or_else(|| CaseError::validation("value", "rvu times factor is out of range"))?;
        check_amount("value", value, VALUE_MAX_DIGITS)?;
        Ok(Quote {
            rvu,
            factor,
            value,
        })
    }
}
