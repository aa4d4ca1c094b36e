//! Procedure ledger.
//!
//! Owns the create/replace/append/remove lifecycle of a case's procedure lines and the monetary
//! aggregates computed from them. All values are fixed-point decimals with two fractional
//! digits (see [`crate::money`]).
//!
//! The hospital multiplier handed to these functions is snapshotted into each line as its
//! `hospital_factor`; later multiplier changes never touch stored lines.

use crate::case::SurgicalCase;
use crate::constants::{
    FACTOR_MAX_DIGITS, GRUPO_MAX_LEN, RVU_MAX_DIGITS, SPECIALTY_MAX_LEN, SURGERY_CODE_MAX_LEN,
    SURGERY_NAME_MAX_LEN, VALUE_MAX_DIGITS,
};
use crate::error::Entity;
use crate::money::{line_value, to_money};
use crate::validation::{
    check_amount, non_negative_money, optional_note, optional_text, required_text,
};
use crate::{CaseError, CaseResult};
use chrono::{DateTime, Utc};
use medico_types::NonEmptyText;
use medico_uuid::ProcedureId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw procedure line as submitted by a caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcedureInput {
    pub surgery_code: String,
    pub surgery_name: String,
    pub specialty: String,
    pub grupo: Option<String>,
    pub rvu: Decimal,
    /// Per-line override of the hospital multiplier. Absent means "use the hospital's".
    pub hospital_factor: Option<Decimal>,
    /// Explicit value. Absent or zero means "compute `rvu × factor`".
    pub calculated_value: Option<Decimal>,
    pub notes: Option<String>,
    pub order: Option<u32>,
}

/// One validated, priced procedure line owned by a case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseProcedure {
    pub id: ProcedureId,
    pub surgery_code: NonEmptyText,
    pub surgery_name: NonEmptyText,
    pub specialty: NonEmptyText,
    #[serde(default)]
    pub grupo: Option<NonEmptyText>,
    pub rvu: Decimal,
    pub hospital_factor: Decimal,
    pub calculated_value: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over a case's procedure lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcedureTotals {
    pub total_rvu: Decimal,
    pub total_value: Decimal,
    pub count: usize,
}

/// Zero-sized namespace for procedure ledger operations.
pub struct ProcedureLedger;

impl ProcedureLedger {
    /// Validates and prices a list of procedure inputs.
    ///
    /// Lines without an explicit `order` get `first_order + index`.
    ///
    /// # Arguments
    ///
    /// * `items` - The submitted lines, in submission order.
    /// * `default_factor` - The case hospital's current rate multiplier.
    /// * `first_order` - Order assigned to the first line that has no explicit order.
    /// * `now` - Creation timestamp for every line.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::Validation` if:
    /// - `items` is empty,
    /// - any line has a blank or overlong code, name or specialty,
    /// - any line has a negative `rvu`, `hospital_factor` or `calculated_value`,
    /// - any amount has more than two decimal places or too many integer digits.
    pub fn build(
        items: Vec<ProcedureInput>,
        default_factor: Decimal,
        first_order: u32,
        now: DateTime<Utc>,
    ) -> CaseResult<Vec<CaseProcedure>> {
        if items.is_empty() {
            return Err(CaseError::validation(
                "procedures",
                "at least one procedure is required",
            ));
        }

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let order = item.order.unwrap_or(first_order + index as u32);
                price_line(&format!("procedures[{index}]"), item, default_factor, order, now)
            })
            .collect()
    }

    /// Adds the priced lines to a case that does not yet carry procedures of its own.
    ///
    /// # Errors
    ///
    /// See [`ProcedureLedger::build`].
    pub fn add_procedures(
        case: &mut SurgicalCase,
        items: Vec<ProcedureInput>,
        default_factor: Decimal,
        now: DateTime<Utc>,
    ) -> CaseResult<()> {
        let lines = Self::build(items, default_factor, 0, now)?;
        case.procedures.extend(lines);
        Ok(())
    }

    /// Replaces every line of the case with the priced `items`.
    ///
    /// The new set is fully built before the old one is dropped, so a failure leaves the case
    /// untouched and the case never passes through an empty state.
    ///
    /// # Errors
    ///
    /// See [`ProcedureLedger::build`].
    pub fn replace_procedures(
        case: &mut SurgicalCase,
        items: Vec<ProcedureInput>,
        default_factor: Decimal,
        now: DateTime<Utc>,
    ) -> CaseResult<()> {
        let lines = Self::build(items, default_factor, 0, now)?;
        tracing::debug!(
            case_id = %case.id,
            removed = case.procedures.len(),
            added = lines.len(),
            "replacing procedure set"
        );
        case.procedures = lines;
        Ok(())
    }

    /// Appends a single line. Its order defaults to the current number of lines.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::Validation` for the same per-line reasons as [`ProcedureLedger::build`].
    pub fn append_procedure(
        case: &mut SurgicalCase,
        item: ProcedureInput,
        default_factor: Decimal,
        now: DateTime<Utc>,
    ) -> CaseResult<ProcedureId> {
        let order = item.order.unwrap_or(case.procedures.len() as u32);
        let line = price_line("procedure", item, default_factor, order, now)?;
        let id = line.id;
        case.procedures.push(line);
        Ok(id)
    }

    /// Removes one line by id.
    ///
    /// # Errors
    ///
    /// Returns `CaseError::NotFound` if the case has no such line, and `CaseError::Validation`
    /// if it is the last remaining line.
    pub fn remove_procedure(
        case: &mut SurgicalCase,
        procedure_id: ProcedureId,
    ) -> CaseResult<CaseProcedure> {
        let index = case
            .procedures
            .iter()
            .position(|p| p.id == procedure_id)
            .ok_or_else(|| CaseError::not_found(Entity::Procedure, procedure_id))?;

        if case.procedures.len() == 1 {
            return Err(CaseError::validation(
                "procedures",
                "cannot remove the last procedure of a case",
            ));
        }

        Ok(case.procedures.remove(index))
    }

    /// Sums RVUs and values over the lines. An empty slice yields zero totals.
    pub fn totals(procedures: &[CaseProcedure]) -> ProcedureTotals {
        let (total_rvu, total_value) = procedures.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(rvu, value), p| (rvu + p.rvu, value + p.calculated_value),
        );
        ProcedureTotals {
            total_rvu: to_money(total_rvu),
            total_value: to_money(total_value),
            count: procedures.len(),
        }
    }

    /// Specialty of the first line by `order`; ties keep insertion order.
    pub fn primary_specialty(procedures: &[CaseProcedure]) -> Option<&str> {
        procedures
            .iter()
            .enumerate()
            .min_by_key(|(index, p)| (p.order, *index))
            .map(|(_, p)| p.specialty.as_str())
    }

    /// Lines in display order (`order`, then insertion).
    pub fn ordered(procedures: &[CaseProcedure]) -> Vec<&CaseProcedure> {
        let mut lines: Vec<&CaseProcedure> = procedures.iter().collect();
        lines.sort_by_key(|p| p.order);
        lines
    }
}

fn price_line(
    prefix: &str,
    item: ProcedureInput,
    default_factor: Decimal,
    order: u32,
    now: DateTime<Utc>,
) -> CaseResult<CaseProcedure> {
    let field = |name: &str| format!("{prefix}.{name}");

    let surgery_code = required_text(
        &field("surgery_code"),
        &item.surgery_code,
        SURGERY_CODE_MAX_LEN,
    )?;
    let surgery_name = required_text(
        &field("surgery_name"),
        &item.surgery_name,
        SURGERY_NAME_MAX_LEN,
    )?;
    let specialty = required_text(&field("specialty"), &item.specialty, SPECIALTY_MAX_LEN)?;
    let grupo = optional_text(&field("grupo"), item.grupo.as_deref(), GRUPO_MAX_LEN)?;

    let rvu = non_negative_money(&field("rvu"), item.rvu, RVU_MAX_DIGITS)?;

    let hospital_factor = match item.hospital_factor {
        Some(factor) => non_negative_money(&field("hospital_factor"), factor, FACTOR_MAX_DIGITS)?,
        None => to_money(default_factor),
    };

    let explicit_value = match item.calculated_value {
        Some(value) => non_negative_money(&field("calculated_value"), value, VALUE_MAX_DIGITS)?,
        None => Decimal::ZERO,
    };
    let calculated_value = if explicit_value.is_zero() {
        let value = line_value(rvu, hospital_factor).ok_or_else(|| {
            CaseError::validation(field("calculated_value"), "rvu times factor is out of range")
        })?;
        check_amount(&field("calculated_value"), value, VALUE_MAX_DIGITS)?;
        value
    } else {
        explicit_value
    };

    tracing::debug!(
        code = surgery_code.as_str(),
        %rvu,
        %hospital_factor,
        %calculated_value,
        "priced procedure line"
    );

    Ok(CaseProcedure {
        id: ProcedureId::new(),
        surgery_code,
        surgery_name,
        specialty,
        grupo,
        rvu,
        hospital_factor,
        calculated_value,
        notes: optional_note(item.notes.as_deref()),
        order,
        created_at: now,
    })
}
