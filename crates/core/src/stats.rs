//! Aggregate statistics over a physician's own cases.

use crate::case::{CaseStatus, SurgicalCase};
use crate::constants::{STATS_RECENT_CASES, STATS_TOP_SPECIALTIES};
use crate::ledger::ProcedureLedger;
use crate::money::to_money;
use crate::query::sort_recent_first;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusTotals {
    pub status: CaseStatus,
    pub count: usize,
    pub total_value: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecialtyTotals {
    pub specialty: String,
    /// Number of procedure lines with this specialty.
    pub count: usize,
    pub total_value: Decimal,
}

#[derive(Clone, Debug)]
pub struct CaseStats {
    pub total_cases: usize,
    pub total_procedures: usize,
    pub total_value: Decimal,
    /// One entry per status, in [`CaseStatus::ALL`] order, including empty ones.
    pub by_status: Vec<StatusTotals>,
    /// Most frequent specialties by procedure count; ties broken by name.
    pub top_specialties: Vec<SpecialtyTotals>,
    /// Most recent cases by surgery date, then creation time.
    pub recent_cases: Vec<SurgicalCase>,
}

impl CaseStats {
    pub fn compute(mut cases: Vec<SurgicalCase>) -> Self {
        let mut total_procedures = 0;
        let mut total_value = Decimal::ZERO;
        let mut by_status: Vec<StatusTotals> = CaseStatus::ALL
            .into_iter()
            .map(|status| StatusTotals {
                status,
                count: 0,
                total_value: Decimal::ZERO,
            })
            .collect();
        let mut specialties: HashMap<&str, (usize, Decimal)> = HashMap::new();

        for case in &cases {
            let totals = ProcedureLedger::totals(case.procedures());
            total_procedures += totals.count;
            total_value += totals.total_value;

            if let Some(entry) = by_status.iter_mut().find(|s| s.status == case.status()) {
                entry.count += 1;
                entry.total_value += totals.total_value;
            }

            for line in case.procedures() {
                let entry = specialties
                    .entry(line.specialty.as_str())
                    .or_insert((0, Decimal::ZERO));
                entry.0 += 1;
                entry.1 += line.calculated_value;
            }
        }

        let mut top_specialties: Vec<SpecialtyTotals> = specialties
            .into_iter()
            .map(|(specialty, (count, value))| SpecialtyTotals {
                specialty: specialty.to_string(),
                count,
                total_value: to_money(value),
            })
            .collect();
        top_specialties.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.specialty.cmp(&b.specialty))
        });
        top_specialties.truncate(STATS_TOP_SPECIALTIES);

        for entry in &mut by_status {
            entry.total_value = to_money(entry.total_value);
        }

        let total_cases = cases.len();
        sort_recent_first(&mut cases);
        cases.truncate(STATS_RECENT_CASES);

        Self {
            total_cases,
            total_procedures,
            total_value: to_money(total_value),
            by_status,
            top_specialties,
            recent_cases: cases,
        }
    }
}
