//! Case persistence.
//!
//! A [`CaseStore`] persists whole cases, procedures included. Every mutation is a
//! read-modify-write run under the store's write lock: the closure works on a private copy,
//! and the copy is committed in one step only if the closure and the invariant check succeed.

mod file;
mod memory;

pub use file::FileCaseStore;
pub use memory::InMemoryCaseStore;

use crate::case::SurgicalCase;
use crate::CaseResult;
use medico_uuid::CaseId;

pub trait CaseStore: Send + Sync {
    /// Persists a new case.
    fn insert(&self, case: SurgicalCase) -> CaseResult<()>;

    /// # Errors
    ///
    /// Returns `CaseError::NotFound` if no case has this id.
    fn load(&self, id: CaseId) -> CaseResult<SurgicalCase>;

    /// Runs `mutate` on a copy of the stored case and commits the copy if it succeeds.
    ///
    /// Returns the closure's value together with the committed case.
    fn update<T, F>(&self, id: CaseId, mutate: F) -> CaseResult<(T, SurgicalCase)>
    where
        F: FnOnce(&mut SurgicalCase) -> CaseResult<T>;

    /// Removes the case if `guard` accepts the stored record.
    fn remove<F>(&self, id: CaseId, guard: F) -> CaseResult<SurgicalCase>
    where
        F: FnOnce(&SurgicalCase) -> CaseResult<()>;

    /// Every readable case, in no particular order.
    fn list(&self) -> CaseResult<Vec<SurgicalCase>>;
}

/// Applies `mutate` to a copy of `current` and checks the invariants of the result.
pub(crate) fn mutated_copy<T, F>(current: &SurgicalCase, mutate: F) -> CaseResult<(T, SurgicalCase)>
where
    F: FnOnce(&mut SurgicalCase) -> CaseResult<T>,
{
    let mut next = current.clone();
    let value = mutate(&mut next)?;
    next.check_invariants()?;
    Ok((value, next))
}
