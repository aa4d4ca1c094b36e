use super::{mutated_copy, CaseStore};
use crate::case::SurgicalCase;
use crate::error::Entity;
use crate::{CaseError, CaseResult};
use medico_uuid::CaseId;
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local store, used by tests and dry runs.
#[derive(Default)]
pub struct InMemoryCaseStore {
    cases: RwLock<HashMap<CaseId, SurgicalCase>>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaseStore for InMemoryCaseStore {
    fn insert(&self, case: SurgicalCase) -> CaseResult<()> {
        case.check_invariants()?;
        self.cases.write()?.insert(case.id(), case);
        Ok(())
    }

    fn load(&self, id: CaseId) -> CaseResult<SurgicalCase> {
        self.cases
            .read()?
            .get(&id)
            .cloned()
            .ok_or_else(|| CaseError::not_found(Entity::Case, id))
    }

    fn update<T, F>(&self, id: CaseId, mutate: F) -> CaseResult<(T, SurgicalCase)>
    where
        F: FnOnce(&mut SurgicalCase) -> CaseResult<T>,
    {
        let mut cases = self.cases.write()?;
        let current = cases
            .get(&id)
            .ok_or_else(|| CaseError::not_found(Entity::Case, id))?;
        let (value, next) = mutated_copy(current, mutate)?;
        cases.insert(id, next.clone());
        Ok((value, next))
    }

    fn remove<F>(&self, id: CaseId, guard: F) -> CaseResult<SurgicalCase>
    where
        F: FnOnce(&SurgicalCase) -> CaseResult<()>,
    {
        let mut cases = self.cases.write()?;
        let current = cases
            .get(&id)
            .ok_or_else(|| CaseError::not_found(Entity::Case, id))?;
        guard(current)?;
        cases
            .remove(&id)
            .ok_or_else(|| CaseError::not_found(Entity::Case, id))
    }

    fn list(&self) -> CaseResult<Vec<SurgicalCase>> {
        Ok(self.cases.read()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::fixtures::case_owned_by;
    use medico_uuid::UserId;

    #[test]
    fn failed_update_is_not_committed() {
        let store = InMemoryCaseStore::new();
        let case = case_owned_by(UserId::new());
        let id = case.id();
        store.insert(case.clone()).unwrap();

        let result = store.update(id, |c| {
            c.procedures.clear();
            Ok(())
        });
        assert!(matches!(result, Err(CaseError::Validation { .. })));
        assert_eq!(store.load(id).unwrap(), case);
    }

    #[test]
    fn remove_respects_guard() {
        let store = InMemoryCaseStore::new();
        let case = case_owned_by(UserId::new());
        let id = case.id();
        store.insert(case).unwrap();

        let blocked = store.remove(id, |_| Err(CaseError::NotDeletable { reason: "test" }));
        assert!(blocked.is_err());
        assert!(store.load(id).is_ok());

        store.remove(id, |_| Ok(())).unwrap();
        assert!(matches!(
            store.load(id),
            Err(CaseError::NotFound { entity: Entity::Case, .. })
        ));
    }
}
