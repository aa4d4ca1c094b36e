use super::{mutated_copy, CaseStore};
use crate::case::SurgicalCase;
use crate::constants::CASE_FILENAME;
use crate::error::Entity;
use crate::storage::{read_yaml, write_yaml_atomic};
use crate::{CaseError, CaseResult, CoreConfig};
use medico_uuid::{CaseId, ShardableUuid};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// File-backed store.
///
/// Each case lives in `cases/<s1>/<s2>/<uuid>/case.yaml`. Writes are serialised by a process
/// lock and land through a temp-file rename, so readers never observe a partial case.
pub struct FileCaseStore {
    cfg: Arc<CoreConfig>,
    write_lock: Mutex<()>,
}

impl FileCaseStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            write_lock: Mutex::new(()),
        }
    }

    fn case_file(&self, id: CaseId) -> PathBuf {
        id.shardable()
            .sharded_dir(&self.cfg.cases_dir())
            .join(CASE_FILENAME)
    }

    fn read_case(&self, id: CaseId) -> CaseResult<SurgicalCase> {
        let path = self.case_file(id);
        let case: SurgicalCase =
            read_yaml(&path)?.ok_or_else(|| CaseError::not_found(Entity::Case, id))?;
        check_record(&path, case)
    }

    fn write_case(&self, case: &SurgicalCase) -> CaseResult<()> {
        write_yaml_atomic(&self.case_file(case.id()), case)
    }
}

impl CaseStore for FileCaseStore {
    fn insert(&self, case: SurgicalCase) -> CaseResult<()> {
        case.check_invariants()?;
        let _guard = self.write_lock.lock()?;
        let path = self.case_file(case.id());
        if path.exists() {
            return Err(CaseError::FileWrite(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("case {} already exists", case.id()),
            )));
        }
        self.write_case(&case)
    }

    fn load(&self, id: CaseId) -> CaseResult<SurgicalCase> {
        self.read_case(id)
    }

    fn update<T, F>(&self, id: CaseId, mutate: F) -> CaseResult<(T, SurgicalCase)>
    where
        F: FnOnce(&mut SurgicalCase) -> CaseResult<T>,
    {
        let _guard = self.write_lock.lock()?;
        let current = self.read_case(id)?;
        let (value, next) = mutated_copy(&current, mutate)?;
        self.write_case(&next)?;
        Ok((value, next))
    }

    fn remove<F>(&self, id: CaseId, guard: F) -> CaseResult<SurgicalCase>
    where
        F: FnOnce(&SurgicalCase) -> CaseResult<()>,
    {
        let _lock = self.write_lock.lock()?;
        let current = self.read_case(id)?;
        guard(&current)?;

        let dir = id.shardable().sharded_dir(&self.cfg.cases_dir());
        fs::remove_dir_all(&dir).map_err(CaseError::FileWrite)?;
        Ok(current)
    }

    fn list(&self) -> CaseResult<Vec<SurgicalCase>> {
        let mut cases = Vec::new();
        for dir in case_dirs(&self.cfg.cases_dir())? {
            let path = dir.join(CASE_FILENAME);
            let parsed = read_yaml::<SurgicalCase>(&path)
                .and_then(|found| found.map(|case| check_record(&path, case)).transpose());
            match parsed {
                Ok(Some(case)) => cases.push(case),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("failed to read case record: {} - {}", path.display(), e);
                }
            }
        }
        Ok(cases)
    }
}

/// Rejects stored records that break an invariant, e.g. after a manual edit.
fn check_record(path: &Path, case: SurgicalCase) -> CaseResult<SurgicalCase> {
    match case.check_invariants() {
        Ok(()) => Ok(case),
        Err(source) => Err(CaseError::CorruptRecord {
            path: path.to_path_buf(),
            source: Box::new(source),
        }),
    }
}

/// Leaf directories of the `<s1>/<s2>/<uuid>` layout whose names are canonical UUIDs.
fn case_dirs(cases_dir: &Path) -> CaseResult<Vec<PathBuf>> {
    let mut leaves = Vec::new();
    if !cases_dir.exists() {
        return Ok(leaves);
    }
    for s1 in subdirs(cases_dir)? {
        for s2 in subdirs(&s1)? {
            for leaf in subdirs(&s2)? {
                let canonical = leaf
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(ShardableUuid::is_canonical);
                if canonical {
                    leaves.push(leaf);
                }
            }
        }
    }
    Ok(leaves)
}

fn subdirs(dir: &Path) -> CaseResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(CaseError::FileRead)? {
        let entry = entry.map_err(CaseError::FileRead)?;
        if entry.file_type().map_err(CaseError::FileRead)?.is_dir() {
            out.push(entry.path());
        }
    }
    Ok(out)
}
