//! YAML file helpers shared by the file-backed stores.
//!
//! Records are written to a sibling temporary file and renamed over the target, so readers see
//! either the previous or the new record and never a partial one.

use crate::{CaseError, CaseResult};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Parses YAML text, reporting the path of the first mismatching field.
///
/// # Errors
///
/// Returns `CaseError::Deserialization` with a best-effort field path (e.g.
/// `procedures[0].rvu`, or `<root>`) when the text does not match `T`.
pub fn parse_yaml<T: DeserializeOwned>(yaml_text: &str) -> CaseResult<T> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let message = err.into_inner().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        CaseError::Deserialization { path, message }
    })
}

/// Reads and parses a YAML file. Returns `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// Returns `CaseError::FileRead` if the file exists but cannot be read, and
/// `CaseError::Deserialization` if it cannot be parsed.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> CaseResult<Option<T>> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_yaml(&contents).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CaseError::FileRead(e)),
    }
}

/// Serialises `value` and atomically replaces `path` with it.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns a `CaseError` if:
/// - the value cannot be serialised (`YamlSerialization`),
/// - the parent directory cannot be created (`StorageDirCreation`),
/// - writing or renaming the temporary file fails (`FileWrite`).
pub fn write_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> CaseResult<()> {
    let yaml = serde_yaml::to_string(value).map_err(CaseError::YamlSerialization)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(CaseError::StorageDirCreation)?;
    }

    let tmp = temp_path(path);
    if let Err(e) = fs::write(&tmp, yaml) {
        let _ = fs::remove_file(&tmp);
        return Err(CaseError::FileWrite(e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(CaseError::FileWrite(e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    #[test]
    fn write_then_read_replaces_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("record.yaml");

        write_yaml_atomic(&path, &Record { name: "a".into(), count: 1 }).unwrap();
        write_yaml_atomic(&path, &Record { name: "b".into(), count: 2 }).unwrap();

        let back: Record = read_yaml(&path).unwrap().unwrap();
        assert_eq!(back, Record { name: "b".into(), count: 2 });
        assert!(!dir.path().join("nested").join("record.yaml.tmp").exists());
    }

    #[test]
    fn read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let missing: Option<Record> = read_yaml(&dir.path().join("nope.yaml")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn parse_reports_failing_field_path() {
        let err = parse_yaml::<Record>("name: a\ncount: lots\n").unwrap_err();
        match err {
            CaseError::Deserialization { path, .. } => assert_eq!(path, "count"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
