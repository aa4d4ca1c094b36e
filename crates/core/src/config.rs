//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services as `Arc<CoreConfig>`. Binaries read environment variables and hand
//! the raw values to the helpers below; core services never read the environment themselves.

use crate::constants::{
    CASES_DIR_NAME, DEFAULT_CASE_DATA_DIR, DEFAULT_RATE_MULTIPLIER, HOSPITALS_FILENAME,
};
use crate::money::to_money;
use crate::validation::positive_multiplier;
use crate::{CaseError, CaseResult};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    case_data_dir: PathBuf,
    hospitals_file: PathBuf,
    default_rate_multiplier: Decimal,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Validation`] if `default_rate_multiplier` is not a strictly positive
    /// factor with at most two decimal places.
    pub fn new(
        case_data_dir: PathBuf,
        hospitals_file: PathBuf,
        default_rate_multiplier: Decimal,
    ) -> CaseResult<Self> {
        let default_rate_multiplier =
            positive_multiplier("default_rate_multiplier", default_rate_multiplier)?;

        Ok(Self {
            case_data_dir,
            hospitals_file,
            default_rate_multiplier,
        })
    }

    /// Configuration rooted at `case_data_dir` with the default registry file and multiplier.
    pub fn with_data_dir(case_data_dir: PathBuf) -> Self {
        let hospitals_file = case_data_dir.join(HOSPITALS_FILENAME);
        Self {
            case_data_dir,
            hospitals_file,
            default_rate_multiplier: to_money(DEFAULT_RATE_MULTIPLIER),
        }
    }

    pub fn case_data_dir(&self) -> &Path {
        &self.case_data_dir
    }

    pub fn cases_dir(&self) -> PathBuf {
        self.case_data_dir.join(CASES_DIR_NAME)
    }

    pub fn hospitals_file(&self) -> &Path {
        &self.hospitals_file
    }

    pub fn default_rate_multiplier(&self) -> Decimal {
        self.default_rate_multiplier
    }
}

/// Resolve the case data directory from an optional override value.
///
/// Empty or whitespace-only values fall back to [`DEFAULT_CASE_DATA_DIR`].
pub fn case_data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CASE_DATA_DIR))
}

/// Resolve the hospital registry file, defaulting to `hospitals.yaml` inside `case_data_dir`.
pub fn hospitals_file_from_env_value(value: Option<String>, case_data_dir: &Path) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| case_data_dir.join(HOSPITALS_FILENAME))
}

/// Parse the default rate multiplier from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_RATE_MULTIPLIER`].
///
/// # Errors
///
/// Returns [`CaseError::Validation`] if the value is not a decimal number.
pub fn rate_multiplier_from_env_value(value: Option<String>) -> CaseResult<Decimal> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_RATE_MULTIPLIER),
        Some(raw) => raw.parse::<Decimal>().map_err(|e| {
            CaseError::validation("default_rate_multiplier", format!("'{raw}': {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_non_positive_multiplier() {
        let result = CoreConfig::new(
            PathBuf::from("data"),
            PathBuf::from("data/hospitals.yaml"),
            Decimal::ZERO,
        );
        assert!(matches!(result, Err(CaseError::Validation { .. })));
    }

    #[test]
    fn new_rejects_multiplier_outside_factor_bounds() {
        for raw in ["1000", "1.255"] {
            let result = CoreConfig::new(
                PathBuf::from("data"),
                PathBuf::from("data/hospitals.yaml"),
                raw.parse().unwrap(),
            );
            assert!(matches!(result, Err(CaseError::Validation { .. })), "{raw}");
        }
    }

    #[test]
    fn with_data_dir_derives_paths() {
        let cfg = CoreConfig::with_data_dir(PathBuf::from("/srv/medico"));
        assert_eq!(cfg.cases_dir(), PathBuf::from("/srv/medico/cases"));
        assert_eq!(
            cfg.hospitals_file(),
            Path::new("/srv/medico/hospitals.yaml")
        );
        assert_eq!(cfg.default_rate_multiplier().to_string(), "1.00");
    }

    #[test]
    fn env_values_fall_back_when_blank() {
        assert_eq!(
            case_data_dir_from_env_value(Some("  ".into())),
            PathBuf::from(DEFAULT_CASE_DATA_DIR)
        );
        assert_eq!(
            rate_multiplier_from_env_value(None).unwrap(),
            DEFAULT_RATE_MULTIPLIER
        );
        assert_eq!(
            rate_multiplier_from_env_value(Some("1.35".into())).unwrap(),
            "1.35".parse::<Decimal>().unwrap()
        );
        assert!(rate_multiplier_from_env_value(Some("abc".into())).is_err());
    }
}
