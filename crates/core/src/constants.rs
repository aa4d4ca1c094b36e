//! Constants used throughout the Medico core crate.
//!
//! Path names, file names and field limits live here so that stores, validation and
//! transports agree on them.

use rust_decimal::Decimal;

/// Directory name for surgical case storage under the data directory.
pub const CASES_DIR_NAME: &str = "cases";

/// Default directory for case data when no explicit directory is configured.
pub const DEFAULT_CASE_DATA_DIR: &str = "case_data";

/// Filename holding one case (including its procedures) inside its sharded directory.
pub const CASE_FILENAME: &str = "case.yaml";

/// Default filename of the hospital registry, relative to the data directory.
pub const HOSPITALS_FILENAME: &str = "hospitals.yaml";

/// Multiplier applied when a hospital is registered without one.
pub const DEFAULT_RATE_MULTIPLIER: Decimal = Decimal::ONE;

/// Fractional digits kept for RVUs, factors and monetary values.
pub const MONEY_SCALE: u32 = 2;

/// Total significant digits (including the two fractional ones) allowed per amount.
pub const RVU_MAX_DIGITS: u32 = 10;
pub const FACTOR_MAX_DIGITS: u32 = 5;
pub const VALUE_MAX_DIGITS: u32 = 15;

/// Display name used when a case has no assistant.
pub const NO_ASSISTANT_LABEL: &str = "No assistant";

/// Number of specialties reported in case statistics.
pub const STATS_TOP_SPECIALTIES: usize = 5;

/// Number of recent cases reported in case statistics.
pub const STATS_RECENT_CASES: usize = 5;

pub const PATIENT_NAME_MAX_LEN: usize = 255;
pub const PATIENT_ID_MAX_LEN: usize = 50;
pub const HOSPITAL_NAME_MAX_LEN: usize = 200;
pub const SURGERY_CODE_MAX_LEN: usize = 50;
pub const SURGERY_NAME_MAX_LEN: usize = 500;
pub const SPECIALTY_MAX_LEN: usize = 100;
pub const GRUPO_MAX_LEN: usize = 100;
pub const ASSISTANT_NAME_MAX_LEN: usize = 255;
pub const CALENDAR_EVENT_ID_MAX_LEN: usize = 255;
