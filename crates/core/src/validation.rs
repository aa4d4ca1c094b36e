//! Input validation utilities.
//!
//! These helpers turn raw transport values into the validated building blocks of the data
//! model, reporting failures as [`CaseError::Validation`] with the offending field name.

use crate::constants::{FACTOR_MAX_DIGITS, MONEY_SCALE};
use crate::money::to_money;
use crate::{CaseError, CaseResult};
use medico_types::{NonEmptyText, TextError};
use rust_decimal::Decimal;

/// Validates a required, bounded free-text field.
///
/// # Errors
///
/// Returns a `CaseError::Validation` naming `field` if the value is blank or longer than `max`
/// characters after trimming.
pub fn required_text(field: &str, value: &str, max: usize) -> CaseResult<NonEmptyText> {
    NonEmptyText::with_max_len(value, max).map_err(|e| text_error(field, e))
}

/// Validates an optional, bounded free-text field. Blank input is treated as absent.
///
/// # Errors
///
/// Returns a `CaseError::Validation` naming `field` if the value exceeds `max` characters.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> CaseResult<Option<NonEmptyText>> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => required_text(field, raw, max).map(Some),
    }
}

/// Trims optional long-form text (diagnosis, notes); blank becomes `None`.
pub fn optional_note(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks that `value` fits a fixed-point amount with `max_digits` digits, two of them
/// fractional.
///
/// # Errors
///
/// Returns a `CaseError::Validation` naming `field` if `value` is negative, has more than two
/// fractional digits, or has too many integer digits.
pub fn check_amount(field: &str, value: Decimal, max_digits: u32) -> CaseResult<()> {
    if value < Decimal::ZERO {
        return Err(CaseError::validation(field, "must not be negative"));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(CaseError::validation(
            field,
            format!("must have at most {MONEY_SCALE} decimal places"),
        ));
    }
    let integer_digits = max_digits - MONEY_SCALE;
    if value.trunc() >= Decimal::from(10u64.pow(integer_digits)) {
        return Err(CaseError::validation(
            field,
            format!("must have at most {integer_digits} digits before the decimal point"),
        ));
    }
    Ok(())
}

/// Validates a non-negative amount (see [`check_amount`]) and pins it to two fractional digits.
///
/// # Errors
///
/// Same as [`check_amount`].
pub fn non_negative_money(field: &str, value: Decimal, max_digits: u32) -> CaseResult<Decimal> {
    check_amount(field, value, max_digits)?;
    Ok(to_money(value))
}

/// Validates a strictly positive multiplier of at most [`FACTOR_MAX_DIGITS`] digits.
///
/// # Errors
///
/// Returns a `CaseError::Validation` naming `field` if `value` is not strictly positive or does
/// not fit the factor bounds.
pub fn positive_multiplier(field: &str, value: Decimal) -> CaseResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(CaseError::validation(field, "must be greater than zero"));
    }
    non_negative_money(field, value, FACTOR_MAX_DIGITS)
}

fn text_error(field: &str, err: TextError) -> CaseError {
    let reason = match err {
        TextError::Empty => "must not be blank".to_string(),
        TextError::TooLong { max } => format!("must be at most {max} characters"),
    };
    CaseError::validation(field, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_bounds() {
        assert_eq!(
            required_text("patient_name", "  Ana  ", 10).unwrap().as_str(),
            "Ana"
        );
        let err = required_text("patient_name", "   ", 10).unwrap_err();
        assert!(matches!(err, CaseError::Validation { ref field, .. } if field == "patient_name"));
        let err = required_text("surgery_code", "12345678901", 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid surgery_code: must be at most 10 characters"
        );
    }

    #[test]
    fn optional_text_maps_blank_to_none() {
        assert_eq!(optional_text("grupo", Some(" "), 5).unwrap(), None);
        assert_eq!(optional_text("grupo", None, 5).unwrap(), None);
        assert!(optional_text("grupo", Some("too long"), 5).is_err());
    }

    #[test]
    fn non_negative_money_rejects_negatives() {
        assert!(non_negative_money("rvu", "-0.01".parse().unwrap(), 10).is_err());
        assert_eq!(
            non_negative_money("rvu", "2.3".parse().unwrap(), 10)
                .unwrap()
                .to_string(),
            "2.30"
        );
        assert!(non_negative_money("rvu", Decimal::ZERO, 10).is_ok());
    }

    #[test]
    fn amounts_with_more_than_two_decimals_are_rejected() {
        let err = non_negative_money("rvu", "1.005".parse().unwrap(), 10).unwrap_err();
        assert_eq!(err.to_string(), "invalid rvu: must have at most 2 decimal places");
        assert!(non_negative_money("rvu", "1.500".parse().unwrap(), 10).is_ok());
    }

    #[test]
    fn amounts_are_bounded_by_digit_count() {
        assert!(non_negative_money("rvu", "99999999.99".parse().unwrap(), 10).is_ok());
        let err = non_negative_money("rvu", "100000000".parse().unwrap(), 10).unwrap_err();
        assert!(matches!(err, CaseError::Validation { ref field, .. } if field == "rvu"));
        assert!(
            non_negative_money("rvu", "79228162514264337593543950335".parse().unwrap(), 10)
                .is_err()
        );
    }

    #[test]
    fn positive_multiplier_rejects_zero_and_oversized() {
        assert!(positive_multiplier("rate_multiplier", Decimal::ZERO).is_err());
        assert!(positive_multiplier("rate_multiplier", "0.001".parse().unwrap()).is_err());
        assert!(positive_multiplier("rate_multiplier", "1000".parse().unwrap()).is_err());
        assert_eq!(
            positive_multiplier("rate_multiplier", "1.2".parse().unwrap())
                .unwrap()
                .to_string(),
            "1.20"
        );
    }
}
