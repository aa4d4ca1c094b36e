//! Validated text primitives shared by the Medico crates.
//!
//! Free-text fields on surgical cases (patient names, procedure codes, specialties, free-text
//! assistant names) must never be blank. [`NonEmptyText`] carries that guarantee in the type so
//! that downstream code does not need to re-check it.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input text exceeded the permitted number of characters
    #[error("Text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a new `NonEmptyText`, additionally bounding the trimmed length in characters.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for blank input and `TextError::TooLong` when the trimmed
    /// input has more than `max` characters.
    pub fn with_max_len(input: impl AsRef<str>, max: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max {
            return Err(TextError::TooLong { max });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  Appendectomy ").unwrap();
        assert_eq!(text.as_str(), "Appendectomy");
    }

    #[test]
    fn new_rejects_blank_input() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn with_max_len_counts_characters_not_bytes() {
        assert!(NonEmptyText::with_max_len("ñandú", 5).is_ok());
        assert_eq!(
            NonEmptyText::with_max_len("abcdef", 5),
            Err(TextError::TooLong { max: 5 })
        );
    }

    #[test]
    fn display_honours_width_and_precision() {
        let text = NonEmptyText::new("Ana").unwrap();
        assert_eq!(format!("{text:<6}|"), "Ana   |");
        assert_eq!(format!("{text:>5}"), "  Ana");
        assert_eq!(format!("{text:.2}"), "An");
    }

    #[test]
    fn deserialize_rejects_blank_strings() {
        let ok: NonEmptyText = serde_json::from_str("\" General \"").unwrap();
        assert_eq!(ok.as_str(), "General");
        assert!(serde_json::from_str::<NonEmptyText>("\"  \"").is_err());
    }
}
