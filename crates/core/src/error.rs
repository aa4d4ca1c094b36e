use crate::access::CaseAction;

/// Which entity a [`CaseError::NotFound`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Case,
    Procedure,
    Hospital,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Case => "case",
            Entity::Procedure => "procedure",
            Entity::Hospital => "hospital",
        };
        f.write_str(name)
    }
}

/// Coarse error classification consumed by transports to pick a response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidTransition,
    InvalidStatus,
    PermissionDenied,
    NotDeletable,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::InvalidStatus => "invalid_status",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::NotDeletable => "not_deletable",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage_error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("cannot set {field}: {rule}")]
    InvalidTransition {
        field: &'static str,
        rule: &'static str,
    },
    #[error("invalid status '{0}' (expected one of: scheduled, completed, billed, paid, cancelled)")]
    InvalidStatus(String),
    #[error("permission denied: only {allowed} may {action}")]
    PermissionDenied {
        action: CaseAction,
        allowed: &'static str,
    },
    #[error("case cannot be deleted: {reason}")]
    NotDeletable { reason: &'static str },
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read stored record: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write stored record: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("stored record schema mismatch at {path}: {message}")]
    Deserialization { path: String, message: String },
    #[error("stored record violates an invariant ({path}): {source}")]
    CorruptRecord {
        path: std::path::PathBuf,
        #[source]
        source: Box<CaseError>,
    },
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl CaseError {
    /// Shorthand for a [`CaseError::Validation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CaseError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        CaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CaseError::Validation { .. } => ErrorKind::Validation,
            CaseError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            CaseError::InvalidStatus(_) => ErrorKind::InvalidStatus,
            CaseError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            CaseError::NotDeletable { .. } => ErrorKind::NotDeletable,
            CaseError::NotFound { .. } => ErrorKind::NotFound,
            CaseError::StorageDirCreation(_)
            | CaseError::FileRead(_)
            | CaseError::FileWrite(_)
            | CaseError::YamlSerialization(_)
            | CaseError::Deserialization { .. }
            | CaseError::CorruptRecord { .. }
            | CaseError::LockPoisoned => ErrorKind::Storage,
        }
    }

    /// The input field the error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            CaseError::Validation { field, .. } => Some(field),
            CaseError::InvalidTransition { field, .. } => Some(field),
            CaseError::InvalidStatus(_) => Some("status"),
            _ => None,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CaseError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        CaseError::LockPoisoned
    }
}

pub type CaseResult<T> = std::result::Result<T, CaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classifies_domain_and_storage_errors() {
        assert_eq!(
            CaseError::validation("procedures", "at least one procedure is required").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CaseError::NotDeletable { reason: "x" }.kind(),
            ErrorKind::NotDeletable
        );
        assert_eq!(CaseError::LockPoisoned.kind(), ErrorKind::Storage);
    }

    #[test]
    fn field_is_exposed_for_actionable_errors() {
        let err = CaseError::InvalidTransition {
            field: "is_paid",
            rule: "a case must be billed before it is paid",
        };
        assert_eq!(err.field(), Some("is_paid"));
        assert_eq!(
            err.to_string(),
            "cannot set is_paid: a case must be billed before it is paid"
        );
        assert_eq!(CaseError::not_found(Entity::Case, "abc").field(), None);
    }
}
