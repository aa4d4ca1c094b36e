//! Typed identifiers for the entities of the case engine.
//!
//! Each identifier is a thin newtype over [`ShardableUuid`], so it shares the canonical
//! 32-hex rendering and parsing rules while staying distinct at the type level.

use crate::service::ShardableUuid;
use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(ShardableUuid);

        impl $name {
            /// Allocates a fresh random identifier.
            pub fn new() -> Self {
                Self(ShardableUuid::new())
            }

            /// Parses a canonical (32 lowercase hex) identifier.
            pub fn parse(input: &str) -> UuidResult<Self> {
                ShardableUuid::parse(input).map(Self)
            }

            /// Returns the identifier as a shardable storage key.
            pub fn shardable(&self) -> ShardableUuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = UuidError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

typed_id!(
    /// Identifies a surgical case.
    CaseId
);

typed_id!(
    /// Identifies a hospital in the registry.
    HospitalId
);

typed_id!(
    /// Identifies one procedure line within a case.
    ProcedureId
);

typed_id!(
    /// Identifies a physician account, as supplied by the identity collaborator.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_ids_round_trip_through_display() {
        let id = CaseId::new();
        let parsed: CaseId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn typed_ids_reject_non_canonical_input() {
        assert!(UserId::parse("not-a-uuid").is_err());
        assert!(HospitalId::parse("550e8400-e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn typed_ids_serialize_transparently() {
        let id = ProcedureId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"550e8400e29b41d4a716446655440000\""
        );
    }
}
