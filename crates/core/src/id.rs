//! Strongly-typed identifiers used across the pipeline.
//!
//! Identifiers are opaque keys minted by the data layer. The pipeline never
//! interprets them; it only guarantees that an identifier is never empty, so a
//! job payload can never be partially addressed.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a workspace (tenant boundary).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

/// Identifier of a business profile inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BusinessProfileId(String);

/// Identifier of a single audit run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AuditRunId(String);

/// Identifier of a repair (recovery) plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RepairPlanId(String);

macro_rules! impl_opaque_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Mint a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Wrap an identifier minted elsewhere, rejecting blank values.
            pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!(
                        "{}: must not be empty",
                        $name
                    )));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_opaque_id!(WorkspaceId, "WorkspaceId");
impl_opaque_id!(BusinessProfileId, "BusinessProfileId");
impl_opaque_id!(AuditRunId, "AuditRunId");
impl_opaque_id!(RepairPlanId, "RepairPlanId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifiers_are_rejected() {
        assert!(matches!(
            WorkspaceId::parse(""),
            Err(DomainError::InvalidId(_))
        ));
        assert!(matches!(
            "   ".parse::<AuditRunId>(),
            Err(DomainError::InvalidId(_))
        ));
    }

    #[test]
    fn identifiers_are_opaque() {
        let id = RepairPlanId::parse("clx9plan0001").unwrap();
        assert_eq!(id.as_str(), "clx9plan0001");
        assert_eq!(id.to_string(), "clx9plan0001");
    }

    #[test]
    fn minted_identifiers_are_unique() {
        assert_ne!(WorkspaceId::new(), WorkspaceId::new());
    }

    #[test]
    fn default_mints_a_non_blank_identifier() {
        let a = AuditRunId::default();
        let b = AuditRunId::default();

        assert_ne!(a, b);
        assert!(AuditRunId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn serde_is_transparent_and_validating() {
        let id: BusinessProfileId = serde_json::from_str("\"bp_1\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bp_1\"");

        let err = serde_json::from_str::<BusinessProfileId>("\"\"").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
