// Copyright 2025 Cowboy AI, LLC.

//! Identifier types for workflows, nodes, and events

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DomainError;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from a UUID
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse from the external (hyphenated UUID) representation
            pub fn parse_str(input: &str) -> Result<Self, DomainError> {
                Uuid::parse_str(input).map(Self).map_err(|e| {
                    DomainError::ValidationError(format!(
                        "invalid {} '{}': {}",
                        stringify!($name),
                        input,
                        e
                    ))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_str(s)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<&$name> for Uuid {
            fn from(id: &$name) -> Self {
                id.0
            }
        }
    };
}

uuid_identifier!(
    /// Workflow ID - globally unique identity of one workflow aggregate
    ///
    /// Immutable once assigned. Serialized as a plain UUID string.
    WorkflowId
);

uuid_identifier!(
    /// Node ID - only meaningful within a workflow
    ///
    /// Nodes are entities owned by their workflow; the ID is unique within
    /// that workflow's node set.
    NodeId
);

uuid_identifier!(
    /// Event ID - unique identity of a single fact record
    EventId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = NodeId::new();
        let b = NodeId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_round_trip() {
        let id = WorkflowId::new();
        let parsed = WorkflowId::parse_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        let parsed: WorkflowId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = NodeId::parse_str("not-a-uuid").unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("NodeId"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let uuid = Uuid::new_v4();
        let id = EventId::from_uuid(uuid);
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(uuid.to_string()));
        assert_eq!(Uuid::from(id), uuid);
    }
}
