//! Effect - Side effects as values
//!
//! An Effect describes one provider operation without performing it.
//! Effects are collected into a Plan and executed by the Interpreter.

use crate::resource::{Resource, ResourceId, State};

/// A single provider operation, described but not yet executed
#[derive(Debug, Clone)]
pub enum Effect {
    /// Read the current state of a resource
    Read(ResourceId),
    /// Create a resource with the declared attributes
    Create(Resource),
    /// Update a resource from its observed state to the declared state
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete a resource by its remote identifier
    ///
    /// The identifier comes from the observed state; a Delete without one
    /// cannot be executed.
    Delete {
        id: ResourceId,
        identifier: Option<String>,
    },
}

impl Effect {
    /// Delete effect for an observed state, carrying its identifier
    pub fn delete_of(state: &State) -> Self {
        Effect::Delete {
            id: state.id.clone(),
            identifier: state.identifier.clone(),
        }
    }

    /// Returns whether this Effect mutates remote state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    /// The resource this Effect targets
    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(id) | Effect::Delete { id, .. } => id,
            Effect::Create(r) => &r.id,
            Effect::Update { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn read_is_not_mutating() {
        assert!(!Effect::Read(ResourceId::new("sqs_queue", "jobs")).is_mutating());
        assert!(Effect::Create(Resource::new("sqs_queue", "jobs")).is_mutating());
        assert!(
            Effect::Delete {
                id: ResourceId::new("sqs_queue", "jobs"),
                identifier: Some("cmls-test-jobs".to_string()),
            }
            .is_mutating()
        );
    }

    #[test]
    fn delete_of_carries_observed_identifier() {
        let id = ResourceId::new("sqs_queue", "jobs");
        let state = State::existing(id.clone(), HashMap::new()).with_identifier("cmls-test-jobs");

        let effect = Effect::delete_of(&state);
        assert_eq!(effect.resource_id(), &id);
        match effect {
            Effect::Delete { identifier, .. } => {
                assert_eq!(identifier.as_deref(), Some("cmls-test-jobs"));
            }
            _ => panic!("Expected Delete"),
        }
    }

    #[test]
    fn resource_id_of_update() {
        let id = ResourceId::new("s3_bucket", "assets");
        let effect = Effect::Update {
            id: id.clone(),
            from: State::not_found(id.clone()),
            to: Resource::new("s3_bucket", "assets"),
        };
        assert_eq!(effect.resource_id(), &id);
    }
}
