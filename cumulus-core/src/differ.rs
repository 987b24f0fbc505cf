//! Differ - Compare declared state with observed state to generate a Plan
//!
//! Compares the desired state from configuration with the current state
//! fetched from the Provider, and generates the list of required Effects.

use std::collections::HashMap;

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare declared state with observed state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between declared and observed state
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') {
            continue;
        }

        match current.get(key) {
            Some(current_value) if current_value == desired_value => {}
            _ => changed.push(key.clone()),
        }
    }

    changed
}

/// Compute Diffs for multiple resources and generate a Plan
pub fn create_plan(desired: &[Resource], current_states: &HashMap<ResourceId, State>) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        let d = diff(resource, &current);

        match d {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => {
                plan.add(Effect::Update { id, from, to });
            }
            Diff::NoChange(_) => {}
            Diff::Delete(id) => plan.add(Effect::Delete {
                identifier: current.identifier.clone(),
                id,
            }),
        }
    }

    plan
}
