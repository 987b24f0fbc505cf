//! In-memory Provider used by harness tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use cumulus_core::provider::{
    BoxFuture, Provider, ProviderError, ProviderResult, ResourceType,
};
use cumulus_core::resource::{Resource, ResourceId, State, Value};

#[derive(Default)]
struct Store {
    /// (resource_type, identifier) -> attributes
    resources: HashMap<(String, String), HashMap<String, Value>>,
    /// identifiers whose delete calls fail
    fail_delete: HashSet<String>,
    deleted: Vec<String>,
}

/// Provider backed by a mutex-guarded map; identifiers equal resource names
#[derive(Default)]
pub struct MemoryProvider {
    store: Mutex<Store>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        resource_type: &str,
        identifier: &str,
        attributes: HashMap<String, Value>,
    ) {
        self.store
            .lock()
            .unwrap()
            .resources
            .insert((resource_type.to_string(), identifier.to_string()), attributes);
    }

    pub fn fail_delete_of(&self, identifier: &str) {
        self.store
            .lock()
            .unwrap()
            .fail_delete
            .insert(identifier.to_string());
    }

    pub fn deleted(&self) -> Vec<String> {
        self.store.lock().unwrap().deleted.clone()
    }

    pub fn contains(&self, resource_type: &str, identifier: &str) -> bool {
        self.store
            .lock()
            .unwrap()
            .resources
            .contains_key(&(resource_type.to_string(), identifier.to_string()))
    }
}

impl Provider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        vec![]
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.unwrap_or(&id.name).to_string();
        Box::pin(async move {
            let store = self.store.lock().unwrap();
            match store
                .resources
                .get(&(id.resource_type.clone(), identifier.clone()))
            {
                Some(attrs) => {
                    Ok(State::existing(id, attrs.clone()).with_identifier(identifier))
                }
                None => Ok(State::not_found(id)),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let identifier = resource.id.name.clone();
            self.store.lock().unwrap().resources.insert(
                (resource.id.resource_type.clone(), identifier.clone()),
                resource.attributes.clone(),
            );
            Ok(State::existing(resource.id, resource.attributes).with_identifier(identifier))
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let attrs = to.attributes.clone();
        Box::pin(async move {
            self.store
                .lock()
                .unwrap()
                .resources
                .insert((id.resource_type.clone(), identifier.clone()), attrs.clone());
            Ok(State::existing(id, attrs).with_identifier(identifier))
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let mut store = self.store.lock().unwrap();
            if store.fail_delete.contains(&identifier) {
                return Err(ProviderError::new(format!(
                    "delete of {} is wired to fail",
                    identifier
                ))
                .for_resource(id));
            }
            // Deleting an already-gone resource is idempotent success
            store
                .resources
                .remove(&(id.resource_type.clone(), identifier.clone()));
            store.deleted.push(identifier);
            Ok(())
        })
    }

    fn list(&self, resource_type: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>> {
        let resource_type = resource_type.to_string();
        Box::pin(async move {
            let store = self.store.lock().unwrap();
            let mut identifiers: Vec<String> = store
                .resources
                .keys()
                .filter(|(t, _)| *t == resource_type)
                .map(|(_, identifier)| identifier.clone())
                .collect();
            identifiers.sort();
            Ok(identifiers)
        })
    }
}
