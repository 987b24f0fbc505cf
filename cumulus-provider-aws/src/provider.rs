//! AWS Cloud Control Provider implementation
//!
//! This module contains the main provider implementation that communicates
//! with AWS Cloud Control API to manage resources.

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_cloudcontrol::Client as CloudControlClient;
use aws_sdk_cloudcontrol::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_cloudcontrol::types::OperationStatus;
use cumulus_core::provider::{
    BoxFuture, ErrorKind, Provider, ProviderError, ProviderResult, ResourceType,
};
use cumulus_core::resource::{Resource, ResourceId, State, Value};
use log::{debug, warn};
use serde_json::json;

use crate::settings::AwsSettings;
use crate::types::TypeRegistry;

/// Classify an API failure from its error code, falling back to the message
///
/// Cloud Control surfaces downstream handler errors inside the message
/// body, so the substring check stays as a fallback.
fn classify_error(code: Option<&str>, message: &str) -> ErrorKind {
    if let Some(code) = code {
        if code == "ResourceNotFoundException" || code.contains("NotFound") {
            return ErrorKind::NotFound;
        }
        if code == "ThrottlingException" || code == "TooManyRequests" {
            return ErrorKind::Throttled;
        }
    }
    if message.contains("ResourceNotFound") || message.contains("NotFound") {
        ErrorKind::NotFound
    } else if message.contains("Throttling") || message.contains("Rate exceeded") {
        ErrorKind::Throttled
    } else {
        ErrorKind::Api
    }
}

/// Convert an SDK error into a classified ProviderError
fn sdk_error<E, R>(context: &str, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err));
    let kind = classify_error(code.as_deref(), &message);
    ProviderError::new(format!("{}: {}", context, message)).with_kind(kind)
}

/// AWS Cloud Control Provider
pub struct CloudControlProvider {
    client: CloudControlClient,
    registry: TypeRegistry,
    region: String,
}

impl CloudControlProvider {
    /// Create a provider with clients built from the shared settings
    pub async fn new(settings: &AwsSettings) -> Self {
        let config = settings.load().await;
        Self {
            client: CloudControlClient::new(&config),
            registry: TypeRegistry::with_defaults(),
            region: settings.region.clone(),
        }
    }

    /// Create a provider from an existing client (used by tests and tools)
    pub fn with_client(client: CloudControlClient, registry: TypeRegistry, region: String) -> Self {
        Self {
            client,
            registry,
            region,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn cloud_type_for(&self, id: &ResourceId) -> ProviderResult<String> {
        self.registry
            .cloud_type(&id.resource_type)
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::unsupported(&id.resource_type).for_resource(id.clone())
            })
    }

    // =========================================================================
    // Cloud Control API Methods
    // =========================================================================

    /// Get a resource by identifier using Cloud Control API
    pub async fn cc_get_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ProviderResult<Option<serde_json::Value>> {
        let result = self
            .client
            .get_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await;

        match result {
            Ok(response) => {
                if let Some(desc) = response.resource_description()
                    && let Some(props_str) = desc.properties()
                {
                    let props: serde_json::Value =
                        serde_json::from_str(props_str).unwrap_or_default();
                    Ok(Some(props))
                } else {
                    Ok(None)
                }
            }
            Err(e) => {
                let err = sdk_error("Failed to get resource", e);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Create a resource using Cloud Control API
    pub async fn cc_create_resource(
        &self,
        type_name: &str,
        desired_state: serde_json::Value,
    ) -> ProviderResult<String> {
        let result = self
            .client
            .create_resource()
            .type_name(type_name)
            .desired_state(desired_state.to_string())
            .send()
            .await
            .map_err(|e| sdk_error("Failed to create resource", e))?;

        let request_token = result
            .progress_event()
            .and_then(|p| p.request_token())
            .ok_or_else(|| ProviderError::new("No request token returned"))?;

        self.wait_for_operation(request_token).await
    }

    /// Update a resource using Cloud Control API
    pub async fn cc_update_resource(
        &self,
        type_name: &str,
        identifier: &str,
        patch_ops: Vec<serde_json::Value>,
    ) -> ProviderResult<()> {
        if patch_ops.is_empty() {
            return Ok(());
        }

        let patch_document = serde_json::to_string(&patch_ops)
            .map_err(|e| ProviderError::new(format!("Failed to build patch: {}", e)))?;

        let result = self
            .client
            .update_resource()
            .type_name(type_name)
            .identifier(identifier)
            .patch_document(patch_document)
            .send()
            .await
            .map_err(|e| sdk_error("Failed to update resource", e))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            self.wait_for_operation(request_token).await?;
        }

        Ok(())
    }

    /// Delete a resource using Cloud Control API
    ///
    /// Deleting a resource that is already gone succeeds.
    pub async fn cc_delete_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ProviderResult<()> {
        let result = self
            .client
            .delete_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await;

        let result = match result {
            Ok(response) => response,
            Err(e) => {
                let err = sdk_error("Failed to delete resource", e);
                if err.is_not_found() {
                    debug!("{} {} already deleted", type_name, identifier);
                    return Ok(());
                }
                return Err(err);
            }
        };

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            match self.wait_for_operation(request_token).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// List the identifiers of all live resources of a type
    ///
    /// Follows the `next_token` pagination until the listing is exhausted.
    pub async fn cc_list_resources(&self, type_name: &str) -> ProviderResult<Vec<String>> {
        let mut identifiers = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_resources()
                .type_name(type_name)
                .set_next_token(next_token.clone())
                .send()
                .await
                .map_err(|e| sdk_error("Failed to list resources", e))?;

            for desc in response.resource_descriptions() {
                if let Some(identifier) = desc.identifier() {
                    identifiers.push(identifier.to_string());
                }
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!("listed {} {} resources", identifiers.len(), type_name);
        Ok(identifiers)
    }

    /// Wait for a Cloud Control operation to complete
    async fn wait_for_operation(&self, request_token: &str) -> ProviderResult<String> {
        let max_attempts = 120;
        let delay = Duration::from_secs(5);

        for _ in 0..max_attempts {
            let status = self
                .client
                .get_resource_request_status()
                .request_token(request_token)
                .send()
                .await
                .map_err(|e| sdk_error("Failed to get operation status", e))?;

            if let Some(progress) = status.progress_event() {
                match progress.operation_status() {
                    Some(OperationStatus::Success) => {
                        return Ok(progress.identifier().unwrap_or("").to_string());
                    }
                    Some(OperationStatus::Failed) => {
                        let msg = progress.status_message().unwrap_or("Unknown error");
                        let kind = classify_error(None, msg);
                        return Err(
                            ProviderError::new(format!("Operation failed: {}", msg))
                                .with_kind(kind),
                        );
                    }
                    Some(OperationStatus::CancelComplete) => {
                        return Err(ProviderError::new("Operation was cancelled"));
                    }
                    _ => {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ProviderError::new("Operation timed out"))
    }
}

// =============================================================================
// Value Conversion Helpers
// =============================================================================

/// Convert a JSON property value to an attribute Value
pub fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                // Fractional numbers keep their full precision as strings
                Some(Value::String(n.to_string()))
            }
        }
        serde_json::Value::Array(arr) => {
            let items: Vec<Value> = arr.iter().filter_map(json_to_value).collect();
            Some(Value::List(items))
        }
        serde_json::Value::Object(map) => {
            let mut out = HashMap::new();
            for (k, v) in map {
                if let Some(v) = json_to_value(v) {
                    out.insert(k.clone(), v);
                }
            }
            Some(Value::Map(out))
        }
        serde_json::Value::Null => None,
    }
}

/// Convert an attribute Value to a JSON property value
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => json!(s),
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), value_to_json(v));
            }
            serde_json::Value::Object(out)
        }
    }
}

/// Build the desired-state property document for a create call
fn build_desired_state(resource: &Resource) -> serde_json::Value {
    let mut desired_state = serde_json::Map::new();
    for (key, value) in &resource.attributes {
        if key.starts_with('_') {
            continue;
        }
        desired_state.insert(key.clone(), value_to_json(value));
    }
    serde_json::Value::Object(desired_state)
}

/// Build JSON patch operations for the attributes that changed
fn build_patch_ops(from: &State, to: &Resource) -> Vec<serde_json::Value> {
    let mut patch_ops = Vec::new();
    for (key, value) in &to.attributes {
        if key.starts_with('_') {
            continue;
        }
        if from.attributes.get(key) == Some(value) {
            continue;
        }
        patch_ops.push(json!({
            "op": "replace",
            "path": format!("/{}", key),
            "value": value_to_json(value),
        }));
    }
    patch_ops
}

/// Map a property document to attribute values
fn props_to_attributes(props: &serde_json::Value) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    if let Some(map) = props.as_object() {
        for (key, value) in map {
            if let Some(v) = json_to_value(value) {
                attributes.insert(key.clone(), v);
            }
        }
    }
    attributes
}

impl Provider for CloudControlProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        self.registry
            .mappings()
            .iter()
            .map(|m| Box::new(m.clone()) as Box<dyn ResourceType>)
            .collect()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(str::to_string);
        Box::pin(async move {
            let type_name = self.cloud_type_for(&id)?;

            let identifier = match identifier {
                Some(identifier) => identifier,
                None => return Ok(State::not_found(id)),
            };

            let props = match self.cc_get_resource(&type_name, &identifier).await? {
                Some(props) => props,
                None => return Ok(State::not_found(id)),
            };

            let attributes = props_to_attributes(&props);
            Ok(State::existing(id, attributes).with_identifier(identifier))
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let type_name = self.cloud_type_for(&resource.id)?;
            let desired_state = build_desired_state(&resource);

            let identifier = self
                .cc_create_resource(&type_name, desired_state)
                .await
                .map_err(|e| e.for_resource(resource.id.clone()))?;

            self.read(&resource.id, Some(&identifier)).await
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            let type_name = self.cloud_type_for(&id)?;
            let patch_ops = build_patch_ops(&from, &to);

            self.cc_update_resource(&type_name, &identifier, patch_ops)
                .await
                .map_err(|e| e.for_resource(id.clone()))?;

            self.read(&id, Some(&identifier)).await
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let type_name = self.cloud_type_for(&id)?;
            self.cc_delete_resource(&type_name, &identifier)
                .await
                .map_err(|e| e.for_resource(id.clone()))
        })
    }

    fn list(&self, resource_type: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>> {
        let resource_type = resource_type.to_string();
        Box::pin(async move {
            let type_name = self
                .registry
                .cloud_type(&resource_type)
                .map(str::to_string)
                .ok_or_else(|| ProviderError::unsupported(&resource_type))?;

            match self.cc_list_resources(&type_name).await {
                Ok(identifiers) => Ok(identifiers),
                Err(e) if e.is_not_found() => {
                    warn!("listing {} returned not-found, treating as empty", type_name);
                    Ok(Vec::new())
                }
                Err(e) => Err(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_not_found_by_code() {
        assert_eq!(
            classify_error(Some("ResourceNotFoundException"), "whatever"),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn classify_not_found_by_message() {
        assert_eq!(
            classify_error(None, "Handler returned ResourceNotFound for identifier"),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn classify_throttling() {
        assert_eq!(
            classify_error(Some("ThrottlingException"), "Rate exceeded"),
            ErrorKind::Throttled
        );
        assert_eq!(classify_error(None, "Rate exceeded"), ErrorKind::Throttled);
    }

    #[test]
    fn classify_other_errors_as_api() {
        assert_eq!(
            classify_error(Some("AccessDeniedException"), "denied"),
            ErrorKind::Api
        );
    }

    #[test]
    fn json_value_round_trip() {
        let props = json!({
            "BucketName": "assets",
            "Versioned": true,
            "RetentionDays": 30,
            "Tags": [{"Key": "env", "Value": "test"}],
        });

        let attrs = props_to_attributes(&props);
        assert_eq!(
            attrs.get("BucketName"),
            Some(&Value::String("assets".to_string()))
        );
        assert_eq!(attrs.get("Versioned"), Some(&Value::Bool(true)));
        assert_eq!(attrs.get("RetentionDays"), Some(&Value::Int(30)));
        assert!(matches!(attrs.get("Tags"), Some(Value::List(_))));
    }

    #[test]
    fn fractional_numbers_survive_as_strings() {
        let props = json!({
            "HealthyThresholdPercentage": 99.5,
            "DesiredCount": 2,
        });

        let attrs = props_to_attributes(&props);
        assert_eq!(
            attrs.get("HealthyThresholdPercentage"),
            Some(&Value::String("99.5".to_string()))
        );
        assert_eq!(attrs.get("DesiredCount"), Some(&Value::Int(2)));
    }

    #[test]
    fn desired_state_skips_internal_attributes() {
        let resource = Resource::new("s3_bucket", "assets")
            .with_attribute("BucketName", Value::String("assets".to_string()))
            .with_attribute("_managed_by", Value::String("cumulus".to_string()));

        let doc = build_desired_state(&resource);
        assert_eq!(doc.get("BucketName"), Some(&json!("assets")));
        assert!(doc.get("_managed_by").is_none());
    }

    #[test]
    fn patch_ops_only_for_changed_attributes() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "RetentionDays".to_string(),
            Value::Int(30),
        );
        attrs.insert(
            "LogGroupName".to_string(),
            Value::String("app".to_string()),
        );
        let from = State::existing(ResourceId::new("logs_log_group", "app"), attrs);

        let to = Resource::new("logs_log_group", "app")
            .with_attribute("RetentionDays", Value::Int(14))
            .with_attribute("LogGroupName", Value::String("app".to_string()));

        let ops = build_patch_ops(&from, &to);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].get("path"), Some(&json!("/RetentionDays")));
        assert_eq!(ops[0].get("value"), Some(&json!(14)));
    }
}
