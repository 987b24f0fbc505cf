//! Mapping between plugin resource type names and Cloud Control type names

use cumulus_core::provider::ResourceType;

/// One registered resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Plugin-side name (e.g., "s3_bucket")
    pub name: String,
    /// Cloud Control type name (e.g., "AWS::S3::Bucket")
    pub cloud_type: String,
}

impl TypeMapping {
    pub fn new(name: impl Into<String>, cloud_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cloud_type: cloud_type.into(),
        }
    }
}

impl ResourceType for TypeMapping {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Registry of resource types the provider can handle
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    mappings: Vec<TypeMapping>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with commonly managed resource types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, cloud_type) in [
            ("acm_certificate", "AWS::CertificateManager::Certificate"),
            ("appmesh_mesh", "AWS::AppMesh::Mesh"),
            ("backup_vault", "AWS::Backup::BackupVault"),
            ("cloudfront_key_group", "AWS::CloudFront::KeyGroup"),
            ("ec2_vpc", "AWS::EC2::VPC"),
            ("ecs_capacity_provider", "AWS::ECS::CapacityProvider"),
            ("iot_thing_type", "AWS::IoT::ThingType"),
            ("logs_log_group", "AWS::Logs::LogGroup"),
            ("s3_bucket", "AWS::S3::Bucket"),
            (
                "servicediscovery_namespace",
                "AWS::ServiceDiscovery::HttpNamespace",
            ),
            ("sns_topic", "AWS::SNS::Topic"),
            ("sqs_queue", "AWS::SQS::Queue"),
        ] {
            registry.register(TypeMapping::new(name, cloud_type));
        }
        registry
    }

    /// Register a mapping; re-registering a name replaces the old entry
    pub fn register(&mut self, mapping: TypeMapping) {
        if let Some(existing) = self.mappings.iter_mut().find(|m| m.name == mapping.name) {
            *existing = mapping;
        } else {
            self.mappings.push(mapping);
        }
    }

    /// Cloud Control type name for a plugin resource type
    pub fn cloud_type(&self, name: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.cloud_type.as_str())
    }

    pub fn mappings(&self) -> &[TypeMapping] {
        &self.mappings
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappings.iter().any(|m| m.name == name)
    }
}
