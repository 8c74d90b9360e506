use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use shared::types::{DependencyRecord, ServiceMetadata};

/// Network address of an IM. Two services are the same service exactly when
/// their addresses are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(Arc<str>);

impl ServiceId {
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(Arc::from(address.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An IM and the tree of IMs it needs data from before it can answer.
///
/// Equality and hashing look at the address only, so a registry keyed on
/// `Service` never holds two entries for one address.
#[derive(Debug, Clone)]
pub struct Service {
    id: ServiceId,
    metadata: Option<ServiceMetadata>,
    dependencies: Vec<Service>,
}

impl Service {
    /// Build a top-level service and materialize its dependency tree.
    pub fn top_level(
        address: impl AsRef<str>,
        metadata: ServiceMetadata,
        dependencies: &[DependencyRecord],
    ) -> Self {
        Self {
            id: ServiceId::new(address),
            metadata: Some(metadata),
            dependencies: dependencies.iter().map(Service::dependency).collect(),
        }
    }

    /// Build a dependency node. Recursion stops at descriptors with no
    /// dependencies of their own.
    pub fn dependency(record: &DependencyRecord) -> Self {
        Self {
            id: ServiceId::new(&record.address),
            metadata: None,
            dependencies: record.dependencies.iter().map(Service::dependency).collect(),
        }
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    pub fn metadata(&self) -> Option<&ServiceMetadata> {
        self.metadata.as_ref()
    }

    pub fn dependencies(&self) -> &[Service] {
        &self.dependencies
    }

    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// The dependency tree in its wire shape.
    pub fn dependency_records(&self) -> Vec<DependencyRecord> {
        self.dependencies
            .iter()
            .map(|dep| DependencyRecord {
                address: dep.id.to_string(),
                dependencies: dep.dependency_records(),
            })
            .collect()
    }
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Service {}

impl Hash for Service {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.metadata {
            Some(meta) => write!(
                f,
                "{} {} IM by {} at {}",
                meta.tile, meta.name, meta.creator, self.id
            ),
            None => write!(f, "dependency at {}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn metadata(name: &str) -> ServiceMetadata {
        ServiceMetadata {
            name: name.to_string(),
            creator: "tester".to_string(),
            tile: "tile".to_string(),
        }
    }

    fn dep(address: &str, dependencies: Vec<DependencyRecord>) -> DependencyRecord {
        DependencyRecord {
            address: address.to_string(),
            dependencies,
        }
    }

    #[test]
    fn test_equality_ignores_metadata() {
        let a = Service::top_level("10.0.0.1:80", metadata("weather"), &[]);
        let b = Service::top_level("10.0.0.1:80", metadata("traffic"), &[dep("10.0.0.2:80", vec![])]);

        assert_eq!(a, b);

        let set: HashSet<Service> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1, "Same address must collapse to one entry");
    }

    #[test]
    fn test_builds_nested_tree() {
        let deps = vec![
            dep("c:80", vec![]),
            dep("m:80", vec![dep("n:80", vec![dep("o:80", vec![])])]),
        ];
        let service = Service::top_level("b:80", metadata("b"), &deps);

        assert_eq!(service.dependencies().len(), 2);
        assert!(service.dependencies()[0].is_leaf());

        let m = &service.dependencies()[1];
        assert!(m.metadata().is_none());
        assert_eq!(m.dependencies()[0].id().as_str(), "n:80");
        assert_eq!(m.dependencies()[0].dependencies()[0].id().as_str(), "o:80");
    }

    #[test]
    fn test_dependency_records_round_trip_shape() {
        let deps = vec![dep("m:80", vec![dep("n:80", vec![])]), dep("c:80", vec![])];
        let service = Service::top_level("b:80", metadata("b"), &deps);

        assert_eq!(service.dependency_records(), deps);
    }
}
