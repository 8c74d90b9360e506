use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use shared::types::ServiceRecord;
use crate::service::{Service, ServiceId};

/// A top-level service as held by the registry.
#[derive(Debug, Clone)]
pub struct Registered {
    pub service: Arc<Service>,
    pub registered_at: DateTime<Utc>,
}

impl Registered {
    pub fn to_record(&self) -> Option<ServiceRecord> {
        let metadata = self.service.metadata()?.clone();
        Some(ServiceRecord {
            address: self.service.id().to_string(),
            metadata,
            dependencies: self.service.dependency_records(),
            registered_at: self.registered_at,
        })
    }
}

/// In-memory set of top-level services, keyed by address.
#[derive(Debug, Default)]
pub struct ServiceStore {
    services: HashMap<ServiceId, Registered>,
}

impl ServiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a service. Returns true if the address was
    /// already registered.
    pub fn upsert(&mut self, service: Service) -> bool {
        self.services
            .insert(
                service.id().clone(),
                Registered {
                    service: Arc::new(service),
                    registered_at: Utc::now(),
                },
            )
            .is_some()
    }

    /// Remove a service by address. Returns false if it was not registered.
    pub fn remove(&mut self, id: &ServiceId) -> bool {
        self.services.remove(id).is_some()
    }

    /// Point-in-time copy of every registered service, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<Service>> {
        self.services.values().map(|r| Arc::clone(&r.service)).collect()
    }

    pub fn all(&self) -> Vec<Registered> {
        self.services.values().cloned().collect()
    }
}
