//! Fan a location query out to every registered IM and its dependencies.
//!
//! For each top-level service the TTL cache is consulted first. On a miss the
//! service's dependency tree is walked: leaf dependencies are called with the
//! location, their answers are merged (last write wins) and, together with
//! the location, become the payload for the service itself. An intermediate
//! dependency is never called; only its leaf descendants are. Each successful
//! answer is cached and memoized, so within one query a service reachable
//! over several paths is called once.

mod memo;

pub use memo::QueryMemo;

use std::sync::Arc;
use anyhow::Result;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use shared::types::Location;
use crate::cache::TtlCache;
use crate::document::{self, Document};
use crate::registry_manager::RegistryHandle;
use crate::service::Service;
use crate::transport::Transport;

pub struct Aggregator {
    registry: RegistryHandle,
    cache: Arc<TtlCache>,
    transport: Arc<dyn Transport>,
}

impl Aggregator {
    pub fn new(registry: RegistryHandle, cache: Arc<TtlCache>, transport: Arc<dyn Transport>) -> Self {
        Self { registry, cache, transport }
    }

    /// Answer a query with one metadata-tagged document per registered IM.
    ///
    /// Unreachable or failing IMs contribute an empty document; the only
    /// error is losing the registry itself.
    pub async fn aggregate(&self, location: Location) -> Result<Vec<Document>> {
        let mut memo = QueryMemo::default();
        let services = self.registry.snapshot().await?;

        let mut results = Vec::with_capacity(services.len());
        for service in services {
            let answer = match self.cache.lookup(location, service.id()) {
                Some(cached) => cached,
                None => self.resolve(&service, location, &mut memo).await,
            };
            results.push(document::tag_with_metadata(service.metadata(), answer));
        }

        tracing::debug!(
            "Aggregated {} IMs for ({}, {}) with {} fresh responses",
            results.len(),
            location.latitude,
            location.longitude,
            memo.len()
        );
        Ok(results)
    }

    async fn resolve(&self, service: &Service, location: Location, memo: &mut QueryMemo) -> Document {
        if let Some(seen) = memo.get(service.id()) {
            return seen.clone();
        }

        if service.is_leaf() {
            return self.call(service, document::location_payload(location), location, memo).await;
        }

        let mut payload = self.dependency_data(service, location, memo).await;
        document::merge(&mut payload, document::location_payload(location));
        self.call(service, payload, location, memo).await
    }

    /// Merged answers of every leaf below `service`.
    fn dependency_data<'a>(
        &'a self,
        service: &'a Service,
        location: Location,
        memo: &'a mut QueryMemo,
    ) -> BoxFuture<'a, Document> {
        async move {
            let mut merged = Document::new();
            for dependency in service.dependencies() {
                let data = if !dependency.is_leaf() {
                    self.dependency_data(dependency, location, memo).await
                } else if let Some(seen) = memo.get(dependency.id()) {
                    seen.clone()
                } else {
                    self.call(dependency, document::location_payload(location), location, memo)
                        .await
                };
                document::merge(&mut merged, data);
            }
            merged
        }
        .boxed()
    }

    async fn call(
        &self,
        service: &Service,
        payload: Document,
        location: Location,
        memo: &mut QueryMemo,
    ) -> Document {
        let response = match self.transport.fetch(service.id(), &payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{}; removing {} from the registry", e, service);
                if let Err(e) = self.registry.deregister(service.id().clone()).await {
                    tracing::error!("Failed to deregister {}: {}", service.id(), e);
                }
                return Document::new();
            }
        };

        if response.is_error() {
            tracing::warn!("IM at {} returned error status {}", service.id(), response.status);
            return Document::new();
        }

        let Some(body) = response.body else {
            tracing::warn!("IM at {} returned a body that is not a JSON object", service.id());
            return Document::new();
        };

        self.cache.learn_ttl(service.id(), response.cache_control.as_deref());
        self.cache.store(location, service.id().clone(), body.clone(), Utc::now());
        memo.record(service.id().clone(), body.clone());
        body
    }
}
