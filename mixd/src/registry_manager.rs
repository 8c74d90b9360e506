use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};
use anyhow::Result;
use shared::types::ServiceRecord;
use crate::registry::store::ServiceStore;
use crate::service::{Service, ServiceId};

/// Commands sent to the registry thread
pub enum RegistryCommand {
    Register(Service, oneshot::Sender<bool>),
    Deregister(ServiceId, oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<Vec<Arc<Service>>>),
    List(oneshot::Sender<Vec<ServiceRecord>>),
    Shutdown,
}

/// Handle to the registry of top-level services.
///
/// The store is owned by a single thread; every mutation and every snapshot
/// is serialized through its command channel, so an aggregation pass always
/// iterates a consistent copy even while peers are being removed.
#[derive(Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Spawn a new registry thread owning the given store
    pub fn spawn(mut store: ServiceStore) -> Self {
        let (tx, mut rx) = mpsc::channel::<RegistryCommand>(256);

        thread::spawn(move || {
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    RegistryCommand::Register(service, reply) => {
                        let _ = reply.send(store.upsert(service));
                    }
                    RegistryCommand::Deregister(id, reply) => {
                        let _ = reply.send(store.remove(&id));
                    }
                    RegistryCommand::Snapshot(reply) => {
                        let _ = reply.send(store.snapshot());
                    }
                    RegistryCommand::List(reply) => {
                        let mut records: Vec<ServiceRecord> = store
                            .all()
                            .iter()
                            .filter_map(|r| r.to_record())
                            .collect();
                        records.sort_by(|a, b| a.address.cmp(&b.address));
                        let _ = reply.send(records);
                    }
                    RegistryCommand::Shutdown => {
                        tracing::info!("Registry thread shutting down");
                        break;
                    }
                }
            }
        });

        Self { tx }
    }

    /// Insert or replace a service by address. Returns true if it replaced
    /// an earlier registration.
    pub async fn register(&self, service: Service) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Register(service, reply)).await?;
        Ok(rx.await?)
    }

    /// Remove a service by address. Returns false if it was not registered.
    pub async fn deregister(&self, id: ServiceId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Deregister(id, reply)).await?;
        Ok(rx.await?)
    }

    /// Point-in-time copy of the top-level services
    pub async fn snapshot(&self) -> Result<Vec<Arc<Service>>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Snapshot(reply)).await?;
        Ok(rx.await?)
    }

    /// Registered services as API records, sorted by address
    pub async fn list(&self) -> Result<Vec<ServiceRecord>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::List(reply)).await?;
        Ok(rx.await?)
    }

    /// Shutdown the registry thread
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(RegistryCommand::Shutdown).await?;
        Ok(())
    }
}
