//! PostgreSQL connection pool over `tokio-postgres`.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, info, warn};

use ttsbot_core::{BackendError, BackendKind, BackendParams, BackendResult, DatabasePool};

use crate::params::{pool_size, postgres_conninfo};

/// A fixed-size set of connections handed out round-robin.
///
/// Each connection is driven by its own task; closing the pool drops every
/// client, which ends those tasks.
pub struct PostgresPool {
    clients: Mutex<Vec<Arc<Client>>>,
    connections: Mutex<Vec<JoinHandle<()>>>,
    next: AtomicUsize,
}

impl PostgresPool {
    /// Opens every connection of the pool concurrently.
    pub async fn connect(params: &BackendParams) -> BackendResult<Self> {
        let conninfo = postgres_conninfo(params)?;
        let size = pool_size(params);

        let opened = try_join_all((0..size).map(|_| tokio_postgres::connect(&conninfo, NoTls)))
            .await
            .map_err(|e| BackendError::unavailable(BackendKind::Database, e.to_string()))?;

        let mut clients = Vec::with_capacity(size);
        let mut connections = Vec::with_capacity(size);
        for (client, connection) in opened {
            clients.push(Arc::new(client));
            connections.push(tokio::spawn(async move {
                if let Err(e) = connection.await {
                    warn!(error = %e, "PostgreSQL connection error");
                }
            }));
        }

        info!(size, "PostgreSQL pool opened");
        Ok(Self {
            clients: Mutex::new(clients),
            connections: Mutex::new(connections),
            next: AtomicUsize::new(0),
        })
    }

    /// Returns the next client, or `Closed` once the pool is closed.
    pub fn client(&self) -> BackendResult<Arc<Client>> {
        let clients = self.clients.lock();
        if clients.is_empty() {
            return Err(BackendError::Closed {
                kind: BackendKind::Database,
            });
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed) % clients.len();
        Ok(Arc::clone(&clients[i]))
    }

    /// Number of open connections.
    pub fn size(&self) -> usize {
        self.clients.lock().len()
    }
}

#[async_trait]
impl DatabasePool for PostgresPool {
    async fn ping(&self) -> BackendResult<()> {
        self.client()?
            .simple_query("SELECT 1")
            .await
            .map(drop)
            .map_err(|e| BackendError::unavailable(BackendKind::Database, e.to_string()))
    }

    async fn close(&self) -> BackendResult<()> {
        let clients = std::mem::take(&mut *self.clients.lock());
        let connections = std::mem::take(&mut *self.connections.lock());
        debug!(count = clients.len(), "Closing PostgreSQL connections");
        drop(clients);

        for result in join_all(connections).await {
            if let Err(e) = result {
                warn!(error = %e, "PostgreSQL connection task failed");
            }
        }
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
