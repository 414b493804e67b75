use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use plume_ledger::PostProgram;
use plume_protocol::Endpoint;
use plume_store::{DirectoryPostStore, InMemoryPostStore, PostStore};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::error::ServerResult;
use crate::handler::handle_connection;

/// A configured node that has not started listening yet.
pub struct PlumeNode {
    config: NodeConfig,
    endpoint: Endpoint,
}

impl PlumeNode {
    pub fn new(config: NodeConfig, program: Arc<PostProgram>) -> Self {
        Self {
            config,
            endpoint: Endpoint::new(program),
        }
    }

    /// Build the store named by `config` and a program over it.
    pub fn open(config: NodeConfig) -> ServerResult<Self> {
        let store: Arc<dyn PostStore> = match &config.data_dir {
            Some(dir) => {
                info!(data_dir = %dir.display(), "opening directory store");
                Arc::new(DirectoryPostStore::open(dir)?)
            }
            None => {
                info!("using in-memory store");
                Arc::new(InMemoryPostStore::new())
            }
        };
        Ok(Self::new(config, Arc::new(PostProgram::new(store))))
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn program(&self) -> &Arc<PostProgram> {
        self.endpoint.program()
    }

    pub async fn bind(self) -> ServerResult<BoundNode> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        Ok(BoundNode {
            listener,
            endpoint: self.endpoint,
            limit: Arc::new(Semaphore::new(self.config.max_connections.max(1))),
        })
    }
}

/// A node with an open listener.
pub struct BoundNode {
    listener: TcpListener,
    endpoint: Endpoint,
    limit: Arc<Semaphore>,
}

impl BoundNode {
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already being served run to completion on their own
    /// tasks. At most `max_connections` are served at once; further ones
    /// wait in the accept queue.
    pub async fn serve_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(%addr, "plume node listening");
        tokio::pin!(shutdown);

        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = self.limit.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                },
            };

            let endpoint = self.endpoint.clone();
            tokio::spawn(async move {
                debug!(%peer, "connection opened");
                if let Err(err) = handle_connection(stream, endpoint).await {
                    debug!(%peer, error = %err, "connection closed with error");
                }
                drop(permit);
            });
        }

        info!(%addr, "plume node stopped");
        Ok(())
    }
}
