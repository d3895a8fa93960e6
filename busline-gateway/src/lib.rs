mod config;
mod pool;
mod service;

pub mod proto {
    #![allow(clippy::all, clippy::pedantic, unreachable_pub)]

    tonic::include_proto!("busline.gateway.v1");
}

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tracing::info;
use busline_broker::BusOps;

pub use self::config::{Env, GatewayConfig, UnknownEnvError};
pub use self::pool::ResponsePool;
pub use self::service::BusServiceImpl;

const CHANNEL_BUFFER: usize = 64;

/// The remote Bus Service, serving [`proto::bus_service_server::BusServiceServer`]
pub struct Gateway {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<Result<(), tonic::transport::Error>>>,
}

impl Gateway {
    /// Start serving asynchronously
    ///
    /// # Errors
    ///
    /// It returns an error if the transport fails to bind or, for `prod`, if
    /// the certificate/key material cannot be read or is invalid.
    pub async fn start(config: GatewayConfig, ops: BusOps) -> Result<Self, StartError> {
        let service = BusServiceImpl::new(ops, CHANNEL_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let mut server = Server::builder();

        if let Env::Prod { cert_path, key_path } = config.env {
            let cert = std::fs::read(cert_path).map_err(StartError::ReadCert)?;
            let key = std::fs::read(key_path).map_err(StartError::ReadCert)?;
            let identity = Identity::from_pem(cert, key);
            server = server
                .tls_config(ServerTlsConfig::new().identity(identity))
                .map_err(StartError::Tls)?;
        }

        let addr = config.bind_addr;
        info!(%addr, "starting bus gateway");

        let router =
            server.add_service(proto::bus_service_server::BusServiceServer::new(service));

        let handle = tokio::spawn(async move {
            router
                .serve_with_shutdown(addr, async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until an interrupt/terminate signal arrives, then initiate a graceful drain
    ///
    /// In-flight streams are allowed to complete; no new calls are accepted afterwards.
    ///
    /// # Errors
    ///
    /// It returns an error if the underlying transport task failed.
    pub async fn wait_for_shutdown(mut self) -> Result<(), tonic::transport::Error> {
        let _ = tokio::signal::ctrl_c().await;
        self.graceful_stop().await
    }

    /// Initiate a graceful drain
    ///
    /// Safe to invoke standalone, and safe to call multiple times.
    ///
    /// # Errors
    ///
    /// It returns an error if the underlying transport task failed.
    pub async fn graceful_stop(&mut self) -> Result<(), tonic::transport::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            return handle.await.unwrap_or(Ok(()));
        }

        Ok(())
    }
}

/// Error returned by [`Gateway::start`]
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("failed to read TLS certificate or key material")]
    ReadCert(#[source] std::io::Error),
    #[error("failed to configure TLS")]
    Tls(#[source] tonic::transport::Error),
}

