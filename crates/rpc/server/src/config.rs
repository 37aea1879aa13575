//! Contains the RPC server configuration.

use crate::{
    DebugApiServer, DebugRpc, EthApiServer, EthRpc, Metrics, TxPoolApiServer, TxPoolRpc,
};
use cometh_backend::Backend;
use jsonrpsee::{
    RpcModule,
    core::RegisterMethodError,
    server::{ServerBuilder, ServerHandle},
};
use std::net::SocketAddr;

/// The RPC server configuration.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// The RPC socket address.
    pub socket: SocketAddr,
    /// Enable the `debug_` namespace.
    pub enable_debug: bool,
    /// Enable the `txpool_` namespace.
    pub enable_txpool: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            socket: SocketAddr::from(([127, 0, 0, 1], 8545)),
            enable_debug: true,
            enable_txpool: true,
        }
    }
}

impl RpcConfig {
    /// Builds the module serving every enabled namespace.
    pub fn module(&self, backend: Backend) -> Result<RpcModule<()>, RegisterMethodError> {
        let mut module = RpcModule::new(());
        module.merge(EthRpc::new(backend.clone()).into_rpc())?;
        if self.enable_debug {
            module.merge(DebugRpc::new(backend).into_rpc())?;
        }
        if self.enable_txpool {
            module.merge(TxPoolRpc.into_rpc())?;
        }
        Ok(module)
    }

    /// Launches the RPC server on the configured socket.
    pub async fn launch(self, backend: Backend) -> std::io::Result<ServerHandle> {
        Metrics::init();
        let module = self.module(backend).map_err(std::io::Error::other)?;
        let server = ServerBuilder::default().build(self.socket).await?;
        info!(
            target: "cometh::rpc",
            socket = %self.socket,
            debug = self.enable_debug,
            txpool = self.enable_txpool,
            "starting RPC server"
        );
        Ok(server.start(module))
    }
}
