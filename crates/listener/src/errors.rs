//! Errors raised while running an event source.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to bind webhook listener to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Webhook listener failed: {0}")]
    Serve(#[source] std::io::Error),
}
