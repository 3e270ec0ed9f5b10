//! Unix socket server bridging UI shells to the generation session.
//!
//! The server is organized into separate concerns:
//! - `types`: protocol types for requests and response chunks
//! - `handler`: runs requests against the session
//! - `transport`: unix socket communication layer

mod handler;
mod transport;
mod types;

// Re-export types for external use
pub use types::{Request, StreamChunk};

use crate::config::Config;
use crate::provider::{Generator, HttpGenerator};
use crate::session::Session;
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Main server coordinating transport and request handling.
pub struct Server {
    handler: Arc<handler::RequestHandler>,
    transport: transport::UnixSocketTransport,
}

impl Server {
    /// Creates a server talking to the configured generation endpoint.
    pub fn new(config: &Config) -> Self {
        let generator = Arc::new(HttpGenerator::new(&config.generator.endpoint));
        Self::with_generator(config, generator)
    }

    /// Creates a server with a custom generation backend.
    pub fn with_generator(config: &Config, generator: Arc<dyn Generator>) -> Self {
        let session = Arc::new(Session::new(generator));
        let handler = Arc::new(handler::RequestHandler::new(session));
        let transport = transport::UnixSocketTransport::new(&config.server.socket_path);

        Self { handler, transport }
    }

    /// Starts the server and listens for connections until ctrl-c.
    pub async fn start(&self) -> Result<()> {
        let listener = self.transport.bind().await?;

        info!(socket = %self.transport.path(), "Server listening");

        let shutdown = signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Ok((stream, _)) = listener.accept() => {
                    let handler = Arc::clone(&self.handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler).await {
                            error!("Connection error: {e}");
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutting down");
                    self.transport.cleanup();
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Handles a single client connection.
async fn handle_connection(
    mut stream: tokio::net::UnixStream,
    handler: Arc<handler::RequestHandler>,
) -> Result<()> {
    let request = transport::read_request(&mut stream).await?;

    let (sender, receiver) = mpsc::unbounded_channel();

    let handle_task = async move {
        handler.handle(request, sender).await;
    };

    let write_task = transport::write_chunks(&mut stream, receiver);

    let (_, write_result) = tokio::join!(handle_task, write_task);
    write_result?;

    Ok(())
}
