//! # TCP Server
//!
//! Accept loop and per-connection handler.
//!
//! Every accepted connection gets its own task which runs the handshake and
//! then the command loop. A handler failure ends that connection only; a
//! failed `accept` is logged and the loop keeps going. Sockets are closed on
//! every exit path when the stream is dropped.

use crate::auth::UserRegistry;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::game::Board;
use crate::protocol::dispatcher::{Dispatcher, Outcome};
use crate::service::SecureConnection;
use crate::utils::crypto::CipherSuite;
use crate::utils::metrics::{Metrics, Timer};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn, Span};

/// Everything a connection handler needs, shared by all handlers
#[derive(Debug)]
pub struct ServerContext {
    registry: UserRegistry,
    dispatcher: Dispatcher,
    metrics: Arc<Metrics>,
    cipher: CipherSuite,
    max_frame_size: usize,
    accept_backoff: Duration,
}

impl ServerContext {
    pub fn new(registry: UserRegistry, board: Board, config: &ServerConfig) -> Self {
        let metrics = Arc::new(Metrics::new());
        Self {
            registry,
            dispatcher: Dispatcher::new(Arc::new(board), metrics.clone()),
            metrics,
            cipher: config.cipher,
            max_frame_size: config.max_frame_size,
            accept_backoff: config.accept_backoff,
        }
    }

    pub fn board(&self) -> &Arc<Board> {
        self.dispatcher.board()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Bind `addr` and serve forever
pub async fn start_server(addr: &str, ctx: Arc<ServerContext>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, cipher = %ctx.cipher, "Server listening");
    serve(listener, ctx).await
}

/// Accept loop on an already-bound listener. Only returns if the task is dropped.
pub async fn serve(listener: TcpListener, ctx: Arc<ServerContext>) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, peer, ctx.clone()).await {
                        if e.is_disconnect() {
                            debug!(%peer, error = %e, "Peer disconnected");
                        } else {
                            ctx.metrics.connection_error();
                            warn!(%peer, error = %e, "Connection closed on error");
                        }
                    }
                });
            }
            Err(e) => {
                ctx.metrics.accept_error();
                error!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ctx.accept_backoff).await;
            }
        }
    }
}

/// Serve one client from handshake to quit
#[instrument(skip(stream, ctx), fields(username = tracing::field::Empty))]
pub async fn handle_connection<S>(
    stream: S,
    peer: SocketAddr,
    ctx: Arc<ServerContext>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    ctx.metrics.connection_established();
    let result = run_session(stream, &ctx).await;
    ctx.metrics.connection_closed();

    let snapshot = ctx.metrics.snapshot();
    debug!(
        active = snapshot.connections_active,
        total = snapshot.connections_total,
        "Connection closed"
    );
    result
}

async fn run_session<S>(stream: S, ctx: &ServerContext) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    ctx.metrics.handshake_attempt();
    let accepted = {
        let _timer = Timer::start("handshake");
        SecureConnection::accept(stream, &ctx.registry, ctx.cipher, ctx.max_frame_size).await
    };
    let mut conn = match accepted {
        Ok(conn) => conn,
        Err(e) => {
            ctx.metrics.handshake_failed();
            // nothing goes back to the client; dropping the stream closes it
            warn!(error = %e, "Handshake failed");
            return Ok(());
        }
    };
    ctx.metrics.handshake_success();
    Span::current().record("username", conn.username());
    info!("Client authenticated");

    loop {
        let line = conn.recv_text().await?;
        match ctx.dispatcher.handle_line(&line) {
            Outcome::Reply(reply) => conn.send_text(&reply).await?,
            Outcome::Quit => {
                debug!("Client quit");
                break;
            }
        }
    }

    conn.close().await
}
