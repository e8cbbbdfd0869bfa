//! TCP client for the word-board server.

use crate::config::MAX_FRAME_SIZE;
use crate::error::{ProtocolError, Result};
use crate::protocol::command::Command;
use crate::service::SecureConnection;
use crate::utils::crypto::CipherSuite;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use std::path::Path;
use tokio::net::TcpStream;
use tracing::{debug, instrument};

/// An authenticated client session
#[derive(Debug)]
pub struct Client {
    conn: SecureConnection<TcpStream>,
}

impl Client {
    /// Connect and authenticate as `username`
    #[instrument(skip(private_key))]
    pub async fn connect(
        addr: &str,
        username: &str,
        private_key: &RsaPrivateKey,
        suite: CipherSuite,
    ) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let conn =
            SecureConnection::connect(stream, username, private_key, suite, MAX_FRAME_SIZE).await?;
        debug!("Authenticated");
        Ok(Self { conn })
    }

    /// Send one command line.
    ///
    /// # Returns
    /// The server's reply, or `None` for `quit`, which gets no reply.
    pub async fn command(&mut self, line: &str) -> Result<Option<String>> {
        self.conn.send_text(line).await?;
        if Command::parse(line) == Command::Quit {
            return Ok(None);
        }
        self.conn.recv_text().await.map(Some)
    }

    /// Shut down the connection
    pub async fn close(self) -> Result<()> {
        self.conn.close().await
    }
}

/// Load an RSA private key from a PEM file, PKCS#8 or PKCS#1
pub fn load_private_key<P: AsRef<Path>>(path: P) -> Result<RsaPrivateKey> {
    let path = path.as_ref();
    let pem = std::fs::read_to_string(path).map_err(|e| {
        ProtocolError::ConfigError(format!("Failed to read key file {}: {e}", path.display()))
    })?;

    RsaPrivateKey::from_pkcs8_pem(&pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
        .map_err(|e| ProtocolError::KeyMaterial(format!("{}: {e}", path.display())))
}
