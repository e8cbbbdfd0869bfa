use crate::auth::UserRegistry;
use crate::config::HANDSHAKE_MAX_FRAME;
use crate::core::codec::{recv_frame, send_frame, FrameCodec};
use crate::core::utf::{read_utf, write_utf};
use crate::error::Result;
use crate::protocol::handshake::{ClientHandshake, ServerHandshake};
use crate::utils::crypto::{CipherSuite, SessionCipher};

use futures::SinkExt;
use rsa::RsaPrivateKey;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

/// An authenticated session: every frame after the handshake is encrypted
/// under the session key.
///
/// Handshake frames are capped at `HANDSHAKE_MAX_FRAME`; the configured
/// `max_frame_size` only applies once the peer is authenticated.
pub struct SecureConnection<S> {
    framed: Framed<S, FrameCodec>,
    cipher: SessionCipher,
    username: String,
}

impl<S> SecureConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Run the server half of the handshake on a fresh stream.
    ///
    /// On any error the stream is dropped without a reply; the caller only
    /// needs to log.
    #[instrument(skip_all, level = "debug")]
    pub async fn accept(
        mut stream: S,
        registry: &UserRegistry,
        suite: CipherSuite,
        max_frame_size: usize,
    ) -> Result<Self> {
        let mut handshake = ServerHandshake::new(registry);

        let username = read_utf(&mut stream).await?;
        let challenge = handshake.receive_username(&username)?;

        let mut framed = Framed::new(stream, handshake_codec(max_frame_size));
        send_frame(&mut framed, challenge.to_vec()).await?;
        handshake.challenge_sent()?;

        let response = recv_frame(&mut framed).await?;
        let (session_key, wrapped) = handshake.receive_response(&response)?;
        send_frame(&mut framed, wrapped).await?;
        framed.codec_mut().set_max_frame_size(max_frame_size);

        debug!(%username, %suite, "Session established");
        Ok(Self {
            framed,
            cipher: SessionCipher::new(suite, &session_key),
            username,
        })
    }

    /// Run the client half of the handshake and return the open session
    #[instrument(skip(stream, private_key, max_frame_size), level = "debug")]
    pub async fn connect(
        mut stream: S,
        username: &str,
        private_key: &RsaPrivateKey,
        suite: CipherSuite,
        max_frame_size: usize,
    ) -> Result<Self> {
        let handshake = ClientHandshake::new(username, private_key);
        write_utf(&mut stream, handshake.username()).await?;

        let mut framed = Framed::new(stream, handshake_codec(max_frame_size));
        let challenge = recv_frame(&mut framed).await?;
        send_frame(&mut framed, handshake.answer_challenge(&challenge)?).await?;

        let wrapped = recv_frame(&mut framed).await?;
        let session_key = handshake.accept_session_key(&wrapped)?;
        framed.codec_mut().set_max_frame_size(max_frame_size);

        debug!("Session key received");
        Ok(Self {
            framed,
            cipher: SessionCipher::new(suite, &session_key),
            username: username.to_string(),
        })
    }

    /// Authenticated user on the other end (or this end, for a client)
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn suite(&self) -> CipherSuite {
        self.cipher.suite()
    }

    #[instrument(skip(self, text), level = "trace")]
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        let ciphertext = self.cipher.encrypt(text.as_bytes())?;
        send_frame(&mut self.framed, ciphertext).await
    }

    /// Receive and decrypt one frame. Invalid UTF-8 is replaced, not rejected.
    #[instrument(skip(self), level = "trace")]
    pub async fn recv_text(&mut self) -> Result<String> {
        let ciphertext = recv_frame(&mut self.framed).await?;
        let plaintext = Zeroizing::new(self.cipher.decrypt(&ciphertext)?);
        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }

    /// Flush and shut down the write half
    pub async fn close(mut self) -> Result<()> {
        SinkExt::<Vec<u8>>::close(&mut self.framed).await
    }
}

fn handshake_codec(max_frame_size: usize) -> FrameCodec {
    FrameCodec::with_max_frame_size(HANDSHAKE_MAX_FRAME.min(max_frame_size))
}

impl<S> std::fmt::Debug for SecureConnection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureConnection")
            .field("username", &self.username)
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::UserRecord;
    use crate::config::MAX_FRAME_SIZE;
    use crate::error::ProtocolError;
    use rand_core::OsRng;
    use rsa::RsaPublicKey;
    use std::sync::OnceLock;
    use tokio::io::{duplex, AsyncWriteExt};

    fn key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).expect("keygen"))
    }

    fn registry() -> UserRegistry {
        UserRegistry::from_records(vec![UserRecord::new("alice", RsaPublicKey::from(key()))])
    }

    type Session = SecureConnection<tokio::io::DuplexStream>;

    async fn pair(suite: CipherSuite) -> (Session, Session) {
        let (client_io, server_io) = duplex(4096);
        let registry = registry();
        let server = tokio::spawn(async move {
            SecureConnection::accept(server_io, &registry, suite, MAX_FRAME_SIZE).await
        });
        let client = SecureConnection::connect(client_io, "alice", key(), suite, MAX_FRAME_SIZE)
            .await
            .unwrap();
        (client, server.await.unwrap().unwrap())
    }

    #[tokio::test]
    async fn test_text_both_ways() {
        for suite in [CipherSuite::Aes128Ecb, CipherSuite::XChaCha20Poly1305] {
            let (mut client, mut server) = pair(suite).await;
            assert_eq!(server.username(), "alice");
            assert_eq!(server.suite(), suite);

            client.send_text("board").await.unwrap();
            assert_eq!(server.recv_text().await.unwrap(), "board");
            server.send_text("+-+\n| |\n+-+\n").await.unwrap();
            assert_eq!(client.recv_text().await.unwrap(), "+-+\n| |\n+-+\n");
        }
    }

    #[tokio::test]
    async fn test_unknown_user_gets_nothing() {
        let (client_io, server_io) = duplex(4096);
        let registry = registry();
        let server = tokio::spawn(async move {
            SecureConnection::accept(server_io, &registry, CipherSuite::default(), MAX_FRAME_SIZE)
                .await
        });

        let err = SecureConnection::connect(
            client_io,
            "mallory",
            key(),
            CipherSuite::default(),
            MAX_FRAME_SIZE,
        )
        .await
        .unwrap_err();
        assert!(err.is_disconnect(), "{err:?}");
        assert!(matches!(server.await.unwrap(), Err(ProtocolError::HandshakeError(_))));
    }

    #[tokio::test]
    async fn test_large_frame_refused_before_authentication() {
        let (mut client_io, server_io) = duplex(4096);
        let registry = registry();
        let server = tokio::spawn(async move {
            SecureConnection::accept(server_io, &registry, CipherSuite::default(), MAX_FRAME_SIZE)
                .await
        });

        write_utf(&mut client_io, "alice").await.unwrap();
        let mut framed = Framed::new(client_io, FrameCodec::new());
        recv_frame(&mut framed).await.unwrap();

        // announce a 64 KiB response without sending it
        framed.get_mut().write_all(&(64 * 1024u32).to_be_bytes()).await.unwrap();
        assert!(matches!(
            server.await.unwrap(),
            Err(ProtocolError::OversizedFrame(65536))
        ));
    }

    #[tokio::test]
    async fn test_large_frame_accepted_after_authentication() {
        let (mut client, mut server) = pair(CipherSuite::default()).await;
        let line = format!("across 0 0 {}", "a".repeat(20 * 1024));

        let (sent, received) = tokio::join!(client.send_text(&line), server.recv_text());
        sent.unwrap();
        assert_eq!(received.unwrap(), line);
    }

    #[tokio::test]
    async fn test_close_is_seen_as_disconnect() {
        let (client, mut server) = pair(CipherSuite::default()).await;
        client.close().await.unwrap();
        assert!(server.recv_text().await.unwrap_err().is_disconnect());
    }
}
