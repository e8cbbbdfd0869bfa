//! Shared fixtures: generated user keys and a loopback server.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use rand_core::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};
use scrabble_server::auth::{UserRecord, UserRegistry};
use scrabble_server::config::ServerConfig;
use scrabble_server::game::{Board, Dictionary};
use scrabble_server::transport::{serve, ServerContext};
use scrabble_server::utils::crypto::CipherSuite;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub fn alice_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).expect("keygen"))
}

pub fn bob_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).expect("keygen"))
}

pub fn registry() -> UserRegistry {
    UserRegistry::from_records(vec![
        UserRecord::new("alice", RsaPublicKey::from(alice_key())),
        UserRecord::new("bob", RsaPublicKey::from(bob_key())),
    ])
}

/// A server on an ephemeral loopback port, aborted on drop
pub struct TestServer {
    pub addr: String,
    pub ctx: Arc<ServerContext>,
    handle: JoinHandle<scrabble_server::Result<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_server(board: Board, cipher: CipherSuite) -> TestServer {
    let config = ServerConfig {
        cipher,
        ..ServerConfig::default()
    };
    let ctx = Arc::new(ServerContext::new(registry(), board, &config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(serve(listener, ctx.clone()));

    TestServer { addr, ctx, handle }
}

pub async fn open_server(rows: usize, cols: usize) -> TestServer {
    spawn_server(Board::new(rows, cols, Dictionary::disabled()), CipherSuite::default()).await
}

/// Poll `check` until it holds or a few seconds pass
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
