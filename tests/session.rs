//! End-to-end sessions over loopback TCP.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{alice_key, bob_key, eventually, open_server, spawn_server};
use scrabble_server::core::codec::{recv_frame, send_frame, FrameCodec};
use scrabble_server::core::utf::write_utf;
use scrabble_server::error::ProtocolError;
use scrabble_server::game::{Board, Dictionary};
use scrabble_server::protocol::{ClientHandshake, INVALID_COMMAND, NO_OUTPUT};
use scrabble_server::transport::Client;
use scrabble_server::utils::crypto::CipherSuite;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

#[tokio::test]
async fn test_authenticated_command_exchange() {
    let server = open_server(3, 3).await;
    let mut client = Client::connect(&server.addr, "alice", alice_key(), CipherSuite::default())
        .await
        .unwrap();

    assert_eq!(client.command("across 0 0 cat").await.unwrap().as_deref(), Some(NO_OUTPUT));
    assert_eq!(client.command("across 0 1 dog").await.unwrap().as_deref(), Some(INVALID_COMMAND));
    assert_eq!(client.command("fly away").await.unwrap().as_deref(), Some(INVALID_COMMAND));
    assert_eq!(
        client.command("board").await.unwrap().as_deref(),
        Some("+---+\n|cat|\n|   |\n|   |\n+---+\n")
    );
    assert_eq!(server.ctx.metrics().snapshot().handshakes_success, 1);
}

#[tokio::test]
async fn test_authenticated_exchange_with_xchacha() {
    let board = Board::new(2, 2, Dictionary::disabled());
    let server = spawn_server(board, CipherSuite::XChaCha20Poly1305).await;
    let mut client =
        Client::connect(&server.addr, "bob", bob_key(), CipherSuite::XChaCha20Poly1305)
            .await
            .unwrap();

    assert_eq!(client.command("down 0 1 hi").await.unwrap().as_deref(), Some(NO_OUTPUT));
    assert_eq!(
        client.command("board").await.unwrap().as_deref(),
        Some("+--+\n| h|\n| i|\n+--+\n")
    );
}

#[tokio::test]
async fn test_wrong_response_closes_without_processing() {
    let server = open_server(2, 2).await;
    let mut stream = TcpStream::connect(&server.addr).await.unwrap();
    write_utf(&mut stream, "alice").await.unwrap();

    let mut framed = Framed::new(stream, FrameCodec::new());
    let challenge = recv_frame(&mut framed).await.unwrap();
    assert_eq!(challenge.len(), 16);

    // the raw challenge is not a valid proof
    send_frame(&mut framed, challenge).await.unwrap();
    assert!(matches!(
        recv_frame(&mut framed).await,
        Err(ProtocolError::ConnectionClosed)
    ));

    let metrics = server.ctx.metrics().clone();
    assert!(eventually(|| metrics.snapshot().handshakes_failed == 1).await);
    let snap = metrics.snapshot();
    assert_eq!(snap.handshakes_success, 0);
    assert_eq!(snap.commands_total, 0);
    assert_eq!(server.ctx.board().render(), "+--+\n|  |\n|  |\n+--+\n");
}

#[tokio::test]
async fn test_proof_with_wrong_key_rejected() {
    let server = open_server(1, 1).await;
    let result = Client::connect(&server.addr, "alice", bob_key(), CipherSuite::default()).await;
    assert!(result.unwrap_err().is_disconnect());
}

#[tokio::test]
async fn test_unknown_user_closed_silently() {
    let server = open_server(1, 1).await;
    let mut stream = TcpStream::connect(&server.addr).await.unwrap();
    write_utf(&mut stream, "mallory").await.unwrap();

    // not a single byte comes back before the close
    let mut buf = Vec::new();
    let _ = stream.read_to_end(&mut buf).await;
    assert!(buf.is_empty(), "server sent {buf:?}");

    let metrics = server.ctx.metrics().clone();
    assert!(eventually(|| metrics.snapshot().handshakes_failed == 1).await);
}

#[tokio::test]
async fn test_quit_sends_no_reply_and_closes() {
    let server = open_server(1, 3).await;
    let mut client = Client::connect(&server.addr, "alice", alice_key(), CipherSuite::default())
        .await
        .unwrap();

    assert_eq!(client.command("quit").await.unwrap(), None);

    let metrics = server.ctx.metrics().clone();
    assert!(eventually(|| metrics.snapshot().connections_active == 0).await);
    // the quit itself is dispatched, nothing after it
    assert_eq!(metrics.snapshot().commands_total, 1);
    assert_eq!(metrics.snapshot().connection_errors, 0);
}

#[tokio::test]
async fn test_server_end_of_stream_after_quit() {
    let server = open_server(1, 3).await;
    let stream = TcpStream::connect(&server.addr).await.unwrap();
    let mut conn = scrabble_server::service::SecureConnection::connect(
        stream,
        "alice",
        alice_key(),
        CipherSuite::default(),
        scrabble_server::config::MAX_FRAME_SIZE,
    )
    .await
    .unwrap();

    conn.send_text("quit now").await.unwrap();
    let err = conn.recv_text().await.unwrap_err();
    assert!(err.is_disconnect(), "{err:?}");
}

#[tokio::test]
async fn test_dictionary_rejection_reverts() {
    let board = Board::new(1, 3, Dictionary::from_words(["cat", "at"]));
    let server = spawn_server(board, CipherSuite::default()).await;
    let mut client = Client::connect(&server.addr, "alice", alice_key(), CipherSuite::default())
        .await
        .unwrap();

    assert_eq!(client.command("across 0 0 cat").await.unwrap().as_deref(), Some(NO_OUTPUT));
    assert_eq!(client.command("down 0 1 xy").await.unwrap().as_deref(), Some(INVALID_COMMAND));
    assert_eq!(client.command("across 0 0 cab").await.unwrap().as_deref(), Some(INVALID_COMMAND));
    assert_eq!(
        client.command("board").await.unwrap().as_deref(),
        Some("+---+\n|cat|\n+---+\n")
    );
}

#[tokio::test]
async fn test_bad_session_does_not_affect_others() {
    let server = open_server(2, 3).await;
    let mut good = Client::connect(&server.addr, "alice", alice_key(), CipherSuite::default())
        .await
        .unwrap();

    // a peer that hangs up mid-handshake
    let mut stream = TcpStream::connect(&server.addr).await.unwrap();
    write_utf(&mut stream, "bob").await.unwrap();
    drop(stream);

    assert_eq!(good.command("across 1 0 ox").await.unwrap().as_deref(), Some(NO_OUTPUT));
    assert_eq!(
        good.command("board").await.unwrap().as_deref(),
        Some("+---+\n|   |\n|ox |\n+---+\n")
    );
}

#[tokio::test]
async fn test_bad_ciphertext_ends_only_that_session() {
    let server = open_server(1, 3).await;

    let mut stream = TcpStream::connect(&server.addr).await.unwrap();
    write_utf(&mut stream, "bob").await.unwrap();
    let mut framed = Framed::new(stream, FrameCodec::new());
    let handshake = ClientHandshake::new("bob", bob_key());
    let challenge = recv_frame(&mut framed).await.unwrap();
    send_frame(&mut framed, handshake.answer_challenge(&challenge).unwrap())
        .await
        .unwrap();
    let wrapped = recv_frame(&mut framed).await.unwrap();
    handshake.accept_session_key(&wrapped).unwrap();

    // 15 bytes is not a whole AES block
    send_frame(&mut framed, vec![0x42; 15]).await.unwrap();
    let err = recv_frame(&mut framed).await.unwrap_err();
    assert!(err.is_disconnect(), "{err:?}");

    let metrics = server.ctx.metrics().clone();
    assert!(eventually(|| metrics.snapshot().connection_errors == 1).await);
    assert_eq!(metrics.snapshot().commands_total, 0);

    let mut other = Client::connect(&server.addr, "alice", alice_key(), CipherSuite::default())
        .await
        .unwrap();
    assert_eq!(other.command("across 0 0 hey").await.unwrap().as_deref(), Some(NO_OUTPUT));
    assert_eq!(
        other.command("board").await.unwrap().as_deref(),
        Some("+---+\n|hey|\n+---+\n")
    );
}
