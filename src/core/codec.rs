//! Length-prefixed frame codec.
//!
//! A frame is a 4-byte big-endian length followed by exactly that many
//! payload bytes. Decoding never yields a partial payload: a stream that ends
//! in the middle of a frame is an error, not a short frame.

use crate::config::MAX_FRAME_SIZE;
use crate::error::{constants, ProtocolError, Result};
use bytes::{Buf, BufMut, BytesMut};
use futures::{SinkExt, StreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX: usize = 4;

/// Codec for `[len: u32 BE][payload]` frames
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Codec with a custom upper bound on payload length
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Change the bound for frames decoded or encoded from now on
    pub fn set_max_frame_size(&mut self, max_frame_size: usize) {
        self.max_frame_size = max_frame_size;
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Vec<u8>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < LENGTH_PREFIX {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&src[..LENGTH_PREFIX]);
        let len = u32::from_be_bytes(prefix) as usize;

        if len > self.max_frame_size {
            return Err(ProtocolError::OversizedFrame(len));
        }

        if src.len() < LENGTH_PREFIX + len {
            src.reserve(LENGTH_PREFIX + len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX);
        Ok(Some(src.split_to(len).to_vec()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                constants::ERR_TRUNCATED_FRAME,
            ))),
        }
    }
}

impl Encoder<Vec<u8>> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, payload: Vec<u8>, dst: &mut BytesMut) -> Result<()> {
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|&len| len as usize <= self.max_frame_size)
            .ok_or(ProtocolError::OversizedFrame(payload.len()))?;

        dst.reserve(LENGTH_PREFIX + payload.len());
        dst.put_u32(len);
        dst.put_slice(&payload);
        Ok(())
    }
}

/// Write one frame and flush it.
pub async fn send_frame<S>(framed: &mut Framed<S, FrameCodec>, payload: Vec<u8>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed.send(payload).await
}

/// Read exactly one frame; a clean end of stream is `ConnectionClosed`.
pub async fn recv_frame<S>(framed: &mut Framed<S, FrameCodec>) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed
        .next()
        .await
        .ok_or(ProtocolError::ConnectionClosed)?
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_writes_big_endian_prefix() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(b"hello".to_vec(), &mut buf).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_decode_waits_for_full_payload() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0u8, 0, 0, 4, 1, 2][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[3, 4, 9]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(vec![1, 2, 3, 4]));
        // trailing byte belongs to the next frame
        assert_eq!(&buf[..], &[9]);
    }

    #[test]
    fn test_decode_empty_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0u8, 0, 0, 0][..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Vec::new()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut codec = FrameCodec::with_max_frame_size(8);
        let mut buf = BytesMut::from(&[0u8, 0, 0, 9][..]);
        match codec.decode(&mut buf) {
            Err(ProtocolError::OversizedFrame(9)) => {}
            other => panic!("Unexpected result: {other:?}"),
        }

        let mut out = BytesMut::new();
        assert!(matches!(
            codec.encode(vec![0u8; 9], &mut out),
            Err(ProtocolError::OversizedFrame(9))
        ));
    }

    #[test]
    fn test_eof_mid_frame_is_error() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0u8, 0, 0, 10, 1, 2, 3][..]);
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(err.is_disconnect());

        let mut empty = BytesMut::new();
        assert!(codec.decode_eof(&mut empty).unwrap().is_none());
    }

    #[test]
    fn test_raised_limit_applies_to_next_frame() {
        let mut codec = FrameCodec::with_max_frame_size(8);
        let mut buf = BytesMut::from(&[0u8, 0, 0, 12][..]);
        assert!(codec.decode(&mut buf).is_err());

        codec.set_max_frame_size(16);
        let mut buf = BytesMut::from(&[0u8, 0, 0, 12][..]);
        buf.extend_from_slice(&[5u8; 12]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(vec![5u8; 12]));
    }

    #[tokio::test]
    async fn test_frames_over_duplex_stream() {
        let (a, b) = tokio::io::duplex(1024);
        let mut left = Framed::new(a, FrameCodec::new());
        let mut right = Framed::new(b, FrameCodec::new());

        send_frame(&mut left, vec![7u8; 200]).await.unwrap();
        send_frame(&mut left, b"second".to_vec()).await.unwrap();

        assert_eq!(recv_frame(&mut right).await.unwrap(), vec![7u8; 200]);
        assert_eq!(recv_frame(&mut right).await.unwrap(), b"second".to_vec());

        drop(left);
        assert!(matches!(
            recv_frame(&mut right).await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }
}
