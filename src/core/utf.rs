//! Length-prefixed string primitive.
//!
//! Strings are a 2-byte big-endian byte count followed by modified UTF-8:
//! NUL is written as `C0 80` and characters outside the BMP as two 3-byte
//! surrogate encodings. Plain UTF-8 for BMP text without NUL is byte-identical.

use crate::error::{ProtocolError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest encodable string, in bytes
pub const MAX_UTF_LEN: usize = u16::MAX as usize;

/// Encode `text` as modified UTF-8 (without the length prefix).
pub fn encode_modified_utf8(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }

    if out.len() > MAX_UTF_LEN {
        return Err(ProtocolError::InvalidString(format!(
            "encoded length {} exceeds {MAX_UTF_LEN}",
            out.len()
        )));
    }
    Ok(out)
}

/// Decode modified UTF-8 bytes (without the length prefix).
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let malformed = |at: usize| ProtocolError::InvalidString(format!("malformed input at byte {at}"));
    let continuation = |at: usize| -> Result<u16> {
        match bytes.get(at) {
            Some(&b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
            _ => Err(malformed(at)),
        }
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];
        match lead >> 4 {
            0..=7 => {
                units.push(u16::from(lead));
                i += 1;
            }
            12 | 13 => {
                let low = continuation(i + 1)?;
                units.push((u16::from(lead & 0x1F) << 6) | low);
                i += 2;
            }
            14 => {
                let mid = continuation(i + 1)?;
                let low = continuation(i + 2)?;
                units.push((u16::from(lead & 0x0F) << 12) | (mid << 6) | low);
                i += 3;
            }
            _ => return Err(malformed(i)),
        }
    }

    String::from_utf16(&units).map_err(|e| ProtocolError::InvalidString(e.to_string()))
}

/// Read one 2-byte-length string from `reader`.
pub async fn read_utf<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u16().await? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    decode_modified_utf8(&buf)
}

/// Write one 2-byte-length string to `writer` and flush it.
pub async fn write_utf<W>(writer: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encoded = encode_modified_utf8(text)?;
    writer.write_u16(encoded.len() as u16).await?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}
